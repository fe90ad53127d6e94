/// Path appended to a bare site root.
pub const SITE_POSTS_PATH: &str = "/wp-json/wp/v2/posts";
/// Path appended to a URL that already points into the REST API root.
pub const API_POSTS_PATH: &str = "/wp/v2/posts";

/// Turn a site root, partial API root or full endpoint into the post
/// creation endpoint.
///
/// Exactly one trailing slash is removed first. Anything without `wp-json`
/// gets the full API path; anything with it that does not already end in
/// `/posts` gets the versioned posts path.
pub fn normalize_endpoint(url: &str) -> String {
    let endpoint = url.strip_suffix('/').unwrap_or(url);

    if !endpoint.contains("wp-json") {
        format!("{endpoint}{SITE_POSTS_PATH}")
    } else if !endpoint.ends_with("/posts") {
        format!("{endpoint}{API_POSTS_PATH}")
    } else {
        endpoint.to_string()
    }
}
