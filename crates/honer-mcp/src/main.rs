use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use honer_core::export::{export_to_dir, exporter_for};
use honer_core::{template, AiSettings, OptimizationResult, PromptInput, PublishConfig};
use serde::Deserialize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// --- Request types ---

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct OptimizeRequest {
    /// The prompt to improve. Must not be blank.
    prompt: String,
    /// What makes a good prompt for this use case. Omit to use general best practices.
    criteria: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct GenerateRequest {
    /// The optimized prompt to run as-is (usually the optimized prompt from optimize_prompt)
    prompt: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct DeriveTitleRequest {
    /// Generated content to take the title from
    content: String,
}

#[derive(Deserialize, schemars::JsonSchema)]
struct PublishRequest {
    /// Site address: site root ("https://mysite.com"), API root (".../wp-json") or full posts endpoint
    url: String,
    /// WordPress username
    username: String,
    /// WordPress application password (Users → Profile → Application Passwords), not the login password
    app_password: String,
    /// Post title. Omit to derive it from the first line of the content.
    title: Option<String>,
    /// Post body
    content: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct ExportRequest {
    /// Text to export
    content: String,
    /// "doc" (Word-compatible, the default) or "pdf"
    format: Option<String>,
    /// File name without extension. Default: "generated-content"
    filename: Option<String>,
    /// Directory to write into. Default: the server's working directory.
    dir: Option<String>,
}

// --- Server ---

#[derive(Clone)]
pub struct HonerServer {
    settings: AiSettings,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl HonerServer {
    pub fn new(settings: AiSettings) -> Self {
        Self {
            settings,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Rewrite and critique a prompt. Returns four sections: the optimized prompt, key improvements, analysis, and the model's scratchpad. Sections the model omitted are shown as (empty)."
    )]
    async fn optimize_prompt(
        &self,
        Parameters(req): Parameters<OptimizeRequest>,
    ) -> Result<CallToolResult, McpError> {
        let input = PromptInput::new(req.prompt, req.criteria.unwrap_or_default());
        if !input.is_submittable() {
            return Ok(CallToolResult::error(vec![Content::text(
                "Prompt is empty. Provide the prompt you want to optimize.",
            )]));
        }

        match honer_optimize::optimize(
            &self.settings,
            &input.original_prompt,
            &input.evaluation_criteria,
        )
        .await
        {
            Ok(result) => Ok(CallToolResult::success(vec![Content::text(
                format_optimization(&result),
            )])),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(e.to_string())])),
        }
    }

    #[tool(
        description = "Run an optimized prompt and return the generated content, plus the title derived from its first line."
    )]
    async fn generate_content(
        &self,
        Parameters(req): Parameters<GenerateRequest>,
    ) -> Result<CallToolResult, McpError> {
        if req.prompt.trim().is_empty() {
            return Ok(CallToolResult::error(vec![Content::text(
                "Prompt is empty. Run optimize_prompt first and pass its optimized prompt.",
            )]));
        }

        match honer_optimize::generate(&self.settings, &req.prompt).await {
            Ok(text) => {
                let title = honer_core::derive_title(&text);
                Ok(CallToolResult::success(vec![
                    Content::text(format!("Title: {}", title)),
                    Content::text(text),
                ]))
            }
            Err(e) => Ok(CallToolResult::error(vec![Content::text(e.to_string())])),
        }
    }

    #[tool(
        description = "Derive a title from generated content: first line, at most 50 characters, markdown # and * removed."
    )]
    fn derive_title(
        &self,
        Parameters(req): Parameters<DeriveTitleRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![Content::text(
            honer_core::derive_title(&req.content),
        )]))
    }

    #[tool(
        description = "Publish content to a WordPress site as a live post using an application password. Returns the created post's id and link, followed by the full post JSON."
    )]
    async fn publish_post(
        &self,
        Parameters(req): Parameters<PublishRequest>,
    ) -> Result<CallToolResult, McpError> {
        let config = PublishConfig {
            url: req.url,
            username: req.username,
            app_password: req.app_password,
        };
        let title = req
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| honer_core::derive_title(&req.content));

        match honer_publish::publish(&config, &title, &req.content).await {
            Ok(created) => Ok(CallToolResult::success(vec![Content::text(
                format_published(&created),
            )])),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(e.to_string())])),
        }
    }

    #[tool(
        description = "Export content as a Word-compatible .doc file (right-to-left HTML envelope) or an A4 PDF with right-aligned text. Returns the written file path."
    )]
    fn export_document(
        &self,
        Parameters(req): Parameters<ExportRequest>,
    ) -> Result<CallToolResult, McpError> {
        let format = req.format.unwrap_or_default();
        let Some(exporter) = exporter_for(&format) else {
            return Ok(CallToolResult::error(vec![Content::text(format!(
                "Unknown export format '{}'. Use \"doc\" or \"pdf\".",
                format
            ))]));
        };
        let dir = req.dir.map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
        let filename = req.filename.unwrap_or_default();

        match export_to_dir(exporter, &dir, &req.content, &filename) {
            Ok(path) => Ok(CallToolResult::success(vec![Content::text(format!(
                "Wrote {}",
                path.display()
            ))])),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Export failed: {}",
                e
            ))])),
        }
    }

    #[tool(description = "Get the meta-prompt template and the default evaluation criteria")]
    fn get_template(&self) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![
            Content::text(template::META_PROMPT_TEMPLATE),
            Content::text(format!("Default criteria: {}", template::DEFAULT_CRITERIA)),
        ]))
    }

    #[tool(description = "Show the active AI provider settings (API key redacted)")]
    fn get_settings(&self) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![Content::text(
            format_settings(&self.settings),
        )]))
    }
}

#[tool_handler]
impl ServerHandler for HonerServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// --- Rendering ---

fn section(out: &mut String, heading: &str, body: &str) {
    if !out.is_empty() {
        out.push_str("\n\n");
    }
    out.push_str("## ");
    out.push_str(heading);
    out.push('\n');
    out.push_str(if body.is_empty() { "(empty)" } else { body });
}

/// Most useful section first, the way the results are read.
fn format_optimization(result: &OptimizationResult) -> String {
    let mut out = String::with_capacity(
        result.optimized_prompt.len()
            + result.key_improvements.len()
            + result.analysis.len()
            + result.scratchpad.len()
            + 128,
    );
    section(&mut out, "Optimized prompt", &result.optimized_prompt);
    section(&mut out, "Key improvements", &result.key_improvements);
    section(&mut out, "Analysis", &result.analysis);
    section(&mut out, "Scratchpad", &result.scratchpad);
    out
}

fn format_published(created: &serde_json::Value) -> String {
    let id = created
        .get("id")
        .map(|v| v.to_string())
        .unwrap_or_else(|| "?".to_string());
    let mut out = format!("Published post {}", id);
    if let Some(link) = created.get("link").and_then(|v| v.as_str()) {
        out.push_str(": ");
        out.push_str(link);
    }
    let json = serde_json::to_string_pretty(created)
        .unwrap_or_else(|e| format!("Serialization error: {}", e));
    out.push_str("\n\n");
    out.push_str(&json);
    out
}

fn format_settings(settings: &AiSettings) -> String {
    let key = if settings.api_key.is_empty() {
        "(not set)"
    } else {
        "(set)"
    };
    let status = if honer_core::ai_configured(settings) {
        "ready"
    } else {
        "not configured: set HONER_API_KEY, GEMINI_API_KEY or API_KEY, or write ~/.honer/settings.json"
    };
    format!(
        "provider: {}\nmodel: {}\napiKey: {}\nstatus: {}",
        settings.provider, settings.model, key, status
    )
}

const INSTRUCTIONS: &str = r#"honer improves prompts and turns them into publishable content.

## Workflow
1. `optimize_prompt` with the user's prompt and, optionally, evaluation criteria. The reply has four sections: optimized prompt, key improvements, analysis, scratchpad. Any section may be (empty) if the model skipped it; that is not an error.
2. `generate_content` with the optimized prompt to produce the actual deliverable. The first line of the reply is the derived title.
3. Optionally `export_document` to save the content as a Word or PDF file, or `publish_post` to create a live WordPress post.

## Publishing
`publish_post` needs the site URL, a username and an application password (not the login password). The URL may be the site root, the `/wp-json` API root or the full `/wp-json/wp/v2/posts` endpoint. Posts are published immediately. If publishing fails, keep the generated content and retry with corrected credentials.

## Failures
Nothing is retried automatically. A missing API key is reported before any request is sent; call `get_settings` to check configuration."#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Stdout carries the MCP protocol; logs go to stderr.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("no .env loaded: {}", e);
    }

    let settings = honer_core::read_settings().with_env_overrides();
    tracing::info!(?settings, "starting honer-mcp");
    if !honer_core::ai_configured(&settings) {
        tracing::warn!("no API key configured; optimize and generate will fail until one is set");
    }

    let service = HonerServer::new(settings)
        .serve(rmcp::transport::io::stdio())
        .await
        .inspect_err(|e| tracing::error!("MCP server error: {}", e))?;
    service.waiting().await?;
    Ok(())
}
