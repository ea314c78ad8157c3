//! MCP server implementation using rmcp

use crate::accounts::{AccountRegistry, InMemoryAccounts};
use crate::error::Error;
use crate::extract::extract_with;
use crate::pdf::raster::{DEFAULT_JPEG_QUALITY, DEFAULT_SCALE};
use crate::pdf::{PageCopier, PdfiumRenderer, RasterAssembler};
use crate::selection::PageSelection;
use crate::storage::resolver::resolve_stored;
use crate::storage::{decode_upload, validate_name, ArtifactStore, FsStore, MemoryStore};
use anyhow::Result;
use base64::Engine;
use rmcp::{
    handler::server::tool::ToolRouter, handler::server::wrapper::Parameters, model::*,
    schemars::JsonSchema, tool, tool_handler, tool_router, ServerHandler, ServiceExt,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Storage, limits and rendering configuration for the server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Directory uploads and extracted files are written to (default: uploads)
    pub upload_dir: PathBuf,
    /// Base URL used to build download links, e.g. `http://localhost:3000`
    pub public_base_url: Option<String>,
    /// Keep files in memory instead of `upload_dir` (default: false).
    /// Evicted entries invalidate download links already returned.
    pub in_memory: bool,
    /// Maximum number of in-memory entries (default: 100)
    pub cache_max_entries: usize,
    /// Maximum total bytes held in memory (default: 512MB)
    pub cache_max_bytes: usize,
    /// Maximum decoded upload size (default: 100MB)
    pub max_upload_bytes: u64,
    /// Render scale for the rasterized mode (default: 2.0)
    pub raster_scale: f32,
    /// Upper bound for a caller-supplied render scale (default: 10.0)
    pub max_raster_scale: f32,
    /// JPEG quality for rasterized pages (default: 85)
    pub jpeg_quality: u8,
    /// Accounts registered at startup
    pub accounts: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            public_base_url: None,
            in_memory: false,
            cache_max_entries: 100,
            cache_max_bytes: 512 * 1024 * 1024, // 512MB
            max_upload_bytes: 100 * 1024 * 1024, // 100MB
            raster_scale: DEFAULT_SCALE,
            max_raster_scale: 10.0,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            accounts: Vec::new(),
        }
    }
}

/// PDF page extraction MCP server
#[derive(Clone)]
pub struct PdfServer {
    store: Arc<dyn ArtifactStore>,
    accounts: Arc<dyn AccountRegistry>,
    tool_router: ToolRouter<Self>,
    config: Arc<ServerConfig>,
}

// ============================================================================
// Request/Response types for upload_pdf
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UploadPdfParams {
    /// Name to store the file under (plain file name, e.g. "sample.pdf")
    pub filename: String,
    /// Base64 encoded PDF content
    pub base64: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct UploadPdfResult {
    pub filename: String,
    /// Address of the stored file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Size in bytes
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// Request/Response types for get_pdf
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetPdfParams {
    /// Name of a previously uploaded or extracted file
    pub filename: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct GetPdfResult {
    pub filename: String,
    pub size: u64,
    /// Base64 encoded PDF content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// Request/Response types for extract_pages
// ============================================================================

/// How selected pages are carried into the new document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// Copy page objects and their resources (text stays selectable)
    #[default]
    Structural,
    /// Render each page to a JPEG and embed the image
    Rasterized,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExtractPagesParams {
    /// Name of the uploaded file to extract pages from
    pub filename: String,
    /// Pages to extract, 1-based, in output order. Duplicates are allowed.
    #[serde(default)]
    pub selected_pages: serde_json::Value,
    /// Name of the new file. Defaults to `extracted_<timestamp>_<id><ext>`.
    #[serde(default)]
    pub new_filename: Option<String>,
    /// Account to record the download link on
    #[serde(default)]
    pub account: Option<String>,
    /// "structural" (default) or "rasterized"
    #[serde(default)]
    pub mode: ExtractionMode,
    /// Render scale for rasterized mode (pixels per point)
    #[serde(default)]
    pub scale: Option<f32>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ExtractPagesResult {
    /// Source file name
    pub source: String,
    /// Name of the extracted file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Where the extracted file can be downloaded from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_link: Option<String>,
    /// Number of pages in the extracted file
    pub page_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// Request/Response types for list_artifacts
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListArtifactsParams {
    /// Account identifier
    pub account: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ListArtifactsResult {
    pub account: String,
    /// Download links recorded for the account, oldest first
    pub artifacts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// Tool implementations
// ============================================================================

#[tool_router]
impl PdfServer {
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    /// Create a new PdfServer with storage built from the configuration
    pub fn with_config(config: ServerConfig) -> Self {
        let store: Arc<dyn ArtifactStore> = if config.in_memory {
            Arc::new(MemoryStore::new(
                config.cache_max_entries,
                config.cache_max_bytes,
            ))
        } else {
            Arc::new(FsStore::new(
                &config.upload_dir,
                config.public_base_url.clone(),
            ))
        };
        let accounts = Arc::new(InMemoryAccounts::with_accounts(&config.accounts));
        Self::with_parts(config, store, accounts)
    }

    /// Create a new PdfServer over existing storage and account backends
    pub fn with_parts(
        config: ServerConfig,
        store: Arc<dyn ArtifactStore>,
        accounts: Arc<dyn AccountRegistry>,
    ) -> Self {
        Self {
            store,
            accounts,
            tool_router: Self::tool_router(),
            config: Arc::new(config),
        }
    }

    /// Upload a PDF so pages can be extracted from it
    #[tool(
        description = "Upload a PDF file. Pass the file name and the base64 encoded content. The stored name is used as `filename` in extract_pages and get_pdf."
    )]
    async fn upload_pdf(&self, Parameters(params): Parameters<UploadPdfParams>) -> String {
        let result = self.process_upload_pdf(&params).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "upload_pdf failed");
            UploadPdfResult {
                filename: params.filename.clone(),
                address: None,
                size: 0,
                error: Some(e.client_message()),
            }
        });

        serde_json::to_string_pretty(&result).unwrap_or_default()
    }

    /// Retrieve a stored PDF
    #[tool(description = "Retrieve a previously uploaded or extracted PDF as base64.")]
    async fn get_pdf(&self, Parameters(params): Parameters<GetPdfParams>) -> String {
        let result = self.process_get_pdf(&params).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "get_pdf failed");
            GetPdfResult {
                filename: params.filename.clone(),
                size: 0,
                data_base64: None,
                error: Some(e.client_message()),
            }
        });

        serde_json::to_string_pretty(&result).unwrap_or_default()
    }

    /// Extract selected pages into a new PDF
    #[tool(
        description = "Extract pages from an uploaded PDF into a new PDF and return its download link.

JSON format:
{
  \"filename\": \"sample.pdf\",          // uploaded file to extract from
  \"selected_pages\": [1, 3, 7],          // 1-based pages, in output order; repeats allowed
  \"new_filename\": \"custom.pdf\",       // optional, defaults to extracted_<timestamp>_<id>.pdf
  \"account\": \"user@example.com\",     // optional, records the link on the account
  \"mode\": \"structural\"               // optional, or \"rasterized\" to embed page images
}"
    )]
    async fn extract_pages(&self, Parameters(params): Parameters<ExtractPagesParams>) -> String {
        let result = self
            .process_extract_pages(&params)
            .await
            .unwrap_or_else(|e| {
                if e.is_caller_error() {
                    tracing::warn!(error = %e, "extract_pages failed");
                } else {
                    tracing::error!(error = %e, "extract_pages failed");
                }
                ExtractPagesResult {
                    source: params.filename.clone(),
                    filename: None,
                    download_link: None,
                    page_count: 0,
                    error: Some(e.client_message()),
                }
            });

        serde_json::to_string_pretty(&result).unwrap_or_default()
    }

    /// List download links recorded for an account
    #[tool(description = "List the download links of PDFs extracted for an account.")]
    async fn list_artifacts(&self, Parameters(params): Parameters<ListArtifactsParams>) -> String {
        let result = match self.accounts.artifacts(&params.account) {
            Ok(artifacts) => ListArtifactsResult {
                account: params.account.clone(),
                artifacts,
                error: None,
            },
            Err(e) => {
                tracing::warn!(error = %e, "list_artifacts failed");
                ListArtifactsResult {
                    account: params.account.clone(),
                    artifacts: Vec::new(),
                    error: Some(e.client_message()),
                }
            }
        };

        serde_json::to_string_pretty(&result).unwrap_or_default()
    }
}

impl PdfServer {
    pub fn process_upload_pdf(
        &self,
        params: &UploadPdfParams,
    ) -> crate::error::Result<UploadPdfResult> {
        let filename = validate_name(&params.filename)?;
        let data = decode_upload(&params.base64, self.config.max_upload_bytes)?;
        let address = self.store.store(filename, &data)?;

        tracing::info!(filename, bytes = data.len(), "uploaded file");

        Ok(UploadPdfResult {
            filename: filename.to_string(),
            address: Some(address),
            size: data.len() as u64,
            error: None,
        })
    }

    pub fn process_get_pdf(&self, params: &GetPdfParams) -> crate::error::Result<GetPdfResult> {
        let data = self.store.load(&params.filename)?;
        Ok(GetPdfResult {
            filename: params.filename.clone(),
            size: data.len() as u64,
            data_base64: Some(base64::engine::general_purpose::STANDARD.encode(&data)),
            error: None,
        })
    }

    pub async fn process_extract_pages(
        &self,
        params: &ExtractPagesParams,
    ) -> crate::error::Result<ExtractPagesResult> {
        let selection = PageSelection::from_json(&params.selected_pages)?;
        if let Some(name) = params.new_filename.as_deref() {
            if !name.trim().is_empty() {
                validate_name(name)?;
            }
        }
        let scale = self.render_scale(params)?;

        let source = resolve_stored(self.store.as_ref(), &params.filename)?;
        let source_name = source.source_name.clone();
        let mode = params.mode;
        let new_filename = params.new_filename.clone();
        let jpeg_quality = self.config.jpeg_quality;

        let artifact = tokio::task::spawn_blocking(move || match mode {
            ExtractionMode::Structural => {
                extract_with(&PageCopier, &source, &selection, new_filename.as_deref())
            }
            ExtractionMode::Rasterized => {
                let assembler = RasterAssembler::new(PdfiumRenderer::new()?)
                    .with_scale(scale)
                    .with_jpeg_quality(jpeg_quality);
                extract_with(&assembler, &source, &selection, new_filename.as_deref())
            }
        })
        .await
        .map_err(|e| Error::Internal {
            reason: format!("Task join error: {}", e),
        })??;

        // Only a complete artifact ever reaches the store
        let download_link = self.store.store(&artifact.name, &artifact.data)?;

        tracing::info!(
            source = %source_name,
            output = %artifact.name,
            pages = artifact.page_count,
            "extracted pages"
        );

        if let Some(account) = params.account.as_deref() {
            if let Err(e) = self.accounts.record_artifact(account, &download_link) {
                tracing::warn!(error = %e, "artifact not recorded");
            }
        }

        Ok(ExtractPagesResult {
            source: source_name,
            filename: Some(artifact.name),
            download_link: Some(download_link),
            page_count: artifact.page_count,
            error: None,
        })
    }

    /// Render scale for rasterized requests, validated against the configured maximum
    fn render_scale(&self, params: &ExtractPagesParams) -> crate::error::Result<f32> {
        let scale = params.scale.unwrap_or(self.config.raster_scale);
        if params.mode == ExtractionMode::Rasterized
            && (!scale.is_finite() || scale <= 0.0 || scale > self.config.max_raster_scale)
        {
            return Err(Error::InvalidRequest {
                reason: format!(
                    "scale must be between 0.0 (exclusive) and {} (inclusive), got {}",
                    self.config.max_raster_scale, scale
                ),
            });
        }
        Ok(scale)
    }
}

impl Default for PdfServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_handler]
impl ServerHandler for PdfServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Upload a PDF with upload_pdf, then call extract_pages with the file name and \
                 the pages to keep. The result contains a download link for the new PDF."
                    .into(),
            ),
        }
    }
}

/// Run the MCP server with default configuration
pub async fn run_server() -> Result<()> {
    run_server_with_config(ServerConfig::default()).await
}

/// Run the MCP server with full configuration
pub async fn run_server_with_config(config: ServerConfig) -> Result<()> {
    let server = PdfServer::with_config(config);

    tracing::info!("PDF extraction server ready, waiting for connections...");

    let service = server.serve(rmcp::transport::io::stdio()).await?;
    service.waiting().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{build_pdf, page_markers};
    use serde_json::json;

    struct Harness {
        server: PdfServer,
        store: Arc<MemoryStore>,
        accounts: Arc<InMemoryAccounts>,
    }

    fn harness() -> Harness {
        let store = Arc::new(MemoryStore::new(100, 64 * 1024 * 1024));
        let accounts = Arc::new(InMemoryAccounts::with_accounts(["alice"]));
        let server = PdfServer::with_parts(
            ServerConfig {
                in_memory: true,
                ..ServerConfig::default()
            },
            store.clone(),
            accounts.clone(),
        );
        Harness {
            server,
            store,
            accounts,
        }
    }

    fn params(filename: &str, pages: serde_json::Value) -> ExtractPagesParams {
        ExtractPagesParams {
            filename: filename.to_string(),
            selected_pages: pages,
            new_filename: None,
            account: None,
            mode: ExtractionMode::Structural,
            scale: None,
        }
    }

    #[tokio::test]
    async fn test_extract_stores_artifact() {
        let h = harness();
        h.store.store("sample.pdf", &build_pdf(5)).unwrap();

        let result = h
            .server
            .process_extract_pages(&params("sample.pdf", json!([2, 4])))
            .await
            .unwrap();

        assert_eq!(result.page_count, 2);
        let name = result.filename.unwrap();
        assert!(name.starts_with("extracted_") && name.ends_with(".pdf"));
        assert_eq!(result.download_link.unwrap(), format!("memory://{}", name));
        assert_eq!(page_markers(&h.store.load(&name).unwrap()), vec![2, 4]);
    }

    #[tokio::test]
    async fn test_failed_extract_stores_nothing() {
        let h = harness();
        h.store.store("sample.pdf", &build_pdf(5)).unwrap();

        let mut p = params("sample.pdf", json!([1, 2, 3, 4, 5, 6]));
        p.new_filename = Some("never.pdf".to_string());
        let err = h.server.process_extract_pages(&p).await.unwrap_err();

        assert!(matches!(err, Error::PageOutOfRange { page: 6, .. }));
        assert!(!h.store.exists("never.pdf"));
        assert_eq!(h.store.len(), 1);
    }

    #[tokio::test]
    async fn test_selection_must_be_array() {
        let h = harness();
        h.store.store("sample.pdf", &build_pdf(2)).unwrap();

        for pages in [json!(1), json!("1,2"), json!([]), serde_json::Value::Null] {
            let err = h
                .server
                .process_extract_pages(&params("sample.pdf", pages))
                .await
                .unwrap_err();
            assert!(matches!(err, Error::InvalidRequest { .. }));
        }
    }

    #[tokio::test]
    async fn test_missing_source() {
        let h = harness();
        let err = h
            .server
            .process_extract_pages(&params("missing.pdf", json!([1])))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_records_on_known_account() {
        let h = harness();
        h.store.store("sample.pdf", &build_pdf(3)).unwrap();

        let mut p = params("sample.pdf", json!([3]));
        p.new_filename = Some("mine.pdf".to_string());
        p.account = Some("alice".to_string());
        h.server.process_extract_pages(&p).await.unwrap();

        assert_eq!(
            h.accounts.artifacts("alice").unwrap(),
            vec!["memory://mine.pdf"]
        );
    }

    #[tokio::test]
    async fn test_unknown_account_still_succeeds() {
        let h = harness();
        h.store.store("sample.pdf", &build_pdf(3)).unwrap();

        let mut p = params("sample.pdf", json!([1]));
        p.new_filename = Some("anon.pdf".to_string());
        p.account = Some("mallory".to_string());
        let result = h.server.process_extract_pages(&p).await.unwrap();

        assert_eq!(result.download_link.as_deref(), Some("memory://anon.pdf"));
        assert!(h.store.exists("anon.pdf"));
    }

    #[tokio::test]
    async fn test_rasterized_scale_limits() {
        let h = harness();
        h.store.store("sample.pdf", &build_pdf(1)).unwrap();

        for scale in [0.0, -1.0, 11.0, f32::NAN] {
            let mut p = params("sample.pdf", json!([1]));
            p.mode = ExtractionMode::Rasterized;
            p.scale = Some(scale);
            let err = h.server.process_extract_pages(&p).await.unwrap_err();
            assert!(matches!(err, Error::InvalidRequest { .. }));
        }
    }

    #[tokio::test]
    async fn test_new_filename_validated() {
        let h = harness();
        h.store.store("sample.pdf", &build_pdf(1)).unwrap();

        let mut p = params("sample.pdf", json!([1]));
        p.new_filename = Some("../../etc/out.pdf".to_string());
        let err = h.server.process_extract_pages(&p).await.unwrap_err();
        assert!(matches!(err, Error::InvalidName { .. }));
    }

    #[test]
    fn test_upload_and_get() {
        let h = harness();
        let data = build_pdf(1);
        let encoded = base64::engine::general_purpose::STANDARD.encode(&data);

        let uploaded = h
            .server
            .process_upload_pdf(&UploadPdfParams {
                filename: "doc.pdf".to_string(),
                base64: encoded.clone(),
            })
            .unwrap();
        assert_eq!(uploaded.size, data.len() as u64);
        assert_eq!(uploaded.address.as_deref(), Some("memory://doc.pdf"));

        let fetched = h
            .server
            .process_get_pdf(&GetPdfParams {
                filename: "doc.pdf".to_string(),
            })
            .unwrap();
        assert_eq!(fetched.data_base64.as_deref(), Some(encoded.as_str()));
    }

    #[test]
    fn test_upload_rejects_non_pdf() {
        let h = harness();
        let err = h
            .server
            .process_upload_pdf(&UploadPdfParams {
                filename: "doc.pdf".to_string(),
                base64: base64::engine::general_purpose::STANDARD.encode(b"hello"),
            })
            .unwrap_err();
        assert!(matches!(err, Error::MalformedSource { .. }));
        assert!(h.store.is_empty());
    }

    #[test]
    fn test_mode_deserialization() {
        let p: ExtractPagesParams = serde_json::from_value(json!({
            "filename": "a.pdf",
            "selected_pages": [1],
            "mode": "rasterized"
        }))
        .unwrap();
        assert_eq!(p.mode, ExtractionMode::Rasterized);

        let p: ExtractPagesParams =
            serde_json::from_value(json!({ "filename": "a.pdf" })).unwrap();
        assert_eq!(p.mode, ExtractionMode::Structural);
        assert!(p.selected_pages.is_null());
    }
}
