use clap::Parser;
use pdf_extract_server::ServerConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pdf-extract-server")]
#[command(about = "MCP server that extracts selected pages from uploaded PDFs")]
#[command(version)]
pub struct Cli {
    /// Directory uploaded and extracted files are stored in
    #[arg(long, default_value = "uploads")]
    pub upload_dir: PathBuf,

    /// Base URL for download links, e.g. http://localhost:3000
    #[arg(long)]
    pub public_base_url: Option<String>,

    /// Keep files in memory instead of writing them to --upload-dir
    #[arg(long)]
    pub in_memory: bool,

    /// Maximum number of files kept with --in-memory
    #[arg(long, default_value = "100")]
    pub cache_max_entries: usize,

    /// Maximum total bytes kept with --in-memory
    #[arg(long, default_value = "536870912")]
    pub cache_max_bytes: usize,

    /// Maximum decoded size of an upload in bytes
    #[arg(long, default_value = "104857600")]
    pub max_upload_bytes: u64,

    /// Render scale for rasterized extraction
    #[arg(long, default_value = "2.0")]
    pub raster_scale: f32,

    /// Largest render scale a caller may request
    #[arg(long, default_value = "10.0")]
    pub max_raster_scale: f32,

    /// JPEG quality (1-100) for rasterized pages
    #[arg(long, default_value = "85", value_parser = clap::value_parser!(u8).range(1..=100))]
    pub jpeg_quality: u8,

    /// Register an account that extracted files can be recorded on (repeatable)
    #[arg(short, long = "account")]
    pub accounts: Vec<String>,
}

impl Cli {
    pub fn into_config(self) -> ServerConfig {
        ServerConfig {
            upload_dir: self.upload_dir,
            public_base_url: self.public_base_url,
            in_memory: self.in_memory,
            cache_max_entries: self.cache_max_entries,
            cache_max_bytes: self.cache_max_bytes,
            max_upload_bytes: self.max_upload_bytes,
            raster_scale: self.raster_scale,
            max_raster_scale: self.max_raster_scale,
            jpeg_quality: self.jpeg_quality,
            accounts: self.accounts,
        }
    }
}
