//! CLI error handling with user-friendly messages.
//!
//! Centralizes the fatal-before-start failures: everything recoverable
//! stays inside per-job result messages and never reaches this type.

use std::fmt;
use std::process;

use tilewright::merge::MergeError;
use tilewright::overview::OverviewError;
use tilewright::pool::PoolError;
use tilewright::raster::RasterError;
use tilewright::tileset::TilesetError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Failed to create the Tokio runtime or install signal handling
    Runtime(String),
    /// Invalid worker pool configuration
    Pool(PoolError),
    /// A tileset root could not be opened
    Tileset(TilesetError),
    /// Overview build failed before any job ran
    Overviews(OverviewError),
    /// Merge setup failed before any job ran
    Merge(MergeError),
    /// Raster ingestion setup or batch failure
    Ingest(RasterError),
    /// Failed to create the HTTP client
    HttpClient(String),
}

impl CliError {
    /// Exits the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {self}");

        if let CliError::Ingest(_) = self {
            eprintln!();
            eprintln!("Raster ingestion requires the GDAL tools on PATH:");
            eprintln!("  gdal_translate and gdal2tiles.py (package 'gdal-bin')");
        }

        process::exit(1);
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "failed to initialize logging: {msg}"),
            CliError::Runtime(msg) => write!(f, "failed to start runtime: {msg}"),
            CliError::Pool(e) => write!(f, "invalid worker configuration: {e}"),
            CliError::Tileset(e) => write!(f, "cannot open tileset: {e}"),
            CliError::Overviews(e) => write!(f, "overview build failed: {e}"),
            CliError::Merge(e) => write!(f, "merge failed: {e}"),
            CliError::Ingest(e) => write!(f, "raster ingestion failed: {e}"),
            CliError::HttpClient(msg) => write!(f, "cannot create HTTP client: {msg}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Pool(e) => Some(e),
            CliError::Tileset(e) => Some(e),
            CliError::Overviews(e) => Some(e),
            CliError::Merge(e) => Some(e),
            CliError::Ingest(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_cause() {
        let err = CliError::HttpClient("bad TLS config".to_string());
        assert!(err.to_string().contains("bad TLS config"));

        let err = CliError::Pool(PoolError::NoWorkers);
        assert!(err.to_string().contains("at least one worker"));
    }
}
