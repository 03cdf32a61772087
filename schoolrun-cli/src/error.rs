//! Error types emitted by the schoolrun CLI.
//!
//! Keep this error type reasonably small, as every CLI helper returns
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use schoolrun_core::OptimizeError;
use schoolrun_data::routing::ClientBuildError;
use thiserror::Error;

/// Errors emitted by the schoolrun CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Flag name.
        field: &'static str,
        /// Environment variable name.
        env: &'static str,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        /// Flag name.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        /// Flag name.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        /// Flag name.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// Reading the parameter file failed.
    #[error("failed to read parameters at {path:?}: {source}")]
    ReadParams {
        /// Parameter file.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// The parameter file held invalid JSON.
    #[error("failed to parse parameters JSON at {path:?}: {source}")]
    ParseParams {
        /// Parameter file.
        path: Utf8PathBuf,
        /// Decoder error.
        #[source]
        source: serde_json::Error,
    },
    /// Constructing the OSRM client failed.
    #[error("failed to build routing client for {base_url:?}: {source}")]
    BuildRoutingClient {
        /// Configured OSRM base URL.
        base_url: String,
        /// Construction failure.
        #[source]
        source: ClientBuildError,
    },
    /// The engine rejected the request or failed.
    #[error("optimisation failed: {0}")]
    Optimise(#[from] OptimizeError),
    /// Serialising the result failed.
    #[error("failed to serialise result: {0}")]
    SerialiseResult(#[source] serde_json::Error),
    /// Writing the result failed.
    #[error("failed to write result: {0}")]
    WriteOutput(#[source] std::io::Error),
}
