//! Layered arguments for the optimisation subcommands.

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_OSRM_BASE_URL, ARG_OUTPUT, ARG_PARAMS, ARG_STUDENTS, CliError, ENV_FULL_PARAMS,
    ENV_ROUTES_PARAMS, ENV_STOPS_PARAMS,
};

/// CLI arguments for the `stops` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Place stops for the students in a JSON OptimizeStopsParams \
                 file. Students come from the file itself or from --students.",
    about = "Place bus stops"
)]
#[ortho_config(prefix = "SCHOOLRUN")]
pub(crate) struct StopsArgs {
    /// Path to a JSON file containing stop placement parameters.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) params_path: Option<Utf8PathBuf>,
    /// JSON roster used when the parameters carry no students.
    #[arg(long = ARG_STUDENTS, value_name = "path")]
    #[serde(default)]
    pub(crate) students: Option<Utf8PathBuf>,
    /// Base URL of an OSRM server used for snapping and naming.
    #[arg(long = ARG_OSRM_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) osrm_base_url: Option<String>,
    /// Write the result here instead of stdout.
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
}

/// CLI arguments for the `routes` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Build routes from the depot over the stops in a JSON \
                 OptimizeVrpParams file.",
    about = "Route existing stops"
)]
#[ortho_config(prefix = "SCHOOLRUN")]
pub(crate) struct RoutesArgs {
    /// Path to a JSON file containing routing parameters.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) params_path: Option<Utf8PathBuf>,
    /// Write the result here instead of stdout.
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
}

/// CLI arguments for the `full` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Place stops, cluster them by bus capacity and route each \
                 cluster, from a JSON OptimizeFullParams file.",
    about = "Run the full optimisation"
)]
#[ortho_config(prefix = "SCHOOLRUN")]
pub(crate) struct FullArgs {
    /// Path to a JSON file containing full optimisation parameters.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) params_path: Option<Utf8PathBuf>,
    /// JSON roster used when the parameters carry no students.
    #[arg(long = ARG_STUDENTS, value_name = "path")]
    #[serde(default)]
    pub(crate) students: Option<Utf8PathBuf>,
    /// Base URL of an OSRM server used for snapping and naming.
    #[arg(long = ARG_OSRM_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) osrm_base_url: Option<String>,
    /// Write the result here instead of stdout.
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
}

impl StopsArgs {
    pub(crate) fn into_config(self) -> Result<RunConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        let config = RunConfig::try_from(merged)?;
        config.validate_sources()?;
        Ok(config)
    }
}

impl RoutesArgs {
    pub(crate) fn into_config(self) -> Result<RunConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        let config = RunConfig::try_from(merged)?;
        config.validate_sources()?;
        Ok(config)
    }
}

impl FullArgs {
    pub(crate) fn into_config(self) -> Result<RunConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        let config = RunConfig::try_from(merged)?;
        config.validate_sources()?;
        Ok(config)
    }
}

/// Resolved inputs and outputs of one optimisation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RunConfig {
    /// Parameter file.
    pub(crate) params_path: Utf8PathBuf,
    /// Optional JSON roster.
    pub(crate) students: Option<Utf8PathBuf>,
    /// Optional OSRM base URL.
    pub(crate) osrm_base_url: Option<String>,
    /// Result file; stdout when absent.
    pub(crate) output: Option<Utf8PathBuf>,
}

impl RunConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        Self::require_existing(&self.params_path, ARG_PARAMS)?;
        if let Some(students) = &self.students {
            Self::require_existing(students, ARG_STUDENTS)?;
        }
        Ok(())
    }

    fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
        match schoolrun_fs::file_is_file(path) {
            Ok(true) => Ok(()),
            Ok(false) => Err(CliError::SourcePathNotFile {
                field,
                path: path.to_path_buf(),
            }),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                Err(CliError::MissingSourceFile {
                    field,
                    path: path.to_path_buf(),
                })
            }
            Err(source) => Err(CliError::InspectSourcePath {
                field,
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

impl TryFrom<StopsArgs> for RunConfig {
    type Error = CliError;

    fn try_from(args: StopsArgs) -> Result<Self, Self::Error> {
        let params_path = args.params_path.ok_or(CliError::MissingArgument {
            field: ARG_PARAMS,
            env: ENV_STOPS_PARAMS,
        })?;
        Ok(Self {
            params_path,
            students: args.students,
            osrm_base_url: args.osrm_base_url,
            output: args.output,
        })
    }
}

impl TryFrom<RoutesArgs> for RunConfig {
    type Error = CliError;

    fn try_from(args: RoutesArgs) -> Result<Self, Self::Error> {
        let params_path = args.params_path.ok_or(CliError::MissingArgument {
            field: ARG_PARAMS,
            env: ENV_ROUTES_PARAMS,
        })?;
        Ok(Self {
            params_path,
            students: None,
            osrm_base_url: None,
            output: args.output,
        })
    }
}

impl TryFrom<FullArgs> for RunConfig {
    type Error = CliError;

    fn try_from(args: FullArgs) -> Result<Self, Self::Error> {
        let params_path = args.params_path.ok_or(CliError::MissingArgument {
            field: ARG_PARAMS,
            env: ENV_FULL_PARAMS,
        })?;
        Ok(Self {
            params_path,
            students: args.students,
            osrm_base_url: args.osrm_base_url,
            output: args.output,
        })
    }
}

#[cfg(test)]
pub(crate) fn stops_config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<RunConfig, CliError> {
    let merged = StopsArgs::merge_from_layers(layers).map_err(CliError::from)?;
    RunConfig::try_from(merged)
}
