//! Optimisation command implementation for the schoolrun CLI.

use std::{io::Write, sync::Arc};

use camino::Utf8Path;
use log::{info, warn};
use schoolrun_core::{
    NoRefinement, NoStudentSource, OptimizeFullParams, OptimizeStopsParams, OptimizeVrpParams,
    PlaceNamer, RoadSnapper, StudentRepository,
};
use schoolrun_data::{
    JsonStudentRepository,
    routing::{OsrmClientConfig, OsrmNearestClient},
};
use schoolrun_solver::{EngineConfig, OptimizationEngine};
use serde::{Serialize, de::DeserializeOwned};

use crate::{CliError, config::RunConfig};

/// Engine assembled from the run configuration.
pub(crate) type CliEngine =
    OptimizationEngine<Box<dyn StudentRepository>, Arc<dyn RoadSnapper>, Arc<dyn PlaceNamer>>;

/// Boundary operation selected by the subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operation {
    Stops,
    Routes,
    Full,
}

pub(crate) fn run_operation(
    operation: Operation,
    config: &RunConfig,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let engine = build_engine(config)?;
    let payload = match operation {
        Operation::Stops => {
            let params: OptimizeStopsParams = load_params(&config.params_path)?;
            warn_on_missing_refinement(config, &params);
            let result = engine.optimize_stops(&params)?;
            info!(
                "placed {} stops for {} of {} students",
                result.stats.total_stops,
                result.stats.assigned_students,
                result.stats.total_students
            );
            to_json(&result)?
        }
        Operation::Routes => {
            let params: OptimizeVrpParams = load_params(&config.params_path)?;
            let result = engine.optimize_vrp(&params)?;
            info!("built {} routes", result.stats.total_routes);
            to_json(&result)?
        }
        Operation::Full => {
            let params: OptimizeFullParams = load_params(&config.params_path)?;
            warn_on_missing_refinement(config, &params.stops);
            let result = engine.optimize_full(&params)?;
            info!(
                "built {} routes over {} clusters",
                result.summary.total_routes, result.summary.cluster_count
            );
            to_json(&result)?
        }
    };
    write_output(config.output.as_deref(), writer, &payload)
}

pub(crate) fn build_engine(config: &RunConfig) -> Result<CliEngine, CliError> {
    let repository: Box<dyn StudentRepository> = match &config.students {
        Some(path) => Box::new(JsonStudentRepository::new(path.clone())),
        None => Box::new(NoStudentSource),
    };
    let (snapper, namer) = build_refinement(config.osrm_base_url.as_deref())?;
    Ok(OptimizationEngine::with_refinement(
        repository,
        snapper,
        namer,
        EngineConfig::default(),
    ))
}

fn build_refinement(
    base_url: Option<&str>,
) -> Result<(Arc<dyn RoadSnapper>, Arc<dyn PlaceNamer>), CliError> {
    let Some(base_url) = base_url else {
        let snapper: Arc<dyn RoadSnapper> = Arc::new(NoRefinement);
        let namer: Arc<dyn PlaceNamer> = Arc::new(NoRefinement);
        return Ok((snapper, namer));
    };
    let client = OsrmNearestClient::with_config(OsrmClientConfig::new(base_url)).map_err(
        |source| CliError::BuildRoutingClient {
            base_url: base_url.to_owned(),
            source,
        },
    )?;
    let shared = Arc::new(client);
    let snapper: Arc<dyn RoadSnapper> = Arc::<OsrmNearestClient>::clone(&shared);
    let namer: Arc<dyn PlaceNamer> = shared;
    Ok((snapper, namer))
}

/// Loads JSON-encoded parameters from disk.
pub(crate) fn load_params<T: DeserializeOwned>(path: &Utf8Path) -> Result<T, CliError> {
    let text = schoolrun_fs::read_to_string(path).map_err(|source| CliError::ReadParams {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::ParseParams {
        path: path.to_path_buf(),
        source,
    })
}

fn to_json<T: Serialize>(result: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(result).map_err(CliError::SerialiseResult)
}

fn write_output(
    output: Option<&Utf8Path>,
    writer: &mut dyn Write,
    payload: &str,
) -> Result<(), CliError> {
    if let Some(path) = output {
        schoolrun_fs::write_string(path, payload).map_err(CliError::WriteOutput)?;
        info!("wrote result to {path}");
        return Ok(());
    }
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

/// Warns when the parameters ask for refinement that has no service behind it.
fn warn_on_missing_refinement(config: &RunConfig, params: &OptimizeStopsParams) {
    if config.osrm_base_url.is_none() && (params.use_roads_api || params.use_places_api) {
        warn!("refinement requested without --osrm-base-url; stops keep raw data");
    }
}
