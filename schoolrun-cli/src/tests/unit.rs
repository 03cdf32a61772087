//! Focused unit tests covering CLI configuration, parameter loading and output.

use super::helpers::{Workspace, full_params, neighbourhood, stop_params, write_json, write_utf8};
use super::*;
use crate::config::{RunConfig, StopsArgs, RoutesArgs, FullArgs, stops_config_from_layers_for_test};
use crate::optimise::{Operation, build_engine, load_params, run_operation};
use rstest::{fixture, rstest};
use schoolrun_core::{FullResult, OptimizeStopsParams, Tier1Result};

#[fixture]
fn workspace() -> Workspace {
    Workspace::new()
}

fn run_config(params_path: camino::Utf8PathBuf) -> RunConfig {
    RunConfig {
        params_path,
        students: None,
        osrm_base_url: None,
        output: None,
    }
}

#[rstest]
fn converting_stops_without_params_errors() {
    let err = RunConfig::try_from(StopsArgs::default()).expect_err("missing params should error");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_PARAMS);
            assert_eq!(env, ENV_STOPS_PARAMS);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
#[case::routes(RunConfig::try_from(RoutesArgs::default()), ENV_ROUTES_PARAMS)]
#[case::full(RunConfig::try_from(FullArgs::default()), ENV_FULL_PARAMS)]
fn missing_params_name_the_subcommand_variable(
    #[case] outcome: Result<RunConfig, CliError>,
    #[case] expected_env: &'static str,
) {
    match outcome.expect_err("missing params should error") {
        CliError::MissingArgument { env, .. } => assert_eq!(env, expected_env),
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn routes_ignore_students_and_refinement(workspace: Workspace) {
    let args = RoutesArgs {
        params_path: Some(workspace.path("vrp.json")),
        output: Some(workspace.path("out.json")),
    };
    let config = RunConfig::try_from(args).expect("config should build");
    assert_eq!(config.students, None);
    assert_eq!(config.osrm_base_url, None);
    assert_eq!(config.output, Some(workspace.path("out.json")));
}

#[rstest]
fn validate_sources_reports_missing_params(workspace: Workspace) {
    let config = run_config(workspace.path("absent.json"));
    match config.validate_sources().expect_err("expected failure") {
        CliError::MissingSourceFile { field, .. } => assert_eq!(field, ARG_PARAMS),
        other => panic!("expected MissingSourceFile, found {other:?}"),
    }
}

#[rstest]
fn validate_sources_reports_missing_roster(workspace: Workspace) {
    let params_path = workspace.path("params.json");
    write_utf8(&params_path, b"{}");
    let config = RunConfig {
        students: Some(workspace.path("roster.json")),
        ..run_config(params_path)
    };
    match config.validate_sources().expect_err("expected failure") {
        CliError::MissingSourceFile { field, path } => {
            assert_eq!(field, ARG_STUDENTS);
            assert_eq!(path, workspace.path("roster.json"));
        }
        other => panic!("expected MissingSourceFile, found {other:?}"),
    }
}

#[rstest]
fn validate_sources_reports_not_file(workspace: Workspace) {
    let params_dir = workspace.path("params");
    write_utf8(&params_dir.join("inner.json"), b"{}");
    let config = run_config(params_dir.clone());
    match config
        .validate_sources()
        .expect_err("expected directory path to fail validation")
    {
        CliError::SourcePathNotFile { field, path } => {
            assert_eq!(field, ARG_PARAMS);
            assert_eq!(path, params_dir);
        }
        other => panic!("expected SourcePathNotFile, found {other:?}"),
    }
}

#[rstest]
fn load_params_decodes_json(workspace: Workspace) {
    let path = workspace.path("params.json");
    let params = stop_params().with_students(neighbourhood(5));
    write_json(&path, &params);

    let decoded: OptimizeStopsParams = load_params(&path).expect("params should decode");
    assert_eq!(decoded, params);
}

#[rstest]
fn load_params_rejects_invalid_json(workspace: Workspace) {
    let path = workspace.path("params.json");
    write_utf8(&path, b"{ not valid json");
    match load_params::<OptimizeStopsParams>(&path).expect_err("invalid json should error") {
        CliError::ParseParams { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("expected ParseParams, found {other:?}"),
    }
}

#[rstest]
fn load_params_io_error_returns_read_error(workspace: Workspace) {
    let path = workspace.path("params.json");
    match load_params::<OptimizeStopsParams>(&path).expect_err("missing params should error") {
        CliError::ReadParams { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("expected ReadParams, found {other:?}"),
    }
}

#[rstest]
fn stops_result_is_written_to_the_writer(workspace: Workspace) {
    let path = workspace.path("params.json");
    write_json(&path, &stop_params().with_students(neighbourhood(12)));
    let mut stdout = Vec::new();

    run_operation(Operation::Stops, &run_config(path), &mut stdout).expect("stops run");

    let result: Tier1Result = serde_json::from_slice(&stdout).expect("result json");
    assert_eq!(result.stats.assigned_students, 12);
}

#[rstest]
fn full_result_is_written_to_the_output_file(workspace: Workspace) {
    let path = workspace.path("params.json");
    write_json(&path, &full_params(neighbourhood(30), 20));
    let output = workspace.path("results/full.json");
    let config = RunConfig {
        output: Some(output.clone()),
        ..run_config(path)
    };
    let mut stdout = Vec::new();

    run_operation(Operation::Full, &config, &mut stdout).expect("full run");

    assert!(stdout.is_empty());
    let text = schoolrun_fs::read_to_string(&output).expect("output written");
    let result: FullResult = serde_json::from_str(&text).expect("result json");
    assert_eq!(result.summary.routed_students, 30);
    assert!(result.summary.total_routes >= 2);
}

#[rstest]
fn engine_builds_with_an_osrm_base_url(workspace: Workspace) {
    let config = RunConfig {
        osrm_base_url: Some("http://localhost:5000".to_owned()),
        ..run_config(workspace.path("params.json"))
    };
    assert!(build_engine(&config).is_ok());
}

#[rstest]
fn merge_layers_maps_configuration_errors() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_cli(json!({ "params_path": 42 }));

    let err = stops_config_from_layers_for_test(composer.layers())
        .expect_err("invalid config layer should map to CliError::Configuration");
    match err {
        CliError::Configuration(_) => {}
        other => panic!("expected CliError::Configuration, found {other:?}"),
    }
}

#[rstest]
fn merge_layers_honours_precedence(workspace: Workspace) {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let env_params = workspace.path("from-env.json");
    let cli_output = workspace.path("from-cli.json");
    let mut composer = MergeComposer::new();
    composer.push_file(
        json!({
            "params_path": workspace.path("from-file.json").as_str(),
            "osrm_base_url": "http://from-file:5000",
            "output": workspace.path("from-file-output.json").as_str(),
        }),
        None,
    );
    composer.push_environment(json!({
        "params_path": env_params.as_str(),
    }));
    composer.push_cli(json!({
        "output": cli_output.as_str(),
    }));

    let config =
        stops_config_from_layers_for_test(composer.layers()).expect("merged config should build");
    assert_eq!(config.params_path, env_params);
    assert_eq!(config.output, Some(cli_output));
    assert_eq!(config.osrm_base_url.as_deref(), Some("http://from-file:5000"));
}
