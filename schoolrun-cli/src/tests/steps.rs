//! Behaviour-driven step definitions driving the optimisation CLI scenarios.

use super::helpers::{
    Workspace, full_params, neighbourhood, stop_params, vrp_params_from, write_json,
};
use super::*;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use schoolrun_core::{FullResult, OptimizeError, Tier1Result, Tier2Result};
use std::cell::RefCell;

#[derive(Debug)]
struct CliWorld {
    workspace: Workspace,
    stdout: RefCell<Vec<u8>>,
    result: RefCell<Option<Result<(), CliError>>>,
}

impl CliWorld {
    fn new() -> Self {
        Self {
            workspace: Workspace::new(),
            stdout: RefCell::new(Vec::new()),
            result: RefCell::new(None),
        }
    }

    fn params_path(&self) -> camino::Utf8PathBuf {
        self.workspace.path("params.json")
    }

    fn roster_path(&self) -> camino::Utf8PathBuf {
        self.workspace.path("roster.json")
    }

    fn output_path(&self) -> camino::Utf8PathBuf {
        self.workspace.path("out/result.json")
    }

    fn run(&self, argv: &[String]) {
        let mut stdout = self.stdout.borrow_mut();
        let outcome = Cli::try_parse_from(argv)
            .map_err(CliError::ArgumentParsing)
            .and_then(|cli| dispatch(cli, &mut *stdout));
        self.result.replace(Some(outcome));
    }

    fn printed<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.stdout.borrow()).expect("stdout holds a JSON result")
    }

    fn error_message(&self) -> String {
        let borrowed = self.result.borrow();
        let error = borrowed
            .as_ref()
            .expect("result recorded")
            .as_ref()
            .expect_err("expected error");
        error.to_string()
    }
}

#[fixture]
fn world() -> CliWorld {
    CliWorld::new()
}

fn argv(parts: &[&str]) -> Vec<String> {
    std::iter::once("schoolrun")
        .chain(parts.iter().copied())
        .map(str::to_owned)
        .collect()
}

#[given("a stop parameter file with {count} students")]
fn stop_file_with_students(#[from(world)] world: &CliWorld, count: usize) {
    write_json(
        &world.params_path(),
        &stop_params().with_students(neighbourhood(count)),
    );
}

#[given("a stop parameter file without students")]
fn stop_file_without_students(#[from(world)] world: &CliWorld) {
    write_json(&world.params_path(), &stop_params());
}

#[given("a stop parameter file with a negative walking radius")]
fn stop_file_with_negative_radius(#[from(world)] world: &CliWorld) {
    let mut params = stop_params().with_students(neighbourhood(3));
    params.r_walk = -5.0;
    write_json(&world.params_path(), &params);
}

#[given("a roster file with {count} students")]
fn roster_file(#[from(world)] world: &CliWorld, count: usize) {
    write_json(&world.roster_path(), &neighbourhood(count));
}

#[given("a routing parameter file for {count} students")]
fn routing_file(#[from(world)] world: &CliWorld, count: usize) {
    let params = vrp_params_from(stop_params().with_students(neighbourhood(count)));
    write_json(&world.params_path(), &params);
}

#[given("a full parameter file with {count} students and buses of {capacity}")]
fn full_file(#[from(world)] world: &CliWorld, count: usize, capacity: i64) {
    write_json(
        &world.params_path(),
        &full_params(neighbourhood(count), capacity),
    );
}

#[when("I run the stops command")]
fn run_stops(#[from(world)] world: &CliWorld) {
    world.run(&argv(&["stops", world.params_path().as_str()]));
}

#[when("I run the stops command with the roster")]
fn run_stops_with_roster(#[from(world)] world: &CliWorld) {
    world.run(&argv(&[
        "stops",
        world.params_path().as_str(),
        &format!("--{ARG_STUDENTS}"),
        world.roster_path().as_str(),
    ]));
}

#[when("I run the stops command without a parameter path")]
fn run_stops_without_params(#[from(world)] world: &CliWorld) {
    world.run(&argv(&["stops"]));
}

#[when("I run the routes command")]
fn run_routes(#[from(world)] world: &CliWorld) {
    world.run(&argv(&["routes", world.params_path().as_str()]));
}

#[when("I run the full command with an output file")]
fn run_full(#[from(world)] world: &CliWorld) {
    world.run(&argv(&[
        "full",
        world.params_path().as_str(),
        &format!("--{ARG_OUTPUT}"),
        world.output_path().as_str(),
    ]));
}

#[then("the command succeeds")]
fn command_succeeds(#[from(world)] world: &CliWorld) {
    let borrowed = world.result.borrow();
    if let Some(Err(err)) = borrowed.as_ref() {
        panic!("expected success, found {err}");
    }
    assert!(borrowed.is_some(), "command should have run");
}

#[then("the printed result assigns {count} students")]
fn printed_assignment(#[from(world)] world: &CliWorld, count: usize) {
    let result: Tier1Result = world.printed();
    assert_eq!(result.stats.assigned_students, count);
}

#[then("the printed routes carry {count} students")]
fn printed_routes(#[from(world)] world: &CliWorld, count: usize) {
    let result: Tier2Result = world.printed();
    assert_eq!(result.stats.total_students, count);
    assert!(result.stats.unrouted.is_empty());
}

#[then("nothing is printed")]
fn nothing_printed(#[from(world)] world: &CliWorld) {
    assert!(world.stdout.borrow().is_empty());
}

#[then("the output file routes {count} students")]
fn output_file_routes(#[from(world)] world: &CliWorld, count: usize) {
    let text = schoolrun_fs::read_to_string(&world.output_path()).expect("output written");
    let result: FullResult = serde_json::from_str(&text).expect("result json");
    assert_eq!(result.summary.routed_students, count);
}

#[then("the CLI reports that the params path is missing")]
fn reports_missing_params(#[from(world)] world: &CliWorld) {
    let borrowed = world.result.borrow();
    let error = borrowed
        .as_ref()
        .expect("result recorded")
        .as_ref()
        .expect_err("expected error");
    match error {
        CliError::MissingArgument { field, env } => {
            assert_eq!(*field, ARG_PARAMS);
            assert_eq!(*env, ENV_STOPS_PARAMS);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[then("the CLI reports a validation failure for {field}")]
fn reports_validation_failure(#[from(world)] world: &CliWorld, field: String) {
    {
        let borrowed = world.result.borrow();
        let error = borrowed
            .as_ref()
            .expect("result recorded")
            .as_ref()
            .expect_err("expected error");
        match error {
            CliError::Optimise(OptimizeError::Validation(errors)) => {
                assert!(errors.contains(&field), "{errors}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
    assert!(world.error_message().contains(&field));
}

macro_rules! register_optimise_scenario {
    ($fn_name:ident, $scenario_title:literal) => {
        #[scenario(path = "tests/features/optimise_command.feature", name = $scenario_title)]
        fn $fn_name(#[from(world)] world: CliWorld) {
            let _ = world;
        }
    };
}

register_optimise_scenario!(stops_from_params, "placing stops from a parameter file");
register_optimise_scenario!(stops_from_roster, "placing stops from a separate roster");
register_optimise_scenario!(routes_from_stops, "routing previously placed stops");
register_optimise_scenario!(
    full_into_output,
    "running the full optimisation into an output file"
);
register_optimise_scenario!(missing_params_path, "rejecting a missing parameter path");
register_optimise_scenario!(invalid_parameters, "rejecting invalid parameters");
