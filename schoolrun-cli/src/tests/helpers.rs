//! Test helpers writing parameter and roster files into a scratch directory.

use camino::{Utf8Path, Utf8PathBuf};
use schoolrun_core::test_support::students_around;
use schoolrun_core::{LatLng, OptimizeFullParams, OptimizeStopsParams, OptimizeVrpParams, Student};
use serde::Serialize;
use tempfile::TempDir;

pub(super) const SCHOOL: LatLng = LatLng::new(50.08, 14.42);

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    let text = std::str::from_utf8(contents).expect("utf-8 contents");
    schoolrun_fs::write_string(path, text).expect("write file");
}

pub(super) fn write_json<T: Serialize>(path: &Utf8Path, value: &T) {
    let payload = serde_json::to_string_pretty(value).expect("serialise fixture");
    write_utf8(path, payload.as_bytes());
}

/// Scratch directory holding CLI inputs and outputs.
#[derive(Debug)]
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    pub(super) fn path(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name)
    }
}

pub(super) fn neighbourhood(count: usize) -> Vec<Student> {
    let centre = geo::Coord {
        x: SCHOOL.lng + 0.01,
        y: SCHOOL.lat,
    };
    students_around(centre, count, 150.0, 1)
}

pub(super) const fn stop_params() -> OptimizeStopsParams {
    OptimizeStopsParams::new(400.0, 20, SCHOOL, 10_000.0)
}

pub(super) fn full_params(students: Vec<Student>, capacity: i64) -> OptimizeFullParams {
    OptimizeFullParams::new(stop_params().with_students(students), capacity)
}

pub(super) fn vrp_params_from(stops: OptimizeStopsParams) -> OptimizeVrpParams {
    let placed = schoolrun_solver::OptimizationEngine::default()
        .optimize_stops(&stops)
        .expect("stops placed");
    OptimizeVrpParams::new(SCHOOL, 30, placed.stops)
}
