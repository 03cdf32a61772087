//! Capability-based UTF-8 file helpers shared by the data adapters and CLI.
//!
//! Paths arrive as `camino` UTF-8 paths from configuration. Each helper opens
//! the narrowest ambient directory it needs with `cap-std` and performs the
//! operation relative to it.
#![forbid(unsafe_code)]

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};

/// Open the directory holding `path` and return it with the file name.
///
/// # Errors
///
/// Fails when `path` has no file name or its directory cannot be opened.
pub fn open_dir_and_file(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::other(format!("{path} does not name a file")))?
        .to_owned();
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, file_name))
}

/// Read the whole of `path` as UTF-8 text.
///
/// # Errors
///
/// Propagates open and read failures, including invalid UTF-8.
pub fn read_to_string(path: &Utf8Path) -> io::Result<String> {
    let (dir, name) = open_dir_and_file(path)?;
    dir.read_to_string(name.as_str())
}

/// Write `contents` to `path`, creating missing parent directories.
///
/// # Errors
///
/// Propagates directory creation and write failures.
pub fn write_string(path: &Utf8Path, contents: &str) -> io::Result<()> {
    ensure_parent_dir(path)?;
    let (dir, name) = open_dir_and_file(path)?;
    dir.write(name.as_str(), contents)
}

/// Whether `path` is a regular file.
///
/// # Errors
///
/// Fails with [`io::ErrorKind::NotFound`] when `path` does not exist, and
/// with other kinds when it cannot be inspected.
pub fn file_is_file(path: &Utf8Path) -> io::Result<bool> {
    let (dir, name) = open_dir_and_file(path)?;
    dir.metadata(name.as_str()).map(|meta| meta.is_file())
}

/// Create every missing directory above `path`.
///
/// # Errors
///
/// Propagates failures opening the base directory or creating children.
pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_str().is_empty() {
        return Ok(());
    }
    let (base, relative) = split_base(parent)?;
    if relative.as_str().is_empty() {
        return Ok(());
    }
    base.create_dir_all(&relative)
}

/// Split `dir` into an ambient base directory and the path below it.
///
/// Absolute paths are rooted at their filesystem root (or drive prefix);
/// relative paths at the working directory.
fn split_base(dir: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let (base, relative) = if dir.is_absolute() {
        let root = dir.ancestors().last().unwrap_or(dir);
        let relative = dir
            .strip_prefix(root)
            .map_err(|_| io::Error::other(format!("cannot strip {root} from {dir}")))?;
        (root, relative.to_owned())
    } else {
        (Utf8Path::new("."), dir.to_owned())
    };
    let base_dir = fs_utf8::Dir::open_ambient_dir(base, ambient_authority())?;
    Ok((base_dir, relative))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn scratch() -> (TempDir, Utf8PathBuf) {
        let temp = tempfile::tempdir().expect("create temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("UTF-8 temp path");
        (temp, root)
    }

    #[rstest]
    fn writes_into_missing_directories(scratch: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = scratch;
        let target = root.join("out/nested/result.json");
        write_string(&target, "{}").expect("write result");
        assert_eq!(read_to_string(&target).expect("read back"), "{}");
        assert!(file_is_file(&target).expect("stat"));
    }

    #[rstest]
    fn missing_file_reports_not_found(scratch: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = scratch;
        let err = file_is_file(&root.join("absent.json")).expect_err("missing file");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[rstest]
    fn directories_are_not_files(scratch: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = scratch;
        write_string(&root.join("sub/result.json"), "{}").expect("write result");
        assert!(!file_is_file(&root.join("sub")).expect("stat"));
    }

    #[rstest]
    fn reading_a_missing_file_fails(scratch: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = scratch;
        let err = read_to_string(&root.join("absent.json")).expect_err("missing file");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[rstest]
    fn directory_paths_have_no_file_name() {
        assert!(open_dir_and_file(Utf8Path::new("/")).is_err());
    }
}
