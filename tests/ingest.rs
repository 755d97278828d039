use std::{fs, path::Path};

use junit_ingest::{ingest_dir, ingest_file, ingest_files, ingest_paths, IngestError};
use tempfile::TempDir;

const PASSING: &str =
    r#"<testsuites><testsuite name="passing"><testcase name="ok"/></testsuite></testsuites>"#;
const FAILING: &str = r#"<testsuite name="failing"><testcase name="broken"><failure message="boom"/></testcase></testsuite>"#;
const MALFORMED: &str = r#"<testsuite name="bad"><testcase></testsuite>"#;

fn write(dir: &Path, relative: &str, contents: &str) {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn suite_names(suites: &[junit_ingest::junit::Suite]) -> Vec<&str> {
    suites.iter().map(|s| s.name.as_str()).collect()
}

#[test]
fn ingests_a_single_file() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "report.xml", FAILING);

    let suites = ingest_file(temp_dir.path().join("report.xml")).unwrap();
    assert_eq!(suite_names(&suites), ["failing"]);
    assert_eq!(suites[0].totals().failed, 1);
}

#[test]
fn missing_file_names_the_path() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("missing.xml");

    let err = ingest_file(&missing).unwrap_err();
    assert!(err.to_string().contains("missing.xml"), "{err}");
}

#[test]
fn malformed_file_fails_with_path_context() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "bad.xml", MALFORMED);

    let err = ingest_file(temp_dir.path().join("bad.xml")).unwrap_err();
    assert!(err.to_string().contains("bad.xml"), "{err}");
    assert!(err
        .downcast_ref::<IngestError>()
        .map(IngestError::is_malformed)
        .unwrap_or(false));
}

#[test]
fn files_are_concatenated_in_order() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "a.xml", FAILING);
    write(temp_dir.path(), "b.xml", PASSING);

    let suites = ingest_files([
        temp_dir.path().join("b.xml"),
        temp_dir.path().join("a.xml"),
    ])
    .unwrap();
    assert_eq!(suite_names(&suites), ["passing", "failing"]);
}

#[test]
fn first_bad_file_stops_the_batch() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "a.xml", PASSING);
    write(temp_dir.path(), "b.xml", MALFORMED);
    write(temp_dir.path(), "c.xml", FAILING);

    let err = ingest_files(["a.xml", "b.xml", "c.xml"].map(|f| temp_dir.path().join(f)))
        .unwrap_err();
    assert!(err.to_string().contains("b.xml"), "{err}");
}

#[test]
fn directory_search_is_recursive_and_filters_xml() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "unit/a.xml", PASSING);
    write(temp_dir.path(), "unit/nested/b.xml", FAILING);
    write(temp_dir.path(), "notes.txt", MALFORMED);
    write(temp_dir.path(), "report.xml.bak", MALFORMED);

    let suites = ingest_dir(temp_dir.path()).unwrap();
    assert_eq!(suite_names(&suites), ["passing", "failing"]);
}

#[test]
fn empty_directory_yields_no_suites() {
    let temp_dir = TempDir::new().unwrap();
    assert!(ingest_dir(temp_dir.path()).unwrap().is_empty());
}

#[test]
fn paths_accept_files_directories_and_globs() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "dir/one.xml", PASSING);
    write(temp_dir.path(), "globbed/two.xml", FAILING);
    write(temp_dir.path(), "single.xml", PASSING);

    let root = temp_dir.path().to_string_lossy().to_string();
    let suites = ingest_paths(&[
        format!("{root}/dir"),
        format!("{root}/globbed/*.xml"),
        format!("{root}/single.xml"),
    ])
    .unwrap();
    assert_eq!(suite_names(&suites), ["passing", "failing", "passing"]);
}

#[test]
fn unmatched_path_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let pattern = format!("{}/nothing-here/*.xml", temp_dir.path().to_string_lossy());

    let err = ingest_paths(&[pattern]).unwrap_err();
    assert!(err.to_string().contains("no junit files matched"), "{err}");
}

#[test]
fn missing_directory_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("not-here");

    let err = ingest_dir(&missing).unwrap_err();
    assert!(err.to_string().contains("not-here"), "{err}");
}

#[test]
fn file_is_not_a_directory() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "report.xml", PASSING);

    let err = ingest_dir(temp_dir.path().join("report.xml")).unwrap_err();
    assert!(err.to_string().contains("is not a directory"), "{err}");
}

#[cfg(unix)]
#[test]
fn unreadable_subdirectory_stops_the_search() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "a.xml", PASSING);
    write(temp_dir.path(), "locked/b.xml", FAILING);

    let locked = temp_dir.path().join("locked");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    // Privileged users can read the directory regardless of its mode.
    let readable = fs::read_dir(&locked).is_ok();

    let result = ingest_dir(temp_dir.path());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    if readable {
        assert_eq!(suite_names(&result.unwrap()), ["passing", "failing"]);
    } else {
        let err = result.unwrap_err();
        assert!(err.to_string().contains("failed to search"), "{err}");
    }
}
