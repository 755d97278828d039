use std::{
    fs,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use anyhow::Context;
use glob::glob;

use crate::{
    error::IngestError,
    junit::{classify, Suite},
    xml::parse_document,
};

/// Parses a JUnit XML document and returns every suite it contains.
pub fn ingest<R: BufRead>(xml: R) -> Result<Vec<Suite>, IngestError> {
    let forest = parse_document(xml)?;
    Ok(classify(&forest))
}

pub fn ingest_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Suite>> {
    let path = path.as_ref();
    log::debug!("ingesting {}", path.display());

    let file =
        fs::File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    ingest(BufReader::new(file)).with_context(|| format!("failed to ingest {}", path.display()))
}

/// Ingests each file in order. The first failure aborts the whole batch.
pub fn ingest_files<I, P>(paths: I) -> anyhow::Result<Vec<Suite>>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut suites = Vec::new();
    for path in paths {
        suites.extend(ingest_file(path)?);
    }
    Ok(suites)
}

/// Ingests every regular `.xml` file below `directory`, in path order.
pub fn ingest_dir<P: AsRef<Path>>(directory: P) -> anyhow::Result<Vec<Suite>> {
    let files = xml_files_in(directory.as_ref())?;
    ingest_files(files)
}

/// Resolves each argument to files and ingests them. Directories are
/// searched for `.xml` files; anything else is treated as a glob pattern.
pub fn ingest_paths<T: AsRef<str>>(junit_paths: &[T]) -> anyhow::Result<Vec<Suite>> {
    let mut files = Vec::new();
    for junit_path in junit_paths {
        let junit_path = junit_path.as_ref();
        if Path::new(junit_path).is_dir() {
            files.extend(xml_files_in(Path::new(junit_path))?);
        } else {
            files.extend(scan_from_glob(junit_path)?);
        }
    }
    ingest_files(files)
}

fn xml_files_in(directory: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let metadata = fs::metadata(directory)
        .with_context(|| format!("failed to read directory {}", directory.display()))?;
    if !metadata.is_dir() {
        return Err(anyhow::anyhow!("{} is not a directory", directory.display()));
    }

    let pattern = Path::new(&glob::Pattern::escape(&directory.to_string_lossy())).join("**/*.xml");
    let mut files = Vec::new();
    for entry in glob(&pattern.to_string_lossy())? {
        let path = entry.with_context(|| format!("failed to search {}", directory.display()))?;
        if is_regular_file(&path) {
            files.push(path);
        }
    }
    files.sort();

    log::info!(
        "found {} junit files in {}",
        files.len(),
        directory.display()
    );
    Ok(files)
}

fn scan_from_glob(glob_path: &str) -> anyhow::Result<Vec<PathBuf>> {
    let paths = glob(glob_path)
        .with_context(|| format!("invalid junit path {:?}", glob_path))?
        .filter_map(|entry| entry.ok().filter(|path| path.is_file()))
        .collect::<Vec<_>>();

    if paths.is_empty() {
        return Err(anyhow::anyhow!("no junit files matched {:?}", glob_path));
    }
    Ok(paths)
}

// Symlinks found while searching a directory are skipped.
fn is_regular_file(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|metadata| metadata.file_type().is_file())
        .unwrap_or(false)
}
