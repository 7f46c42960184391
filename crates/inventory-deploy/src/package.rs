//! Zipping built function binaries for upload.
//!
//! Functions are compiled separately with cargo-lambda, which drops a
//! `bootstrap` binary under `target/lambda/<function>/`. The deployer only
//! packages what it finds there; it never builds code itself.

use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const BOOTSTRAP_FILE: &str = "bootstrap";

/// Where cargo-lambda leaves built functions, relative to where the
/// deployer is usually launched from.
fn candidate_roots() -> Vec<PathBuf> {
    vec![
        PathBuf::from("target/lambda"),
        PathBuf::from("../target/lambda"),
    ]
}

fn locate_build_dir(roots: &[PathBuf], function: &str) -> Option<PathBuf> {
    roots
        .iter()
        .map(|root| root.join(function))
        .find(|dir| dir.join(BOOTSTRAP_FILE).is_file())
}

/// Directory holding the built `bootstrap` binary for the function.
pub fn find_bootstrap_dir(function: &str) -> Result<PathBuf> {
    locate_build_dir(&candidate_roots(), function).with_context(|| {
        format!(
            "No built binary found for {function}. \
             Build the functions first: cargo lambda build --release"
        )
    })
}

/// Zip every file under `dir` into an in-memory archive.
///
/// Entries are stored with deflate compression and executable permissions,
/// which the Lambda custom runtime requires of `bootstrap`. Walk order is
/// sorted so the same tree always produces the same archive.
pub fn package_directory(dir: &Path) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let name = path
            .strip_prefix(dir)
            .with_context(|| format!("{} escapes {}", path.display(), dir.display()))?
            .to_string_lossy()
            .into_owned();
        debug!(file = %name, "Adding to archive");

        let bytes =
            fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        writer
            .start_file(name.as_str(), options)
            .with_context(|| format!("Failed to start archive entry {name}"))?;
        writer
            .write_all(&bytes)
            .with_context(|| format!("Failed to write archive entry {name}"))?;
    }

    let cursor = writer.finish().context("Failed to finalize archive")?;
    Ok(cursor.into_inner())
}

/// Locate and zip the built binary of one function.
pub fn package_function(function: &str) -> Result<Vec<u8>> {
    let dir = find_bootstrap_dir(function)?;
    let bytes = package_directory(&dir)?;
    info!(
        %function,
        dir = %dir.display(),
        zip_bytes = bytes.len(),
        "Function packaged"
    );
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn locates_the_first_root_holding_a_bootstrap() {
        let with_binary = tempfile::tempdir().unwrap();
        let without_binary = tempfile::tempdir().unwrap();
        let build_dir = with_binary.path().join("load_inventory");
        fs::create_dir_all(&build_dir).unwrap();
        fs::write(build_dir.join(BOOTSTRAP_FILE), b"#!binary").unwrap();

        let roots = vec![
            without_binary.path().to_path_buf(),
            with_binary.path().to_path_buf(),
        ];
        let found = locate_build_dir(&roots, "load_inventory").unwrap();
        assert_eq!(found, build_dir);
        assert!(locate_build_dir(&roots, "missing_function").is_none());
    }

    #[test]
    fn archives_are_executable_and_complete() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(BOOTSTRAP_FILE), b"fake binary").unwrap();

        let bytes = package_directory(dir.path()).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 1);

        let mut file = archive.by_name(BOOTSTRAP_FILE).unwrap();
        let mode = file.unix_mode().unwrap();
        assert_eq!(mode & 0o111, 0o111, "bootstrap must be executable");

        let mut contents = Vec::new();
        file.read_to_end(&mut contents).unwrap();
        assert_eq!(contents, b"fake binary");
    }

    #[test]
    fn missing_build_output_names_the_fix() {
        let err = package_function("never_built_function").unwrap_err();
        assert!(err.to_string().contains("cargo lambda build"));
    }
}
