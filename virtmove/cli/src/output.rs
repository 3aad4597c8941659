use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use tracing::{debug, warn};
use virtmove_manifest::Document;

use crate::error::{CliError, CliResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OutputFormat {
    Yaml,
    Json,
}

impl OutputFormat {
    pub(crate) fn extension(self) -> &'static str {
        match self {
            OutputFormat::Yaml => "yaml",
            OutputFormat::Json => "json",
        }
    }
}

/// File name (without extension) of a cloned VM.
pub(crate) fn clone_file_stem(name: &str) -> String {
    format!("{name}.vm-clone")
}

/// File name (without extension) of a converted VM.
pub(crate) fn convert_file_stem(name: &str) -> String {
    format!("VirtualMachine.{name}")
}

/// YAML when possible, pretty JSON otherwise.
pub(crate) fn render(document: &Document) -> CliResult<(String, OutputFormat)> {
    match serde_yaml::to_string(document) {
        Ok(yaml) => Ok((yaml, OutputFormat::Yaml)),
        Err(error) => {
            warn!(%error, "failed to serialize manifest as YAML, writing JSON");

            serde_json::to_string_pretty(document)
                .map(|json| (json, OutputFormat::Json))
                .map_err(CliError::SerializeManifest)
        }
    }
}

/// Writes `document` to `<directory>/<stem>.<yaml|json>`.
///
/// The manifest is written to a temporary file in `directory` first and then renamed over the
/// destination, so a failed write never leaves a truncated manifest behind.
pub(crate) fn write_document(
    directory: &Path,
    stem: &str,
    document: &Document,
) -> CliResult<PathBuf> {
    let (contents, format) = render(document)?;
    let path = directory.join(format!("{stem}.{}", format.extension()));
    let write_error = |error| CliError::WriteManifest(path.clone(), error);

    fs::create_dir_all(directory).map_err(write_error)?;

    let mut file = NamedTempFile::new_in(directory).map_err(write_error)?;
    file.write_all(contents.as_bytes()).map_err(write_error)?;
    file.persist(&path)
        .map_err(|error| CliError::WriteManifest(path.clone(), error.error))?;

    debug!(path = %path.display(), "wrote manifest");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn manifest() -> Document {
        Document::new(json!({
            "apiVersion": "kubevirt.io/v1",
            "kind": "VirtualMachine",
            "metadata": { "name": "fedora", "namespace": "ns-b" },
            "spec": { "runStrategy": "Halted" }
        }))
    }

    #[rstest]
    #[case(clone_file_stem("fedora"), "fedora.vm-clone")]
    #[case(convert_file_stem("fedora"), "VirtualMachine.fedora")]
    fn file_stems(#[case] stem: String, #[case] expected: &str) {
        assert_eq!(stem, expected);
    }

    #[rstest]
    fn writes_yaml() {
        let directory = tempfile::tempdir().unwrap();

        let path = write_document(directory.path(), "fedora.vm-clone", &manifest()).unwrap();

        assert_eq!(path, directory.path().join("fedora.vm-clone.yaml"));
        let written: serde_yaml::Value =
            serde_yaml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["metadata"]["namespace"].as_str(), Some("ns-b"));
        assert_eq!(fs::read_dir(directory.path()).unwrap().count(), 1);
    }

    #[rstest]
    fn overwrites_previous_output() {
        let directory = tempfile::tempdir().unwrap();
        fs::write(directory.path().join("VirtualMachine.fedora.yaml"), "stale").unwrap();

        let path =
            write_document(directory.path(), "VirtualMachine.fedora", &manifest()).unwrap();

        assert!(fs::read_to_string(path).unwrap().contains("runStrategy: Halted"));
    }

    #[rstest]
    fn creates_missing_directory() {
        let directory = tempfile::tempdir().unwrap();
        let nested = directory.path().join("out").join("vms");

        let path = write_document(&nested, "fedora.vm-clone", &manifest()).unwrap();

        assert!(path.starts_with(&nested));
        assert!(path.exists());
    }
}
