use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::ReportError;
use crate::registry::ReportArtifact;
use crate::render::{render_svg, to_csv_bytes};

/// Directory receiving every file of a run.
#[derive(Clone, Debug)]
pub struct OutputDir {
    root: PathBuf,
}

impl OutputDir {
    /// Create `root` (and missing parents) if needed.
    pub fn create(root: &Path) -> Result<Self, ReportError> {
        fs::create_dir_all(root).map_err(|source| ReportError::Io {
            path: root.to_path_buf(),
            source,
        })?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Write `bytes` to `file_name` inside the directory and return the file name.
    pub fn write(&self, file_name: &str, bytes: &[u8]) -> Result<String, ReportError> {
        let path = self.root.join(file_name);
        fs::write(&path, bytes).map_err(|source| ReportError::Io { path, source })?;
        Ok(file_name.to_string())
    }

    /// Remove `file_name` from the directory; a file that is not there is fine.
    fn remove(&self, file_name: &str) -> Result<(), ReportError> {
        let path = self.root.join(file_name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ReportError::Io { path, source }),
        }
    }

    /// Write every part of `artifact` as `<id>.svg`, `<id>.csv` and `<id>.json`.
    ///
    /// The chart is rendered before anything is written, so a rendering failure leaves no partial
    /// output for the report. Files of an earlier run under the same id are removed first, and a
    /// failed write removes the files already written.
    pub fn write_artifact(&self, id: &str, artifact: &ReportArtifact) -> Result<Vec<String>, ReportError> {
        let svg = artifact.chart.as_ref().map(render_svg).transpose()?;
        let csv = artifact
            .table
            .as_ref()
            .map(|table| to_csv_bytes(&table.rows))
            .transpose()?;
        let json = artifact
            .json
            .as_ref()
            .map(serde_json::to_vec_pretty)
            .transpose()?;

        let names = ARTIFACT_EXTENSIONS.map(|ext| format!("{id}.{ext}"));
        for name in &names {
            self.remove(name)?;
        }

        let parts = [svg.map(String::into_bytes), csv, json];
        let mut files: Vec<String> = Vec::new();
        for (name, bytes) in names.iter().zip(parts) {
            let Some(bytes) = bytes else { continue };
            if let Err(err) = self.write(name, &bytes) {
                for written in &files {
                    if let Err(cleanup) = self.remove(written) {
                        log::warn!("{cleanup}");
                    }
                }
                return Err(err);
            }
            files.push(name.clone());
        }
        Ok(files)
    }
}

const ARTIFACT_EXTENSIONS: [&str; 3] = ["svg", "csv", "json"];
