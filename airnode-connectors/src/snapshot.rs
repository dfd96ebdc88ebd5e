//! Atomically-replaced JSON snapshot file
//!
//! The fielded listener published "current conditions" by writing a JSON
//! file into a web server's document root once per received frame. The web
//! server reads that file on every HTTP request, concurrently, so the
//! replacement has to be atomic: write the new document to a temp file in
//! the *same directory* (rename does not work across filesystems), flush it
//! to disk, then rename over the destination. A reader sees either the old
//! complete document or the new complete document, never a torn one.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;

/// Snapshot write failure.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// The destination path has no parent directory to stage the temp file
    /// in.
    #[error("snapshot path has no parent directory: {0}")]
    NoParent(PathBuf),

    /// Filesystem-level failure at any stage of the write.
    #[error("snapshot io: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes decoded records as an atomically-replaced JSON document.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    path: PathBuf,
}

impl SnapshotWriter {
    /// Publish snapshots at `path` (e.g. `/var/www/html/data.json`).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The destination path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write one decoded record, stamped with the wall-clock receive time.
    ///
    /// The `create_at` field matches the format the fielded listener wrote,
    /// so existing dashboards keep parsing.
    pub fn write(&self, fields: &Map<String, Value>) -> Result<(), SnapshotError> {
        let mut document = fields.clone();
        document.insert(
            "create_at".to_string(),
            Value::String(
                chrono::Local::now()
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string(),
            ),
        );
        self.write_document(&Value::Object(document))
    }

    fn write_document(&self, document: &Value) -> Result<(), SnapshotError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| SnapshotError::NoParent(self.path.clone()))?;

        let file_name = self.path.file_name().unwrap_or_default().to_string_lossy();
        let tmp_path = dir.join(format!(".tmp_{file_name}"));

        // Stage next to the destination so the rename stays on one
        // filesystem and is atomic
        let mut tmp = File::create(&tmp_path)?;
        serde_json::to_writer(&mut tmp, document).map_err(std::io::Error::from)?;
        tmp.flush()?;
        tmp.sync_all()?;
        drop(tmp);

        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            // Leave nothing behind on failure
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_fields() -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("temperature".into(), json!(21.5));
        fields.insert("humidity".into(), json!(44.0));
        fields
    }

    #[test]
    fn snapshot_contains_fields_and_stamp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        let writer = SnapshotWriter::new(&path);

        writer.write(&sample_fields()).unwrap();

        let parsed: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["temperature"], json!(21.5));
        assert_eq!(parsed["humidity"], json!(44.0));
        // Stamp format: "YYYY-mm-dd HH:MM:SS"
        let stamp = parsed["create_at"].as_str().unwrap();
        assert_eq!(stamp.len(), 19);
        assert_eq!(&stamp[4..5], "-");
        assert_eq!(&stamp[10..11], " ");
    }

    #[test]
    fn replacement_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        let writer = SnapshotWriter::new(&path);

        writer.write(&sample_fields()).unwrap();
        writer.write(&sample_fields()).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, ["data.json"]);
    }

    #[test]
    fn relative_path_without_directory_is_rejected() {
        let writer = SnapshotWriter::new("data.json");
        assert!(matches!(
            writer.write(&sample_fields()),
            Err(SnapshotError::NoParent(_))
        ));
    }
}
