// ============================================================================
// CRM Core - CSV Upload Preview
// File: crates/crm-core/src/services/csv_import.rs
// ============================================================================
//! Stages an uploaded CSV in a temporary file, parses it into header-keyed
//! rows, and removes the file afterwards. Nothing is written to the lead store.

use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use csv::{ReaderBuilder, Trim};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crm_shared::config::UploadSettings;

use crate::error::DomainError;

pub type CsvRow = Map<String, Value>;

#[derive(Debug, Clone)]
pub struct CsvPreview {
    pub total_rows: usize,
    pub rows: Vec<CsvRow>,
}

/// Parses CSV with a header row. Columns beyond the header are keyed `_<index>`.
pub fn parse_rows<R: Read>(reader: R) -> Result<Vec<CsvRow>, DomainError> {
    let mut rdr = ReaderBuilder::new().trim(Trim::Headers).flexible(true).from_reader(reader);
    let headers = rdr.headers().map_err(|e| DomainError::CsvParse(e.to_string()))?.clone();

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| DomainError::CsvParse(e.to_string()))?;
        let row: CsvRow = record
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let key = headers.get(i).map(str::to_string).unwrap_or_else(|| format!("_{}", i));
                (key, Value::String(value.to_string()))
            })
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

/// An upload being streamed to disk. Dropping it deletes the file.
pub struct StagedUpload {
    file: NamedTempFile,
    writer: tokio::fs::File,
    written: u64,
    max_bytes: u64,
}

impl StagedUpload {
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), DomainError> {
        self.written += chunk.len() as u64;
        if self.written > self.max_bytes {
            return Err(DomainError::Upload(format!("CSV file exceeds {} bytes", self.max_bytes)));
        }
        self.writer
            .write_all(chunk)
            .await
            .map_err(|e| DomainError::Internal(format!("Failed to stage upload: {}", e)))
    }
}

pub struct CsvImportService {
    upload_dir: PathBuf,
    max_bytes: u64,
}

impl CsvImportService {
    pub fn new(settings: &UploadSettings) -> Self {
        Self { upload_dir: PathBuf::from(&settings.directory), max_bytes: settings.max_bytes }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub async fn stage(&self) -> Result<StagedUpload, DomainError> {
        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(|e| DomainError::Internal(format!("Upload directory unavailable: {}", e)))?;

        let file = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(".csv")
            .tempfile_in(&self.upload_dir)
            .map_err(|e| DomainError::Internal(format!("Failed to stage upload: {}", e)))?;
        let handle = file
            .reopen()
            .map_err(|e| DomainError::Internal(format!("Failed to stage upload: {}", e)))?;

        Ok(StagedUpload { file, writer: tokio::fs::File::from_std(handle), written: 0, max_bytes: self.max_bytes })
    }

    /// Parses the staged file on a blocking thread, then deletes it whether
    /// or not parsing succeeded.
    pub async fn preview(&self, upload: StagedUpload) -> Result<CsvPreview, DomainError> {
        let StagedUpload { file, mut writer, written, .. } = upload;
        writer
            .flush()
            .await
            .map_err(|e| DomainError::Internal(format!("Failed to stage upload: {}", e)))?;
        drop(writer);

        let (parsed, removed) = tokio::task::spawn_blocking(move || {
            let parsed = File::open(file.path())
                .map_err(|e| DomainError::Internal(format!("Failed to read upload: {}", e)))
                .and_then(parse_rows);
            let removed = file.close();
            (parsed, removed)
        })
        .await
        .map_err(|e| DomainError::Internal(format!("CSV parser task failed: {}", e)))?;

        if let Err(e) = removed {
            warn!("Failed to remove staged upload: {}", e);
        }

        let rows = parsed?;
        info!("Parsed CSV upload: {} bytes, {} rows", written, rows.len());
        Ok(CsvPreview { total_rows: rows.len(), rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn service(dir: &Path, max_bytes: u64) -> CsvImportService {
        CsvImportService::new(&UploadSettings { directory: dir.display().to_string(), max_bytes })
    }

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    #[test]
    fn test_parse_rows_keys_by_header() {
        let rows = parse_rows("Name, Email\nAnn,ann@x.com\nBob,bob@x.com\n".as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Name"], "Ann");
        assert_eq!(rows[1]["Email"], "bob@x.com");
        let keys: Vec<&String> = rows[0].keys().collect();
        assert_eq!(keys, ["Name", "Email"]);
    }

    #[test]
    fn test_parse_rows_handles_ragged_rows() {
        let rows = parse_rows("a,b\n1\n1,2,3\n".as_bytes()).unwrap();
        assert_eq!(rows[0].len(), 1);
        assert_eq!(rows[1]["_2"], "3");
    }

    #[test]
    fn test_parse_rows_rejects_invalid_utf8() {
        let bytes: &[u8] = b"name\n\xff\xfe\n";
        assert!(matches!(parse_rows(bytes), Err(DomainError::CsvParse(_))));
    }

    #[tokio::test]
    async fn test_preview_removes_staged_file() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path(), 1024);

        let mut upload = svc.stage().await.unwrap();
        upload.write_chunk(b"Name,Phone\nAnn,").await.unwrap();
        upload.write_chunk(b"555\n").await.unwrap();
        assert_eq!(entries(dir.path()), 1);

        let preview = svc.preview(upload).await.unwrap();
        assert_eq!(preview.total_rows, 1);
        assert_eq!(preview.rows[0]["Phone"], "555");
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_preview_removes_file_on_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path(), 1024);

        let mut upload = svc.stage().await.unwrap();
        upload.write_chunk(b"name\n\xff\n").await.unwrap();

        assert!(matches!(svc.preview(upload).await, Err(DomainError::CsvParse(_))));
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_oversized_upload_is_rejected_and_removed() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path(), 8);

        let mut upload = svc.stage().await.unwrap();
        assert!(matches!(upload.write_chunk(b"0123456789").await, Err(DomainError::Upload(_))));
        drop(upload);
        assert_eq!(entries(dir.path()), 0);
    }
}
