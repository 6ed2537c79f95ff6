//! Upload persistence for `POST /scan/upload`.
//!
//! Each upload is stored as `<upload_dir>/<uuid>/<file name>` so two uploads
//! with the same name never overwrite each other.

use std::path::{Path, PathBuf};

use bytes::Bytes;

use super::error::ApiError;

/// Maximum accepted file name length in bytes.
const MAX_FILE_NAME_LEN: usize = 255;

/// Reduce a client-supplied file name to a single safe path component.
///
/// Directory parts are stripped; empty names, `.`/`..`, and names with
/// control characters are rejected.
pub fn sanitize_file_name(raw: &str) -> Result<String, ApiError> {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default().trim();

    if base.is_empty() || base == "." || base == ".." {
        return Err(ApiError::BadRequest(format!("invalid file name '{raw}'")));
    }
    if base.chars().any(char::is_control) {
        return Err(ApiError::BadRequest(
            "file name contains control characters".to_owned(),
        ));
    }
    if base.len() > MAX_FILE_NAME_LEN {
        return Err(ApiError::BadRequest(format!(
            "file name exceeds {MAX_FILE_NAME_LEN} bytes"
        )));
    }

    Ok(base.to_owned())
}

/// Write an uploaded file into a fresh per-upload directory and return its path.
pub async fn persist_upload(
    upload_dir: &Path,
    file_name: &str,
    contents: Bytes,
) -> Result<PathBuf, ApiError> {
    let folder = upload_dir.join(uuid::Uuid::new_v4().to_string());
    tokio::fs::create_dir_all(&folder).await.map_err(|e| {
        ApiError::Internal(format!(
            "failed to create upload directory {}: {e}",
            folder.display()
        ))
    })?;

    let path = folder.join(file_name);
    let size = contents.len();
    tokio::fs::write(&path, contents).await.map_err(|e| {
        ApiError::Internal(format!("failed to write upload {}: {e}", path.display()))
    })?;

    tracing::info!(path = %path.display(), bytes = size, "upload stored");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_plain_names() {
        assert_eq!(sanitize_file_name("app.jar").unwrap(), "app.jar");
        assert_eq!(sanitize_file_name(" image.tar ").unwrap(), "image.tar");
    }

    #[test]
    fn strips_directories() {
        assert_eq!(sanitize_file_name("../../etc/passwd").unwrap(), "passwd");
        assert_eq!(sanitize_file_name(r"C:\temp\lib.dll").unwrap(), "lib.dll");
    }

    #[test]
    fn rejects_unusable_names() {
        for raw in ["", "   ", ".", "..", "dir/", "a\u{0}b", "tab\tname"] {
            assert!(sanitize_file_name(raw).is_err(), "{raw:?} should be rejected");
        }
        assert!(sanitize_file_name(&"a".repeat(300)).is_err());
    }

    #[tokio::test]
    async fn persist_creates_unique_folders() {
        let dir = tempfile::tempdir().unwrap();
        let first = persist_upload(dir.path(), "a.jar", Bytes::from_static(b"one"))
            .await
            .unwrap();
        let second = persist_upload(dir.path(), "a.jar", Bytes::from_static(b"two"))
            .await
            .unwrap();

        assert_ne!(first, second);
        assert!(first.starts_with(dir.path()));
        assert_eq!(std::fs::read(&first).unwrap(), b"one");
        assert_eq!(std::fs::read(&second).unwrap(), b"two");
    }
}
