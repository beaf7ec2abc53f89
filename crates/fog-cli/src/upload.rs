use fog_proto::DataUri;
use fog_session::SessionError;
use std::path::Path;

/// Accepted upload types, matched by file extension.
const ACCEPTED: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("webp", "image/webp"),
];

/// Validates the selected file and reads it into a data URI.
///
/// Wrong type and oversize selections are rejected with a user-visible
/// message before the session ever sees the upload.
pub fn read_upload(path: &Path, max_bytes: u64) -> Result<DataUri, SessionError> {
    let mime = mime_for(path).ok_or_else(|| {
        SessionError::UploadRejected(format!(
            "invalid file type '{}'; accepted: jpg, jpeg, png, webp",
            path.display()
        ))
    })?;

    let meta = std::fs::metadata(path)
        .map_err(|e| SessionError::FileReadFailed(format!("{}: {e}", path.display())))?;
    if meta.len() > max_bytes {
        return Err(SessionError::UploadRejected(format!(
            "file is too large ({} bytes, max {} bytes)",
            meta.len(),
            max_bytes
        )));
    }

    let data = std::fs::read(path)
        .map_err(|e| SessionError::FileReadFailed(format!("{}: {e}", path.display())))?;
    Ok(DataUri::new(mime, data))
}

fn mime_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    ACCEPTED.iter().find(|(e, _)| *e == ext).map(|(_, m)| *m)
}
