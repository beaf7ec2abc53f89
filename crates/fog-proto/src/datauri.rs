use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt;

/// Inline-encoded image payload: `data:<mime>;base64,<payload>`.
///
/// The gateway contract moves images as data URIs in both directions, so this
/// type only packs and unpacks the envelope. The payload bytes pass through
/// verbatim; no transcoding happens here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime: String,
    pub data: Vec<u8>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DataUriError {
    #[error("not a data URI (missing 'data:' prefix)")]
    MissingPrefix,
    #[error("data URI is not base64-encoded")]
    NotBase64,
    #[error("invalid base64 payload: {0}")]
    BadPayload(String),
}

impl DataUri {
    pub fn new(mime: impl Into<String>, data: Vec<u8>) -> Self {
        Self { mime: mime.into(), data }
    }

    pub fn parse(s: &str) -> Result<Self, DataUriError> {
        let rest = s.strip_prefix("data:").ok_or(DataUriError::MissingPrefix)?;
        let (header, payload) = rest.split_once(',').ok_or(DataUriError::NotBase64)?;
        let mime = header.strip_suffix(";base64").ok_or(DataUriError::NotBase64)?;
        let data = STANDARD
            .decode(payload)
            .map_err(|e| DataUriError::BadPayload(e.to_string()))?;
        Ok(Self { mime: mime.to_string(), data })
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.mime, STANDARD.encode(&self.data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let uri = DataUri::new("image/png", vec![1, 2, 3, 4]);
        let s = uri.to_string();
        assert!(s.starts_with("data:image/png;base64,"));
        assert_eq!(DataUri::parse(&s).unwrap(), uri);
    }

    #[test]
    fn rejects_non_data_uri() {
        assert_eq!(DataUri::parse("http://x/y.png"), Err(DataUriError::MissingPrefix));
    }

    #[test]
    fn rejects_non_base64_encoding() {
        assert_eq!(
            DataUri::parse("data:image/png;charset=utf8,abc"),
            Err(DataUriError::NotBase64)
        );
    }

    #[test]
    fn rejects_garbage_payload() {
        assert!(matches!(
            DataUri::parse("data:image/png;base64,@@@"),
            Err(DataUriError::BadPayload(_))
        ));
    }
}
