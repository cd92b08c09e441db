//! Binary payloads carried as base64 inside JSON bodies.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::Error;

/// Raw file as received from a client.
///
/// `data` may be plain base64 or a `data:<mime>;base64,` URL.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct FileInput {
    #[serde(alias = "file_name", alias = "nom")]
    pub name: Option<String>,
    #[serde(alias = "mime_type", alias = "type_mime")]
    pub mime: Option<String>,
    pub data: Option<String>,
}

/// Decoded file ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub name: String,
    pub mime: String,
    pub data: Vec<u8>,
}

impl FileUpload {
    /// Payload size in bytes, saturated to the column type.
    pub fn size(&self) -> i32 {
        i32::try_from(self.data.len()).unwrap_or(i32::MAX)
    }
}

impl FileInput {
    /// Validate and decode the payload.
    ///
    /// The mime type falls back to the one declared in a data URL, then to
    /// `application/octet-stream`.
    pub fn decode(self) -> Result<FileUpload, Error> {
        let name = self
            .name
            .map(|name| name.trim().to_owned())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| Error::invalid_request("file name is required"))?;
        let raw = self
            .data
            .filter(|data| !data.trim().is_empty())
            .ok_or_else(|| Error::invalid_request(format!("file {name} has no data")))?;

        let (declared_mime, encoded) = split_data_url(raw.trim());
        let data = STANDARD
            .decode(encoded)
            .map_err(|_| Error::invalid_request(format!("file {name} is not valid base64")))?;
        let mime = self
            .mime
            .map(|mime| mime.trim().to_owned())
            .filter(|mime| !mime.is_empty())
            .or(declared_mime)
            .unwrap_or_else(|| "application/octet-stream".to_owned());

        Ok(FileUpload { name, mime, data })
    }
}

/// Decode every file, failing on the first invalid one.
pub fn decode_files(inputs: Vec<FileInput>) -> Result<Vec<FileUpload>, Error> {
    inputs.into_iter().map(FileInput::decode).collect()
}

fn split_data_url(raw: &str) -> (Option<String>, &str) {
    let Some(rest) = raw.strip_prefix("data:") else {
        return (None, raw);
    };
    match rest.split_once(";base64,") {
        Some((mime, encoded)) if !mime.is_empty() => (Some(mime.to_owned()), encoded),
        Some((_, encoded)) => (None, encoded),
        None => (None, raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    fn input(name: Option<&str>, mime: Option<&str>, data: Option<&str>) -> FileInput {
        FileInput {
            name: name.map(str::to_owned),
            mime: mime.map(str::to_owned),
            data: data.map(str::to_owned),
        }
    }

    #[rstest]
    fn decodes_plain_base64() {
        let upload = input(Some("photo.png"), Some("image/png"), Some("aGVsbG8="))
            .decode()
            .expect("valid payload");
        assert_eq!(upload.data, b"hello");
        assert_eq!(upload.mime, "image/png");
        assert_eq!(upload.size(), 5);
    }

    #[rstest]
    fn data_url_supplies_mime() {
        let upload = input(Some("a.jpg"), None, Some("data:image/jpeg;base64,aGk="))
            .decode()
            .expect("valid payload");
        assert_eq!(upload.mime, "image/jpeg");
        assert_eq!(upload.data, b"hi");
    }

    #[rstest]
    #[case(input(None, None, Some("aGk=")))]
    #[case(input(Some("a"), None, None))]
    #[case(input(Some("a"), None, Some("***")))]
    fn invalid_payloads_are_rejected(#[case] file: FileInput) {
        let err = file.decode().expect_err("invalid payload");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }
}
