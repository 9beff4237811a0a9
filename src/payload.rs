//! Headshot payloads: image bytes turned into base64 text plus a preview data URL.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose;
use tracing::debug;

use crate::constants::FALLBACK_MIME_TYPE;

/// Errors raised while turning a selected file into an [`ImagePayload`].
#[derive(Debug)]
pub enum PayloadError {
    /// The file had no content.
    Empty,
    /// The file could not be read.
    Io(std::io::Error),
    /// A data URL had no `,` separating header and content.
    MalformedDataUrl,
    /// The base64 content could not be decoded.
    Decode(base64::DecodeError),
}

impl std::fmt::Display for PayloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "image file is empty"),
            Self::Io(err) => write!(f, "failed to read image file: {err}"),
            Self::MalformedDataUrl => write!(f, "data URL is missing its content"),
            Self::Decode(err) => write!(f, "failed to decode base64 image: {err}"),
        }
    }
}

impl std::error::Error for PayloadError {}

impl From<std::io::Error> for PayloadError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

/// An image ready to be sent to the generator and shown as a preview.
///
/// Immutable once built; selecting a new file replaces it wholesale.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImagePayload {
    base64: String,
    mime_type: String,
    preview_url: String,
}

impl ImagePayload {
    /// Encodes raw image bytes. `declared_mime` is what the uploader claimed (eg the
    /// browser's `Content-Type` for the file part); it wins when it names an image type.
    pub fn from_bytes(bytes: &[u8], declared_mime: Option<&str>) -> Result<Self, PayloadError> {
        if bytes.is_empty() {
            return Err(PayloadError::Empty);
        }
        let mime_type = resolve_mime_type(bytes, declared_mime);
        let base64 = general_purpose::STANDARD.encode(bytes);
        Ok(Self::assemble(base64, mime_type))
    }

    /// Reads and encodes an image file from disk.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, PayloadError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let declared = image::ImageFormat::from_path(path)
            .ok()
            .map(|format| format.to_mime_type());
        debug!(path = %path.display(), size = bytes.len(), "read headshot");
        Self::from_bytes(&bytes, declared)
    }

    /// Splits a `data:<mime>;base64,<content>` URL the way a browser file reader hands it
    /// over. The media type falls back to sniffing the decoded bytes.
    pub fn from_data_url(data_url: &str) -> Result<Self, PayloadError> {
        let (header, content) = data_url
            .split_once(',')
            .ok_or(PayloadError::MalformedDataUrl)?;
        if content.is_empty() {
            return Err(PayloadError::Empty);
        }
        let bytes = general_purpose::STANDARD
            .decode(content)
            .map_err(PayloadError::Decode)?;
        let declared = header
            .strip_prefix("data:")
            .and_then(|rest| rest.split(';').next())
            .filter(|mime| !mime.is_empty());
        let mime_type = resolve_mime_type(&bytes, declared);
        Ok(Self::assemble(content.to_string(), mime_type))
    }

    fn assemble(base64: String, mime_type: String) -> Self {
        let preview_url = format!("data:{};base64,{}", mime_type, base64);
        Self {
            base64,
            mime_type,
            preview_url,
        }
    }

    /// Base64 text of the image.
    pub fn base64(&self) -> &str {
        &self.base64
    }

    /// Media type, eg `image/png`.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Data URL suitable for an `<img src>`.
    pub fn preview_url(&self) -> &str {
        &self.preview_url
    }

    /// Decodes the base64 text back into the original bytes.
    pub fn decode(&self) -> Result<Vec<u8>, PayloadError> {
        general_purpose::STANDARD
            .decode(&self.base64)
            .map_err(PayloadError::Decode)
    }

    /// Size of the decoded image in bytes.
    pub fn size(&self) -> usize {
        self.base64.trim_end_matches('=').len() * 3 / 4
    }
}

fn resolve_mime_type(bytes: &[u8], declared: Option<&str>) -> String {
    if let Some(declared) = declared.map(str::trim)
        && declared.starts_with("image/")
    {
        return declared.to_ascii_lowercase();
    }
    image::guess_format(bytes)
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|_| FALLBACK_MIME_TYPE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_png;
    use std::io::Write;

    #[test]
    fn png_bytes_round_trip() {
        let png = sample_png();
        let payload = ImagePayload::from_bytes(&png, None).expect("encode png");

        assert_eq!(payload.mime_type(), "image/png");
        assert_eq!(payload.decode().expect("decode"), png);
        assert_eq!(payload.size(), png.len());
        assert!(
            payload
                .preview_url()
                .starts_with("data:image/png;base64,iVBORw0KGgo")
        );
        assert!(payload.preview_url().ends_with(payload.base64()));
    }

    #[test]
    fn declared_image_type_wins_over_sniffing() {
        let png = sample_png();
        let payload = ImagePayload::from_bytes(&png, Some("image/webp")).expect("encode");
        assert_eq!(payload.mime_type(), "image/webp");

        let payload =
            ImagePayload::from_bytes(&png, Some("application/octet-stream")).expect("encode");
        assert_eq!(payload.mime_type(), "image/png");
    }

    #[test]
    fn unknown_bytes_fall_back() {
        let payload = ImagePayload::from_bytes(b"definitely not an image", None).expect("encode");
        assert_eq!(payload.mime_type(), FALLBACK_MIME_TYPE);
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            ImagePayload::from_bytes(&[], Some("image/png")),
            Err(PayloadError::Empty)
        ));
        assert!(matches!(
            ImagePayload::from_data_url("data:image/png;base64,"),
            Err(PayloadError::Empty)
        ));
    }

    #[test]
    fn data_url_splits_like_a_file_reader() {
        let png = sample_png();
        let original = ImagePayload::from_bytes(&png, None).expect("encode");
        let parsed = ImagePayload::from_data_url(original.preview_url()).expect("parse");
        assert_eq!(parsed, original);

        assert!(matches!(
            ImagePayload::from_data_url("no separator here"),
            Err(PayloadError::MalformedDataUrl)
        ));
        assert!(matches!(
            ImagePayload::from_data_url("data:image/png;base64,%%%"),
            Err(PayloadError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn reads_from_disk() {
        let png = sample_png();
        let mut file = tempfile::Builder::new()
            .suffix(".png")
            .tempfile()
            .expect("temp file");
        file.write_all(&png).expect("write png");

        let payload = ImagePayload::from_path(file.path())
            .await
            .expect("read payload");
        assert_eq!(payload.mime_type(), "image/png");
        assert_eq!(payload.decode().expect("decode"), png);
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let result = ImagePayload::from_path(dir.path().join("nope.png")).await;
        assert!(matches!(result, Err(PayloadError::Io(_))));
    }
}
