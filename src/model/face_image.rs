use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Decoded face photos larger than this are rejected.
pub const MAX_FACE_IMAGE_BYTES: usize = 2 * 1024 * 1024;

const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];
const JPEG_EOI: [u8; 2] = [0xFF, 0xD9];
const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    pub fn mime(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
        }
    }

    fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
            "image/png" => Some(ImageFormat::Png),
            _ => None,
        }
    }

    fn matches(self, bytes: &[u8]) -> bool {
        match self {
            ImageFormat::Jpeg => bytes.starts_with(&JPEG_SOI) && bytes.ends_with(&JPEG_EOI),
            ImageFormat::Png => bytes.starts_with(&PNG_SIGNATURE),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageError {
    #[error("face image must be a base64 data URI")]
    NotDataUri,
    #[error("unsupported face image type `{0}`")]
    UnsupportedType(String),
    #[error("face image payload is not valid base64")]
    InvalidBase64,
    #[error("face image is empty")]
    Empty,
    #[error("face image exceeds {MAX_FACE_IMAGE_BYTES} bytes")]
    TooLarge,
    #[error("face image bytes are not a {0} still image")]
    Corrupt(&'static str),
}

/// A still image stored as a `data:<mime>;base64,<payload>` URI.
///
/// Only constructed from bytes that look like a complete JPEG or PNG, so a
/// `FaceImage` that exists is always decodable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceImage {
    uri: String,
    format: ImageFormat,
}

impl FaceImage {
    pub fn from_bytes(format: ImageFormat, bytes: &[u8]) -> Result<Self, ImageError> {
        check_bytes(format, bytes)?;
        let uri = format!("data:{};base64,{}", format.mime(), STANDARD.encode(bytes));
        Ok(Self { uri, format })
    }

    pub fn from_data_uri(uri: &str) -> Result<Self, ImageError> {
        let rest = uri.trim().strip_prefix("data:").ok_or(ImageError::NotDataUri)?;
        let (header, payload) = rest.split_once(',').ok_or(ImageError::NotDataUri)?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or(ImageError::NotDataUri)?;
        let format = ImageFormat::from_mime(mime)
            .ok_or_else(|| ImageError::UnsupportedType(mime.to_string()))?;

        // cheap bound before decoding: base64 grows by 4/3
        if payload.len() > MAX_FACE_IMAGE_BYTES / 3 * 4 + 4 {
            return Err(ImageError::TooLarge);
        }
        let bytes = STANDARD
            .decode(payload)
            .map_err(|_| ImageError::InvalidBase64)?;
        check_bytes(format, &bytes)?;

        Ok(Self {
            uri: format!("data:{};base64,{}", format.mime(), payload),
            format,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.uri
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn decode(&self) -> Vec<u8> {
        let payload = self
            .uri
            .split_once(',')
            .map(|(_, payload)| payload)
            .unwrap_or_default();
        STANDARD.decode(payload).unwrap_or_default()
    }
}

fn check_bytes(format: ImageFormat, bytes: &[u8]) -> Result<(), ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::Empty);
    }
    if bytes.len() > MAX_FACE_IMAGE_BYTES {
        return Err(ImageError::TooLarge);
    }
    if !format.matches(bytes) {
        return Err(ImageError::Corrupt(format.mime()));
    }
    Ok(())
}

impl Serialize for FaceImage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.uri)
    }
}

impl<'de> Deserialize<'de> for FaceImage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        FaceImage::from_data_uri(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_jpeg(marker: u8) -> Vec<u8> {
        vec![0xFF, 0xD8, 0xFF, 0xE0, marker, 0x10, 0xFF, 0xD9]
    }

    #[test]
    fn round_trips_through_data_uri() {
        let image = FaceImage::from_bytes(ImageFormat::Jpeg, &tiny_jpeg(1)).unwrap();
        assert!(image.as_str().starts_with("data:image/jpeg;base64,"));

        let parsed = FaceImage::from_data_uri(image.as_str()).unwrap();
        assert_eq!(parsed, image);
        assert_eq!(parsed.decode(), tiny_jpeg(1));
    }

    #[test]
    fn rejects_truncated_jpeg() {
        let mut bytes = tiny_jpeg(2);
        bytes.truncate(5);
        assert_eq!(
            FaceImage::from_bytes(ImageFormat::Jpeg, &bytes),
            Err(ImageError::Corrupt("image/jpeg"))
        );
    }

    #[test]
    fn rejects_non_data_uris_and_foreign_types() {
        assert_eq!(
            FaceImage::from_data_uri("https://example.com/a.jpg"),
            Err(ImageError::NotDataUri)
        );
        assert_eq!(
            FaceImage::from_data_uri("data:image/gif;base64,R0lGOD"),
            Err(ImageError::UnsupportedType("image/gif".into()))
        );
        assert_eq!(
            FaceImage::from_data_uri("data:image/png;base64,@@@"),
            Err(ImageError::InvalidBase64)
        );
    }

    #[test]
    fn deserialize_validates() {
        let err = serde_json::from_str::<FaceImage>("\"data:image/jpeg;base64,AAAA\"");
        assert!(err.is_err());
    }
}
