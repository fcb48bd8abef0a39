//! Turns a user-picked image file into an inline data URI.

use std::fs;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use image::ImageFormat;
use thiserror::Error;

use super::types::ImageRef;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("file is empty: {0}")]
    Empty(String),
    #[error("not an image file: {0}")]
    NotAnImage(String),
}

pub fn encode_image_file(path: &Path) -> Result<ImageRef, UploadError> {
    let bytes = fs::read(path)?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    encode_image_bytes(&bytes, &file_name)
}

/// Sniffs the content first and only trusts the extension when the bytes are
/// inconclusive.
pub fn encode_image_bytes(bytes: &[u8], file_name: &str) -> Result<ImageRef, UploadError> {
    if bytes.is_empty() {
        return Err(UploadError::Empty(file_name.to_string()));
    }
    let mime = detect_mime(bytes, file_name)
        .ok_or_else(|| UploadError::NotAnImage(file_name.to_string()))?;
    Ok(ImageRef::data_uri(mime, &BASE64_STANDARD.encode(bytes)))
}

fn detect_mime(bytes: &[u8], file_name: &str) -> Option<&'static str> {
    if let Ok(format) = image::guess_format(bytes) {
        return Some(format.to_mime_type());
    }
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())?;
    if extension == "svg" {
        return Some("image/svg+xml");
    }
    ImageFormat::from_extension(&extension).map(|format| format.to_mime_type())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];

    #[test]
    fn png_file_becomes_data_uri() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("photo.png");
        let mut file = File::create(&path).expect("create file");
        file.write_all(PNG_HEADER).expect("write file");

        let image = encode_image_file(&path).expect("encode");
        let expected = format!("data:image/png;base64,{}", BASE64_STANDARD.encode(PNG_HEADER));
        assert_eq!(image.as_str(), expected);
        assert!(image.is_data_uri());
    }

    #[test]
    fn content_wins_over_extension() {
        let image = encode_image_bytes(PNG_HEADER, "mislabelled.jpg").expect("encode");
        assert!(image.as_str().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn extension_is_used_when_content_is_unknown() {
        let image = encode_image_bytes(b"<svg xmlns='http://www.w3.org/2000/svg'/>", "logo.svg")
            .expect("encode svg");
        assert!(image.as_str().starts_with("data:image/svg+xml;base64,"));
    }

    #[test]
    fn rejects_non_images_and_empty_files() {
        match encode_image_bytes(b"hello", "notes.txt") {
            Err(UploadError::NotAnImage(name)) => assert_eq!(name, "notes.txt"),
            other => panic!("expected NotAnImage, got {:?}", other),
        }
        match encode_image_bytes(&[], "empty.png") {
            Err(UploadError::Empty(name)) => assert_eq!(name, "empty.png"),
            other => panic!("expected Empty, got {:?}", other),
        }
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let temp = TempDir::new().expect("temp dir");
        let err = encode_image_file(&temp.path().join("nope.png")).expect_err("missing");
        assert!(matches!(err, UploadError::Io(_)));
    }
}
