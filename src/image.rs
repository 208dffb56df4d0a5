use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD};

const FALLBACK_MIME: &str = "application/octet-stream";

/// Reads an image file and embeds it as a `data:` URL.
pub fn data_url_from_path(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let bytes =
        fs::read(path).with_context(|| format!("failed to read image {}", path.display()))?;
    Ok(data_url_from_bytes(mime_for_path(path), &bytes))
}

pub fn data_url_from_bytes(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

pub fn mime_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("bmp") => "image/bmp",
        Some("avif") => "image/avif",
        _ => FALLBACK_MIME,
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ImageSummary {
    pub mime: String,
    pub byte_len: usize,
}

impl ImageSummary {
    pub fn label(&self) -> String {
        format!("{} {}", self.mime, human_size(self.byte_len))
    }
}

/// Describes an embedded payload. Anything that is not a decodable base64
/// data URL yields `None`.
pub fn describe(data_url: &str) -> Option<ImageSummary> {
    let rest = data_url.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime = header.strip_suffix(";base64")?;
    let decoded = STANDARD.decode(payload.trim()).ok()?;
    Some(ImageSummary {
        mime: if mime.is_empty() {
            FALLBACK_MIME.to_string()
        } else {
            mime.to_string()
        },
        byte_len: decoded.len(),
    })
}

fn human_size(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path(&PathBuf::from("cover.PNG")), "image/png");
        assert_eq!(mime_for_path(&PathBuf::from("a/b.jpeg")), "image/jpeg");
        assert_eq!(mime_for_path(&PathBuf::from("noext")), FALLBACK_MIME);
    }

    #[test]
    fn test_data_url_from_path_embeds_file() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("pixel.gif");
        fs::write(&path, b"GIF89a")?;

        let url = data_url_from_path(&path)?;

        assert_eq!(url, "data:image/gif;base64,R0lGODlh");
        let summary = describe(&url).expect("payload should decode");
        assert_eq!(summary.mime, "image/gif");
        assert_eq!(summary.byte_len, 6);
        Ok(())
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(data_url_from_path("/definitely/not/here.png").is_err());
    }

    #[test]
    fn test_describe_rejects_undecodable_payloads() {
        assert_eq!(describe("https://example.com/cat.png"), None);
        assert_eq!(describe("data:image/png,rawbytes"), None);
        assert_eq!(describe("data:image/png;base64,%%%"), None);
    }

    #[test]
    fn test_summary_label() {
        let summary = ImageSummary {
            mime: "image/png".to_string(),
            byte_len: 2048,
        };
        assert_eq!(summary.label(), "image/png 2.0 KB");
    }
}
