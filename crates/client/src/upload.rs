//! Image payloads for the upload routes: `data:<mime>;base64,<bytes>`.

use std::path::Path;

use {
    anyhow::{Context, Result},
    base64::{Engine, engine::general_purpose::STANDARD},
};

/// Encode `bytes` as a data URL.
pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// MIME type for an image path, judged by extension.
pub fn image_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Read an image file into a data URL.
pub fn encode_image_file(path: &Path) -> Result<String> {
    let mime = image_mime(path)
        .with_context(|| format!("unsupported image type: {}", path.display()))?;
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(data_url(mime, &bytes))
}
