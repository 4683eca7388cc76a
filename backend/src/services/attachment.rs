//! Decoding and fingerprinting of images uploaded with scans

use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha256};

use shared::{ImagePayload, ScanError, ScanResult};

/// Image ready to be stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub name: String,
    pub mimetype: &'static str,
    pub checksum: String,
    pub description: Option<String>,
    pub bytes: Vec<u8>,
}

/// Decode a base64 payload, accepting an optional `data:...;base64,` prefix
pub fn decode_image(payload: &ImagePayload) -> ScanResult<DecodedImage> {
    let data = payload.data.trim();
    let data = match data.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => data,
    };

    let bytes = STANDARD.decode(data).map_err(|_| {
        ScanError::validation(
            format!("Image '{}' is not valid base64", payload.name),
            format!("Ảnh '{}' không đúng định dạng base64", payload.name),
        )
    })?;
    if bytes.is_empty() {
        return Err(ScanError::validation(
            format!("Image '{}' is empty", payload.name),
            format!("Ảnh '{}' không có dữ liệu", payload.name),
        ));
    }

    Ok(DecodedImage {
        name: payload.name.clone(),
        mimetype: sniff_mimetype(&bytes),
        checksum: sha256_hex(&bytes),
        description: payload.description.clone(),
        bytes,
    })
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Identify common image formats from their magic bytes
pub fn sniff_mimetype(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        "image/png"
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "application/octet-stream"
    }
}
