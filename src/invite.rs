//! Guest access links: the `?token=` URL printed on invitations and table
//! cards, its QR code, and fresh tokens for `WEDDING_ACCESS_TOKEN`.

use std::io::Cursor;

use image::{ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};
use rand::Rng;
use serde::Serialize;

use crate::error::ApiError;

pub const TOKEN_LEN: usize = 12;
const TOKEN_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const QR_MODULE_PX: u32 = 10;

#[derive(Debug, Serialize)]
pub struct AccessLink {
    pub url: String,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct GeneratedToken {
    pub token: String,
    pub env_line: String,
}

pub fn access_link(scheme: &str, host: &str, token: &str) -> AccessLink {
    AccessLink {
        url: format!("{}://{}/?token={}", scheme, host, token),
        token: token.to_string(),
    }
}

pub fn render_qr_png(data: &str) -> Result<Vec<u8>, ApiError> {
    let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::L)
        .map_err(|e| ApiError::Internal(format!("QR encoding failed: {}", e)))?;

    let image = code
        .render::<Luma<u8>>()
        .module_dimensions(QR_MODULE_PX, QR_MODULE_PX)
        .quiet_zone(true)
        .build();

    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| ApiError::Internal(format!("PNG encoding failed: {}", e)))?;

    Ok(png)
}

/// Uppercase letters and digits, easy to read off a printed card.
pub fn generate_token() -> GeneratedToken {
    let mut rng = rand::thread_rng();
    let token: String = (0..TOKEN_LEN)
        .map(|_| TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())] as char)
        .collect();

    GeneratedToken { env_line: format!("WEDDING_ACCESS_TOKEN={}", token), token }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

    #[test]
    fn test_access_link() {
        let link = access_link("https", "wesele.example:8443", "ANNA_TOMEK");
        assert_eq!(link.url, "https://wesele.example:8443/?token=ANNA_TOMEK");
        assert_eq!(link.token, "ANNA_TOMEK");
    }

    #[test]
    fn test_qr_is_png() {
        let png = render_qr_png("http://localhost:8080/?token=DEMO2024").unwrap();
        assert!(png.starts_with(PNG_MAGIC));

        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.width(), decoded.height());
        assert_eq!(decoded.width() % QR_MODULE_PX, 0);
    }

    #[test]
    fn test_generated_tokens() {
        let first = generate_token();
        assert_eq!(first.token.len(), TOKEN_LEN);
        assert!(first.token.bytes().all(|b| TOKEN_ALPHABET.contains(&b)));
        assert_eq!(first.env_line, format!("WEDDING_ACCESS_TOKEN={}", first.token));
        assert_ne!(first.token, generate_token().token);
    }
}
