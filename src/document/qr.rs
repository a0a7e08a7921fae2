//! QR code of a reference, for the HTML receipt

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat, Luma};
use qrcode::QrCode;
use std::io::Cursor;

use crate::error::{AppError, Result};

/// PNG bytes of a QR code encoding `reference`
pub fn reference_qr_png(reference: &str) -> Result<Vec<u8>> {
    let code = QrCode::new(reference.as_bytes()).map_err(|e| AppError::QrCode(e.to_string()))?;
    let image = code.render::<Luma<u8>>().min_dimensions(160, 160).build();

    let mut png = Vec::new();
    DynamicImage::ImageLuma8(image)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| AppError::QrCode(e.to_string()))?;

    Ok(png)
}

/// `data:` URI of the reference QR code, ready for an `<img src>`
pub fn reference_qr_data_uri(reference: &str) -> Result<String> {
    let png = reference_qr_png(reference)?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qr_png_signature() {
        let png = reference_qr_png("D000012-DUPONT").unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_qr_data_uri() {
        let uri = reference_qr_data_uri("D000012-DUPONT").unwrap();
        assert!(uri.starts_with("data:image/png;base64,iVBORw0KGgo"));
    }
}
