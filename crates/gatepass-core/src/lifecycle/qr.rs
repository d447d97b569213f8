// ── QR pass payloads ──
//
// A pass QR symbol carries a compact JSON snapshot of the pass. Symbols are
// encoded at error-correction level High so a printed or partly covered
// code still scans. Everything here is local; no network.

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use image::{DynamicImage, GrayImage, ImageOutputFormat, Luma};
use qrcodegen::{QrCode, QrCodeEcc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::expiry::{PASS_VALIDITY_SECS, format_instant};

/// Type discriminator written into every pass payload.
pub const PASS_PAYLOAD_TYPE: &str = "visitor_pass";

/// Light modules around the symbol, per the QR spec.
const QUIET_ZONE: usize = 4;

/// Default pixels per module for raster output.
pub const DEFAULT_MODULE_PX: u32 = 8;

/// Recoverable QR failures. Pass creation stays retryable after any of these.
#[derive(Debug, Error)]
pub enum QrError {
    #[error("pass payload does not fit in a QR symbol: {0}")]
    DataTooLong(#[from] qrcodegen::DataTooLong),

    #[error("failed to serialize pass payload: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to render QR image: {0}")]
    Image(#[from] image::ImageError),
}

// ── Payload ─────────────────────────────────────────────────────────

/// The JSON object encoded into a pass QR symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassPayload {
    pub code: String,
    pub visitor_name: String,
    pub expires_at: String,
    pub created_at: String,
    /// Validity window in seconds.
    pub validity_duration: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

impl PassPayload {
    pub fn new(
        code: &str,
        visitor_name: &str,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            code: code.to_owned(),
            visitor_name: visitor_name.to_owned(),
            expires_at: format_instant(expires_at),
            created_at: format_instant(created_at),
            validity_duration: PASS_VALIDITY_SECS,
            kind: PASS_PAYLOAD_TYPE.to_owned(),
        }
    }

    /// Compact JSON, the exact string placed in the symbol.
    pub fn encode(&self) -> Result<String, QrError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a scanned string back into a payload.
    pub fn decode(raw: &str) -> Result<Self, QrError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Returns `true` if the discriminator marks this as a visitor pass.
    pub fn is_visitor_pass(&self) -> bool {
        self.kind == PASS_PAYLOAD_TYPE
    }
}

// ── Rendered symbol ─────────────────────────────────────────────────

/// A rendered pass QR symbol plus the raw string it encodes.
pub struct QrImage {
    data: String,
    code: QrCode,
}

impl std::fmt::Debug for QrImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QrImage")
            .field("data", &self.data)
            .field("modules", &self.modules())
            .finish()
    }
}

/// Encode `data` as a QR symbol at error-correction level High.
pub fn render(data: &str) -> Result<QrImage, QrError> {
    let code = QrCode::encode_text(data, QrCodeEcc::High)?;
    Ok(QrImage {
        data: data.to_owned(),
        code,
    })
}

/// Serialize `payload` and encode it in one step.
pub fn render_payload(payload: &PassPayload) -> Result<QrImage, QrError> {
    render(&payload.encode()?)
}

impl QrImage {
    /// The raw encoded string, for copy/share.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Symbol width in modules, without the quiet zone.
    pub fn modules(&self) -> usize {
        usize::try_from(self.code.size()).unwrap_or(0)
    }

    /// Returns `true` for a dark module. Coordinates outside the symbol
    /// (the quiet zone) are light.
    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        match (i32::try_from(x), i32::try_from(y)) {
            (Ok(x), Ok(y)) => self.code.get_module(x, y),
            _ => false,
        }
    }

    /// Dark-module test in quiet-zone-padded coordinates.
    fn padded_dark(&self, x: usize, y: usize) -> bool {
        let size = self.modules();
        if x < QUIET_ZONE || y < QUIET_ZONE {
            return false;
        }
        let (x, y) = (x - QUIET_ZONE, y - QUIET_ZONE);
        x < size && y < size && self.is_dark(x, y)
    }

    fn padded_size(&self) -> usize {
        self.modules() + 2 * QUIET_ZONE
    }

    /// Greyscale raster, `module_px` pixels per module, quiet zone included.
    pub fn to_luma(&self, module_px: u32) -> GrayImage {
        let scale = module_px.max(1);
        let side = u32::try_from(self.padded_size())
            .unwrap_or(u32::MAX / scale)
            .saturating_mul(scale);
        GrayImage::from_fn(side, side, |px, py| {
            let mx = usize::try_from(px / scale).unwrap_or(usize::MAX);
            let my = usize::try_from(py / scale).unwrap_or(usize::MAX);
            if self.padded_dark(mx, my) {
                Luma([0u8])
            } else {
                Luma([255u8])
            }
        })
    }

    /// PNG bytes, `module_px` pixels per module.
    pub fn to_png(&self, module_px: u32) -> Result<Vec<u8>, QrError> {
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(self.to_luma(module_px))
            .write_to(&mut buf, ImageOutputFormat::Png)?;
        Ok(buf.into_inner())
    }

    /// `data:image/png;base64,...` URL, ready for an `<img src>`.
    pub fn to_data_url(&self, module_px: u32) -> Result<String, QrError> {
        let png = self.to_png(module_px)?;
        Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
    }

    /// Standalone SVG document, one unit per module.
    pub fn to_svg(&self) -> String {
        use std::fmt::Write;

        let side = self.padded_size();
        let mut path = String::new();
        for y in 0..side {
            for x in 0..side {
                if self.padded_dark(x, y) {
                    let _ = write!(path, "M{x},{y}h1v1h-1z");
                }
            }
        }

        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" \
             viewBox=\"0 0 {side} {side}\" stroke=\"none\">\n\
             <rect width=\"100%\" height=\"100%\" fill=\"#FFFFFF\"/>\n\
             <path d=\"{path}\" fill=\"#000000\"/>\n\
             </svg>\n"
        )
    }

    /// Terminal rendering using half blocks: two module rows per line.
    ///
    /// Dark modules are drawn as spaces on a light background, so the
    /// output scans on dark-themed terminals too.
    pub fn to_terminal(&self) -> String {
        let side = self.padded_size();
        let mut out = String::with_capacity(side * (side / 2 + 1) * 3);
        for y in (0..side).step_by(2) {
            for x in 0..side {
                let top = self.padded_dark(x, y);
                let bottom = y + 1 < side && self.padded_dark(x, y + 1);
                out.push(match (top, bottom) {
                    (false, false) => '█',
                    (false, true) => '▀',
                    (true, false) => '▄',
                    (true, true) => ' ',
                });
            }
            out.push('\n');
        }
        out
    }
}
