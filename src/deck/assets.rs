//! Slide assets: site photos, map images and location QR codes.
//!
//! Missing or undecodable images never fail a slide; they are replaced by a
//! generated placeholder.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{Rgb, RgbImage};
use qrcode::{Color, QrCode};

/// Longest edge, in pixels, of any embedded image
pub const MAX_IMAGE_EDGE: u32 = 1280;

const PLACEHOLDER_SIZE: (u32, u32) = (640, 400);
const PLACEHOLDER_FILL: Rgb<u8> = Rgb([0xd9, 0xdd, 0xe2]);

/// Decoded RGB raster ready for embedding
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAsset {
    pub width: u32,
    pub height: u32,
    /// Packed 8-bit RGB, row-major
    pub rgb: Vec<u8>,
    pub placeholder: bool,
}

impl ImageAsset {
    pub fn placeholder() -> Self {
        let (w, h) = PLACEHOLDER_SIZE;
        let img = RgbImage::from_pixel(w, h, PLACEHOLDER_FILL);
        Self {
            width: w,
            height: h,
            rgb: img.into_raw(),
            placeholder: true,
        }
    }

    /// Width over height
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("not a base64 data URL")]
    NotDataUrl,

    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("undecodable image: {0}")]
    Image(#[from] image::ImageError),
}

/// Extract the bytes of a `data:<mime>;base64,<payload>` URL
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, AssetError> {
    let rest = url.trim().strip_prefix("data:").ok_or(AssetError::NotDataUrl)?;
    let (meta, payload) = rest.split_once(',').ok_or(AssetError::NotDataUrl)?;
    if !meta.ends_with(";base64") {
        return Err(AssetError::NotDataUrl);
    }
    Ok(STANDARD.decode(payload.trim())?)
}

/// Decode a data URL into an embeddable raster, downscaled to `MAX_IMAGE_EDGE`
pub fn decode_image(url: &str) -> Result<ImageAsset, AssetError> {
    let bytes = decode_data_url(url)?;
    let mut img = image::load_from_memory(&bytes)?;
    if img.width() > MAX_IMAGE_EDGE || img.height() > MAX_IMAGE_EDGE {
        img = img.thumbnail(MAX_IMAGE_EDGE, MAX_IMAGE_EDGE);
    }

    let rgb = img.to_rgb8();
    Ok(ImageAsset {
        width: rgb.width(),
        height: rgb.height(),
        rgb: rgb.into_raw(),
        placeholder: false,
    })
}

/// Load an optional image, falling back to the placeholder
pub fn load_or_placeholder(url: Option<&str>, what: &str, site_code: &str) -> ImageAsset {
    match url {
        None => ImageAsset::placeholder(),
        Some(url) => decode_image(url).unwrap_or_else(|e| {
            tracing::warn!("Using placeholder {} for {}: {}", what, site_code, e);
            ImageAsset::placeholder()
        }),
    }
}

/// QR module grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrMatrix {
    pub width: usize,
    /// Row-major, `true` for dark modules
    pub dark: Vec<bool>,
}

impl QrMatrix {
    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        self.dark[y * self.width + x]
    }
}

/// Map link encoded for a site's coordinates
pub fn map_link(latitude: f64, longitude: f64) -> String {
    format!("https://maps.google.com/?q={:.6},{:.6}", latitude, longitude)
}

/// QR code pointing at the site on a map
pub fn location_qr(latitude: f64, longitude: f64) -> Result<QrMatrix, qrcode::types::QrError> {
    let code = QrCode::new(map_link(latitude, longitude).as_bytes())?;
    Ok(QrMatrix {
        width: code.width(),
        dark: code.to_colors().into_iter().map(|c| c == Color::Dark).collect(),
    })
}
