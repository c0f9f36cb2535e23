// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Check-in token codec.
//!
//! Maps a [`CheckinToken`] to the `user:event:issued_at` payload string and
//! that string to and from a QR raster image.

use crate::models::{CheckinToken, EventId, UserId};
use image::{DynamicImage, GrayImage, ImageFormat, ImageReader, Limits, Luma};
use qrcode::{EcLevel, QrCode};
use std::io::Cursor;

const FIELD_SEPARATOR: char = ':';
const FIELD_COUNT: usize = 3;

/// Default rendered image edge, in pixels.
pub const DEFAULT_IMAGE_SIZE: u32 = 256;
/// Largest image edge we agree to render.
pub const MAX_IMAGE_SIZE: u32 = 4096;
/// Largest image edge we agree to scan.
pub const MAX_DECODE_DIMENSION: u32 = 4096;
/// Decoder allocation ceiling for one upload.
const MAX_DECODE_ALLOC: u64 = 128 * 1024 * 1024;

/// Payload decoded from an image does not have the token shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Malformed token: {reason}")]
pub struct MalformedTokenError {
    pub reason: String,
}

impl MalformedTokenError {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Errors rendering a payload as an image.
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("Payload cannot be encoded as QR: {0}")]
    Qr(String),

    #[error("Image size {0} out of range (1..={MAX_IMAGE_SIZE})")]
    Size(u32),

    #[error("Failed to write PNG: {0}")]
    Png(String),
}

/// Errors reading a payload back out of an image.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Failed to load image: {0}")]
    Image(String),

    #[error("No QR code found in image")]
    NotFound,

    #[error("QR code unreadable: {0}")]
    Unreadable(String),
}

/// Bidirectional token <-> payload <-> image codec.
#[derive(Debug, Clone, Copy)]
pub struct CheckinTokenCodec {
    image_size: u32,
}

impl Default for CheckinTokenCodec {
    fn default() -> Self {
        Self::new(DEFAULT_IMAGE_SIZE)
    }
}

impl CheckinTokenCodec {
    /// Create a codec rendering images of `image_size` pixels per edge.
    pub fn new(image_size: u32) -> Self {
        Self { image_size }
    }

    pub fn image_size(&self) -> u32 {
        self.image_size
    }

    /// Payload string for a token. Fields are integers, so nothing needs escaping.
    pub fn encode(&self, token: &CheckinToken) -> String {
        format!(
            "{}{sep}{}{sep}{}",
            token.user_id,
            token.event_id,
            token.issued_at,
            sep = FIELD_SEPARATOR
        )
    }

    /// Parse a payload string back into a token.
    ///
    /// Every failure is a [`MalformedTokenError`] carrying a readable reason.
    pub fn parse(&self, payload: &str) -> Result<CheckinToken, MalformedTokenError> {
        let fields: Vec<&str> = payload.split(FIELD_SEPARATOR).collect();
        if fields.len() != FIELD_COUNT {
            return Err(MalformedTokenError::new(format!(
                "expected {} colon-separated fields, found {}",
                FIELD_COUNT,
                fields.len()
            )));
        }

        let user_id = parse_field("user id", fields[0])?;
        let event_id = parse_field("event id", fields[1])?;
        let issued_at = parse_field("issue time", fields[2])?;

        if user_id == 0 {
            return Err(MalformedTokenError::new("user id must be positive"));
        }
        if event_id == 0 {
            return Err(MalformedTokenError::new("event id must be positive"));
        }

        Ok(CheckinToken::new(UserId(user_id), EventId(event_id), issued_at))
    }

    /// Render a payload as a QR code at least `size` pixels wide.
    pub fn render_image(&self, payload: &str, size: u32) -> Result<GrayImage, EncodingError> {
        if size == 0 || size > MAX_IMAGE_SIZE {
            return Err(EncodingError::Size(size));
        }

        let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::M)
            .map_err(|e| EncodingError::Qr(e.to_string()))?;

        Ok(code
            .render::<Luma<u8>>()
            .quiet_zone(true)
            .min_dimensions(size, size)
            .build())
    }

    /// Render a payload as a PNG at the configured size.
    pub fn render_png(&self, payload: &str) -> Result<Vec<u8>, EncodingError> {
        let image = self.render_image(payload, self.image_size)?;

        let mut png = Vec::new();
        DynamicImage::ImageLuma8(image)
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| EncodingError::Png(e.to_string()))?;
        Ok(png)
    }

    /// Decode the payload of the first readable QR code in `image`.
    ///
    /// Tries harder than a single pass: the grayscale image is scanned as-is,
    /// padded with a quiet zone, inverted, and contrast-stretched, and every
    /// detected grid is attempted before giving up.
    pub fn decode_image(&self, image: &DynamicImage) -> Result<String, DecodeError> {
        check_decode_dimensions(image.width(), image.height())?;

        let gray = image.to_luma8();
        let mut last_error = None;

        // Each fallback variant is only built once the previous pass failed.
        let variants: [fn(&GrayImage) -> GrayImage; 3] =
            [pad_quiet_zone, invert_luma, stretch_contrast];
        let mut attempt = decode_grids(&gray);
        let mut variants = variants.iter();

        loop {
            match attempt {
                Ok(payload) => return Ok(payload),
                Err(DecodeError::NotFound) => {}
                Err(e) => last_error = Some(e),
            }
            let Some(variant) = variants.next() else {
                break;
            };
            attempt = decode_grids(&variant(&gray));
        }

        // A grid that was found but failed to decode says more than "not found".
        Err(last_error.unwrap_or(DecodeError::NotFound))
    }

    /// Load an encoded raster (PNG, JPEG) and decode it.
    ///
    /// Dimensions and decoder allocations are capped before pixels are
    /// decompressed.
    pub fn decode_bytes(&self, bytes: &[u8]) -> Result<String, DecodeError> {
        let mut limits = Limits::default();
        limits.max_image_width = Some(MAX_DECODE_DIMENSION);
        limits.max_image_height = Some(MAX_DECODE_DIMENSION);
        limits.max_alloc = Some(MAX_DECODE_ALLOC);

        let mut reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| DecodeError::Image(e.to_string()))?;
        reader.limits(limits);

        let image = reader
            .decode()
            .map_err(|e| DecodeError::Image(e.to_string()))?;
        self.decode_image(&image)
    }
}

fn check_decode_dimensions(width: u32, height: u32) -> Result<(), DecodeError> {
    if width > MAX_DECODE_DIMENSION || height > MAX_DECODE_DIMENSION {
        return Err(DecodeError::Image(format!(
            "image {}x{} exceeds {}x{}",
            width, height, MAX_DECODE_DIMENSION, MAX_DECODE_DIMENSION
        )));
    }
    Ok(())
}

fn parse_field(name: &str, raw: &str) -> Result<u64, MalformedTokenError> {
    if raw.is_empty() {
        return Err(MalformedTokenError::new(format!("{} is empty", name)));
    }
    // `u64::from_str` accepts a leading '+', the wire format does not.
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MalformedTokenError::new(format!(
            "{} is not a non-negative integer",
            name
        )));
    }
    raw.parse::<u64>()
        .map_err(|_| MalformedTokenError::new(format!("{} is out of range", name)))
}

fn invert_luma(gray: &GrayImage) -> GrayImage {
    let mut inverted = gray.clone();
    image::imageops::invert(&mut inverted);
    inverted
}

fn decode_grids(gray: &GrayImage) -> Result<String, DecodeError> {
    let (width, height) = gray.dimensions();
    let mut prepared =
        rqrr::PreparedImage::prepare_from_greyscale(width as usize, height as usize, |x, y| {
            gray.get_pixel(x as u32, y as u32).0[0]
        });

    let grids = prepared.detect_grids();
    if grids.is_empty() {
        return Err(DecodeError::NotFound);
    }

    let mut last_error = None;
    for grid in grids {
        match grid.decode() {
            Ok((_, content)) => return Ok(content),
            Err(e) => last_error = Some(format!("{:?}", e)),
        }
    }

    Err(DecodeError::Unreadable(
        last_error.unwrap_or_else(|| "no decodable grid".to_string()),
    ))
}

/// Surround the image with a white border so codes cropped tight to the
/// edge still have a finder-pattern margin.
fn pad_quiet_zone(gray: &GrayImage) -> GrayImage {
    let (width, height) = gray.dimensions();
    let border = (width.max(height) / 10).max(8);

    let mut padded = GrayImage::from_pixel(width + 2 * border, height + 2 * border, Luma([255]));
    image::imageops::replace(&mut padded, gray, i64::from(border), i64::from(border));
    padded
}

/// Linearly remap luma so the darkest pixel becomes 0 and the lightest 255.
fn stretch_contrast(gray: &GrayImage) -> GrayImage {
    let (min, max) = gray
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p.0[0]), hi.max(p.0[0])));

    if max <= min {
        return gray.clone();
    }

    let range = u32::from(max - min);
    let mut stretched = gray.clone();
    for pixel in stretched.pixels_mut() {
        let value = u32::from(pixel.0[0] - min) * 255 / range;
        pixel.0[0] = value as u8;
    }
    stretched
}
