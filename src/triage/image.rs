//! Image signal extraction: raw upload bytes → redness measurement.
//!
//! Redness is measured with the **ratio method**: the fraction of pixels whose
//! red channel is bright (> 150) and exceeds both other channels by more than
//! 20. The fraction is bounded in [0, 1] and does not depend on traversal
//! order, so it is the only image value the risk policies consume.
//!
//! The **mean-difference method** (image-wide mean of `R − (G + B) / 2`,
//! floored at zero) is computed in the same pass and reported as a secondary
//! diagnostic. It never feeds scoring.
//!
//! Pipeline flow:
//! 1. Validate bytes (size bounds, before any decode)
//! 2. Read header dimensions; reject above the pixel budget
//! 3. Decode image
//! 4. Resolve display dimensions (EXIF orientation may swap axes)
//! 5. Reject images below the minimum resolution
//! 6. Convert to RGB and measure redness in a single pass

use std::io::Cursor;

use image::io::Reader as ImageReader;
use image::{GenericImageView, RgbImage};
use serde::Serialize;
use tracing::debug;

use super::TriageError;
use crate::models::enums::ImageQuality;

// ═══════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════

/// Images below this on either axis are rejected as unreliable.
pub const MIN_DIMENSION: u32 = 100;

/// Default upper bound on upload size, enforced before decode.
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Default upper bound on decoded pixel count, checked from the header.
/// 40 Mpx keeps the RGB buffer near 120 MB and covers current phone cameras.
pub const DEFAULT_MAX_PIXELS: u64 = 40_000_000;

/// Minimum valid image size in bytes (smallest valid PNG is ~67 bytes).
const MIN_IMAGE_BYTES: usize = 67;

/// Declared content types accepted for analysis.
const ACCEPTED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png"];

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Per-pixel test for "visibly red" skin.
#[derive(Debug, Clone, Copy)]
pub struct RednessThresholds {
    /// Red channel must exceed this.
    pub brightness: u8,
    /// Red must exceed green and blue by more than this.
    pub margin: u8,
}

impl Default for RednessThresholds {
    fn default() -> Self {
        Self {
            brightness: 150,
            margin: 20,
        }
    }
}

/// Image-derived signal for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageSignal {
    /// Display dimensions after EXIF orientation.
    pub width: u32,
    pub height: u32,
    /// Fraction of red pixels in [0, 1], rounded to three decimals. Canonical.
    pub redness_ratio: f64,
    /// Mean red excess over the green/blue average. Diagnostic only.
    pub mean_redness: f64,
    pub quality: ImageQuality,
}

/// Turns uploaded image bytes into an [`ImageSignal`].
///
/// Pure: no I/O, no model calls. Cost is linear in pixel count.
pub trait ImageAnalyzer: Send + Sync {
    fn analyze(&self, image_bytes: &[u8]) -> Result<ImageSignal, TriageError>;
}

// ═══════════════════════════════════════════════════════════
// RednessAnalyzer — production implementation
// ═══════════════════════════════════════════════════════════

pub struct RednessAnalyzer {
    thresholds: RednessThresholds,
    max_image_bytes: usize,
    max_pixels: u64,
    min_dimension: u32,
}

impl RednessAnalyzer {
    pub fn new(max_image_bytes: usize) -> Self {
        Self {
            thresholds: RednessThresholds::default(),
            max_image_bytes,
            max_pixels: DEFAULT_MAX_PIXELS,
            min_dimension: MIN_DIMENSION,
        }
    }

    pub fn with_max_pixels(mut self, max_pixels: u64) -> Self {
        self.max_pixels = max_pixels;
        self
    }

    pub fn with_thresholds(mut self, thresholds: RednessThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }
}

impl Default for RednessAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_IMAGE_BYTES)
    }
}

impl ImageAnalyzer for RednessAnalyzer {
    fn analyze(&self, image_bytes: &[u8]) -> Result<ImageSignal, TriageError> {
        validate_image_bytes(image_bytes, self.max_image_bytes)?;
        validate_pixel_count(image_bytes, self.max_pixels)?;

        let img = image::load_from_memory(image_bytes)
            .map_err(|e| TriageError::ImageDecode(e.to_string()))?;

        let (width, height) = oriented_dimensions(image_bytes, img.dimensions());
        if width < self.min_dimension || height < self.min_dimension {
            return Err(TriageError::ImageTooSmall {
                width,
                height,
                min: self.min_dimension,
            });
        }

        let rgb = img.to_rgb8();
        let measurement = measure_redness(&rgb, &self.thresholds);
        let quality = ImageQuality::from_dimensions(width, height);

        debug!(
            dims = format!("{width}x{height}"),
            ratio = measurement.ratio,
            mean = measurement.mean_difference,
            quality = quality.as_str(),
            "Image redness measured"
        );

        Ok(ImageSignal {
            width,
            height,
            redness_ratio: round_to(measurement.ratio, 3),
            mean_redness: round_to(measurement.mean_difference, 2),
            quality,
        })
    }
}

// ═══════════════════════════════════════════════════════════
// Pure helper functions
// ═══════════════════════════════════════════════════════════

/// Raw redness values from one pass over the pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RednessMeasurement {
    pub ratio: f64,
    pub mean_difference: f64,
}

/// Measure both redness metrics in a single pass.
///
/// Both are sums over pixels divided by pixel count, so neither depends on
/// the order pixels are visited.
pub fn measure_redness(image: &RgbImage, thresholds: &RednessThresholds) -> RednessMeasurement {
    let pixel_count = (image.width() as u64) * (image.height() as u64);
    if pixel_count == 0 {
        return RednessMeasurement {
            ratio: 0.0,
            mean_difference: 0.0,
        };
    }

    let brightness = u16::from(thresholds.brightness);
    let margin = u16::from(thresholds.margin);

    let mut red_pixels: u64 = 0;
    let mut difference_sum: f64 = 0.0;

    for pixel in image.pixels() {
        let [r, g, b] = pixel.0;
        let (r, g, b) = (u16::from(r), u16::from(g), u16::from(b));

        if r > brightness && r > g + margin && r > b + margin {
            red_pixels += 1;
        }
        difference_sum += f64::from(r) - f64::from(g + b) / 2.0;
    }

    RednessMeasurement {
        ratio: red_pixels as f64 / pixel_count as f64,
        mean_difference: (difference_sum / pixel_count as f64).max(0.0),
    }
}

/// Reject declared content types outside the JPEG/PNG family.
/// Parameters (`; charset=...`) and letter case are ignored.
pub fn validate_content_type(content_type: Option<&str>) -> Result<(), TriageError> {
    let raw = content_type.unwrap_or("").trim();
    let essence = raw
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    if ACCEPTED_CONTENT_TYPES.contains(&essence.as_str()) {
        Ok(())
    } else if raw.is_empty() {
        Err(TriageError::UnsupportedContentType("missing content type".into()))
    } else {
        Err(TriageError::UnsupportedContentType(raw.to_string()))
    }
}

/// Validate image bytes before decoding.
pub fn validate_image_bytes(bytes: &[u8], max_bytes: usize) -> Result<(), TriageError> {
    if bytes.len() < MIN_IMAGE_BYTES {
        return Err(TriageError::ImageDecode(
            "Image data too small to be valid".into(),
        ));
    }
    if bytes.len() > max_bytes {
        return Err(TriageError::ImageTooLarge {
            size: bytes.len(),
            limit_mb: max_bytes.div_ceil(1024 * 1024),
        });
    }
    Ok(())
}

/// Reject images whose header declares more than `max_pixels` pixels.
///
/// Only the header is parsed, so a small, highly compressed upload cannot
/// force a large allocation.
pub fn validate_pixel_count(bytes: &[u8], max_pixels: u64) -> Result<(), TriageError> {
    let (width, height) = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| TriageError::ImageDecode(e.to_string()))?
        .into_dimensions()
        .map_err(|e| TriageError::ImageDecode(e.to_string()))?;

    let pixels = u64::from(width) * u64::from(height);
    if pixels > max_pixels {
        return Err(TriageError::ImageDimensionsTooLarge {
            width,
            height,
            max_pixels,
        });
    }
    Ok(())
}

/// Dimensions as the photo is meant to be viewed.
///
/// EXIF orientations 5–8 rotate by 90°, swapping width and height. Only the
/// axes matter here: redness is independent of pixel order.
pub fn oriented_dimensions(raw_bytes: &[u8], (width, height): (u32, u32)) -> (u32, u32) {
    match read_exif_orientation(raw_bytes) {
        5..=8 => (height, width),
        _ => (width, height),
    }
}

/// Read EXIF orientation tag from raw image bytes.
/// Returns 1 (normal) if no EXIF data or tag not present.
pub fn read_exif_orientation(bytes: &[u8]) -> u32 {
    let mut cursor = Cursor::new(bytes);
    let reader = match exif::Reader::new().read_from_container(&mut cursor) {
        Ok(r) => r,
        Err(_) => return 1,
    };

    reader
        .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
        .unwrap_or(1)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

// ═══════════════════════════════════════════════════════════
// Mock implementation (testing)
// ═══════════════════════════════════════════════════════════

/// Returns a fixed signal without decoding anything.
pub struct MockImageAnalyzer {
    signal: Option<ImageSignal>,
}

impl MockImageAnalyzer {
    /// 800x800 image with the given redness ratio.
    pub fn with_ratio(redness_ratio: f64) -> Self {
        Self {
            signal: Some(ImageSignal {
                width: 800,
                height: 800,
                redness_ratio,
                mean_redness: 0.0,
                quality: ImageQuality::High,
            }),
        }
    }

    pub fn failing() -> Self {
        Self { signal: None }
    }
}

impl ImageAnalyzer for MockImageAnalyzer {
    fn analyze(&self, _image_bytes: &[u8]) -> Result<ImageSignal, TriageError> {
        self.signal
            .clone()
            .ok_or_else(|| TriageError::ImageDecode("Mock decode failure".into()))
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use image::{DynamicImage, ImageOutputFormat, Rgb};

    use super::*;

    const RED: [u8; 3] = [220, 40, 40];
    const SKIN: [u8; 3] = [200, 185, 165];

    fn encode(img: RgbImage, format: ImageOutputFormat) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut cursor, format)
            .unwrap();
        cursor.into_inner()
    }

    fn solid_png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
        encode(RgbImage::from_pixel(width, height, Rgb(color)), ImageOutputFormat::Png)
    }

    /// Top `red_rows` rows red, the rest skin-toned.
    fn banded(width: u32, height: u32, red_rows: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |_, y| {
            if y < red_rows { Rgb(RED) } else { Rgb(SKIN) }
        })
    }

    /// Insert an APP1 EXIF segment carrying only the Orientation tag
    /// right after the JPEG SOI marker.
    fn with_exif_orientation(jpeg: &[u8], orientation: u16) -> Vec<u8> {
        let mut tiff = Vec::new();
        tiff.extend_from_slice(b"MM\x00\x2a");
        tiff.extend_from_slice(&8u32.to_be_bytes());
        tiff.extend_from_slice(&1u16.to_be_bytes());
        tiff.extend_from_slice(&0x0112u16.to_be_bytes());
        tiff.extend_from_slice(&3u16.to_be_bytes());
        tiff.extend_from_slice(&1u32.to_be_bytes());
        tiff.extend_from_slice(&orientation.to_be_bytes());
        tiff.extend_from_slice(&[0, 0]);
        tiff.extend_from_slice(&0u32.to_be_bytes());

        let mut payload = b"Exif\x00\x00".to_vec();
        payload.extend_from_slice(&tiff);

        let mut out = jpeg[..2].to_vec();
        out.extend_from_slice(&[0xFF, 0xE1]);
        out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
        out.extend_from_slice(&payload);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    fn crc32(bytes: &[u8]) -> u32 {
        let mut crc = 0xFFFF_FFFFu32;
        for &byte in bytes {
            crc ^= u32::from(byte);
            for _ in 0..8 {
                crc = if crc & 1 == 1 { (crc >> 1) ^ 0xEDB8_8320 } else { crc >> 1 };
            }
        }
        !crc
    }

    /// PNG signature, IHDR for an RGB image of the given size, and the start
    /// of an IDAT chunk with no real pixel data behind it.
    fn png_header_only(width: u32, height: u32) -> Vec<u8> {
        let mut out = b"\x89PNG\r\n\x1a\n".to_vec();

        let mut ihdr = b"IHDR".to_vec();
        ihdr.extend_from_slice(&width.to_be_bytes());
        ihdr.extend_from_slice(&height.to_be_bytes());
        ihdr.extend_from_slice(&[8, 2, 0, 0, 0]);
        out.extend_from_slice(&13u32.to_be_bytes());
        out.extend_from_slice(&ihdr);
        out.extend_from_slice(&crc32(&ihdr).to_be_bytes());

        out.extend_from_slice(&32u32.to_be_bytes());
        out.extend_from_slice(b"IDAT");
        out.extend_from_slice(&[0u8; 36]);
        out
    }

    // ── measure_redness ──

    #[test]
    fn half_red_image_has_half_ratio() {
        let m = measure_redness(&banded(100, 100, 50), &RednessThresholds::default());
        assert!((m.ratio - 0.5).abs() < 1e-9);
    }

    #[test]
    fn ratio_independent_of_pixel_layout() {
        let thresholds = RednessThresholds::default();
        let rows = measure_redness(&banded(120, 120, 30), &thresholds);
        let columns = RgbImage::from_fn(120, 120, |x, _| {
            if x >= 90 { Rgb(RED) } else { Rgb(SKIN) }
        });
        let scattered = RgbImage::from_fn(120, 120, |x, y| {
            if (x * 7 + y * 13) % 4 == 0 { Rgb(RED) } else { Rgb(SKIN) }
        });
        assert_eq!(rows.ratio, measure_redness(&columns, &thresholds).ratio);
        assert_eq!(rows.ratio, measure_redness(&scattered, &thresholds).ratio);
    }

    #[test]
    fn pixel_must_clear_brightness_and_margin() {
        let t = RednessThresholds::default();
        let dim_red = RgbImage::from_pixel(10, 10, Rgb([150, 20, 20]));
        let pinkish = RgbImage::from_pixel(10, 10, Rgb([200, 180, 60]));
        let on_margin = RgbImage::from_pixel(10, 10, Rgb([200, 180, 180]));
        assert_eq!(measure_redness(&dim_red, &t).ratio, 0.0);
        assert_eq!(measure_redness(&pinkish, &t).ratio, 0.0);
        assert_eq!(measure_redness(&on_margin, &t).ratio, 0.0);
    }

    #[test]
    fn mean_difference_floored_at_zero() {
        let blue = RgbImage::from_pixel(10, 10, Rgb([10, 50, 250]));
        let m = measure_redness(&blue, &RednessThresholds::default());
        assert_eq!(m.mean_difference, 0.0);
    }

    #[test]
    fn mean_difference_of_solid_red() {
        let m = measure_redness(
            &RgbImage::from_pixel(10, 10, Rgb(RED)),
            &RednessThresholds::default(),
        );
        assert!((m.mean_difference - 180.0).abs() < 1e-9);
    }

    // ── RednessAnalyzer ──

    #[test]
    fn analyzer_reports_ratio_and_quality() {
        let bytes = encode(banded(400, 400, 100), ImageOutputFormat::Png);
        let signal = RednessAnalyzer::default().analyze(&bytes).unwrap();
        assert_eq!(signal.redness_ratio, 0.25);
        assert_eq!(signal.quality, ImageQuality::Medium);
        assert_eq!((signal.width, signal.height), (400, 400));
    }

    #[test]
    fn looser_margin_counts_skin_as_red() {
        // SKIN leads green by 15 and blue by 35.
        let bytes = solid_png(100, 100, SKIN);
        let lenient = RednessAnalyzer::default().with_thresholds(RednessThresholds {
            brightness: 150,
            margin: 10,
        });
        assert_eq!(lenient.analyze(&bytes).unwrap().redness_ratio, 1.0);
        assert_eq!(RednessAnalyzer::default().analyze(&bytes).unwrap().redness_ratio, 0.0);
    }

    #[test]
    fn ratio_always_within_unit_interval() {
        for red_rows in [0, 1, 37, 100, 150] {
            let bytes = encode(banded(150, 150, red_rows), ImageOutputFormat::Png);
            let signal = RednessAnalyzer::default().analyze(&bytes).unwrap();
            assert!((0.0..=1.0).contains(&signal.redness_ratio));
        }
    }

    #[test]
    fn jpeg_is_decoded() {
        let bytes = encode(RgbImage::from_pixel(200, 200, Rgb(RED)), ImageOutputFormat::Jpeg(90));
        let signal = RednessAnalyzer::default().analyze(&bytes).unwrap();
        assert!(signal.redness_ratio > 0.95);
        assert_eq!(signal.quality, ImageQuality::Low);
    }

    #[test]
    fn exactly_minimum_dimensions_accepted() {
        let signal = RednessAnalyzer::default()
            .analyze(&solid_png(100, 100, SKIN))
            .unwrap();
        assert_eq!(signal.redness_ratio, 0.0);
        assert_eq!(signal.quality, ImageQuality::Low);
    }

    #[test]
    fn narrow_image_rejected() {
        let err = RednessAnalyzer::default()
            .analyze(&solid_png(99, 400, SKIN))
            .unwrap_err();
        assert!(matches!(
            err,
            TriageError::ImageTooSmall { width: 99, height: 400, min: 100 }
        ));
    }

    #[test]
    fn garbage_bytes_fail_decode() {
        let err = RednessAnalyzer::default().analyze(&[0x42; 512]).unwrap_err();
        assert!(matches!(err, TriageError::ImageDecode(_)));
    }

    #[test]
    fn oversized_upload_rejected_before_decode() {
        let analyzer = RednessAnalyzer::new(1024);
        let err = analyzer.analyze(&[0u8; 2048]).unwrap_err();
        assert!(matches!(err, TriageError::ImageTooLarge { size: 2048, .. }));
    }

    #[test]
    fn analysis_is_deterministic() {
        let bytes = encode(banded(300, 200, 80), ImageOutputFormat::Png);
        let analyzer = RednessAnalyzer::default();
        assert_eq!(analyzer.analyze(&bytes).unwrap(), analyzer.analyze(&bytes).unwrap());
    }

    #[test]
    fn pixel_budget_rejects_before_decode() {
        let bytes = encode(banded(400, 400, 100), ImageOutputFormat::Png);
        let err = RednessAnalyzer::default()
            .with_max_pixels(100_000)
            .analyze(&bytes)
            .unwrap_err();
        assert!(matches!(
            err,
            TriageError::ImageDimensionsTooLarge { width: 400, height: 400, max_pixels: 100_000 }
        ));
    }

    #[test]
    fn huge_declared_dimensions_rejected_from_header() {
        // 12000x12000 claimed by a ~80 byte file: only the header is read.
        let bytes = png_header_only(12_000, 12_000);
        assert!(bytes.len() >= MIN_IMAGE_BYTES);
        let err = RednessAnalyzer::default().analyze(&bytes).unwrap_err();
        assert!(matches!(
            err,
            TriageError::ImageDimensionsTooLarge { width: 12_000, height: 12_000, .. }
        ));
    }

    #[test]
    fn default_budget_fits_phone_photos() {
        let bytes = png_header_only(4032, 3024);
        assert!(validate_pixel_count(&bytes, DEFAULT_MAX_PIXELS).is_ok());
    }

    #[test]
    fn exif_rotation_swaps_axes_and_quality() {
        let jpeg = encode(RgbImage::from_pixel(900, 400, Rgb(RED)), ImageOutputFormat::Jpeg(90));
        let rotated = with_exif_orientation(&jpeg, 6);
        assert_eq!(read_exif_orientation(&rotated), 6);

        let upright = RednessAnalyzer::default().analyze(&jpeg).unwrap();
        assert_eq!((upright.width, upright.height), (900, 400));
        assert_eq!(upright.quality, ImageQuality::High);

        let signal = RednessAnalyzer::default().analyze(&rotated).unwrap();
        assert_eq!((signal.width, signal.height), (400, 900));
        assert_eq!(signal.quality, ImageQuality::Medium);
        assert_eq!(signal.redness_ratio, upright.redness_ratio);
    }

    #[test]
    fn only_quarter_turn_orientations_swap_axes() {
        let jpeg = encode(RgbImage::from_pixel(400, 150, Rgb(RED)), ImageOutputFormat::Jpeg(90));
        assert_eq!(oriented_dimensions(&with_exif_orientation(&jpeg, 8), (400, 150)), (150, 400));
        assert_eq!(oriented_dimensions(&with_exif_orientation(&jpeg, 3), (400, 150)), (400, 150));
    }

    #[test]
    fn png_without_exif_keeps_axes() {
        let bytes = solid_png(300, 120, SKIN);
        assert_eq!(read_exif_orientation(&bytes), 1);
        assert_eq!(oriented_dimensions(&bytes, (300, 120)), (300, 120));
    }

    // ── validate_content_type ──

    #[test]
    fn jpeg_and_png_types_accepted() {
        for ct in ["image/jpeg", "image/jpg", "image/png", "IMAGE/PNG", "image/jpeg; q=0.9"] {
            assert!(validate_content_type(Some(ct)).is_ok(), "{ct} should be accepted");
        }
    }

    #[test]
    fn other_types_rejected() {
        for ct in ["application/pdf", "image/gif", "image/webp", "text/plain"] {
            assert!(matches!(
                validate_content_type(Some(ct)),
                Err(TriageError::UnsupportedContentType(_))
            ));
        }
        assert!(validate_content_type(None).is_err());
    }

    // ── Mock ──

    #[test]
    fn mock_analyzer_returns_configured_ratio() {
        let signal = MockImageAnalyzer::with_ratio(0.42).analyze(&[]).unwrap();
        assert_eq!(signal.redness_ratio, 0.42);
        assert!(MockImageAnalyzer::failing().analyze(&[]).is_err());
    }
}
