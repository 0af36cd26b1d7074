//! Pixel features: decode an image, resample it to a fixed square and
//! flatten the RGB channels into a normalized vector.
//!
//! Training and query images must both go through [`extract`]; the
//! resampling filter is fixed here so the two can never diverge.

use std::ops::Deref;
use std::path::Path;

use image::{DynamicImage, GenericImageView, imageops::FilterType};

use crate::error::{Error, Result};

/// Side length of the square every image is resampled to.
pub const INPUT_SIZE: u32 = 32;

/// Length of every feature vector: three channels per resampled pixel.
pub const FEATURE_LEN: usize = 3 * (INPUT_SIZE as usize) * (INPUT_SIZE as usize);

const RESIZE_FILTER: FilterType = FilterType::Triangle;

/// Flattened, normalized RGB values of a resampled image.
///
/// The length is always [`FEATURE_LEN`] and every value lies in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    /// Wraps raw values, rejecting anything that is not [`FEATURE_LEN`] long.
    pub fn new(values: Vec<f32>) -> Result<Self> {
        if values.len() != FEATURE_LEN {
            return Err(Error::DimensionMismatch {
                expected: FEATURE_LEN,
                actual: values.len(),
            });
        }
        Ok(Self(values))
    }
}

impl Deref for FeatureVector {
    type Target = [f32];

    fn deref(&self) -> &[f32] {
        &self.0
    }
}

/// Converts a decoded image into its feature vector.
pub fn extract(image: &DynamicImage) -> Result<FeatureVector> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::decode(
            "<in-memory>",
            format!("image has zero area ({width}x{height})"),
        ));
    }
    let resized = image
        .resize_exact(INPUT_SIZE, INPUT_SIZE, RESIZE_FILTER)
        .to_rgb8();
    let values: Vec<f32> = resized
        .pixels()
        .flat_map(|p| p.0.into_iter().map(normalize_channel))
        .collect();
    FeatureVector::new(values)
}

/// Decodes an image file from disk.
pub fn decode_file(path: impl AsRef<Path>) -> Result<DynamicImage> {
    let path = path.as_ref();
    image::open(path).map_err(|e| Error::decode(path.display().to_string(), e))
}

/// Decodes an encoded image held in memory (e.g. a captured video frame).
pub fn decode_bytes(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| Error::decode("<in-memory>", e))
}

fn normalize_channel(value: u8) -> f32 {
    value as f32 / 255.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use image::{ImageFormat, Rgb, RgbImage};
    use rstest::rstest;
    use std::io::Cursor;

    fn solid(width: u32, height: u32, rgb: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(rgb)))
    }

    #[rstest]
    #[case(1, 1)]
    #[case(7, 3)]
    #[case(32, 32)]
    #[case(33, 100)]
    #[case(640, 480)]
    fn extract_always_yields_fixed_length_in_unit_range(
        #[case] width: u32,
        #[case] height: u32,
    ) -> Result<()> {
        let mut img = RgbImage::new(width, height);
        for (x, y, px) in img.enumerate_pixels_mut() {
            *px = Rgb([(x * 37 % 256) as u8, (y * 91 % 256) as u8, ((x + y) % 256) as u8]);
        }
        let features = extract(&DynamicImage::ImageRgb8(img))?;
        assert_eq!(features.len(), FEATURE_LEN);
        assert!(features.iter().all(|v| (0.0..=1.0).contains(v)));
        Ok(())
    }

    #[test]
    fn extract_is_deterministic() -> Result<()> {
        let mut img = RgbImage::new(50, 20);
        for (x, y, px) in img.enumerate_pixels_mut() {
            *px = Rgb([(x * 5) as u8, (y * 11) as u8, 200]);
        }
        let img = DynamicImage::ImageRgb8(img);
        let a = extract(&img)?;
        let b = extract(&img)?;
        let a_bits: Vec<u32> = a.iter().map(|v| v.to_bits()).collect();
        let b_bits: Vec<u32> = b.iter().map(|v| v.to_bits()).collect();
        assert_eq!(a_bits, b_bits);
        Ok(())
    }

    #[test]
    fn extract_normalizes_solid_colour() -> Result<()> {
        let features = extract(&solid(64, 48, [255, 0, 51]))?;
        for px in features.chunks(3) {
            assert_relative_eq!(px[0], 1.0, epsilon = 1e-6);
            assert_relative_eq!(px[1], 0.0, epsilon = 1e-6);
            assert_relative_eq!(px[2], 0.2, epsilon = 1e-6);
        }
        Ok(())
    }

    #[test]
    fn extract_flattens_row_major() -> Result<()> {
        let mut img = RgbImage::new(INPUT_SIZE, INPUT_SIZE);
        img.put_pixel(1, 0, Rgb([255, 0, 0]));
        img.put_pixel(0, 1, Rgb([0, 255, 0]));
        let features = extract(&DynamicImage::ImageRgb8(img))?;
        // pixel (x=1, y=0) starts at offset 3
        assert_relative_eq!(features[3], 1.0);
        assert_relative_eq!(features[4], 0.0);
        // pixel (x=0, y=1) starts one full row later
        let row = 3 * INPUT_SIZE as usize;
        assert_relative_eq!(features[row], 0.0);
        assert_relative_eq!(features[row + 1], 1.0);
        Ok(())
    }

    #[test]
    fn extract_rejects_zero_area() {
        let empty = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
        assert!(matches!(extract(&empty), Err(Error::Decode { .. })));
    }

    #[test]
    fn feature_vector_rejects_wrong_length() {
        let err = FeatureVector::new(vec![0.0; FEATURE_LEN - 1]).unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                expected: FEATURE_LEN,
                actual
            } if actual == FEATURE_LEN - 1
        ));
    }

    #[test]
    fn decode_bytes_roundtrips_png() -> Result<()> {
        let mut buf = Cursor::new(Vec::new());
        solid(4, 4, [10, 20, 30])
            .write_to(&mut buf, ImageFormat::Png)
            .map_err(|e| Error::decode("test", e))?;
        let decoded = decode_bytes(buf.get_ref())?;
        assert_eq!(decoded.dimensions(), (4, 4));
        Ok(())
    }

    #[test]
    fn decode_bytes_rejects_garbage() {
        let err = decode_bytes(b"definitely not an image").unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }
}
