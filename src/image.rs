//! In-memory raster image buffer.

use std::io::Cursor;

use image::{ImageFormat, RgbImage};

use super::error::{Error, Result};

/// A row-major, channel-last RGB image with normalized float intensities.
///
/// Values are in `[0, 1]`; `data.len() == width * height * 3`. This is the
/// interchange format at the crate boundary; 8-bit RGB is used for the wire
/// (PNG upload, result download).
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl ImageBuffer {
    /// Creates a buffer from normalized float pixel data.
    ///
    /// Fails if `data.len()` does not match `width * height * 3`.
    pub fn new(width: u32, height: u32, data: Vec<f32>) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(Error::Config(format!(
                "pixel data length {} does not match {}x{}x3 = {}",
                data.len(),
                width,
                height,
                expected
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Creates a buffer from 8-bit RGB pixel data, scaling into `[0, 1]`.
    pub fn from_rgb8(width: u32, height: u32, pixels: &[u8]) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if pixels.len() != expected {
            return Err(Error::Config(format!(
                "pixel data length {} does not match {}x{}x3 = {}",
                pixels.len(),
                width,
                height,
                expected
            )));
        }
        let data = pixels.iter().map(|&v| v as f32 / 255.0).collect();
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the normalized pixel data, row-major, channel-last.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Converts to 8-bit RGB, rounding and clamping each channel.
    pub fn to_rgb8(&self) -> Vec<u8> {
        self.data
            .iter()
            .map(|&v| (v * 255.0).round().clamp(0.0, 255.0) as u8)
            .collect()
    }

    /// Encodes the image as PNG in memory.
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let rgb = RgbImage::from_raw(self.width, self.height, self.to_rgb8())
            .ok_or_else(|| Error::Config("pixel buffer does not fit dimensions".to_string()))?;
        let mut out = Cursor::new(Vec::new());
        rgb.write_to(&mut out, ImageFormat::Png)?;
        Ok(out.into_inner())
    }

    /// Decodes an encoded still image (any format the `image` crate reads)
    /// into a normalized RGB buffer.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let rgb = image::load_from_memory(bytes)?.to_rgb8();
        let (width, height) = rgb.dimensions();
        Self::from_rgb8(width, height, rgb.as_raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> ImageBuffer {
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for y in 0..height {
            for x in 0..width {
                data.push(x as f32 / width.max(1) as f32);
                data.push(y as f32 / height.max(1) as f32);
                data.push(0.5);
            }
        }
        ImageBuffer::new(width, height, data).unwrap()
    }

    #[test]
    fn rejects_mismatched_length() {
        assert!(ImageBuffer::new(4, 4, vec![0.0; 10]).is_err());
        assert!(ImageBuffer::from_rgb8(4, 4, &[0u8; 10]).is_err());
    }

    #[test]
    fn rgb8_round_trip_is_exact() {
        let pixels: Vec<u8> = (0..=255).cycle().take(8 * 8 * 3).map(|v| v as u8).collect();
        let buf = ImageBuffer::from_rgb8(8, 8, &pixels).unwrap();
        assert_eq!(buf.to_rgb8(), pixels);
    }

    #[test]
    fn png_round_trip_within_one_step() {
        let original = gradient(16, 12);
        let png = original.encode_png().unwrap();
        let decoded = ImageBuffer::decode(&png).unwrap();

        assert_eq!(decoded.width(), 16);
        assert_eq!(decoded.height(), 12);
        for (a, b) in original.data().iter().zip(decoded.data()) {
            assert!((a - b).abs() <= 1.0 / 255.0, "{a} vs {b}");
        }
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let buf = ImageBuffer::new(1, 1, vec![-0.5, 1.5, 0.5]).unwrap();
        assert_eq!(buf.to_rgb8(), vec![0, 255, 128]);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(ImageBuffer::decode(b"not an image").is_err());
    }
}
