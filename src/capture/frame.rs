//! Frame type representing a captured screen with metadata.

use image::{GrayImage, RgbaImage};
use std::time::Instant;

/// A single captured screen from the device.
///
/// Pixels are always stored in canonical RGBA order regardless of the
/// capture path that produced them, so frames from the raw frame buffer
/// and from decoded PNG screenshots compare equal for the same screen.
#[derive(Clone)]
pub struct Frame {
    /// Canonical RGBA pixel grid.
    image: RgbaImage,
    /// Capture timestamp.
    timestamp: Instant,
    /// Monotonic sequence number.
    sequence: u64,
}

impl Frame {
    /// Creates a new frame from an RGBA image.
    pub fn new(image: RgbaImage, sequence: u64) -> Self {
        Self {
            image,
            timestamp: Instant::now(),
            sequence,
        }
    }

    /// Creates a frame from raw RGBA bytes.
    ///
    /// Returns `None` if the buffer does not hold exactly
    /// `width * height * 4` bytes.
    pub fn from_rgba(pixels: Vec<u8>, width: u32, height: u32, sequence: u64) -> Option<Self> {
        RgbaImage::from_raw(width, height, pixels).map(|image| Self::new(image, sequence))
    }

    /// Returns the RGBA image.
    #[inline]
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Returns the raw RGBA bytes.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Returns the frame width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Returns the frame height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Returns the capture timestamp.
    #[inline]
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    /// Returns the sequence number.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Converts the frame to single-channel intensity.
    pub fn to_luma(&self) -> GrayImage {
        image::imageops::grayscale(&self.image)
    }

    /// Returns true if both frames show exactly the same pixels.
    ///
    /// Timestamps and sequence numbers are ignored.
    pub fn same_pixels(&self, other: &Frame) -> bool {
        self.image.dimensions() == other.image.dimensions()
            && self.image.as_raw() == other.image.as_raw()
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("sequence", &self.sequence)
            .field("pixel_bytes", &self.pixels().len())
            .finish()
    }
}
