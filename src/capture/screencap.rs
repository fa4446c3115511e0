//! Screen capture over the ADB transport.
//!
//! Two strategies produce identical canonical RGBA frames: the raw
//! `framebuffer:` service (fast, no encoding) and `exec:screencap -p`
//! (slower, PNG encoded on the device).

use super::header::decode_frame_buffer;
use super::{CaptureConfig, CaptureMethod, Frame};
use crate::transport::{ProtocolError, TransportChannel};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use thiserror::Error;

/// Service command for the raw frame buffer.
pub const FRAMEBUFFER_SERVICE: &str = "framebuffer:";
/// Service command for a PNG screenshot.
pub const SCREENCAP_PNG_SERVICE: &str = "exec:screencap -p";

/// Errors that can occur during screen capture.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("decoded pixels do not fill a {width}x{height} frame")]
    Dimensions { width: u32, height: u32 },
}

/// Source of screen frames.
///
/// Abstracts the capture transport so cycles can be driven by synthetic
/// frames in tests.
pub trait FrameSource: Send + Sync {
    /// Captures the current screen.
    fn capture(&self) -> Result<Frame, CaptureError>;
}

/// Captures frames from one device.
pub struct FrameCapture {
    channel: TransportChannel,
    method: CaptureMethod,
    sequence: AtomicU64,
}

impl FrameCapture {
    /// Creates a capture source using the given channel and configuration.
    pub fn new(channel: TransportChannel, config: &CaptureConfig) -> Self {
        Self {
            channel,
            method: config.method,
            sequence: AtomicU64::new(0),
        }
    }

    /// Returns the configured capture strategy.
    pub fn method(&self) -> CaptureMethod {
        self.method
    }
}

impl FrameSource for FrameCapture {
    fn capture(&self) -> Result<Frame, CaptureError> {
        let start = Instant::now();
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;

        let frame = match self.method {
            CaptureMethod::Framebuffer => {
                let buffer = self.channel.request(FRAMEBUFFER_SERVICE)?;
                frame_from_framebuffer(&buffer, sequence)?
            }
            CaptureMethod::Png => {
                let buffer = self.channel.request(SCREENCAP_PNG_SERVICE)?;
                frame_from_png(&buffer, sequence)?
            }
        };

        tracing::debug!(
            method = ?self.method,
            sequence,
            width = frame.width(),
            height = frame.height(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Captured frame"
        );

        Ok(frame)
    }
}

/// Builds a frame from a raw `framebuffer:` response.
pub fn frame_from_framebuffer(buffer: &[u8], sequence: u64) -> Result<Frame, CaptureError> {
    let (header, pixels) = decode_frame_buffer(buffer)?;
    Frame::from_rgba(pixels, header.width, header.height, sequence).ok_or(
        CaptureError::Dimensions {
            width: header.width,
            height: header.height,
        },
    )
}

/// Builds a frame from a PNG screenshot.
pub fn frame_from_png(buffer: &[u8], sequence: u64) -> Result<Frame, CaptureError> {
    let image = image::load_from_memory_with_format(buffer, image::ImageFormat::Png)
        .map_err(|e| ProtocolError::InvalidPng(e.to_string()))?;
    Ok(Frame::new(image.to_rgba8(), sequence))
}
