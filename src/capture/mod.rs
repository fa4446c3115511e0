//! Screen capture and frame handling.
//!
//! This module requests frames from the device over the transport,
//! decodes the frame buffer header and normalizes pixels into a
//! canonical RGBA grid independent of the capture strategy.

mod config;
mod frame;
mod header;
mod screencap;

pub use config::{CaptureConfig, CaptureMethod};
pub use frame::Frame;
pub use header::{decode_frame_buffer, ChannelLayout, FrameBufferHeader, HEADER_LEN};
pub use screencap::{
    frame_from_framebuffer, frame_from_png, CaptureError, FrameCapture, FrameSource,
    FRAMEBUFFER_SERVICE, SCREENCAP_PNG_SERVICE,
};
