//! Frame buffer header decoding.
//!
//! The `framebuffer:` service answers with a fixed header of fourteen
//! little-endian `u32` fields followed by `width * height * 4` bytes of
//! pixel data in the device's channel order.

use crate::transport::ProtocolError;

/// Number of `u32` fields in the header.
pub const HEADER_FIELDS: usize = 14;
/// Size of the header in bytes.
pub const HEADER_LEN: usize = HEADER_FIELDS * 4;
/// Bytes per pixel for the only supported format.
pub const BYTES_PER_PIXEL: usize = 4;

/// Bit position and width of one color channel within a 32-bit pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelLayout {
    /// Bit offset of the channel.
    pub offset: u32,
    /// Bit width of the channel; zero if absent.
    pub length: u32,
}

impl ChannelLayout {
    /// Byte index of this channel within a pixel, if byte-aligned.
    fn byte_index(&self) -> Option<usize> {
        (self.length == 8 && self.offset % 8 == 0 && self.offset < 32)
            .then(|| (self.offset / 8) as usize)
    }
}

/// Decoded frame buffer header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBufferHeader {
    /// Header format version.
    pub version: u32,
    /// Bits per pixel; only 32 is supported.
    pub bits_per_pixel: u32,
    /// Device colorspace identifier.
    pub colorspace: u32,
    /// Payload size reported by the device.
    pub size: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Red channel layout.
    pub red: ChannelLayout,
    /// Blue channel layout.
    pub blue: ChannelLayout,
    /// Green channel layout.
    pub green: ChannelLayout,
    /// Alpha channel layout.
    pub alpha: ChannelLayout,
}

impl FrameBufferHeader {
    /// Parses the header from the start of a frame buffer response.
    pub fn parse(buffer: &[u8]) -> Result<Self, ProtocolError> {
        if buffer.len() < HEADER_LEN {
            return Err(ProtocolError::TruncatedHeader(buffer.len()));
        }

        let mut fields = [0u32; HEADER_FIELDS];
        for (field, chunk) in fields.iter_mut().zip(buffer[..HEADER_LEN].chunks_exact(4)) {
            *field = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }

        let [
            version,
            bits_per_pixel,
            colorspace,
            size,
            width,
            height,
            red_offset,
            red_length,
            blue_offset,
            blue_length,
            green_offset,
            green_length,
            alpha_offset,
            alpha_length,
        ] = fields;

        Ok(Self {
            version,
            bits_per_pixel,
            colorspace,
            size,
            width,
            height,
            red: ChannelLayout {
                offset: red_offset,
                length: red_length,
            },
            blue: ChannelLayout {
                offset: blue_offset,
                length: blue_length,
            },
            green: ChannelLayout {
                offset: green_offset,
                length: green_length,
            },
            alpha: ChannelLayout {
                offset: alpha_offset,
                length: alpha_length,
            },
        })
    }

    /// Serializes the header back into its wire form.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let fields = [
            self.version,
            self.bits_per_pixel,
            self.colorspace,
            self.size,
            self.width,
            self.height,
            self.red.offset,
            self.red.length,
            self.blue.offset,
            self.blue.length,
            self.green.offset,
            self.green.length,
            self.alpha.offset,
            self.alpha.length,
        ];
        let mut out = [0u8; HEADER_LEN];
        for (chunk, field) in out.chunks_exact_mut(4).zip(fields) {
            chunk.copy_from_slice(&field.to_le_bytes());
        }
        out
    }

    /// Header describing an RGBA8888 frame of the given size.
    pub fn rgba8888(width: u32, height: u32) -> Self {
        Self {
            version: 2,
            bits_per_pixel: 32,
            colorspace: 0,
            size: width.saturating_mul(height).saturating_mul(4),
            width,
            height,
            red: ChannelLayout { offset: 0, length: 8 },
            blue: ChannelLayout { offset: 16, length: 8 },
            green: ChannelLayout { offset: 8, length: 8 },
            alpha: ChannelLayout { offset: 24, length: 8 },
        }
    }

    /// Number of pixel bytes the header dimensions imply.
    ///
    /// `None` if the dimensions overflow `usize`.
    pub fn payload_len(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(BYTES_PER_PIXEL)
    }

    /// Byte positions of R, G, B and A within a device pixel.
    ///
    /// A zero-length alpha channel means the device sends no alpha;
    /// `None` is returned in that slot and the pixel is treated as opaque.
    fn channel_order(&self) -> Result<([usize; 3], Option<usize>), ProtocolError> {
        if self.bits_per_pixel != 32 {
            return Err(ProtocolError::UnsupportedFormat(format!(
                "{} bits per pixel",
                self.bits_per_pixel
            )));
        }

        let color = [self.red, self.green, self.blue]
            .iter()
            .map(|c| c.byte_index())
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| {
                ProtocolError::UnsupportedFormat(format!(
                    "channel layout r={:?} g={:?} b={:?}",
                    self.red, self.green, self.blue
                ))
            })?;

        let alpha = match self.alpha.length {
            0 => None,
            _ => Some(self.alpha.byte_index().ok_or_else(|| {
                ProtocolError::UnsupportedFormat(format!("alpha layout {:?}", self.alpha))
            })?),
        };

        Ok(([color[0], color[1], color[2]], alpha))
    }
}

/// Decodes a complete `framebuffer:` response into canonical RGBA bytes.
///
/// Bytes beyond the declared dimensions are ignored.
pub fn decode_frame_buffer(buffer: &[u8]) -> Result<(FrameBufferHeader, Vec<u8>), ProtocolError> {
    let header = FrameBufferHeader::parse(buffer)?;
    let payload = &buffer[HEADER_LEN..];
    let expected = header.payload_len().ok_or_else(|| {
        ProtocolError::UnsupportedFormat(format!(
            "{}x{} frame exceeds addressable size",
            header.width, header.height
        ))
    })?;

    if payload.len() < expected {
        return Err(ProtocolError::TruncatedPayload {
            expected,
            actual: payload.len(),
        });
    }
    let payload = &payload[..expected];

    let pixels = match header.channel_order()? {
        ([0, 1, 2], Some(3)) => payload.to_vec(),
        ([r, g, b], alpha) => {
            let mut out = Vec::with_capacity(expected);
            for px in payload.chunks_exact(BYTES_PER_PIXEL) {
                out.extend_from_slice(&[px[r], px[g], px[b], alpha.map_or(u8::MAX, |a| px[a])]);
            }
            out
        }
    };

    Ok((header, pixels))
}
