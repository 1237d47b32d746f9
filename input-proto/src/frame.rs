//! UART framing for HID input reports.
//!
//! ```text
//! 0xA5 <len> <payload...> <crc8>
//! ```
//!
//! The checksum is CRC-8/SMBUS over the length byte and the payload. The
//! decoder consumes one byte at a time and resynchronises on the next header
//! byte after any error, so a corrupted frame costs at most that frame.

use crc::{Crc, CRC_8_SMBUS};

const CRC8: Crc<u8> = Crc::<u8>::new(&CRC_8_SMBUS);

/// Frame start marker.
pub const FRAME_HEADER: u8 = 0xA5;

/// Largest payload a frame may carry.
pub const MAX_PAYLOAD_LEN: usize = 32;

/// Largest encoded frame: header, length, payload, checksum.
pub const MAX_FRAME_SIZE: usize = MAX_PAYLOAD_LEN + 3;

/// Error type for frame encoding and decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Length byte outside 1..=[`MAX_PAYLOAD_LEN`].
    BadLength(u8),
    /// Checksum mismatch.
    Checksum { expected: u8, received: u8 },
    /// Output buffer cannot hold the encoded frame.
    BufferTooSmall,
    /// Writer I/O error.
    Io,
}

impl core::fmt::Display for FrameError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::BadLength(len) => write!(f, "invalid frame length {len}"),
            Self::Checksum { expected, received } => write!(
                f,
                "frame checksum mismatch: expected {expected:#04x}, received {received:#04x}"
            ),
            Self::BufferTooSmall => f.write_str("buffer too small for frame"),
            Self::Io => f.write_str("frame write failed"),
        }
    }
}

/// CRC-8/SMBUS of `data`. Also covers persisted configuration images.
#[inline]
#[must_use]
pub fn calculate_crc8(data: &[u8]) -> u8 {
    CRC8.checksum(data)
}

/// Frame checksum: the length byte followed by the payload.
fn frame_crc(len: u8, payload: &[u8]) -> u8 {
    let mut digest = CRC8.digest();
    digest.update(&[len]);
    digest.update(payload);
    digest.finalize()
}

/// A decoded frame payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    buf: [u8; MAX_PAYLOAD_LEN],
    len: u8,
}

impl Frame {
    #[inline]
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.buf[..usize::from(self.len)]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DecodeState {
    Header,
    Length,
    Payload { len: u8, filled: u8 },
    Checksum { len: u8 },
}

/// Byte-at-a-time frame decoder.
#[derive(Clone, Debug)]
pub struct FrameDecoder {
    state: DecodeState,
    buf: [u8; MAX_PAYLOAD_LEN],
}

impl FrameDecoder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: DecodeState::Header,
            buf: [0; MAX_PAYLOAD_LEN],
        }
    }

    /// Discard any partially received frame.
    pub fn reset(&mut self) {
        self.state = DecodeState::Header;
    }

    /// Feed one received byte.
    ///
    /// Returns `Some` when a frame ends, either successfully or with an
    /// error, and `None` while a frame is still in progress. Bytes outside a
    /// frame are skipped until the next [`FRAME_HEADER`].
    pub fn push(&mut self, byte: u8) -> Option<Result<Frame, FrameError>> {
        match self.state {
            DecodeState::Header => {
                if byte == FRAME_HEADER {
                    self.state = DecodeState::Length;
                }
                None
            }
            DecodeState::Length => {
                if byte == 0 || usize::from(byte) > MAX_PAYLOAD_LEN {
                    self.state = DecodeState::Header;
                    return Some(Err(FrameError::BadLength(byte)));
                }
                self.state = DecodeState::Payload {
                    len: byte,
                    filled: 0,
                };
                None
            }
            DecodeState::Payload { len, filled } => {
                self.buf[usize::from(filled)] = byte;
                let filled = filled + 1;
                self.state = if filled == len {
                    DecodeState::Checksum { len }
                } else {
                    DecodeState::Payload { len, filled }
                };
                None
            }
            DecodeState::Checksum { len } => {
                self.state = DecodeState::Header;

                let expected = frame_crc(len, &self.buf[..usize::from(len)]);

                if expected != byte {
                    return Some(Err(FrameError::Checksum {
                        expected,
                        received: byte,
                    }));
                }

                Some(Ok(Frame { buf: self.buf, len }))
            }
        }
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode `payload` as a frame into `buf`.
///
/// Returns the number of bytes written.
///
/// # Errors
///
/// - [`FrameError::BadLength`] if the payload is empty or longer than
///   [`MAX_PAYLOAD_LEN`].
/// - [`FrameError::BufferTooSmall`] if `buf` cannot hold the frame.
pub fn encode_frame(payload: &[u8], buf: &mut [u8]) -> Result<usize, FrameError> {
    let len = match u8::try_from(payload.len()) {
        Ok(len) if len != 0 && payload.len() <= MAX_PAYLOAD_LEN => len,
        _ => return Err(FrameError::BadLength(payload.len().min(255) as u8)),
    };
    let total = payload.len() + 3;
    if buf.len() < total {
        return Err(FrameError::BufferTooSmall);
    }

    buf[0] = FRAME_HEADER;
    buf[1] = len;
    buf[2..2 + payload.len()].copy_from_slice(payload);
    buf[total - 1] = frame_crc(len, payload);

    Ok(total)
}

/// Encode `payload` as a frame into a `heapless::Vec`.
#[cfg(feature = "heapless")]
pub fn encode_frame_to_vec<const N: usize>(
    payload: &[u8],
) -> Result<heapless::Vec<u8, N>, FrameError> {
    let mut buf = [0u8; MAX_FRAME_SIZE];
    let len = encode_frame(payload, &mut buf)?;
    heapless::Vec::from_slice(&buf[..len]).map_err(|_| FrameError::BufferTooSmall)
}

/// Encode `payload` as a frame and write it to an `embedded_io::Write`.
#[cfg(feature = "embedded-io")]
pub fn write_frame_io<W: embedded_io::Write>(
    payload: &[u8],
    writer: &mut W,
) -> Result<(), FrameError> {
    let mut buf = [0u8; MAX_FRAME_SIZE];
    let len = encode_frame(payload, &mut buf)?;
    writer.write_all(&buf[..len]).map_err(|_| FrameError::Io)
}
