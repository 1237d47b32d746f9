//! Persisted configuration image.
//!
//! Layout, all integers little-endian:
//!
//! ```text
//! magic u32 | version u32 | output_type u8 | count u8 | entries | crc8
//! entry = source u16 | kind u8 | target u16 | macro_id u8
//! ```
//!
//! The trailing CRC-8 covers every byte before it. Reading and writing the
//! storage medium is left to the caller.

use core::fmt;

use crate::mapping::{Config, Mapping, MappingAction, OutputType, MAX_MAPPINGS};
use input_proto::{calculate_crc8, Buttons};

pub const IMAGE_MAGIC: u32 = 0x4A43_5446;
pub const IMAGE_VERSION: u32 = 1;

const HEADER_LEN: usize = 10;
const ENTRY_LEN: usize = 6;

/// Largest possible image: a full mapping table.
pub const MAX_IMAGE_LEN: usize = HEADER_LEN + MAX_MAPPINGS * ENTRY_LEN + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ImageError {
    /// Fewer bytes than the header and entry count require.
    Truncated,
    BadMagic(u32),
    VersionMismatch(u32),
    Checksum { expected: u8, received: u8 },
    InvalidOutputType(u8),
    InvalidMappingKind(u8),
    TooManyMappings(u8),
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated => write!(f, "config image truncated"),
            Self::BadMagic(magic) => write!(f, "bad config magic {magic:#010x}"),
            Self::VersionMismatch(v) => write!(f, "unsupported config version {v}"),
            Self::Checksum { expected, received } => write!(
                f,
                "config checksum mismatch: expected {expected:#04x}, got {received:#04x}"
            ),
            Self::InvalidOutputType(t) => write!(f, "invalid output type {t}"),
            Self::InvalidMappingKind(k) => write!(f, "invalid mapping kind {k}"),
            Self::TooManyMappings(n) => write!(f, "{n} mappings exceed table capacity"),
        }
    }
}

/// Serialize `config` into `buf`, returning the number of bytes written.
pub fn encode(config: &Config, buf: &mut [u8; MAX_IMAGE_LEN]) -> usize {
    buf[0..4].copy_from_slice(&IMAGE_MAGIC.to_le_bytes());
    buf[4..8].copy_from_slice(&IMAGE_VERSION.to_le_bytes());
    buf[8] = config.output_type() as u8;

    let mut pos = HEADER_LEN;
    let mut count: u8 = 0;
    for mapping in config.mappings().iter() {
        let (kind, target, macro_id) = mapping.action.to_raw();
        let entry = &mut buf[pos..pos + ENTRY_LEN];
        entry[0..2].copy_from_slice(&mapping.source.raw().to_le_bytes());
        entry[2] = kind;
        entry[3..5].copy_from_slice(&target.to_le_bytes());
        entry[5] = macro_id;
        pos += ENTRY_LEN;
        count += 1;
    }
    buf[9] = count;

    buf[pos] = calculate_crc8(&buf[..pos]);
    pos + 1
}

/// Parse and validate an image. Trailing bytes after the checksum are
/// ignored, so a whole flash sector can be passed in.
pub fn decode(bytes: &[u8]) -> Result<Config, ImageError> {
    if bytes.len() < HEADER_LEN + 1 {
        return Err(ImageError::Truncated);
    }

    let magic = read_u32(&bytes[0..4]);
    if magic != IMAGE_MAGIC {
        return Err(ImageError::BadMagic(magic));
    }
    let version = read_u32(&bytes[4..8]);
    if version != IMAGE_VERSION {
        return Err(ImageError::VersionMismatch(version));
    }

    let count = bytes[9];
    if usize::from(count) > MAX_MAPPINGS {
        return Err(ImageError::TooManyMappings(count));
    }
    let body_len = HEADER_LEN + usize::from(count) * ENTRY_LEN;
    if bytes.len() < body_len + 1 {
        return Err(ImageError::Truncated);
    }

    let expected = calculate_crc8(&bytes[..body_len]);
    let received = bytes[body_len];
    if expected != received {
        return Err(ImageError::Checksum { expected, received });
    }

    let output_type = OutputType::from_u8(bytes[8]).ok_or(ImageError::InvalidOutputType(bytes[8]))?;
    let mut config = Config::new(output_type);

    for entry in bytes[HEADER_LEN..body_len].chunks_exact(ENTRY_LEN) {
        let source = Buttons(u16::from_le_bytes([entry[0], entry[1]]));
        let kind = entry[2];
        let target = u16::from_le_bytes([entry[3], entry[4]]);
        let action =
            MappingAction::from_raw(kind, target, entry[5]).ok_or(ImageError::InvalidMappingKind(kind))?;
        config
            .add_mapping(Mapping::new(source, action))
            .map_err(|_| ImageError::TooManyMappings(count))?;
    }

    Ok(config)
}

fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

impl Config {
    /// Decode a stored image, falling back to the default configuration
    /// (gamepad passthrough) when it is missing or invalid.
    ///
    /// The flag is `true` when the stored image was used. On `false` the
    /// caller should persist the returned defaults.
    #[must_use]
    pub fn load_or_default(bytes: &[u8]) -> (Self, bool) {
        match decode(bytes) {
            Ok(config) => {
                info!(
                    "Loaded configuration: output {:?}, {} mappings",
                    config.output_type(),
                    config.mappings().len()
                );
                (config, true)
            }
            Err(e) => {
                warn!("Stored configuration rejected ({:?}), using defaults", e);
                (Self::default(), false)
            }
        }
    }

    /// Serialize into `buf`. See [`encode`].
    pub fn encode_image(&self, buf: &mut [u8; MAX_IMAGE_LEN]) -> usize {
        encode(self, buf)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::vec::Vec;

    fn sample() -> Config {
        let mut config = Config::new(OutputType::Combo);
        config
            .add_mapping(Mapping::new(Buttons::A, MappingAction::Key(0x04)))
            .unwrap();
        config
            .add_mapping(Mapping::new(Buttons::LB, MappingAction::MouseButton(0x01)))
            .unwrap();
        config
            .add_mapping(Mapping::new(Buttons::Y, MappingAction::Macro(7)))
            .unwrap();
        config
            .add_mapping(Mapping::new(Buttons::X, MappingAction::Button(Buttons::B)))
            .unwrap();
        config
    }

    fn encoded(config: &Config) -> Vec<u8> {
        let mut buf = [0u8; MAX_IMAGE_LEN];
        let len = encode(config, &mut buf);
        buf[..len].to_vec()
    }

    #[test]
    fn test_layout() {
        let mut config = Config::new(OutputType::Keyboard);
        config
            .add_mapping(Mapping::new(Buttons(0x0001), MappingAction::Key(0x04)))
            .unwrap();
        let bytes = encoded(&config);

        assert_eq!(bytes.len(), HEADER_LEN + ENTRY_LEN + 1);
        assert_eq!(&bytes[0..4], &[0x46, 0x54, 0x43, 0x4A]);
        assert_eq!(&bytes[4..8], &[1, 0, 0, 0]);
        assert_eq!(bytes[8], 1);
        assert_eq!(bytes[9], 1);
        assert_eq!(&bytes[10..16], &[0x01, 0x00, MappingAction::KIND_KEY, 0x04, 0x00, 0x00]);
        assert_eq!(bytes[16], calculate_crc8(&bytes[..16]));
    }

    #[test]
    fn test_decode_restores_config() {
        let config = sample();
        assert_eq!(decode(&encoded(&config)), Ok(config));
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let config = sample();
        let mut bytes = encoded(&config);
        bytes.extend_from_slice(&[0xFF; 64]);
        assert_eq!(decode(&bytes), Ok(config));
    }

    #[test]
    fn test_erased_flash_rejected() {
        assert_eq!(decode(&[0xFF; 256]), Err(ImageError::BadMagic(0xFFFF_FFFF)));
        assert_eq!(decode(&[]), Err(ImageError::Truncated));
    }

    #[test]
    fn test_corruption_detected() {
        let mut bytes = encoded(&sample());
        bytes[12] ^= 0x01;
        assert!(matches!(decode(&bytes), Err(ImageError::Checksum { .. })));
    }

    #[test]
    fn test_truncated_entries() {
        let bytes = encoded(&sample());
        assert_eq!(decode(&bytes[..bytes.len() - 2]), Err(ImageError::Truncated));
    }

    #[test]
    fn test_version_mismatch() {
        let mut bytes = encoded(&sample());
        bytes[4] = 2;
        assert_eq!(decode(&bytes), Err(ImageError::VersionMismatch(2)));
    }

    #[test]
    fn test_invalid_fields_with_valid_checksum() {
        let mut bytes = encoded(&Config::new(OutputType::Gamepad));
        bytes[8] = 9;
        let crc_at = bytes.len() - 1;
        bytes[crc_at] = calculate_crc8(&bytes[..crc_at]);
        assert_eq!(decode(&bytes), Err(ImageError::InvalidOutputType(9)));

        let mut bytes = encoded(&sample());
        bytes[HEADER_LEN + 2] = 0x7F;
        let crc_at = bytes.len() - 1;
        bytes[crc_at] = calculate_crc8(&bytes[..crc_at]);
        assert_eq!(decode(&bytes), Err(ImageError::InvalidMappingKind(0x7F)));
    }

    #[test]
    fn test_count_over_capacity() {
        let mut bytes = encoded(&Config::new(OutputType::Gamepad));
        bytes[9] = 33;
        assert_eq!(decode(&bytes), Err(ImageError::TooManyMappings(33)));
    }

    #[test]
    fn test_full_table_fits() {
        let mut config = Config::new(OutputType::Keyboard);
        // 16 single-bit sources plus 16 two-bit chords
        for i in 0..16u8 {
            config
                .add_mapping(Mapping::new(Buttons::bit(i), MappingAction::Key(i)))
                .unwrap();
            config
                .add_mapping(Mapping::new(
                    Buttons::bit(i) | Buttons::bit((i + 1) % 16),
                    MappingAction::Key(i + 0x20),
                ))
                .unwrap();
        }
        assert_eq!(config.mappings().len(), MAX_MAPPINGS);
        let bytes = encoded(&config);
        assert_eq!(bytes.len(), MAX_IMAGE_LEN);
        assert_eq!(decode(&bytes), Ok(config));
    }

    #[test]
    fn test_load_or_default() {
        assert_eq!(Config::load_or_default(&[0u8; 16]), (Config::default(), false));
        let config = sample();
        assert_eq!(Config::load_or_default(&encoded(&config)), (config, true));
    }
}
