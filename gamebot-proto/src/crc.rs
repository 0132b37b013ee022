//! Frame checksum.
//!
//! The wire checksum is the low byte of a CRC-32 (zlib / ISO-HDLC
//! parameters) computed over the payload bytes only.

use crc::{Crc, CRC_32_ISO_HDLC};

/// CRC-32/ISO-HDLC calculator with lookup table.
const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Full CRC-32 of a byte slice.
#[inline]
#[must_use]
pub fn crc32(data: &[u8]) -> u32 {
    CRC32.checksum(data)
}

/// One-byte frame checksum of a payload.
#[inline]
#[must_use]
pub fn frame_checksum(payload: &[u8]) -> u8 {
    (crc32(payload) & 0xFF) as u8
}

/// CRC-32 digest for incremental calculation.
///
/// Used when the payload is not contiguous in memory, e.g. when it is
/// still sitting in a ring buffer and may wrap around.
pub struct Crc32Digest {
    digest: crc::Digest<'static, u32>,
}

impl Crc32Digest {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            digest: CRC32.digest(),
        }
    }

    #[inline]
    pub fn update(&mut self, byte: u8) {
        self.digest.update(&[byte]);
    }

    #[inline]
    pub fn update_slice(&mut self, data: &[u8]) {
        self.digest.update(data);
    }

    /// Finalize and return the one-byte frame checksum.
    #[inline]
    #[must_use]
    pub fn finalize_byte(self) -> u8 {
        (self.digest.finalize() & 0xFF) as u8
    }
}

impl Default for Crc32Digest {
    fn default() -> Self {
        Self::new()
    }
}
