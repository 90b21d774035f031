//! Validation and decoding of the 0x0413 response.

use crate::{
    command::{RESPONSE_LEN, RESPONSE_WORDS, WORD_LEN},
    crc::{crc, word_crc},
    error::{ChecksumError, Error},
    types::{ConcentrationReading, FieldSet},
};

/// Bytes read back from the sensor: big-endian words, each followed by its CRC.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RawFrame {
    buf: [u8; RESPONSE_LEN],
    len: usize,
}

impl RawFrame {
    /// Wraps a received buffer. The length has to be a whole number of words
    /// and at most a full response.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() % WORD_LEN != 0 || bytes.len() > RESPONSE_LEN {
            return Err(Error::MalformedFrame { len: bytes.len() });
        }
        let mut buf = [0u8; RESPONSE_LEN];
        buf[..bytes.len()].copy_from_slice(bytes);
        Ok(Self {
            buf,
            len: bytes.len(),
        })
    }

    /// Builds the frame the sensor would send for `words`, checksums included.
    pub fn from_words(words: &[u16]) -> Result<Self, Error> {
        if words.len() > RESPONSE_WORDS {
            return Err(Error::MalformedFrame {
                len: words.len() * WORD_LEN,
            });
        }
        let mut buf = [0u8; RESPONSE_LEN];
        for (chunk, word) in buf.chunks_exact_mut(WORD_LEN).zip(words) {
            chunk[..2].copy_from_slice(&word.to_be_bytes());
            chunk[2] = word_crc(*word);
        }
        Ok(Self {
            buf,
            len: words.len() * WORD_LEN,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn word_count(&self) -> usize {
        self.len / WORD_LEN
    }

    /// Data of word `index`, without checking its CRC.
    pub fn word(&self, index: usize) -> Option<u16> {
        self.as_bytes()
            .chunks_exact(WORD_LEN)
            .nth(index)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
    }

    /// Checks every word of the frame. Returns the first mismatch.
    pub fn validate(&self) -> Result<(), ChecksumError> {
        for (word, chunk) in self.as_bytes().chunks_exact(WORD_LEN).enumerate() {
            let expected = crc(&chunk[..2]);
            if chunk[2] != expected {
                return Err(ChecksumError {
                    word,
                    expected,
                    found: chunk[2],
                });
            }
        }
        Ok(())
    }
}

impl core::fmt::Debug for RawFrame {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("RawFrame").field(&self.as_bytes()).finish()
    }
}

/// Decodes the requested fields of `frame`.
///
/// The whole frame is rejected if any word fails its checksum, so nothing
/// from a corrupted transfer is ever returned.
pub fn decode(frame: &RawFrame, fields: FieldSet) -> Result<ConcentrationReading, Error> {
    let needed = fields.frame_len();
    if frame.len() < needed {
        return Err(Error::ShortFrame {
            needed,
            actual: frame.len(),
        });
    }
    frame.validate()?;

    let mut reading = ConcentrationReading::default();
    for field in fields.iter() {
        let raw = frame.word(field.word_index()).ok_or(Error::ShortFrame {
            needed,
            actual: frame.len(),
        })?;
        reading.set(field, field.decode(raw));
    }
    Ok(reading)
}
