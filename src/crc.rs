const POLYNOMIAL: u8 = 0x31;
const INIT: u8 = 0xFF;

/// Sensirion CRC-8: polynomial 0x31, init 0xFF, no reflection, no final xor.
pub(crate) fn crc(data: &[u8]) -> u8 {
    data.iter().fold(INIT, |acc, &byte| {
        (0..8).fold(acc ^ byte, |acc, _| {
            let shifted = acc << 1;
            if acc & 0x80 != 0 {
                shifted ^ POLYNOMIAL
            } else {
                shifted
            }
        })
    })
}

/// Checksum of a single big-endian data word as it travels on the wire.
pub(crate) fn word_crc(word: u16) -> u8 {
    crc(&word.to_be_bytes())
}

#[cfg(test)]
mod tests {
    use super::{crc, word_crc};

    #[test]
    fn example() {
        assert_eq!(crc(&[0xbe, 0xef]), 0x92);
    }

    #[test]
    fn word_matches_byte_form() {
        assert_eq!(word_crc(0xbeef), 0x92);
        assert_eq!(word_crc(0x0064), crc(&[0x00, 0x64]));
    }

    #[test]
    fn zero_word() {
        assert_eq!(word_crc(0x0000), 0x81);
    }

    #[test]
    fn empty_input_is_init_value() {
        assert_eq!(crc(&[]), 0xFF);
    }
}
