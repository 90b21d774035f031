//! Wire-level constants of the "read measured mass and number concentrations"
//! exchange.

/// Default 7-bit I2C address of the SEN5x.
pub const DEFAULT_ADDRESS: u8 = 0x69;

/// Bytes per transferred word: two data bytes followed by one CRC byte.
pub const WORD_LEN: usize = 3;

/// Number of words the sensor answers with for [`Command::ReadMassAndNumber`].
pub const RESPONSE_WORDS: usize = 15;

/// Full response length in bytes.
pub const RESPONSE_LEN: usize = RESPONSE_WORDS * WORD_LEN;

/// Time the sensor needs between receiving the command and having data ready.
pub const EXECUTION_TIME_MS: u32 = 20;

/// Sensor commands used by this driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Read measured mass and number concentrations. Not part of the public
    /// datasheet; layout taken from Sensirion's application note.
    ReadMassAndNumber = 0x0413,
}

impl Command {
    pub const fn opcode(self) -> u16 {
        self as u16
    }

    /// Opcode as sent on the wire, most significant byte first.
    pub const fn to_bytes(self) -> [u8; 2] {
        self.opcode().to_be_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_is_big_endian() {
        assert_eq!(Command::ReadMassAndNumber.opcode(), 0x0413);
        assert_eq!(Command::ReadMassAndNumber.to_bytes(), [0x04, 0x13]);
    }

    #[test]
    fn full_response_is_45_bytes() {
        assert_eq!(RESPONSE_LEN, 45);
    }
}
