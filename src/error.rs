use embedded_hal::i2c::ErrorKind;
use thiserror::Error;

use crate::types::{Field, FieldSet};

/// Crate error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Bus(#[from] BusError),
    #[error(transparent)]
    Checksum(#[from] ChecksumError),
    #[error("frame too short: {needed} bytes needed, {actual} received")]
    ShortFrame { needed: usize, actual: usize },
    #[error("malformed frame of {len} bytes")]
    MalformedFrame { len: usize },
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

/// Which half of the command exchange failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusPhase {
    Write,
    Read,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusErrorKind {
    /// embedded-hal has no timeout kind; only custom transports report this.
    Timeout,
    Nack,
    ArbitrationLoss,
    Bus,
    Overrun,
    Other,
}

impl From<ErrorKind> for BusErrorKind {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::NoAcknowledge(_) => BusErrorKind::Nack,
            ErrorKind::ArbitrationLoss => BusErrorKind::ArbitrationLoss,
            ErrorKind::Bus => BusErrorKind::Bus,
            ErrorKind::Overrun => BusErrorKind::Overrun,
            _ => BusErrorKind::Other,
        }
    }
}

/// Transport-level failure of a single exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("i2c {phase:?} failed: {kind:?}")]
pub struct BusError {
    pub phase: BusPhase,
    pub kind: BusErrorKind,
}

impl BusError {
    pub fn new(phase: BusPhase, kind: impl Into<BusErrorKind>) -> Self {
        Self {
            phase,
            kind: kind.into(),
        }
    }
}

/// A word whose checksum byte does not match its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("crc mismatch in word {word}: expected {expected:#04x}, found {found:#04x}")]
pub struct ChecksumError {
    pub word: usize,
    pub expected: u8,
    pub found: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("no output fields configured")]
    NoFieldsConfigured,
    #[error("update interval must be non-zero")]
    ZeroUpdateInterval,
    #[error("{0:#04x} is not a 7-bit i2c address")]
    InvalidAddress(u8),
    #[error("slot {} is already bound", .0.name())]
    SlotAlreadyBound(Field),
    #[error("configured fields {configured:?} do not match bound slots {bound:?}")]
    FieldsMismatch {
        configured: FieldSet,
        bound: FieldSet,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::NoAcknowledgeSource;

    #[test]
    fn maps_hal_error_kinds() {
        assert_eq!(
            BusErrorKind::from(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)),
            BusErrorKind::Nack
        );
        assert_eq!(
            BusErrorKind::from(ErrorKind::ArbitrationLoss),
            BusErrorKind::ArbitrationLoss
        );
        assert_eq!(BusErrorKind::from(ErrorKind::Other), BusErrorKind::Other);
    }

    #[test]
    fn hal_kinds_never_map_to_timeout() {
        let kinds = [
            ErrorKind::Bus,
            ErrorKind::ArbitrationLoss,
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown),
            ErrorKind::Overrun,
            ErrorKind::Other,
        ];
        for kind in kinds {
            assert_ne!(BusErrorKind::from(kind), BusErrorKind::Timeout);
        }
    }

    #[test]
    fn wraps_into_crate_error() {
        let err: Error = ChecksumError {
            word: 4,
            expected: 0x12,
            found: 0x34,
        }
        .into();
        assert!(matches!(err, Error::Checksum(ChecksumError { word: 4, .. })));
    }
}
