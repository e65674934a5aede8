use crate::sequence::bits_to_word;

/// The 3-bit acknowledge a target returns after a request header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AckCode {
    /// Request accepted.
    Ok,
    /// Target is busy, the request has to be repeated.
    Wait,
    /// Target has a sticky error flag set.
    Fault,
    /// The acknowledge did not match any valid pattern.
    ///
    /// The raw 3-bit value is kept. `0b111` usually means no target drove the line.
    Invalid(u8),
}

impl AckCode {
    const OK: u8 = 0b001;
    const WAIT: u8 = 0b010;
    const FAULT: u8 = 0b100;

    /// Decode the acknowledge from the bits in the order they were sampled.
    ///
    /// The first sampled bit is the least significant bit of the code. Only the first
    /// three bits are used.
    pub fn from_bits(bits: impl IntoIterator<Item = bool>) -> Self {
        Self::from_raw(bits_to_word(bits.into_iter().take(3)) as u8)
    }

    /// Decode an already assembled 3-bit acknowledge value.
    pub fn from_raw(code: u8) -> Self {
        match code & 0b111 {
            Self::OK => AckCode::Ok,
            Self::WAIT => AckCode::Wait,
            Self::FAULT => AckCode::Fault,
            other => AckCode::Invalid(other),
        }
    }

    /// The 3-bit wire value of this acknowledge.
    pub fn raw(self) -> u8 {
        match self {
            AckCode::Ok => Self::OK,
            AckCode::Wait => Self::WAIT,
            AckCode::Fault => Self::FAULT,
            AckCode::Invalid(code) => code,
        }
    }

    pub fn is_ok(self) -> bool {
        self == AckCode::Ok
    }
}

impl std::fmt::Display for AckCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AckCode::Ok => write!(f, "OK"),
            AckCode::Wait => write!(f, "WAIT"),
            AckCode::Fault => write!(f, "FAULT"),
            AckCode::Invalid(code) => write!(f, "invalid acknowledge {code:#05b}"),
        }
    }
}
