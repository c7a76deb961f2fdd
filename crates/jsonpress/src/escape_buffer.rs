//! Decoding of four-digit `\uXXXX` escapes.
//!
//! [`UnicodeEscapeBuffer`] accumulates exactly four ASCII hexadecimal digits
//! (`0-9`, `A-F`, `a-f`) into one UTF-16 code unit. Code units in the
//! surrogate ranges are not characters by themselves: a high surrogate must be
//! followed by a second escape holding a low surrogate, and the pair combines
//! into one scalar value through [`combine_surrogates`].

/// Buffer for accumulating four hexadecimal digits into a UTF-16 code unit.
#[derive(Debug, Default)]
pub(crate) struct UnicodeEscapeBuffer {
    unit: u16,
    len: u8,
}

/// A byte fed to [`UnicodeEscapeBuffer`] that is not a hexadecimal digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NotHexDigit;

/// A decoded UTF-16 code unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CodeUnit {
    /// A unit outside the surrogate ranges.
    Scalar(char),
    /// `D800..=DBFF`: needs a low surrogate to follow.
    HighSurrogate(u16),
    /// `DC00..=DFFF`: only valid right after a high surrogate.
    LowSurrogate(u16),
}

impl UnicodeEscapeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one digit.
    ///
    /// Returns `Ok(None)` while fewer than four digits have been seen, and the
    /// decoded unit once the fourth arrives. The buffer then starts over.
    pub fn feed(&mut self, byte: u8) -> Result<Option<CodeUnit>, NotHexDigit> {
        let digit = hex_value(byte).ok_or(NotHexDigit)?;
        self.unit = (self.unit << 4) | u16::from(digit);
        self.len += 1;
        if self.len < 4 {
            return Ok(None);
        }
        let unit = self.unit;
        *self = Self::default();
        Ok(Some(classify(unit)))
    }
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

fn classify(unit: u16) -> CodeUnit {
    // Within the BMP only surrogates fail to convert.
    match char::from_u32(u32::from(unit)) {
        Some(c) => CodeUnit::Scalar(c),
        None if unit < 0xDC00 => CodeUnit::HighSurrogate(unit),
        None => CodeUnit::LowSurrogate(unit),
    }
}

/// Combines a surrogate pair into the supplementary-plane character it names.
pub(crate) fn combine_surrogates(high: u16, low: u16) -> Option<char> {
    if !(0xD800..=0xDBFF).contains(&high) || !(0xDC00..=0xDFFF).contains(&low) {
        return None;
    }
    let scalar = 0x1_0000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(low) - 0xDC00);
    char::from_u32(scalar)
}
