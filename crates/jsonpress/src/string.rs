//! String literal decoding.

use alloc::vec::Vec;

use bstr::BString;

use crate::{
    cursor::Cursor,
    error::{AllocError, ErrorKind, ParseError},
    escape_buffer::{CodeUnit, NotHexDigit, UnicodeEscapeBuffer, combine_surrogates},
};

/// Capacity of the first allocation of the output buffer.
const INITIAL_CAPACITY: usize = 8;

/// Free bytes kept past the written content: one decoded escape expands to
/// at most four UTF-8 bytes.
const ESCAPE_HEADROOM: usize = 4;

/// Decoded output with geometric growth and a fixed amount of headroom.
#[derive(Debug, Default)]
struct Output {
    bytes: Vec<u8>,
}

impl Output {
    fn reserve(&mut self, additional: usize) -> Result<(), AllocError> {
        let needed = self
            .bytes
            .len()
            .saturating_add(additional)
            .saturating_add(ESCAPE_HEADROOM);
        let capacity = self.bytes.capacity();
        if needed <= capacity {
            return Ok(());
        }
        let mut target = capacity.max(INITIAL_CAPACITY);
        while target < needed {
            target = target.saturating_mul(2);
        }
        self.bytes.try_reserve_exact(target - self.bytes.len())?;
        Ok(())
    }

    fn extend(&mut self, bytes: &[u8]) -> Result<(), AllocError> {
        if !bytes.is_empty() {
            self.reserve(bytes.len())?;
            self.bytes.extend_from_slice(bytes);
        }
        Ok(())
    }

    fn push_char(&mut self, c: char) -> Result<(), AllocError> {
        let mut utf8 = [0; 4];
        self.extend(c.encode_utf8(&mut utf8).as_bytes())
    }
}

/// Decodes the string literal whose opening quote is under the cursor, and
/// leaves the cursor just past the closing quote.
///
/// Escapes are decoded to UTF-8; everything else is copied byte for byte
/// without UTF-8 validation.
pub(crate) fn decode(cursor: &mut Cursor<'_>) -> Result<BString, ParseError> {
    debug_assert_eq!(cursor.peek(), Some(b'"'));
    cursor.advance(1);
    let mut out = Output::default();
    loop {
        let run = cursor.take_while(|b| b != b'"' && b != b'\\' && b >= 0x20);
        out.extend(run)
            .map_err(|_| cursor.error(ErrorKind::OutOfMemory))?;
        match cursor.peek() {
            Some(b'"') => {
                cursor.advance(1);
                return Ok(BString::from(out.bytes));
            }
            Some(b'\\') => decode_escape(cursor, &mut out)?,
            Some(0) => return Err(cursor.error(ErrorKind::NulByte)),
            Some(_) => return Err(cursor.error(ErrorKind::UnescapedControlCharacter)),
            None => return Err(cursor.error(ErrorKind::UnexpectedToken)),
        }
    }
}

fn decode_escape(cursor: &mut Cursor<'_>, out: &mut Output) -> Result<(), ParseError> {
    let start = cursor.pos();
    cursor.advance(1);
    let Some(byte) = cursor.next_byte() else {
        return Err(cursor.error(ErrorKind::UnexpectedToken));
    };
    let decoded = match byte {
        b'"' => '"',
        b'\\' => '\\',
        b'/' => '/',
        b'b' => '\u{8}',
        b'f' => '\u{C}',
        b'n' => '\n',
        b'r' => '\r',
        b't' => '\t',
        b'u' => decode_unicode(cursor, start)?,
        _ => return Err(cursor.error_at(ErrorKind::InvalidEscapeSequence, start)),
    };
    out.push_char(decoded)
        .map_err(|_| cursor.error(ErrorKind::OutOfMemory))
}

/// Decodes the digits of a `\u` escape that started at `start`, pulling in
/// the second half of a surrogate pair when needed.
fn decode_unicode(cursor: &mut Cursor<'_>, start: usize) -> Result<char, ParseError> {
    let lone_surrogate = |cursor: &Cursor<'_>| cursor.error_at(ErrorKind::InvalidEscapeSequence, start);
    match read_code_unit(cursor)? {
        CodeUnit::Scalar(c) => Ok(c),
        CodeUnit::HighSurrogate(high) => {
            if !cursor.eat(b"\\u") {
                return Err(lone_surrogate(cursor));
            }
            match read_code_unit(cursor)? {
                CodeUnit::LowSurrogate(low) => {
                    combine_surrogates(high, low).ok_or_else(|| lone_surrogate(cursor))
                }
                _ => Err(lone_surrogate(cursor)),
            }
        }
        CodeUnit::LowSurrogate(_) => Err(lone_surrogate(cursor)),
    }
}

fn read_code_unit(cursor: &mut Cursor<'_>) -> Result<CodeUnit, ParseError> {
    let mut buffer = UnicodeEscapeBuffer::new();
    loop {
        let Some(byte) = cursor.peek() else {
            return Err(cursor.error(ErrorKind::UnexpectedToken));
        };
        let unit = buffer
            .feed(byte)
            .map_err(|NotHexDigit| cursor.error(ErrorKind::InvalidHexDigit))?;
        cursor.advance(1);
        if let Some(unit) = unit {
            return Ok(unit);
        }
    }
}
