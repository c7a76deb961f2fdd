use alloc::collections::TryReserveError;

use bstr::{BStr, ByteSlice};
use thiserror::Error;

/// Number of input bytes [`ParseError::excerpt`] shows after the offset.
const EXCERPT_LEN: usize = 10;

/// Failure to grow a container or decoder buffer.
///
/// Every operation that may allocate on the parse path returns this instead
/// of aborting, and leaves its receiver in the state it had before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocError {
    /// The allocator refused the request, or the requested size overflowed.
    #[error("memory allocation failed: {0}")]
    Reserve(#[from] TryReserveError),
    /// A hash table would have to grow far past its entry count to place a
    /// key, which only happens with colliding hashes.
    #[error("hash table capacity limit reached")]
    CapacityLimit,
}

/// The kind of failure reported by the parser.
///
/// A successful parse has no kind at all: it is the `Ok` side of
/// [`Parser::parse`](crate::Parser::parse).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A comment appeared while [`ParserOptions::allow_comments`] was off.
    ///
    /// [`ParserOptions::allow_comments`]: crate::ParserOptions::allow_comments
    #[error("comments are not enabled")]
    CommentsDisabled,
    /// An allocation failed while building the value tree.
    #[error("out of memory")]
    OutOfMemory,
    /// A byte that the grammar does not allow at this point.
    #[error("unexpected token")]
    UnexpectedToken,
    /// A raw control character inside a string literal.
    #[error("unescaped control character in string")]
    UnescapedControlCharacter,
    /// A number with a leading zero, such as `01`.
    #[error("leading zero in number")]
    LeadingZero,
    /// An unknown escape character, or a `\u` escape naming a lone surrogate.
    #[error("invalid escape sequence")]
    InvalidEscapeSequence,
    /// A non-hexadecimal digit in a `\u` escape.
    #[error("invalid hex digit in unicode escape")]
    InvalidHexDigit,
    /// A number without digits, or one too large for a double.
    #[error("invalid number")]
    InvalidNumber,
    /// An object key that never received its value.
    #[error("expected a value")]
    ExpectedValue,
    /// An embedded NUL byte.
    #[error("unexpected NUL byte")]
    NulByte,
    /// Unbalanced nesting, an empty document, or content after the root value.
    #[error("malformed document structure")]
    Structure,
}

impl ErrorKind {
    /// Stable numeric code for this kind. Code `0` is reserved for "no error".
    pub fn code(self) -> u8 {
        match self {
            Self::CommentsDisabled => 1,
            Self::OutOfMemory => 2,
            Self::UnexpectedToken => 3,
            Self::UnescapedControlCharacter => 4,
            Self::LeadingZero => 5,
            Self::InvalidEscapeSequence => 6,
            Self::InvalidHexDigit => 7,
            Self::InvalidNumber => 8,
            Self::ExpectedValue => 9,
            Self::NulByte => 10,
            Self::Structure => 11,
        }
    }
}

impl From<AllocError> for ErrorKind {
    fn from(_: AllocError) -> Self {
        Self::OutOfMemory
    }
}

/// A failed parse: what went wrong and the byte offset where it was detected.
///
/// # Examples
///
/// ```
/// use jsonpress::{ErrorKind, parse};
///
/// let input = r#"{"a": }"#;
/// let err = parse(input).unwrap_err();
/// assert_eq!(err.kind(), ErrorKind::UnexpectedToken);
/// assert_eq!(err.offset(), 6);
/// assert_eq!(err.excerpt(input), "}");
/// ```
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[error("{kind} at byte {offset}")]
pub struct ParseError {
    kind: ErrorKind,
    offset: usize,
}

impl ParseError {
    pub(crate) fn new(kind: ErrorKind, offset: usize) -> Self {
        Self { kind, offset }
    }

    /// The kind of failure.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Byte offset from the start of the input. A skipped byte-order mark
    /// still counts.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Up to ten bytes of `input` starting at the error offset.
    ///
    /// `input` must be the document that produced this error; an offset past
    /// its end yields an empty excerpt.
    pub fn excerpt<'a>(&self, input: &'a (impl AsRef<[u8]> + ?Sized)) -> &'a BStr {
        let bytes = input.as_ref();
        let start = self.offset.min(bytes.len());
        let end = start.saturating_add(EXCERPT_LEN).min(bytes.len());
        bytes[start..end].as_bstr()
    }

    /// 1-based line and column of the error offset within `input`.
    ///
    /// Columns count bytes, and only `\n` starts a new line.
    pub fn line_column(&self, input: &(impl AsRef<[u8]> + ?Sized)) -> (usize, usize) {
        let bytes = input.as_ref();
        let before = &bytes[..self.offset.min(bytes.len())];
        let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
        let column = match before.rfind_byte(b'\n') {
            Some(newline) => before.len() - newline,
            None => before.len() + 1,
        };
        (line, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct_and_nonzero() {
        let kinds = [
            ErrorKind::CommentsDisabled,
            ErrorKind::OutOfMemory,
            ErrorKind::UnexpectedToken,
            ErrorKind::UnescapedControlCharacter,
            ErrorKind::LeadingZero,
            ErrorKind::InvalidEscapeSequence,
            ErrorKind::InvalidHexDigit,
            ErrorKind::InvalidNumber,
            ErrorKind::ExpectedValue,
            ErrorKind::NulByte,
            ErrorKind::Structure,
        ];
        for (i, kind) in kinds.iter().enumerate() {
            assert_eq!(usize::from(kind.code()), i + 1, "{kind:?}");
        }
    }

    #[test]
    fn display_includes_offset() {
        let err = ParseError::new(ErrorKind::LeadingZero, 4);
        assert_eq!(alloc::format!("{err}"), "leading zero in number at byte 4");
    }

    #[test]
    fn excerpt_is_clamped() {
        let input = "0123456789abcdef";
        assert_eq!(ParseError::new(ErrorKind::Structure, 2).excerpt(input), "23456789ab");
        assert_eq!(ParseError::new(ErrorKind::Structure, 14).excerpt(input), "ef");
        assert_eq!(ParseError::new(ErrorKind::Structure, 99).excerpt(input), "");
    }

    #[test]
    fn line_column_counts_newlines() {
        let input = "{\n  \"a\": x\n}";
        let err = ParseError::new(ErrorKind::UnexpectedToken, 9);
        assert_eq!(err.line_column(input), (2, 8));
        assert_eq!(ParseError::new(ErrorKind::Structure, 0).line_column(input), (1, 1));
    }
}
