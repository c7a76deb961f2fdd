use crate::{
    cursor::Cursor,
    error::{ErrorKind, ParseError},
    value::Value,
};

/// One of the three bare-word literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Literal {
    Null,
    True,
    False,
}

impl Literal {
    /// Selects a literal from its lead byte (`n`, `t` or `f`).
    pub fn from_lead(byte: u8) -> Option<Self> {
        match byte {
            b'n' => Some(Self::Null),
            b't' => Some(Self::True),
            b'f' => Some(Self::False),
            _ => None,
        }
    }

    pub fn text(self) -> &'static [u8] {
        match self {
            Self::Null => b"null",
            Self::True => b"true",
            Self::False => b"false",
        }
    }

    pub fn value(self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::True => Value::Boolean(true),
            Self::False => Value::Boolean(false),
        }
    }
}

/// Matches the literal starting at the cursor and moves past it.
///
/// A lead byte that starts no literal, or a literal that is cut short or
/// misspelled, is an [`ErrorKind::UnexpectedToken`] at the lead byte.
pub(crate) fn decode(cursor: &mut Cursor<'_>) -> Result<Value, ParseError> {
    let start = cursor.pos();
    let literal = cursor
        .peek()
        .and_then(Literal::from_lead)
        .ok_or_else(|| cursor.error(ErrorKind::UnexpectedToken))?;
    if cursor.eat(literal.text()) {
        Ok(literal.value())
    } else {
        Err(cursor.error_at(ErrorKind::UnexpectedToken, start))
    }
}
