//! The JSON parsing state machine.
//!
//! The parser walks the input once, left to right. At every point it knows
//! which tokens may come next as an [`Expect`] bitmask; a token outside that
//! set is an error at the token's offset. Open containers live on an explicit
//! working stack of frames, so nesting depth is bounded by memory rather than
//! by the call stack, and each finished value is folded into its parent as
//! soon as it completes.
//!
//! # Examples
//!
//! ```rust
//! use jsonpress::{ErrorKind, Parser, ParserOptions};
//!
//! let parser = Parser::new(ParserOptions::default());
//! let value = parser.parse(r#"{"key": [null, true, 3.25]}"#).unwrap();
//! assert_eq!(value["key"][2].as_f64(), Some(3.25));
//!
//! let err = parser.parse("[1, 2,]").unwrap_err();
//! assert_eq!((err.kind(), err.offset()), (ErrorKind::UnexpectedToken, 6));
//! ```

use core::{fmt, ops::BitOr};

use bstr::{BString, ByteSlice};

use crate::{
    cursor::Cursor,
    error::{ErrorKind, ParseError},
    literal, number,
    options::ParserOptions,
    sequence::Sequence,
    string,
    value::{Array, Object, Value},
};

const BYTE_ORDER_MARK: &[u8] = b"\xEF\xBB\xBF";

/// The set of tokens acceptable at the current position.
#[derive(Clone, Copy, PartialEq, Eq)]
struct Expect(u8);

impl Expect {
    const COMMA: Self = Self(0x01);
    const COLON: Self = Self(0x02);
    const OBJECT_CLOSE: Self = Self(0x04);
    const ARRAY_CLOSE: Self = Self(0x08);
    const KEY: Self = Self(0x10);
    const VALUE: Self = Self(0x20);

    /// After a complete value inside a container.
    const NEXT_ITEM: Self = Self::COMMA.union(Self::OBJECT_CLOSE).union(Self::ARRAY_CLOSE);
    /// After a string, which may have been a key or a value.
    const DELIMITER: Self = Self::NEXT_ITEM.union(Self::COLON);

    const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for Expect {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl fmt::Debug for Expect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(Expect, &str); 6] = [
            (Expect::COMMA, "COMMA"),
            (Expect::COLON, "COLON"),
            (Expect::OBJECT_CLOSE, "OBJECT_CLOSE"),
            (Expect::ARRAY_CLOSE, "ARRAY_CLOSE"),
            (Expect::KEY, "KEY"),
            (Expect::VALUE, "VALUE"),
        ];
        let mut set = f.debug_set();
        for (bit, name) in NAMES {
            if self.contains(bit) {
                set.entry(&format_args!("{name}"));
            }
        }
        set.finish()
    }
}

/// An open container on the working stack.
#[derive(Debug)]
enum Frame {
    Array(Array),
    Object {
        members: Object,
        /// Key waiting for its value.
        pending_key: Option<BString>,
    },
}

/// A reusable, configured JSON parser.
///
/// A `Parser` holds nothing but its options; every call to
/// [`parse`](Self::parse) runs independently, so one parser can be shared
/// freely, including across threads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Parser {
    options: ParserOptions,
}

impl Parser {
    /// Creates a parser with the given options.
    #[must_use]
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    /// The options this parser was created with.
    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Parses one complete JSON document.
    ///
    /// The input is treated as bytes. It is not validated as UTF-8; string
    /// contents are copied through with only their escapes decoded.
    ///
    /// # Errors
    ///
    /// Returns the first grammar violation or allocation failure, with the
    /// byte offset where it was detected. Nothing built before the failure
    /// survives it.
    pub fn parse(&self, input: impl AsRef<[u8]>) -> Result<Value, ParseError> {
        Machine::new(input.as_ref(), self.options).run()
    }
}

/// State of one parse call.
struct Machine<'a> {
    cursor: Cursor<'a>,
    options: ParserOptions,
    expect: Expect,
    stack: Sequence<Frame>,
    root: Option<Value>,
}

impl<'a> Machine<'a> {
    fn new(input: &'a [u8], options: ParserOptions) -> Self {
        Self {
            cursor: Cursor::new(input),
            options,
            expect: Expect::VALUE,
            stack: Sequence::new(),
            root: None,
        }
    }

    fn run(mut self) -> Result<Value, ParseError> {
        let result = self.drive();
        result.map_err(|err| self.fail(err))
    }

    fn fail(&self, err: ParseError) -> ParseError {
        #[cfg(any(test, feature = "fuzzing"))]
        assert!(!self.options.panic_on_error, "{err}");
        err
    }

    fn drive(&mut self) -> Result<Value, ParseError> {
        if self.options.check_bom {
            self.cursor.eat(BYTE_ORDER_MARK);
        }

        while let Some(byte) = self.cursor.peek() {
            #[cfg(all(test, trace_parser))]
            std::eprintln!(
                "parse: {:?} at {}, expecting {:?}, depth {}",
                char::from(byte),
                self.cursor.pos(),
                self.expect,
                self.stack.len()
            );

            match byte {
                b' ' | b'\n' | b'\r' | b'\t' => {
                    self.cursor
                        .take_while(|b| matches!(b, b' ' | b'\n' | b'\r' | b'\t'));
                }
                b'/' => self.skip_comment()?,
                _ if self.root.is_some() => return Err(self.cursor.error(ErrorKind::Structure)),
                _ => self.step(byte)?,
            }
        }

        self.finish()
    }

    fn step(&mut self, byte: u8) -> Result<(), ParseError> {
        match byte {
            b'-' | b'0'..=b'9' => {
                self.require(Expect::VALUE)?;
                let number = number::decode(&mut self.cursor)?;
                self.complete(Value::Number(number))?;
                self.expect = Expect::NEXT_ITEM;
            }
            b'"' => {
                self.require(Expect::KEY | Expect::VALUE)?;
                let decoded = string::decode(&mut self.cursor)?;
                if self.expect.contains(Expect::KEY) {
                    self.stage_key(decoded)?;
                } else {
                    self.complete(Value::String(decoded))?;
                }
                self.expect = Expect::DELIMITER;
            }
            b'{' => {
                self.require(Expect::VALUE)?;
                self.open(Frame::Object {
                    members: Object::new(),
                    pending_key: None,
                })?;
                self.expect = Expect::KEY | Expect::OBJECT_CLOSE;
            }
            b'[' => {
                self.require(Expect::VALUE)?;
                self.open(Frame::Array(Array::new()))?;
                self.expect = Expect::VALUE | Expect::ARRAY_CLOSE;
            }
            b't' | b'f' | b'n' => {
                self.require(Expect::VALUE)?;
                let value = literal::decode(&mut self.cursor)?;
                self.complete(value)?;
                self.expect = Expect::NEXT_ITEM;
            }
            b',' => self.comma()?,
            b':' => self.colon()?,
            b'}' | b']' => self.close(byte)?,
            0 => return Err(self.cursor.error(ErrorKind::NulByte)),
            _ => return Err(self.cursor.error(ErrorKind::UnexpectedToken)),
        }
        Ok(())
    }

    fn require(&self, wanted: Expect) -> Result<(), ParseError> {
        if self.expect.intersects(wanted) {
            Ok(())
        } else {
            Err(self.cursor.error(ErrorKind::UnexpectedToken))
        }
    }

    fn open(&mut self, frame: Frame) -> Result<(), ParseError> {
        self.stack
            .push(frame)
            .map_err(|_| self.cursor.error(ErrorKind::OutOfMemory))?;
        self.cursor.advance(1);
        Ok(())
    }

    fn stage_key(&mut self, key: BString) -> Result<(), ParseError> {
        match self.stack.last_mut() {
            Some(Frame::Object { pending_key, .. }) => {
                *pending_key = Some(key);
                Ok(())
            }
            _ => Err(self.cursor.error(ErrorKind::Structure)),
        }
    }

    /// Attaches a finished value to the innermost open container, or makes it
    /// the root when nothing is open.
    fn complete(&mut self, value: Value) -> Result<(), ParseError> {
        match self.stack.last_mut() {
            None => {
                self.root = Some(value);
                Ok(())
            }
            Some(Frame::Array(items)) => items
                .push(value)
                .map_err(|_| self.cursor.error(ErrorKind::OutOfMemory)),
            Some(Frame::Object {
                members,
                pending_key,
            }) => {
                let Some(key) = pending_key.take() else {
                    return Err(self.cursor.error(ErrorKind::Structure));
                };
                // A repeated key replaces the earlier member.
                members
                    .set(key, value)
                    .map(|_replaced| ())
                    .map_err(|_| self.cursor.error(ErrorKind::OutOfMemory))
            }
        }
    }

    fn comma(&mut self) -> Result<(), ParseError> {
        self.require(Expect::COMMA)?;
        self.expect = match self.stack.last() {
            Some(Frame::Array(_)) => Expect::VALUE,
            Some(Frame::Object {
                pending_key: None, ..
            }) => Expect::KEY,
            Some(Frame::Object { .. }) => {
                return Err(self.cursor.error(ErrorKind::ExpectedValue));
            }
            None => return Err(self.cursor.error(ErrorKind::Structure)),
        };
        self.cursor.advance(1);
        Ok(())
    }

    fn colon(&mut self) -> Result<(), ParseError> {
        self.require(Expect::COLON)?;
        match self.stack.last() {
            Some(Frame::Object {
                pending_key: Some(_),
                ..
            }) => {
                self.expect = Expect::VALUE;
                self.cursor.advance(1);
                Ok(())
            }
            _ => Err(self.cursor.error(ErrorKind::UnexpectedToken)),
        }
    }

    fn close(&mut self, byte: u8) -> Result<(), ParseError> {
        let is_object = byte == b'}';
        self.require(if is_object {
            Expect::OBJECT_CLOSE
        } else {
            Expect::ARRAY_CLOSE
        })?;
        match (self.stack.last(), is_object) {
            (
                Some(Frame::Object {
                    pending_key: Some(_),
                    ..
                }),
                true,
            ) => return Err(self.cursor.error(ErrorKind::ExpectedValue)),
            (Some(Frame::Object { .. }), true) | (Some(Frame::Array(_)), false) => {}
            _ => return Err(self.cursor.error(ErrorKind::UnexpectedToken)),
        }
        let value = match self.stack.pop() {
            Some(Frame::Object { members, .. }) => Value::Object(members),
            Some(Frame::Array(items)) => Value::Array(items),
            None => return Err(self.cursor.error(ErrorKind::Structure)),
        };
        self.cursor.advance(1);
        self.complete(value)?;
        self.expect = Expect::NEXT_ITEM;
        Ok(())
    }

    /// Skips a `//` or `/* */` comment starting at the cursor.
    fn skip_comment(&mut self) -> Result<(), ParseError> {
        let start = self.cursor.pos();
        if !self.options.allow_comments {
            return Err(self.cursor.error(ErrorKind::CommentsDisabled));
        }
        match self.cursor.peek_at(1) {
            Some(b'/') => {
                self.cursor.take_while(|b| b != b'\n');
                Ok(())
            }
            Some(b'*') => {
                self.cursor.advance(2);
                match self.cursor.rest().find(b"*/") {
                    Some(end) => {
                        self.cursor.advance(end + 2);
                        Ok(())
                    }
                    None => Err(self.cursor.error_at(ErrorKind::UnexpectedToken, start)),
                }
            }
            _ => Err(self.cursor.error(ErrorKind::UnexpectedToken)),
        }
    }

    /// Checks the end-of-input conditions and hands out the root.
    fn finish(&mut self) -> Result<Value, ParseError> {
        if let Some(frame) = self.stack.last() {
            let kind = match frame {
                Frame::Object {
                    pending_key: Some(_),
                    ..
                } => ErrorKind::ExpectedValue,
                _ => ErrorKind::Structure,
            };
            return Err(self.cursor.error_at(kind, self.cursor.len()));
        }
        self.root
            .take()
            .ok_or_else(|| self.cursor.error_at(ErrorKind::Structure, self.cursor.len()))
    }
}
