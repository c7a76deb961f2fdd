//! A self-contained JSON reader and writer.
//!
//! `jsonpress` turns JSON text into an owned [`Value`] tree and back, without
//! relying on any other JSON library. Parsing is a single left-to-right pass
//! driven by a state machine that tracks which tokens may come next; open
//! containers are kept on an explicit working stack, so deeply nested input
//! cannot exhaust the call stack.
//!
//! The tree is built on two containers of its own: [`Sequence`], a growable
//! list, and [`Map`], an open-addressing hash table. Every allocation on the
//! parse path is fallible, and running out of memory is reported as
//! [`ErrorKind::OutOfMemory`] rather than aborting.
//!
//! Beyond RFC 8259, the parser optionally accepts `//` and `/* */` comments
//! and skips a leading UTF-8 byte-order mark (see [`ParserOptions`]).
//!
//! # Examples
//!
//! ```rust
//! use jsonpress::{ErrorKind, Value, parse};
//!
//! let value = parse(r#"{"name": "jsonpress", "tags": ["json", "no_std"]}"#).unwrap();
//! assert_eq!(value["name"].as_str(), Some("jsonpress"));
//! assert_eq!(value["tags"][1], Value::from("no_std"));
//!
//! let err = parse("01").unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::LeadingZero);
//! ```
//!
//! Pretty printing:
//!
//! ```rust
//! let value = jsonpress::parse("[true,null]").unwrap();
//! assert_eq!(value.to_string(), "[\n    true,\n    null\n]");
//! ```

#![no_std]
extern crate alloc;

#[cfg(test)]
extern crate std;

mod cursor;
mod escape_buffer;
mod literal;
mod number;
mod string;

mod error;
mod map;
mod options;
mod parser;
mod sequence;
pub mod serialize;
mod value;

#[cfg(feature = "serde")]
mod serde_impl;

#[cfg(test)]
mod tests;

pub use error::{AllocError, ErrorKind, ParseError};
pub use map::{IntoIter as MapIntoIter, Iter as MapIter, IterMut as MapIterMut, Map};
pub use options::ParserOptions;
pub use parser::Parser;
pub use sequence::Sequence;
pub use value::{Array, Object, Value};

/// Parses `input` with the default [`ParserOptions`].
///
/// # Errors
///
/// Returns the first grammar violation or allocation failure together with
/// its byte offset; see [`Parser::parse`].
pub fn parse(input: impl AsRef<[u8]>) -> Result<Value, ParseError> {
    Parser::default().parse(input)
}
