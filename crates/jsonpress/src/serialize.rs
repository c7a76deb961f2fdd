//! Pretty printer for [`Value`] trees.
//!
//! The layout is fixed: containers open on the current line, each member or
//! element sits on its own line indented four spaces deeper than its
//! container, and the closing bracket returns to the container's indent.
//! Empty containers stay on one line as `{}` or `[]`.
//!
//! ```
//! use jsonpress::{parse, serialize};
//!
//! let value = parse(r#"{"list": [1, 2.5, "x\n"], "empty": {}}"#).unwrap();
//! let text = String::from_utf8(serialize::to_vec(&value["list"])).unwrap();
//! assert_eq!(text, "[\n    1,\n    2.5,\n    \"x\\n\"\n]");
//! ```

use alloc::vec::Vec;
use core::slice;

use crate::{map, number, value::Value};

const INDENT: &[u8] = b"    ";

/// A container whose members are still being written.
enum Open<'a> {
    Array(slice::Iter<'a, Value>),
    Object(map::Iter<'a, Value>),
}

struct Level<'a> {
    members: Open<'a>,
    first: bool,
}

/// Serializes `value` into a new buffer.
#[must_use]
pub fn to_vec(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    write(value, &mut out);
    out
}

/// Appends the pretty-printed form of `value` to `out`.
///
/// Strings are re-escaped so the output parses back to an equal tree; other
/// string bytes, including bytes that are not UTF-8, are copied unchanged.
/// Numbers are written in canonical fixed-point form (see
/// [`Value::Number`]). Object members appear in the object's iteration order.
///
/// Nesting is tracked on a heap stack, so arbitrarily deep trees are fine.
pub fn write(value: &Value, out: &mut Vec<u8>) {
    let mut stack: Vec<Level<'_>> = Vec::new();
    let mut next = Some(value);
    loop {
        if let Some(value) = next.take() {
            match value {
                Value::Array(items) if !items.is_empty() => {
                    out.push(b'[');
                    stack.push(Level {
                        members: Open::Array(items.iter()),
                        first: true,
                    });
                }
                Value::Object(members) if !members.is_empty() => {
                    out.push(b'{');
                    stack.push(Level {
                        members: Open::Object(members.iter()),
                        first: true,
                    });
                }
                _ => write_scalar(value, out),
            }
        }

        let depth = stack.len();
        let Some(level) = stack.last_mut() else {
            return;
        };
        let member = match &mut level.members {
            Open::Array(items) => items.next().map(|item| (None, item)),
            Open::Object(members) => members.next().map(|(key, item)| (Some(key), item)),
        };
        match member {
            Some((key, item)) => {
                if !level.first {
                    out.push(b',');
                }
                level.first = false;
                newline(out, depth);
                if let Some(key) = key {
                    write_string(key, out);
                    out.extend_from_slice(b": ");
                }
                next = Some(item);
            }
            None => {
                let close = match level.members {
                    Open::Array(_) => b']',
                    Open::Object(_) => b'}',
                };
                stack.pop();
                newline(out, depth - 1);
                out.push(close);
            }
        }
    }
}

fn newline(out: &mut Vec<u8>, depth: usize) {
    out.push(b'\n');
    for _ in 0..depth {
        out.extend_from_slice(INDENT);
    }
}

/// Writes a scalar or an empty container.
fn write_scalar(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::String(s) => write_string(s, out),
        Value::Number(n) => number::write_canonical(*n, out),
        Value::Boolean(true) => out.extend_from_slice(b"true"),
        Value::Boolean(false) => out.extend_from_slice(b"false"),
        Value::Null => out.extend_from_slice(b"null"),
        Value::Array(_) => out.extend_from_slice(b"[]"),
        Value::Object(_) => out.extend_from_slice(b"{}"),
    }
}

fn needs_escape(byte: u8) -> bool {
    byte < 0x20 || byte == b'"' || byte == b'\\'
}

fn write_string(bytes: &[u8], out: &mut Vec<u8>) {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";

    out.push(b'"');
    let mut rest = bytes;
    while let Some(at) = rest.iter().position(|&b| needs_escape(b)) {
        out.extend_from_slice(&rest[..at]);
        match rest[at] {
            b'"' => out.extend_from_slice(b"\\\""),
            b'\\' => out.extend_from_slice(b"\\\\"),
            0x08 => out.extend_from_slice(b"\\b"),
            0x0C => out.extend_from_slice(b"\\f"),
            b'\n' => out.extend_from_slice(b"\\n"),
            b'\r' => out.extend_from_slice(b"\\r"),
            b'\t' => out.extend_from_slice(b"\\t"),
            control => out.extend_from_slice(&[
                b'\\',
                b'u',
                b'0',
                b'0',
                HEX[usize::from(control >> 4)],
                HEX[usize::from(control & 0xF)],
            ]),
        }
        rest = &rest[at + 1..];
    }
    out.extend_from_slice(rest);
    out.push(b'"');
}

#[cfg(test)]
mod tests {
    use alloc::{string::String, vec::Vec};

    use bstr::BString;
    use rstest::rstest;

    use super::{to_vec, write_string};
    use crate::{parse, value::Value};

    fn render(value: &Value) -> String {
        String::from_utf8(to_vec(value)).unwrap()
    }

    #[rstest]
    #[case(b"plain", "\"plain\"")]
    #[case(b"say \"hi\"", r#""say \"hi\"""#)]
    #[case(b"back\\slash", r#""back\\slash""#)]
    #[case(b"\x08\x0C\n\r\t", r#""\b\f\n\r\t""#)]
    #[case(b"\x00\x01\x1F", r#""\u0000\u0001\u001F""#)]
    #[case(b"/ stays", "\"/ stays\"")]
    #[case(b"\x7F", "\"\x7F\"")]
    fn strings_are_escaped(#[case] input: &[u8], #[case] expected: &str) {
        let mut out = Vec::new();
        write_string(input, &mut out);
        assert_eq!(out, expected.as_bytes());
    }

    #[test]
    fn non_utf8_bytes_are_copied() {
        let value = Value::String(BString::from(&b"\xC3\x28"[..]));
        assert_eq!(to_vec(&value), b"\"\xC3\x28\"");
    }

    #[test]
    fn scalars_at_root() {
        assert_eq!(render(&Value::Null), "null");
        assert_eq!(render(&Value::from(true)), "true");
        assert_eq!(render(&Value::from(-0.0)), "0");
        assert_eq!(render(&Value::from(12.5)), "12.5");
    }

    #[test]
    fn empty_containers_stay_inline() {
        let value = parse(r#"[[], {}, [[]]]"#).unwrap();
        assert_eq!(render(&value), "[\n    [],\n    {},\n    [\n        []\n    ]\n]");
    }

    #[test]
    fn nested_objects_indent_by_four() {
        let value = parse(r#"{"outer": {"inner": [null]}}"#).unwrap();
        assert_eq!(
            render(&value),
            "{\n    \"outer\": {\n        \"inner\": [\n            null\n        ]\n    }\n}"
        );
    }

    #[test]
    fn output_parses_back_equal() {
        let input = r#"{"a": [1, -2.5, 1e3, "x\u0001y"], "b": {"c": null, "d": false}, "": "\\/"}"#;
        let value = parse(input).unwrap();
        assert_eq!(parse(to_vec(&value)).unwrap(), value);
    }

    #[test]
    fn deep_trees_round_trip() {
        let depth = 300;
        let mut input = String::new();
        input.extend(core::iter::repeat_n('[', depth));
        input.extend(core::iter::repeat_n(']', depth));
        let value = parse(&input).unwrap();
        let text = to_vec(&value);
        assert_eq!(text.first(), Some(&b'['));
        assert_eq!(parse(&text).unwrap(), value);
    }
}
