#![no_main]
use std::cell::RefCell;

use arbitrary::Arbitrary;
use jsonpress::{ErrorKind, Parser, ParserOptions, serialize};
use libfuzzer_sys::{fuzz_mutator, fuzz_target, fuzzer_mutate};
use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use serde_json::{Map, Value};

const HEADER: usize = 1; // option flags

thread_local! {
    static RNG: RefCell<SmallRng> = RefCell::new(SmallRng::from_os_rng());
}

/// Separators spliced between generated values. Comments only parse when the
/// header enables them, so the rest exercise the rejection path.
static SEPARATORS: &[&[u8]] = &[
    b" ",
    b"\t",
    b"\n",
    b"\r\n",
    b"/* block */",
    b"// line\n",
    b"/**/",
];

fn with_rng<F, R>(f: F) -> R
where
    F: FnOnce(&mut SmallRng) -> R,
{
    RNG.with(|cell| f(&mut cell.borrow_mut()))
}

fn mutator(data: &mut [u8], size: usize, max_size: usize, seed: u32) -> usize {
    if size < HEADER || seed.is_multiple_of(10) {
        data[0] = with_rng(|rng| rng.next_u32() as u8 & 0x03);

        let mut prefix = HEADER;
        prefix += append_separator(&mut data[prefix..], max_size - prefix);
        prefix += append_value(&mut data[prefix..], size.max(16), max_size - prefix);
        prefix += append_separator(&mut data[prefix..], max_size - prefix);
        prefix
    } else {
        fuzzer_mutate(data, size, max_size)
    }
}

fn append_separator(buf: &mut [u8], limit: usize) -> usize {
    with_rng(|rng| {
        let sep = SEPARATORS[rng.random_range(0..SEPARATORS.len())];
        if sep.len() > limit {
            return 0;
        }
        buf[..sep.len()].copy_from_slice(sep);
        sep.len()
    })
}

fn append_value(data: &mut [u8], size: usize, limit: usize) -> usize {
    if limit == 0 {
        return 0;
    }
    let value = loop {
        let s = with_rng(|rng| rng.random_range(size / 2..size * 2).min(limit));
        let bytes: Vec<u8> = with_rng(|rng| (0..s).map(|_| rng.random::<u8>()).collect());
        if let Ok(value) = ArbitraryValue::arbitrary(&mut arbitrary::Unstructured::new(&bytes)) {
            break value;
        }
    };

    let serialized = if with_rng(|rng| rng.random_bool(0.5)) {
        serde_json::to_vec_pretty(&value.0)
    } else {
        serde_json::to_vec(&value.0)
    }
    .expect("Failed to serialize arbitrary value");

    let len = serialized.len().min(limit);
    data[..len].copy_from_slice(&serialized[..len]);
    len
}

fuzz_mutator!(|data: &mut [u8], size: usize, max_size: usize, seed: u32| {
    mutator(data, size, max_size, seed)
});

#[derive(Debug)]
struct ArbitraryValue(Value);

impl<'a> Arbitrary<'a> for ArbitraryValue {
    fn arbitrary(u: &mut arbitrary::Unstructured<'_>) -> arbitrary::Result<Self> {
        let value = match u.choose_index(21)? {
            0 => Value::Null,
            1 => Value::Bool(u.arbitrary()?),
            2 => {
                let n: f64 = u.arbitrary()?;
                Value::Number(
                    serde_json::Number::from_f64(n).ok_or(arbitrary::Error::IncorrectFormat)?,
                )
            }
            3..=10 => Value::String(u.arbitrary()?),
            11..=15 => {
                let elems: Vec<ArbitraryValue> = u.arbitrary()?;
                Value::Array(elems.into_iter().map(|v| v.0).collect())
            }
            16..=20 => {
                let m: Vec<(String, ArbitraryValue)> = u.arbitrary()?;
                Value::Object(Map::from_iter(m.into_iter().map(|(k, v)| (k, v.0))))
            }
            _ => Err(arbitrary::Error::IncorrectFormat)?,
        };
        Ok(ArbitraryValue(value))
    }
}

fn parser(data: &[u8]) {
    let Some((&flags, input)) = data.split_first() else {
        return;
    };

    let parser = Parser::new(ParserOptions {
        allow_comments: flags & 1 != 0,
        check_bom: flags & 2 != 0,
        panic_on_error: false,
    });
    match parser.parse(input) {
        Ok(value) => {
            // The printed form carries no comments or BOM and must read back
            // under the defaults with every number unchanged.
            let printed = serialize::to_vec(&value);
            let reread = jsonpress::parse(&printed).expect("printed form reparses");
            assert_eq!(reread, value);
        }
        Err(err) => {
            assert!(err.offset() <= input.len(), "{err} past end {}", input.len());
            if flags & 1 == 0 && err.kind() == ErrorKind::CommentsDisabled {
                assert_eq!(input[err.offset()], b'/');
            }
        }
    }
}

fuzz_target!(|data: &[u8]| parser(data));
