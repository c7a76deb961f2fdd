//! Numeric literals: decoding JSON number text into `f64` and writing `f64`
//! back out in canonical fixed-point form.

use alloc::vec::Vec;
use core::cmp::Ordering;

use crate::{
    cursor::Cursor,
    error::{ErrorKind, ParseError},
};

/// Exactly representable powers of ten.
const POW10: [f64; 23] = [
    1e0, 1e1, 1e2, 1e3, 1e4, 1e5, 1e6, 1e7, 1e8, 1e9, 1e10, 1e11, 1e12, 1e13, 1e14, 1e15, 1e16,
    1e17, 1e18, 1e19, 1e20, 1e21, 1e22,
];

/// Digits that fit in a `u64` accumulator.
const MAX_MANTISSA_DIGITS: usize = 19;

/// Largest integer every smaller integer of which is an exact `f64`.
const MAX_EXACT_INTEGER: u64 = 1 << 53;

/// Significant digits kept for exact rounding. Deciding between two
/// neighbouring doubles never needs more than 767; anything past the limit is
/// folded into one sticky digit.
const MAX_DIGITS: usize = 768;

const INFINITY_BITS: u64 = 0x7FF0_0000_0000_0000;

/// A decimal literal split into its digit runs, before any rounding.
struct Decimal<'a> {
    integer: &'a [u8],
    fraction: &'a [u8],
    exponent: i64,
}

impl Decimal<'_> {
    fn digits(&self) -> impl Iterator<Item = u8> + Clone + '_ {
        self.integer.iter().chain(self.fraction).map(|&d| d - b'0')
    }

    /// The nearest double to the literal's magnitude, ties to even, or `None`
    /// when it rounds past `f64::MAX`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn to_f64(&self) -> Option<f64> {
        let total = self.integer.len() + self.fraction.len();
        let leading = self.digits().take_while(|&d| d == 0).count();
        if leading == total {
            return Some(0.0);
        }
        let trailing = self
            .fraction
            .iter()
            .rev()
            .chain(self.integer.iter().rev())
            .take_while(|&&d| d == b'0')
            .count();
        let count = total - leading - trailing;
        let significant = self.digits().skip(leading).take(count);

        // The value is `significant * 10^exponent`, and lies below
        // `10^magnitude` but not below `10^(magnitude - 1)`.
        let exponent = self
            .exponent
            .saturating_sub(self.fraction.len() as i64)
            .saturating_add(trailing as i64);
        let magnitude = exponent.saturating_add(count as i64);
        if magnitude > 309 {
            return None;
        }
        if magnitude < -324 {
            return Some(0.0);
        }

        if count <= MAX_MANTISSA_DIGITS && exponent.unsigned_abs() <= 22 {
            let mantissa = significant
                .clone()
                .fold(0u64, |acc, d| acc * 10 + u64::from(d));
            if mantissa <= MAX_EXACT_INTEGER {
                #[allow(clippy::cast_precision_loss)]
                let value = mantissa as f64;
                let factor = POW10[exponent.unsigned_abs() as usize];
                return Some(if exponent < 0 {
                    value / factor
                } else {
                    value * factor
                });
            }
        }

        let head = count.min(MAX_MANTISSA_DIGITS);
        let prefix = significant
            .clone()
            .take(head)
            .fold(0u64, |acc, d| acc * 10 + u64::from(d));
        #[allow(clippy::cast_precision_loss)]
        let estimate = scale(prefix as f64, exponent + (count - head) as i64);

        let (digits, exponent) = if count > MAX_DIGITS {
            // The last significant digit is non-zero, so the cut-off tail is
            // too: one extra `1` stands in for it.
            let mut digits = Big::from_digits(significant.take(MAX_DIGITS));
            digits.mul_small(10);
            digits.add_small(1);
            (digits, magnitude - MAX_DIGITS as i64 - 1)
        } else {
            (Big::from_digits(significant), exponent)
        };
        // Within -1093..=309 given the magnitude checks above.
        let bits = round_to_nearest(&digits, exponent as i32, estimate)?;
        Some(f64::from_bits(bits))
    }
}

/// Multiplies or divides `value` by `10^exponent`, one exact power of ten at
/// a time. Only an estimate: every step may round.
fn scale(mut value: f64, exponent: i64) -> f64 {
    let mut remaining = exponent.unsigned_abs();
    while remaining > 0 && value != 0.0 && value.is_finite() {
        let step = remaining.min(22);
        #[allow(clippy::cast_possible_truncation)]
        let factor = POW10[step as usize];
        value = if exponent < 0 {
            value / factor
        } else {
            value * factor
        };
        remaining -= step;
    }
    value
}

/// Walks from `estimate` to the double nearest `digits * 10^exponent`,
/// comparing exactly against the midpoints between neighbouring doubles.
fn round_to_nearest(digits: &Big, exponent: i32, estimate: f64) -> Option<u64> {
    let mut bits = if estimate.is_finite() {
        estimate.to_bits()
    } else {
        f64::MAX.to_bits()
    };

    loop {
        match compare_to_midpoint(digits, exponent, bits) {
            Ordering::Greater => bits += 1,
            Ordering::Equal if bits & 1 == 1 => bits += 1,
            _ => break,
        }
        if bits >= INFINITY_BITS {
            return None;
        }
    }
    while bits > 0 {
        let below = bits - 1;
        match compare_to_midpoint(digits, exponent, below) {
            Ordering::Less => bits = below,
            Ordering::Equal if below & 1 == 0 => bits = below,
            _ => break,
        }
    }
    Some(bits)
}

/// Compares `digits * 10^exponent` with the midpoint between the positive
/// double `bits` and the next double up.
fn compare_to_midpoint(digits: &Big, exponent: i32, bits: u64) -> Ordering {
    let biased = bits >> 52;
    let fraction = bits & ((1 << 52) - 1);
    let (significand, power) = if biased == 0 {
        (fraction, -1074)
    } else {
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let power = biased as i32 - 1075;
        (fraction | (1 << 52), power)
    };

    // midpoint = (2 * significand + 1) * 2^(power - 1)
    let mut lhs = digits.clone();
    let mut rhs = Big::from_u64(2 * significand + 1);
    let mut lhs_twos = 0;
    let mut rhs_twos = power - 1;
    if exponent >= 0 {
        lhs.mul_pow5(exponent.unsigned_abs());
        lhs_twos += exponent;
    } else {
        rhs.mul_pow5(exponent.unsigned_abs());
        rhs_twos -= exponent;
    }
    if lhs_twos > rhs_twos {
        lhs.shl((lhs_twos - rhs_twos).unsigned_abs());
    } else {
        rhs.shl((rhs_twos - lhs_twos).unsigned_abs());
    }
    lhs.compare(&rhs)
}

/// Limbs in a [`Big`]: room for 769 decimal digits scaled by the largest
/// power of five a finite double needs, with headroom.
const BIG_LIMBS: usize = 128;

/// Fixed-capacity unsigned integer, little-endian 32-bit limbs. Sized so the
/// midpoint comparisons never outgrow it; bits past the capacity are dropped.
#[derive(Clone)]
struct Big {
    limbs: [u32; BIG_LIMBS],
    len: usize,
}

impl Big {
    #[allow(clippy::cast_possible_truncation)]
    fn from_u64(value: u64) -> Self {
        let mut big = Self {
            limbs: [0; BIG_LIMBS],
            len: 2,
        };
        big.limbs[0] = value as u32;
        big.limbs[1] = (value >> 32) as u32;
        big.trim();
        big
    }

    fn from_digits(digits: impl Iterator<Item = u8>) -> Self {
        let mut big = Self::from_u64(0);
        for digit in digits {
            big.mul_small(10);
            big.add_small(u32::from(digit));
        }
        big
    }

    fn trim(&mut self) {
        while self.len > 0 && self.limbs[self.len - 1] == 0 {
            self.len -= 1;
        }
    }

    fn push_carry(&mut self, carry: u32) {
        if carry != 0 && self.len < BIG_LIMBS {
            self.limbs[self.len] = carry;
            self.len += 1;
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn mul_small(&mut self, factor: u32) {
        let mut carry = 0u64;
        for limb in &mut self.limbs[..self.len] {
            let product = u64::from(*limb) * u64::from(factor) + carry;
            *limb = product as u32;
            carry = product >> 32;
        }
        self.push_carry(carry as u32);
    }

    fn add_small(&mut self, value: u32) {
        let mut carry = value;
        for limb in &mut self.limbs[..self.len] {
            let (sum, overflow) = limb.overflowing_add(carry);
            *limb = sum;
            carry = u32::from(overflow);
            if carry == 0 {
                return;
            }
        }
        self.push_carry(carry);
    }

    fn mul_pow5(&mut self, mut power: u32) {
        const POW5_13: u32 = 1_220_703_125;
        while power >= 13 {
            self.mul_small(POW5_13);
            power -= 13;
        }
        self.mul_small(5u32.pow(power));
    }

    fn shl(&mut self, bits: u32) {
        if self.len == 0 {
            return;
        }
        let limbs = (bits / 32) as usize;
        let shift = bits % 32;
        let old = self.limbs;
        let old_len = self.len;
        let new_len = (old_len + limbs + 1).min(BIG_LIMBS);
        let at = |i: Option<usize>| i.filter(|&i| i < old_len).map_or(0, |i| old[i]);
        for i in 0..new_len {
            let source = i.checked_sub(limbs);
            let high = at(source) << shift;
            let low = if shift == 0 {
                0
            } else {
                at(source.and_then(|s| s.checked_sub(1))) >> (32 - shift)
            };
            self.limbs[i] = high | low;
        }
        self.len = new_len;
        self.trim();
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.len.cmp(&other.len).then_with(|| {
            self.limbs[..self.len]
                .iter()
                .rev()
                .cmp(other.limbs[..other.len].iter().rev())
        })
    }
}

/// Decodes the number starting at the cursor (a digit or `-`) and leaves the
/// cursor on the first byte after it.
///
/// The result is the double nearest the literal, ties to even. Errors point
/// at the offending byte, except for a value out of `f64` range, which is
/// reported at the start of the literal.
pub(crate) fn decode(cursor: &mut Cursor<'_>) -> Result<f64, ParseError> {
    let start = cursor.pos();
    let negative = cursor.eat(b"-");

    let integer = cursor.take_while(|b| b.is_ascii_digit());
    match integer {
        [] => return Err(cursor.error(ErrorKind::InvalidNumber)),
        [b'0', _, ..] => {
            return Err(cursor.error_at(ErrorKind::LeadingZero, cursor.pos() - integer.len() + 1));
        }
        _ => {}
    }

    let mut fraction: &[u8] = &[];
    if cursor.eat(b".") {
        fraction = cursor.take_while(|b| b.is_ascii_digit());
        if fraction.is_empty() {
            return Err(cursor.error(ErrorKind::UnexpectedToken));
        }
    }

    let mut exponent = 0i64;
    if matches!(cursor.peek(), Some(b'e' | b'E')) {
        cursor.advance(1);
        let exponent_negative = match cursor.peek() {
            Some(b'-') => {
                cursor.advance(1);
                true
            }
            Some(b'+') => {
                cursor.advance(1);
                false
            }
            _ => false,
        };
        let digits = cursor.take_while(|b| b.is_ascii_digit());
        if digits.is_empty() {
            return Err(cursor.error(ErrorKind::UnexpectedToken));
        }
        exponent = digits.iter().fold(0i64, |acc, &d| {
            acc.saturating_mul(10).saturating_add(i64::from(d - b'0'))
        });
        if exponent_negative {
            exponent = -exponent;
        }
    }

    let decimal = Decimal {
        integer,
        fraction,
        exponent,
    };
    let Some(magnitude) = decimal.to_f64() else {
        return Err(cursor.error_at(ErrorKind::InvalidNumber, start));
    };
    Ok(if negative { -magnitude } else { magnitude })
}

/// Appends `value` in canonical decimal form: the shortest digits that read
/// back as the same `f64`, never in exponent notation, without trailing
/// fractional zeros. Negative zero is written as `0`.
///
/// Non-finite values have no JSON spelling and are written as `null`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]
pub(crate) fn write_canonical(value: f64, out: &mut Vec<u8>) {
    if !value.is_finite() {
        out.extend_from_slice(b"null");
        return;
    }
    if value == 0.0 {
        out.push(b'0');
        return;
    }
    if value < 0.0 {
        out.push(b'-');
    }

    let mut buffer = ryu::Buffer::new();
    let raw = buffer.format_finite(value.abs()).as_bytes();
    let (mantissa, exponent) = match raw.iter().position(|&b| b == b'e' || b == b'E') {
        Some(e) => (&raw[..e], parse_exponent(&raw[e + 1..])),
        None => (raw, 0),
    };
    let (integer, fraction) = match mantissa.iter().position(|&b| b == b'.') {
        Some(dot) => (&mantissa[..dot], &mantissa[dot + 1..]),
        None => (mantissa, &[][..]),
    };

    let mut digits: Vec<u8> = integer.iter().chain(fraction).copied().collect();
    // ryu emits at most 17 digits, so lengths fit in an i32.
    let mut point = integer.len() as i32 + exponent;
    let leading = digits.iter().take_while(|&&d| d == b'0').count();
    digits.drain(..leading);
    point -= leading as i32;
    while digits.last() == Some(&b'0') {
        digits.pop();
    }

    if point <= 0 {
        out.extend_from_slice(b"0.");
        out.extend(core::iter::repeat_n(b'0', (-point) as usize));
        out.extend_from_slice(&digits);
    } else if point as usize >= digits.len() {
        out.extend_from_slice(&digits);
        out.extend(core::iter::repeat_n(b'0', point as usize - digits.len()));
    } else {
        let (whole, part) = digits.split_at(point as usize);
        out.extend_from_slice(whole);
        out.push(b'.');
        out.extend_from_slice(part);
    }
}

fn parse_exponent(text: &[u8]) -> i32 {
    let (negative, digits) = match text.split_first() {
        Some((b'-', rest)) => (true, rest),
        _ => (false, text),
    };
    let magnitude = digits
        .iter()
        .fold(0i32, |acc, &d| acc * 10 + i32::from(d - b'0'));
    if negative { -magnitude } else { magnitude }
}

#[cfg(test)]
mod tests {
    use alloc::{string::String, vec::Vec};

    use quickcheck_macros::quickcheck;
    use rstest::rstest;

    use super::{decode, write_canonical};
    use crate::{cursor::Cursor, error::ErrorKind};

    fn decode_all(input: &str) -> Result<f64, (ErrorKind, usize)> {
        let mut cursor = Cursor::new(input.as_bytes());
        decode(&mut cursor).map_err(|e| (e.kind(), e.offset()))
    }

    fn canonical(value: f64) -> String {
        let mut out = Vec::new();
        write_canonical(value, &mut out);
        String::from_utf8(out).unwrap()
    }

    #[rstest]
    #[case("0", 0.0)]
    #[case("-0", -0.0)]
    #[case("7", 7.0)]
    #[case("-42", -42.0)]
    #[case("0.5", 0.5)]
    #[case("3.25", 3.25)]
    #[case("0.1", 0.1)]
    #[case("123.456", 123.456)]
    #[case("1e3", 1000.0)]
    #[case("1E+3", 1000.0)]
    #[case("25e-2", 0.25)]
    #[case("-1.5e1", -15.0)]
    #[case("1e22", 1e22)]
    #[case("9007199254740993", 9_007_199_254_740_992.0)]
    #[case("0e999999999999", 0.0)]
    #[case("1e-999999", 0.0)]
    #[case("210.73947491912494", 210.739_474_919_124_94)]
    #[case("123456789012345678901234567890", 1.234_567_890_123_456_8e29)]
    #[case("1.7976931348623157e308", f64::MAX)]
    #[case("2.2250738585072014e-308", f64::MIN_POSITIVE)]
    #[case("4.9406564584124654e-324", f64::from_bits(1))]
    #[case("2.4703282292062328e-324", f64::from_bits(1))]
    #[case("2.4703282292062327e-324", 0.0)]
    fn decodes(#[case] input: &str, #[case] expected: f64) {
        let value = decode_all(input).unwrap();
        assert_eq!(value.to_bits(), expected.to_bits(), "{input}");
    }

    #[test]
    fn long_fractions_round_correctly() {
        let mut input = String::from("0.");
        input.extend(core::iter::repeat_n('3', 400));
        assert_eq!(decode_all(&input), Ok(1.0 / 3.0));
    }

    #[test]
    fn digits_past_the_kept_limit_break_ties() {
        // Exactly between 2^53 and 2^53 + 2: ties to even.
        assert_eq!(decode_all("9007199254740993"), Ok(9_007_199_254_740_992.0));
        let mut input = String::from("9007199254740993.");
        input.extend(core::iter::repeat_n('0', 800));
        input.push('1');
        assert_eq!(decode_all(&input), Ok(9_007_199_254_740_994.0));
    }

    #[test]
    fn cursor_stops_after_literal() {
        let mut cursor = Cursor::new(b"-12.5e1]");
        assert_eq!(decode(&mut cursor).unwrap(), -125.0);
        assert_eq!(cursor.peek(), Some(b']'));
    }

    #[rstest]
    #[case("01", ErrorKind::LeadingZero, 1)]
    #[case("-007", ErrorKind::LeadingZero, 2)]
    #[case("-", ErrorKind::InvalidNumber, 1)]
    #[case("-x", ErrorKind::InvalidNumber, 1)]
    #[case("1.", ErrorKind::UnexpectedToken, 2)]
    #[case("1.e5", ErrorKind::UnexpectedToken, 2)]
    #[case("1e", ErrorKind::UnexpectedToken, 2)]
    #[case("1e+", ErrorKind::UnexpectedToken, 3)]
    #[case("2E-x", ErrorKind::UnexpectedToken, 3)]
    #[case("1e309", ErrorKind::InvalidNumber, 0)]
    #[case("-1e400", ErrorKind::InvalidNumber, 0)]
    #[case("1.7976931348623159e308", ErrorKind::InvalidNumber, 0)]
    fn rejects(#[case] input: &str, #[case] kind: ErrorKind, #[case] offset: usize) {
        assert_eq!(decode_all(input), Err((kind, offset)));
    }

    #[rstest]
    #[case(0.0, "0")]
    #[case(-0.0, "0")]
    #[case(1.0, "1")]
    #[case(-2.5, "-2.5")]
    #[case(0.1, "0.1")]
    #[case(100.0, "100")]
    #[case(1e21, "1000000000000000000000")]
    #[case(1.5e-7, "0.00000015")]
    #[case(123_456.789, "123456.789")]
    #[case(f64::NAN, "null")]
    #[case(f64::INFINITY, "null")]
    fn canonical_form(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(canonical(value), expected);
    }

    #[quickcheck]
    fn canonical_form_has_no_exponent(value: f64) -> bool {
        let text = canonical(value);
        !text.contains(['e', 'E']) && (!text.contains('.') || !text.ends_with('0'))
    }

    /// `text` reads back as the identical double. Only zero may lose its sign.
    fn reads_back(value: f64, text: &str) -> bool {
        !value.is_finite()
            || decode_all(text)
                .is_ok_and(|d| d == value && (value == 0.0 || d.to_bits() == value.to_bits()))
    }

    #[quickcheck]
    fn canonical_form_reads_back(value: f64) -> bool {
        reads_back(value, &canonical(value))
    }

    #[quickcheck]
    fn canonical_form_reads_back_any_bit_pattern(bits: u64) -> bool {
        let value = f64::from_bits(bits);
        reads_back(value, &canonical(value))
    }

    #[quickcheck]
    fn shortest_exponent_form_reads_back(bits: u64) -> bool {
        let value = f64::from_bits(bits);
        reads_back(value, &alloc::format!("{value:e}"))
    }

    #[quickcheck]
    fn integers_read_back_exactly(n: i32) -> bool {
        let text = canonical(f64::from(n));
        decode_all(&text) == Ok(f64::from(n))
    }
}
