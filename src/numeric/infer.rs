//! Narrowest-fit type inference over text tokens.
//!
//! A single pass drives a class state machine that only ever widens:
//!
//! ```text
//! Boolean ──(not 0/1)──► Unsigned ──(negative)──► Signed ──(fraction)──► Floating
//!    └───────────────────────┴──────────(fraction)───┘
//! ```
//!
//! Unsigned and signed width trackers observe every integral token, so the
//! final width covers values seen before the last class change.

use std::cmp::Ordering;

use super::kind::NumericKind;
use crate::error::{ClientError, Result};

/// A token parsed as an exact decimal value.
///
/// Integrality is decided on the decimal digits, never on a rounded `f64`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Integral value, exact.
    Integer(i128),
    /// Non-zero fractional part. The `f64` is the nearest binary value.
    Real(f64),
    /// Integral, but too large for `i128`.
    Oversized(f64),
}

impl Number {
    /// Parse a trimmed token of the form `[+-]digits[.digits][(e|E)[+-]digits]`.
    ///
    /// Returns `None` for empty input, `inf`, `NaN`, values that overflow
    /// `f64`, and anything that is not a decimal number.
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        let decimal = Decimal::parse(token)?;
        if decimal.digits.is_empty() {
            return Some(Number::Integer(0));
        }

        let value: f64 = token.parse().ok()?;
        if !value.is_finite() {
            return None;
        }
        if decimal.exponent < 0 {
            return Some(Number::Real(value));
        }
        Some(match decimal.to_i128() {
            Some(n) => Number::Integer(n),
            None => Number::Oversized(value),
        })
    }

    /// Lossy conversion used for floating kinds.
    #[inline]
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Integer(n) => n as f64,
            Number::Real(v) | Number::Oversized(v) => v,
        }
    }
}

/// `±digits × 10^exponent` with no leading or trailing zero digits.
/// Zero has no digits.
#[derive(Debug, PartialEq)]
struct Decimal {
    negative: bool,
    digits: Vec<u8>,
    exponent: i64,
}

impl Decimal {
    fn parse(token: &str) -> Option<Self> {
        let (negative, rest) = split_sign(token);
        let (mantissa, exponent) = match rest.find(['e', 'E']) {
            Some(at) => (&rest[..at], parse_exponent(&rest[at + 1..])?),
            None => (rest, 0),
        };
        let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
        if whole.is_empty() && fraction.is_empty() {
            return None;
        }
        if !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
            return None;
        }

        let mut exponent = exponent.saturating_sub(fraction.len() as i64);
        let mut digits: Vec<u8> = whole
            .bytes()
            .chain(fraction.bytes())
            .map(|b| b - b'0')
            .skip_while(|&d| d == 0)
            .collect();
        while digits.last() == Some(&0) {
            digits.pop();
            exponent = exponent.saturating_add(1);
        }

        Some(Self {
            negative,
            digits,
            exponent,
        })
    }

    /// Exact integer value, if the exponent is non-negative and it fits.
    fn to_i128(&self) -> Option<i128> {
        if self.exponent < 0 {
            return None;
        }
        let mut n: i128 = 0;
        for &d in &self.digits {
            n = n.checked_mul(10)?.checked_add(d as i128)?;
        }
        for _ in 0..self.exponent {
            n = n.checked_mul(10)?;
        }
        Some(if self.negative { -n } else { n })
    }
}

fn split_sign(s: &str) -> (bool, &str) {
    match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    }
}

/// Exponent digits saturate; anything that large over- or underflows `f64` anyway.
fn parse_exponent(s: &str) -> Option<i64> {
    let (negative, digits) = split_sign(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let magnitude = digits.bytes().fold(0i64, |acc, b| {
        acc.saturating_mul(10).saturating_add((b - b'0') as i64)
    });
    Some(if negative { -magnitude } else { magnitude })
}

/// Class of the inference state machine, ordered from narrowest to widest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NumberClass {
    Boolean,
    Unsigned,
    Signed,
    Floating,
}

fn narrowest_unsigned(n: i128) -> Option<NumericKind> {
    if n < 0 {
        None
    } else if n <= u8::MAX as i128 {
        Some(NumericKind::U8)
    } else if n <= u16::MAX as i128 {
        Some(NumericKind::U16)
    } else if n <= u32::MAX as i128 {
        Some(NumericKind::U32)
    } else if n <= u64::MAX as i128 {
        Some(NumericKind::U64)
    } else {
        None
    }
}

fn narrowest_signed(n: i128) -> Option<NumericKind> {
    if (i8::MIN as i128..=i8::MAX as i128).contains(&n) {
        Some(NumericKind::I8)
    } else if (i16::MIN as i128..=i16::MAX as i128).contains(&n) {
        Some(NumericKind::I16)
    } else if (i32::MIN as i128..=i32::MAX as i128).contains(&n) {
        Some(NumericKind::I32)
    } else if (i64::MIN as i128..=i64::MAX as i128).contains(&n) {
        Some(NumericKind::I64)
    } else {
        None
    }
}

fn wider(a: NumericKind, b: NumericKind) -> NumericKind {
    match a.width().cmp(&b.width()) {
        Ordering::Less => b,
        _ => a,
    }
}

/// Incremental narrowest-fit inference.
///
/// # Example
///
/// ```
/// use transpose_client::numeric::{NumericKind, TypeInference};
///
/// let mut inference = TypeInference::new();
/// for token in ["0", "1", "300"] {
///     inference.observe(token).unwrap();
/// }
/// assert_eq!(inference.kind(), NumericKind::U16);
/// ```
#[derive(Debug, Clone)]
pub struct TypeInference {
    class: NumberClass,
    unsigned: NumericKind,
    signed: NumericKind,
    /// An integral value above `i64::MAX` has been seen.
    signed_overflow: bool,
}

impl TypeInference {
    /// Start at `Boolean` with `u8`/`i8` trackers.
    pub fn new() -> Self {
        Self {
            class: NumberClass::Boolean,
            unsigned: NumericKind::U8,
            signed: NumericKind::I8,
            signed_overflow: false,
        }
    }

    /// Current class.
    #[inline]
    pub fn class(&self) -> NumberClass {
        self.class
    }

    /// Feed one token. Returns the parsed value on success.
    pub fn observe(&mut self, token: &str) -> Result<Number> {
        let number = Number::parse(token)
            .ok_or_else(|| ClientError::inference(token, "not a finite real number"))?;

        if self.class == NumberClass::Floating {
            return Ok(number);
        }

        match number {
            Number::Integer(n) => self.observe_integer(n, token)?,
            Number::Real(_) => self.class = NumberClass::Floating,
            Number::Oversized(_) => {
                return Err(ClientError::inference(
                    token,
                    "exceeds the range of supported integer types",
                ))
            }
        }

        Ok(number)
    }

    fn observe_integer(&mut self, n: i128, token: &str) -> Result<()> {
        if let Some(kind) = narrowest_unsigned(n) {
            self.unsigned = wider(self.unsigned, kind);
        }
        match narrowest_signed(n) {
            Some(kind) => self.signed = wider(self.signed, kind),
            None if n > 0 => self.signed_overflow = true,
            None => {}
        }

        if self.class == NumberClass::Boolean && n != 0 && n != 1 {
            self.class = NumberClass::Unsigned;
        }
        if self.class == NumberClass::Unsigned && n < 0 {
            self.class = NumberClass::Signed;
        }

        match self.class {
            NumberClass::Unsigned if n > u64::MAX as i128 => Err(ClientError::inference(
                token,
                "exceeds the range of u64",
            )),
            NumberClass::Signed if self.signed_overflow || narrowest_signed(n).is_none() => {
                Err(ClientError::inference(token, "exceeds the range of i64"))
            }
            _ => Ok(()),
        }
    }

    /// Kind selected by the tokens seen so far.
    pub fn kind(&self) -> NumericKind {
        match self.class {
            NumberClass::Boolean => NumericKind::Bool,
            NumberClass::Unsigned => self.unsigned,
            NumberClass::Signed => self.signed,
            NumberClass::Floating => NumericKind::F64,
        }
    }
}

impl Default for TypeInference {
    fn default() -> Self {
        Self::new()
    }
}

/// Infer the narrowest kind for a whole token sequence.
pub fn infer_kind<S: AsRef<str>>(tokens: &[S]) -> Result<NumericKind> {
    let mut inference = TypeInference::new();
    for token in tokens {
        inference.observe(token.as_ref())?;
    }
    Ok(inference.kind())
}
