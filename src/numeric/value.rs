//! Tagged scalar values and their little-endian codecs.
//!
//! Uses `bytes::{Buf, BufMut}` for the fixed-width conversions so that every
//! kind goes through the same endian-consistent path.

use std::fmt;

use bytes::{Buf, BufMut};

use super::infer::Number;
use super::kind::NumericKind;
use crate::error::{ClientError, Result};

/// A primitive that maps 1:1 onto a [`NumericKind`].
pub trait Scalar: Copy + Sized {
    /// The kind this primitive encodes as.
    const KIND: NumericKind;

    /// Append the little-endian representation to `buf`.
    fn put_le<B: BufMut>(self, buf: &mut B);

    /// Read one value from the front of `buf`.
    ///
    /// `buf` must hold at least `KIND.width()` bytes.
    fn get_le<B: Buf>(buf: &mut B) -> Result<Self>;
}

macro_rules! impl_scalar {
    ($ty:ty, $kind:ident, $put:ident, $get:ident) => {
        impl Scalar for $ty {
            const KIND: NumericKind = NumericKind::$kind;

            #[inline]
            fn put_le<B: BufMut>(self, buf: &mut B) {
                buf.$put(self);
            }

            #[inline]
            fn get_le<B: Buf>(buf: &mut B) -> Result<Self> {
                Ok(buf.$get())
            }
        }
    };
}

impl_scalar!(u8, U8, put_u8, get_u8);
impl_scalar!(u16, U16, put_u16_le, get_u16_le);
impl_scalar!(u32, U32, put_u32_le, get_u32_le);
impl_scalar!(u64, U64, put_u64_le, get_u64_le);
impl_scalar!(i8, I8, put_i8, get_i8);
impl_scalar!(i16, I16, put_i16_le, get_i16_le);
impl_scalar!(i32, I32, put_i32_le, get_i32_le);
impl_scalar!(i64, I64, put_i64_le, get_i64_le);
impl_scalar!(f32, F32, put_f32_le, get_f32_le);
impl_scalar!(f64, F64, put_f64_le, get_f64_le);

impl Scalar for bool {
    const KIND: NumericKind = NumericKind::Bool;

    #[inline]
    fn put_le<B: BufMut>(self, buf: &mut B) {
        buf.put_u8(self as u8);
    }

    fn get_le<B: Buf>(buf: &mut B) -> Result<Self> {
        match buf.get_u8() {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(ClientError::ProtocolViolation(format!(
                "invalid bool byte {}",
                other
            ))),
        }
    }
}

/// One matrix element, tagged with its kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericValue {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
}

impl NumericValue {
    /// The kind of this value.
    pub fn kind(&self) -> NumericKind {
        match self {
            NumericValue::Bool(_) => bool::KIND,
            NumericValue::U8(_) => u8::KIND,
            NumericValue::U16(_) => u16::KIND,
            NumericValue::U32(_) => u32::KIND,
            NumericValue::U64(_) => u64::KIND,
            NumericValue::I8(_) => i8::KIND,
            NumericValue::I16(_) => i16::KIND,
            NumericValue::I32(_) => i32::KIND,
            NumericValue::I64(_) => i64::KIND,
            NumericValue::F32(_) => f32::KIND,
            NumericValue::F64(_) => f64::KIND,
        }
    }

    /// Append the little-endian encoding to `buf`.
    pub fn put<B: BufMut>(&self, buf: &mut B) {
        match *self {
            NumericValue::Bool(v) => v.put_le(buf),
            NumericValue::U8(v) => v.put_le(buf),
            NumericValue::U16(v) => v.put_le(buf),
            NumericValue::U32(v) => v.put_le(buf),
            NumericValue::U64(v) => v.put_le(buf),
            NumericValue::I8(v) => v.put_le(buf),
            NumericValue::I16(v) => v.put_le(buf),
            NumericValue::I32(v) => v.put_le(buf),
            NumericValue::I64(v) => v.put_le(buf),
            NumericValue::F32(v) => v.put_le(buf),
            NumericValue::F64(v) => v.put_le(buf),
        }
    }

    /// Convert a parsed token into a value of `kind`.
    ///
    /// Integral kinds require an integral number in range; `bool` requires
    /// exactly 0 or 1.
    pub fn from_number(kind: NumericKind, number: Number, token: &str) -> Result<Self> {
        let out_of_range = || ClientError::inference(token, format!("does not fit in {}", kind));

        let integer = match number {
            Number::Integer(n) => Some(n),
            Number::Real(_) | Number::Oversized(_) => None,
        };

        macro_rules! integral {
            ($variant:ident) => {
                integer
                    .and_then(|n| n.try_into().ok())
                    .map(NumericValue::$variant)
                    .ok_or_else(out_of_range)
            };
        }

        match kind {
            NumericKind::Bool => match integer {
                Some(0) => Ok(NumericValue::Bool(false)),
                Some(1) => Ok(NumericValue::Bool(true)),
                _ => Err(out_of_range()),
            },
            NumericKind::U8 => integral!(U8),
            NumericKind::U16 => integral!(U16),
            NumericKind::U32 => integral!(U32),
            NumericKind::U64 => integral!(U64),
            NumericKind::I8 => integral!(I8),
            NumericKind::I16 => integral!(I16),
            NumericKind::I32 => integral!(I32),
            NumericKind::I64 => integral!(I64),
            NumericKind::F32 => Ok(NumericValue::F32(number.as_f64() as f32)),
            NumericKind::F64 => Ok(NumericValue::F64(number.as_f64())),
        }
    }
}

impl fmt::Display for NumericValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericValue::Bool(v) => write!(f, "{}", *v as u8),
            NumericValue::U8(v) => write!(f, "{}", v),
            NumericValue::U16(v) => write!(f, "{}", v),
            NumericValue::U32(v) => write!(f, "{}", v),
            NumericValue::U64(v) => write!(f, "{}", v),
            NumericValue::I8(v) => write!(f, "{}", v),
            NumericValue::I16(v) => write!(f, "{}", v),
            NumericValue::I32(v) => write!(f, "{}", v),
            NumericValue::I64(v) => write!(f, "{}", v),
            NumericValue::F32(v) => write!(f, "{}", v),
            NumericValue::F64(v) => write!(f, "{}", v),
        }
    }
}
