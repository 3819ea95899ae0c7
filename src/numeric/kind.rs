//! Static table of supported numeric kinds.
//!
//! ```text
//! ┌──────┬──────┬──────────────┐
//! │ Kind │ Code │ Width (bytes)│
//! ├──────┼──────┼──────────────┤
//! │ bool │  0   │ 1            │
//! │ u8   │  1   │ 1            │
//! │ u16  │  2   │ 2            │
//! │ u32  │  3   │ 4            │
//! │ u64  │  4   │ 8            │
//! │ i8   │  5   │ 1            │
//! │ i16  │  6   │ 2            │
//! │ i32  │  7   │ 4            │
//! │ i64  │  8   │ 8            │
//! │ f32  │  9   │ 4            │
//! │ f64  │ 10   │ 8            │
//! └──────┴──────┴──────────────┘
//! ```
//!
//! The code order is part of the wire contract. Do not reorder variants.

use std::fmt;
use std::str::FromStr;

use bytes::BufMut;
use serde::{Deserialize, Serialize};

use super::value::{NumericValue, Scalar};
use crate::error::{ClientError, Result};

/// A fixed-width numeric representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericKind {
    Bool,
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl NumericKind {
    /// Every kind, in type-code order.
    pub const ALL: [NumericKind; 11] = [
        NumericKind::Bool,
        NumericKind::U8,
        NumericKind::U16,
        NumericKind::U32,
        NumericKind::U64,
        NumericKind::I8,
        NumericKind::I16,
        NumericKind::I32,
        NumericKind::I64,
        NumericKind::F32,
        NumericKind::F64,
    ];

    /// Byte width of one element.
    #[inline]
    pub const fn width(self) -> usize {
        match self {
            NumericKind::Bool | NumericKind::U8 | NumericKind::I8 => 1,
            NumericKind::U16 | NumericKind::I16 => 2,
            NumericKind::U32 | NumericKind::I32 | NumericKind::F32 => 4,
            NumericKind::U64 | NumericKind::I64 | NumericKind::F64 => 8,
        }
    }

    /// One-byte type code (position in [`NumericKind::ALL`]).
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Look up a kind by its type code.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    /// Lowercase name (`"u16"`, `"f64"`, ...).
    pub const fn name(self) -> &'static str {
        match self {
            NumericKind::Bool => "bool",
            NumericKind::U8 => "u8",
            NumericKind::U16 => "u16",
            NumericKind::U32 => "u32",
            NumericKind::U64 => "u64",
            NumericKind::I8 => "i8",
            NumericKind::I16 => "i16",
            NumericKind::I32 => "i32",
            NumericKind::I64 => "i64",
            NumericKind::F32 => "f32",
            NumericKind::F64 => "f64",
        }
    }

    /// Look up a kind by name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.name() == name)
    }

    /// Encode `value` as little-endian bytes appended to `buf`.
    ///
    /// Fails if `value` is of a different kind.
    pub fn encode<B: BufMut>(self, value: NumericValue, buf: &mut B) -> Result<()> {
        if value.kind() != self {
            return Err(ClientError::InvalidArgument(format!(
                "cannot encode a {} value as {}",
                value.kind(),
                self
            )));
        }
        value.put(buf);
        Ok(())
    }

    /// Decode the element starting at `offset` in `bytes`.
    pub fn decode(self, bytes: &[u8], offset: usize) -> Result<NumericValue> {
        let end = offset
            .checked_add(self.width())
            .filter(|&end| end <= bytes.len())
            .ok_or(ClientError::SizeMismatch {
                expected: offset.saturating_add(self.width()),
                actual: bytes.len(),
            })?;
        let mut src = &bytes[offset..end];

        Ok(match self {
            NumericKind::Bool => NumericValue::Bool(bool::get_le(&mut src)?),
            NumericKind::U8 => NumericValue::U8(u8::get_le(&mut src)?),
            NumericKind::U16 => NumericValue::U16(u16::get_le(&mut src)?),
            NumericKind::U32 => NumericValue::U32(u32::get_le(&mut src)?),
            NumericKind::U64 => NumericValue::U64(u64::get_le(&mut src)?),
            NumericKind::I8 => NumericValue::I8(i8::get_le(&mut src)?),
            NumericKind::I16 => NumericValue::I16(i16::get_le(&mut src)?),
            NumericKind::I32 => NumericValue::I32(i32::get_le(&mut src)?),
            NumericKind::I64 => NumericValue::I64(i64::get_le(&mut src)?),
            NumericKind::F32 => NumericValue::F32(f32::get_le(&mut src)?),
            NumericKind::F64 => NumericValue::F64(f64::get_le(&mut src)?),
        })
    }
}

/// Byte width of one element of `kind`.
#[inline]
pub fn width_of(kind: NumericKind) -> usize {
    kind.width()
}

impl fmt::Display for NumericKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NumericKind {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
            .ok_or_else(|| ClientError::InvalidArgument(format!("unknown numeric kind: {}", s)))
    }
}
