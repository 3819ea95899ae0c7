//! Square matrix tagged with its element kind.
//!
//! Elements are packed row-major, little-endian, with no padding. Uses
//! `bytes::Bytes` so clones share one buffer.
//!
//! # Example
//!
//! ```
//! use transpose_client::codec::Matrix;
//! use transpose_client::numeric::NumericKind;
//!
//! let matrix = Matrix::from_text(&["300", "1", "2", "3"]).unwrap();
//! assert_eq!(matrix.kind(), NumericKind::U16);
//! assert_eq!(matrix.dimension(), 2);
//! assert_eq!(matrix.payload_len(), 8);
//! ```

use std::fmt;

use bytes::{Bytes, BytesMut};

use crate::error::{ClientError, Result};
use crate::numeric::{NumericKind, NumericValue, TypeInference};

/// Number of payload bytes for a `dimension × dimension` matrix of `kind`.
///
/// Fails if the size does not fit in `usize`.
pub fn payload_len(kind: NumericKind, dimension: u32) -> Result<usize> {
    let dimension = dimension as u64;
    dimension
        .checked_mul(dimension)
        .and_then(|n| n.checked_mul(kind.width() as u64))
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| {
            ClientError::InvalidArgument(format!(
                "a {0}x{0} {1} matrix is too large",
                dimension, kind
            ))
        })
}

/// Exact integer square root, if `count` is a perfect square.
fn exact_sqrt(count: usize) -> Option<usize> {
    let guess = (count as f64).sqrt() as usize;
    (guess.saturating_sub(1)..=guess + 1).find(|&d| d.checked_mul(d) == Some(count))
}

/// An immutable square matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix {
    kind: NumericKind,
    dimension: u32,
    bytes: Bytes,
}

impl Matrix {
    /// Build a matrix from row-major text tokens.
    ///
    /// Infers the narrowest kind, then encodes every token with it.
    ///
    /// # Errors
    ///
    /// - `NotSquare` if the token count is not a non-zero perfect square
    /// - `TypeInference` if no supported kind fits all tokens
    pub fn from_text<S: AsRef<str>>(tokens: &[S]) -> Result<Self> {
        let count = tokens.len();
        let dimension = exact_sqrt(count)
            .filter(|&d| d > 0)
            .and_then(|d| u32::try_from(d).ok())
            .ok_or(ClientError::NotSquare { count })?;

        let mut inference = TypeInference::new();
        let numbers = tokens
            .iter()
            .map(|token| inference.observe(token.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        let kind = inference.kind();

        let mut buf = BytesMut::with_capacity(payload_len(kind, dimension)?);
        for (token, number) in tokens.iter().zip(numbers) {
            let value = NumericValue::from_number(kind, number, token.as_ref())?;
            kind.encode(value, &mut buf)?;
        }

        tracing::debug!(
            "Parsed {}x{} matrix as {} ({} bytes)",
            dimension,
            dimension,
            kind,
            buf.len()
        );

        Ok(Self {
            kind,
            dimension,
            bytes: buf.freeze(),
        })
    }

    /// Wrap a payload received from the wire.
    ///
    /// # Errors
    ///
    /// - `SizeMismatch` unless `bytes.len() == dimension² · width(kind)`
    /// - `ProtocolViolation` if a `bool` element is neither 0 nor 1
    pub fn from_wire(kind: NumericKind, dimension: u32, bytes: impl Into<Bytes>) -> Result<Self> {
        let bytes = bytes.into();
        let expected = payload_len(kind, dimension)?;
        if bytes.len() != expected {
            return Err(ClientError::SizeMismatch {
                expected,
                actual: bytes.len(),
            });
        }
        if kind == NumericKind::Bool {
            if let Some(position) = bytes.iter().position(|&b| b > 1) {
                return Err(ClientError::ProtocolViolation(format!(
                    "bool element {} has byte {}",
                    position, bytes[position]
                )));
            }
        }
        Ok(Self {
            kind,
            dimension,
            bytes,
        })
    }

    /// Element kind.
    #[inline]
    pub fn kind(&self) -> NumericKind {
        self.kind
    }

    /// Number of rows (and columns).
    #[inline]
    pub fn dimension(&self) -> u32 {
        self.dimension
    }

    /// Packed element bytes.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Cheap clone of the packed bytes.
    #[inline]
    pub fn payload_bytes(&self) -> Bytes {
        self.bytes.clone()
    }

    /// Length of the packed bytes.
    #[inline]
    pub fn payload_len(&self) -> usize {
        self.bytes.len()
    }

    /// Element at `row`, `column`.
    pub fn get(&self, row: u32, column: u32) -> Result<NumericValue> {
        if row >= self.dimension || column >= self.dimension {
            return Err(ClientError::InvalidArgument(format!(
                "({}, {}) is outside a {}x{} matrix",
                row, column, self.dimension, self.dimension
            )));
        }
        let index = row as usize * self.dimension as usize + column as usize;
        self.kind.decode(&self.bytes, index * self.kind.width())
    }

    /// Decode every element, row-major.
    pub fn values(&self) -> Result<Vec<NumericValue>> {
        (0..self.bytes.len())
            .step_by(self.kind.width())
            .map(|offset| self.kind.decode(&self.bytes, offset))
            .collect()
    }

    /// Format every element, grouped into rows.
    pub fn to_text(&self) -> Result<Vec<Vec<String>>> {
        let dimension = self.dimension as usize;
        let values = self.values()?;
        Ok(values
            .chunks(dimension.max(1))
            .map(|row| row.iter().map(ToString::to_string).collect())
            .collect())
    }
}

impl fmt::Display for Matrix {
    /// One row per line, elements separated by a single space.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.kind.width();
        let dimension = self.dimension as usize;
        for (i, offset) in (0..self.bytes.len()).step_by(width).enumerate() {
            if i % dimension != 0 {
                f.write_str(" ")?;
            }
            // Every constructor validates the payload; `?` only marks a decode bug.
            match self.kind.decode(&self.bytes, offset) {
                Ok(value) => write!(f, "{}", value)?,
                Err(_) => f.write_str("?")?,
            }
            if (i + 1) % dimension == 0 {
                f.write_str("\n")?;
            }
        }
        Ok(())
    }
}
