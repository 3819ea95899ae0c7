//! Numeric module - kind registry, scalar codecs, and type inference.
//!
//! - [`NumericKind`] - closed set of fixed-width kinds with widths and codes
//! - [`NumericValue`] / [`Scalar`] - little-endian encode/decode per kind
//! - [`TypeInference`] - narrowest-fit rule over text tokens

mod infer;
mod kind;
mod value;

pub use infer::{infer_kind, Number, NumberClass, TypeInference};
pub use kind::{width_of, NumericKind};
pub use value::{NumericValue, Scalar};
