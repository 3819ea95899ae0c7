//! Codec module - conversion between text matrices and packed bytes.
//!
//! - [`Matrix`] - square matrix tagged with its [`NumericKind`](crate::numeric::NumericKind)
//! - [`tokens_from_rows`] - split rows of text into tokens
//!
//! # Example
//!
//! ```
//! use transpose_client::codec::{tokens_from_rows, Matrix};
//!
//! let tokens = tokens_from_rows(&["1, 2", "3, 4"]);
//! let matrix = Matrix::from_text(&tokens).unwrap();
//! assert_eq!(matrix.to_string(), "1 2\n3 4\n");
//! ```

mod matrix;
mod text;

pub use matrix::{payload_len, Matrix};
pub use text::{join_rows, tokens_from_rows};
