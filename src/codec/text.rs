//! Text side of the matrix codec.
//!
//! Rows arrive as lines of comma- and/or space-separated values. Blank rows
//! are skipped; empty pieces between separators are dropped.
//!
//! # Example
//!
//! ```
//! use transpose_client::codec::tokens_from_rows;
//!
//! let tokens = tokens_from_rows(&["1, 2", "3 4", ""]);
//! assert_eq!(tokens, vec!["1", "2", "3", "4"]);
//! ```

/// Split rows of text into a flat token sequence, row-major.
pub fn tokens_from_rows<S: AsRef<str>>(rows: &[S]) -> Vec<String> {
    rows.iter()
        .map(AsRef::as_ref)
        .filter(|row| !row.trim().is_empty())
        .flat_map(|row| row.split(|c: char| c == ',' || c.is_whitespace()))
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join formatted rows with `separator` between elements and `\n` after each row.
pub fn join_rows(rows: &[Vec<String>], separator: &str) -> String {
    let mut out = String::new();
    for row in rows {
        out.push_str(&row.join(separator));
        out.push('\n');
    }
    out
}
