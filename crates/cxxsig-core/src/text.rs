//! Text position utilities for byte offset and line:column conversions.
//!
//! ## Coordinate Conventions
//!
//! - Lines and columns are **1-indexed** (matching editor conventions)
//! - Byte offsets are **0-indexed**
//! - Columns count Unicode scalar values, not bytes
//! - Line/column values of 0 are treated as 1

use crate::patch::Span;

/// Convert a byte offset to 1-indexed line and column.
///
/// If `offset` exceeds the content length, returns the position at end of content.
pub fn byte_offset_to_position_str(content: &str, offset: usize) -> (u32, u32) {
    let mut line = 1u32;
    let mut col = 1u32;
    let mut current_offset = 0usize;

    for ch in content.chars() {
        if current_offset >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
        current_offset += ch.len_utf8();
    }

    (line, col)
}

/// Convert 1-indexed line and column to a byte offset.
///
/// A column past the end of the line clamps to the line end; a line past the
/// end of the content clamps to the content length.
pub fn position_to_byte_offset_str(content: &str, line: u32, col: u32) -> usize {
    let line = line.max(1);
    let col = col.max(1);

    let Some(line_start) = line_start_offset(content, line) else {
        return content.len();
    };

    let mut current_col = 1u32;
    for (i, c) in content[line_start..].char_indices() {
        if current_col == col || c == '\n' {
            return line_start + i;
        }
        current_col += 1;
    }
    content.len()
}

/// Byte offset of the first character of a 1-indexed line.
///
/// Returns `None` if the content has fewer lines.
pub fn line_start_offset(content: &str, line: u32) -> Option<usize> {
    if line <= 1 {
        return Some(0);
    }
    content
        .match_indices('\n')
        .nth(line as usize - 2)
        .map(|(i, _)| i + 1)
}

/// The `[start, end)` bounds of the line containing `offset`, excluding the newline.
pub fn line_bounds(content: &str, offset: usize) -> Span {
    let offset = offset.min(content.len());
    let start = content[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let end = content[offset..]
        .find('\n')
        .map(|i| offset + i)
        .unwrap_or(content.len());
    Span::new(start, end)
}

/// Extract the text content of a span.
///
/// Returns `None` if the span extends beyond content bounds or splits a character.
pub fn extract_span_str<'a>(content: &'a str, span: &Span) -> Option<&'a str> {
    content.get(span.start..span.end)
}
