//! Text position utilities for byte offset and line:column conversions.
//!
//! ## Coordinate Conventions
//!
//! - Lines and columns are **1-indexed** (matching editor conventions)
//! - Columns count Unicode scalar values, not bytes
//! - Byte offsets are **0-indexed**
//! - Line/column values of 0 are treated as 1
//! - A leading byte order mark is not part of line 1: column 1 is the first
//!   character after it

/// Byte order mark some editors write at the start of source files.
pub const BOM: char = '\u{feff}';

/// Byte offset where the text proper begins: just past a leading [`BOM`],
/// otherwise 0.
pub fn text_start(content: &str) -> usize {
    if content.starts_with(BOM) {
        BOM.len_utf8()
    } else {
        0
    }
}

// ============================================================================
// Position Conversions
// ============================================================================

/// Convert a byte offset to 1-indexed line and column (Unicode-aware).
///
/// Offsets past the end of `content` map to the position just after the last
/// character.
pub fn byte_offset_to_position_str(content: &str, offset: usize) -> (u32, u32) {
    let mut line = 1u32;
    let mut col = 1u32;

    let start = text_start(content);
    for (i, ch) in content[start..].char_indices() {
        if start + i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    (line, col)
}

/// Convert 1-indexed line and column to a byte offset (Unicode-aware).
///
/// A column beyond the end of the line clamps to the line end; a line beyond
/// the end of the content returns `content.len()`.
pub fn position_to_byte_offset_str(content: &str, line: u32, col: u32) -> usize {
    let line = line.max(1);
    let col = col.max(1);

    let mut current_line = 1u32;
    let mut line_start = text_start(content);

    if line > 1 {
        let mut found = false;
        for (i, ch) in content.char_indices() {
            if ch == '\n' {
                current_line += 1;
                if current_line == line {
                    line_start = i + 1;
                    found = true;
                    break;
                }
            }
        }
        if !found {
            return content.len();
        }
    }

    let rest = &content[line_start..];
    let mut current_col = 1u32;
    for (j, c) in rest.char_indices() {
        if current_col == col || c == '\n' {
            return line_start + j;
        }
        current_col += 1;
    }
    content.len()
}

// ============================================================================
// Line Utilities
// ============================================================================

/// Byte offset of the start of the line containing `offset`.
///
/// Line 1 starts after a leading [`BOM`].
pub fn line_start(content: &str, offset: usize) -> usize {
    let offset = offset.min(content.len());
    content[..offset]
        .rfind('\n')
        .map(|i| i + 1)
        .unwrap_or_else(|| text_start(content).min(offset))
}

/// Byte offset of the end of the line containing `offset` (the `\n` itself,
/// or `content.len()` on the last line).
pub fn line_end(content: &str, offset: usize) -> usize {
    let offset = offset.min(content.len());
    content[offset..]
        .find('\n')
        .map(|i| offset + i)
        .unwrap_or(content.len())
}

/// True if everything between the start of the line and `offset` is whitespace.
pub fn only_whitespace_before(content: &str, offset: usize) -> bool {
    let offset = offset.min(content.len());
    content[line_start(content, offset)..offset]
        .chars()
        .all(char::is_whitespace)
}

/// Detect the indentation string at a position.
///
/// 1. Find the line containing `position`
/// 2. Extract leading whitespace from that line
/// 3. If the line is blank, use the previous non-blank line
/// 4. If no reference is found, return an empty string
pub fn detect_indentation(source: &str, position: usize) -> &str {
    if source.is_empty() || position > source.len() {
        return "";
    }

    let mut start = line_start(source, position);
    loop {
        let end = line_end(source, start);
        let line = &source[start..end];
        let indent_end = line
            .char_indices()
            .find(|(_, c)| !c.is_whitespace())
            .map(|(i, _)| i);

        if let Some(indent_end) = indent_end {
            return &source[start..start + indent_end];
        }
        if start <= text_start(source) {
            return "";
        }
        start = line_start(source, start - 1);
    }
}

// ============================================================================
// Tests
// ============================================================================
