// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! C# tokenizer.
//!
//! Splits source text into a flat token stream with byte spans. Trivia
//! (whitespace, comments, preprocessor lines) is skipped, so the spans of
//! consecutive tokens may leave gaps; the original text is always recovered
//! through those spans, never through the tokens themselves.
//!
//! The tokenizer only needs to be exact about where tokens begin and end.
//! Literals are recognized but not decoded, and every operator except `::`
//! and `=>` is a single-character punctuation token. In particular `>` is
//! never combined, so nested generic argument lists close one token at a time.

use csfix_core::patch::Span;
use csfix_core::text::{only_whitespace_before, text_start};
use thiserror::Error;
use winnow::ascii::multispace0;
use winnow::combinator::{alt, cut_err, opt, peek};
use winnow::error::{ErrMode, ParserError};
use winnow::prelude::*;
use winnow::token::{any, one_of, take, take_till, take_until, take_while};
use winnow::ModalResult;

/// Error produced when the source cannot be split into tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizeError {
    #[error("unterminated comment starting at byte {offset}")]
    UnterminatedComment { offset: usize },

    #[error("unterminated literal starting at byte {offset}")]
    UnterminatedLiteral { offset: usize },
}

impl TokenizeError {
    pub fn offset(&self) -> usize {
        match self {
            TokenizeError::UnterminatedComment { offset }
            | TokenizeError::UnterminatedLiteral { offset } => *offset,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Identifier, including contextual keywords and `@verbatim` identifiers.
    Ident,
    /// Reserved keyword.
    Keyword,
    Number,
    String,
    Char,
    Punct,
    Eof,
}

/// A token borrowed from the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub span: Span,
}

impl Token<'_> {
    pub fn is_punct(&self, text: &str) -> bool {
        self.kind == TokenKind::Punct && self.text == text
    }

    pub fn is_keyword(&self, text: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text == text
    }

    /// Identifier or keyword spelled exactly `text` (used for contextual keywords).
    pub fn is_word(&self, text: &str) -> bool {
        matches!(self.kind, TokenKind::Ident | TokenKind::Keyword) && self.text == text
    }

    pub fn is_ident(&self) -> bool {
        self.kind == TokenKind::Ident
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

const KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
    "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true",
    "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual",
    "void", "volatile", "while",
];

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

/// Tokenize C# source text.
///
/// The returned stream always ends with a single [`TokenKind::Eof`] token
/// whose span is empty and sits at `source.len()`. A leading byte order mark
/// is skipped as trivia; spans stay offsets into `source`.
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, TokenizeError> {
    let mut input = &source[text_start(source)..];
    let mut tokens = Vec::new();

    loop {
        let trivia_start = source.len() - input.len();
        skip_trivia(source, &mut input).map_err(|_| TokenizeError::UnterminatedComment {
            offset: comment_start(source, trivia_start),
        })?;

        let start = source.len() - input.len();
        if input.is_empty() {
            tokens.push(Token {
                kind: TokenKind::Eof,
                text: "",
                span: Span::empty(start),
            });
            break;
        }

        let kind = next_token(&mut input)
            .map_err(|_| TokenizeError::UnterminatedLiteral { offset: start })?;
        let end = source.len() - input.len();
        tokens.push(Token {
            kind,
            text: &source[start..end],
            span: Span::new(start, end),
        });
    }

    tracing::trace!(tokens = tokens.len(), "tokenized");
    Ok(tokens)
}

fn comment_start(source: &str, from: usize) -> usize {
    source[from..]
        .find("/*")
        .map(|i| from + i)
        .unwrap_or(from)
}

// ============================================================================
// Trivia
// ============================================================================

fn skip_trivia(source: &str, input: &mut &str) -> ModalResult<()> {
    loop {
        let before = input.len();
        let _: &str = multispace0.parse_next(input)?;

        if input.starts_with("//") {
            let _: &str = take_till(0.., ['\n']).parse_next(input)?;
        } else if input.starts_with("/*") {
            block_comment.parse_next(input)?;
        } else if input.starts_with('#')
            && only_whitespace_before(source, source.len() - input.len())
        {
            // Preprocessor directive: the rest of the line.
            let _: &str = take_till(0.., ['\n']).parse_next(input)?;
        }

        if input.len() == before {
            return Ok(());
        }
    }
}

fn block_comment(input: &mut &str) -> ModalResult<()> {
    ("/*", take_until(0.., "*/"), "*/").void().parse_next(input)
}

// ============================================================================
// Tokens
// ============================================================================

fn next_token(input: &mut &str) -> ModalResult<TokenKind> {
    alt((
        string_literal.value(TokenKind::String),
        char_literal.value(TokenKind::Char),
        identifier_or_keyword,
        number.value(TokenKind::Number),
        punctuation.value(TokenKind::Punct),
    ))
    .parse_next(input)
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn identifier_or_keyword(input: &mut &str) -> ModalResult<TokenKind> {
    let (verbatim, word): (Option<char>, &str) = (
        opt('@'),
        (one_of(is_ident_start), take_while(0.., is_ident_continue)).take(),
    )
        .parse_next(input)?;

    if verbatim.is_none() && is_keyword(word) {
        Ok(TokenKind::Keyword)
    } else {
        Ok(TokenKind::Ident)
    }
}

fn number(input: &mut &str) -> ModalResult<()> {
    let alnum = |c: char| c.is_ascii_alphanumeric() || c == '_';
    (
        one_of(|c: char| c.is_ascii_digit()),
        take_while(0.., alnum),
        opt(('.', one_of(|c: char| c.is_ascii_digit()), take_while(0.., alnum))),
    )
        .void()
        .parse_next(input)
}

fn punctuation(input: &mut &str) -> ModalResult<()> {
    alt(("::".void(), "=>".void(), any.void())).parse_next(input)
}

/// Consume exactly the literal measured by `measure`, failing if it is unterminated.
fn literal(measure: fn(&str) -> Option<usize>) -> impl FnMut(&mut &str) -> ModalResult<()> {
    move |input: &mut &str| {
        let len = measure(*input).ok_or_else(|| ErrMode::from_input(input))?;
        take(len).void().parse_next(input)
    }
}

fn string_literal(input: &mut &str) -> ModalResult<()> {
    peek((take_while(0..=4, ['$', '@']), '"')).parse_next(input)?;
    cut_err(literal(string_literal_len)).parse_next(input)
}

fn char_literal(input: &mut &str) -> ModalResult<()> {
    peek('\'').parse_next(input)?;
    cut_err(literal(char_literal_len)).parse_next(input)
}

/// Byte length of the string literal at the start of `s`.
///
/// Handles regular, verbatim (`@"..."`), interpolated (`$"..."`, `$@"..."`)
/// and raw (`"""..."""`) strings. Interpolation holes may contain nested
/// literals and braces.
fn string_literal_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = 0;
    let mut interpolated = false;
    let mut verbatim = false;
    loop {
        match bytes.get(i) {
            Some(b'$') => interpolated = true,
            Some(b'@') => verbatim = true,
            _ => break,
        }
        i += 1;
    }
    if bytes.get(i) != Some(&b'"') {
        return None;
    }

    let quotes = bytes[i..].iter().take_while(|&&b| b == b'"').count();
    if quotes >= 3 && !verbatim {
        let body = i + quotes;
        let closing = &s[i..body];
        let end = s[body..].find(closing)?;
        return Some(body + end + quotes);
    }

    i += 1;
    let mut depth = 0usize;
    while i < bytes.len() {
        let b = bytes[i];
        if depth > 0 {
            match b {
                b'{' => depth += 1,
                b'}' => depth -= 1,
                b'"' | b'$' | b'@' => {
                    if let Some(len) = string_literal_len(&s[i..]) {
                        i += len;
                        continue;
                    }
                }
                b'\'' => {
                    if let Some(len) = char_literal_len(&s[i..]) {
                        i += len;
                        continue;
                    }
                }
                _ => {}
            }
            i += 1;
            continue;
        }

        match b {
            b'"' if verbatim && bytes.get(i + 1) == Some(&b'"') => i += 2,
            b'"' => return Some(i + 1),
            b'\\' if !verbatim => i += 2,
            b'\n' if !verbatim => return None,
            b'{' if interpolated && bytes.get(i + 1) == Some(&b'{') => i += 2,
            b'{' if interpolated => {
                depth = 1;
                i += 1;
            }
            _ => i += 1,
        }
    }
    None
}

fn char_literal_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    if bytes.first() != Some(&b'\'') {
        return None;
    }
    let mut i = 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\'' => return Some(i + 1),
            b'\n' => return None,
            _ => i += 1,
        }
    }
    None
}
