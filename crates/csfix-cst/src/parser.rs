// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Recursive-descent parser for the declaration level of C#.
//!
//! The parser builds [`CompilationUnit`] trees from the token stream. It
//! understands using directives, namespaces (block and file-scoped), type
//! declarations and event declarations. Every other member (fields, methods,
//! properties, operators, top-level statements) is skipped as an opaque,
//! bracket-balanced token run and recorded only by its span.

use csfix_core::patch::Span;
use thiserror::Error;

use crate::nodes::{
    CompilationUnit, EventDecl, Ident, Member, NamedType, NamespaceDecl, NamespaceMember,
    TypeDecl, TypeKind, TypeSegment, TypeSyntax, UsingDirective, UsingKind,
};
use crate::tokenizer::{tokenize, Token, TokenKind, TokenizeError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParserError {
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),

    #[error("expected {expected} at byte {offset}, found '{found}'")]
    UnexpectedToken {
        expected: String,
        found: String,
        offset: usize,
    },

    #[error("unexpected end of file, expected {expected}")]
    UnexpectedEof { expected: String },
}

impl ParserError {
    /// Byte offset the error points at.
    pub fn offset(&self) -> Option<usize> {
        match self {
            ParserError::Tokenize(err) => Some(err.offset()),
            ParserError::UnexpectedToken { offset, .. } => Some(*offset),
            ParserError::UnexpectedEof { .. } => None,
        }
    }
}

/// A parsed source file: the text, its tokens and its tree.
#[derive(Debug, Clone)]
pub struct ParsedFile<'a> {
    pub source: &'a str,
    pub tokens: Vec<Token<'a>>,
    pub unit: CompilationUnit,
}

impl<'a> ParsedFile<'a> {
    /// Source text of a span. Empty if the span is not valid for this file.
    pub fn text(&self, span: Span) -> &'a str {
        self.source.get(span.start..span.end).unwrap_or("")
    }
}

/// Parse a file, keeping its tokens for position lookups.
pub fn parse_file(source: &str) -> Result<ParsedFile<'_>, ParserError> {
    let tokens = tokenize(source)?;
    let unit = Parser::new(&tokens, source.len()).parse_unit()?;
    tracing::debug!(
        tokens = tokens.len(),
        members = unit.members.len(),
        "parsed compilation unit"
    );
    Ok(ParsedFile {
        source,
        tokens,
        unit,
    })
}

/// Parse a file into its syntax tree.
pub fn parse_compilation_unit(source: &str) -> Result<CompilationUnit, ParserError> {
    parse_file(source).map(|parsed| parsed.unit)
}

// ============================================================================
// Parser
// ============================================================================

const MODIFIER_KEYWORDS: &[&str] = &[
    "public", "private", "protected", "internal", "static", "abstract", "sealed", "virtual",
    "override", "readonly", "unsafe", "extern", "new", "volatile", "const", "fixed", "ref",
];

/// Contextual keywords that act as modifiers when another word follows them.
const CONTEXTUAL_MODIFIERS: &[&str] = &["partial", "async", "file", "required", "scoped"];

const PREDEFINED_TYPES: &[&str] = &[
    "bool", "byte", "char", "decimal", "double", "float", "int", "long", "object", "sbyte",
    "short", "string", "uint", "ulong", "ushort", "void",
];

struct Parser<'t, 'a> {
    tokens: &'t [Token<'a>],
    pos: usize,
    source_len: usize,
}

impl<'t, 'a> Parser<'t, 'a> {
    fn new(tokens: &'t [Token<'a>], source_len: usize) -> Self {
        Parser {
            tokens,
            pos: 0,
            source_len,
        }
    }

    // ---- token cursor ----------------------------------------------------

    fn peek(&self) -> Token<'a> {
        self.peek_at(0)
    }

    /// Token `n` positions ahead; the trailing Eof repeats forever.
    fn peek_at(&self, n: usize) -> Token<'a> {
        let last = self.tokens.len().saturating_sub(1);
        match self.tokens.get((self.pos + n).min(last)) {
            Some(tok) => *tok,
            None => Token {
                kind: TokenKind::Eof,
                text: "",
                span: Span::empty(self.source_len),
            },
        }
    }

    fn bump(&mut self) -> Token<'a> {
        let tok = self.peek();
        if !tok.is_eof() {
            self.pos += 1;
        }
        tok
    }

    fn prev_end(&self) -> usize {
        match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some(tok) => tok.span.end,
            None => 0,
        }
    }

    fn eat_punct(&mut self, punct: &str) -> Option<Token<'a>> {
        if self.peek().is_punct(punct) {
            Some(self.bump())
        } else {
            None
        }
    }

    fn expect_punct(&mut self, punct: &str) -> Result<Token<'a>, ParserError> {
        self.eat_punct(punct)
            .ok_or_else(|| self.unexpected(&format!("'{}'", punct)))
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<Token<'a>, ParserError> {
        if self.peek().is_keyword(keyword) {
            Ok(self.bump())
        } else {
            Err(self.unexpected(&format!("'{}'", keyword)))
        }
    }

    fn expect_ident(&mut self) -> Result<Ident, ParserError> {
        let tok = self.peek();
        if tok.is_ident() {
            self.bump();
            Ok(Ident::new(tok.text, tok.span))
        } else {
            Err(self.unexpected("identifier"))
        }
    }

    fn unexpected(&self, expected: &str) -> ParserError {
        let tok = self.peek();
        if tok.is_eof() {
            ParserError::UnexpectedEof {
                expected: expected.to_string(),
            }
        } else {
            ParserError::UnexpectedToken {
                expected: expected.to_string(),
                found: tok.text.to_string(),
                offset: tok.span.start,
            }
        }
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(start, self.prev_end().max(start))
    }

    // ---- compilation unit and namespaces ---------------------------------

    fn parse_unit(&mut self) -> Result<CompilationUnit, ParserError> {
        let usings = self.parse_usings()?;
        let members = self.parse_namespace_members(false)?;
        Ok(CompilationUnit {
            usings,
            members,
            span: Span::new(0, self.source_len),
        })
    }

    fn at_using_directive(&self) -> bool {
        let (using_at, tok) = if self.peek().is_word("global") {
            (1, self.peek_at(1))
        } else {
            (0, self.peek())
        };
        if !tok.is_keyword("using") {
            return false;
        }
        let next = self.peek_at(using_at + 1);
        if next.is_word("static") {
            return true;
        }
        let after = self.peek_at(using_at + 2);
        next.is_ident()
            && (after.is_punct(".")
                || after.is_punct("=")
                || after.is_punct(";")
                || after.is_punct("::"))
    }

    fn parse_usings(&mut self) -> Result<Vec<UsingDirective>, ParserError> {
        let mut usings = Vec::new();
        loop {
            if self.peek().is_keyword("extern") && self.peek_at(1).is_word("alias") {
                self.skip_member()?;
                continue;
            }
            if !self.at_using_directive() {
                return Ok(usings);
            }
            usings.push(self.parse_using()?);
        }
    }

    fn parse_using(&mut self) -> Result<UsingDirective, ParserError> {
        let start = self.peek().span.start;
        let global = if self.peek().is_word("global") {
            self.bump();
            true
        } else {
            false
        };
        self.expect_keyword("using")?;

        let kind = if self.peek().is_word("static") {
            self.bump();
            UsingKind::Static(self.parse_type()?)
        } else if self.peek().is_ident() && self.peek_at(1).is_punct("=") {
            let alias = self.expect_ident()?;
            self.bump();
            UsingKind::Alias {
                alias,
                target: self.parse_type()?,
            }
        } else {
            UsingKind::Namespace(self.parse_dotted_name()?)
        };
        self.expect_punct(";")?;

        Ok(UsingDirective {
            kind,
            global,
            span: self.span_from(start),
        })
    }

    /// `A.B.C`, ignoring a leading `global::`.
    fn parse_dotted_name(&mut self) -> Result<Vec<Ident>, ParserError> {
        if self.peek().is_word("global") && self.peek_at(1).is_punct("::") {
            self.bump();
            self.bump();
        }
        let mut name = vec![self.expect_ident()?];
        while self.peek().is_punct(".") {
            self.bump();
            name.push(self.expect_ident()?);
        }
        Ok(name)
    }

    fn parse_namespace_members(
        &mut self,
        closed_by_brace: bool,
    ) -> Result<Vec<NamespaceMember>, ParserError> {
        let mut members = Vec::new();
        loop {
            let tok = self.peek();
            if tok.is_eof() {
                if closed_by_brace {
                    return Err(self.unexpected("'}'"));
                }
                return Ok(members);
            }
            if closed_by_brace && tok.is_punct("}") {
                return Ok(members);
            }
            members.push(self.parse_namespace_member()?);
        }
    }

    fn parse_namespace_member(&mut self) -> Result<NamespaceMember, ParserError> {
        let start_pos = self.pos;
        let start = self.peek().span.start;

        if self.at_global_attribute() {
            let span = self.skip_balanced("[", "]")?;
            return Ok(NamespaceMember::Other { span });
        }

        let attributes = self.parse_attributes()?;
        let modifiers = self.parse_modifiers();

        if self.peek().is_keyword("namespace") && attributes.is_empty() && modifiers.is_empty() {
            return Ok(NamespaceMember::Namespace(self.parse_namespace(start)?));
        }
        if let Some(kind) = self.type_keyword() {
            let decl = self.parse_type_decl(start, attributes, modifiers, kind)?;
            return Ok(NamespaceMember::Type(decl));
        }

        self.pos = start_pos;
        let span = self.skip_member()?;
        Ok(NamespaceMember::Other { span })
    }

    /// `[assembly: ...]` or `[module: ...]`.
    fn at_global_attribute(&self) -> bool {
        self.peek().is_punct("[")
            && (self.peek_at(1).is_word("assembly") || self.peek_at(1).is_word("module"))
            && self.peek_at(2).is_punct(":")
    }

    fn parse_namespace(&mut self, start: usize) -> Result<NamespaceDecl, ParserError> {
        self.expect_keyword("namespace")?;
        let name = self.parse_dotted_name()?;

        if self.eat_punct(";").is_some() {
            let body_start = self.prev_end();
            let usings = self.parse_usings()?;
            let members = self.parse_namespace_members(false)?;
            return Ok(NamespaceDecl {
                name,
                usings,
                members,
                file_scoped: true,
                body: Span::new(body_start, self.source_len),
                span: Span::new(start, self.source_len),
            });
        }

        let open = self.expect_punct("{")?;
        let usings = self.parse_usings()?;
        let members = self.parse_namespace_members(true)?;
        let close = self.expect_punct("}")?;
        self.eat_punct(";");

        Ok(NamespaceDecl {
            name,
            usings,
            members,
            file_scoped: false,
            body: Span::new(open.span.end, close.span.start),
            span: self.span_from(start),
        })
    }

    // ---- types ----------------------------------------------------------

    /// Type declaration keyword at the cursor, without consuming it.
    fn type_keyword(&self) -> Option<TypeKind> {
        let tok = self.peek();
        match tok.text {
            "class" if tok.kind == TokenKind::Keyword => Some(TypeKind::Class),
            "struct" if tok.kind == TokenKind::Keyword => Some(TypeKind::Struct),
            "interface" if tok.kind == TokenKind::Keyword => Some(TypeKind::Interface),
            "enum" if tok.kind == TokenKind::Keyword => Some(TypeKind::Enum),
            "delegate" if tok.kind == TokenKind::Keyword => Some(TypeKind::Delegate),
            "record" if tok.is_ident() => {
                let next = self.peek_at(1);
                if next.is_keyword("struct") {
                    Some(TypeKind::RecordStruct)
                } else if next.is_keyword("class") || next.is_ident() {
                    Some(TypeKind::Record)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    fn parse_modifiers(&mut self) -> Vec<Ident> {
        let mut modifiers = Vec::new();
        loop {
            let tok = self.peek();
            let is_modifier = (tok.kind == TokenKind::Keyword
                && MODIFIER_KEYWORDS.contains(&tok.text))
                || (tok.is_ident()
                    && CONTEXTUAL_MODIFIERS.contains(&tok.text)
                    && matches!(self.peek_at(1).kind, TokenKind::Ident | TokenKind::Keyword));
            if !is_modifier {
                return modifiers;
            }
            self.bump();
            modifiers.push(Ident::new(tok.text, tok.span));
        }
    }

    fn parse_attributes(&mut self) -> Result<Vec<Span>, ParserError> {
        let mut attributes = Vec::new();
        while self.peek().is_punct("[") {
            attributes.push(self.skip_balanced("[", "]")?);
        }
        Ok(attributes)
    }

    fn parse_type_decl(
        &mut self,
        start: usize,
        attributes: Vec<Span>,
        modifiers: Vec<Ident>,
        kind: TypeKind,
    ) -> Result<TypeDecl, ParserError> {
        self.bump();
        if matches!(kind, TypeKind::RecordStruct)
            || (kind == TypeKind::Record && self.peek().is_keyword("class"))
        {
            self.bump();
        }

        if kind == TypeKind::Delegate {
            self.parse_type()?;
            let name = self.expect_ident()?;
            let type_params = self.parse_type_params()?;
            self.skip_to_semicolon()?;
            return Ok(TypeDecl {
                kind,
                name,
                type_params,
                modifiers,
                attributes,
                members: Vec::new(),
                body: None,
                span: self.span_from(start),
            });
        }

        let name = self.expect_ident()?;
        let type_params = self.parse_type_params()?;
        if self.peek().is_punct("(") {
            self.skip_balanced("(", ")")?;
        }
        self.skip_type_header()?;

        let (members, body) = if self.eat_punct(";").is_some() {
            (Vec::new(), None)
        } else if kind == TypeKind::Enum {
            (Vec::new(), Some(self.skip_balanced("{", "}")?))
        } else {
            let open = self.expect_punct("{")?;
            let members = self.parse_type_members()?;
            let close = self.expect_punct("}")?;
            self.eat_punct(";");
            (members, Some(Span::new(open.span.start, close.span.end)))
        };

        Ok(TypeDecl {
            kind,
            name,
            type_params,
            modifiers,
            attributes,
            members,
            body,
            span: self.span_from(start),
        })
    }

    /// `<[attr] in T, out U, V>`
    fn parse_type_params(&mut self) -> Result<Vec<Ident>, ParserError> {
        let mut params = Vec::new();
        if self.eat_punct("<").is_none() {
            return Ok(params);
        }
        loop {
            self.parse_attributes()?;
            if self.peek().is_keyword("in") || self.peek().is_keyword("out") {
                self.bump();
            }
            params.push(self.expect_ident()?);
            if self.eat_punct(",").is_some() {
                continue;
            }
            self.expect_punct(">")?;
            return Ok(params);
        }
    }

    /// Skip a base list and constraint clauses up to the body `{` or a `;`.
    fn skip_type_header(&mut self) -> Result<(), ParserError> {
        let mut depth = 0usize;
        loop {
            let tok = self.peek();
            if tok.is_eof() {
                return Err(self.unexpected("'{'"));
            }
            if depth == 0 && (tok.is_punct("{") || tok.is_punct(";")) {
                return Ok(());
            }
            if depth == 0 && tok.is_punct("}") {
                return Err(self.unexpected("'{'"));
            }
            match tok.text {
                "(" | "[" if tok.kind == TokenKind::Punct => depth += 1,
                ")" | "]" if tok.kind == TokenKind::Punct => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.bump();
        }
    }

    fn parse_type_members(&mut self) -> Result<Vec<Member>, ParserError> {
        let mut members = Vec::new();
        loop {
            let tok = self.peek();
            if tok.is_punct("}") {
                return Ok(members);
            }
            if tok.is_eof() {
                return Err(self.unexpected("'}'"));
            }
            members.push(self.parse_member()?);
        }
    }

    fn parse_member(&mut self) -> Result<Member, ParserError> {
        let start_pos = self.pos;
        let start = self.peek().span.start;
        let attributes = self.parse_attributes()?;
        let modifiers = self.parse_modifiers();

        if self.peek().is_keyword("event") {
            return Ok(Member::Event(self.parse_event(start, attributes, modifiers)?));
        }
        if let Some(kind) = self.type_keyword() {
            return Ok(Member::Type(
                self.parse_type_decl(start, attributes, modifiers, kind)?,
            ));
        }

        self.pos = start_pos;
        let span = self.skip_member()?;
        Ok(Member::Other { span })
    }

    fn parse_event(
        &mut self,
        start: usize,
        attributes: Vec<Span>,
        modifiers: Vec<Ident>,
    ) -> Result<EventDecl, ParserError> {
        let event_keyword = self.expect_keyword("event")?.span;
        let ty = self.parse_type()?;

        // `Name`, or `IFoo<T>.Name` for explicit interface implementations.
        let interface_start = self.peek().span.start;
        let mut interface_end = interface_start;
        let mut interface_segments = Vec::new();
        let first = loop {
            let name = self.expect_ident()?;
            let type_args = if self.peek().is_punct("<") {
                self.parse_type_args()?
            } else {
                Vec::new()
            };
            if self.peek().is_punct(".") && self.peek_at(1).is_ident() {
                interface_segments.push(TypeSegment { name, type_args });
                interface_end = self.prev_end();
                self.bump();
                continue;
            }
            if !type_args.is_empty() {
                return Err(self.unexpected("event name"));
            }
            break name;
        };
        let explicit_interface = if interface_segments.is_empty() {
            None
        } else {
            Some(TypeSyntax::Named(NamedType {
                qualifier: None,
                segments: interface_segments,
                span: Span::new(interface_start, interface_end),
            }))
        };

        let mut declarators = vec![first];
        let mut accessors = None;

        if self.peek().is_punct("{") {
            accessors = Some(self.skip_balanced("{", "}")?);
        } else {
            loop {
                if self.eat_punct("=").is_some() {
                    self.skip_initializer()?;
                }
                if self.eat_punct(",").is_some() {
                    declarators.push(self.expect_ident()?);
                    continue;
                }
                self.expect_punct(";")?;
                break;
            }
        }

        Ok(EventDecl {
            attributes,
            modifiers,
            event_keyword,
            ty,
            explicit_interface,
            declarators,
            accessors,
            span: self.span_from(start),
        })
    }

    // ---- type references -------------------------------------------------

    fn parse_type(&mut self) -> Result<TypeSyntax, ParserError> {
        let start = self.peek().span.start;
        let mut ty = self.parse_non_array_type()?;
        loop {
            if self.eat_punct("?").is_some() {
                ty = TypeSyntax::Nullable {
                    inner: Box::new(ty),
                    span: self.span_from(start),
                };
            } else if self.eat_punct("*").is_some() {
                ty = TypeSyntax::Pointer {
                    inner: Box::new(ty),
                    span: self.span_from(start),
                };
            } else if self.peek().is_punct("[")
                && (self.peek_at(1).is_punct("]") || self.peek_at(1).is_punct(","))
            {
                self.bump();
                let mut rank = 1;
                while self.eat_punct(",").is_some() {
                    rank += 1;
                }
                self.expect_punct("]")?;
                ty = TypeSyntax::Array {
                    element: Box::new(ty),
                    rank,
                    span: self.span_from(start),
                };
            } else {
                return Ok(ty);
            }
        }
    }

    fn parse_non_array_type(&mut self) -> Result<TypeSyntax, ParserError> {
        let tok = self.peek();
        if tok.is_punct("(") {
            let start = tok.span.start;
            self.bump();
            let mut elements = Vec::new();
            loop {
                elements.push(self.parse_type()?);
                if self.peek().is_ident() {
                    self.bump();
                }
                if self.eat_punct(",").is_some() {
                    continue;
                }
                self.expect_punct(")")?;
                break;
            }
            return Ok(TypeSyntax::Tuple {
                elements,
                span: self.span_from(start),
            });
        }
        if tok.kind == TokenKind::Keyword && PREDEFINED_TYPES.contains(&tok.text) {
            self.bump();
            return Ok(TypeSyntax::Predefined(Ident::new(tok.text, tok.span)));
        }
        if tok.is_ident() {
            return Ok(TypeSyntax::Named(self.parse_named_type()?));
        }
        Err(self.unexpected("type"))
    }

    fn parse_named_type(&mut self) -> Result<NamedType, ParserError> {
        let start = self.peek().span.start;
        let qualifier = if self.peek().is_ident() && self.peek_at(1).is_punct("::") {
            let qualifier = self.expect_ident()?;
            self.bump();
            Some(qualifier)
        } else {
            None
        };

        let mut segments = Vec::new();
        loop {
            let name = self.expect_ident()?;
            let type_args = if self.peek().is_punct("<") {
                self.parse_type_args()?
            } else {
                Vec::new()
            };
            segments.push(TypeSegment { name, type_args });
            if self.peek().is_punct(".") && self.peek_at(1).is_ident() {
                self.bump();
                continue;
            }
            break;
        }

        Ok(NamedType {
            qualifier,
            segments,
            span: self.span_from(start),
        })
    }

    fn parse_type_args(&mut self) -> Result<Vec<TypeSyntax>, ParserError> {
        self.expect_punct("<")?;
        let mut args = Vec::new();
        loop {
            args.push(self.parse_type()?);
            if self.eat_punct(",").is_some() {
                continue;
            }
            self.expect_punct(">")?;
            return Ok(args);
        }
    }

    // ---- opaque skipping ---------------------------------------------------

    /// Skip from an opening bracket to its matching closer, returning the span.
    fn skip_balanced(&mut self, open: &str, close: &str) -> Result<Span, ParserError> {
        let start = self.expect_punct(open)?.span.start;
        let mut depth = 1usize;
        while depth > 0 {
            let tok = self.peek();
            if tok.is_eof() {
                return Err(self.unexpected(&format!("'{}'", close)));
            }
            if tok.is_punct(open) {
                depth += 1;
            } else if tok.is_punct(close) {
                depth -= 1;
            }
            self.bump();
        }
        Ok(self.span_from(start))
    }

    fn skip_to_semicolon(&mut self) -> Result<(), ParserError> {
        loop {
            let tok = self.peek();
            if tok.is_eof() || tok.is_punct("}") {
                return Err(self.unexpected("';'"));
            }
            if tok.is_punct("{") {
                self.skip_balanced("{", "}")?;
                continue;
            }
            self.bump();
            if tok.is_punct(";") {
                return Ok(());
            }
        }
    }

    /// Skip an event initializer up to (not including) the next `,` or `;` at depth 0.
    fn skip_initializer(&mut self) -> Result<(), ParserError> {
        let mut depth = 0usize;
        loop {
            let tok = self.peek();
            if tok.is_eof() {
                return Err(self.unexpected("';'"));
            }
            if depth == 0 && (tok.is_punct(",") || tok.is_punct(";")) {
                return Ok(());
            }
            if tok.kind == TokenKind::Punct {
                match tok.text {
                    "(" | "[" | "{" => depth += 1,
                    ")" | "]" | "}" => {
                        if depth == 0 {
                            return Err(self.unexpected("';'"));
                        }
                        depth -= 1;
                    }
                    _ => {}
                }
            }
            self.bump();
        }
    }

    /// Skip one opaque member and return its span.
    ///
    /// A member ends at a `;` outside brackets, or after a top-level `{ ... }`
    /// block that is not part of an initializer or expression body. A block
    /// followed by `=` is a property with an initializer and continues to its
    /// `;`. A `}` that closes the enclosing body ends the member without being
    /// consumed. At least one token is always consumed.
    fn skip_member(&mut self) -> Result<Span, ParserError> {
        let start_pos = self.pos;
        let start = self.peek().span.start;
        let mut depth = 0usize;
        let mut saw_assign = false;

        loop {
            let tok = self.peek();
            if tok.is_eof() {
                break;
            }
            if tok.kind == TokenKind::Punct {
                match tok.text {
                    "(" | "[" => depth += 1,
                    ")" | "]" => depth = depth.saturating_sub(1),
                    ";" if depth == 0 => {
                        self.bump();
                        break;
                    }
                    "}" => {
                        if self.pos == start_pos {
                            self.bump();
                        }
                        break;
                    }
                    "=" | "=>" if depth == 0 => saw_assign = true,
                    "{" => {
                        self.skip_balanced("{", "}")?;
                        if depth == 0 && !saw_assign {
                            if self.peek().is_punct("=") {
                                continue;
                            }
                            break;
                        }
                        continue;
                    }
                    _ => {}
                }
            }
            self.bump();
        }

        Ok(self.span_from(start))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> CompilationUnit {
        parse_compilation_unit(source).unwrap()
    }

    fn only_type(unit: &CompilationUnit) -> &TypeDecl {
        let types: Vec<_> = unit.types().collect();
        assert_eq!(types.len(), 1, "expected exactly one top-level type");
        types[0]
    }

    #[test]
    fn parses_field_like_event() {
        let source = "class TestClass\n{\n\tevent MyEventHandler evt;\n}\n";
        let unit = parse(source);
        let class = only_type(&unit);
        assert_eq!(class.kind, TypeKind::Class);
        assert_eq!(class.name.text, "TestClass");
        assert_eq!(class.span, Span::new(0, source.len() - 1));

        let events: Vec<_> = class.events().collect();
        assert_eq!(events.len(), 1);
        let event = events[0];
        assert!(event.is_field_like());
        assert_eq!(&source[event.event_keyword.start..event.event_keyword.end], "event");
        assert_eq!(&source[event.ty.span().start..event.ty.span().end], "MyEventHandler");
        assert_eq!(event.declarators[0].text, "evt");
        assert_eq!(&source[event.span.start..event.span.end], "event MyEventHandler evt;");
    }

    #[test]
    fn parses_accessor_event() {
        let source = "interface TestClass\n{\n    public event EventHandler MouseUp\n    {\n        add { AddEventHandler(mouseUpEventKey, value); }\n        remove { RemoveEventHandler(mouseUpEventKey, value); }\n    }\n}\n";
        let unit = parse(source);
        let iface = only_type(&unit);
        assert_eq!(iface.kind, TypeKind::Interface);
        let event = iface.events().next().unwrap();
        assert!(!event.is_field_like());
        assert!(event.has_modifier("public"));
        assert_eq!(event.declarators[0].text, "MouseUp");
    }

    #[test]
    fn parses_multiple_declarators_and_initializers() {
        let unit = parse("class A { event Handler a = null, b = delegate { }, c; }");
        let event = only_type(&unit).events().next().unwrap();
        let names: Vec<_> = event.declarators.iter().map(|d| d.text.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(event.is_field_like());
    }

    #[test]
    fn parses_generic_event_type() {
        let unit = parse("class A { event EventHandler<List<AssemblyLoadEventArgs>> evt; }");
        let event = only_type(&unit).events().next().unwrap();
        let named = event.ty.as_named().unwrap();
        assert!(named.is_simple());
        assert_eq!(named.last().name.text, "EventHandler");
        assert_eq!(named.last().type_args.len(), 1);
    }

    #[test]
    fn parses_explicit_interface_event() {
        let unit = parse("class A : IFoo { event Handler IFoo.Changed { add { } remove { } } }");
        let event = only_type(&unit).events().next().unwrap();
        assert_eq!(event.declarators[0].text, "Changed");
        assert!(event.explicit_interface.is_some());
        assert!(!event.is_field_like());
    }

    #[test]
    fn opaque_members_are_skipped() {
        let source = r#"
public partial class Widget<T> : Base<T>, IWidget where T : class, new()
{
    private int _count = 0;
    public string Name { get; set; } = "x";
    public int Count => _count;
    public Widget(int x) : base(x) { if (x > 0) { _count = x; } }
    public event Handler Changed;
    public T this[int i] { get { return default; } }
    public static Widget<T> operator +(Widget<T> a, Widget<T> b) => a;
    private Func<int> _f = () => { return 1; };
    [Obsolete("no")] void M() { var s = "}"; }
}
"#;
        let unit = parse(source);
        let class = only_type(&unit);
        assert_eq!(class.type_params.len(), 1);
        assert!(class.has_modifier("partial"));
        assert_eq!(class.members.len(), 9);
        assert_eq!(class.events().count(), 1);
        assert!(matches!(class.members[4], Member::Event(_)));
    }

    #[test]
    fn parses_namespaces_and_usings() {
        let source = "using System;\nusing IO = System.IO;\nglobal using static System.Math;\n\nnamespace A.B\n{\n    using System.Text;\n    class C { }\n    namespace D { struct E { } }\n}\n";
        let unit = parse(source);
        assert_eq!(unit.usings.len(), 3);
        assert!(matches!(unit.usings[1].kind, UsingKind::Alias { .. }));
        assert!(unit.usings[2].global);

        let NamespaceMember::Namespace(ns) = &unit.members[0] else {
            panic!("expected namespace");
        };
        assert_eq!(ns.dotted_name(), "A.B");
        assert!(!ns.file_scoped);
        assert_eq!(ns.usings.len(), 1);
        assert_eq!(ns.members.len(), 2);
        assert!(source[ns.body.start..ns.body.end].starts_with("\n    using"));
    }

    #[test]
    fn parses_file_scoped_namespace() {
        let source = "namespace Foo;\n\nclass A { event H e; }\n";
        let unit = parse(source);
        let NamespaceMember::Namespace(ns) = &unit.members[0] else {
            panic!("expected namespace");
        };
        assert!(ns.file_scoped);
        assert_eq!(ns.body.end, source.len());
        assert_eq!(ns.members.len(), 1);
    }

    #[test]
    fn parses_delegates_records_and_enums() {
        let source = "delegate void MyEventHandler(object sender, System.EventArgs e);\npublic delegate T Factory<out T>();\nrecord R(int X);\npublic record struct P(int A) { }\nenum Color { Red = 1, Green }\n";
        let unit = parse(source);
        let kinds: Vec<_> = unit.types().map(|t| (t.kind, t.name.text.as_str(), t.arity())).collect();
        assert_eq!(
            kinds,
            vec![
                (TypeKind::Delegate, "MyEventHandler", 0),
                (TypeKind::Delegate, "Factory", 1),
                (TypeKind::Record, "R", 0),
                (TypeKind::RecordStruct, "P", 0),
                (TypeKind::Enum, "Color", 0),
            ]
        );
    }

    #[test]
    fn type_span_includes_attributes() {
        let source = "[Serializable]\n[Foo(typeof(int[]))]\npublic class A { }";
        let unit = parse(source);
        let class = only_type(&unit);
        assert_eq!(class.attributes.len(), 2);
        assert_eq!(class.span.start, 0);
    }

    #[test]
    fn assembly_attributes_are_opaque() {
        let unit = parse("[assembly: InternalsVisibleTo(\"X\")]\nclass A { }\n");
        assert_eq!(unit.members.len(), 2);
        assert!(matches!(unit.members[0], NamespaceMember::Other { .. }));
        assert!(matches!(unit.members[1], NamespaceMember::Type(_)));
    }

    #[test]
    fn top_level_statements_are_opaque() {
        let unit = parse("using System;\nConsole.WriteLine(\"hi\");\nusing var x = Open();\nclass A { }\n");
        assert_eq!(unit.usings.len(), 1);
        assert_eq!(unit.members.len(), 3);
        assert_eq!(unit.types().count(), 1);
    }

    #[test]
    fn nested_types_are_parsed() {
        let unit = parse("class Outer { public class Inner { event H e; } private int x; }");
        let outer = only_type(&unit);
        let inner = outer.nested_types().next().unwrap();
        assert_eq!(inner.name.text, "Inner");
        assert_eq!(inner.events().count(), 1);
    }

    #[test]
    fn type_syntax_variants() {
        let unit = parse("class A { event H? a; event H[,] b; event (int, string s) c; event global::X.Y d; }");
        let events: Vec<_> = only_type(&unit).events().collect();
        assert!(matches!(events[0].ty, TypeSyntax::Nullable { .. }));
        assert!(matches!(events[1].ty, TypeSyntax::Array { rank: 2, .. }));
        assert!(matches!(events[2].ty, TypeSyntax::Tuple { .. }));
        let named = events[3].ty.as_named().unwrap();
        assert_eq!(named.qualifier.as_ref().unwrap().text, "global");
        assert_eq!(named.segments.len(), 2);
        assert!(!named.is_simple());
    }

    #[test]
    fn unbalanced_braces_are_errors() {
        assert!(matches!(
            parse_compilation_unit("namespace foo { class A { event H e; }"),
            Err(ParserError::UnexpectedEof { .. })
        ));
        assert!(parse_compilation_unit("class A { event H; }").is_err());
    }

    #[test]
    fn tokenize_errors_surface() {
        let err = parse_compilation_unit("class A { string s = \"open; }").unwrap_err();
        assert!(matches!(err, ParserError::Tokenize(_)));
        assert_eq!(err.offset(), Some(21));
    }
}
