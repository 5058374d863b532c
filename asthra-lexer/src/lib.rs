use logos::Logos;

/// Internal lexical failure kind, attached to a byte span by the public
/// `Lexer` wrapper.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ErrorKind {
    #[default]
    InvalidToken,
    InvalidNumber(String),
    UnterminatedString,
    InvalidEscape(char),
    StrayCommentClose,
}

/// Lexical error with source span
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexError {
    #[error("invalid token")]
    InvalidToken { span: std::ops::Range<usize> },
    #[error("invalid numeric literal: {message}")]
    InvalidNumber {
        message: String,
        span: std::ops::Range<usize>,
    },
    #[error("unterminated string literal")]
    UnterminatedString { span: std::ops::Range<usize> },
    #[error("invalid escape sequence `\\{escape}`")]
    InvalidEscape {
        escape: char,
        span: std::ops::Range<usize>,
    },
    #[error("unexpected `*/` outside of a block comment")]
    StrayCommentClose { span: std::ops::Range<usize> },
}

impl LexError {
    pub fn span(&self) -> std::ops::Range<usize> {
        match self {
            LexError::InvalidToken { span }
            | LexError::InvalidNumber { span, .. }
            | LexError::UnterminatedString { span }
            | LexError::InvalidEscape { span, .. }
            | LexError::StrayCommentClose { span } => span.clone(),
        }
    }

    fn from_kind(kind: ErrorKind, span: std::ops::Range<usize>) -> Self {
        match kind {
            ErrorKind::InvalidToken => LexError::InvalidToken { span },
            ErrorKind::InvalidNumber(message) => LexError::InvalidNumber { message, span },
            ErrorKind::UnterminatedString => LexError::UnterminatedString { span },
            ErrorKind::InvalidEscape(escape) => LexError::InvalidEscape { escape, span },
            ErrorKind::StrayCommentClose => LexError::StrayCommentClose { span },
        }
    }
}

fn unescape_char(c: char) -> Option<char> {
    match c {
        'n' => Some('\n'),
        't' => Some('\t'),
        'r' => Some('\r'),
        '\\' => Some('\\'),
        '\'' => Some('\''),
        '"' => Some('"'),
        '0' => Some('\0'),
        '{' => Some('{'),
        '}' => Some('}'),
        _ => None,
    }
}

/// Lex a base-prefixed literal (`0x…`, `0b…`, `0o…`). The broad regexes
/// swallow any alphanumeric/dot tail so that `0xG`, `0b2`, `0o8` and
/// `0x.5` surface as a single invalid-number error, not two tokens.
fn lex_radix(lex: &mut logos::Lexer<Token>, radix: u32) -> Result<i64, ErrorKind> {
    let slice = lex.slice();
    let digits = &slice[2..];

    if digits.is_empty() {
        return Err(ErrorKind::InvalidNumber(format!(
            "missing digits after `{}`",
            &slice[..2]
        )));
    }
    if let Some(bad) = digits.chars().find(|c| !c.is_digit(radix)) {
        return Err(ErrorKind::InvalidNumber(format!(
            "invalid digit `{}` for base {}",
            bad, radix
        )));
    }

    i64::from_str_radix(digits, radix)
        .map_err(|_| ErrorKind::InvalidNumber(format!("literal `{}` out of range", slice)))
}

fn lex_decimal(lex: &mut logos::Lexer<Token>) -> Result<i64, ErrorKind> {
    lex.slice()
        .parse()
        .map_err(|_| ErrorKind::InvalidNumber(format!("literal `{}` out of range", lex.slice())))
}

/// Single-line string with escape processing. Consumes the remainder up to
/// the closing quote; a newline before the closing quote is unterminated.
fn lex_string(lex: &mut logos::Lexer<Token>) -> Result<String, ErrorKind> {
    let rem = lex.remainder();
    let mut out = String::new();
    let mut chars = rem.char_indices();

    while let Some((i, c)) = chars.next() {
        match c {
            '"' => {
                lex.bump(i + 1);
                return Ok(out);
            }
            '\n' => break,
            '\\' => match chars.next() {
                Some((j, esc)) => match unescape_char(esc) {
                    Some(ch) => out.push(ch),
                    None => {
                        lex.bump(j + esc.len_utf8());
                        return Err(ErrorKind::InvalidEscape(esc));
                    }
                },
                None => break,
            },
            _ => out.push(c),
        }
    }

    lex.bump(rem.len());
    Err(ErrorKind::UnterminatedString)
}

/// Multi-line string `"""…"""` with escape processing. Scans for an
/// unescaped closing triple-quote across newlines.
fn lex_multiline_string(lex: &mut logos::Lexer<Token>) -> Result<String, ErrorKind> {
    let rem = lex.remainder();
    let mut out = String::new();
    let mut chars = rem.char_indices();

    while let Some((i, c)) = chars.next() {
        match c {
            '"' if rem[i..].starts_with("\"\"\"") => {
                lex.bump(i + 3);
                return Ok(out);
            }
            '\\' => match chars.next() {
                Some((j, esc)) => match unescape_char(esc) {
                    Some(ch) => out.push(ch),
                    None => {
                        lex.bump(j + esc.len_utf8());
                        return Err(ErrorKind::InvalidEscape(esc));
                    }
                },
                None => break,
            },
            _ => out.push(c),
        }
    }

    lex.bump(rem.len());
    Err(ErrorKind::UnterminatedString)
}

/// Raw multi-line string `r"""…"""`: no escape processing at all.
fn lex_raw_string(lex: &mut logos::Lexer<Token>) -> Result<String, ErrorKind> {
    let rem = lex.remainder();
    match rem.find("\"\"\"") {
        Some(end) => {
            let body = rem[..end].to_string();
            lex.bump(end + 3);
            Ok(body)
        }
        None => {
            lex.bump(rem.len());
            Err(ErrorKind::UnterminatedString)
        }
    }
}

/// Char literal: one character or escape between single quotes.
fn lex_char_literal(lex: &mut logos::Lexer<Token>) -> Result<char, ErrorKind> {
    let rem = lex.remainder();
    let mut chars = rem.chars();

    let first = match chars.next() {
        Some(c) => c,
        None => return Err(ErrorKind::UnterminatedString),
    };

    let (value, consumed) = if first == '\\' {
        let esc = match chars.next() {
            Some(c) => c,
            None => {
                lex.bump(1);
                return Err(ErrorKind::UnterminatedString);
            }
        };
        match unescape_char(esc) {
            Some(ch) => (ch, 1 + esc.len_utf8()),
            None => {
                lex.bump(1 + esc.len_utf8());
                return Err(ErrorKind::InvalidEscape(esc));
            }
        }
    } else if first == '\'' {
        lex.bump(1);
        return Err(ErrorKind::InvalidToken);
    } else {
        (first, first.len_utf8())
    };

    if rem[consumed..].starts_with('\'') {
        lex.bump(consumed + 1);
        Ok(value)
    } else {
        lex.bump(consumed);
        Err(ErrorKind::UnterminatedString)
    }
}

fn lex_stray_comment_close(_lex: &mut logos::Lexer<Token>) -> Result<(), ErrorKind> {
    Err(ErrorKind::StrayCommentClose)
}

/// Token types for the Asthra programming language
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(error = ErrorKind)]
pub enum Token {
    // Keywords
    #[token("fn")]
    Fn,
    #[token("let")]
    Let,
    #[token("mut")]
    Mut,
    #[token("const")]
    Const,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("match")]
    Match,
    #[token("return")]
    Return,
    #[token("struct")]
    Struct,
    #[token("enum")]
    Enum,
    #[token("impl")]
    Impl,
    #[token("pub")]
    Pub,
    #[token("priv")]
    Priv,
    #[token("extern")]
    Extern,
    #[token("spawn")]
    Spawn,
    #[token("spawn_with_handle")]
    SpawnWithHandle,
    #[token("unsafe")]
    Unsafe,
    #[token("await")]
    Await,
    #[token("for")]
    For,
    #[token("in")]
    In,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("sizeof")]
    Sizeof,
    #[token("package")]
    Package,
    #[token("import")]
    Import,
    #[token("as")]
    As,
    #[token("self")]
    SelfKw,
    #[token("Result")]
    ResultKw,
    #[token("Option")]
    OptionKw,
    #[token("TaskHandle")]
    TaskHandleKw,
    #[token("true")]
    True,
    #[token("false")]
    False,

    // Primitive type keywords
    #[token("i8")]
    I8,
    #[token("i16")]
    I16,
    #[token("i32")]
    I32,
    #[token("i64")]
    I64,
    #[token("i128")]
    I128,
    #[token("u8")]
    U8,
    #[token("u16")]
    U16,
    #[token("u32")]
    U32,
    #[token("u64")]
    U64,
    #[token("u128")]
    U128,
    #[token("f32")]
    F32,
    #[token("f64")]
    F64,
    #[token("bool")]
    Bool,
    #[token("char")]
    Char,
    #[token("string")]
    String,
    #[token("void")]
    Void,
    #[token("usize")]
    Usize,
    #[token("isize")]
    Isize,
    #[token("Never")]
    Never,
    #[token("int")]
    Int,
    #[token("float")]
    Float,

    // Multi-character operators (before single-character fallbacks)
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("->")]
    Arrow,
    #[token("=>")]
    FatArrow,
    #[token("<<")]
    LShift,
    #[token(">>")]
    RShift,
    #[token("::")]
    DoubleColon,
    #[token("...")]
    DotDotDot,
    #[token("..")]
    DotDot,

    // Stray comment close is always a lexical error
    #[token("*/", lex_stray_comment_close)]
    StarSlash,

    // Single-character operators and delimiters
    #[token("=")]
    Eq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("!")]
    Not,
    #[token("&")]
    Ampersand,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,
    #[token("#")]
    Hash,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,

    // Literals. Base-prefixed forms use broad regexes so that an invalid
    // digit (or `.`) directly after the prefix body is one error token.
    #[regex(r"0[xX][0-9a-zA-Z.]*", |lex| lex_radix(lex, 16))]
    #[regex(r"0[bB][0-9a-zA-Z.]*", |lex| lex_radix(lex, 2))]
    #[regex(r"0o[0-9a-zA-Z.]*", |lex| lex_radix(lex, 8))]
    #[regex(r"[0-9]+", lex_decimal, priority = 3)]
    IntLiteral(i64),

    // Float literal with optional scientific notation: 3.14, 1.5e10, 2e-5
    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse().ok())]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().parse().ok())]
    FloatLiteral(f64),

    #[token("\"\"\"", lex_multiline_string)]
    #[token("r\"\"\"", lex_raw_string)]
    #[token("\"", lex_string)]
    StringLiteral(std::string::String),

    #[token("'", lex_char_literal)]
    CharLiteral(char),

    // Identifiers - after keywords so the keyword table wins
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Ident(std::string::String),

    // Underscore wildcard - higher priority than Ident
    #[token("_", priority = 10)]
    Underscore,

    // Comments (skip)
    #[regex(r"//[^\n]*", logos::skip)]
    LineComment,
    #[regex(r"/\*([^*]|\*[^/])*\*/", logos::skip)]
    BlockComment,

    /// An embedded NUL byte ends the token stream, C-style. The parser
    /// also appends one Eof sentinel at the end of its token vector.
    #[token("\0")]
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenSpan {
    pub token: Token,
    pub span: std::ops::Range<usize>,
}

/// Token stream over a source buffer.
///
/// Beyond the raw logos stream this layer resolves the one context-sensitive
/// decision the grammar demands: a `.` immediately followed by a digit is a
/// float literal (`.5`, `.5e3`) unless the preceding non-whitespace
/// character could end an expression, in which case the dot introduces
/// tuple-element access (`pair.0`, and `pair.0.1` stays DOT + FLOAT for the
/// parser to expand).
pub struct Lexer<'source> {
    inner: logos::Lexer<'source, Token>,
    source: &'source str,
    prev_ends_expr: bool,
}

/// Could a token ending in this character terminate an expression?
fn ends_expression(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == ')' || c == ']' || c == '}'
}

/// Length of a valid exponent body (`[eE][+-]?[0-9]+`) at the start of
/// `rest`, if present.
fn exponent_len(rest: &str) -> Option<usize> {
    let mut chars = rest.chars();
    match chars.next() {
        Some('e') | Some('E') => {}
        _ => return None,
    }
    let mut len = 1;
    let mut digits = 0;
    for c in chars {
        match c {
            '+' | '-' if len == 1 => len += 1,
            '0'..='9' => {
                len += 1;
                digits += 1;
            }
            _ => break,
        }
    }
    if digits > 0 {
        Some(len)
    } else {
        None
    }
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source str) -> Self {
        Self {
            inner: Token::lexer(source),
            source,
            prev_ends_expr: false,
        }
    }

    /// Merge the pending `.` with the following numeric tokens into one
    /// float. `target_end` is the byte offset one past the literal.
    fn merge_float(
        &mut self,
        dot_span: std::ops::Range<usize>,
        target_end: usize,
    ) -> Result<TokenSpan, LexError> {
        while self.inner.span().end < target_end {
            match self.inner.next() {
                Some(Ok(_)) => {}
                Some(Err(kind)) => {
                    return Err(LexError::from_kind(kind, self.inner.span()));
                }
                None => break,
            }
        }

        let span = dot_span.start..self.inner.span().end.max(target_end);
        let slice = &self.source[span.clone()];

        // ".5e3" → "0.5e3"; ".e5" has no fraction, so drop the dot: "0e5"
        let normalized = if slice[1..].starts_with(|c: char| c.is_ascii_digit()) {
            format!("0{}", slice)
        } else {
            format!("0{}", &slice[1..])
        };

        match normalized.parse::<f64>() {
            Ok(value) => Ok(TokenSpan {
                token: Token::FloatLiteral(value),
                span,
            }),
            Err(_) => Err(LexError::InvalidNumber {
                message: format!("malformed float literal `{}`", slice),
                span,
            }),
        }
    }
}

impl<'source> Iterator for Lexer<'source> {
    type Item = Result<TokenSpan, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.inner.next()?;
        let span = self.inner.span();

        let result = match token {
            Ok(Token::Dot) if !self.prev_ends_expr => {
                let rest = &self.source[span.end..];
                if rest.starts_with(|c: char| c.is_ascii_digit()) {
                    // Consume the numeric token the digits produced and
                    // re-read the combined slice as one float.
                    match self.inner.next() {
                        Some(Ok(_)) => self.merge_float(span, self.inner.span().end),
                        Some(Err(kind)) => Err(LexError::from_kind(kind, self.inner.span())),
                        None => Err(LexError::InvalidToken { span }),
                    }
                } else if let Some(len) = exponent_len(rest).filter(|&l| {
                    !rest[l..].starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_')
                }) {
                    self.merge_float(span.clone(), span.end + len)
                } else {
                    Ok(TokenSpan {
                        token: Token::Dot,
                        span,
                    })
                }
            }
            Ok(token) => Ok(TokenSpan { token, span }),
            Err(kind) => Err(LexError::from_kind(kind, span)),
        };

        self.prev_ends_expr = match &result {
            Ok(ts) => self.source[..ts.span.end]
                .chars()
                .next_back()
                .is_some_and(ends_expression),
            Err(_) => false,
        };

        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token> {
        Lexer::new(source)
            .map(|r| r.expect("lex failure").token)
            .collect()
    }

    #[test]
    fn test_keywords() {
        let source = "fn let mut struct enum impl spawn spawn_with_handle unsafe await";
        assert_eq!(
            tokens(source),
            vec![
                Token::Fn,
                Token::Let,
                Token::Mut,
                Token::Struct,
                Token::Enum,
                Token::Impl,
                Token::Spawn,
                Token::SpawnWithHandle,
                Token::Unsafe,
                Token::Await,
            ]
        );
    }

    #[test]
    fn test_type_keywords_never_identifiers() {
        for kw in ["i32", "u128", "usize", "isize", "Never", "int", "float"] {
            let toks = tokens(kw);
            assert_eq!(toks.len(), 1);
            assert!(
                !matches!(toks[0], Token::Ident(_)),
                "`{}` lexed as identifier",
                kw
            );
        }
    }

    #[test]
    fn test_numeric_bases() {
        assert_eq!(
            tokens("0x1A 0b101 0o17 42"),
            vec![
                Token::IntLiteral(26),
                Token::IntLiteral(5),
                Token::IntLiteral(15),
                Token::IntLiteral(42),
            ]
        );
    }

    #[test]
    fn test_invalid_base_digits() {
        for bad in ["0xG", "0b2", "0o8", "0x.5", "0x"] {
            let result: Vec<_> = Lexer::new(bad).collect();
            assert!(
                matches!(result[0], Err(LexError::InvalidNumber { .. })),
                "`{}` should be an invalid number, got {:?}",
                bad,
                result[0]
            );
        }
    }

    #[test]
    fn test_float_forms() {
        assert_eq!(
            tokens("3.14 1.5e10 2e-5"),
            vec![
                Token::FloatLiteral(3.14),
                Token::FloatLiteral(1.5e10),
                Token::FloatLiteral(2e-5),
            ]
        );
    }

    #[test]
    fn test_leading_dot_float() {
        // After `=` the dot cannot close an expression, so `.5` is a float.
        assert_eq!(
            tokens("let x: f64 = .5;"),
            vec![
                Token::Let,
                Token::Ident("x".to_string()),
                Token::Colon,
                Token::F64,
                Token::Eq,
                Token::FloatLiteral(0.5),
                Token::Semicolon,
            ]
        );
        assert_eq!(tokens("= .5e3")[1], Token::FloatLiteral(500.0));
        assert_eq!(tokens("= .e5")[1], Token::FloatLiteral(0.0));
    }

    #[test]
    fn test_tuple_index_stays_dot() {
        // `pair.0` — identifier before the dot, so DOT + INT
        assert_eq!(
            tokens("pair.0"),
            vec![
                Token::Ident("pair".to_string()),
                Token::Dot,
                Token::IntLiteral(0),
            ]
        );
        // chained `pair.0.1` — maximal munch makes the tail one float
        assert_eq!(
            tokens("pair.0.1"),
            vec![
                Token::Ident("pair".to_string()),
                Token::Dot,
                Token::FloatLiteral(0.1),
            ]
        );
        // `).0` and `].0` also keep the dot
        assert_eq!(
            tokens("f(x).0")[4..],
            [Token::Dot, Token::IntLiteral(0)]
        );
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            tokens(r#""hello\n\t\"quoted\"""#),
            vec![Token::StringLiteral("hello\n\t\"quoted\"".to_string())]
        );
        assert_eq!(
            tokens("\"\"\"multi\nline\"\"\""),
            vec![Token::StringLiteral("multi\nline".to_string())]
        );
        assert_eq!(
            tokens("r\"\"\"no \\n escapes\"\"\""),
            vec![Token::StringLiteral("no \\n escapes".to_string())]
        );
    }

    #[test]
    fn test_string_errors() {
        let result: Vec<_> = Lexer::new("\"abc").collect();
        assert!(matches!(
            result[0],
            Err(LexError::UnterminatedString { .. })
        ));

        let result: Vec<_> = Lexer::new(r#""bad \q escape""#).collect();
        assert!(matches!(
            result[0],
            Err(LexError::InvalidEscape { escape: 'q', .. })
        ));
    }

    #[test]
    fn test_char_literals() {
        assert_eq!(
            tokens(r"'a' '\n' '\0'"),
            vec![
                Token::CharLiteral('a'),
                Token::CharLiteral('\n'),
                Token::CharLiteral('\0'),
            ]
        );
    }

    #[test]
    fn test_stray_comment_close() {
        let result: Vec<_> = Lexer::new("x */ y").collect();
        assert!(matches!(
            result[1],
            Err(LexError::StrayCommentClose { .. })
        ));
    }

    #[test]
    fn test_comments_skipped() {
        assert_eq!(
            tokens("a // line\n /* block\n comment */ b"),
            vec![Token::Ident("a".to_string()), Token::Ident("b".to_string())]
        );
    }

    #[test]
    fn test_multichar_operators_first() {
        assert_eq!(
            tokens("-> => :: == != <= >= && || << >>"),
            vec![
                Token::Arrow,
                Token::FatArrow,
                Token::DoubleColon,
                Token::EqEq,
                Token::NotEq,
                Token::LtEq,
                Token::GtEq,
                Token::AndAnd,
                Token::OrOr,
                Token::LShift,
                Token::RShift,
            ]
        );
    }

    #[test]
    fn test_function_signature() {
        let source = "pub fn main(none) -> void { return (); }";
        let toks = tokens(source);
        assert_eq!(toks[0], Token::Pub);
        assert_eq!(toks[1], Token::Fn);
        assert_eq!(toks[2], Token::Ident("main".to_string()));
        assert_eq!(toks[4], Token::Ident("none".to_string()));
        assert_eq!(toks[6], Token::Arrow);
        assert_eq!(toks[7], Token::Void);
    }

    #[test]
    fn test_int_overflow_is_error() {
        let result: Vec<_> = Lexer::new("99999999999999999999").collect();
        assert!(matches!(result[0], Err(LexError::InvalidNumber { .. })));
    }
}
