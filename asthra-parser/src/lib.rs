use asthra_diagnostics::error_codes;
use asthra_lexer::LexError;
use thiserror::Error;

// Modular parser structure
mod parser;
pub use parser::{Parser, ParserOptions};

#[derive(Error, Debug, Clone)]
pub enum ParseError {
    #[error("Syntax error [{code}]: {message}")]
    Syntax {
        code: u16,
        message: String,
        span: std::ops::Range<usize>,
    },
    #[error("Lexical error: {0}")]
    Lex(#[from] LexError),
}

impl ParseError {
    pub fn code(&self) -> u16 {
        match self {
            ParseError::Syntax { code, .. } => *code,
            ParseError::Lex(err) => match err {
                LexError::InvalidToken { .. } => error_codes::INVALID_TOKEN,
                LexError::UnterminatedString { .. } => error_codes::UNTERMINATED_STRING,
                LexError::InvalidNumber { .. } => error_codes::INVALID_NUMBER,
                LexError::InvalidEscape { .. } => error_codes::INVALID_ESCAPE,
                LexError::StrayCommentClose { .. } => error_codes::STRAY_COMMENT_CLOSE,
            },
        }
    }

    pub fn span(&self) -> std::ops::Range<usize> {
        match self {
            ParseError::Syntax { span, .. } => span.clone(),
            ParseError::Lex(err) => err.span(),
        }
    }

    pub fn message(&self) -> String {
        match self {
            ParseError::Syntax { message, .. } => message.clone(),
            ParseError::Lex(err) => err.to_string(),
        }
    }
}
