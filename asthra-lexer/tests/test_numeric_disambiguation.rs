use asthra_lexer::{LexError, Lexer, Token};

#[test]
fn test_scientific_notation_basic() {
    let source = "1.5e10";
    let mut lexer = Lexer::new(source);

    let token = lexer.next().unwrap().unwrap();
    if let Token::FloatLiteral(val) = token.token {
        assert_eq!(val, 15000000000.0);
    } else {
        panic!("expected float, got {:?}", token.token);
    }
}

#[test]
fn test_scientific_notation_negative_exp() {
    let source = "2.0E-5";
    let mut lexer = Lexer::new(source);

    let token = lexer.next().unwrap().unwrap();
    if let Token::FloatLiteral(val) = token.token {
        assert_eq!(val, 0.00002);
    }
}

#[test]
fn test_bases_in_statement() {
    let source = "let mask: u32 = 0xFF00;";
    let tokens: Vec<_> = Lexer::new(source).map(|r| r.unwrap().token).collect();

    assert_eq!(tokens[0], Token::Let);
    assert_eq!(tokens[1], Token::Ident("mask".to_string()));
    assert_eq!(tokens[2], Token::Colon);
    assert_eq!(tokens[3], Token::U32);
    assert_eq!(tokens[4], Token::Eq);
    assert_eq!(tokens[5], Token::IntLiteral(0xFF00));
    assert_eq!(tokens[6], Token::Semicolon);
}

#[test]
fn test_dot_after_call_chain_is_tuple_access() {
    // `)` ends an expression, so the dot stays a member-access dot
    let tokens: Vec<_> = Lexer::new("pair(none).0")
        .map(|r| r.unwrap().token)
        .collect();
    assert_eq!(tokens[tokens.len() - 2], Token::Dot);
    assert_eq!(tokens[tokens.len() - 1], Token::IntLiteral(0));
}

#[test]
fn test_chained_tuple_access_keeps_float_for_parser() {
    // `x.0.1` is DOT + FLOAT(0.1); the parser expands the float
    let tokens: Vec<_> = Lexer::new("x.0.1").map(|r| r.unwrap().token).collect();
    assert_eq!(
        tokens,
        vec![
            Token::Ident("x".to_string()),
            Token::Dot,
            Token::FloatLiteral(0.1),
        ]
    );
}

#[test]
fn test_leading_dot_float_in_argument_position() {
    // after `(` or `,` nothing can end an expression, so `.5` is a float
    let tokens: Vec<_> = Lexer::new("f(.5, .25)").map(|r| r.unwrap().token).collect();
    assert_eq!(
        tokens,
        vec![
            Token::Ident("f".to_string()),
            Token::LParen,
            Token::FloatLiteral(0.5),
            Token::Comma,
            Token::FloatLiteral(0.25),
            Token::RParen,
        ]
    );
}

#[test]
fn test_bracket_close_keeps_dot() {
    // `]` ends an expression: `a[0].1` indexes then takes a tuple element
    let tokens: Vec<_> = Lexer::new("a[0].1").map(|r| r.unwrap().token).collect();
    assert_eq!(tokens[3], Token::RBracket);
    assert_eq!(tokens[4], Token::Dot);
    assert_eq!(tokens[5], Token::IntLiteral(1));
}

#[test]
fn test_invalid_digit_reports_once() {
    let results: Vec<_> = Lexer::new("let x: i32 = 0b777;").collect();
    let errors: Vec<_> = results.iter().filter(|r| r.is_err()).collect();
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        errors[0],
        Err(LexError::InvalidNumber { .. })
    ));
}

#[test]
fn test_unterminated_multiline_string() {
    let results: Vec<_> = Lexer::new("\"\"\"never closed").collect();
    assert!(matches!(
        results[0],
        Err(LexError::UnterminatedString { .. })
    ));
}
