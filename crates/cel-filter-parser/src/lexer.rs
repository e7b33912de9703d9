//! Tokenizer for filter expressions, built on logos.

use logos::Logos;

use crate::ast::Span;

/// A token together with the byte range it was read from.
pub type SpannedToken = (Token, Span);

/// Raised when the input contains something that is not a token.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message} at {}..{}", .span.start, .span.end)]
pub struct LexError {
    pub message: String,
    pub span: Span,
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
#[logos(skip r"//[^\n]*")]
pub enum Token {
    #[regex(r"0[xX][0-9a-fA-F]+[uU]", |lex| parse_radix_u64(lex.slice(), 16))]
    #[regex(r"[0-9]+[uU]", |lex| parse_radix_u64(lex.slice(), 10), priority = 4)]
    UInt(u64),

    #[regex(r"0[xX][0-9a-fA-F]+", |lex| i64::from_str_radix(&lex.slice()[2..], 16).ok(), priority = 3)]
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok(), priority = 1)]
    Int(i64),

    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok(), priority = 5)]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().parse::<f64>().ok(), priority = 2)]
    Float(f64),

    #[regex(r#"""#, |lex| quoted(lex, '"', false))]
    #[regex(r"'", |lex| quoted(lex, '\'', false))]
    #[regex(r#"[rR]""#, |lex| quoted(lex, '"', true))]
    #[regex(r"[rR]'", |lex| quoted(lex, '\'', true))]
    String(String),

    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,
    #[token("in")]
    In,

    #[token("as", reserved)]
    #[token("break", reserved)]
    #[token("const", reserved)]
    #[token("continue", reserved)]
    #[token("else", reserved)]
    #[token("for", reserved)]
    #[token("function", reserved)]
    #[token("if", reserved)]
    #[token("import", reserved)]
    #[token("let", reserved)]
    #[token("loop", reserved)]
    #[token("package", reserved)]
    #[token("namespace", reserved)]
    #[token("return", reserved)]
    #[token("var", reserved)]
    #[token("void", reserved)]
    #[token("while", reserved)]
    Reserved(String),

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string(), priority = 0)]
    Ident(String),

    #[token("==")]
    EqEq,
    #[token("!=")]
    Ne,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,
    #[token("&&")]
    And,
    #[token("||")]
    Or,
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
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("!")]
    Not,
    #[token("?")]
    Question,
    #[token(":")]
    Colon,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            Token::Int(n) => return write!(f, "{n}"),
            Token::UInt(n) => return write!(f, "{n}u"),
            Token::Float(n) => return write!(f, "{n}"),
            Token::String(s) => return write!(f, "{s:?}"),
            Token::Reserved(s) | Token::Ident(s) => return f.write_str(s),
            Token::True => "true",
            Token::False => "false",
            Token::Null => "null",
            Token::In => "in",
            Token::EqEq => "==",
            Token::Ne => "!=",
            Token::Le => "<=",
            Token::Ge => ">=",
            Token::And => "&&",
            Token::Or => "||",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::Lt => "<",
            Token::Gt => ">",
            Token::Not => "!",
            Token::Question => "?",
            Token::Colon => ":",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::Dot => ".",
            Token::Comma => ",",
        };
        f.write_str(symbol)
    }
}

fn reserved(lex: &mut logos::Lexer<Token>) -> String {
    lex.slice().to_string()
}

/// Parses `0x1Fu` / `31u` style literals; the trailing suffix is dropped.
fn parse_radix_u64(slice: &str, radix: u32) -> Option<u64> {
    let digits = &slice[..slice.len() - 1];
    let digits = if radix == 16 { &digits[2..] } else { digits };
    u64::from_str_radix(digits, radix).ok()
}

/// Reads the body of a quoted string that started with `quote`.
///
/// Returns `None` for an unterminated literal, a bare newline, or a bad
/// escape; logos then reports the opening quote as the offending token.
fn quoted(lex: &mut logos::Lexer<Token>, quote: char, raw: bool) -> Option<String> {
    let rest = lex.remainder();
    let mut out = String::new();
    let mut chars = rest.char_indices();

    while let Some((offset, c)) = chars.next() {
        match c {
            c if c == quote => {
                lex.bump(offset + c.len_utf8());
                return Some(out);
            }
            '\n' => return None,
            '\\' if !raw => out.push(unescape(&mut chars)?),
            c => out.push(c),
        }
    }
    None
}

/// Decodes one escape sequence; the leading backslash is already consumed.
fn unescape(chars: &mut std::str::CharIndices<'_>) -> Option<char> {
    let (_, c) = chars.next()?;
    let decoded = match c {
        '\\' | '/' | '"' | '\'' | '`' | '?' => c,
        'a' => '\x07',
        'b' => '\x08',
        'f' => '\x0C',
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        'v' => '\x0B',
        'x' | 'X' => from_digits(chars, 2, 16)?,
        'u' => from_digits(chars, 4, 16)?,
        'U' => from_digits(chars, 8, 16)?,
        '0'..='3' => {
            let rest: String = chars.by_ref().take(2).map(|(_, d)| d).collect();
            let code = u32::from_str_radix(&format!("{c}{rest}"), 8).ok()?;
            if rest.len() != 2 {
                return None;
            }
            char::from_u32(code)?
        }
        _ => return None,
    };
    Some(decoded)
}

fn from_digits(chars: &mut std::str::CharIndices<'_>, count: usize, radix: u32) -> Option<char> {
    let digits: String = chars.by_ref().take(count).map(|(_, d)| d).collect();
    if digits.len() != count {
        return None;
    }
    char::from_u32(u32::from_str_radix(&digits, radix).ok()?)
}

/// Tokenize `input`, stopping at the first unrecognized character.
pub fn lex(input: &str) -> Result<Vec<SpannedToken>, LexError> {
    let mut lexer = Token::lexer(input);
    let mut tokens = Vec::new();

    while let Some(token) = lexer.next() {
        let span = lexer.span();
        match token {
            Ok(token) => tokens.push((token, span)),
            Err(()) => {
                let found = &input[span.clone()];
                let message = if found.starts_with(['"', '\''])
                    || (found.len() == 2 && found.ends_with(['"', '\'']))
                {
                    "unterminated string literal".to_string()
                } else {
                    format!("unexpected character '{found}'")
                };
                return Err(LexError { message, span });
            }
        }
    }

    Ok(tokens)
}
