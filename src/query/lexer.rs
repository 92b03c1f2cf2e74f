//! Lexer for tokenizing query text.
//!
//! Keywords are case-insensitive; whitespace (including newlines) separates
//! tokens and is otherwise ignored.

use std::fmt;

use super::ParseError;

/// Token types produced by the lexer
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords
    Query,
    Where,
    Filter,
    And,
    Or,

    // Data kinds
    Ms1Data,
    Ms2Data,

    // Aggregate functions
    ScanSum,
    ScanMz,
    ScanNum,
    ScanInfo,
    ScanRangeSum,

    // Condition kinds
    Ms1Mz,
    Ms2Prod,
    Ms2Prec,
    Ms2Nl,

    // Qualifiers
    TolerancePpm,
    ToleranceMz,

    /// The free variable `X`
    Variable,

    /// Numeric literal
    Number(f64),

    // Punctuation
    Eq,         // =
    Colon,      // :
    Plus,       // +
    Minus,      // -
    LeftParen,  // (
    RightParen, // )

    // End of input
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Query => write!(f, "QUERY"),
            Token::Where => write!(f, "WHERE"),
            Token::Filter => write!(f, "FILTER"),
            Token::And => write!(f, "AND"),
            Token::Or => write!(f, "OR"),
            Token::Ms1Data => write!(f, "MS1DATA"),
            Token::Ms2Data => write!(f, "MS2DATA"),
            Token::ScanSum => write!(f, "scansum"),
            Token::ScanMz => write!(f, "scanmz"),
            Token::ScanNum => write!(f, "scannum"),
            Token::ScanInfo => write!(f, "scaninfo"),
            Token::ScanRangeSum => write!(f, "scanrangesum"),
            Token::Ms1Mz => write!(f, "MS1MZ"),
            Token::Ms2Prod => write!(f, "MS2PROD"),
            Token::Ms2Prec => write!(f, "MS2PREC"),
            Token::Ms2Nl => write!(f, "MS2NL"),
            Token::TolerancePpm => write!(f, "TOLERANCEPPM"),
            Token::ToleranceMz => write!(f, "TOLERANCEMZ"),
            Token::Variable => write!(f, "X"),
            Token::Number(n) => write!(f, "{}", n),
            Token::Eq => write!(f, "="),
            Token::Colon => write!(f, ":"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::Eof => write!(f, "end of query"),
        }
    }
}

/// A token with the byte offset where it starts
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    /// The token
    pub token: Token,
    /// Byte offset in the query text
    pub offset: usize,
}

/// Lexer over query text
pub struct Lexer<'a> {
    input: &'a str,
    position: usize,
}

impl<'a> Lexer<'a> {
    /// Create a lexer over `input`
    pub fn new(input: &'a str) -> Self {
        Self { input, position: 0 }
    }

    /// Tokenize the whole input; the last token is always [`Token::Eof`]
    pub fn tokenize(&mut self) -> Result<Vec<Spanned>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            let spanned = self.next_token()?;
            let done = spanned.token == Token::Eof;
            tokens.push(spanned);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                self.position += c.len_utf8();
            } else {
                break;
            }
        }
    }

    fn next_token(&mut self) -> Result<Spanned, ParseError> {
        self.skip_whitespace();
        let offset = self.position;

        let Some(c) = self.peek_char() else {
            return Ok(Spanned {
                token: Token::Eof,
                offset,
            });
        };

        let token = match c {
            '=' => self.single(Token::Eq),
            ':' => self.single(Token::Colon),
            '+' => self.single(Token::Plus),
            '-' => self.single(Token::Minus),
            '(' => self.single(Token::LeftParen),
            ')' => self.single(Token::RightParen),
            c if c.is_ascii_digit() || c == '.' => self.read_number(offset)?,
            c if c.is_ascii_alphabetic() => self.read_word(offset)?,
            other => {
                return Err(ParseError::UnexpectedCharacter {
                    character: other,
                    offset,
                })
            }
        };

        Ok(Spanned { token, offset })
    }

    fn single(&mut self, token: Token) -> Token {
        self.position += 1;
        token
    }

    fn read_number(&mut self, offset: usize) -> Result<Token, ParseError> {
        let bytes = self.input.as_bytes();
        let mut end = self.position;
        while end < bytes.len() && (bytes[end].is_ascii_digit() || bytes[end] == b'.') {
            end += 1;
        }
        // Optional exponent: e.g. 1.5e3, 2E-2
        if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
            let mut exp_end = end + 1;
            if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
                exp_end += 1;
            }
            if exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
                while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
                    exp_end += 1;
                }
                end = exp_end;
            }
        }

        let text = &self.input[self.position..end];
        self.position = end;
        text.parse::<f64>()
            .map(Token::Number)
            .map_err(|_| ParseError::InvalidNumber {
                text: text.to_string(),
                offset,
            })
    }

    fn read_word(&mut self, offset: usize) -> Result<Token, ParseError> {
        let bytes = self.input.as_bytes();
        let mut end = self.position;
        while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_') {
            end += 1;
        }
        let word = &self.input[self.position..end];
        self.position = end;

        let token = match word.to_ascii_uppercase().as_str() {
            "QUERY" => Token::Query,
            "WHERE" => Token::Where,
            "FILTER" => Token::Filter,
            "AND" => Token::And,
            "OR" => Token::Or,
            "MS1DATA" => Token::Ms1Data,
            "MS2DATA" => Token::Ms2Data,
            "SCANSUM" => Token::ScanSum,
            "SCANMZ" => Token::ScanMz,
            "SCANNUM" => Token::ScanNum,
            "SCANINFO" => Token::ScanInfo,
            "SCANRANGESUM" => Token::ScanRangeSum,
            "MS1MZ" => Token::Ms1Mz,
            "MS2PROD" => Token::Ms2Prod,
            "MS2PREC" => Token::Ms2Prec,
            "MS2NL" => Token::Ms2Nl,
            "TOLERANCEPPM" => Token::TolerancePpm,
            "TOLERANCEMZ" => Token::ToleranceMz,
            "X" => Token::Variable,
            _ => {
                return Err(ParseError::UnknownKeyword {
                    word: word.to_string(),
                    offset,
                })
            }
        };
        Ok(token)
    }
}
