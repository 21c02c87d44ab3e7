//! Tokenizer for filter expressions and PATCH paths.

use crate::error::{FilterError, FilterResult};

/// Kinds of filter tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    LParen,
    RParen,
    LBracket,
    RBracket,
    /// Unquoted run: attribute path, keyword, operator, number or literal
    Word(String),
    /// Double-quoted string with escapes already decoded
    Str(String),
}

/// A token with the byte offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: usize,
}

/// Split filter text into tokens.
pub fn tokenize(input: &str) -> FilterResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(position, c)) = chars.peek() {
        let kind = match c {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '"' => {
                chars.next();
                let mut text = String::new();
                loop {
                    match chars.next() {
                        None => {
                            return Err(FilterError::syntax(
                                position,
                                "unterminated string literal",
                            ));
                        }
                        Some((_, '"')) => break,
                        Some((escape_at, '\\')) => match chars.next() {
                            Some((_, '"')) => text.push('"'),
                            Some((_, '\\')) => text.push('\\'),
                            Some((_, '/')) => text.push('/'),
                            Some((_, 'n')) => text.push('\n'),
                            Some((_, 't')) => text.push('\t'),
                            Some((_, 'r')) => text.push('\r'),
                            Some((_, other)) => {
                                return Err(FilterError::syntax(
                                    escape_at,
                                    format!("invalid escape sequence '\\{}'", other),
                                ));
                            }
                            None => {
                                return Err(FilterError::syntax(
                                    position,
                                    "unterminated string literal",
                                ));
                            }
                        },
                        Some((_, other)) => text.push(other),
                    }
                }
                tokens.push(Token {
                    kind: TokenKind::Str(text),
                    position,
                });
                continue;
            }
            _ => {
                let mut word = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_whitespace() || matches!(c, '(' | ')' | '[' | ']' | '"') {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                tokens.push(Token {
                    kind: TokenKind::Word(word),
                    position,
                });
                continue;
            }
        };
        chars.next();
        tokens.push(Token { kind, position });
    }

    Ok(tokens)
}
