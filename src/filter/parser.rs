//! Recursive-descent filter parser.
//!
//! ```text
//! or-expr     := and-expr ("or" and-expr)*
//! and-expr    := term ("and" term)*
//! term        := "not" "(" or-expr ")" | "(" or-expr ")" | attr-filter
//! attr-filter := attrPath "[" or-expr "]"
//!              | attrPath compare-op value
//!              | attrPath "pr"
//! ```
//!
//! Keywords and operators are matched case-insensitively. The parser has no
//! schema access, so whether `attr[...]` names a multi-valued complex attribute
//! is checked by the evaluator.

use super::ast::{CompareOp, Filter, FilterValue};
use super::lexer::{Token, TokenKind, tokenize};
use crate::attributes::AttributeReference;
use crate::config::FilterConfig;
use crate::error::{FilterError, FilterResult};

use serde_json::Number;

/// Parse a filter with the default nesting limit.
///
/// ```rust
/// use scim_engine::filter::{Filter, parse};
///
/// let filter = parse(r#"userName eq "bjensen" and emails[type eq "work"]"#).unwrap();
/// assert!(matches!(filter, Filter::And(..)));
/// assert!(parse(r#"userName eq "unterminated"#).is_err());
/// ```
pub fn parse(text: &str) -> FilterResult<Filter> {
    parse_with_config(text, &FilterConfig::default())
}

/// Parse a filter, enforcing `config.max_depth`.
pub fn parse_with_config(text: &str, config: &FilterConfig) -> FilterResult<Filter> {
    let mut parser = Parser::new(text, config)?;
    if parser.tokens.is_empty() {
        return Err(FilterError::syntax(0, "filter is empty"));
    }
    let filter = parser.or_expr()?;
    parser.expect_end()?;
    Ok(filter)
}

/// Parse a PATCH path: `attr`, `attr.sub`, `attr[filter]` or `attr[filter].sub`.
///
/// Returns the attribute reference (sub-attribute included) and the embedded
/// value filter, if any.
pub fn parse_path(
    text: &str,
    config: &FilterConfig,
) -> FilterResult<(AttributeReference, Option<Filter>)> {
    let mut parser = Parser::new(text, config)?;
    let (mut attribute, position) = match parser.next() {
        Some(Token {
            kind: TokenKind::Word(word),
            position,
        }) => (parse_reference(&word, position)?, position),
        Some(token) => return Err(FilterError::syntax(token.position, "expected attribute path")),
        None => return Err(FilterError::syntax(0, "path is empty")),
    };

    if !parser.peek_is(&TokenKind::LBracket) {
        parser.expect_end()?;
        return Ok((attribute, None));
    }
    if attribute.sub_attribute_name.is_some() {
        return Err(FilterError::syntax(
            position,
            "a value filter must follow a top-level attribute",
        ));
    }

    parser.next();
    let filter = parser.nested(|p| p.or_expr())?;
    parser.expect(&TokenKind::RBracket, "expected ']'")?;

    if let Some(token) = parser.next() {
        let sub = match &token.kind {
            TokenKind::Word(word) => word.strip_prefix('.'),
            _ => None,
        };
        let sub = sub
            .filter(|sub| crate::attributes::reference::is_attribute_name(sub))
            .ok_or_else(|| {
                FilterError::syntax(token.position, "expected '.subAttribute' after ']'")
            })?;
        attribute.sub_attribute_name = Some(sub.to_string());
        parser.expect_end()?;
    }

    Ok((attribute, Some(filter)))
}

struct Parser {
    tokens: Vec<Token>,
    index: usize,
    depth: usize,
    max_depth: usize,
    end: usize,
}

impl Parser {
    fn new(text: &str, config: &FilterConfig) -> FilterResult<Self> {
        Ok(Self {
            tokens: tokenize(text)?,
            index: 0,
            depth: 0,
            max_depth: config.max_depth,
            end: text.len(),
        })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    fn peek_is(&self, kind: &TokenKind) -> bool {
        self.peek().is_some_and(|token| &token.kind == kind)
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        matches!(
            self.peek(),
            Some(Token { kind: TokenKind::Word(word), .. }) if word.eq_ignore_ascii_case(keyword)
        )
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.index).cloned();
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    fn position(&self) -> usize {
        self.peek().map_or(self.end, |token| token.position)
    }

    fn expect(&mut self, kind: &TokenKind, message: &str) -> FilterResult<()> {
        if self.peek_is(kind) {
            self.next();
            Ok(())
        } else {
            Err(FilterError::syntax(self.position(), message))
        }
    }

    fn expect_end(&self) -> FilterResult<()> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(FilterError::syntax(
                token.position,
                format!("unexpected {}", describe(&token.kind)),
            )),
        }
    }

    /// Run `f` one nesting level deeper.
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> FilterResult<T>) -> FilterResult<T> {
        if self.depth >= self.max_depth {
            return Err(FilterError::syntax(
                self.position(),
                format!("filter nesting exceeds maximum depth of {}", self.max_depth),
            ));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn or_expr(&mut self) -> FilterResult<Filter> {
        let mut left = self.and_expr()?;
        while self.peek_keyword("or") {
            self.next();
            let right = self.and_expr()?;
            left = Filter::or(left, right);
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> FilterResult<Filter> {
        let mut left = self.term()?;
        while self.peek_keyword("and") {
            self.next();
            let right = self.term()?;
            left = Filter::and(left, right);
        }
        Ok(left)
    }

    fn term(&mut self) -> FilterResult<Filter> {
        if self.peek_keyword("not") {
            self.next();
            self.expect(&TokenKind::LParen, "expected '(' after 'not'")?;
            let inner = self.nested(|p| p.or_expr())?;
            self.expect(&TokenKind::RParen, "expected ')'")?;
            return Ok(Filter::Not(Box::new(inner)));
        }

        if self.peek_is(&TokenKind::LParen) {
            self.next();
            let inner = self.nested(|p| p.or_expr())?;
            self.expect(&TokenKind::RParen, "expected ')'")?;
            return Ok(Filter::Group(Box::new(inner)));
        }

        self.attr_filter()
    }

    fn attr_filter(&mut self) -> FilterResult<Filter> {
        let (word, position) = match self.next() {
            Some(Token {
                kind: TokenKind::Word(word),
                position,
            }) => (word, position),
            Some(token) => {
                return Err(FilterError::syntax(
                    token.position,
                    format!("expected attribute path, found {}", describe(&token.kind)),
                ));
            }
            None => return Err(FilterError::syntax(self.end, "expected attribute path")),
        };
        let attribute = parse_reference(&word, position)?;

        if self.peek_is(&TokenKind::LBracket) {
            if attribute.sub_attribute_name.is_some() {
                return Err(FilterError::syntax(
                    position,
                    "a value filter must follow a top-level attribute",
                ));
            }
            self.next();
            let inner = self.nested(|p| p.or_expr())?;
            self.expect(&TokenKind::RBracket, "expected ']'")?;
            if let Some(Token {
                kind: TokenKind::Word(word),
                position,
            }) = self.peek()
            {
                let is_operator =
                    word.eq_ignore_ascii_case("pr") || CompareOp::from_keyword(word).is_some();
                if is_operator {
                    return Err(FilterError::syntax(
                        *position,
                        "an operator cannot follow a value filter",
                    ));
                }
            }
            return Ok(Filter::Complex {
                attribute,
                filter: Box::new(inner),
            });
        }

        let op_position = self.position();
        let op_word = match self.next() {
            Some(Token {
                kind: TokenKind::Word(word),
                ..
            }) => word,
            _ => return Err(FilterError::syntax(op_position, "expected comparison operator")),
        };

        if op_word.eq_ignore_ascii_case("pr") {
            return Ok(Filter::Present(attribute));
        }

        let op = CompareOp::from_keyword(&op_word).ok_or_else(|| {
            FilterError::syntax(op_position, format!("unknown operator '{}'", op_word))
        })?;
        let value = self.value()?;

        Ok(Filter::Comparison {
            attribute,
            op,
            value,
        })
    }

    fn value(&mut self) -> FilterResult<FilterValue> {
        let position = self.position();
        match self.next().map(|token| token.kind) {
            Some(TokenKind::Str(text)) => Ok(FilterValue::String(text)),
            Some(TokenKind::Word(word)) => match word.to_ascii_lowercase().as_str() {
                "true" => Ok(FilterValue::Boolean(true)),
                "false" => Ok(FilterValue::Boolean(false)),
                "null" => Ok(FilterValue::Null),
                _ => word
                    .parse::<Number>()
                    .map(FilterValue::Number)
                    .map_err(|_| {
                        FilterError::syntax(position, format!("invalid value '{}'", word))
                    }),
            },
            Some(kind) => Err(FilterError::syntax(
                position,
                format!("expected value, found {}", describe(&kind)),
            )),
            None => Err(FilterError::syntax(position, "expected value")),
        }
    }
}

fn parse_reference(word: &str, position: usize) -> FilterResult<AttributeReference> {
    word.parse()
        .map_err(|e| FilterError::syntax(position, format!("{}", e)))
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::LParen => "'('".to_string(),
        TokenKind::RParen => "')'".to_string(),
        TokenKind::LBracket => "'['".to_string(),
        TokenKind::RBracket => "']'".to_string(),
        TokenKind::Word(word) => format!("'{}'", word),
        TokenKind::Str(text) => format!("string \"{}\"", text),
    }
}
