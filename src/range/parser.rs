//! Recursive-descent parser for the range query language.
//!
//! Operator-stack bookkeeping (building up brace/operator nodes as tokens
//! are consumed) is expressed directly as recursive calls instead of a
//! push/pop action stack.

use super::ast::{AstNode, OperatorKind};
use super::error::RangeError;
use super::lexer::{tokenize, Token, TokenKind};

/// Parses a complete range expression into an [`AstNode`].
pub fn parse(input: &str) -> Result<AstNode, RangeError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens, pos: 0 };
    let node = parser.parse_expr()?;
    parser.expect_eof()?;
    Ok(node)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn expect_eof(&self) -> Result<(), RangeError> {
        if matches!(self.peek_kind(), TokenKind::Eof) {
            Ok(())
        } else {
            Err(self.unexpected("trailing input"))
        }
    }

    fn expect(&mut self, kind: &TokenKind, context: &str) -> Result<Token, RangeError> {
        if self.peek_kind() == kind {
            Ok(self.advance())
        } else {
            Err(RangeError::Parse {
                message: format!("expected {:?} {}", kind, context),
                position: self.peek().pos,
            })
        }
    }

    fn unexpected(&self, context: &str) -> RangeError {
        RangeError::Parse {
            message: format!("unexpected token {:?} {}", self.peek_kind(), context),
            position: self.peek().pos,
        }
    }

    /// `expr := term ((',' | '&' | '-') term)*`, left-to-right, equal
    /// precedence. A leading operator has no left operand, which is treated
    /// as a parse error.
    fn parse_expr(&mut self) -> Result<AstNode, RangeError> {
        if matches!(
            self.peek_kind(),
            TokenKind::Comma | TokenKind::Amp | TokenKind::Minus
        ) {
            return Err(self.unexpected("has no left operand"));
        }

        let mut left = self.parse_term()?;

        loop {
            let kind = match self.peek_kind() {
                TokenKind::Comma => OperatorKind::Union,
                TokenKind::Amp => OperatorKind::Intersect,
                TokenKind::Minus => OperatorKind::Subtract,
                _ => break,
            };
            self.advance();
            let right = self.parse_term()?;
            left = AstNode::Operator {
                kind,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// `term := text? '{' expr '}' text? | atom`
    fn parse_term(&mut self) -> Result<AstNode, RangeError> {
        match self.peek_kind().clone() {
            TokenKind::Text(word) if self.next_is_lbrace() => {
                self.advance();
                self.parse_braces(AstNode::Text(word))
            }
            TokenKind::LBrace => self.parse_braces(AstNode::Null),
            _ => self.parse_atom(),
        }
    }

    fn next_is_lbrace(&self) -> bool {
        self.tokens
            .get(self.pos + 1)
            .map(|t| matches!(t.kind, TokenKind::LBrace))
            .unwrap_or(false)
    }

    fn parse_braces(&mut self, left: AstNode) -> Result<AstNode, RangeError> {
        self.expect(&TokenKind::LBrace, "to start a brace expansion")?;
        let middle = self.parse_expr()?;
        self.expect(&TokenKind::RBrace, "to close a brace expansion")?;

        let right = if let TokenKind::Text(word) = self.peek_kind().clone() {
            self.advance();
            AstNode::Text(word)
        } else {
            AstNode::Null
        };

        Ok(AstNode::Braces {
            middle: Box::new(middle),
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// A single non-operator value: literal, lookup, group query, regex,
    /// function call, constant, or a parenthesized sub-expression.
    fn parse_atom(&mut self) -> Result<AstNode, RangeError> {
        match self.peek_kind().clone() {
            TokenKind::Text(word) => {
                self.advance();
                if matches!(self.peek_kind(), TokenKind::LParen) {
                    self.parse_function_call(word)
                } else {
                    Ok(AstNode::Text(word))
                }
            }
            TokenKind::Constant(text) => {
                self.advance();
                Ok(AstNode::Constant(text))
            }
            TokenKind::Regex(pattern) => {
                self.advance();
                Ok(AstNode::Regex(pattern))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(&TokenKind::RParen, "to close a parenthesized expression")?;
                Ok(inner)
            }
            TokenKind::Percent => {
                self.advance();
                let cluster = self.parse_term()?;
                let key = if matches!(self.peek_kind(), TokenKind::Colon) {
                    self.advance();
                    self.parse_term()?
                } else {
                    AstNode::Constant("CLUSTER".to_string())
                };
                Ok(AstNode::ClusterLookup {
                    cluster: Box::new(cluster),
                    key: Box::new(key),
                })
            }
            TokenKind::At => {
                self.advance();
                let key = self.parse_term()?;
                Ok(AstNode::ClusterLookup {
                    cluster: Box::new(AstNode::Constant("GROUPS".to_string())),
                    key: Box::new(key),
                })
            }
            TokenKind::Dollar => {
                self.advance();
                match self.peek_kind().clone() {
                    TokenKind::Text(key) => {
                        self.advance();
                        Ok(AstNode::LocalClusterLookup(key))
                    }
                    _ => Err(self.unexpected("expected a key name after '$'")),
                }
            }
            TokenKind::Question => {
                self.advance();
                let inner = self.parse_term()?;
                Ok(AstNode::GroupQuery(Box::new(inner)))
            }
            _ => Err(self.unexpected("while expecting a value")),
        }
    }

    fn parse_function_call(&mut self, name: String) -> Result<AstNode, RangeError> {
        self.expect(&TokenKind::LParen, "to start function arguments")?;
        let mut args = Vec::new();
        if !matches!(self.peek_kind(), TokenKind::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if matches!(self.peek_kind(), TokenKind::Semicolon) {
                    self.advance();
                    continue;
                }
                break;
            }
        }
        self.expect(&TokenKind::RParen, "to close function arguments")?;
        Ok(AstNode::Function { name, args })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_union() {
        let ast = parse("a,b").unwrap();
        assert!(matches!(
            ast,
            AstNode::Operator {
                kind: OperatorKind::Union,
                ..
            }
        ));
    }

    #[test]
    fn parses_cluster_lookup_with_key() {
        let ast = parse("%a:TYPE").unwrap();
        match ast {
            AstNode::ClusterLookup { cluster, key } => {
                assert_eq!(*cluster, AstNode::Text("a".to_string()));
                assert_eq!(*key, AstNode::Text("TYPE".to_string()));
            }
            other => panic!("unexpected ast: {:?}", other),
        }
    }

    #[test]
    fn parses_braces_with_prefix_and_suffix() {
        let ast = parse("a.{b,c}.d").unwrap();
        match ast {
            AstNode::Braces { left, right, .. } => {
                assert_eq!(*left, AstNode::Text("a.".to_string()));
                assert_eq!(*right, AstNode::Text(".d".to_string()));
            }
            other => panic!("unexpected ast: {:?}", other),
        }
    }

    #[test]
    fn leading_operator_is_a_parse_error() {
        assert!(parse("- a").is_err());
        assert!(parse("& a").is_err());
    }

    #[test]
    fn unterminated_slash_is_a_parse_error() {
        assert!(parse("/abc").is_err());
    }

    #[test]
    fn parses_function_with_args() {
        let ast = parse("has(TYPE;one)").unwrap();
        match ast {
            AstNode::Function { name, args } => {
                assert_eq!(name, "has");
                assert_eq!(args.len(), 2);
            }
            other => panic!("unexpected ast: {:?}", other),
        }
    }
}
