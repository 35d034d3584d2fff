//! 搜索字符串的语法分析器
//!
//! ## 语法
//!
//! ```text
//! search    := term*
//! term      := OPERATOR value
//! value     := QUOTED | WORD
//! OPERATOR  := name ':'            例如 `name:`、`services.name:`
//! WORD      := 紧跟操作符的值只在空白处结束，可以包含 ':'
//! ```
//!
//! 各个 term 之间以空白分隔。解析器只负责切分 `operator:value`，
//! 不解释操作符也不校验值；操作符的解析在 [`crate::query`] 中完成。
//!
//! ## 解析示例
//!
//! ```text
//! name:"web01"
//! services.name:ssh services.port:22
//! os:"Windows XP" name:web01
//! ```

use crate::token::{Span, Token, TokenKind};
use thiserror::Error;

/// 一个 `operator:value` 搜索项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub operator: String,
    pub value: String,
    /// 值是否由双引号包围
    pub quoted: bool,
    pub span: Span,
}

pub struct Parser<'a> {
    tokens: &'a [Token<'a>],
    position: usize,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub span: Option<Span>,
}

impl ParseError {
    fn new(message: String, span: Option<Span>) -> Self {
        Self { message, span }
    }

    fn at_position(message: String, span: Span) -> Self {
        Self {
            message,
            span: Some(span),
        }
    }
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token<'a>]) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// 返回当前 token，不推进位置
    fn peek(&self) -> Option<&'a Token<'a>> {
        self.tokens.get(self.position)
    }

    /// 返回当前 token 并推进位置
    fn advance(&mut self) -> Option<&'a Token<'a>> {
        let token = self.tokens.get(self.position)?;
        self.position += 1;
        Some(token)
    }

    pub fn parse(&mut self) -> Result<Vec<Term>, ParseError> {
        let mut terms = Vec::new();

        while let Some(token) = self.advance() {
            match &token.kind {
                TokenKind::Operator(operator) => {
                    let term = self.parse_value(operator, token.span)?;
                    terms.push(term);
                }
                other => {
                    return Err(ParseError::at_position(
                        format!("Expected operator, found {:?}", other),
                        token.span,
                    ));
                }
            }
        }

        Ok(terms)
    }

    /// 解析操作符之后的值
    fn parse_value(&mut self, operator: &str, operator_span: Span) -> Result<Term, ParseError> {
        let Some(token) = self.peek() else {
            return Err(ParseError::new(
                format!("Expected value for operator '{}', but reached end of input", operator),
                None,
            ));
        };

        let (value, quoted) = match &token.kind {
            TokenKind::Quoted(value) => (*value, true),
            TokenKind::Word(value) => (*value, false),
            TokenKind::Operator(_) => {
                return Err(ParseError::at_position(
                    format!("Expected value for operator '{}', found {:?}", operator, token.kind),
                    token.span,
                ));
            }
        };
        self.advance(); // 消费值

        Ok(Term {
            operator: operator.to_string(),
            value: value.to_string(),
            quoted,
            span: Span::new(operator_span.start, token.span.end),
        })
    }
}

/// 对搜索字符串进行分词并解析
pub fn parse_terms(input: &str) -> Result<Vec<Term>, ParseError> {
    let tokens: Vec<_> = crate::lexer::Lexer::new(input).collect();
    Parser::new(&tokens).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_term() {
        let terms = parse_terms(r#"name:"x""#).unwrap();
        assert_eq!(
            terms,
            vec![Term {
                operator: "name".to_string(),
                value: "x".to_string(),
                quoted: true,
                span: Span::new(0, 8),
            }]
        );
    }

    #[test]
    fn test_multiple_terms() {
        let terms = parse_terms("services.name:ssh services.port:22 name:web01").unwrap();

        let pairs: Vec<_> = terms
            .iter()
            .map(|t| (t.operator.as_str(), t.value.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("services.name", "ssh"),
                ("services.port", "22"),
                ("name", "web01"),
            ]
        );
        assert!(terms.iter().all(|t| !t.quoted));
    }

    #[test]
    fn test_empty_search() {
        assert!(parse_terms("").unwrap().is_empty());
        assert!(parse_terms("   ").unwrap().is_empty());
    }

    #[test]
    fn test_value_without_operator_is_error() {
        let err = parse_terms("web01").unwrap_err();
        assert_eq!(err.span, Some(Span::new(0, 5)));
    }

    #[test]
    fn test_missing_value_is_error() {
        let err = parse_terms("name:").unwrap_err();
        assert!(err.message.contains("end of input"));
        assert_eq!(err.span, None);
    }

    #[test]
    fn test_operator_followed_by_operator_is_error() {
        let err = parse_terms("name: address:1.2.3.4").unwrap_err();
        assert!(err.message.contains("'name'"));
        assert_eq!(err.span, Some(Span::new(6, 14)));
    }

    #[test]
    fn test_value_split_on_first_colon() {
        let terms = parse_terms("address:fe80::1 services.info:http://example.com:8080/x").unwrap();
        assert_eq!(terms[0].operator, "address");
        assert_eq!(terms[0].value, "fe80::1");
        assert_eq!(terms[0].span, Span::new(0, 15));
        assert_eq!(terms[1].operator, "services.info");
        assert_eq!(terms[1].value, "http://example.com:8080/x");
        assert!(!terms[1].quoted);
    }

    #[test]
    fn test_empty_quoted_value() {
        let terms = parse_terms(r#"name:"""#).unwrap();
        assert_eq!(terms[0].value, "");
        assert!(terms[0].quoted);
    }
}
