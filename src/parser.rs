//! 提交时使用的子句解析器
//!
//! ## 解析流程图
//!
//! ```text
//! parse()
//!   ├─ parse_clause()            收集到下一个连接词为止的 token
//!   │    ├─ field method value   → Clause::Match
//!   │    ├─ field method         → 错误: 缺少取值
//!   │    └─ 其他                  → Clause::FullText (整段文本)
//!   │
//!   └─ 遇到 AND / OR 时记录连接词, 继续 parse_clause()
//! ```
//!
//! 交互过程中的词法分析永远不会失败, 这里只在回车提交时报告结构错误:
//! 开头的连接词、结尾悬空的连接词、连续的连接词以及方法后缺少取值。

use crate::ast::{Clause, Connective, Identifier, Literal, Query};
use crate::catalog::Candidates;
use crate::token::{DataType, Span, Token};
use thiserror::Error;

pub struct Parser<'a> {
    tokens: &'a [Token],
    position: usize,
    candidates: Option<&'a Candidates>,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub span: Option<Span>,
}

impl ParseError {
    fn at_position(message: String, span: Span) -> Self {
        Self {
            message,
            span: Some(span),
        }
    }
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            position: 0,
            candidates: None,
        }
    }

    /// 使用候选列表把字段名称解析为字段 id, 并识别方法
    pub fn with_candidates(mut self, candidates: &'a Candidates) -> Self {
        self.candidates = Some(candidates);
        self
    }

    /// 返回当前 token，不推进位置
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.position)
    }

    /// 返回当前 token 并推进位置
    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.position)?;
        self.position += 1;
        Some(token)
    }

    fn match_token(&self, data_type: DataType) -> bool {
        self.peek().is_some_and(|t| t.data_type == data_type)
    }

    fn is_method(&self, text: &str) -> bool {
        match self.candidates {
            Some(candidates) => candidates.methods.iter().any(|m| m.matches(text)),
            None => text == ":",
        }
    }

    fn identifier(&self, field: &Token) -> Identifier {
        let id = self
            .candidates
            .and_then(|c| c.find_field_id(&field.text))
            .unwrap_or(&field.text);
        Identifier(id.to_string())
    }

    /// 解析整个查询
    pub fn parse(&mut self) -> Result<Query, ParseError> {
        let mut query = Query {
            clauses: Vec::new(),
            connectives: Vec::new(),
        };
        if self.tokens.is_empty() {
            return Ok(query);
        }

        loop {
            query.clauses.push(self.parse_clause()?);

            let Some(token) = self.advance() else {
                break;
            };
            let connective = Connective::parse(&token.text).ok_or_else(|| {
                ParseError::at_position(format!("Expected AND or OR, found '{}'", token.text), token.span)
            })?;
            if self.peek().is_none() {
                return Err(ParseError::at_position(
                    format!("Dangling connective '{}' at end of query", token.text),
                    token.span,
                ));
            }
            query.connectives.push(connective);
        }

        Ok(query)
    }

    fn parse_clause(&mut self) -> Result<Clause, ParseError> {
        let start = self.position;
        while self.peek().is_some() && !self.match_token(DataType::Condition) {
            self.advance();
        }
        let words = &self.tokens[start..self.position];

        let Some(field) = words.first() else {
            let message = if start == 0 {
                "Query cannot start with a connective"
            } else {
                "Missing clause between connectives"
            };
            return Err(match self.peek() {
                Some(token) => ParseError::at_position(message.to_string(), token.span),
                None => ParseError {
                    message: message.to_string(),
                    span: None,
                },
            });
        };

        match words.get(1) {
            Some(method) if self.is_method(&method.text) => {
                let values = &words[2..];
                if values.is_empty() {
                    return Err(ParseError::at_position(
                        format!("Missing value after '{}' for field '{}'", method.text, field.text),
                        method.span,
                    ));
                }
                Ok(Clause::Match {
                    field: self.identifier(field),
                    method: method.text.clone(),
                    value: Literal::from_text(&join_words(values)),
                })
            }
            _ => Ok(Clause::FullText(Literal::from_text(&join_words(words)))),
        }
    }
}

fn join_words(words: &[Token]) -> String {
    words
        .iter()
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Language, SearchType};
    use crate::lexer::tokenize;

    fn parse_string(input: &str) -> Result<Query, ParseError> {
        let tokens = tokenize(input);
        Parser::new(&tokens).parse()
    }

    #[test]
    fn test_simple_clause() {
        let result = parse_string("status : 1").unwrap();
        assert_eq!(result.clauses.len(), 1);
        assert!(result.connectives.is_empty());
        assert_eq!(
            result.clauses[0],
            Clause::Match {
                field: Identifier("status".to_string()),
                method: ":".to_string(),
                value: Literal::Fuzzy("1".to_string()),
            }
        );
    }

    #[test]
    fn test_connectives() {
        let result = parse_string("a : 1 AND b : \"x\" or c : y z").unwrap();
        assert_eq!(result.clauses.len(), 3);
        assert_eq!(result.connectives, vec![Connective::And, Connective::Or]);
        if let Clause::Match { value, .. } = &result.clauses[1] {
            assert_eq!(*value, Literal::Exact("x".to_string()));
        } else {
            panic!("Expected match clause");
        }
        if let Clause::Match { value, .. } = &result.clauses[2] {
            assert_eq!(*value, Literal::Fuzzy("y z".to_string()));
        } else {
            panic!("Expected match clause");
        }
    }

    #[test]
    fn test_full_text_clause() {
        let result = parse_string("\"disk full\"").unwrap();
        assert_eq!(result.clauses[0], Clause::FullText(Literal::Exact("disk full".to_string())));

        let result = parse_string("cpu").unwrap();
        assert_eq!(result.clauses[0], Clause::FullText(Literal::Fuzzy("cpu".to_string())));
    }

    #[test]
    fn test_field_name_resolved_to_id() {
        let candidates = Candidates::for_search_type(SearchType::Alert, Language::Zh);
        let tokens = tokenize("级别 : 1");
        let result = Parser::new(&tokens).with_candidates(&candidates).parse().unwrap();
        if let Clause::Match { field, .. } = &result.clauses[0] {
            assert_eq!(field.0, "severity");
        } else {
            panic!("Expected match clause");
        }
    }

    #[test]
    fn test_empty_query() {
        assert!(parse_string("").unwrap().is_empty());
    }

    #[test]
    fn test_dangling_connective() {
        let err = parse_string("a : 1 AND ").unwrap_err();
        assert!(err.message.contains("Dangling"));
        assert_eq!(err.span, Some(Span::new(6, 9)));
    }

    #[test]
    fn test_missing_value() {
        let err = parse_string("status : ").unwrap_err();
        assert!(err.message.contains("Missing value"));
        assert_eq!(err.span, Some(Span::new(7, 8)));
    }

    #[test]
    fn test_consecutive_connectives() {
        let err = parse_string("a : 1 AND OR b : 2").unwrap_err();
        assert!(err.message.contains("Missing clause"));
    }

    #[test]
    fn test_or_groups_respect_precedence() {
        let result = parse_string("a : 1 AND b : 2 OR c : 3").unwrap();
        let groups = result.or_groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[1].len(), 1);
    }
}
