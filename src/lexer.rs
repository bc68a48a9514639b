//! 过滤查询的词法分析器
//!
//! 查询文本先按 "空白 + and/or" 切成子句与连接词, 子句内部再按空格切词,
//! 按位置分类为 field / method / value:
//!
//! ```text
//! severity : 1 AND tags.hostname : web01
//! └field─┘ │ │ └┬┘ └────field────┘ │ └val┘
//!       method│ condition         method
//!           value
//! ```

use crate::token::{DataType, Span, Token};

/// 连接词, 匹配时忽略大小写
const CONDITION_KEYWORDS: [&str; 2] = ["and", "or"];

/// 去掉开头空白, 并把每段空白 (包括单个制表符) 折叠为一个空格
pub fn normalize(raw: &str) -> String {
    normalize_with_cursor(raw, 0).0
}

/// 与 [`normalize`] 相同, 同时把原文中的光标位置映射到规范化后的文本中
pub fn normalize_with_cursor(raw: &str, cursor: usize) -> (String, usize) {
    let trimmed = raw.trim_start();
    let leading = raw.len() - trimmed.len();
    let cursor = cursor.saturating_sub(leading).min(trimmed.len());
    let mut mapped = None;

    let mut output = String::with_capacity(trimmed.len());
    let mut chars = trimmed.char_indices().peekable();
    while let Some((index, c)) = chars.next() {
        if index >= cursor && mapped.is_none() {
            mapped = Some(output.len());
        }
        if !c.is_whitespace() {
            output.push(c);
            continue;
        }

        // 收集整段空白
        let mut run_end = index + c.len_utf8();
        let mut run_len = 1;
        while let Some(&(next_index, next)) = chars.peek() {
            if !next.is_whitespace() {
                break;
            }
            run_end = next_index + next.len_utf8();
            run_len += 1;
            chars.next();
        }

        // 光标落在被折叠的空白段中间时, 吸附到折叠后的空格之后
        if run_len > 1 && mapped.is_none() && cursor < run_end {
            mapped = Some(output.len() + 1);
        }
        output.push(' ');
    }

    let mapped = mapped.unwrap_or(output.len()).min(output.len());
    (output, mapped)
}

/// 切分后的片段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Piece<'a> {
    /// 两个连接词之间的文本, 保留原始空白
    Clause(&'a str, Span),
    /// `and` / `or` 连接词, 保留原始大小写
    Condition(&'a str, Span),
}

impl<'a> Piece<'a> {
    pub fn text(&self) -> &'a str {
        match self {
            Piece::Clause(text, _) | Piece::Condition(text, _) => text,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Piece::Clause(_, span) | Piece::Condition(_, span) => *span,
        }
    }
}

/// 把查询文本切成子句与连接词的迭代器
pub struct Lexer<'a> {
    input: &'a str,
    /// 输入字符串中的当前位置（字节索引）
    position: usize,
    /// 已扫描到但尚未返回的连接词
    pending: Option<Piece<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            position: 0,
            pending: None,
        }
    }

    /// 返回指定位置的字符
    fn char_at(&self, at: usize) -> Option<char> {
        self.input.get(at..).and_then(|rest| rest.chars().next())
    }

    /// 判断 `at` 处是否为一个完整的连接词, 连接词之后必须是空白或输入结尾
    fn keyword_at(&self, at: usize) -> Option<Piece<'a>> {
        let rest = self.input.get(at..)?;
        CONDITION_KEYWORDS.iter().find_map(|keyword| {
            let candidate = rest.get(..keyword.len())?;
            if !candidate.eq_ignore_ascii_case(keyword) {
                return None;
            }
            let end = at + keyword.len();
            match self.char_at(end) {
                Some(c) if !c.is_whitespace() => None,
                _ => Some(Piece::Condition(candidate, Span::new(at, end))),
            }
        })
    }

    /// 消费剩余输入, 生成分类后的 token 列表
    pub fn tokenize(self) -> Vec<Token> {
        let mut tokens: Vec<Token> = Vec::new();

        for (index, piece) in self.filter(|p| !p.text().is_empty()).enumerate() {
            match piece {
                Piece::Condition(text, span) => {
                    tokens.push(Token::new(text, span.start, DataType::Condition));
                }
                Piece::Clause(text, span) => {
                    let trimmed = text.trim();
                    let clause_start = span.start + (text.len() - text.trim_start().len());
                    // 首个子句或紧跟连接词的子句从 field 开始, 否则整段都是 value
                    let after_condition = index == 0
                        || tokens
                            .last()
                            .map_or(true, |t| t.data_type == DataType::Condition);

                    let mut offset = clause_start;
                    let mut word_index = 0;
                    for word in trimmed.split(' ') {
                        if word.is_empty() {
                            offset += 1;
                            continue;
                        }
                        let data_type = match (after_condition, word_index) {
                            (true, 0) => DataType::Field,
                            (true, 1) => DataType::Method,
                            _ => DataType::Value,
                        };
                        match tokens.last_mut() {
                            Some(last)
                                if data_type == DataType::Value
                                    && last.data_type == DataType::Value =>
                            {
                                last.append_text(word);
                            }
                            _ => tokens.push(Token::new(word, offset, data_type)),
                        }
                        offset += word.len() + 1;
                        word_index += 1;
                    }
                }
            }
        }

        tokens
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Piece<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(pending) = self.pending.take() {
            self.position = pending.span().end;
            return Some(pending);
        }
        if self.position > self.input.len() {
            return None;
        }

        let start = self.position;
        let mut cursor = start;
        while let Some(c) = self.char_at(cursor) {
            let after = cursor + c.len_utf8();
            if c.is_whitespace() {
                if let Some(keyword) = self.keyword_at(after) {
                    // 空白被消费, 连接词留到下一次返回
                    self.pending = Some(keyword);
                    self.position = keyword.span().start;
                    return Some(Piece::Clause(
                        &self.input[start..cursor],
                        Span::new(start, cursor),
                    ));
                }
            }
            cursor = after;
        }

        // 到达输入末尾
        self.position = self.input.len() + 1;
        Some(Piece::Clause(&self.input[start..], Span::new(start, self.input.len())))
    }
}

/// 便捷函数: 切分并分类整段查询
pub fn tokenize(raw: &str) -> Vec<Token> {
    Lexer::new(raw).tokenize()
}
