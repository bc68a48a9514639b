//! The token definition for the filter query language.

/// The lexical category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Field,
    Method,
    Value,
    Condition,
    /// Part of a dotted field before the first `.`
    FieldKey,
    /// Part of a dotted field after the first `.`
    FieldValue,
}

impl DataType {
    /// The category expected after this one while the user keeps typing.
    ///
    /// `Field -> Method -> Value -> Condition -> Field`. Sub-token categories
    /// only ever appear inside a field, so they advance like a field.
    pub fn next(self) -> DataType {
        match self {
            DataType::Field | DataType::FieldKey | DataType::FieldValue => DataType::Method,
            DataType::Method => DataType::Value,
            DataType::Value => DataType::Condition,
            DataType::Condition => DataType::Field,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DataType::Field => "field",
            DataType::Method => "method",
            DataType::Value => "value",
            DataType::Condition => "condition",
            DataType::FieldKey => "fieldKey",
            DataType::FieldValue => "fieldValue",
        }
    }
}

/// Represents a span in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// The starting byte offset.
    pub start: usize,
    /// The ending byte offset.
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Inclusive on both ends: a cursor sitting right after the last
    /// character still belongs to the token.
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset <= self.end
    }
}

/// A classified, offset-tracked piece of a filter query.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub text: String,
    pub span: Span,
    pub data_type: DataType,
    /// Appended after the text when the query is re-serialized.
    pub separator: String,
    pub field_key: Option<Box<Token>>,
    pub field_value: Option<Box<Token>>,
}

impl Token {
    pub fn new(text: impl Into<String>, start: usize, data_type: DataType) -> Self {
        Self::with_separator(text, start, data_type, " ")
    }

    pub fn with_separator(
        text: impl Into<String>,
        start: usize,
        data_type: DataType,
        separator: &str,
    ) -> Self {
        let text = text.into();
        let span = Span::new(start, start + text.len());

        // 点号字段 (tags.hostname) 拆成 key / value 两个子 token
        let (field_key, field_value) = match (data_type, text.split_once('.')) {
            (DataType::Field, Some((key, value))) => {
                let key_token = Token::with_separator(key, start, DataType::FieldKey, ".");
                let value_token = Token::new(value, start + key.len() + 1, DataType::FieldValue);
                (Some(Box::new(key_token)), Some(Box::new(value_token)))
            }
            _ => (None, None),
        };

        Self {
            text,
            span,
            data_type,
            separator: separator.to_string(),
            field_key,
            field_value,
        }
    }

    /// The text followed by its separator.
    pub fn join_text(&self) -> String {
        format!("{}{}", self.text, self.separator)
    }

    /// Merges a following word into this token, keeping one space between them.
    pub fn append_text(&mut self, text: &str) {
        self.text.push(' ');
        self.text.push_str(text);
        self.span.end += text.len() + 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_cycle() {
        assert_eq!(DataType::Field.next(), DataType::Method);
        assert_eq!(DataType::Method.next(), DataType::Value);
        assert_eq!(DataType::Value.next(), DataType::Condition);
        assert_eq!(DataType::Condition.next(), DataType::Field);
    }

    #[test]
    fn test_dotted_field_split() {
        let token = Token::new("tags.hostname", 4, DataType::Field);
        let key = token.field_key.as_ref().unwrap();
        let value = token.field_value.as_ref().unwrap();

        assert_eq!(key.text, "tags");
        assert_eq!(key.span, Span::new(4, 8));
        assert_eq!(key.separator, ".");
        assert_eq!(value.text, "hostname");
        assert_eq!(value.span, Span::new(9, 17));
        assert_eq!(token.span, Span::new(4, 17));
    }

    #[test]
    fn test_dotted_value_is_not_split() {
        let token = Token::new("1.5", 0, DataType::Value);
        assert!(token.field_key.is_none());
        assert!(token.field_value.is_none());
    }

    #[test]
    fn test_append_text_extends_span() {
        let mut token = Token::new("disk", 10, DataType::Value);
        token.append_text("full");
        assert_eq!(token.text, "disk full");
        assert_eq!(token.span, Span::new(10, 19));
        assert_eq!(token.join_text(), "disk full ");
    }

    #[test]
    fn test_span_contains_is_inclusive() {
        let span = Span::new(2, 5);
        assert!(span.contains(2));
        assert!(span.contains(5));
        assert!(!span.contains(6));
        assert!(!span.contains(1));
    }
}
