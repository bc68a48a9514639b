//! Cursor resolver: decides which suggestion panel belongs to a cursor
//! position and where a chosen suggestion would be spliced.

use crate::catalog::Candidates;
use crate::lexer::{normalize_with_cursor, tokenize};
use crate::token::{DataType, Token};
use tracing::debug;

/// Which suggestion panel should be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelShow {
    #[default]
    Hidden,
    Field,
    Method,
    Value,
    Condition,
}

impl PanelShow {
    pub fn is_shown(self) -> bool {
        self != PanelShow::Hidden
    }
}

impl From<DataType> for PanelShow {
    fn from(data_type: DataType) -> Self {
        match data_type {
            DataType::Field | DataType::FieldKey => PanelShow::Field,
            DataType::Method => PanelShow::Method,
            DataType::Value | DataType::FieldValue => PanelShow::Value,
            DataType::Condition => PanelShow::Condition,
        }
    }
}

/// Resolved description of the panel to show and its splice anchor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FocusState {
    pub show: PanelShow,
    /// Byte offset where a selection is spliced in. `None` when nothing is anchored.
    pub replace_start: Option<usize>,
    /// Text currently occupying the anchor; empty when inserting into a gap.
    pub next_text: String,
    /// Field whose value candidates are listed, set only for `PanelShow::Value`.
    pub field_id: Option<String>,
}

impl FocusState {
    pub fn hidden() -> Self {
        Self::default()
    }

    fn insert_at(show: PanelShow, offset: usize) -> Self {
        Self {
            show,
            replace_start: Some(offset),
            next_text: String::new(),
            field_id: None,
        }
    }

    fn replace(show: PanelShow, token: &Token) -> Self {
        Self {
            show,
            replace_start: Some(token.span.start),
            next_text: token.text.clone(),
            field_id: None,
        }
    }

    fn with_field_id(mut self, field_id: Option<String>) -> Self {
        self.field_id = field_id;
        self
    }
}

/// Resolves the field id for a field token: catalog id or name first, then
/// the key part of a dotted field.
fn field_id_of(token: &Token, candidates: &Candidates) -> Option<String> {
    candidates
        .find_field_id(&token.text)
        .map(str::to_string)
        .or_else(|| token.field_key.as_ref().map(|key| key.text.clone()))
}

/// Nearest field token at or before `index`.
fn preceding_field(tokens: &[Token], index: usize) -> Option<&Token> {
    tokens[..=index]
        .iter()
        .rev()
        .find(|t| t.data_type == DataType::Field)
}

/// Resolves the focus for `cursor` over an already tokenized query.
///
/// The leftmost token whose inclusive span contains the cursor wins, so a
/// cursor sitting on a shared boundary belongs to the token on its left.
pub fn resolve(raw: &str, cursor: usize, tokens: &[Token], candidates: &Candidates) -> FocusState {
    let focus = match tokens.iter().position(|t| t.span.contains(cursor)) {
        None => resolve_gap(tokens, candidates),
        Some(index) => resolve_token(cursor, tokens, index, candidates),
    };
    debug!(query = raw, cursor, show = ?focus.show, replace_start = ?focus.replace_start, "resolved focus");
    focus
}

/// Normalizes the query, maps the cursor into it and resolves the focus.
///
/// Returns the normalized text alongside so callers can splice into the
/// same string the offsets refer to.
pub fn resolve_text(raw: &str, cursor: usize, candidates: &Candidates) -> (String, usize, FocusState) {
    let (text, cursor) = normalize_with_cursor(raw, cursor);
    let tokens = tokenize(&text);
    let focus = resolve(&text, cursor, &tokens, candidates);
    (text, cursor, focus)
}

fn resolve_gap(tokens: &[Token], candidates: &Candidates) -> FocusState {
    let Some(last) = tokens.last() else {
        return FocusState::insert_at(PanelShow::Field, 0);
    };

    let next = last.data_type.next();
    let offset = last.span.end + 1;
    if next != DataType::Value {
        return FocusState::insert_at(next.into(), offset);
    }

    match preceding_field(tokens, tokens.len() - 1) {
        Some(field) => FocusState::insert_at(PanelShow::Value, offset)
            .with_field_id(field_id_of(field, candidates)),
        None => FocusState::hidden(),
    }
}

fn resolve_token(cursor: usize, tokens: &[Token], index: usize, candidates: &Candidates) -> FocusState {
    let token = &tokens[index];

    if token.data_type == DataType::Value {
        return match preceding_field(tokens, index) {
            Some(field) => FocusState::replace(PanelShow::Value, token)
                .with_field_id(field_id_of(field, candidates)),
            None => FocusState::hidden(),
        };
    }

    if candidates
        .list_for(token.data_type)
        .iter()
        .any(|item| item.matches(&token.text))
    {
        return FocusState::replace(token.data_type.into(), token);
    }

    if let (Some(key), Some(value)) = (&token.field_key, &token.field_value) {
        if key.span.contains(cursor) {
            return FocusState::replace(PanelShow::Field, token);
        }
        if value.span.contains(cursor) {
            return FocusState::replace(PanelShow::Value, value)
                .with_field_id(Some(key.text.clone()));
        }
    }

    FocusState::hidden()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Language, SearchType};

    fn alert_candidates() -> Candidates {
        Candidates::for_search_type(SearchType::Alert, Language::Zh)
    }

    fn resolve_at(raw: &str, cursor: usize) -> FocusState {
        let tokens = tokenize(raw);
        resolve(raw, cursor, &tokens, &alert_candidates())
    }

    #[test]
    fn test_empty_query_suggests_fields() {
        let focus = resolve_at("", 0);
        assert_eq!(focus.show, PanelShow::Field);
        assert_eq!(focus.replace_start, Some(0));
        assert_eq!(focus.next_text, "");
    }

    #[test]
    fn test_value_after_trailing_method() {
        let raw = "severity : ";
        let focus = resolve_at(raw, raw.len());
        assert_eq!(focus.show, PanelShow::Value);
        assert_eq!(focus.field_id.as_deref(), Some("severity"));
        assert_eq!(focus.replace_start, Some(11));
        assert_eq!(focus.next_text, "");
    }

    #[test]
    fn test_value_field_resolved_by_name() {
        let raw = "级别 : ";
        let focus = resolve_at(raw, raw.len());
        assert_eq!(focus.field_id.as_deref(), Some("severity"));
    }

    #[test]
    fn test_condition_after_last_value() {
        let raw = "a : 1 AND b : 2 ";
        let focus = resolve_at(raw, raw.len());
        assert_eq!(focus.show, PanelShow::Condition);
        assert_eq!(focus.replace_start, Some(16));
    }

    #[test]
    fn test_end_of_string_stays_on_last_value() {
        // 末尾没有空格时光标仍在最后一个 value 的闭区间内
        let raw = "a : 1 AND b : 2";
        let focus = resolve_at(raw, raw.len());
        assert_eq!(focus.show, PanelShow::Value);
        assert_eq!(focus.replace_start, Some(14));
        assert_eq!(focus.next_text, "2");
        assert_eq!(focus.field_id, None);
    }

    #[test]
    fn test_cursor_at_value_end_stays_on_value() {
        let raw = "status : 1";
        let focus = resolve_at(raw, raw.len());
        assert_eq!(focus.show, PanelShow::Value);
        assert_eq!(focus.replace_start, Some(9));
        assert_eq!(focus.next_text, "1");
        assert_eq!(focus.field_id.as_deref(), Some("status"));
    }

    #[test]
    fn test_method_after_field() {
        let focus = resolve_at("status ", 7);
        assert_eq!(focus.show, PanelShow::Method);
        assert_eq!(focus.replace_start, Some(7));
    }

    #[test]
    fn test_field_after_condition() {
        let raw = "status : 1 AND ";
        let focus = resolve_at(raw, raw.len());
        assert_eq!(focus.show, PanelShow::Field);
        assert_eq!(focus.replace_start, Some(15));
    }

    #[test]
    fn test_known_tokens_anchor_in_place() {
        let raw = "status : 1 AND severity : 2";
        let focus = resolve_at(raw, 3);
        assert_eq!(focus.show, PanelShow::Field);
        assert_eq!(focus.replace_start, Some(0));
        assert_eq!(focus.next_text, "status");

        let focus = resolve_at(raw, 8);
        assert_eq!(focus.show, PanelShow::Method);
        assert_eq!(focus.next_text, ":");

        let focus = resolve_at(raw, 12);
        assert_eq!(focus.show, PanelShow::Condition);
        assert_eq!(focus.replace_start, Some(11));
        assert_eq!(focus.next_text, "AND");
    }

    #[test]
    fn test_shared_boundary_prefers_left_token() {
        // "a:" 中间没有空格时不会出现共享边界, 构造相邻 token
        let tokens = vec![
            Token::new("status", 0, DataType::Field),
            Token::new(":", 6, DataType::Method),
        ];
        let focus = resolve("status:", 6, &tokens, &alert_candidates());
        assert_eq!(focus.show, PanelShow::Field);
        assert_eq!(focus.next_text, "status");
    }

    #[test]
    fn test_unknown_field_hides_panel() {
        let focus = resolve_at("nosuchfield : 1", 3);
        assert_eq!(focus, FocusState::hidden());
    }

    #[test]
    fn test_dotted_field_key_and_value() {
        let raw = "tags.hostname : web01";
        let focus = resolve_at(raw, 2);
        assert_eq!(focus.show, PanelShow::Field);
        assert_eq!(focus.replace_start, Some(0));
        assert_eq!(focus.next_text, "tags.hostname");

        let focus = resolve_at(raw, 8);
        assert_eq!(focus.show, PanelShow::Value);
        assert_eq!(focus.replace_start, Some(5));
        assert_eq!(focus.next_text, "hostname");
        assert_eq!(focus.field_id.as_deref(), Some("tags"));
    }

    #[test]
    fn test_value_after_dotted_field_uses_key() {
        let raw = "tags.hostname : ";
        let focus = resolve_at(raw, raw.len());
        assert_eq!(focus.show, PanelShow::Value);
        assert_eq!(focus.field_id.as_deref(), Some("tags"));
    }

    #[test]
    fn test_value_of_unknown_field_has_no_id() {
        let raw = "custom : ";
        let focus = resolve_at(raw, raw.len());
        assert_eq!(focus.show, PanelShow::Value);
        assert_eq!(focus.field_id, None);
    }

    #[test]
    fn test_resolve_text_normalizes_first() {
        let (text, cursor, focus) = resolve_text("  severity   :  ", 16, &alert_candidates());
        assert_eq!(text, "severity : ");
        assert_eq!(cursor, 11);
        assert_eq!(focus.show, PanelShow::Value);
    }
}
