//! REPL 的 Tab 补全与输入提示
//!
//! 补全时先规范化整行并解析光标所在的面板, 再把当前面板的每个候选项
//! 交给替换引擎生成新的整行文本。rustyline 只替换 `line[start..pos]`,
//! 所以候选项以 `start = 0` 的整段前缀形式给出, 光标之后的内容必须保持不变。

use crate::catalog::{CandidateItem, Candidates, Language};
use crate::lexer::normalize;
use crate::replace::apply_replacement;
use crate::resolver::{resolve_text, FocusState, PanelShow};
use crate::session::{insertion_text, placeholder_for};
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use std::borrow::Cow;

/// 检索框的 rustyline helper
pub struct FilterHelper {
    candidates: Candidates,
    language: Language,
    fill_id: bool,
}

impl FilterHelper {
    pub fn new(candidates: Candidates, language: Language, fill_id: bool) -> Self {
        Self {
            candidates,
            language,
            fill_id,
        }
    }

    fn panel_items(&self, focus: &FocusState) -> &[CandidateItem] {
        match focus.show {
            PanelShow::Field => &self.candidates.fields,
            PanelShow::Method => &self.candidates.methods,
            PanelShow::Condition => &self.candidates.conditions,
            PanelShow::Value => focus
                .field_id
                .as_deref()
                .map(|id| self.candidates.values_for(id))
                .unwrap_or(&[]),
            PanelShow::Hidden => &[],
        }
    }

    /// 光标处的补全候选, 以 (start, 候选) 形式返回
    pub fn suggestions(&self, line: &str, pos: usize) -> (usize, Vec<Pair>) {
        let pos = pos.min(line.len());
        let (text, cursor, focus) = resolve_text(line, pos, &self.candidates);
        let items = self.panel_items(&focus);

        // 锚点处已有文本时按前缀过滤, 没有匹配时列出全部
        let prefix = focus.next_text.to_lowercase();
        let filtered: Vec<&CandidateItem> = items
            .iter()
            .filter(|item| {
                prefix.is_empty()
                    || item.id.to_lowercase().starts_with(&prefix)
                    || item.name.to_lowercase().starts_with(&prefix)
            })
            .collect();
        let shown: Vec<&CandidateItem> = if filtered.is_empty() {
            items.iter().collect()
        } else {
            filtered
        };

        let tail = &text[cursor..];
        let pairs = shown
            .into_iter()
            .filter_map(|item| {
                let (chosen, separator) = insertion_text(item, focus.show, self.fill_id);
                let (new_line, _) = apply_replacement(&text, &focus, &chosen, separator);
                let normalized = normalize(&new_line);
                // 光标之后的内容被改动时无法用前缀替换表达
                let head = normalized
                    .strip_suffix(tail)
                    .or_else(|| new_line.strip_suffix(tail))?;
                Some(Pair {
                    display: display_name(item),
                    replacement: head.to_string(),
                })
            })
            .collect();

        (0, pairs)
    }

    /// 当前取值没有候选项时提示需要输入的字段
    pub fn placeholder(&self, line: &str, pos: usize) -> Option<String> {
        if line.trim().is_empty() {
            return None;
        }
        let (text, _, focus) = resolve_text(line, pos.min(line.len()), &self.candidates);
        let needs_input = focus.show == PanelShow::Value
            && focus.field_id.is_some()
            && self.panel_items(&focus).is_empty();
        if !needs_input {
            return None;
        }
        Some(placeholder_for(&text, self.language)).filter(|p| !p.is_empty())
    }
}

fn display_name(item: &CandidateItem) -> String {
    if item.id.trim() == item.name.trim() {
        item.name.clone()
    } else {
        format!("{} ({})", item.name, item.id.trim())
    }
}

impl Completer for FilterHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        Ok(self.suggestions(line, pos))
    }
}

impl Hinter for FilterHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        // 只在行尾提示
        if pos < line.len() {
            return None;
        }
        self.placeholder(line, pos)
    }
}

impl Highlighter for FilterHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(format!("\x1b[2m{}\x1b[0m", hint))
    }
}

impl Validator for FilterHelper {}

impl Helper for FilterHelper {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SearchType;
    use std::collections::HashMap;

    fn helper(language: Language) -> FilterHelper {
        let mut values = HashMap::new();
        values.insert(
            "severity".to_string(),
            vec![CandidateItem::new("1", "致命"), CandidateItem::new("2", "预警")],
        );
        let candidates = Candidates::for_search_type(SearchType::Alert, language).with_values(values);
        FilterHelper::new(candidates, language, false)
    }

    fn replacements(pairs: &[Pair]) -> Vec<&str> {
        pairs.iter().map(|p| p.replacement.as_str()).collect()
    }

    #[test]
    fn test_empty_line_lists_fields() {
        let helper = helper(Language::En);
        let (start, pairs) = helper.suggestions("", 0);
        assert_eq!(start, 0);
        assert_eq!(pairs.len(), helper.candidates.fields.len());
        assert!(replacements(&pairs).contains(&"severity : "));
        assert!(replacements(&pairs).contains(&"tags."));
    }

    #[test]
    fn test_value_completion() {
        let helper = helper(Language::En);
        let (_, pairs) = helper.suggestions("severity : ", 11);
        assert_eq!(replacements(&pairs), vec!["severity : 致命 ", "severity : 预警 "]);
        assert_eq!(pairs[0].display, "致命 (1)");
    }

    #[test]
    fn test_condition_completion_after_value() {
        let helper = helper(Language::En);
        let (_, pairs) = helper.suggestions("severity : 1 ", 13);
        assert_eq!(replacements(&pairs), vec!["severity : 1 AND ", "severity : 1 OR "]);
    }

    #[test]
    fn test_prefix_filters_known_token() {
        let helper = helper(Language::En);
        let line = "severity : 1 AND ";
        let (_, pairs) = helper.suggestions(line, 16);
        assert_eq!(replacements(&pairs), vec!["severity : 1 AND"]);
    }

    #[test]
    fn test_completion_keeps_text_after_cursor() {
        let helper = helper(Language::En);
        let line = "severity : 1 AND status : 2";
        let (_, pairs) = helper.suggestions(line, 8);
        assert_eq!(replacements(&pairs), vec!["severity"]);
        for pair in &pairs {
            let completed = format!("{}{}", pair.replacement, &line[8..]);
            assert!(completed.ends_with(" : 1 AND status : 2"));
        }
    }

    #[test]
    fn test_hidden_focus_has_no_candidates() {
        let helper = helper(Language::En);
        let (_, pairs) = helper.suggestions("nosuchfield : 1", 3);
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_placeholder_hint() {
        let helper = helper(Language::Zh);
        assert_eq!(helper.placeholder("status : ", 9).as_deref(), Some("请输入status"));
        assert_eq!(helper.placeholder("级别 : ", 9), None);
        assert_eq!(helper.placeholder("", 0), None);
    }
}
