//! 检索框会话状态机
//!
//! ## 状态流转
//!
//! ```text
//!            focus / select
//!   Idle ──────────────────▶ FieldSuggest ─▶ MethodSuggest ─▶ ValueSuggest
//!    ▲                          ▲                                  │
//!    │ blur / clear / 无锚点     └──────── ConditionSuggest ◀───────┘
//!    └──────────────────────────────────────────────────────────────
//! ```
//!
//! 每次输入、光标移动或选择候选项后都从头重新解析, 最后一次事件生效。

use crate::catalog::{CandidateItem, Candidates, Language, SearchType};
use crate::favorites::Favorite;
use crate::lexer::normalize;
use crate::replace::apply_replacement;
use crate::resolver::{resolve_text, FocusState, PanelShow};
use tracing::debug;

/// 当前弹出的候选面板
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Panel {
    #[default]
    Idle,
    FieldSuggest,
    MethodSuggest,
    ValueSuggest,
    ConditionSuggest,
}

impl From<PanelShow> for Panel {
    fn from(show: PanelShow) -> Self {
        match show {
            PanelShow::Hidden => Panel::Idle,
            PanelShow::Field => Panel::FieldSuggest,
            PanelShow::Method => Panel::MethodSuggest,
            PanelShow::Value => Panel::ValueSuggest,
            PanelShow::Condition => Panel::ConditionSuggest,
        }
    }
}

/// 直接输入时的检索方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionType {
    /// 精确搜索, 整段加双引号
    Exact,
    /// 模糊匹配, 去掉双引号
    Fuzzy,
}

impl SuggestionType {
    pub const ALL: [SuggestionType; 2] = [SuggestionType::Exact, SuggestionType::Fuzzy];

    pub fn prefix(self) -> &'static str {
        match self {
            SuggestionType::Exact => "\"",
            SuggestionType::Fuzzy => "",
        }
    }

    pub fn label(self, language: Language) -> &'static str {
        match (self, language) {
            (SuggestionType::Exact, Language::Zh) => "精确搜索",
            (SuggestionType::Fuzzy, Language::Zh) => "模糊匹配",
            (SuggestionType::Exact, Language::En) => "Exact search",
            (SuggestionType::Fuzzy, Language::En) => "Fuzzy match",
        }
    }
}

/// 会话关心的按键
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Space,
    Backspace,
    ArrowUp,
    ArrowDown,
    Other,
}

/// 提交检索条件时发出的事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub search_type: SearchType,
    pub query: String,
}

/// 选中候选项时写入输入框的文本和随后的分隔符
///
/// 字段写入 `"{名称} : "`, 带特殊插入文本的字段 (例如 `tags.`) 原样写入且不追加分隔符。
pub fn insertion_text(item: &CandidateItem, show: PanelShow, fill_id: bool) -> (String, &'static str) {
    match show {
        PanelShow::Field => match &item.special {
            Some(special) => (special.clone(), ""),
            None => (format!("{} : ", item.name), " "),
        },
        _ if fill_id => (item.id.clone(), " "),
        _ => (item.name.clone(), " "),
    }
}

/// 根据最后一个连接词之后的子句生成 "请输入{字段}" 提示, 子句已有取值时为空
pub fn placeholder_for(value: &str, language: Language) -> String {
    let input = value.trim();
    let last_connector = [("AND", input.rfind("AND")), ("OR", input.rfind("OR"))]
        .into_iter()
        .filter_map(|(keyword, index)| index.map(|i| i + keyword.len()))
        .max();
    let clause = match last_connector {
        Some(after) => input[after..].trim(),
        None => input,
    };

    let mut parts = clause.split(':').map(str::trim);
    let key = parts.next().unwrap_or_default();
    let value = parts.next().unwrap_or_default();
    if !value.is_empty() {
        return String::new();
    }
    match language {
        Language::Zh => format!("请输入{}", key),
        Language::En => format!("Please enter {}", key),
    }
}

/// 按需给整段输入加上或去掉引号
pub fn wrap_with_prefix(value: &str, prefix: &str) -> String {
    let quoted = value.len() >= 2 && value.starts_with('"') && value.ends_with('"');
    match prefix {
        "\"" if quoted => value.to_string(),
        "\"" => format!("\"{}\"", value),
        "" if quoted => value[1..value.len() - 1].to_string(),
        _ => value.to_string(),
    }
}

/// 检索框组件的状态
#[derive(Debug, Clone)]
pub struct FilterInput {
    search_type: SearchType,
    candidates: Candidates,
    language: Language,
    /// 选择候选值时填 id 还是名称
    fill_id: bool,

    value: String,
    previous_value: String,
    cursor: usize,
    focus: FocusState,
    panel: Panel,
    placeholder: String,

    manual_input: bool,
    /// 从空白开始直接输入, 此时只提示精确/模糊两种检索方式
    only_input: bool,
    show_dropdown: bool,
    suggestion_index: usize,
    /// 焦点移到了面板内部 (例如编辑收藏名称), 此时失焦不提交
    blur_in_panel: bool,
}

impl FilterInput {
    pub fn new(search_type: SearchType, candidates: Candidates) -> Self {
        Self {
            search_type,
            candidates,
            language: Language::Zh,
            fill_id: false,
            value: String::new(),
            previous_value: String::new(),
            cursor: 0,
            focus: FocusState::default(),
            panel: Panel::Idle,
            placeholder: String::new(),
            manual_input: false,
            only_input: false,
            show_dropdown: false,
            suggestion_index: 0,
            blur_in_panel: false,
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn with_fill_id(mut self, fill_id: bool) -> Self {
        self.fill_id = fill_id;
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn panel(&self) -> Panel {
        self.panel
    }

    pub fn focus_state(&self) -> &FocusState {
        &self.focus
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn search_type(&self) -> SearchType {
        self.search_type
    }

    pub fn candidates(&self) -> &Candidates {
        &self.candidates
    }

    pub fn is_manual_input(&self) -> bool {
        self.manual_input
    }

    pub fn is_only_input(&self) -> bool {
        self.only_input
    }

    pub fn is_dropdown_shown(&self) -> bool {
        self.show_dropdown
    }

    pub fn suggestion(&self) -> SuggestionType {
        SuggestionType::ALL[self.suggestion_index]
    }

    pub fn set_blur_in_panel(&mut self, blur_in_panel: bool) {
        self.blur_in_panel = blur_in_panel;
    }

    /// 外部直接设置输入值 (例如选择最近搜索或收藏)
    pub fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
        self.cursor = self.value.len();
        if value.is_empty() {
            self.manual_input = false;
            self.only_input = false;
            self.show_dropdown = false;
        }
        self.previous_value = self.value.clone();
    }

    /// 用户输入
    pub fn input(&mut self, text: &str, cursor: usize) {
        self.placeholder.clear();
        self.value = text.to_string();
        self.cursor = cursor.min(self.value.len());
        self.manual_input = !self.value.is_empty();

        // 从空白开始输入时只展示检索方式下拉框
        if self.previous_value.is_empty() && !self.value.is_empty() {
            self.only_input = true;
            self.show_dropdown = true;
            self.close_panels();
        }
        if self.value.is_empty() {
            self.only_input = false;
            self.show_dropdown = false;
        }
        self.previous_value = self.value.clone();
    }

    fn close_panels(&mut self) {
        self.blur_in_panel = false;
        self.panel = Panel::Idle;
    }

    /// 聚焦或光标移动: 重新解析并切换面板
    pub fn focus(&mut self, cursor: usize) -> Panel {
        if self.value.trim().is_empty() {
            self.value.clear();
            self.cursor = 0;
            self.focus = FocusState {
                show: PanelShow::Field,
                replace_start: Some(0),
                ..FocusState::default()
            };
            return self.transition(Panel::FieldSuggest);
        }
        if self.only_input {
            self.show_dropdown = true;
            return self.panel;
        }

        let (text, cursor, focus) = resolve_text(&self.value, cursor, &self.candidates);
        self.value = text;
        self.cursor = cursor;
        self.focus = focus;

        let show = self.focus.show;
        let next = match show {
            PanelShow::Hidden => {
                self.focus = FocusState::default();
                self.placeholder.clear();
                Panel::Idle
            }
            PanelShow::Value if self.menu_items().is_empty() => {
                if self.focus.field_id.is_some() {
                    self.update_placeholder();
                }
                Panel::Idle
            }
            _ => {
                self.placeholder.clear();
                show.into()
            }
        };
        self.transition(next)
    }

    fn transition(&mut self, next: Panel) -> Panel {
        if self.panel != next {
            debug!(from = ?self.panel, to = ?next, value = %self.value, "panel transition");
        }
        self.panel = next;
        next
    }

    /// 当前面板的候选列表
    pub fn menu_items(&self) -> &[CandidateItem] {
        match self.focus.show {
            PanelShow::Field => &self.candidates.fields,
            PanelShow::Method => &self.candidates.methods,
            PanelShow::Condition => &self.candidates.conditions,
            PanelShow::Value => self
                .focus
                .field_id
                .as_deref()
                .map(|id| self.candidates.values_for(id))
                .unwrap_or(&[]),
            PanelShow::Hidden => &[],
        }
    }

    fn update_placeholder(&mut self) {
        self.placeholder = placeholder_for(&self.value, self.language);
    }

    /// 把文本拼接到当前焦点处, 然后重新聚焦
    fn replace_input_value(&mut self, text: &str, separator: &str) -> Panel {
        let (value, cursor) = apply_replacement(&self.value, &self.focus, text, separator);
        self.value = value;
        self.cursor = cursor;
        self.previous_value = self.value.clone();
        self.focus(cursor)
    }

    /// 选择方法 / 连接词 / 取值候选
    pub fn select_menu_item(&mut self, item: &CandidateItem) -> Panel {
        self.only_input = false;
        let (text, separator) = insertion_text(item, self.focus.show, self.fill_id);
        self.replace_input_value(&text, separator)
    }

    /// 选择字段
    pub fn select_field(&mut self, item: &CandidateItem) -> Panel {
        self.only_input = false;
        let (text, separator) = insertion_text(item, PanelShow::Field, self.fill_id);

        if self.value.is_empty() {
            self.value = text;
            self.cursor = self.value.len();
            self.previous_value = self.value.clone();
            return self.focus(self.cursor);
        }
        self.replace_input_value(&text, separator)
    }

    /// 选择精确 / 模糊检索
    pub fn select_suggestion(&mut self, kind: SuggestionType) {
        self.value = wrap_with_prefix(&self.value, kind.prefix());
        self.cursor = self.value.len();
        self.show_dropdown = false;
    }

    /// 上下键切换检索方式
    pub fn move_suggestion(&mut self, down: bool) -> SuggestionType {
        let len = SuggestionType::ALL.len();
        self.suggestion_index = if down {
            (self.suggestion_index + 1) % len
        } else {
            (self.suggestion_index + len - 1) % len
        };
        self.suggestion()
    }

    /// 处理按键, 回车时返回提交事件
    pub fn handle_key(&mut self, key: Key, cursor: usize) -> Option<ChangeEvent> {
        match key {
            Key::Enter => self.commit(),
            Key::Space | Key::Backspace if !self.only_input => {
                self.focus(cursor);
                None
            }
            Key::ArrowUp | Key::ArrowDown if self.show_dropdown => {
                self.move_suggestion(key == Key::ArrowDown);
                None
            }
            _ => {
                self.manual_input = true;
                None
            }
        }
    }

    /// 提交当前条件并关闭面板, 直接输入模式下先应用选中的检索方式
    pub fn commit(&mut self) -> Option<ChangeEvent> {
        if self.blur_in_panel {
            return None;
        }
        if self.only_input && self.show_dropdown && !self.value.trim().is_empty() {
            self.select_suggestion(self.suggestion());
        }
        // 提交的条件不保留末尾空白
        self.value = normalize(&self.value).trim_end().to_string();
        self.cursor = self.cursor.min(self.value.len());
        self.previous_value = self.value.clone();
        self.transition(Panel::Idle);
        Some(ChangeEvent {
            search_type: self.search_type,
            query: self.value.clone(),
        })
    }

    /// 选择最近搜索或收藏: 整体替换输入值并立即提交
    pub fn select_saved_query(&mut self, query: &str) -> Option<ChangeEvent> {
        self.blur_in_panel = false;
        self.only_input = false;
        self.show_dropdown = false;
        self.placeholder.clear();
        self.set_value(query);
        self.focus = FocusState::default();
        self.commit()
    }

    pub fn select_favorite(&mut self, favorite: &Favorite) -> Option<ChangeEvent> {
        self.select_saved_query(&favorite.query_string)
    }

    /// 失焦: 直接输入模式下按精确搜索提交
    pub fn blur(&mut self) -> Option<ChangeEvent> {
        if self.blur_in_panel {
            return None;
        }
        if self.show_dropdown {
            self.select_suggestion(SuggestionType::Exact);
        }
        let event = self.commit();
        self.show_dropdown = false;
        event
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.previous_value.clear();
        self.placeholder.clear();
        self.cursor = 0;
        self.manual_input = false;
        self.only_input = false;
        self.show_dropdown = false;
        self.focus = FocusState::default();
        self.transition(Panel::Idle);
    }
}
