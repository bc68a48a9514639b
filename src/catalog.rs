//! 候选项目录: 字段 / 方法 / 连接词 / 字段取值
//!
//! 字段列表按检索类型区分 (告警、事件、处理记录、故障), 与检索框下拉面板一一对应。

use crate::token::DataType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// 一个候选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateItem {
    pub id: String,
    pub name: String,
    /// 选中后直接插入的文本, 例如 `tags.` 或 `set_id : `
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special: Option<String>,
}

impl CandidateItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            special: None,
        }
    }

    pub fn with_special(mut self, special: impl Into<String>) -> Self {
        self.special = Some(special.into());
        self
    }

    /// id 或名称 (去掉首尾空白后) 与文本相同
    pub fn matches(&self, text: &str) -> bool {
        self.id.trim() == text || self.name.trim() == text
    }
}

/// 检索类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    #[default]
    Alert,
    Event,
    Action,
    Incident,
}

impl SearchType {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchType::Alert => "alert",
            SearchType::Event => "event",
            SearchType::Action => "action",
            SearchType::Incident => "incident",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "alert" => Ok(SearchType::Alert),
            "event" => Ok(SearchType::Event),
            "action" => Ok(SearchType::Action),
            "incident" => Ok(SearchType::Incident),
            other => Err(format!("unknown search type: {}", other)),
        }
    }
}

/// 界面语言, 英文模式下字段名直接展示 id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Zh,
    En,
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "zh" | "zh-cn" => Ok(Language::Zh),
            "en" => Ok(Language::En),
            other => Err(format!("unknown language: {}", other)),
        }
    }
}

/// 内置字段列表
pub fn builtin_fields(search_type: SearchType) -> Vec<CandidateItem> {
    let pairs: &[(&str, &str)] = match search_type {
        SearchType::Alert => &[
            ("id", "告警ID"),
            ("alert_name", "告警名称"),
            ("status", "状态"),
            ("description", "告警内容"),
            ("severity", "级别"),
            ("metric", "指标ID"),
            ("ip", "目标IP"),
            ("ipv6", "目标IPv6"),
            ("bk_host_id", "主机ID"),
            ("bk_cloud_id", "目标云区域ID"),
            ("bk_service_instance_id", "目标服务实例ID"),
            ("appointee", "负责人"),
            ("assignee", "通知人"),
            ("follower", "关注人"),
            ("strategy_name", "策略名称"),
            ("strategy_id", "策略ID"),
            ("labels", "策略标签"),
            ("tags", "维度"),
            ("action_id", "处理记录ID"),
            ("plugin_id", "告警来源"),
            ("stage", "处理阶段"),
            ("set_id", "集群"),
            ("module_id", "模块"),
        ],
        SearchType::Event => &[
            ("id", "全局事件ID"),
            ("event_id", "事件ID"),
            ("plugin_id", "插件ID"),
            ("alert_name", "告警名称"),
            ("status", "状态"),
            ("description", "描述"),
            ("severity", "级别"),
            ("metric", "指标ID"),
            ("assignee", "负责人"),
            ("strategy_name", "策略名称"),
            ("strategy_id", "策略ID"),
            ("target_type", "目标类型"),
            ("target", "目标"),
            ("category", "分类"),
        ],
        SearchType::Action => &[
            ("id", "处理记录ID"),
            ("action_name", "套餐名称"),
            ("action_config_id", "套餐ID"),
            ("strategy_name", "策略名称"),
            ("alerts", "关联告警"),
            ("status", "状态"),
            ("bk_biz_name", "业务名"),
            ("bk_biz_id", "业务ID"),
            ("operate_target_string", "执行对象"),
            ("action_plugin_type", "套餐类型"),
            ("operator", "负责人"),
            ("create_time", "开始时间"),
            ("end_time", "结束时间"),
        ],
        SearchType::Incident => &[
            ("id", "故障ID"),
            ("incident_name", "故障名称"),
            ("incident_reason", "故障原因"),
            ("bk_biz_id", "业务ID"),
            ("status", "故障状态"),
            ("level", "故障级别"),
            ("assignees", "负责人"),
            ("handlers", "处理人"),
            ("labels", "标签"),
            ("create_time", "故障检出时间"),
            ("update_time", "故障更新时间"),
            ("begin_time", "故障开始时间"),
            ("end_time", "故障结束时间"),
            ("snapshot", "故障图谱快照"),
        ],
    };

    pairs
        .iter()
        .map(|(id, name)| {
            let item = CandidateItem::new(*id, *name);
            match (search_type, *id) {
                (SearchType::Alert, "tags") => item.with_special("tags."),
                (SearchType::Alert, "set_id") => item.with_special("set_id : "),
                (SearchType::Alert, "module_id") => item.with_special("module_id : "),
                _ => item,
            }
        })
        .collect()
}

/// 拓扑节点 (集群 / 模块), 作为 set_id / module_id 的取值候选
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopoNode {
    pub id: u64,
    pub name: String,
}

impl From<TopoNode> for CandidateItem {
    fn from(node: TopoNode) -> Self {
        CandidateItem::new(node.id.to_string(), format!("{}({})", node.name, node.id))
    }
}

/// 解析光标所需的全部候选列表
#[derive(Debug, Clone, PartialEq)]
pub struct Candidates {
    pub fields: Vec<CandidateItem>,
    pub methods: Vec<CandidateItem>,
    pub conditions: Vec<CandidateItem>,
    /// 字段 id -> 取值候选 (top N)
    pub values: HashMap<String, Vec<CandidateItem>>,
}

impl Default for Candidates {
    fn default() -> Self {
        Self {
            fields: Vec::new(),
            methods: vec![CandidateItem::new(":", ":")],
            conditions: vec![
                CandidateItem::new("AND", "AND"),
                CandidateItem::new("OR", "OR"),
            ],
            values: HashMap::new(),
        }
    }
}

impl Candidates {
    pub fn for_search_type(search_type: SearchType, language: Language) -> Self {
        let mut fields = builtin_fields(search_type);
        if language == Language::En {
            for field in &mut fields {
                field.name = field.id.clone();
            }
        }
        Self {
            fields,
            ..Default::default()
        }
    }

    pub fn with_values(mut self, values: HashMap<String, Vec<CandidateItem>>) -> Self {
        self.values = values;
        self
    }

    /// 按 token 类型取对应的候选列表
    pub fn list_for(&self, data_type: DataType) -> &[CandidateItem] {
        match data_type {
            DataType::Field => &self.fields,
            DataType::Method => &self.methods,
            DataType::Condition => &self.conditions,
            DataType::Value | DataType::FieldKey | DataType::FieldValue => &[],
        }
    }

    /// 按 id 或名称查找字段 id, 找不到返回 None
    pub fn find_field_id(&self, text: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.id == text || field.name == text)
            .map(|field| field.id.as_str())
    }

    /// 字段的取值候选, 未知字段返回空列表
    pub fn values_for(&self, field_id: &str) -> &[CandidateItem] {
        self.values.get(field_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 合并额外字段, id 已存在时覆盖
    pub fn extend_fields(&mut self, extra: impl IntoIterator<Item = CandidateItem>) {
        for item in extra {
            match self.fields.iter_mut().find(|f| f.id == item.id) {
                Some(existing) => *existing = item,
                None => self.fields.push(item),
            }
        }
    }
}
