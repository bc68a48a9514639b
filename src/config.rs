//! 配置模块，负责加载JSON配置文件

use crate::catalog::{CandidateItem, Candidates, Language, SearchType, TopoNode};
use crate::favorites::DEFAULT_HISTORY_LIMIT;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("配置文件不存在: {0}")]
    NotFound(PathBuf),

    #[error("无法读取配置文件 {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("无法解析JSON配置文件 {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("配置项 {field} 无效: {message}")]
    Validation { field: String, message: String },
}

/// 检索框配置, 所有字段均可省略
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterInputConfig {
    /// 界面语言, 英文模式下字段名显示为 id
    pub language: Language,
    /// 选择取值候选时填入 id 还是名称
    pub fill_id: bool,
    /// 检索类型到数据库表名的映射
    pub table_mapping: HashMap<String, String>,
    /// 不带字段的全文检索子句匹配的列
    pub full_text_column: String,
    /// 最近搜索保留条数
    pub history_limit: usize,
    /// 收藏与最近搜索的持久化文件
    pub favorites_path: Option<PathBuf>,
    /// 字段 id -> 取值候选 (top N)
    pub values: HashMap<String, Vec<CandidateItem>>,
    /// 追加到内置字段列表的字段, 按检索类型区分
    pub extra_fields: HashMap<SearchType, Vec<CandidateItem>>,
    /// 集群拓扑节点, 作为 set_id 的取值候选
    pub set_list: Vec<TopoNode>,
    /// 模块拓扑节点, 作为 module_id 的取值候选
    pub module_list: Vec<TopoNode>,
}

impl Default for FilterInputConfig {
    fn default() -> Self {
        Self {
            language: Language::Zh,
            fill_id: false,
            table_mapping: HashMap::new(),
            full_text_column: "description".to_string(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            favorites_path: None,
            values: HashMap::new(),
            extra_fields: HashMap::new(),
            set_list: Vec::new(),
            module_list: Vec::new(),
        }
    }
}

impl FilterInputConfig {
    /// 从JSON文件加载配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();

        // 检查文件是否存在
        if !path_ref.exists() {
            return Err(ConfigError::NotFound(path_ref.to_path_buf()));
        }

        // 读取文件内容
        let content = fs::read_to_string(path_ref).map_err(|source| ConfigError::Io {
            path: path_ref.to_path_buf(),
            source,
        })?;

        // 解析JSON
        let config: FilterInputConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path_ref.to_path_buf(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.history_limit == 0 {
            return Err(ConfigError::Validation {
                field: "history_limit".to_string(),
                message: "必须大于0".to_string(),
            });
        }
        if self.full_text_column.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "full_text_column".to_string(),
                message: "不能为空".to_string(),
            });
        }
        for (search_type, fields) in &self.extra_fields {
            if let Some(field) = fields.iter().find(|f| f.id.trim().is_empty()) {
                return Err(ConfigError::Validation {
                    field: format!("extra_fields.{}", search_type),
                    message: format!("字段 '{}' 缺少 id", field.name),
                });
            }
        }
        Ok(())
    }

    /// 获取检索类型对应的表名，如果不存在则返回检索类型名
    pub fn get_table_name(&self, search_type: SearchType) -> String {
        self.table_mapping
            .get(search_type.as_str())
            .cloned()
            .unwrap_or_else(|| search_type.as_str().to_string())
    }

    /// 构造指定检索类型的候选列表
    pub fn candidates(&self, search_type: SearchType) -> Candidates {
        let mut values = self.values.clone();
        for (field_id, nodes) in [("set_id", &self.set_list), ("module_id", &self.module_list)] {
            if !nodes.is_empty() {
                values.insert(
                    field_id.to_string(),
                    nodes.iter().cloned().map(CandidateItem::from).collect(),
                );
            }
        }
        let mut candidates =
            Candidates::for_search_type(search_type, self.language).with_values(values);
        if let Some(extra) = self.extra_fields.get(&search_type) {
            let extra = extra.iter().cloned().map(|mut item| {
                if self.language == Language::En {
                    item.name = item.id.clone();
                }
                item
            });
            candidates.extend_fields(extra);
        }
        candidates
    }
}
