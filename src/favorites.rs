//! 最近搜索记录与收藏, 以 JSON 文件持久化

use crate::catalog::SearchType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// 默认保留的最近搜索条数
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

#[derive(Debug, Error)]
pub enum FavoriteError {
    #[error("收藏名称不能为空")]
    BlankName,

    #[error("不能输入emoji表情: {0}")]
    Emoji(String),

    #[error("名称重复: {0}")]
    DuplicateName(String),

    #[error("收藏不存在: {0}")]
    NotFound(u64),

    #[error("无法读写收藏文件 {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("无法解析收藏文件 {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// 一条收藏
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favorite {
    pub id: u64,
    pub name: String,
    pub query_string: String,
}

/// 是否包含 emoji (杂项符号与常见表情区段)
pub fn contains_emoji(text: &str) -> bool {
    text.chars().any(|c| {
        matches!(c as u32,
            0x1F300..=0x1F3FF | 0x1F400..=0x1F64F | 0x1F680..=0x1F6FF | 0x2600..=0x2B55)
    })
}

/// 最近搜索, 新的在前, 去重, 超出上限时丢弃最旧的
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchHistory {
    entries: Vec<String>,
}

impl SearchHistory {
    pub fn push(&mut self, query: &str, limit: usize) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }
        self.entries.retain(|entry| entry != query);
        self.entries.insert(0, query.to_string());
        self.entries.truncate(limit);
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreData {
    #[serde(default)]
    next_id: u64,
    #[serde(default)]
    history: BTreeMap<String, SearchHistory>,
    #[serde(default)]
    favorites: BTreeMap<String, Vec<Favorite>>,
}

/// 按检索类型保存最近搜索和收藏
#[derive(Debug, Clone)]
pub struct FavoriteStore {
    path: Option<PathBuf>,
    history_limit: usize,
    data: StoreData,
}

impl FavoriteStore {
    /// 仅保存在内存中的存储
    pub fn in_memory(history_limit: usize) -> Self {
        Self {
            path: None,
            history_limit,
            data: StoreData::default(),
        }
    }

    /// 从 JSON 文件加载, 文件不存在时返回空存储
    pub fn load<P: AsRef<Path>>(path: P, history_limit: usize) -> Result<Self, FavoriteError> {
        let path = path.as_ref().to_path_buf();
        let data = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|source| FavoriteError::Io {
                path: path.clone(),
                source,
            })?;
            serde_json::from_str(&content).map_err(|source| FavoriteError::Json {
                path: path.clone(),
                source,
            })?
        } else {
            debug!(path = %path.display(), "favorites file not found, starting empty");
            StoreData::default()
        };

        Ok(Self {
            path: Some(path),
            history_limit,
            data,
        })
    }

    /// 写回文件; 内存存储直接返回
    pub fn save(&self) -> Result<(), FavoriteError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let content = serde_json::to_string_pretty(&self.data).map_err(|source| FavoriteError::Json {
            path: path.clone(),
            source,
        })?;
        fs::write(path, content).map_err(|source| FavoriteError::Io {
            path: path.clone(),
            source,
        })
    }

    pub fn record_search(&mut self, search_type: SearchType, query: &str) {
        let limit = self.history_limit;
        self.data
            .history
            .entry(search_type.as_str().to_string())
            .or_default()
            .push(query, limit);
    }

    pub fn history(&self, search_type: SearchType) -> &[String] {
        self.data
            .history
            .get(search_type.as_str())
            .map(SearchHistory::entries)
            .unwrap_or(&[])
    }

    pub fn favorites(&self, search_type: SearchType) -> &[Favorite] {
        self.data
            .favorites
            .get(search_type.as_str())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn validate_name(&self, search_type: SearchType, name: &str, skip_id: Option<u64>) -> Result<String, FavoriteError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FavoriteError::BlankName);
        }
        if contains_emoji(name) {
            return Err(FavoriteError::Emoji(name.to_string()));
        }
        let duplicate = self
            .favorites(search_type)
            .iter()
            .any(|f| f.name == name && Some(f.id) != skip_id);
        if duplicate {
            return Err(FavoriteError::DuplicateName(name.to_string()));
        }
        Ok(name.to_string())
    }

    pub fn create(&mut self, search_type: SearchType, name: &str, query: &str) -> Result<Favorite, FavoriteError> {
        let name = self.validate_name(search_type, name, None)?;
        self.data.next_id += 1;
        let favorite = Favorite {
            id: self.data.next_id,
            name,
            query_string: query.to_string(),
        };
        // 新收藏排在最前
        self.data
            .favorites
            .entry(search_type.as_str().to_string())
            .or_default()
            .insert(0, favorite.clone());
        Ok(favorite)
    }

    pub fn rename(&mut self, search_type: SearchType, id: u64, name: &str) -> Result<(), FavoriteError> {
        let name = self.validate_name(search_type, name, Some(id))?;
        let favorite = self
            .data
            .favorites
            .get_mut(search_type.as_str())
            .and_then(|list| list.iter_mut().find(|f| f.id == id))
            .ok_or(FavoriteError::NotFound(id))?;
        favorite.name = name;
        Ok(())
    }

    pub fn delete(&mut self, search_type: SearchType, id: u64) -> Result<Favorite, FavoriteError> {
        let list = self
            .data
            .favorites
            .get_mut(search_type.as_str())
            .ok_or(FavoriteError::NotFound(id))?;
        let index = list
            .iter()
            .position(|f| f.id == id)
            .ok_or(FavoriteError::NotFound(id))?;
        Ok(list.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_is_bounded_and_deduplicated() {
        let mut store = FavoriteStore::in_memory(3);
        for query in ["a : 1", "b : 2", "a : 1", "c : 3", "d : 4", "  "] {
            store.record_search(SearchType::Alert, query);
        }
        assert_eq!(store.history(SearchType::Alert), ["d : 4", "c : 3", "a : 1"]);
        assert!(store.history(SearchType::Event).is_empty());
    }

    #[test]
    fn test_create_rejects_duplicates_and_emoji() {
        let mut store = FavoriteStore::in_memory(DEFAULT_HISTORY_LIMIT);
        let first = store.create(SearchType::Alert, "严重告警", "severity : 1").unwrap();
        assert_eq!(first.id, 1);

        assert!(matches!(
            store.create(SearchType::Alert, "严重告警", "severity : 2"),
            Err(FavoriteError::DuplicateName(_))
        ));
        assert!(matches!(
            store.create(SearchType::Alert, "fire 🔥", "x"),
            Err(FavoriteError::Emoji(_))
        ));
        assert!(matches!(
            store.create(SearchType::Alert, "   ", "x"),
            Err(FavoriteError::BlankName)
        ));

        // 不同检索类型之间名称可以重复
        assert!(store.create(SearchType::Event, "严重告警", "severity : 1").is_ok());
    }

    #[test]
    fn test_rename_and_delete() {
        let mut store = FavoriteStore::in_memory(DEFAULT_HISTORY_LIMIT);
        let a = store.create(SearchType::Alert, "a", "status : 1").unwrap();
        let b = store.create(SearchType::Alert, "b", "status : 2").unwrap();
        assert_eq!(store.favorites(SearchType::Alert)[0].id, b.id);

        // 改成自己原来的名字不算重复
        store.rename(SearchType::Alert, a.id, "a").unwrap();
        assert!(matches!(
            store.rename(SearchType::Alert, a.id, "b"),
            Err(FavoriteError::DuplicateName(_))
        ));
        store.rename(SearchType::Alert, a.id, "renamed").unwrap();

        let removed = store.delete(SearchType::Alert, a.id).unwrap();
        assert_eq!(removed.name, "renamed");
        assert!(matches!(
            store.delete(SearchType::Alert, a.id),
            Err(FavoriteError::NotFound(_))
        ));
    }

    #[test]
    fn test_persistence_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("favorites.json");

        let mut store = FavoriteStore::load(&path, DEFAULT_HISTORY_LIMIT).unwrap();
        store.record_search(SearchType::Action, "status : failure");
        store.create(SearchType::Action, "失败", "status : failure").unwrap();
        store.save().unwrap();

        let reloaded = FavoriteStore::load(&path, DEFAULT_HISTORY_LIMIT).unwrap();
        assert_eq!(reloaded.history(SearchType::Action), ["status : failure"]);
        assert_eq!(reloaded.favorites(SearchType::Action)[0].name, "失败");
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("favorites.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            FavoriteStore::load(&path, DEFAULT_HISTORY_LIMIT),
            Err(FavoriteError::Json { .. })
        ));
    }

    #[test]
    fn test_contains_emoji() {
        assert!(contains_emoji("☀"));
        assert!(contains_emoji("🚀 launch"));
        assert!(!contains_emoji("普通名称 abc"));
    }
}
