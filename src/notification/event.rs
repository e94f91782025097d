//! 通知事件与事件类型目录
//!
//! 事件类型由宿主的事件目录注入（`EventCatalog`），核心逻辑只依赖类型 id 和显示名。

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// 通用通知消息的类型 id
pub const NOTICE_MESSAGE: &str = "NoticeMessage";

/// 事件类型（稳定 id + 显示名）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventType {
    /// 稳定标识，用于过滤和配置
    pub id: String,
    /// 显示名，用于标题
    pub label: String,
}

impl EventType {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }

    /// 通用通知消息类型
    pub fn notice() -> Self {
        Self::new(NOTICE_MESSAGE, "Notice message")
    }

    /// 是否为通用通知消息
    pub fn is_notice(&self) -> bool {
        self.id == NOTICE_MESSAGE
    }
}

/// 事件类型目录
#[derive(Debug, Clone, Default)]
pub struct EventCatalog {
    types: Vec<EventType>,
}

impl EventCatalog {
    /// 从类型列表构建目录（按 id 去重，保留首次出现的顺序）
    pub fn new(types: impl IntoIterator<Item = EventType>) -> Self {
        let mut seen = HashSet::new();
        let types = types
            .into_iter()
            .filter(|t| !t.id.is_empty() && seen.insert(t.id.clone()))
            .collect();
        Self { types }
    }

    /// 解析 JSON 数组：`[{"id": "...", "label": "..."}]`
    pub fn from_json(content: &str) -> Result<Self> {
        let types: Vec<EventType> =
            serde_json::from_str(content).context("Invalid event catalog JSON")?;
        Ok(Self::new(types))
    }

    /// 从文件加载目录
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Cannot read event catalog {}", path.display()))?;
        Self::from_json(&content)
    }

    /// 按 id 查找类型
    pub fn get(&self, id: &str) -> Option<&EventType> {
        self.types.iter().find(|t| t.id == id)
    }

    /// 按 id 查找类型；未登记的 id 以 id 本身作为显示名
    pub fn resolve(&self, id: &str) -> EventType {
        self.get(id)
            .cloned()
            .unwrap_or_else(|| EventType::new(id, id))
    }

    /// 遍历目录中的类型
    pub fn iter(&self) -> impl Iterator<Item = &EventType> {
        self.types.iter()
    }

    /// 类型数量
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// 宿主投递的通知事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEvent {
    /// 事件类型
    pub event_type: EventType,
    /// 事件数据
    pub payload: Map<String, Value>,
    /// 接收时间
    pub timestamp: DateTime<Utc>,
}

impl NotificationEvent {
    pub fn new(event_type: EventType, payload: Map<String, Value>) -> Self {
        Self {
            event_type,
            payload,
            timestamp: Utc::now(),
        }
    }

    /// 从任意 JSON 值构建；`null` 视为空数据，其他非对象值报错
    pub fn from_value(event_type: EventType, payload: Value) -> Result<Self> {
        match payload {
            Value::Object(map) => Ok(Self::new(event_type, map)),
            Value::Null => Ok(Self::new(event_type, Map::new())),
            other => Err(anyhow!(
                "Event payload must be a JSON object, got: {}",
                other
            )),
        }
    }

    /// 通用通知消息
    pub fn notice(title: &str, text: &str) -> Self {
        let mut payload = Map::new();
        payload.insert("title".to_string(), Value::String(title.to_string()));
        payload.insert("text".to_string(), Value::String(text.to_string()));
        Self::new(EventType::notice(), payload)
    }

    /// 读取非空字符串字段
    pub fn field(&self, key: &str) -> Option<&str> {
        self.payload
            .get(key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }

    /// 字段是否存在且非空（null、""、false、0、[]、{} 视为空）
    pub fn has_value(&self, key: &str) -> bool {
        self.payload.get(key).is_some_and(is_truthy)
    }

    /// 读取非空字段的文本形式；非字符串值按 JSON 文本返回
    pub fn field_text(&self, key: &str) -> Option<String> {
        let value = self.payload.get(key).filter(|v| is_truthy(v))?;
        Some(match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
