//! 事件类型过滤

use std::collections::HashSet;

use super::event::{EventType, NotificationEvent};

/// 类型是否在启用集合中（空集合表示不限制）
pub fn should_deliver(event_type: &EventType, enabled: &HashSet<String>) -> bool {
    enabled.is_empty() || enabled.contains(&event_type.id)
}

/// 事件过滤器
#[derive(Debug, Clone, Default)]
pub struct TypeFilter {
    /// 启用的事件类型 id
    enabled_types: HashSet<String>,
    /// 通用通知消息中允许的 `type` 字段值
    enabled_notice_types: HashSet<String>,
}

impl TypeFilter {
    pub fn new<I, J, S, T>(enabled_types: I, enabled_notice_types: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            enabled_types: enabled_types.into_iter().map(Into::into).collect(),
            enabled_notice_types: enabled_notice_types.into_iter().map(Into::into).collect(),
        }
    }

    /// 判断事件是否应该发送
    pub fn allows(&self, event: &NotificationEvent) -> bool {
        if !should_deliver(&event.event_type, &self.enabled_types) {
            return false;
        }

        if event.event_type.is_notice() && !self.enabled_notice_types.is_empty() {
            if let Some(notice_type) = event.field_text("type") {
                return self.enabled_notice_types.contains(&notice_type);
            }
        }

        true
    }

    pub fn enabled_types(&self) -> &HashSet<String> {
        &self.enabled_types
    }
}
