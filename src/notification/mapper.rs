//! 事件 -> 推送消息映射

use serde::Serialize;
use serde_json::Value;

use super::event::NotificationEvent;

/// 待发送的推送消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    /// 标题
    pub title: String,
    /// 正文（对应接口的 desp）
    pub body: String,
    /// 标签
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    /// 已追加到正文的图片地址
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// 消息卡片摘要
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short: Option<String>,
}

impl OutboundMessage {
    /// 创建消息
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            tags: None,
            image: None,
            short: None,
        }
    }

    /// 设置标签
    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = Some(tags.into());
        self
    }

    /// 设置消息卡片摘要
    pub fn with_short(mut self, short: impl Into<String>) -> Self {
        self.short = Some(short.into());
        self
    }

    /// 追加图片引用（Markdown 格式）
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        let image = image.into();
        self.body = format!("{}\n![image]({})", self.body, image);
        self.image = Some(image);
        self
    }
}

/// 映射选项
#[derive(Debug, Clone, Copy, Default)]
pub struct MapperOptions {
    /// 是否发送图片
    pub send_image_enabled: bool,
}

/// 消息原始字段
#[derive(Debug, Clone, Default)]
pub struct MessageParts<'a> {
    pub title: Option<&'a str>,
    pub text: Option<&'a str>,
    pub image: Option<&'a str>,
    pub tags: Option<&'a str>,
    pub short: Option<&'a str>,
}

/// 组装消息；标题和正文都为空时返回 None
pub fn compose(parts: MessageParts<'_>, options: MapperOptions) -> Option<OutboundMessage> {
    let title = parts.title.unwrap_or_default();
    let text = parts.text.unwrap_or_default();

    if title.is_empty() && text.is_empty() {
        return None;
    }

    // 接口要求标题非空
    let title = if title.is_empty() { text } else { title };
    let mut message = OutboundMessage::new(title, text);

    if let Some(tags) = parts.tags.filter(|s| !s.is_empty()) {
        message = message.with_tags(tags);
    }
    if let Some(short) = parts.short.filter(|s| !s.is_empty()) {
        message = message.with_short(short);
    }
    if options.send_image_enabled {
        if let Some(image) = parts.image.filter(|s| !s.is_empty()) {
            message = message.with_image(image);
        }
    }

    Some(message)
}

/// 将事件映射为推送消息
///
/// 以下情况返回 None：
/// - 事件数据带有非空 `channel`（已由宿主路由到其他渠道）
/// - 标题和正文都为空
pub fn map_event(event: &NotificationEvent, options: MapperOptions) -> Option<OutboundMessage> {
    if event.has_value("channel") {
        return None;
    }

    if event.event_type.is_notice() {
        compose(
            MessageParts {
                title: event.field("title"),
                text: event.field("text"),
                image: event.field("image"),
                tags: event.field("tags"),
                short: event.field("short"),
            },
            options,
        )
    } else {
        let title = format!("{} triggered", event.event_type.label);
        let body = Value::Object(event.payload.clone()).to_string();
        compose(
            MessageParts {
                title: Some(title.as_str()),
                text: Some(body.as_str()),
                image: event.field("image"),
                tags: event.field("tags"),
                short: event.field("short"),
            },
            options,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::event::EventType;
    use serde_json::json;

    fn event(event_type: EventType, payload: Value) -> NotificationEvent {
        NotificationEvent::from_value(event_type, payload).unwrap()
    }

    #[test]
    fn test_notice_maps_title_and_text() {
        let msg = map_event(&NotificationEvent::notice("T", "B"), MapperOptions::default()).unwrap();
        assert_eq!(msg.title, "T");
        assert_eq!(msg.body, "B");
        assert_eq!(msg.tags, None);
    }

    #[test]
    fn test_other_event_uses_label_and_payload() {
        let payload = json!({"name": "movie.mkv", "size": 42});
        let e = event(EventType::new("DownloadAdded", "Download added"), payload.clone());
        let msg = map_event(&e, MapperOptions::default()).unwrap();
        assert_eq!(msg.title, "Download added triggered");
        assert_eq!(msg.body, payload.to_string());
    }

    #[test]
    fn test_routed_event_is_suppressed() {
        let e = event(
            EventType::notice(),
            json!({"channel": "telegram", "title": "T", "text": "B"}),
        );
        assert_eq!(map_event(&e, MapperOptions::default()), None);

        let other = event(EventType::new("PluginReload", "Plugin reload"), json!({"channel": "wechat"}));
        assert_eq!(map_event(&other, MapperOptions::default()), None);
    }

    #[test]
    fn test_object_channel_is_suppressed() {
        let e = event(
            EventType::notice(),
            json!({"channel": {"name": "telegram"}, "title": "T", "text": "B"}),
        );
        assert_eq!(map_event(&e, MapperOptions::default()), None);
    }

    #[test]
    fn test_numeric_channel_is_suppressed() {
        let e = event(EventType::notice(), json!({"channel": 3, "title": "T"}));
        assert_eq!(map_event(&e, MapperOptions::default()), None);
    }

    #[test]
    fn test_falsy_channel_is_not_suppressed() {
        for channel in [json!(null), json!(0), json!(false), json!([]), json!({})] {
            let e = event(EventType::notice(), json!({"channel": channel, "title": "T"}));
            assert!(map_event(&e, MapperOptions::default()).is_some());
        }
    }

    #[test]
    fn test_empty_channel_is_not_suppressed() {
        let e = event(EventType::notice(), json!({"channel": "", "title": "T"}));
        assert!(map_event(&e, MapperOptions::default()).is_some());
    }

    #[test]
    fn test_empty_notice_is_skipped() {
        let e = event(EventType::notice(), json!({"title": "", "image": "http://x/i.png"}));
        assert_eq!(map_event(&e, MapperOptions { send_image_enabled: true }), None);
    }

    #[test]
    fn test_title_falls_back_to_text() {
        let e = event(EventType::notice(), json!({"text": "only body"}));
        let msg = map_event(&e, MapperOptions::default()).unwrap();
        assert_eq!(msg.title, "only body");
        assert_eq!(msg.body, "only body");
    }

    #[test]
    fn test_image_enabled_appends_reference() {
        let e = event(
            EventType::notice(),
            json!({"title": "T", "text": "B", "image": "http://x/i.png"}),
        );
        let msg = map_event(&e, MapperOptions { send_image_enabled: true }).unwrap();
        assert_eq!(msg.body, "B\n![image](http://x/i.png)");
        assert_eq!(msg.image.as_deref(), Some("http://x/i.png"));
    }

    #[test]
    fn test_image_disabled_leaves_body() {
        let e = event(
            EventType::notice(),
            json!({"title": "T", "text": "B", "image": "http://x/i.png"}),
        );
        let msg = map_event(&e, MapperOptions::default()).unwrap();
        assert_eq!(msg.body, "B");
        assert_eq!(msg.image, None);
    }

    #[test]
    fn test_tags_and_short_pass_through() {
        let e = event(
            EventType::notice(),
            json!({"title": "T", "text": "B", "tags": "media|download", "short": "s"}),
        );
        let msg = map_event(&e, MapperOptions::default()).unwrap();
        assert_eq!(msg.tags.as_deref(), Some("media|download"));
        assert_eq!(msg.short.as_deref(), Some("s"));
    }
}
