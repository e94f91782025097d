//! 插件外壳 - 连接配置、事件与分发器

use anyhow::Result;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::PluginConfig;
use crate::host::HostServices;
use crate::notification::{
    compose, map_event, ChannelCredential, DispatchResult, Dispatcher, EventCatalog,
    HttpTransport, MessageParts, NotificationEvent, OutboundMessage, Transport, TransportShape,
    TypeFilter,
};
use crate::notification::transport::DEFAULT_TIMEOUT_SECS;

/// 测试消息标题
pub const TEST_TITLE: &str = "Server酱消息通知测试";
/// 测试消息正文
pub const TEST_TEXT: &str = "Server酱消息通知测试成功！";
/// 测试消息图片
pub const TEST_IMAGE: &str = "https://the7.ft07.com/sct/images/logo.png";

/// 宿主插件接口
pub trait Plugin {
    /// 加载（或重新加载）配置
    fn initialize(&mut self, config: PluginConfig) -> Result<()>;

    /// 处理一个事件；未发送时返回 None
    fn on_event(&self, event: &NotificationEvent) -> Option<DispatchResult>;

    /// 配置页面：(页面元素, 默认值)
    fn form_schema(&self) -> (Value, Value);

    /// 插件是否可用
    fn state(&self) -> bool;

    /// 退出插件
    fn shutdown(&mut self);
}

/// Server酱通知插件
pub struct ServerChanPlugin {
    host: Arc<dyn HostServices>,
    catalog: EventCatalog,
    notice_types: EventCatalog,
    transport: Option<Arc<dyn Transport>>,
    config: PluginConfig,
    credential: ChannelCredential,
    filter: TypeFilter,
    dispatcher: Option<Dispatcher>,
}

impl ServerChanPlugin {
    /// 创建插件，事件类型目录由宿主注入
    pub fn new(host: Arc<dyn HostServices>, catalog: EventCatalog) -> Self {
        Self {
            host,
            catalog,
            notice_types: EventCatalog::default(),
            transport: None,
            config: PluginConfig::default(),
            credential: ChannelCredential::default(),
            filter: TypeFilter::default(),
            dispatcher: None,
        }
    }

    /// 指定传输层（默认使用 reqwest）
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// 指定通知消息 `type` 目录（用于配置页面的选项）
    pub fn with_notice_types(mut self, notice_types: EventCatalog) -> Self {
        self.notice_types = notice_types;
        self
    }

    /// 当前配置
    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    /// 当前渠道凭据（由配置推导）
    pub fn credential(&self) -> &ChannelCredential {
        &self.credential
    }

    /// 事件类型目录
    pub fn catalog(&self) -> &EventCatalog {
        &self.catalog
    }

    /// 直接发送一条消息（不经过过滤）
    pub fn send_message(&self, message: &OutboundMessage) -> DispatchResult {
        match &self.dispatcher {
            Some(dispatcher) => dispatcher.deliver(&self.credential, message),
            None => DispatchResult::failed("plugin not initialized"),
        }
    }

    /// 发送测试消息
    pub fn send_test_message(&self) -> DispatchResult {
        let message = compose(
            MessageParts {
                title: Some(TEST_TITLE),
                text: Some(TEST_TEXT),
                image: Some(TEST_IMAGE),
                ..Default::default()
            },
            self.config.mapper_options(),
        );

        match message {
            Some(message) => self.send_message(&message),
            None => DispatchResult::failed("empty test message"),
        }
    }

    fn is_configured(&self) -> bool {
        self.credential.is_configured(self.config.transport)
    }

    fn run_test_trigger(&mut self) {
        let result = self.send_test_message();
        if result.success {
            self.host.system_message(TEST_TEXT);
        } else {
            warn!(
                error = ?result.error_message,
                "ServerChan test message failed"
            );
        }

        self.config.send_test_now = false;
        if let Err(e) = self.host.update_config(&self.config) {
            warn!(error = %e, "Failed to persist config after test send");
        }
    }

    fn notify_type_options(&self) -> Vec<Value> {
        select_options(&self.catalog)
    }

    fn notice_type_options(&self) -> Vec<Value> {
        select_options(&self.notice_types)
    }
}

fn select_options(catalog: &EventCatalog) -> Vec<Value> {
    catalog
        .iter()
        .map(|t| json!({ "title": t.label, "value": t.id }))
        .collect()
}

fn select_field(model: &str, label: &str, items: Vec<Value>, hint: &str) -> Value {
    json!({
        "component": "VCol",
        "props": { "cols": 12 },
        "content": [{
            "component": "VSelect",
            "props": {
                "model": model,
                "label": label,
                "multiple": true,
                "chips": true,
                "clearable": true,
                "items": items,
                "hint": hint,
                "persistent-hint": true
            }
        }]
    })
}

impl Plugin for ServerChanPlugin {
    fn initialize(&mut self, config: PluginConfig) -> Result<()> {
        let transport = match &self.transport {
            Some(t) => t.clone(),
            None => Arc::new(HttpTransport::new(config.timeout())?),
        };

        self.credential = config.credential();
        self.filter = config.type_filter();
        self.dispatcher = Some(Dispatcher::new(transport, config.transport));
        self.config = config;

        info!(
            enabled = self.config.enabled,
            configured = self.is_configured(),
            shape = ?self.config.transport,
            uid = ?self.credential.uid,
            enabled_types = self.config.enabled_types.len(),
            "ServerChan plugin initialized"
        );

        if self.config.send_test_now {
            self.run_test_trigger();
        }

        Ok(())
    }

    fn on_event(&self, event: &NotificationEvent) -> Option<DispatchResult> {
        if !self.state() {
            debug!(event_type = %event.event_type.id, "Plugin inactive, event ignored");
            return None;
        }

        if !self.filter.allows(event) {
            info!(event_type = %event.event_type.id, "Event type not enabled, skipped");
            return None;
        }

        let message = match map_event(event, self.config.mapper_options()) {
            Some(m) => m,
            None => {
                debug!(event_type = %event.event_type.id, "Event produced no message");
                return None;
            }
        };

        Some(self.send_message(&message))
    }

    fn form_schema(&self) -> (Value, Value) {
        let switch = |model: &str, label: &str, hint: &str| {
            json!({
                "component": "VCol",
                "props": { "cols": 12, "md": 4 },
                "content": [{
                    "component": "VSwitch",
                    "props": {
                        "model": model,
                        "label": label,
                        "hint": hint,
                        "persistent-hint": true
                    }
                }]
            })
        };
        let text_field = |model: &str, label: &str, hint: &str| {
            json!({
                "component": "VCol",
                "props": { "cols": 12 },
                "content": [{
                    "component": "VTextField",
                    "props": {
                        "model": model,
                        "label": label,
                        "hint": hint,
                        "persistent-hint": true,
                        "clearable": true
                    }
                }]
            })
        };

        let elements = json!([{
            "component": "VForm",
            "content": [
                {
                    "component": "VRow",
                    "content": [
                        switch("enabled", "启用插件", "开启后插件将处于激活状态"),
                        switch("sendTestNow", "立刻发送测试", "一次性任务，运行后自动关闭"),
                        switch("sendImageEnabled", "发送图片", "可选；关闭时，不发送图片")
                    ]
                },
                {
                    "component": "VRow",
                    "content": [
                        text_field("sendKey", "Server 酱 SendKey", "必填；从 SendKey 页面获取"),
                        text_field("uid", "Server 酱 UID", "可选；可从 SendKey 中提取，与 API URL 二选一"),
                        text_field("apiUrl", "Server 酱 API URL", "可选；可直接从 SendKey 页面复制，与 UID 二选一")
                    ]
                },
                {
                    "component": "VRow",
                    "content": [
                        {
                            "component": "VCol",
                            "props": { "cols": 12, "md": 6 },
                            "content": [{
                                "component": "VSelect",
                                "props": {
                                    "model": "transport",
                                    "label": "发送方式",
                                    "items": [
                                        { "title": "URL GET", "value": "url_get" },
                                        { "title": "URL POST", "value": "url_post" },
                                        { "title": "SendKey POST", "value": "key_post" }
                                    ],
                                    "hint": "URL 方式需要 UID 或 API URL；SendKey POST 只需要 SendKey",
                                    "persistent-hint": true
                                }
                            }]
                        },
                        {
                            "component": "VCol",
                            "props": { "cols": 12, "md": 6 },
                            "content": [{
                                "component": "VTextField",
                                "props": {
                                    "model": "timeoutSecs",
                                    "label": "请求超时（秒）",
                                    "type": "number",
                                    "hint": "单次请求的超时时间，默认 30 秒",
                                    "persistent-hint": true
                                }
                            }]
                        }
                    ]
                },
                {
                    "component": "VRow",
                    "content": [
                        select_field(
                            "enabledTypes",
                            "消息类型",
                            self.notify_type_options(),
                            "选择哪些类型的消息需要通过此渠道发送，缺省时不限制类型。"
                        ),
                        select_field(
                            "enabledNoticeTypes",
                            "通知消息子类型",
                            self.notice_type_options(),
                            "通用通知消息中允许发送的 type，缺省时不限制。"
                        )
                    ]
                }
            ]
        }]);

        let defaults = json!({
            "enabled": true,
            "sendTestNow": false,
            "sendImageEnabled": false,
            "sendKey": "",
            "uid": "",
            "apiUrl": "",
            "enabledTypes": [],
            "enabledNoticeTypes": [],
            "transport": TransportShape::default(),
            "timeoutSecs": DEFAULT_TIMEOUT_SECS
        });

        (elements, defaults)
    }

    fn state(&self) -> bool {
        self.dispatcher.is_some() && self.config.enabled && self.is_configured()
    }

    fn shutdown(&mut self) {
        if self.dispatcher.take().is_some() {
            info!("ServerChan plugin stopped");
        }
    }
}
