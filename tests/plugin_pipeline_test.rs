//! 插件端到端流程：事件 → 过滤 → 映射 → 分发（mock 传输层）

use anyhow::{anyhow, Result};
use serde_json::json;
use serverchan_notify::notification::{HttpMethod, HttpRequest, HttpResponse};
use serverchan_notify::{
    CliHost, ConfigStore, EventCatalog, EventType, HostServices, NotificationEvent, Plugin,
    PluginConfig, ServerChanPlugin, Transport, TransportShape,
};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// 按顺序返回预设响应，并记录请求
struct ScriptedTransport {
    responses: Mutex<Vec<Result<HttpResponse>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    fn new(responses: Vec<Result<HttpResponse>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(anyhow!("no scripted response"));
        }
        responses.remove(0)
    }
}

fn ok(body: &str) -> Result<HttpResponse> {
    Ok(HttpResponse {
        status: 200,
        body: body.to_string(),
    })
}

fn catalog() -> EventCatalog {
    EventCatalog::new(vec![
        EventType::notice(),
        EventType::new("TransferComplete", "Transfer complete"),
        EventType::new("SiteDeleted", "Site deleted"),
    ])
}

fn setup(
    config: PluginConfig,
    responses: Vec<Result<HttpResponse>>,
) -> (ServerChanPlugin, Arc<ScriptedTransport>, TempDir) {
    let dir = TempDir::new().unwrap();
    let host: Arc<dyn HostServices> =
        Arc::new(CliHost::new(ConfigStore::new(dir.path().join("config.json"))));
    let transport = Arc::new(ScriptedTransport::new(responses));
    let mut plugin = ServerChanPlugin::new(host, catalog()).with_transport(transport.clone());
    plugin.initialize(config).unwrap();
    (plugin, transport, dir)
}

#[test]
fn event_stream_with_mixed_outcomes() {
    let config = PluginConfig {
        send_key: "sctp5tSECRET".to_string(),
        enabled_types: vec!["NoticeMessage".to_string(), "TransferComplete".to_string()],
        ..Default::default()
    };
    let (plugin, transport, _dir) = setup(
        config,
        vec![
            ok(r#"{"code":0,"message":"","data":{"pushid":"1"}}"#),
            ok(r#"{"errno":1,"errmsg":"bad key"}"#),
            Err(anyhow!("timed out")),
        ],
    );

    let notice = NotificationEvent::notice("整理完成", "movie.mkv");
    let transfer = NotificationEvent::from_value(
        catalog().resolve("TransferComplete"),
        json!({"path": "/media/movie.mkv"}),
    )
    .unwrap();
    let deleted = NotificationEvent::from_value(catalog().resolve("SiteDeleted"), json!({"site": "x"})).unwrap();
    let routed = NotificationEvent::from_value(
        EventType::notice(),
        json!({"channel": "telegram", "title": "T"}),
    )
    .unwrap();

    let first = plugin.on_event(&notice).unwrap();
    assert!(first.success);

    let second = plugin.on_event(&transfer).unwrap();
    assert!(!second.success);
    assert_eq!(second.error_message.as_deref(), Some("bad key"));

    // 类型未开启 / 已路由到其他渠道：不发送
    assert!(plugin.on_event(&deleted).is_none());
    assert!(plugin.on_event(&routed).is_none());

    let third = plugin.on_event(&NotificationEvent::notice("again", "")).unwrap();
    assert!(!third.success);
    assert!(third.error_message.unwrap().contains("timed out"));

    let requests = transport.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests.iter().all(|r| r.method == HttpMethod::Get));
    assert!(requests[1].url.contains("title=Transfer+complete+triggered"));
}

#[test]
fn key_post_shape_sends_json_params() {
    let config = PluginConfig {
        send_key: "SCTlegacy".to_string(),
        transport: TransportShape::KeyPost,
        send_image_enabled: true,
        ..Default::default()
    };
    let (plugin, transport, _dir) = setup(config, vec![ok(r#"{"code":0}"#)]);

    let event = NotificationEvent::from_value(
        EventType::notice(),
        json!({"title": "T", "text": "B", "image": "http://x/i.png", "tags": "movie"}),
    )
    .unwrap();
    assert!(plugin.on_event(&event).unwrap().success);

    let request = &transport.requests()[0];
    assert_eq!(request.method, HttpMethod::PostJson);
    assert_eq!(request.url, "https://sctapi.ftqq.com/SCTlegacy.send");
    assert!(request
        .params
        .contains(&("desp".to_string(), "B\n![image](http://x/i.png)".to_string())));
    assert!(request.params.contains(&("tags".to_string(), "movie".to_string())));
}

#[test]
fn test_trigger_persists_cleared_flag() {
    let config = PluginConfig {
        send_key: "sctp5tSECRET".to_string(),
        send_test_now: true,
        ..Default::default()
    };
    let (plugin, transport, dir) = setup(config, vec![ok(r#"{"errno":0}"#)]);

    assert_eq!(transport.requests().len(), 1);
    assert!(!plugin.config().send_test_now);

    let saved = ConfigStore::new(dir.path().join("config.json")).load().unwrap();
    assert!(!saved.send_test_now);
    assert_eq!(saved.send_key, "sctp5tSECRET");
}

#[test]
fn env_send_key_is_not_written_back() {
    let config = PluginConfig {
        send_test_now: true,
        ..Default::default()
    }
    .with_send_key_override("sctp9tENVSECRET");
    let (plugin, transport, dir) = setup(config, vec![ok(r#"{"errno":0}"#)]);

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].url.contains("sctp9tENVSECRET"));
    assert_eq!(plugin.config().effective_send_key(), "sctp9tENVSECRET");

    let path = dir.path().join("config.json");
    let on_disk = std::fs::read_to_string(&path).unwrap();
    assert!(!on_disk.contains("ENVSECRET"));

    let saved = ConfigStore::new(path).load().unwrap();
    assert!(!saved.send_test_now);
    assert!(saved.send_key.is_empty());
}

#[test]
fn unconfigured_plugin_never_touches_network() {
    let (plugin, transport, _dir) = setup(PluginConfig::default(), vec![ok(r#"{"errno":0}"#)]);

    assert!(!plugin.state());
    assert!(plugin.on_event(&NotificationEvent::notice("T", "B")).is_none());

    let result = plugin.send_test_message();
    assert!(!result.success);
    assert_eq!(result.error_message.as_deref(), Some("channel not configured"));
    assert!(transport.requests().is_empty());
}
