//! ServerChan 渠道凭据：SendKey / UID / API URL 推导

use regex::Regex;
use std::sync::OnceLock;

use super::transport::TransportShape;

/// Server酱³ 推送域名
const PUSH_DOMAIN: &str = "push.ft07.com";

/// Turbo 版（旧 SendKey）接口地址
const TURBO_API: &str = "https://sctapi.ftqq.com";

fn sendkey_uid_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^sctp(\d+)t").expect("sendkey uid regex"))
}

fn api_url_uid_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^https://(\d+)\.push\.ft07\.com").expect("api url uid regex"))
}

/// 从 SendKey（`sctp<uid>t...`）提取 UID
pub fn uid_from_send_key(send_key: &str) -> Option<String> {
    sendkey_uid_re()
        .captures(send_key)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// 从 API URL 提取 UID
pub fn uid_from_api_url(api_url: &str) -> Option<String> {
    api_url_uid_re()
        .captures(api_url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// 由 UID 和 SendKey 生成推送地址
pub fn push_url(uid: &str, send_key: &str) -> String {
    format!("https://{}.{}/send/{}.send", uid, PUSH_DOMAIN, send_key)
}

/// 仅凭 SendKey 推导接口地址（与官方 SDK 一致）
pub fn sdk_url(send_key: &str) -> String {
    match uid_from_send_key(send_key) {
        Some(uid) => push_url(&uid, send_key),
        None => format!("{}/{}.send", TURBO_API, send_key),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// 渠道凭据
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelCredential {
    pub send_key: String,
    pub uid: Option<String>,
    pub api_url: Option<String>,
}

impl ChannelCredential {
    /// 构建凭据并补全可推导的字段
    pub fn new(send_key: impl Into<String>, uid: Option<String>, api_url: Option<String>) -> Self {
        let send_key = send_key.into().trim().to_string();
        let mut uid = non_empty(uid);
        let mut api_url = non_empty(api_url);

        if uid.is_none() && !send_key.is_empty() {
            uid = uid_from_send_key(&send_key);
        }

        if api_url.is_none() && !send_key.is_empty() {
            if let Some(uid) = &uid {
                api_url = Some(push_url(uid, &send_key));
            }
        }

        if uid.is_none() {
            if let Some(url) = &api_url {
                uid = uid_from_api_url(url);
            }
        }

        Self {
            send_key,
            uid,
            api_url,
        }
    }

    /// 指定发送方式下的接口地址；无法推导时返回 None
    pub fn endpoint(&self, shape: TransportShape) -> Option<String> {
        match shape {
            TransportShape::UrlGet | TransportShape::UrlPost => self.api_url.clone(),
            TransportShape::KeyPost => {
                if self.send_key.is_empty() {
                    None
                } else {
                    Some(sdk_url(&self.send_key))
                }
            }
        }
    }

    /// 渠道是否已配置
    pub fn is_configured(&self, shape: TransportShape) -> bool {
        self.endpoint(shape).is_some()
    }
}
