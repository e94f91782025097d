//! HTTP 传输层
//!
//! `Transport` 是分发器唯一的网络出口，测试中以 mock 实现替换。

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;

/// 默认请求超时（秒）
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// 发送方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportShape {
    /// 参数编码进 API URL 的查询串，GET 请求
    #[default]
    UrlGet,
    /// 参数以表单形式 POST 到 API URL
    UrlPost,
    /// 以 SendKey 推导接口地址，JSON POST（与官方 SDK 一致）
    KeyPost,
}

/// 请求方法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    PostForm,
    PostJson,
}

/// 出站请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    /// 完整地址（GET 时已包含查询串）
    pub url: String,
    /// 请求体参数（GET 时为空）
    pub params: Vec<(String, String)>,
}

/// 响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// 传输层 trait
pub trait Transport: Send + Sync {
    /// 执行一次请求
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// 基于 reqwest 的阻塞实现
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow!("Cannot create HTTP client: {}", e))?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        debug!(method = ?request.method, url = %request.url, "Sending ServerChan request");

        let builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::PostForm => self.client.post(&request.url).form(&request.params),
            HttpMethod::PostJson => {
                let body: Map<String, Value> = request
                    .params
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect();
                self.client
                    .post(&request.url)
                    .json(&body)
            }
        };

        let response = builder
            .send()
            .map_err(|e| anyhow!("HTTP request failed: {}", e))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| anyhow!("Failed to read response: {}", e))?;

        Ok(HttpResponse { status, body })
    }
}
