//! 生成服务客户端：
//! - 基于 ureq 的阻塞 HTTP 调用（Anthropic Messages 协议）
//! - 状态码映射为错误分类；可选的有限次指数退避重试（认证错误不重试）

use std::{thread, time::Duration};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{config::GenerationSettings, error::HuggableError, prompt::Prompt};

const BACKOFF_BASE: Duration = Duration::from_millis(500);

/// 生成服务返回的原始文本（可能带围栏，也可能为空）
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawResponse(pub(crate) String);

impl RawResponse {
    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

/// 一次提示词 → 一次原始响应
pub(crate) trait Generate {
    fn generate(&self, prompt: &Prompt) -> Result<RawResponse, HuggableError>;
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// 单次请求失败：错误本身 + 是否值得重试
struct Failure {
    error: HuggableError,
    retryable: bool,
}

pub(crate) struct GenerationClient {
    agent: ureq::Agent,
    api_key: String,
    messages_url: Url,
    settings: GenerationSettings,
}

impl GenerationClient {
    /// 凭据缺失时直接失败，不发起任何网络请求
    pub(crate) fn new(api_key: Option<String>, settings: GenerationSettings) -> Result<Self, HuggableError> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| HuggableError::Authentication("未提供 API Key".to_string()))?;
        let messages_url = messages_url(&settings.endpoint)?;
        let agent = ureq::AgentBuilder::new()
            .timeout(settings.timeout)
            .user_agent(concat!("huggable/", env!("CARGO_PKG_VERSION")))
            .build();
        Ok(GenerationClient { agent, api_key, messages_url, settings })
    }

    fn send_once(&self, prompt: &Prompt) -> Result<RawResponse, Failure> {
        let body = MessagesRequest {
            model: &self.settings.model,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            messages: vec![Message { role: "user", content: prompt.as_str() }],
        };
        let result = self
            .agent
            .post(self.messages_url.as_str())
            .set("x-api-key", &self.api_key)
            .set("anthropic-version", &self.settings.api_version)
            .set("content-type", "application/json")
            .send_json(&body);
        match result {
            Ok(resp) => parse_success(resp).map_err(|error| Failure { error, retryable: false }),
            Err(ureq::Error::Status(code, resp)) => Err(status_failure(code, resp)),
            Err(ureq::Error::Transport(t)) => Err(Failure {
                error: HuggableError::Transport(format!("{}: {}", self.messages_url, t)),
                retryable: true,
            }),
        }
    }
}

impl Generate for GenerationClient {
    fn generate(&self, prompt: &Prompt) -> Result<RawResponse, HuggableError> {
        info!(
            "POST {} model={} max_tokens={} prompt_bytes={}",
            self.messages_url,
            self.settings.model,
            self.settings.max_tokens,
            prompt.as_str().len()
        );
        let mut attempt = 0;
        loop {
            match self.send_once(prompt) {
                Ok(raw) => {
                    debug!("收到响应 {} 字节", raw.as_str().len());
                    return Ok(raw);
                }
                Err(Failure { error, retryable }) if retryable && attempt < self.settings.retries => {
                    let delay = BACKOFF_BASE * 2u32.pow(attempt);
                    attempt += 1;
                    warn!("第 {} 次重试（{:?} 后）: {}", attempt, delay, error);
                    thread::sleep(delay);
                }
                Err(Failure { error, .. }) => return Err(error),
            }
        }
    }
}

/// `{endpoint}/v1/messages`；endpoint 可带路径前缀（代理场景）
fn messages_url(endpoint: &Url) -> Result<Url, HuggableError> {
    let mut base = endpoint.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("v1/messages")
        .map_err(|e| HuggableError::Transport(format!("无效的请求地址 {}: {}", endpoint, e)))
}

fn parse_success(resp: ureq::Response) -> Result<RawResponse, HuggableError> {
    let text = resp
        .into_string()
        .map_err(|e| HuggableError::Transport(format!("读取响应失败: {}", e)))?;
    let parsed: MessagesResponse = serde_json::from_str(&text)
        .map_err(|e| HuggableError::Service(format!("无法解析响应: {}", e)))?;
    if parsed.stop_reason.as_deref() == Some("max_tokens") {
        warn!("输出达到 max_tokens 上限，生成的文档可能不完整");
    }
    let blocks: Vec<String> = parsed
        .content
        .into_iter()
        .filter(|b| b.kind == "text")
        .filter_map(|b| b.text)
        .collect();
    if blocks.is_empty() {
        return Err(HuggableError::Service("响应中没有文本内容".to_string()));
    }
    Ok(RawResponse(blocks.concat()))
}

fn status_failure(code: u16, resp: ureq::Response) -> Failure {
    let body = resp.into_string().unwrap_or_default();
    let detail = serde_json::from_str::<ApiErrorBody>(&body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.trim().chars().take(200).collect());
    let message = format!("HTTP {}: {}", code, detail);
    match code {
        401 | 403 => Failure { error: HuggableError::Authentication(message), retryable: false },
        429 | 500..=599 => Failure { error: HuggableError::Service(message), retryable: true },
        _ => Failure { error: HuggableError::Service(message), retryable: false },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{normalize::GenerationRequest, prompt::build_prompt};
    use std::net::TcpListener;

    struct Captured {
        url: String,
        api_key: Option<String>,
        version: Option<String>,
        body: serde_json::Value,
    }

    /// 依次返回给定响应的本地模拟服务；线程结束时返回收到的请求
    fn mock(responses: Vec<(u16, String)>) -> (String, thread::JoinHandle<Vec<Captured>>) {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();
        let handle = thread::spawn(move || {
            let mut captured = Vec::new();
            for (status, body) in responses {
                let mut rq = server.recv().unwrap();
                let header = |name: &'static str| {
                    rq.headers().iter().find(|h| h.field.equiv(name)).map(|h| h.value.as_str().to_string())
                };
                let api_key = header("x-api-key");
                let version = header("anthropic-version");
                let mut raw = String::new();
                rq.as_reader().read_to_string(&mut raw).unwrap();
                captured.push(Captured {
                    url: rq.url().to_string(),
                    api_key,
                    version,
                    body: serde_json::from_str(&raw).unwrap(),
                });
                rq.respond(tiny_http::Response::from_string(body).with_status_code(status)).unwrap();
            }
            captured
        });
        (format!("http://127.0.0.1:{}", port), handle)
    }

    fn ok_body(text: &str) -> String {
        serde_json::json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "content": [{ "type": "text", "text": text }],
            "stop_reason": "end_turn"
        })
        .to_string()
    }

    fn error_body(message: &str) -> String {
        serde_json::json!({ "type": "error", "error": { "type": "x", "message": message } }).to_string()
    }

    fn prompt() -> Prompt {
        build_prompt(&GenerationRequest {
            app_name: "Todo App".into(),
            description: "a simple todo list".into(),
            style: String::new(),
        })
        .unwrap()
    }

    fn client(endpoint: &str, retries: u32) -> GenerationClient {
        let mut settings = GenerationSettings::for_endpoint(endpoint);
        settings.retries = retries;
        GenerationClient::new(Some("sk-test".into()), settings).unwrap()
    }

    #[test]
    fn missing_key_fails_before_network() {
        let settings = GenerationSettings::for_endpoint("http://127.0.0.1:9");
        let err = GenerationClient::new(None, settings.clone()).err().unwrap();
        assert!(matches!(err, HuggableError::Authentication(_)));
        let err = GenerationClient::new(Some("  ".into()), settings).err().unwrap();
        assert!(matches!(err, HuggableError::Authentication(_)));
    }

    #[test]
    fn sends_messages_request_and_returns_text() {
        let (endpoint, handle) = mock(vec![(200, ok_body("```html\n<p>hi</p>\n```"))]);
        let raw = client(&endpoint, 0).generate(&prompt()).unwrap();
        assert_eq!(raw.as_str(), "```html\n<p>hi</p>\n```");

        let captured = handle.join().unwrap();
        assert_eq!(captured.len(), 1);
        let req = &captured[0];
        assert_eq!(req.url, "/v1/messages");
        assert_eq!(req.api_key.as_deref(), Some("sk-test"));
        assert_eq!(req.version.as_deref(), Some("2023-06-01"));
        assert_eq!(req.body["model"], "claude-opus-4-20250514");
        assert_eq!(req.body["max_tokens"], 8192);
        assert_eq!(req.body["messages"][0]["role"], "user");
        assert!(req.body["messages"][0]["content"].as_str().unwrap().contains("a simple todo list"));
    }

    #[test]
    fn concatenates_text_blocks_only() {
        let body = serde_json::json!({
            "content": [
                { "type": "text", "text": "<p>a" },
                { "type": "tool_use", "id": "t1", "name": "x", "input": {} },
                { "type": "text", "text": "b</p>" }
            ]
        })
        .to_string();
        let (endpoint, handle) = mock(vec![(200, body)]);
        let raw = client(&endpoint, 0).generate(&prompt()).unwrap();
        assert_eq!(raw.as_str(), "<p>ab</p>");
        handle.join().unwrap();
    }

    #[test]
    fn unauthorized_maps_to_authentication_without_retry() {
        let (endpoint, handle) = mock(vec![(401, error_body("invalid x-api-key"))]);
        let err = client(&endpoint, 3).generate(&prompt()).unwrap_err();
        match err {
            HuggableError::Authentication(msg) => assert!(msg.contains("invalid x-api-key")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(handle.join().unwrap().len(), 1);
    }

    #[test]
    fn server_error_maps_to_service() {
        let (endpoint, handle) = mock(vec![(500, error_body("overloaded"))]);
        let err = client(&endpoint, 0).generate(&prompt()).unwrap_err();
        assert!(matches!(err, HuggableError::Service(ref m) if m.contains("HTTP 500") && m.contains("overloaded")));
        handle.join().unwrap();
    }

    #[test]
    fn bad_request_is_not_retried() {
        let (endpoint, handle) = mock(vec![(400, error_body("bad model"))]);
        let err = client(&endpoint, 2).generate(&prompt()).unwrap_err();
        assert!(matches!(err, HuggableError::Service(_)));
        assert_eq!(handle.join().unwrap().len(), 1);
    }

    #[test]
    fn retries_transient_failure() {
        let (endpoint, handle) = mock(vec![(503, error_body("busy")), (200, ok_body("<p>ok</p>"))]);
        let raw = client(&endpoint, 1).generate(&prompt()).unwrap();
        assert_eq!(raw.as_str(), "<p>ok</p>");
        assert_eq!(handle.join().unwrap().len(), 2);
    }

    #[test]
    fn malformed_payload_maps_to_service() {
        let (endpoint, handle) = mock(vec![(200, "not json".to_string())]);
        let err = client(&endpoint, 0).generate(&prompt()).unwrap_err();
        assert!(matches!(err, HuggableError::Service(_)));
        handle.join().unwrap();
    }

    #[test]
    fn empty_content_maps_to_service() {
        let (endpoint, handle) = mock(vec![(200, serde_json::json!({ "content": [] }).to_string())]);
        let err = client(&endpoint, 0).generate(&prompt()).unwrap_err();
        assert!(matches!(err, HuggableError::Service(_)));
        handle.join().unwrap();
    }

    #[test]
    fn refused_connection_maps_to_transport() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let err = client(&format!("http://127.0.0.1:{}", port), 0).generate(&prompt()).unwrap_err();
        assert!(matches!(err, HuggableError::Transport(_)));
    }

    #[test]
    fn endpoint_prefix_is_preserved() {
        let url = messages_url(&Url::parse("http://proxy.local/anthropic").unwrap()).unwrap();
        assert_eq!(url.as_str(), "http://proxy.local/anthropic/v1/messages");
        let url = messages_url(&Url::parse("https://api.anthropic.com").unwrap()).unwrap();
        assert_eq!(url.as_str(), "https://api.anthropic.com/v1/messages");
    }
}
