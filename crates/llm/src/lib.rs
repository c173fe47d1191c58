//! Profile synthesis over a local Ollama server or OpenRouter.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};
use vasini_config::AppConfig;
use vasini_survey::{ProfileGateway, ProfileSynthesis, SynthesisError, SynthesisRequest};

pub mod prompt;

pub use prompt::{build_profile_prompt, extract_profile_text};

const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Provider {
    Ollama,
    OpenRouter,
}

impl Provider {
    /// Anything other than `openrouter` (any case) selects Ollama.
    pub fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("openrouter") {
            Provider::OpenRouter
        } else {
            Provider::Ollama
        }
    }
}

fn transport(err: reqwest::Error) -> SynthesisError {
    SynthesisError::Transport(err.to_string())
}

async fn json_body(response: reqwest::Response) -> Result<serde_json::Value, SynthesisError> {
    let status = response.status();
    let text = response.text().await.map_err(transport)?;
    if !status.is_success() {
        return Err(SynthesisError::Status {
            status: status.as_u16(),
            body: text,
        });
    }
    serde_json::from_str(&text).map_err(|err| SynthesisError::Malformed(err.to_string()))
}

#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }

    pub async fn generate(
        &self,
        model: &str,
        prompt: &str,
        temperature: f32,
    ) -> Result<String, SynthesisError> {
        let payload = json!({
            "model": model,
            "prompt": prompt,
            "stream": false,
            "options": { "temperature": temperature }
        });

        let response = self
            .client
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(transport)?;
        let body = json_body(response).await?;

        body.get("response")
            .and_then(|value| value.as_str())
            .map(str::to_string)
            .ok_or_else(|| SynthesisError::Malformed(format!("Ollama response missing text: {body}")))
    }
}

#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenRouterClient {
    pub fn new(client: reqwest::Client, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: OPENROUTER_BASE_URL.to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub async fn complete(
        &self,
        model: &str,
        prompt: &str,
        temperature: f32,
    ) -> Result<String, SynthesisError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(SynthesisError::MissingCredentials("OPENROUTER_API_KEY"))?;

        let payload = json!({
            "model": model,
            "temperature": temperature,
            "messages": [
                {"role": "user", "content": prompt}
            ]
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url.trim_end_matches('/')))
            .bearer_auth(api_key)
            .header("HTTP-Referer", "https://vasini.local")
            .header("X-Title", "Vasini")
            .json(&payload)
            .send()
            .await
            .map_err(transport)?;
        let body = json_body(response).await?;

        body.get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                SynthesisError::Malformed(format!("OpenRouter response missing content: {body}"))
            })
    }
}

/// [`ProfileGateway`] backed by the configured LLM provider.
#[derive(Debug, Clone)]
pub struct LlmProfileGateway {
    provider: Provider,
    model: String,
    temperature: f32,
    ollama: OllamaClient,
    openrouter: OpenRouterClient,
}

impl LlmProfileGateway {
    /// `openrouter_api_key` comes from the environment, never from the config
    /// file.
    pub fn from_config(
        config: &AppConfig,
        openrouter_api_key: Option<String>,
    ) -> Result<Self, SynthesisError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.llm.timeout_secs))
            .build()
            .map_err(|err| SynthesisError::Transport(format!("http client setup: {err}")))?;

        Ok(Self {
            provider: Provider::from_name(&config.llm.provider),
            model: config.active_model().to_string(),
            temperature: config.llm.temperature,
            ollama: OllamaClient::new(client.clone(), config.llm.ollama_base_url.clone()),
            openrouter: OpenRouterClient::new(client, openrouter_api_key),
        })
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn with_openrouter(mut self, openrouter: OpenRouterClient) -> Self {
        self.openrouter = openrouter;
        self
    }
}

#[async_trait]
impl ProfileGateway for LlmProfileGateway {
    async fn synthesize(
        &self,
        request: &SynthesisRequest,
    ) -> Result<ProfileSynthesis, SynthesisError> {
        let prompt = build_profile_prompt(request);
        debug!(
            provider = ?self.provider,
            model = %self.model,
            len = prompt.len(),
            "requesting profile"
        );

        let raw = match self.provider {
            Provider::Ollama => {
                self.ollama
                    .generate(&self.model, &prompt, self.temperature)
                    .await?
            }
            Provider::OpenRouter => {
                self.openrouter
                    .complete(&self.model, &prompt, self.temperature)
                    .await?
            }
        };

        let details = extract_profile_text(&raw);
        info!(provider = ?self.provider, len = details.chars().count(), "profile synthesized");
        Ok(ProfileSynthesis { details })
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use vasini_survey::{AnswerSet, Catalog, classify};

    use super::*;

    /// Drain one request (headers plus `content-length` bytes of body).
    async fn read_request(socket: &mut tokio::net::TcpStream) {
        let mut raw = Vec::new();
        let mut buf = [0u8; 8192];
        loop {
            let n = socket.read(&mut buf).await.unwrap_or(0);
            if n == 0 {
                return;
            }
            raw.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&raw);
            let Some(header_end) = text.find("\r\n\r\n") else {
                continue;
            };
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if raw.len() >= header_end + 4 + content_length {
                return;
            }
        }
    }

    /// Serve exactly one canned HTTP response and return the base URL.
    async fn one_shot_server(status: &'static str, body: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}")
    }

    fn request() -> SynthesisRequest {
        let catalog = Catalog::builtin().unwrap();
        let answers = AnswerSet::new();
        SynthesisRequest::new(&catalog, &answers, classify(&catalog, &answers))
    }

    fn config_with(base_url: &str, provider: &str) -> AppConfig {
        let mut config = AppConfig::default();
        config.llm.provider = provider.to_string();
        config.llm.ollama_base_url = base_url.to_string();
        config.llm.timeout_secs = 5;
        config
    }

    #[test]
    fn provider_from_name() {
        assert_eq!(Provider::from_name("OpenRouter"), Provider::OpenRouter);
        assert_eq!(Provider::from_name("ollama"), Provider::Ollama);
        assert_eq!(Provider::from_name("something"), Provider::Ollama);
    }

    #[test]
    fn ollama_endpoint_trims_slash() {
        let client = OllamaClient::new(reqwest::Client::new(), "http://host:11434/");
        assert_eq!(client.endpoint(), "http://host:11434/api/generate");
    }

    #[test]
    fn gateway_uses_active_model() {
        let gateway = LlmProfileGateway::from_config(&config_with("http://x", "openrouter"), None).unwrap();
        assert_eq!(gateway.provider(), Provider::OpenRouter);
        assert_eq!(gateway.model(), "openai/gpt-4o-mini");
    }

    #[test]
    fn gateway_builds_with_configured_timeout() {
        let mut config = config_with("http://x", "ollama");
        config.llm.timeout_secs = 1;
        let gateway = LlmProfileGateway::from_config(&config, None).unwrap();
        assert_eq!(gateway.provider(), Provider::Ollama);
    }

    #[tokio::test]
    async fn ollama_success_extracts_details() {
        let body = json!({ "response": "{\"details\": \"You are a patient, curious learner.\"}" })
            .to_string();
        let base = one_shot_server("200 OK", body).await;
        let gateway = LlmProfileGateway::from_config(&config_with(&base, "ollama"), None).unwrap();

        let synthesis = gateway.synthesize(&request()).await.unwrap();
        assert_eq!(synthesis.details, "You are a patient, curious learner.");
    }

    #[tokio::test]
    async fn ollama_error_status_is_synthesis_error() {
        let base = one_shot_server("500 Internal Server Error", "{\"error\":\"boom\"}".into()).await;
        let gateway = LlmProfileGateway::from_config(&config_with(&base, "ollama"), None).unwrap();

        let err = gateway.synthesize(&request()).await.unwrap_err();
        assert!(matches!(err, SynthesisError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn ollama_missing_text_is_malformed() {
        let base = one_shot_server("200 OK", "{\"done\":true}".into()).await;
        let gateway = LlmProfileGateway::from_config(&config_with(&base, "ollama"), None).unwrap();
        let err = gateway.synthesize(&request()).await.unwrap_err();
        assert!(matches!(err, SynthesisError::Malformed(_)));
    }

    #[tokio::test]
    async fn unreachable_server_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let gateway =
            LlmProfileGateway::from_config(&config_with(&format!("http://{addr}"), "ollama"), None).unwrap();
        let err = gateway.synthesize(&request()).await.unwrap_err();
        assert!(matches!(err, SynthesisError::Transport(_)));
    }

    #[tokio::test]
    async fn openrouter_without_key_fails_fast() {
        let gateway = LlmProfileGateway::from_config(&config_with("http://x", "openrouter"), Some("  ".into())).unwrap();
        let err = gateway.synthesize(&request()).await.unwrap_err();
        assert!(matches!(
            err,
            SynthesisError::MissingCredentials("OPENROUTER_API_KEY")
        ));
    }

    #[tokio::test]
    async fn openrouter_success_reads_message_content() {
        let body = json!({
            "choices": [{ "message": { "content": "Plain prose profile that is long enough." } }]
        })
        .to_string();
        let base = one_shot_server("200 OK", body).await;
        let openrouter =
            OpenRouterClient::new(reqwest::Client::new(), Some("sk-test".into())).with_base_url(base);
        let gateway = LlmProfileGateway::from_config(&config_with("http://x", "openrouter"), None)
            .unwrap()
            .with_openrouter(openrouter);

        let synthesis = gateway.synthesize(&request()).await.unwrap();
        assert_eq!(synthesis.details, "Plain prose profile that is long enough.");
    }
}
