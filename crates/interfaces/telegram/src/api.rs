//! Thin Bot API client: the handful of methods the survey bot needs.

use std::time::Duration;

use anyhow::{Result, bail};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct TelegramApi {
    client: Client,
    base_url: String,
}

impl TelegramApi {
    pub fn new(token: &str) -> Self {
        Self::with_base_url(format!("https://api.telegram.org/bot{token}"))
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        let response = self
            .client
            .get(format!("{}/getUpdates", self.base_url))
            .query(&[
                ("timeout", timeout_secs.to_string()),
                ("offset", offset.to_string()),
            ])
            .timeout(Duration::from_secs(timeout_secs + 10))
            .send()
            .await?
            .error_for_status()?;

        let payload: TelegramResponse<Vec<Update>> = response.json().await?;
        payload.into_result("getUpdates").map(Option::unwrap_or_default)
    }

    pub async fn send_message(&self, message: &OutgoingMessage) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/sendMessage", self.base_url))
            .json(message)
            .send()
            .await?
            .error_for_status()?;

        let payload: TelegramResponse<serde_json::Value> = response.json().await?;
        payload.into_result("sendMessage")?;
        Ok(())
    }

    /// Best-effort; a failed typing indicator must never surface to the user.
    pub async fn send_chat_action(&self, chat_id: i64, action: &str) {
        let body = serde_json::json!({ "chat_id": chat_id, "action": action });
        let _ = self
            .client
            .post(format!("{}/sendChatAction", self.base_url))
            .json(&body)
            .send()
            .await;
    }

    /// Best-effort; stops the client-side spinner on the pressed button.
    pub async fn answer_callback_query(&self, callback_query_id: &str) {
        let body = serde_json::json!({ "callback_query_id": callback_query_id });
        let _ = self
            .client
            .post(format!("{}/answerCallbackQuery", self.base_url))
            .json(&body)
            .send()
            .await;
    }
}

/// True when the error is Telegram's 409: another instance is polling.
pub fn is_conflict(err: &anyhow::Error) -> bool {
    err.downcast_ref::<reqwest::Error>()
        .and_then(reqwest::Error::status)
        == Some(StatusCode::CONFLICT)
}

#[derive(Debug, Deserialize)]
pub struct TelegramResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

impl<T> TelegramResponse<T> {
    fn into_result(self, method: &str) -> Result<Option<T>> {
        if !self.ok {
            let description = self
                .description
                .unwrap_or_else(|| format!("telegram {method} failed"));
            bail!(description);
        }
        Ok(self.result)
    }
}

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingMessage {
    pub chat_id: i64,
    pub text: String,
    pub disable_web_page_preview: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReplyMarkup {
    Inline {
        inline_keyboard: Vec<Vec<InlineButton>>,
    },
    Keyboard {
        keyboard: Vec<Vec<KeyboardButton>>,
        resize_keyboard: bool,
        one_time_keyboard: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyboardButton {
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_message_and_callback_updates() {
        let raw = r#"{
            "ok": true,
            "result": [
                {"update_id": 10, "message": {"message_id": 1, "chat": {"id": 77, "type": "private"}, "text": "/start"}},
                {"update_id": 11, "callback_query": {"id": "cb1", "from": {"id": 77, "is_bot": false},
                    "message": {"message_id": 2, "chat": {"id": 77}}, "data": "view_profile"}}
            ]
        }"#;
        let payload: TelegramResponse<Vec<Update>> = serde_json::from_str(raw).unwrap();
        let updates = payload.into_result("getUpdates").unwrap().unwrap();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].message.as_ref().unwrap().text.as_deref(), Some("/start"));
        let callback = updates[1].callback_query.as_ref().unwrap();
        assert_eq!(callback.data.as_deref(), Some("view_profile"));
        assert_eq!(callback.message.as_ref().unwrap().chat.id, 77);
    }

    #[test]
    fn not_ok_payload_is_an_error() {
        let payload: TelegramResponse<Vec<Update>> =
            serde_json::from_str(r#"{"ok": false, "description": "Unauthorized"}"#).unwrap();
        let err = payload.into_result("getUpdates").unwrap_err();
        assert_eq!(err.to_string(), "Unauthorized");
    }

    #[test]
    fn markup_serializes_in_bot_api_shape() {
        let inline = ReplyMarkup::Inline {
            inline_keyboard: vec![vec![InlineButton {
                text: "👤 Profile".into(),
                callback_data: "view_profile".into(),
            }]],
        };
        assert_eq!(
            serde_json::to_value(&inline).unwrap(),
            serde_json::json!({"inline_keyboard": [[{"text": "👤 Profile", "callback_data": "view_profile"}]]})
        );

        let message = OutgoingMessage {
            chat_id: 1,
            text: "hi".into(),
            disable_web_page_preview: true,
            reply_markup: None,
        };
        let value = serde_json::to_value(&message).unwrap();
        assert!(value.get("reply_markup").is_none());
    }

    #[test]
    fn non_http_error_is_not_conflict() {
        assert!(!is_conflict(&anyhow::anyhow!("409 in the message text only")));
    }
}
