//! Telegram long-polling front end for the survey bot.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use futures::future::join_all;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};
use vasini_config::AppConfig;
use vasini_store::SurveyService;
use vasini_survey::{Action, Inbound, QuestionPrompt, Reply, Stage, chunk_message};

pub mod api;

pub use api::TelegramApi;
use api::{InlineButton, KeyboardButton, OutgoingMessage, ReplyMarkup, Update};

const GENERIC_FAILURE: &str = "⚠️ Something went wrong on my side. Please try again in a moment.";

/// One inbound event for a chat, decoded from an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEvent {
    pub chat_id: i64,
    pub inbound: Inbound,
    pub callback_query_id: Option<String>,
}

pub async fn start_bot(service: Arc<SurveyService>, config: &AppConfig) -> Result<()> {
    let token = std::env::var("TELEGRAM_BOT_TOKEN")
        .map_err(|_| anyhow::anyhow!("TELEGRAM_BOT_TOKEN is not set"))?;
    if token.trim().is_empty() {
        bail!("TELEGRAM_BOT_TOKEN is empty");
    }

    let bot = Bot {
        api: TelegramApi::new(token.trim()),
        service,
        chunk_chars: config.survey.message_chunk_chars,
    };
    let poll_timeout = config.telegram.poll_timeout_secs;
    let idle_delay = Duration::from_millis(config.telegram.idle_delay_ms);
    let mut offset: i64 = 0;

    info!(bot = %config.bot.name, "telegram polling started");

    loop {
        let updates = match bot.api.get_updates(offset, poll_timeout).await {
            Ok(updates) => updates,
            Err(err) if api::is_conflict(&err) => {
                warn!("409 Conflict: another bot instance is polling; retrying in 15s");
                tokio::time::sleep(Duration::from_secs(15)).await;
                continue;
            }
            Err(err) => {
                warn!(error = %err, "getUpdates failed; retrying in 5s");
                tokio::time::sleep(Duration::from_secs(5)).await;
                continue;
            }
        };

        if let Some(last) = updates.iter().map(|update| update.update_id).max() {
            offset = last + 1;
        }

        let events: Vec<ChatEvent> = updates.into_iter().filter_map(decode_update).collect();
        if !events.is_empty() {
            debug!(count = events.len(), "processing updates");
        }

        // Chats run concurrently; events within one chat keep their order.
        join_all(
            group_by_chat(events)
                .into_iter()
                .map(|(chat_id, events)| bot.process_chat(chat_id, events)),
        )
        .await;

        tokio::time::sleep(idle_delay).await;
    }
}

struct Bot {
    api: TelegramApi,
    service: Arc<SurveyService>,
    chunk_chars: usize,
}

impl Bot {
    async fn process_chat(&self, chat_id: i64, events: Vec<ChatEvent>) {
        for event in events {
            if let Some(id) = &event.callback_query_id {
                self.api.answer_callback_query(id).await;
            }
            self.process_event(chat_id, event.inbound).await;
        }
    }

    async fn process_event(&self, chat_id: i64, inbound: Inbound) {
        let cancel_typing = spawn_typing_indicator(self.api.clone(), chat_id);

        let (tx, mut rx) = mpsc::unbounded_channel::<Reply>();
        let forwarder = {
            let api = self.api.clone();
            let chunk_chars = self.chunk_chars;
            tokio::spawn(async move {
                while let Some(reply) = rx.recv().await {
                    for message in render_reply(chat_id, &reply, chunk_chars) {
                        if let Err(err) = api.send_message(&message).await {
                            warn!(chat_id, error = %err, "sendMessage failed");
                        }
                    }
                }
            })
        };

        let result = self.service.handle(chat_id, inbound, &tx).await;
        drop(tx);
        if let Err(err) = forwarder.await {
            warn!(chat_id, error = %err, "reply forwarder stopped");
        }
        let _ = cancel_typing.send(());

        if let Err(err) = result {
            error!(chat_id, error = %err, "failed to handle update");
            let message = OutgoingMessage {
                chat_id,
                text: GENERIC_FAILURE.to_string(),
                disable_web_page_preview: true,
                reply_markup: None,
            };
            if let Err(err) = self.api.send_message(&message).await {
                warn!(chat_id, error = %err, "sendMessage failed");
            }
        }
    }
}

/// Keep "typing…" visible until the returned sender fires or is dropped.
/// Telegram shows the indicator for about five seconds per call.
fn spawn_typing_indicator(api: TelegramApi, chat_id: i64) -> oneshot::Sender<()> {
    let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        api.send_chat_action(chat_id, "typing").await;
        let mut interval = tokio::time::interval(Duration::from_secs(4));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        interval.tick().await;
        loop {
            tokio::select! {
                biased;
                _ = &mut cancel_rx => break,
                _ = interval.tick() => api.send_chat_action(chat_id, "typing").await,
            }
        }
    });
    cancel_tx
}

/// Group events per chat, preserving arrival order inside each chat and the
/// order in which chats first appear.
pub fn group_by_chat(events: Vec<ChatEvent>) -> Vec<(i64, Vec<ChatEvent>)> {
    let mut index: HashMap<i64, usize> = HashMap::new();
    let mut groups: Vec<(i64, Vec<ChatEvent>)> = Vec::new();
    for event in events {
        let slot = *index.entry(event.chat_id).or_insert_with(|| {
            groups.push((event.chat_id, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(event);
    }
    groups
}

/// Text messages and button presses become events; everything else
/// (stickers, edits, joins) is skipped.
pub fn decode_update(update: Update) -> Option<ChatEvent> {
    if let Some(query) = update.callback_query {
        let chat_id = query
            .message
            .as_ref()
            .map(|message| message.chat.id)
            .unwrap_or(query.from.id);
        let action = query.data.as_deref().and_then(Action::from_callback_data);
        let Some(action) = action else {
            debug!(chat_id, data = ?query.data, "ignoring unknown callback payload");
            return None;
        };
        return Some(ChatEvent {
            chat_id,
            inbound: Inbound::Action(action),
            callback_query_id: Some(query.id),
        });
    }

    let message = update.message?;
    let text = message.text?;
    Some(ChatEvent {
        chat_id: message.chat.id,
        inbound: inbound_from_text(&text),
        callback_query_id: None,
    })
}

/// Map a typed line onto an [`Inbound`]: slash commands and reply-keyboard
/// captions become actions, anything else is an answer.
pub fn inbound_from_text(text: &str) -> Inbound {
    let line = normalize_telegram_command(text);
    let action = match line.as_str() {
        "/start" | "/menu" | "/help" => Some(Action::MainMenu),
        "/survey" => Some(Action::StartSurvey),
        "/profile" => Some(Action::ViewProfile),
        "/advice" => Some(Action::RequestAdvice),
        "/cancel" => Some(Action::CancelSurvey),
        "/reset" => Some(Action::ResetProfile),
        _ => Action::from_label(&line),
    };
    match action {
        Some(action) => Inbound::Action(action),
        None => Inbound::Text(line),
    }
}

pub fn normalize_telegram_command(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with('/') {
        return trimmed.to_string();
    }

    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let command = parts.next().unwrap_or_default();
    let rest = parts.next().unwrap_or("").trim();

    let command = command
        .split_once('@')
        .map(|(base, _)| base)
        .unwrap_or(command);

    if rest.is_empty() {
        command.to_string()
    } else {
        format!("{command} {rest}")
    }
}

/// Turn one reply into the Bot API messages that carry it.  Long text is
/// split; the keyboard rides on the final chunk.
pub fn render_reply(chat_id: i64, reply: &Reply, chunk_chars: usize) -> Vec<OutgoingMessage> {
    let markup = match reply {
        Reply::Question(prompt) => Some(question_keyboard(prompt)),
        other => inline_keyboard(&other.actions()),
    };

    let mut chunks = chunk_message(&reply.render_text(), chunk_chars);
    if chunks.is_empty() {
        chunks.push(String::new());
    }
    let last = chunks.len() - 1;

    chunks
        .into_iter()
        .enumerate()
        .map(|(i, text)| OutgoingMessage {
            chat_id,
            text,
            disable_web_page_preview: true,
            reply_markup: if i == last { markup.clone() } else { None },
        })
        .collect()
}

fn question_keyboard(prompt: &QuestionPrompt) -> ReplyMarkup {
    let mut rows: Vec<Vec<KeyboardButton>> = prompt
        .options
        .iter()
        .map(|(key, text)| {
            vec![KeyboardButton {
                text: QuestionPrompt::option_label(*key, text),
            }]
        })
        .collect();
    rows.push(vec![KeyboardButton {
        text: Action::CancelSurvey.label().to_string(),
    }]);

    ReplyMarkup::Keyboard {
        keyboard: rows,
        resize_keyboard: true,
        one_time_keyboard: prompt.stage == Stage::Inventory,
    }
}

fn inline_keyboard(actions: &[Action]) -> Option<ReplyMarkup> {
    if actions.is_empty() {
        return None;
    }
    let button = |action: &Action| InlineButton {
        text: action.label().to_string(),
        callback_data: action.callback_data().to_string(),
    };
    // Yes/no pairs share a row; menus get one button per row.
    let inline_keyboard = if actions == [Action::Confirm, Action::Decline] {
        vec![actions.iter().map(button).collect()]
    } else {
        actions.iter().map(|action| vec![button(action)]).collect()
    };
    Some(ReplyMarkup::Inline { inline_keyboard })
}
