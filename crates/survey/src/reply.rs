//! Transport-neutral inbound events and outbound presentation requests.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::catalog::OptionKey;
use crate::session::PendingConfirmation;

/// Named user intents.  Transports map commands, button labels and callback
/// payloads onto these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    StartSurvey,
    BeginInventory,
    CancelSurvey,
    Confirm,
    Decline,
    ViewProfile,
    RequestAdvice,
    ResetProfile,
    MainMenu,
}

impl Action {
    pub const ALL: [Action; 9] = [
        Action::StartSurvey,
        Action::BeginInventory,
        Action::CancelSurvey,
        Action::Confirm,
        Action::Decline,
        Action::ViewProfile,
        Action::RequestAdvice,
        Action::ResetProfile,
        Action::MainMenu,
    ];

    /// Button caption.
    pub fn label(self) -> &'static str {
        match self {
            Action::StartSurvey => "📝 Take the survey",
            Action::BeginInventory => "✅ Yes, I'm ready",
            Action::CancelSurvey => "❌ Cancel survey",
            Action::Confirm => "✅ Yes, start over",
            Action::Decline => "❌ No, keep it",
            Action::ViewProfile => "👤 Profile",
            Action::RequestAdvice => "💡 Advice",
            Action::ResetProfile => "🔄 Retake survey",
            Action::MainMenu => "🏠 Main menu",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL.into_iter().find(|action| action.label() == label)
    }

    /// Stable identifier for inline-button payloads.
    pub fn callback_data(self) -> &'static str {
        match self {
            Action::StartSurvey => "start_survey",
            Action::BeginInventory => "begin_inventory",
            Action::CancelSurvey => "cancel_survey",
            Action::Confirm => "confirm",
            Action::Decline => "decline",
            Action::ViewProfile => "view_profile",
            Action::RequestAdvice => "request_advice",
            Action::ResetProfile => "reset_profile",
            Action::MainMenu => "main_menu",
        }
    }

    pub fn from_callback_data(data: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|action| action.callback_data() == data)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Text(String),
    Action(Action),
}

impl Inbound {
    pub fn text(text: impl Into<String>) -> Self {
        Inbound::Text(text.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Demo,
    Inventory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionPrompt {
    pub stage: Stage,
    /// One-based position within the stage.
    pub number: usize,
    pub total: usize,
    pub text: String,
    pub options: Vec<(OptionKey, String)>,
    /// Set when the previous input could not be used and the same question is
    /// shown again.
    pub retry: bool,
}

impl QuestionPrompt {
    /// Reply-keyboard caption for an option; also the preferred answer format.
    pub fn option_label(key: OptionKey, text: &str) -> String {
        format!("{key}: {text}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Notice {
        text: String,
        actions: Vec<Action>,
    },
    Question(QuestionPrompt),
    Interpretation(String),
    /// One part of a profile split to the platform message limit.  Actions
    /// are attached to the last part only.
    ProfilePart {
        index: usize,
        count: usize,
        text: String,
        actions: Vec<Action>,
    },
    Advice {
        text: String,
        actions: Vec<Action>,
    },
    Confirm {
        kind: PendingConfirmation,
        text: String,
    },
}

impl Reply {
    pub fn notice(text: impl Into<String>) -> Self {
        Reply::Notice {
            text: text.into(),
            actions: Vec::new(),
        }
    }

    pub fn notice_with(text: impl Into<String>, actions: Vec<Action>) -> Self {
        Reply::Notice {
            text: text.into(),
            actions,
        }
    }

    /// Inline actions offered under the message.
    pub fn actions(&self) -> Vec<Action> {
        match self {
            Reply::Notice { actions, .. }
            | Reply::ProfilePart { actions, .. }
            | Reply::Advice { actions, .. } => actions.clone(),
            Reply::Confirm { .. } => vec![Action::Confirm, Action::Decline],
            Reply::Question(_) | Reply::Interpretation(_) => Vec::new(),
        }
    }

    /// Plain-text rendering used by every transport.
    pub fn render_text(&self) -> String {
        match self {
            Reply::Notice { text, .. } | Reply::Advice { text, .. } | Reply::Confirm { text, .. } => {
                text.clone()
            }
            Reply::Interpretation(text) => format!("💡 Interpretation:\n\n{text}"),
            Reply::ProfilePart { text, .. } => text.clone(),
            Reply::Question(prompt) => {
                let mut out = String::new();
                if prompt.retry {
                    out.push_str("Please choose one of the options (A, B, C or D).\n\n");
                }
                let _ = write!(
                    out,
                    "Question {}/{}: {}",
                    prompt.number, prompt.total, prompt.text
                );
                for (key, text) in &prompt.options {
                    let _ = write!(out, "\n{}", QuestionPrompt::option_label(*key, text));
                }
                out
            }
        }
    }
}
