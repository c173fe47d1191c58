//! The survey state machine.
//!
//! ```text
//!  idle/completed --start--> answering_demo --last demo--> awaiting_inventory_confirmation
//!        ^                        |                               | begin
//!        |<-------cancel----------+<------------cancel------------+
//!        |                                                        v
//!        |<--cancel / synthesis failure--- answering_inventory --last--> completed
//! ```
//!
//! Starting over while a profile exists (and resetting it) goes through a
//! yes/no dialog first.  Every call takes the session by `&mut`, emits replies
//! through the outbound channel as soon as they are known, and leaves the
//! session consistent even when it returns an error.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use vasini_advice::{AdviceEngine, AdviceRequest};
use vasini_config::AppConfig;

use crate::answer::{Response, parse_answer};
use crate::catalog::Catalog;
use crate::chunk::chunk_message;
use crate::classifier::classify;
use crate::error::{SurveyError, SynthesisError};
use crate::gateway::{ProfileGateway, SynthesisRequest};
use crate::reply::{Action, Inbound, QuestionPrompt, Reply, Stage};
use crate::session::{PendingConfirmation, Phase, ProfileRecord, Session};

pub type ReplyTx = mpsc::UnboundedSender<Reply>;

const MAIN_MENU: [Action; 3] = [Action::StartSurvey, Action::ViewProfile, Action::RequestAdvice];

#[derive(Debug, Clone)]
pub struct SurveySettings {
    pub bot_name: String,
    pub min_profile_chars: usize,
    pub message_chunk_chars: usize,
    pub history_len: usize,
    pub max_resamples: usize,
    pub synthesis_timeout: Duration,
}

impl Default for SurveySettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for SurveySettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            bot_name: config.bot.name.clone(),
            min_profile_chars: config.survey.min_profile_chars,
            message_chunk_chars: config.survey.message_chunk_chars,
            history_len: config.advice.history_len,
            max_resamples: config.advice.max_resamples,
            synthesis_timeout: Duration::from_secs(config.llm.timeout_secs),
        }
    }
}

pub struct SurveyMachine {
    catalog: Arc<Catalog>,
    gateway: Arc<dyn ProfileGateway>,
    advice: AdviceEngine,
    settings: SurveySettings,
}

impl SurveyMachine {
    pub fn new(
        catalog: Arc<Catalog>,
        gateway: Arc<dyn ProfileGateway>,
        settings: SurveySettings,
    ) -> Self {
        Self {
            advice: AdviceEngine::new(settings.max_resamples),
            catalog,
            gateway,
            settings,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn settings(&self) -> &SurveySettings {
        &self.settings
    }

    /// Apply one inbound event to `session`, streaming replies into `out`.
    pub async fn handle<R: Rng + Send + ?Sized>(
        &self,
        session: &mut Session,
        inbound: Inbound,
        rng: &mut R,
        out: &ReplyTx,
    ) -> Result<(), SurveyError> {
        let now = Utc::now();
        let result = match inbound {
            Inbound::Action(action) => self.on_action(session, action, rng, out, now).await,
            Inbound::Text(text) => self.on_text(session, &text, out, now).await,
        };
        session.touch(now);
        result
    }

    /// Like [`handle`](Self::handle) but collects the replies instead of
    /// streaming them.
    pub async fn respond<R: Rng + Send + ?Sized>(
        &self,
        session: &mut Session,
        inbound: Inbound,
        rng: &mut R,
    ) -> Result<Vec<Reply>, SurveyError> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        self.handle(session, inbound, rng, &tx).await?;
        drop(tx);
        let mut replies = Vec::new();
        while let Some(reply) = rx.recv().await {
            replies.push(reply);
        }
        Ok(replies)
    }

    async fn on_action<R: Rng + Send + ?Sized>(
        &self,
        session: &mut Session,
        action: Action,
        rng: &mut R,
        out: &ReplyTx,
        now: DateTime<Utc>,
    ) -> Result<(), SurveyError> {
        debug!(?action, phase = ?session.phase, "action received");

        // Anything but an answer to the dialog dismisses it.
        if !matches!(action, Action::Confirm | Action::Decline) {
            session.pending = None;
        }

        match (action, session.phase) {
            (Action::BeginInventory | Action::Confirm, Phase::AwaitingInventoryConfirmation) => {
                session.phase = Phase::AnsweringInventory;
                session.cursor = 0;
                info!("inventory started");
                self.prompt_current(session, out, false)
            }
            (Action::CancelSurvey, phase)
            | (Action::Decline, phase @ Phase::AwaitingInventoryConfirmation)
                if phase.is_active() =>
            {
                info!(?phase, cursor = session.cursor, "survey cancelled");
                session.abandon_survey();
                emit(
                    out,
                    Reply::notice_with(
                        "❌ Survey cancelled. You can start again at any time.",
                        MAIN_MENU.to_vec(),
                    ),
                );
                Ok(())
            }
            (Action::CancelSurvey, _) => {
                emit(
                    out,
                    Reply::notice_with("There is no active survey to cancel.", MAIN_MENU.to_vec()),
                );
                Ok(())
            }
            (Action::Confirm, _) if session.pending.is_some() => {
                let kind = session.pending.take();
                info!(?kind, "confirmation accepted, previous profile cleared");
                self.start(session, out, now)
            }
            (Action::Decline, _) if session.pending.is_some() => {
                let kind = session.pending.take();
                debug!(?kind, "confirmation declined");
                emit(
                    out,
                    Reply::notice_with(
                        "✅ Cancelled. Your current profile has been kept.",
                        MAIN_MENU.to_vec(),
                    ),
                );
                Ok(())
            }
            (_, phase) if phase.is_active() => {
                emit(
                    out,
                    Reply::notice(
                        "A survey is in progress. Answer the question below or cancel the survey.",
                    ),
                );
                self.prompt_current(session, out, false)
            }
            (Action::Confirm | Action::Decline, _) => {
                self.nothing_to_confirm(out);
                Ok(())
            }
            (Action::StartSurvey, _) => {
                if session.profile.is_some() {
                    self.ask_confirmation(session, PendingConfirmation::RestartSurvey, out);
                    Ok(())
                } else {
                    self.start(session, out, now)
                }
            }
            (Action::ResetProfile, _) => {
                if session.profile.is_some() {
                    self.ask_confirmation(session, PendingConfirmation::ResetProfile, out);
                    Ok(())
                } else {
                    self.start(session, out, now)
                }
            }
            (Action::ViewProfile, _) => {
                self.view_profile(session, out);
                Ok(())
            }
            (Action::RequestAdvice, _) => {
                self.give_advice(session, rng, out);
                Ok(())
            }
            (Action::BeginInventory | Action::MainMenu, _) => {
                self.main_menu(out);
                Ok(())
            }
        }
    }

    async fn on_text(
        &self,
        session: &mut Session,
        text: &str,
        out: &ReplyTx,
        now: DateTime<Utc>,
    ) -> Result<(), SurveyError> {
        match session.phase {
            Phase::AnsweringDemo => self.answer_demo(session, text, out),
            Phase::AwaitingInventoryConfirmation => {
                debug!("text while awaiting inventory confirmation");
                self.prompt_current(session, out, false)
            }
            Phase::AnsweringInventory => self.answer_inventory(session, text, out, now).await,
            Phase::Idle | Phase::Completed => {
                match session.pending {
                    Some(kind) => self.ask_confirmation(session, kind, out),
                    None => emit(
                        out,
                        Reply::notice_with(
                            "I didn't catch that. Please use the menu below.",
                            MAIN_MENU.to_vec(),
                        ),
                    ),
                }
                Ok(())
            }
        }
    }

    fn start(&self, session: &mut Session, out: &ReplyTx, now: DateTime<Utc>) -> Result<(), SurveyError> {
        session.begin_survey(now);
        info!(
            demo = self.catalog.list_demo_questions().len(),
            inventory = self.catalog.list_inventory_questions().len(),
            "survey started"
        );
        emit(
            out,
            Reply::notice(
                "📋 Let's begin!\n\nI'll ask a few questions to get to know you. \
                 First some basics, then a short test to find your strengths.",
            ),
        );
        self.prompt_current(session, out, false)
    }

    fn answer_demo(&self, session: &mut Session, text: &str, out: &ReplyTx) -> Result<(), SurveyError> {
        let demo = self.catalog.list_demo_questions();
        let question = demo.get(session.cursor).ok_or(SurveyError::CursorOutOfRange {
            phase: session.phase,
            cursor: session.cursor,
        })?;

        let text = text.trim();
        if text.is_empty() {
            return self.prompt_current(session, out, false);
        }

        session
            .answers
            .record(question.id.clone(), Response::Text(text.to_string()));
        session.cursor += 1;
        info!(question = %question.id, cursor = session.cursor, "demo answer recorded");

        if session.cursor >= demo.len() {
            session.phase = Phase::AwaitingInventoryConfirmation;
            session.cursor = 0;
        }
        self.prompt_current(session, out, false)
    }

    async fn answer_inventory(
        &self,
        session: &mut Session,
        text: &str,
        out: &ReplyTx,
        now: DateTime<Utc>,
    ) -> Result<(), SurveyError> {
        let inventory = self.catalog.list_inventory_questions();
        let question = inventory
            .get(session.cursor)
            .ok_or(SurveyError::CursorOutOfRange {
                phase: session.phase,
                cursor: session.cursor,
            })?;

        let Some(option) = parse_answer(question, text).and_then(|key| question.option(key)) else {
            warn!(question = %question.id, cursor = session.cursor, "unrecognised inventory answer");
            debug!(text, "raw answer");
            return self.prompt_current(session, out, true);
        };

        session
            .answers
            .record(question.id.clone(), Response::Choice(option.key));
        emit(out, Reply::Interpretation(option.interpretation.clone()));
        session.cursor += 1;
        info!(
            question = %question.id,
            option = %option.key,
            cursor = session.cursor,
            "inventory answer recorded"
        );

        if session.cursor >= inventory.len() {
            return self.complete(session, out, now).await;
        }
        self.prompt_current(session, out, false)
    }

    async fn complete(
        &self,
        session: &mut Session,
        out: &ReplyTx,
        now: DateTime<Utc>,
    ) -> Result<(), SurveyError> {
        emit(
            out,
            Reply::notice(
                "✅ Survey complete!\n\nGenerating your profile from your answers. \
                 This may take a few seconds...",
            ),
        );

        let classification = classify(&self.catalog, &session.answers);
        info!(
            primary = %classification.primary,
            secondary = %classification.secondary,
            len = session.answers.len(),
            "survey classified"
        );

        let request = SynthesisRequest::new(&self.catalog, &session.answers, classification.clone());
        match self.synthesize(&request).await {
            Ok(profile_text) => {
                info!(len = profile_text.chars().count(), "profile stored");
                session.profile = Some(ProfileRecord {
                    classification,
                    profile_text,
                    generated_at: now,
                });
                session.phase = Phase::Completed;
                session.cursor = 0;
                self.emit_profile(session, out);
            }
            Err(err) => {
                error!(error = %err, "profile synthesis failed, survey discarded");
                session.abandon_survey();
                emit(
                    out,
                    Reply::notice_with(
                        "⚠️ I couldn't generate your profile this time. \
                         Your answers were not saved, please take the survey again.",
                        vec![Action::StartSurvey, Action::MainMenu],
                    ),
                );
            }
        }
        Ok(())
    }

    /// Gateway call bounded by the configured timeout.  Degenerate responses
    /// count as failures.
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<String, SynthesisError> {
        let limit = self.settings.synthesis_timeout;
        let synthesis = tokio::time::timeout(limit, self.gateway.synthesize(request))
            .await
            .map_err(|_| SynthesisError::Timeout(limit))??;

        let details = synthesis.details.trim().to_string();
        let len = details.chars().count();
        if len < self.settings.min_profile_chars {
            return Err(SynthesisError::Degenerate {
                len,
                min: self.settings.min_profile_chars,
            });
        }
        Ok(details)
    }

    fn prompt_current(&self, session: &Session, out: &ReplyTx, retry: bool) -> Result<(), SurveyError> {
        let out_of_range = || SurveyError::CursorOutOfRange {
            phase: session.phase,
            cursor: session.cursor,
        };

        match session.phase {
            Phase::AnsweringDemo => {
                let demo = self.catalog.list_demo_questions();
                let question = demo.get(session.cursor).ok_or_else(out_of_range)?;
                emit(
                    out,
                    Reply::Question(QuestionPrompt {
                        stage: Stage::Demo,
                        number: session.cursor + 1,
                        total: demo.len(),
                        text: question.text.clone(),
                        options: Vec::new(),
                        retry,
                    }),
                );
            }
            Phase::AwaitingInventoryConfirmation => {
                let total = self.catalog.list_inventory_questions().len();
                emit(
                    out,
                    Reply::notice_with(
                        format!(
                            "🧠 Basic information collected!\n\n\
                             Now I'll ask you {total} questions to find your strengths and talents. \
                             Pick one option (A, B, C or D) for each question.\n\nReady to begin?"
                        ),
                        vec![Action::BeginInventory, Action::CancelSurvey],
                    ),
                );
            }
            Phase::AnsweringInventory => {
                let inventory = self.catalog.list_inventory_questions();
                let question = inventory.get(session.cursor).ok_or_else(out_of_range)?;
                emit(
                    out,
                    Reply::Question(QuestionPrompt {
                        stage: Stage::Inventory,
                        number: session.cursor + 1,
                        total: inventory.len(),
                        text: question.text.clone(),
                        options: question
                            .options()
                            .iter()
                            .map(|option| (option.key, option.text.clone()))
                            .collect(),
                        retry,
                    }),
                );
            }
            Phase::Idle | Phase::Completed => self.main_menu(out),
        }
        Ok(())
    }

    fn ask_confirmation(&self, session: &mut Session, kind: PendingConfirmation, out: &ReplyTx) {
        session.pending = Some(kind);
        let text = match kind {
            PendingConfirmation::RestartSurvey => {
                "⚠️ You already have a completed profile. \
                 Taking the survey again will overwrite it.\n\nDo you want to start over?"
            }
            PendingConfirmation::ResetProfile => {
                "⚠️ This will delete your current profile and start the survey \
                 from the beginning.\n\nAre you sure?"
            }
        };
        emit(
            out,
            Reply::Confirm {
                kind,
                text: text.to_string(),
            },
        );
    }

    fn nothing_to_confirm(&self, out: &ReplyTx) {
        emit(
            out,
            Reply::notice_with("There is nothing to confirm right now.", MAIN_MENU.to_vec()),
        );
    }

    fn view_profile(&self, session: &Session, out: &ReplyTx) {
        match session.profile_text() {
            None => emit(
                out,
                Reply::notice_with(
                    "Profile not found. Take the survey to get one.",
                    vec![Action::StartSurvey],
                ),
            ),
            Some(text) if text.trim().chars().count() < self.settings.min_profile_chars => emit(
                out,
                Reply::notice_with(
                    "Your profile was not found or is empty. Please take the survey again.",
                    vec![Action::StartSurvey],
                ),
            ),
            Some(_) => self.emit_profile(session, out),
        }
    }

    fn emit_profile(&self, session: &Session, out: &ReplyTx) {
        let Some(profile) = &session.profile else {
            return;
        };

        emit(
            out,
            Reply::notice(format!(
                "🧠 Your profile\n\nPrimary type: {}\nSecondary type: {}",
                profile.classification.primary, profile.classification.secondary
            )),
        );

        let parts = chunk_message(&profile.profile_text, self.settings.message_chunk_chars);
        let count = parts.len();
        for (index, text) in parts.into_iter().enumerate() {
            let actions = if index + 1 == count {
                vec![Action::RequestAdvice, Action::ResetProfile, Action::MainMenu]
            } else {
                Vec::new()
            };
            emit(
                out,
                Reply::ProfilePart {
                    index,
                    count,
                    text,
                    actions,
                },
            );
        }
    }

    fn give_advice<R: Rng + ?Sized>(&self, session: &mut Session, rng: &mut R, out: &ReplyTx) {
        let advice = {
            let Some(profile) = &session.profile else {
                emit(
                    out,
                    Reply::notice_with(
                        "💡 Take the survey first so I can tailor advice to you.",
                        vec![Action::StartSurvey],
                    ),
                );
                return;
            };
            self.advice.advise(
                AdviceRequest {
                    personality_type: Some(profile.classification.primary),
                    profile_text: Some(&profile.profile_text),
                },
                &session.advice_history,
                rng,
            )
        };

        info!(source = ?advice.source, "advice issued");
        session
            .advice_history
            .record(advice.text.clone(), self.settings.history_len);
        emit(
            out,
            Reply::Advice {
                text: advice.text,
                actions: vec![Action::RequestAdvice, Action::ViewProfile, Action::MainMenu],
            },
        );
    }

    fn main_menu(&self, out: &ReplyTx) {
        emit(
            out,
            Reply::notice_with(
                format!(
                    "🏠 Main menu\n\nI'm {}. Take the survey to discover your strengths, \
                     then come back for your profile and personal advice.",
                    self.settings.bot_name
                ),
                MAIN_MENU.to_vec(),
            ),
        );
    }
}

fn emit(out: &ReplyTx, reply: Reply) {
    // A closed receiver means the transport stopped listening; the session
    // update itself still stands.
    let _ = out.send(reply);
}
