//! Per-user survey state.  The core never keeps a session between calls; the
//! session store hands one in, the state machine mutates it, and the store
//! writes it back.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vasini_advice::{AdviceHistory, PersonalityType};

use crate::answer::AnswerSet;
use crate::classifier::Classification;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    AnsweringDemo,
    AwaitingInventoryConfirmation,
    AnsweringInventory,
    Completed,
}

impl Phase {
    /// A survey is underway and its answers are still provisional.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            Phase::AnsweringDemo | Phase::AwaitingInventoryConfirmation | Phase::AnsweringInventory
        )
    }
}

/// Which yes/no dialog the user is currently looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingConfirmation {
    RestartSurvey,
    ResetProfile,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub classification: Classification,
    pub profile_text: String,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    pub phase: Phase,
    /// Zero-based index into the question list of the current phase.
    pub cursor: usize,
    pub answers: AnswerSet,
    /// Set only once synthesis succeeded.
    pub profile: Option<ProfileRecord>,
    pub pending: Option<PendingConfirmation>,
    pub advice_history: AdviceHistory,
    pub started_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn personality_type(&self) -> Option<PersonalityType> {
        self.profile.as_ref().map(|p| p.classification.primary)
    }

    pub fn secondary_type(&self) -> Option<PersonalityType> {
        self.profile.as_ref().map(|p| p.classification.secondary)
    }

    pub fn type_counts(&self) -> Option<&BTreeMap<PersonalityType, u32>> {
        self.profile.as_ref().map(|p| &p.classification.type_counts)
    }

    pub fn profile_text(&self) -> Option<&str> {
        self.profile.as_ref().map(|p| p.profile_text.as_str())
    }

    /// Drop in-progress answers and return to idle.  Advice history and any
    /// stored profile are kept.
    pub fn abandon_survey(&mut self) {
        self.answers.clear();
        self.cursor = 0;
        self.phase = if self.profile.is_some() {
            Phase::Completed
        } else {
            Phase::Idle
        };
    }

    /// Clear the previous profile and answers and position at the first demo
    /// question.
    pub fn begin_survey(&mut self, now: DateTime<Utc>) {
        self.profile = None;
        self.answers.clear();
        self.cursor = 0;
        self.pending = None;
        self.phase = Phase::AnsweringDemo;
        self.started_at = Some(now);
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::Response;

    fn completed_session() -> Session {
        let mut counts = BTreeMap::new();
        for ty in PersonalityType::ALL {
            counts.insert(ty, 0);
        }
        counts.insert(PersonalityType::Practical, 3);
        Session {
            phase: Phase::Completed,
            profile: Some(ProfileRecord {
                classification: Classification {
                    type_counts: counts,
                    primary: PersonalityType::Practical,
                    secondary: PersonalityType::Intellectual,
                },
                profile_text: "A grounded, organised person.".into(),
                generated_at: Utc::now(),
            }),
            ..Session::default()
        }
    }

    #[test]
    fn accessors_read_through_profile() {
        let session = completed_session();
        assert_eq!(session.personality_type(), Some(PersonalityType::Practical));
        assert_eq!(session.secondary_type(), Some(PersonalityType::Intellectual));
        assert_eq!(session.type_counts().unwrap()[&PersonalityType::Practical], 3);
        assert!(session.profile_text().unwrap().starts_with("A grounded"));

        let empty = Session::new();
        assert_eq!(empty.personality_type(), None);
        assert!(empty.type_counts().is_none());
    }

    #[test]
    fn begin_survey_clears_profile_but_keeps_history() {
        let mut session = completed_session();
        session.advice_history.record("old advice", 20);
        session.answers.record("name", Response::Text("Ada".into()));

        session.begin_survey(Utc::now());
        assert_eq!(session.phase, Phase::AnsweringDemo);
        assert!(session.profile.is_none());
        assert!(session.answers.is_empty());
        assert_eq!(session.advice_history.len(), 1);
    }

    #[test]
    fn abandon_returns_to_idle_without_profile() {
        let mut session = Session::new();
        session.begin_survey(Utc::now());
        session.answers.record("name", Response::Text("Ada".into()));
        session.cursor = 1;

        session.abandon_survey();
        assert_eq!(session.phase, Phase::Idle);
        assert_eq!(session.cursor, 0);
        assert!(session.answers.is_empty());
    }

    #[test]
    fn serde_roundtrip_and_missing_fields() {
        let session = completed_session();
        let json = serde_json::to_string(&session).unwrap();
        let back: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(back, session);

        let sparse: Session = serde_json::from_str(r#"{"phase":"answering_demo"}"#).unwrap();
        assert_eq!(sparse.phase, Phase::AnsweringDemo);
        assert!(sparse.answers.is_empty());
    }

    #[test]
    fn active_phases() {
        assert!(Phase::AnsweringDemo.is_active());
        assert!(Phase::AwaitingInventoryConfirmation.is_active());
        assert!(Phase::AnsweringInventory.is_active());
        assert!(!Phase::Idle.is_active());
        assert!(!Phase::Completed.is_active());
    }
}
