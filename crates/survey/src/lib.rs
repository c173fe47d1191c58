//! Conversational survey core: catalog, answer parsing, classification,
//! session model and the state machine that ties them together.

pub mod answer;
pub mod catalog;
pub mod chunk;
pub mod classifier;
pub mod error;
pub mod gateway;
pub mod machine;
pub mod reply;
pub mod session;

pub use answer::{Answer, AnswerSet, Response, parse_answer, parse_option};
pub use catalog::{Catalog, ChoiceOption, OptionKey, Question, QuestionKind};
pub use chunk::{chunk_message, telegram_len};
pub use classifier::{Classification, classify};
pub use error::{CatalogError, SurveyError, SynthesisError};
pub use gateway::{AnsweredQuestion, ProfileGateway, ProfileSynthesis, SynthesisRequest};
pub use machine::{ReplyTx, SurveyMachine, SurveySettings};
pub use reply::{Action, Inbound, QuestionPrompt, Reply, Stage};
pub use session::{PendingConfirmation, Phase, ProfileRecord, Session};
pub use vasini_advice::PersonalityType;
