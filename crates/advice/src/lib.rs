pub mod engine;
pub mod history;
pub mod personality;
pub mod tables;

pub use engine::{Advice, AdviceEngine, AdviceRequest, AdviceSource};
pub use history::{AdviceHistory, DEFAULT_HISTORY_LEN};
pub use personality::{DEFAULT_TYPE, PersonalityType};
pub use tables::{BUILTIN, PhraseTable, PhraseTables};
