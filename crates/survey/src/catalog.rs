//! Question catalog: demo (free-text) questions followed by the fixed-choice
//! inventory.
//!
//! Catalogs are TOML documents:
//!
//! ```toml
//! [[demo]]
//! id = "name"
//! text = "What should I call you?"
//!
//! [[inventory]]
//! id = "v01"
//! text = "How do you prefer to spend a free evening?"
//! options = [
//!   { key = "A", leans = "intellectual", text = "...", interpretation = "..." },
//! ]
//! ```
//!
//! A built-in English catalog is embedded in the crate.  Validation happens
//! once, at construction; every later lookup may assume a consistent catalog.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;
use vasini_advice::PersonalityType;

use crate::error::CatalogError;

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.toml");

/// Inventory answer letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OptionKey {
    A,
    B,
    C,
    D,
}

impl OptionKey {
    pub const ALL: [OptionKey; 4] = [OptionKey::A, OptionKey::B, OptionKey::C, OptionKey::D];

    pub fn as_char(self) -> char {
        match self {
            OptionKey::A => 'A',
            OptionKey::B => 'B',
            OptionKey::C => 'C',
            OptionKey::D => 'D',
        }
    }

    /// Uppercase letters only.
    pub fn from_char(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_char() == c)
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub key: OptionKey,
    pub text: String,
    /// Shown to the user right after they pick this option.
    pub interpretation: String,
    /// Type bucket this option counts towards when classifying.
    pub leans: PersonalityType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionKind {
    FreeText,
    FixedChoice(Vec<ChoiceOption>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub kind: QuestionKind,
}

impl Question {
    pub fn free_text(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            kind: QuestionKind::FreeText,
        }
    }

    pub fn fixed_choice(
        id: impl Into<String>,
        text: impl Into<String>,
        options: Vec<ChoiceOption>,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            kind: QuestionKind::FixedChoice(options),
        }
    }

    /// Options in display order; empty for free-text questions.
    pub fn options(&self) -> &[ChoiceOption] {
        match &self.kind {
            QuestionKind::FreeText => &[],
            QuestionKind::FixedChoice(options) => options,
        }
    }

    pub fn option(&self, key: OptionKey) -> Option<&ChoiceOption> {
        self.options().iter().find(|option| option.key == key)
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    demo: Vec<QuestionEntry>,
    #[serde(default)]
    inventory: Vec<QuestionEntry>,
}

#[derive(Debug, Deserialize)]
struct QuestionEntry {
    id: String,
    text: String,
    #[serde(default)]
    options: Vec<ChoiceOption>,
}

impl From<QuestionEntry> for Question {
    fn from(entry: QuestionEntry) -> Self {
        let kind = if entry.options.is_empty() {
            QuestionKind::FreeText
        } else {
            QuestionKind::FixedChoice(entry.options)
        };
        Self {
            id: entry.id,
            text: entry.text,
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    demo: Vec<Question>,
    inventory: Vec<Question>,
}

impl Catalog {
    /// Validate and assemble a catalog.
    pub fn new(demo: Vec<Question>, inventory: Vec<Question>) -> Result<Self, CatalogError> {
        if demo.is_empty() {
            return Err(CatalogError::EmptyDemo);
        }
        if inventory.is_empty() {
            return Err(CatalogError::EmptyInventory);
        }

        let mut seen = HashSet::new();
        for question in demo.iter().chain(&inventory) {
            if !seen.insert(question.id.as_str()) {
                return Err(CatalogError::DuplicateId(question.id.clone()));
            }
        }

        for question in &demo {
            if !question.options().is_empty() {
                return Err(CatalogError::NotFreeText(question.id.clone()));
            }
        }

        for question in &inventory {
            let options = question.options();
            if options.is_empty() {
                return Err(CatalogError::NotFixedChoice(question.id.clone()));
            }
            let mut keys = HashSet::new();
            for option in options {
                if !keys.insert(option.key) {
                    return Err(CatalogError::DuplicateOption {
                        question: question.id.clone(),
                        key: option.key.as_char(),
                    });
                }
            }
        }

        Ok(Self { demo, inventory })
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(raw)?;
        Self::new(
            file.demo.into_iter().map(Question::from).collect(),
            file.inventory.into_iter().map(Question::from).collect(),
        )
    }

    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_toml_str(BUILTIN_CATALOG)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Load `path` if given, otherwise the built-in catalog, and insist on
    /// exactly `inventory_len` inventory questions.
    pub fn load_or_builtin(
        path: Option<&Path>,
        inventory_len: usize,
    ) -> Result<Self, CatalogError> {
        let catalog = match path {
            Some(path) => Self::load(path)?,
            None => Self::builtin()?,
        };
        catalog.require_inventory_len(inventory_len)?;
        info!(
            source = %path.map(|p| p.display().to_string()).unwrap_or_else(|| "builtin".into()),
            demo = catalog.demo.len(),
            inventory = catalog.inventory.len(),
            "question catalog loaded"
        );
        Ok(catalog)
    }

    pub fn require_inventory_len(&self, expected: usize) -> Result<(), CatalogError> {
        if self.inventory.len() != expected {
            return Err(CatalogError::InventoryLength {
                expected,
                actual: self.inventory.len(),
            });
        }
        Ok(())
    }

    pub fn list_demo_questions(&self) -> &[Question] {
        &self.demo
    }

    pub fn list_inventory_questions(&self) -> &[Question] {
        &self.inventory
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.demo
            .iter()
            .chain(&self.inventory)
            .find(|question| question.id == id)
    }

    /// Option counts per type bucket across the whole inventory.
    pub fn leanings(&self) -> BTreeMap<PersonalityType, usize> {
        let mut counts: BTreeMap<PersonalityType, usize> =
            PersonalityType::ALL.into_iter().map(|ty| (ty, 0)).collect();
        for option in self.inventory.iter().flat_map(Question::options) {
            *counts.entry(option.leans).or_default() += 1;
        }
        counts
    }
}
