//! Rule-based advice composer.
//!
//! Two modes:
//!
//! - **Canned**: no profile text, so one of a handful of ready-made tips for
//!   the declared type is picked uniformly at random.
//! - **Composed**: profile text available.  The text is scanned for per-type
//!   keywords to find the type it actually reads like, the aspect pool is
//!   narrowed (or widened to two types when the text disagrees with the
//!   declared type), and a sentence is assembled from one random aspect,
//!   technique, outcome, context and emoji.  A composition already present in
//!   the history is re-rolled up to `max_resamples` times.

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

use crate::history::AdviceHistory;
use crate::personality::PersonalityType;
use crate::tables::{BUILTIN, PhraseTables};

const UNIVERSAL_ASPECT: &str = "Self-development";
const UNIVERSAL_EMOJI: &str = "💡";
const UNIVERSAL_TECHNIQUE: &str = "a self-development practice";
const UNIVERSAL_CONTEXT: &str = "in everyday life";
const UNIVERSAL_OUTCOME: &str = "your effectiveness";
const UNIVERSAL_CANNED: &str =
    "💡 Pick one small habit that supports your strengths and practise it every day this week.";

#[derive(Debug, Clone, Copy, Default)]
pub struct AdviceRequest<'a> {
    /// Type stored with the profile.  `None` means unknown and resolves to the
    /// default type at every lookup.
    pub personality_type: Option<PersonalityType>,
    pub profile_text: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdviceSource {
    Canned,
    Composed {
        /// Type inferred from keyword hits in the profile text, if any.
        dominant: Option<PersonalityType>,
        /// Number of re-rolls spent avoiding the history.
        resamples: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advice {
    pub text: String,
    pub source: AdviceSource,
}

#[derive(Debug, Clone, Copy)]
pub struct AdviceEngine {
    tables: &'static PhraseTables,
    max_resamples: usize,
}

impl Default for AdviceEngine {
    fn default() -> Self {
        Self::new(5)
    }
}

impl AdviceEngine {
    pub fn new(max_resamples: usize) -> Self {
        Self::with_tables(&BUILTIN, max_resamples)
    }

    pub fn with_tables(tables: &'static PhraseTables, max_resamples: usize) -> Self {
        Self {
            tables,
            max_resamples,
        }
    }

    pub fn advise<R: Rng + ?Sized>(
        &self,
        request: AdviceRequest<'_>,
        history: &AdviceHistory,
        rng: &mut R,
    ) -> Advice {
        let profile_text = request
            .profile_text
            .map(str::trim)
            .filter(|text| !text.is_empty());

        let Some(profile_text) = profile_text else {
            debug!(
                personality_type = ?request.personality_type,
                "no profile text, using canned advice"
            );
            let text = self
                .tables
                .canned
                .resolve(request.personality_type)
                .choose(rng)
                .copied()
                .unwrap_or(UNIVERSAL_CANNED);
            return Advice {
                text: text.to_string(),
                source: AdviceSource::Canned,
            };
        };

        let dominant = self.dominant_type(profile_text);
        let aspects = self.aspect_pool(request.personality_type, dominant);

        let mut text = self.compose(request.personality_type, &aspects, rng);
        let mut resamples = 0;
        while history.contains(&text) && resamples < self.max_resamples {
            text = self.compose(request.personality_type, &aspects, rng);
            resamples += 1;
        }

        debug!(
            personality_type = ?request.personality_type,
            ?dominant,
            resamples,
            "composed advice"
        );

        Advice {
            text,
            source: AdviceSource::Composed {
                dominant,
                resamples,
            },
        }
    }

    /// Type whose keywords occur most often in `profile_text`
    /// (case-insensitive substring match).  Ties go to the type declared
    /// first; `None` when no keyword matches at all.
    pub fn dominant_type(&self, profile_text: &str) -> Option<PersonalityType> {
        let haystack = profile_text.to_lowercase();
        let mut best: Option<(PersonalityType, usize)> = None;

        for ty in self.tables.keywords.types() {
            let hits = self
                .tables
                .keywords
                .row(ty)
                .unwrap_or(&[])
                .iter()
                .filter(|keyword| haystack.contains(*keyword))
                .count();
            if hits == 0 {
                continue;
            }
            match best {
                Some((_, best_hits)) if best_hits >= hits => {}
                _ => best = Some((ty, hits)),
            }
        }

        best.map(|(ty, _)| ty)
    }

    /// Aspect phrases for the declared type, plus the dominant type's phrases
    /// when the profile text leans elsewhere.
    pub fn aspect_pool(
        &self,
        declared: Option<PersonalityType>,
        dominant: Option<PersonalityType>,
    ) -> Vec<&'static str> {
        let mut pool = self.tables.aspects.resolve(declared).to_vec();
        if let Some(dominant) = dominant {
            if Some(dominant) != declared {
                pool.extend_from_slice(self.tables.aspects.resolve(Some(dominant)));
            }
        }
        if pool.is_empty() {
            pool.push(UNIVERSAL_ASPECT);
        }
        pool
    }

    fn compose<R: Rng + ?Sized>(
        &self,
        declared: Option<PersonalityType>,
        aspects: &[&'static str],
        rng: &mut R,
    ) -> String {
        let tables = self.tables;
        let emoji = pick(tables.emoji.resolve(declared), UNIVERSAL_EMOJI, rng);
        let aspect = pick(aspects, UNIVERSAL_ASPECT, rng);
        let technique = pick(tables.techniques.resolve(declared), UNIVERSAL_TECHNIQUE, rng);
        let context = pick(tables.contexts.resolve(declared), UNIVERSAL_CONTEXT, rng);
        let outcome = pick(tables.outcomes.resolve(declared), UNIVERSAL_OUTCOME, rng);
        render(emoji, aspect, technique, outcome, context)
    }
}

fn pick<R: Rng + ?Sized>(pool: &[&'static str], fallback: &'static str, rng: &mut R) -> &'static str {
    pool.choose(rng).copied().unwrap_or(fallback)
}

pub fn render(emoji: &str, aspect: &str, technique: &str, outcome: &str, context: &str) -> String {
    format!(
        "{emoji} Given your tendency toward {}, try {technique} to strengthen {outcome}. This is especially useful {context}.",
        aspect.to_lowercase()
    )
}
