//! Immutable "type → phrases" dictionaries the advice composer samples from.
//!
//! Every lookup goes through [`PhraseTable::resolve`], which substitutes the
//! [`DEFAULT_TYPE`] entry when the requested type is absent or has no row in
//! that particular table.

use crate::personality::{DEFAULT_TYPE, PersonalityType};

type Rows = &'static [(PersonalityType, &'static [&'static str])];

#[derive(Debug)]
pub struct PhraseTable {
    name: &'static str,
    rows: Rows,
}

impl PhraseTable {
    pub const fn new(name: &'static str, rows: Rows) -> Self {
        Self { name, rows }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Exact row for `ty`, without fallback.
    pub fn row(&self, ty: PersonalityType) -> Option<&'static [&'static str]> {
        self.rows
            .iter()
            .find(|(row_type, _)| *row_type == ty)
            .map(|(_, phrases)| *phrases)
    }

    /// Row for `ty`, falling back to the default type's row when `ty` is
    /// unknown or unmapped in this table.  Empty only if the default row is
    /// missing too.
    pub fn resolve(&self, ty: Option<PersonalityType>) -> &'static [&'static str] {
        ty.and_then(|ty| self.row(ty))
            .or_else(|| self.row(DEFAULT_TYPE))
            .unwrap_or(&[])
    }

    pub fn types(&self) -> impl Iterator<Item = PersonalityType> + '_ {
        self.rows.iter().map(|(ty, _)| *ty)
    }
}

/// The full dictionary set used by the advice engine.
#[derive(Debug)]
pub struct PhraseTables {
    pub keywords: PhraseTable,
    pub aspects: PhraseTable,
    pub emoji: PhraseTable,
    pub techniques: PhraseTable,
    pub contexts: PhraseTable,
    pub outcomes: PhraseTable,
    /// Ready-made advice used when no profile text is available.
    pub canned: PhraseTable,
}

use PersonalityType::{Analytical, Creative, Emotional, Intellectual, Practical};

pub static BUILTIN: PhraseTables = PhraseTables {
    keywords: PhraseTable::new("keywords", KEYWORDS),
    aspects: PhraseTable::new("aspects", ASPECTS),
    emoji: PhraseTable::new("emoji", EMOJI),
    techniques: PhraseTable::new("techniques", TECHNIQUES),
    contexts: PhraseTable::new("contexts", CONTEXTS),
    outcomes: PhraseTable::new("outcomes", OUTCOMES),
    canned: PhraseTable::new("canned", CANNED),
};

// Keywords are matched as lowercase substrings of the profile text.
const KEYWORDS: Rows = &[
    (
        Intellectual,
        &[
            "analysis", "logic", "thinking", "intellect", "knowledge",
            "learning", "information", "understanding", "research", "concepts",
            "strategic thinking", "critical thinking", "abstract thinking",
            "cognitive", "rationality", "curiosity",
        ],
    ),
    (
        Emotional,
        &[
            "emotion", "feelings", "empathy", "compassion", "relationships",
            "understanding others", "emotional intelligence", "intuition", "mood",
            "harmony", "self-awareness", "self-regulation", "inner world",
            "emotional depth", "sensitivity", "psychological flexibility",
        ],
    ),
    (
        Practical,
        &[
            "organization", "planning", "efficiency", "results", "action",
            "discipline", "methodical", "punctual", "productivity", "goals",
            "structure", "processes", "orderliness", "consistency",
            "practicality", "pragmatism", "concreteness",
        ],
    ),
    (
        Creative,
        &[
            "creativity", "creative", "imagination", "ideas", "innovation",
            "originality", "intuition", "inspiration", "aesthetics", "expression",
            "art", "design", "unconventional thinking", "creative potential",
            "visualization", "novelty", "experimentation",
        ],
    ),
    (
        Analytical,
        &[
            "data analysis", "analytics", "systematic approach", "details", "precision",
            "structuring", "classification", "evaluation", "patterns", "algorithms",
            "methodology", "verification", "comparison", "measurement", "research",
            "argumentation", "facts", "logical connections",
        ],
    ),
];

const ASPECTS: Rows = &[
    (
        Intellectual,
        &[
            "Analytical thinking", "Information processing", "Strategic planning",
            "Conceptual thinking", "Spotting patterns", "Organizing knowledge",
            "Critical analysis", "Logical reasoning", "Deep understanding",
            "Abstract thinking", "Connecting concepts", "Intellectual curiosity",
        ],
    ),
    (
        Emotional,
        &[
            "Empathy", "Emotional perception", "Sensory experience",
            "Emotional self-reflection", "Deep feelings", "Intuitive understanding",
            "Emotional awareness", "Compassion", "Building close relationships",
            "Emotional receptiveness", "Emotional resonance", "Understanding how others feel",
        ],
    ),
    (
        Practical,
        &[
            "Being organized", "Structuring tasks", "Achieving concrete results",
            "Effective planning", "A practical approach", "Detailed analysis",
            "Step-by-step action", "Concrete steps", "Organizing processes",
            "Managing resources", "Optimizing your work", "Finishing what you start",
        ],
    ),
    (
        Creative,
        &[
            "Unconventional thinking", "Creative freedom", "Generating new ideas",
            "A creative approach", "Imaginative thinking", "Creative visualization",
            "Looking for unique solutions", "Aesthetic perception", "Originality",
            "Creative self-expression", "Innovative approaches", "Divergent thinking",
        ],
    ),
    (
        Analytical,
        &[
            "Detailed analysis", "Systematizing information", "Uncovering patterns",
            "Precise evaluation of data", "A methodical approach", "Structuring complex problems",
            "Consistent argumentation", "Building logical models", "Fact-based analysis",
            "Investigative thinking", "Categorization", "Precise wording",
        ],
    ),
];

const EMOJI: Rows = &[
    (Intellectual, &["🧠", "📚", "🔍", "🧩", "📝"]),
    (Emotional, &["❤️", "🧘", "🙏", "🌱", "🫂"]),
    (Practical, &["⏱️", "✅", "📊", "🚫", "📋"]),
    (Creative, &["🎨", "🔄", "🌈", "🧠", "🎭"]),
    (Analytical, &["📊", "🔍", "📈", "🧮", "📋"]),
];

const TECHNIQUES: Rows = &[
    (
        Intellectual,
        &[
            "deep reading", "spaced repetition",
            "mind mapping", "the Feynman technique",
            "active questioning", "the SQ3R method for texts",
            "looking for cross-disciplinary links", "debating with yourself",
            "keeping an ideas journal", "idea chaining",
        ],
    ),
    (
        Emotional,
        &[
            "a mindfulness practice", "emotional distancing",
            "progressive muscle relaxation", "a gratitude practice",
            "emotion mapping", "grounding exercises",
            "an emotion journal", "self-compassion practice",
            "emotional resonance exercises", "deliberate mood switching",
        ],
    ),
    (
        Practical,
        &[
            "the Getting Things Done system", "the Pomodoro technique",
            "the 3-2-1 method", "single-tasking",
            "time blocking", "the two-minute rule",
            "context lists", "a weekly task review",
            "the PARA method for organizing information", "energy alignment",
        ],
    ),
    (
        Creative,
        &[
            "random stimulus prompts", "the six thinking hats",
            "creative constraints", "reverse brainstorming",
            "creative combination drills", "synectics",
            "the 'what if' technique", "the SCAMPER method",
            "divergent thinking drills", "random association",
        ],
    ),
    (
        Analytical,
        &[
            "decomposing complex problems", "a SWOT analysis",
            "criteria-based ranking", "the 5W1H method",
            "sequential decomposition", "testing opposing hypotheses",
            "root cause analysis", "systematic fact checking",
            "cause-and-effect diagrams", "ABC analysis",
        ],
    ),
];

const CONTEXTS: Rows = &[
    (
        Intellectual,
        &[
            "when learning something new", "when working with complex information",
            "when preparing an important presentation", "during an intellectual slump",
            "for better retention", "when analysing hard problems",
            "for developing critical thinking", "when working with abstract concepts",
            "for organizing what you know", "when mastering a new field",
        ],
    ),
    (
        Emotional,
        &[
            "in stressful situations", "when dealing with difficult people",
            "when you feel emotionally drained", "in moments of anxiety",
            "for better relationships with loved ones", "during emotional ups and downs",
            "in conflict situations", "for amplifying positive emotions",
            "during important negotiations", "in periods of emotional instability",
        ],
    ),
    (
        Practical,
        &[
            "when you have a large volume of tasks", "at the start of the working day",
            "on long-term projects", "when you notice procrastination",
            "when planning complex tasks", "for raising personal effectiveness",
            "when building new habits", "when juggling several projects",
            "for balancing work and rest", "when optimizing workflows",
        ],
    ),
    (
        Creative,
        &[
            "on creative projects", "when you need unconventional solutions",
            "during a creative block", "when generating new ideas",
            "for developing creative thinking", "when you need to break out of habitual thinking",
            "for finding new angles on old problems", "when developing innovations",
            "in a group creative process", "for stretching the limits of your thinking",
        ],
    ),
    (
        Analytical,
        &[
            "when analysing complex data", "when you need a well-founded decision",
            "when an objective assessment is required", "while gathering and analysing information",
            "for uncovering hidden patterns", "when building analytical models",
            "for making forecasts", "when validating hypotheses",
            "in situations that demand accuracy and objectivity", "when solving multi-factor problems",
        ],
    ),
];

const OUTCOMES: Rows = &[
    (
        Intellectual,
        &[
            "your depth of understanding", "long-term retention",
            "your analytical abilities", "cognitive flexibility",
            "critical thinking", "your ability to synthesize information",
            "intellectual stamina", "the quality of your decisions",
            "information processing speed", "conceptual thinking",
        ],
    ),
    (
        Emotional,
        &[
            "emotional resilience", "the depth of your empathy",
            "emotional intelligence", "your capacity for self-compassion",
            "the quality of your relationships", "emotional well-being",
            "emotion regulation", "mindfulness in relationships",
            "inner harmony", "resilience",
        ],
    ),
    (
        Practical,
        &[
            "personal productivity", "the efficiency of your workflows",
            "goal achievement", "time management",
            "life balance", "organizational skills",
            "follow-through", "the quality of your results",
            "the stability of your work habits", "confidence in decision-making",
        ],
    ),
    (
        Creative,
        &[
            "creative output", "the originality of your ideas",
            "unconventional thinking", "your innovative potential",
            "creative confidence", "creative problem solving",
            "mental flexibility", "your ability to see opportunities",
            "creative courage", "your creative horizons",
        ],
    ),
    (
        Analytical,
        &[
            "the accuracy of your analysis", "objective judgement",
            "research depth", "well-grounded conclusions",
            "the effectiveness of a systematic approach", "pattern detection",
            "the quality of your analytical models", "methodological rigour",
            "the reliability of your results", "holistic assessment",
        ],
    ),
];

// Analytical has no canned row on purpose: it resolves through the default.
const CANNED: Rows = &[
    (
        Intellectual,
        &[
            "🧠 Set aside 15-20 minutes a day to read about a topic that interests you. It feeds your need for intellectual growth.",
            "🧩 Try the \"five whys\": when analysing a problem, ask \"why\" five times in a row to get to the root cause.",
        ],
    ),
    (
        Emotional,
        &[
            "📓 Keep an emotion journal: note your feelings during the day and what triggered them. It helps you understand your reactions.",
            "🧘 Use 4-7-8 breathing: inhale for 4 counts, hold for 7, exhale for 8. It lowers anxiety and restores emotional balance.",
        ],
    ),
    (
        Practical,
        &[
            "🐸 Eat the frog: start the day with the hardest, least pleasant task and the rest of the day gets easier.",
            "⏱️ Apply the two-minute rule: if a task takes less than two minutes, do it now. Your to-do list will shrink noticeably.",
        ],
    ),
    (
        Creative,
        &[
            "📝 Write morning pages: right after waking up, write three pages without censoring or editing. It stimulates creative thinking.",
            "🔄 Try the random word technique: pick any word from a dictionary and connect it to the task at hand to find new ideas.",
        ],
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn all_tables() -> [&'static PhraseTable; 7] {
        [
            &BUILTIN.keywords,
            &BUILTIN.aspects,
            &BUILTIN.emoji,
            &BUILTIN.techniques,
            &BUILTIN.contexts,
            &BUILTIN.outcomes,
            &BUILTIN.canned,
        ]
    }

    #[test]
    fn every_table_has_a_default_row() {
        for table in all_tables() {
            assert!(
                !table.resolve(None).is_empty(),
                "{} has no default row",
                table.name()
            );
        }
    }

    #[test]
    fn composition_tables_cover_every_type() {
        for table in [
            &BUILTIN.keywords,
            &BUILTIN.aspects,
            &BUILTIN.emoji,
            &BUILTIN.techniques,
            &BUILTIN.contexts,
            &BUILTIN.outcomes,
        ] {
            for ty in PersonalityType::ALL {
                assert!(table.row(ty).is_some(), "{} lacks {ty}", table.name());
            }
        }
    }

    #[test]
    fn missing_row_resolves_to_default() {
        assert!(BUILTIN.canned.row(Analytical).is_none());
        assert_eq!(
            BUILTIN.canned.resolve(Some(Analytical)),
            BUILTIN.canned.resolve(Some(DEFAULT_TYPE))
        );
        assert_eq!(
            BUILTIN.aspects.resolve(None),
            BUILTIN.aspects.row(DEFAULT_TYPE).unwrap()
        );
    }

    #[test]
    fn present_row_is_returned_verbatim() {
        assert_eq!(
            BUILTIN.techniques.resolve(Some(Creative)),
            BUILTIN.techniques.row(Creative).unwrap()
        );
    }

    #[test]
    fn keywords_are_lowercase() {
        for ty in BUILTIN.keywords.types() {
            for keyword in BUILTIN.keywords.row(ty).unwrap() {
                assert_eq!(*keyword, keyword.to_lowercase());
            }
        }
    }

    #[test]
    fn empty_table_resolves_to_empty_slice() {
        let table = PhraseTable::new("empty", &[]);
        assert!(table.resolve(Some(Creative)).is_empty());
    }
}
