//! Recorded answers and the inventory answer parser.

use serde::{Deserialize, Serialize};

use crate::catalog::{OptionKey, Question};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Response {
    Text(String),
    Choice(OptionKey),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: String,
    pub response: Response,
}

/// Answers in the order the questions were asked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet {
    entries: Vec<Answer>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an answer.  Re-answering a question replaces the earlier
    /// response in place so the set keeps question order.
    pub fn record(&mut self, question_id: impl Into<String>, response: Response) {
        let question_id = question_id.into();
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|answer| answer.question_id == question_id)
        {
            existing.response = response;
            return;
        }
        self.entries.push(Answer {
            question_id,
            response,
        });
    }

    pub fn get(&self, question_id: &str) -> Option<&Response> {
        self.entries
            .iter()
            .find(|answer| answer.question_id == question_id)
            .map(|answer| &answer.response)
    }

    pub fn choice(&self, question_id: &str) -> Option<OptionKey> {
        match self.get(question_id) {
            Some(Response::Choice(key)) => Some(*key),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Answer> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Extract an option letter from free-form input.
///
/// Rules are tried in order against the trimmed text, first match wins:
///
/// 1. `"A:"` prefix (`"A: Reading or learning"`, the reply-keyboard label)
/// 2. `"A "` prefix (`"A reading"`)
/// 3. the whole text is a single letter, any case (`"a"`)
/// 4. a whitespace-separated token equal to a letter, any case
///    (`"I pick B here"`)
pub fn parse_option(text: &str) -> Option<OptionKey> {
    let text = text.trim();

    let by_prefix = |suffix: char| {
        OptionKey::ALL.into_iter().find(|key| {
            let mut chars = text.chars();
            chars.next() == Some(key.as_char()) && chars.next() == Some(suffix)
        })
    };

    by_prefix(':')
        .or_else(|| by_prefix(' '))
        .or_else(|| single_letter(text))
        .or_else(|| text.split_whitespace().find_map(single_letter))
}

fn single_letter(token: &str) -> Option<OptionKey> {
    let mut chars = token.chars();
    let c = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    OptionKey::from_char(c.to_ascii_uppercase())
}

/// Parse `text` as an answer to `question`.  A letter the question does not
/// offer is treated the same as no letter at all.
pub fn parse_answer(question: &Question, text: &str) -> Option<OptionKey> {
    parse_option(text).filter(|key| question.option(*key).is_some())
}

#[cfg(test)]
mod tests {
    use vasini_advice::PersonalityType;

    use super::*;
    use crate::catalog::ChoiceOption;

    #[test]
    fn accepts_each_format() {
        assert_eq!(parse_option("A: Reading or learning"), Some(OptionKey::A));
        assert_eq!(parse_option("B talking with friends"), Some(OptionKey::B));
        assert_eq!(parse_option("c"), Some(OptionKey::C));
        assert_eq!(parse_option("  D  "), Some(OptionKey::D));
        assert_eq!(parse_option("I think B fits me"), Some(OptionKey::B));
        assert_eq!(parse_option("probably d"), Some(OptionKey::D));
    }

    #[test]
    fn earlier_rule_wins() {
        // Prefix beats the isolated-token rule.
        assert_eq!(parse_option("C: not A"), Some(OptionKey::C));
        assert_eq!(parse_option("D or B"), Some(OptionKey::D));
        // Among tokens, the first letter in the text wins.
        assert_eq!(parse_option("maybe B or C"), Some(OptionKey::B));
    }

    #[test]
    fn rejects_input_without_standalone_letter() {
        for text in [
            "",
            "   ",
            "I have no idea",
            "ABCD",
            "E",
            "Bob likes Cats",
            "a:",
            "option-B",
        ] {
            assert_eq!(parse_option(text), None, "{text:?}");
        }
    }

    #[test]
    fn prefix_rules_are_case_sensitive() {
        // "b:" is neither a prefix match nor a standalone token.
        assert_eq!(parse_option("b: talk"), None);
        // "b " falls through to the token rule.
        assert_eq!(parse_option("b talk"), Some(OptionKey::B));
    }

    #[test]
    fn parse_answer_requires_offered_option() {
        let question = Question::fixed_choice(
            "q",
            "pick",
            vec![ChoiceOption {
                key: OptionKey::A,
                text: "only".into(),
                interpretation: "only".into(),
                leans: PersonalityType::Practical,
            }],
        );
        assert_eq!(parse_answer(&question, "A"), Some(OptionKey::A));
        assert_eq!(parse_answer(&question, "B"), None);
    }

    #[test]
    fn answer_set_keeps_question_order() {
        let mut answers = AnswerSet::new();
        answers.record("name", Response::Text("Ada".into()));
        answers.record("v01", Response::Choice(OptionKey::B));
        answers.record("v02", Response::Choice(OptionKey::C));
        answers.record("v01", Response::Choice(OptionKey::D));

        let ids: Vec<_> = answers.iter().map(|a| a.question_id.as_str()).collect();
        assert_eq!(ids, ["name", "v01", "v02"]);
        assert_eq!(answers.choice("v01"), Some(OptionKey::D));
        assert_eq!(answers.choice("name"), None);
        assert_eq!(answers.len(), 3);
    }
}
