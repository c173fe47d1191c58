//! Contract for the external service that turns answers into profile prose.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::answer::{AnswerSet, Response};
use crate::catalog::{Catalog, Question};
use crate::classifier::Classification;
use crate::error::SynthesisError;
use crate::reply::QuestionPrompt;

/// One answered question with the texts the user actually saw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnsweredQuestion {
    pub question_id: String,
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisRequest {
    pub answers: AnswerSet,
    pub demo: Vec<AnsweredQuestion>,
    pub inventory: Vec<AnsweredQuestion>,
    pub classification: Classification,
}

impl SynthesisRequest {
    pub fn new(catalog: &Catalog, answers: &AnswerSet, classification: Classification) -> Self {
        let render = |questions: &[Question]| -> Vec<AnsweredQuestion> {
            questions
                .iter()
                .filter_map(|question| {
                    let answer = match answers.get(&question.id)? {
                        Response::Text(text) => text.clone(),
                        Response::Choice(key) => match question.option(*key) {
                            Some(option) => QuestionPrompt::option_label(*key, &option.text),
                            None => key.to_string(),
                        },
                    };
                    Some(AnsweredQuestion {
                        question_id: question.id.clone(),
                        question: question.text.clone(),
                        answer,
                    })
                })
                .collect()
        };

        Self {
            demo: render(catalog.list_demo_questions()),
            inventory: render(catalog.list_inventory_questions()),
            answers: answers.clone(),
            classification,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSynthesis {
    pub details: String,
}

#[async_trait]
pub trait ProfileGateway: Send + Sync {
    async fn synthesize(&self, request: &SynthesisRequest)
    -> Result<ProfileSynthesis, SynthesisError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::OptionKey;
    use crate::classifier::classify;

    #[test]
    fn request_renders_question_and_option_texts() {
        let catalog = Catalog::builtin().unwrap();
        let mut answers = AnswerSet::new();
        answers.record("name", Response::Text("Ada".into()));
        answers.record("v01", Response::Choice(OptionKey::A));
        let classification = classify(&catalog, &answers);

        let request = SynthesisRequest::new(&catalog, &answers, classification);
        assert_eq!(request.demo.len(), 1);
        assert_eq!(request.demo[0].answer, "Ada");
        assert_eq!(request.inventory.len(), 1);
        assert_eq!(
            request.inventory[0].answer,
            "A: Reading or learning something new"
        );
        assert_eq!(request.answers.len(), 2);
    }
}
