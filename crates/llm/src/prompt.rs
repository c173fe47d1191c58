use std::fmt::Write as _;

use serde::Deserialize;
use vasini_survey::SynthesisRequest;

/// Build the profile-writing prompt from the rendered answers and the
/// classifier output.
pub fn build_profile_prompt(request: &SynthesisRequest) -> String {
    let mut prompt = String::from(
        "You are a supportive psychologist. Write a warm, specific personality profile \
         for the person below, addressed to them as \"you\". Cover their strengths, \
         how they think and relate to others, and what helps them grow. \
         Use plain paragraphs, no headings.\n\n",
    );

    if !request.demo.is_empty() {
        prompt.push_str("ABOUT THE PERSON:\n");
        for item in &request.demo {
            let _ = writeln!(prompt, "- {} {}", item.question, item.answer);
        }
        prompt.push('\n');
    }

    prompt.push_str("STRENGTHS QUESTIONNAIRE:\n");
    for (i, item) in request.inventory.iter().enumerate() {
        let _ = writeln!(prompt, "{}. {}\n   Answer: {}", i + 1, item.question, item.answer);
    }

    let classification = &request.classification;
    let _ = write!(
        prompt,
        "\nTYPE TALLY: {}\nPRIMARY TYPE: {}\nSECONDARY TYPE: {}\n\n",
        classification
            .type_counts
            .iter()
            .map(|(ty, count)| format!("{ty} {count}"))
            .collect::<Vec<_>>()
            .join(", "),
        classification.primary,
        classification.secondary,
    );

    prompt.push_str(
        "Respond with a JSON object of the form {\"details\": \"<profile text>\"}. \
         Use \\n inside the string for paragraph breaks.",
    );
    prompt
}

#[derive(Debug, Deserialize)]
struct ProfileJson {
    details: String,
}

/// Pull the profile text out of a model response.
///
/// Accepts a fenced ```json block, a bare JSON object, or, failing both,
/// the raw text itself.
pub fn extract_profile_text(response: &str) -> String {
    if let Some(fence_start) = response.find("```json") {
        let after_fence = &response[fence_start + "```json".len()..];
        if let Some(fence_end) = after_fence.find("```") {
            if let Ok(parsed) = serde_json::from_str::<ProfileJson>(after_fence[..fence_end].trim()) {
                return parsed.details.trim().to_string();
            }
        }
    }

    let trimmed = response.trim();
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if end > start {
            if let Ok(parsed) = serde_json::from_str::<ProfileJson>(&trimmed[start..=end]) {
                return parsed.details.trim().to_string();
            }
        }
    }

    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use vasini_survey::{AnswerSet, Catalog, OptionKey, Response, SynthesisRequest, classify};

    use super::*;

    fn request() -> SynthesisRequest {
        let catalog = Catalog::builtin().unwrap();
        let mut answers = AnswerSet::new();
        answers.record("name", Response::Text("Ada".into()));
        for question in catalog.list_inventory_questions() {
            answers.record(question.id.clone(), Response::Choice(OptionKey::B));
        }
        let classification = classify(&catalog, &answers);
        SynthesisRequest::new(&catalog, &answers, classification)
    }

    #[test]
    fn prompt_carries_answers_and_types() {
        let request = request();
        let prompt = build_profile_prompt(&request);
        assert!(prompt.contains("- What should I call you? Ada"));
        assert!(prompt.contains("1. How do you usually spend a free evening?"));
        assert!(prompt.contains("Answer: B: Talking with close friends"));
        assert!(prompt.contains("34. What would you like to develop in yourself?"));
        assert!(prompt.contains(&format!("PRIMARY TYPE: {}", request.classification.primary)));
        assert!(prompt.contains("\"details\""));
    }

    #[test]
    fn extracts_fenced_json() {
        let raw = "Here you go:\n```json\n{\"details\": \"  You are thoughtful.  \"}\n```";
        assert_eq!(extract_profile_text(raw), "You are thoughtful.");
    }

    #[test]
    fn extracts_bare_json_with_newlines() {
        let raw = "{\"details\": \"First paragraph.\\n\\nSecond paragraph.\"}";
        assert_eq!(
            extract_profile_text(raw),
            "First paragraph.\n\nSecond paragraph."
        );
    }

    #[test]
    fn falls_back_to_plain_text() {
        assert_eq!(
            extract_profile_text("  You enjoy {curly} ideas.  "),
            "You enjoy {curly} ideas."
        );
        assert_eq!(extract_profile_text(""), "");
    }

    #[test]
    fn json_without_details_is_plain_text() {
        let raw = "{\"profile\": \"x\"}";
        assert_eq!(extract_profile_text(raw), raw);
    }
}
