use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Exam question for one (contest, slot) pair. Text fields are language maps
/// keyed by language code, "en" is the fallback.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Question {
    pub id: String,
    pub contest_id: String,
    pub slot_id: String,
    pub question_text: HashMap<String, String>,
    pub options: Vec<QuestionOption>,
    pub question_type: QuestionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>, // text/numeric answer key
    pub marks: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct QuestionOption {
    pub option_text: HashMap<String, String>,
    pub is_correct: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Mcq,
    Text,
    Numeric,
}

impl Question {
    /// Resolve the question text for a language, falling back to English.
    pub fn text_for(&self, lang: &str) -> String {
        resolve_lang(&self.question_text, lang)
    }
}

impl QuestionOption {
    pub fn text_for(&self, lang: &str) -> String {
        resolve_lang(&self.option_text, lang)
    }
}

fn resolve_lang(text: &HashMap<String, String>, lang: &str) -> String {
    text.get(lang)
        .or_else(|| text.get("en"))
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lang_map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn question_type_serializes_lowercase() {
        let json = serde_json::to_string(&QuestionType::Mcq).expect("should serialize");
        assert_eq!(json, "\"mcq\"");

        let parsed: QuestionType = serde_json::from_str("\"numeric\"").expect("should parse");
        assert_eq!(parsed, QuestionType::Numeric);
    }

    #[test]
    fn text_resolution_falls_back_to_english() {
        let question = Question {
            id: "q-1".to_string(),
            contest_id: "contest-1".to_string(),
            slot_id: "Slot-1".to_string(),
            question_text: lang_map(&[("en", "What is 2 + 2?"), ("hi", "2 + 2 kya hai?")]),
            options: vec![QuestionOption {
                option_text: lang_map(&[("en", "Four")]),
                is_correct: true,
            }],
            question_type: QuestionType::Mcq,
            correct_answer: None,
            marks: 1.0,
            created_at: None,
        };

        assert_eq!(question.text_for("hi"), "2 + 2 kya hai?");
        assert_eq!(question.text_for("ta"), "What is 2 + 2?");
        assert_eq!(question.options[0].text_for("ta"), "Four");
    }

    #[test]
    fn missing_language_and_fallback_yields_empty_text() {
        let option = QuestionOption {
            option_text: lang_map(&[("hi", "Chaar")]),
            is_correct: false,
        };

        assert_eq!(option.text_for("en"), "");
    }
}
