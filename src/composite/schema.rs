// src/composite/schema.rs

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use validator::Validate;

use crate::error::FieldError;
use crate::models::question::{HotspotData, QuestionKind, QuestionPayload};

/// Gap blanks are marked in the markup text as `{0}`, `{1}`, ...
static GAP_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\d+\}").unwrap());

/// The kind-specific sub-structure of a question, extracted from the flat
/// payload. Each variant carries only what its kind needs, so the rest of
/// the save pipeline never inspects optional fields again.
#[derive(Debug, Clone)]
pub enum KindData {
    Boolean { is_true_correct: bool },
    SingleChoice,
    MultipleChoice,
    FreeText,
    Categorizer,
    MultipleCategorizer,
    Sorter,
    Cloze,
    Hotspot(HotspotData),
    Gap { text: String, gaps: Vec<Value> },
    Essay,
}

/// Validates the kind-specific shape of a payload.
///
/// Pure function: no storage access, no side effects. All failing rules are
/// collected so the caller can report every offending field at once. The
/// question set reference must be present here; its existence is checked by
/// the writer against the storage collaborator.
pub fn validate(payload: &QuestionPayload) -> Result<KindData, Vec<FieldError>> {
    let mut errors = Vec::new();

    if payload.question_set.is_none() {
        errors.push(FieldError::new(
            "question_set",
            "a question set reference is required",
        ));
    }

    // A submitted choice collection is either empty or a real set of options.
    if let Some(choices) = &payload.choices {
        if choices.len() == 1 {
            errors.push(FieldError::new("choices", "at least 2 items are required"));
        }
    }

    // Sub-structure belonging to a different kind is rejected, not ignored.
    if payload.kind != QuestionKind::Hotspot && payload.hotspot_data.is_some() {
        errors.push(FieldError::new(
            "hotspot_data",
            format!("not valid for kind '{}'", payload.kind.as_str()),
        ));
    }
    if payload.kind != QuestionKind::Gap && (payload.gap_text.is_some() || payload.gaps.is_some()) {
        errors.push(FieldError::new(
            "gap_text",
            format!("gap fields are not valid for kind '{}'", payload.kind.as_str()),
        ));
    }
    if payload.kind != QuestionKind::Boolean && payload.is_true_correct.is_some() {
        errors.push(FieldError::new(
            "is_true_correct",
            format!("not valid for kind '{}'", payload.kind.as_str()),
        ));
    }

    let kind_data = match payload.kind {
        QuestionKind::Boolean => match payload.is_true_correct {
            Some(is_true_correct) => Some(KindData::Boolean { is_true_correct }),
            None => {
                errors.push(FieldError::new(
                    "is_true_correct",
                    "boolean questions require a correctness flag",
                ));
                None
            }
        },
        QuestionKind::SingleChoice => Some(KindData::SingleChoice),
        QuestionKind::MultipleChoice => Some(KindData::MultipleChoice),
        QuestionKind::FreeText => Some(KindData::FreeText),
        QuestionKind::Categorizer => Some(KindData::Categorizer),
        QuestionKind::MultipleCategorizer => Some(KindData::MultipleCategorizer),
        QuestionKind::Sorter => Some(KindData::Sorter),
        QuestionKind::Cloze => Some(KindData::Cloze),
        QuestionKind::Hotspot => validate_hotspot(payload, &mut errors),
        QuestionKind::Gap => validate_gap(payload, &mut errors),
        QuestionKind::Essay => Some(KindData::Essay),
    };

    match kind_data {
        Some(data) if errors.is_empty() => Ok(data),
        _ => Err(errors),
    }
}

fn validate_hotspot(payload: &QuestionPayload, errors: &mut Vec<FieldError>) -> Option<KindData> {
    let Some(data) = &payload.hotspot_data else {
        errors.push(FieldError::new(
            "hotspot_data",
            "hotspot questions require a hotspot descriptor",
        ));
        return None;
    };
    if let Err(e) = data.validate() {
        errors.push(FieldError::new(
            "hotspot_data",
            e.to_string().replace('\n', "; "),
        ));
        return None;
    }
    Some(KindData::Hotspot(data.clone()))
}

fn validate_gap(payload: &QuestionPayload, errors: &mut Vec<FieldError>) -> Option<KindData> {
    let text = match payload.gap_text.as_deref() {
        Some(text) if !text.trim().is_empty() => Some(text),
        _ => {
            errors.push(FieldError::new(
                "gap_text",
                "gap questions require the gap markup text",
            ));
            None
        }
    };
    let gaps = match &payload.gaps {
        Some(gaps) if !gaps.is_empty() => Some(gaps),
        _ => {
            errors.push(FieldError::new(
                "gaps",
                "gap questions require at least one gap descriptor",
            ));
            None
        }
    };
    let (text, gaps) = match (text, gaps) {
        (Some(text), Some(gaps)) => (text, gaps),
        _ => return None,
    };

    let markers = GAP_MARKER.find_iter(text).count();
    if markers != gaps.len() {
        errors.push(FieldError::new(
            "gap_text",
            format!(
                "markup contains {markers} gap markers but {} gaps were submitted",
                gaps.len()
            ),
        ));
        return None;
    }

    Some(KindData::Gap {
        text: text.to_string(),
        gaps: gaps.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn payload(kind: QuestionKind) -> QuestionPayload {
        QuestionPayload {
            id: None,
            kind,
            title: "Q".to_string(),
            content: None,
            raw_content: None,
            explanation: None,
            hotspot_data: None,
            gap_text: None,
            gaps: None,
            is_true_correct: None,
            weight: None,
            image: None,
            audio: None,
            question_set: Some(Uuid::new_v4()),
            copied_from: None,
            is_archived: None,
            tags: None,
            choices: None,
            categories: None,
            items: None,
            clozes: None,
        }
    }

    fn field_names(errors: Vec<FieldError>) -> Vec<String> {
        errors.into_iter().map(|e| e.field).collect()
    }

    #[test]
    fn missing_question_set_fails() {
        let mut p = payload(QuestionKind::Essay);
        p.question_set = None;
        let errors = validate(&p).unwrap_err();
        assert!(field_names(errors).contains(&"question_set".to_string()));
    }

    #[test]
    fn hotspot_requires_descriptor() {
        let errors = validate(&payload(QuestionKind::Hotspot)).unwrap_err();
        assert!(field_names(errors).contains(&"hotspot_data".to_string()));
    }

    #[test]
    fn hotspot_rejects_empty_shapes() {
        let mut p = payload(QuestionKind::Hotspot);
        p.hotspot_data = Some(HotspotData {
            height: 100,
            width: 200,
            image: "http://x/y.png".to_string(),
            require_all: false,
            shapes: vec![],
        });
        let errors = validate(&p).unwrap_err();
        assert!(field_names(errors).contains(&"hotspot_data".to_string()));
    }

    #[test]
    fn gap_requires_both_text_and_descriptors() {
        let mut p = payload(QuestionKind::Gap);
        p.gap_text = Some("The {0} sat".to_string());
        let errors = validate(&p).unwrap_err();
        assert!(field_names(errors).contains(&"gaps".to_string()));

        let mut p = payload(QuestionKind::Gap);
        p.gaps = Some(vec![json!({"answer": "cat"})]);
        let errors = validate(&p).unwrap_err();
        assert!(field_names(errors).contains(&"gap_text".to_string()));
    }

    #[test]
    fn gap_marker_count_must_match() {
        let mut p = payload(QuestionKind::Gap);
        p.gap_text = Some("The {0} sat on the {1}".to_string());
        p.gaps = Some(vec![json!({"answer": "cat"})]);
        assert!(validate(&p).is_err());

        p.gaps = Some(vec![json!({"answer": "cat"}), json!({"answer": "mat"})]);
        assert!(matches!(validate(&p), Ok(KindData::Gap { .. })));
    }

    #[test]
    fn single_choice_collection_is_rejected() {
        let mut p = payload(QuestionKind::SingleChoice);
        p.choices = Some(vec![crate::models::question::ChoicePayload {
            id: None,
            content: Some(json!("A")),
            is_correct: Some(true),
            order: Some(0),
            image: None,
        }]);
        let errors = validate(&p).unwrap_err();
        assert!(field_names(errors).contains(&"choices".to_string()));
    }

    #[test]
    fn boolean_requires_correctness_flag() {
        let errors = validate(&payload(QuestionKind::Boolean)).unwrap_err();
        assert!(field_names(errors).contains(&"is_true_correct".to_string()));

        let mut p = payload(QuestionKind::Boolean);
        p.is_true_correct = Some(true);
        assert!(matches!(
            validate(&p),
            Ok(KindData::Boolean { is_true_correct: true })
        ));
    }

    #[test]
    fn foreign_substructure_is_rejected() {
        let mut p = payload(QuestionKind::Cloze);
        p.hotspot_data = Some(HotspotData {
            height: 1,
            width: 1,
            image: "img".to_string(),
            require_all: false,
            shapes: vec![crate::models::question::HotspotShape {
                kind: "rect".to_string(),
                points: None,
            }],
        });
        let errors = validate(&p).unwrap_err();
        assert!(field_names(errors).contains(&"hotspot_data".to_string()));
    }
}
