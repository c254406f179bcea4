// Quiz question schema: validated decode of model output plus the
// hardcoded fallback set served when generation or parsing fails.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const DEFAULT_CATEGORY: &str = "Écologie";
pub const DEFAULT_ICON: &str = "🌱";

/// Question difficulty as produced by the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Facile,
    #[default]
    Moyen,
    Difficile,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Facile => "facile",
            Difficulty::Moyen => "moyen",
            Difficulty::Difficile => "difficile",
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A true/false quiz question, normalized and ready to serve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub affirmation: String,
    pub reponse: bool,
    pub explication: String,
    pub categorie: String,
    pub icone: String,
    pub difficulte: Difficulty,
}

/// The model's verdict on a player's answer (check-answer route).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerCheck {
    pub correct: bool,
    pub explanation: String,
}

/// A decoded value does not have the required shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` has the wrong type (expected {expected})")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("field `{0}` must not be empty")]
    EmptyField(&'static str),
}

fn require_string(value: &Value, field: &'static str) -> Result<String, ValidationError> {
    match value.get(field) {
        None | Some(Value::Null) => Err(ValidationError::MissingField(field)),
        Some(Value::String(s)) => {
            if s.trim().is_empty() {
                Err(ValidationError::EmptyField(field))
            } else {
                Ok(s.clone())
            }
        }
        Some(_) => Err(ValidationError::WrongType {
            field,
            expected: "string",
        }),
    }
}

/// Optional string field: absent, wrong-typed, or empty falls through
/// to the caller's default.
fn optional_string(value: &Value, field: &str) -> Option<String> {
    match value.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Confirm a decoded value has the quiz-question shape and normalize it.
///
/// Required: `affirmation` (non-empty string), `reponse` (boolean),
/// `explication` (non-empty string). Optional fields get defaults when
/// absent or of the wrong type. Pure, no I/O.
pub fn decode_quiz_question(value: &Value) -> Result<QuizQuestion, ValidationError> {
    let affirmation = require_string(value, "affirmation")?;
    let reponse = match value.get("reponse") {
        None | Some(Value::Null) => return Err(ValidationError::MissingField("reponse")),
        Some(Value::Bool(b)) => *b,
        Some(_) => {
            return Err(ValidationError::WrongType {
                field: "reponse",
                expected: "boolean",
            })
        }
    };
    let explication = require_string(value, "explication")?;

    let categorie =
        optional_string(value, "categorie").unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
    let icone = optional_string(value, "icone").unwrap_or_else(|| DEFAULT_ICON.to_string());
    let difficulte = value
        .get("difficulte")
        .and_then(|v| serde_json::from_value::<Difficulty>(v.clone()).ok())
        .unwrap_or_default();

    Ok(QuizQuestion {
        affirmation,
        reponse,
        explication,
        categorie,
        icone,
        difficulte,
    })
}

/// Confirm a decoded value has the answer-verdict shape.
pub fn decode_answer_check(value: &Value) -> Result<AnswerCheck, ValidationError> {
    let correct = match value.get("correct") {
        None | Some(Value::Null) => return Err(ValidationError::MissingField("correct")),
        Some(Value::Bool(b)) => *b,
        Some(_) => {
            return Err(ValidationError::WrongType {
                field: "correct",
                expected: "boolean",
            })
        }
    };
    let explanation = match value.get("explanation") {
        None | Some(Value::Null) => return Err(ValidationError::MissingField("explanation")),
        Some(Value::String(s)) => s.clone(),
        Some(_) => {
            return Err(ValidationError::WrongType {
                field: "explanation",
                expected: "string",
            })
        }
    };
    Ok(AnswerCheck {
        correct,
        explanation,
    })
}

/// Known-valid questions served when generation or recovery fails.
pub fn fallback_questions() -> Vec<QuizQuestion> {
    vec![
        QuizQuestion {
            affirmation: "Les forêts absorbent plus de CO2 qu'elles n'en rejettent.".into(),
            reponse: true,
            explication: "Les forêts sont des puits de carbone naturels qui stockent le CO2 \
                          de l'atmosphère dans leur biomasse."
                .into(),
            categorie: "Forêts".into(),
            icone: "🌳".into(),
            difficulte: Difficulty::Facile,
        },
        QuizQuestion {
            affirmation: "L'énergie solaire produit plus de CO2 que l'énergie nucléaire.".into(),
            reponse: false,
            explication: "L'énergie solaire a une empreinte carbone très faible, bien \
                          inférieure à celle du nucléaire sur l'ensemble du cycle de vie."
                .into(),
            categorie: "Énergie".into(),
            icone: "⚡".into(),
            difficulte: Difficulty::Moyen,
        },
        QuizQuestion {
            affirmation: "Le transport maritime représente environ 3% des émissions mondiales \
                          de CO2."
                .into(),
            reponse: true,
            explication: "Le transport maritime international représente environ 2-3% des \
                          émissions mondiales de gaz à effet de serre."
                .into(),
            categorie: "Transport".into(),
            icone: "🚢".into(),
            difficulte: Difficulty::Difficile,
        },
        QuizQuestion {
            affirmation: "Le recyclage du plastique permet de réduire significativement \
                          l'impact environnemental."
                .into(),
            reponse: true,
            explication: "Le recyclage du plastique évite la production de nouveau plastique \
                          et réduit les déchets, diminuant ainsi l'impact environnemental global."
                .into(),
            categorie: "Déchets".into(),
            icone: "♻️".into(),
            difficulte: Difficulty::Facile,
        },
    ]
}

/// Random fallback for the quiz-question route.
pub fn random_fallback() -> QuizQuestion {
    let questions = fallback_questions();
    questions
        .choose(&mut rand::thread_rng())
        .cloned()
        .expect("fallback set is non-empty")
}

/// Fixed fallback for the generate-statement route.
pub fn fixed_fallback() -> QuizQuestion {
    fallback_questions()
        .pop()
        .expect("fallback set is non-empty")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json_extract::parse_safely;
    use serde_json::json;

    #[test]
    fn test_decode_applies_defaults() {
        let value = json!({"affirmation": "x", "reponse": true, "explication": "y"});
        let q = decode_quiz_question(&value).unwrap();
        assert_eq!(q.affirmation, "x");
        assert!(q.reponse);
        assert_eq!(q.explication, "y");
        assert_eq!(q.categorie, "Écologie");
        assert_eq!(q.icone, "🌱");
        assert_eq!(q.difficulte, Difficulty::Moyen);
    }

    #[test]
    fn test_decode_keeps_provided_optionals() {
        let value = json!({
            "affirmation": "a", "reponse": false, "explication": "b",
            "categorie": "Transport", "icone": "🚗", "difficulte": "difficile"
        });
        let q = decode_quiz_question(&value).unwrap();
        assert_eq!(q.categorie, "Transport");
        assert_eq!(q.icone, "🚗");
        assert_eq!(q.difficulte, Difficulty::Difficile);
    }

    #[test]
    fn test_decode_missing_reponse_fails() {
        let value = json!({"affirmation": "x", "explication": "y"});
        assert_eq!(
            decode_quiz_question(&value),
            Err(ValidationError::MissingField("reponse"))
        );
    }

    #[test]
    fn test_decode_wrong_type_reponse_fails() {
        let value = json!({"affirmation": "x", "reponse": "vrai", "explication": "y"});
        assert!(matches!(
            decode_quiz_question(&value),
            Err(ValidationError::WrongType { field: "reponse", .. })
        ));
    }

    #[test]
    fn test_decode_empty_affirmation_fails() {
        let value = json!({"affirmation": "  ", "reponse": true, "explication": "y"});
        assert_eq!(
            decode_quiz_question(&value),
            Err(ValidationError::EmptyField("affirmation"))
        );
    }

    #[test]
    fn test_decode_wrong_typed_optionals_get_defaults() {
        let value = json!({
            "affirmation": "x", "reponse": true, "explication": "y",
            "categorie": 42, "icone": null, "difficulte": "impossible"
        });
        let q = decode_quiz_question(&value).unwrap();
        assert_eq!(q.categorie, "Écologie");
        assert_eq!(q.icone, "🌱");
        assert_eq!(q.difficulte, Difficulty::Moyen);
    }

    #[test]
    fn test_pipeline_round_trip() {
        let original = QuizQuestion {
            affirmation: "Les abeilles pollinisent un tiers des cultures.".into(),
            reponse: true,
            explication: "Environ 35% de la production agricole mondiale dépend des \
                          pollinisateurs."
                .into(),
            categorie: "Biodiversité".into(),
            icone: "🦋".into(),
            difficulte: Difficulty::Moyen,
        };
        let encoded = serde_json::to_string(&original).unwrap();
        let value: serde_json::Value = parse_safely(&encoded).unwrap();
        let decoded = decode_quiz_question(&value).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_full_pipeline_fenced_scenario() {
        let input = "Sure! Here's your question:\n```json\n{\"affirmation\":\"Le soleil est chaud\",\"reponse\":true,\"explication\":\"Oui.\",\"categorie\":\"Énergie\",\"icone\":\"⚡\",\"difficulte\":\"facile\"}\n```\nHope that helps!";
        let value: serde_json::Value = parse_safely(input).unwrap();
        let q = decode_quiz_question(&value).unwrap();
        assert_eq!(q.affirmation, "Le soleil est chaud");
        assert!(q.reponse);
        assert_eq!(q.explication, "Oui.");
        assert_eq!(q.categorie, "Énergie");
        assert_eq!(q.icone, "⚡");
        assert_eq!(q.difficulte, Difficulty::Facile);
    }

    #[test]
    fn test_decode_answer_check() {
        let value = json!({"correct": true, "explanation": "Bien vu."});
        let v = decode_answer_check(&value).unwrap();
        assert!(v.correct);
        assert_eq!(v.explanation, "Bien vu.");
    }

    #[test]
    fn test_decode_answer_check_missing_correct() {
        let value = json!({"explanation": "?"});
        assert_eq!(
            decode_answer_check(&value),
            Err(ValidationError::MissingField("correct"))
        );
    }

    #[test]
    fn test_fallbacks_are_schema_valid() {
        for q in fallback_questions() {
            let value = serde_json::to_value(&q).unwrap();
            assert_eq!(decode_quiz_question(&value).unwrap(), q);
        }
    }

    #[test]
    fn test_difficulty_serde_names() {
        assert_eq!(
            serde_json::to_string(&Difficulty::Facile).unwrap(),
            "\"facile\""
        );
        let d: Difficulty = serde_json::from_str("\"difficile\"").unwrap();
        assert_eq!(d, Difficulty::Difficile);
    }
}
