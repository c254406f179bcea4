// Game-mode configuration table and prompt construction for the
// question-generation routes.

use serde::{Deserialize, Serialize};

use crate::categories::QuizCategory;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    #[default]
    Classic,
    Chrono,
    Challenge,
    Marathon,
    Multiplayer,
    Expert,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Classic => "classic",
            GameMode::Chrono => "chrono",
            GameMode::Challenge => "challenge",
            GameMode::Marathon => "marathon",
            GameMode::Multiplayer => "multiplayer",
            GameMode::Expert => "expert",
        }
    }

    /// Lenient parse: unknown mode names fall back to classic, so a
    /// stale client never breaks question generation.
    pub fn from_name(name: &str) -> GameMode {
        match name {
            "chrono" => GameMode::Chrono,
            "challenge" => GameMode::Challenge,
            "marathon" => GameMode::Marathon,
            "multiplayer" => GameMode::Multiplayer,
            "expert" => GameMode::Expert,
            _ => GameMode::Classic,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct GameModeSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<&'static str>,
    pub multiplayer: bool,
    pub category: bool,
}

const NO_SETTINGS: GameModeSettings = GameModeSettings {
    time_limit: None,
    question_count: None,
    difficulty: None,
    multiplayer: false,
    category: false,
};

#[derive(Debug, Clone, Copy, Serialize)]
pub struct GameModeConfig {
    pub id: GameMode,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub rules: &'static [&'static str],
    pub settings: GameModeSettings,
}

pub const GAME_MODES: &[GameModeConfig] = &[
    GameModeConfig {
        id: GameMode::Classic,
        name: "Mode Classique",
        description: "Le mode original avec questions variées",
        icon: "🎯",
        rules: &["Questions variées", "Pas de limite de temps", "Progression libre"],
        settings: NO_SETTINGS,
    },
    GameModeConfig {
        id: GameMode::Chrono,
        name: "Mode Chrono",
        description: "5 secondes par question !",
        icon: "⏱️",
        rules: &[
            "5 secondes par question",
            "Réponse automatique si timeout",
            "Bonus XP si réponse rapide",
        ],
        settings: GameModeSettings {
            time_limit: Some(5),
            ..NO_SETTINGS
        },
    },
    GameModeConfig {
        id: GameMode::Challenge,
        name: "Mode Défi",
        description: "5 questions d'une catégorie",
        icon: "🎲",
        rules: &["5 questions", "Catégorie au choix", "Score sur 5", "Bonus si parfait"],
        settings: GameModeSettings {
            question_count: Some(5),
            category: true,
            ..NO_SETTINGS
        },
    },
    GameModeConfig {
        id: GameMode::Marathon,
        name: "Mode Marathon",
        description: "20 questions, difficulté progressive",
        icon: "🏃",
        rules: &[
            "20 questions",
            "Difficulté progressive",
            "Bonus XP croissant",
            "Endurance requise",
        ],
        settings: GameModeSettings {
            question_count: Some(20),
            ..NO_SETTINGS
        },
    },
    GameModeConfig {
        id: GameMode::Multiplayer,
        name: "Mode Multijoueur",
        description: "Jusqu'à 4 joueurs, tour par tour",
        icon: "👥",
        rules: &[
            "2-4 joueurs",
            "3 vies par joueur",
            "Tour par tour",
            "Dernier survivant gagne",
        ],
        settings: GameModeSettings {
            multiplayer: true,
            ..NO_SETTINGS
        },
    },
    GameModeConfig {
        id: GameMode::Expert,
        name: "Mode Expert",
        description: "Que des questions difficiles",
        icon: "🧠",
        rules: &[
            "Questions difficiles uniquement",
            "XP doublé",
            "Pour les experts",
            "Défi ultime",
        ],
        settings: GameModeSettings {
            difficulty: Some("difficile"),
            ..NO_SETTINGS
        },
    },
];

/// Config for a mode, falling back to classic.
pub fn mode_config(mode: GameMode) -> &'static GameModeConfig {
    GAME_MODES
        .iter()
        .find(|m| m.id == mode)
        .unwrap_or(&GAME_MODES[0])
}

/// Base instructions for question generation. The model must answer
/// with a bare JSON object matching the quiz-question schema; the
/// recovery parser handles the cases where it does not comply.
pub const QUESTION_SYSTEM_PROMPT: &str = "\
Tu es un expert en écologie et développement durable. Génère une question \
sous forme d'affirmation vraie ou fausse sur l'écologie, l'environnement, \
le climat ou le développement durable.

L'affirmation doit être :
- Claire et précise
- Éducative et intéressante
- Basée sur des faits scientifiques
- Adaptée au niveau demandé

L'explication doit être :
- Pédagogique et accessible
- Factuelle et sourcée
- D'environ 1-2 phrases

Réponds UNIQUEMENT avec un JSON valide, sans texte autour, en utilisant \
EXACTEMENT cette structure :

{
  \"affirmation\": \"Une affirmation claire et précise\",
  \"reponse\": true,
  \"explication\": \"Explication détaillée de 1-2 phrases\",
  \"categorie\": \"Catégorie (Énergie, Transport, Déchets, etc.)\",
  \"icone\": \"Un emoji approprié\",
  \"difficulte\": \"facile, moyen ou difficile\"
}";

pub const DEFAULT_USER_PROMPT: &str = "Génère une question écologique intéressante.";

/// Build the (system, user) prompt pair for one question, applying
/// per-mode adaptations and an optional category focus.
pub fn question_prompts(
    mode: GameMode,
    category: Option<&QuizCategory>,
    question_number: u32,
) -> (String, String) {
    let mut system = QUESTION_SYSTEM_PROMPT.to_string();
    let mut user = DEFAULT_USER_PROMPT.to_string();

    if let Some(cat) = category {
        user = format!(
            "Génère une question spécifiquement sur la catégorie \"{}\". \
             La question doit porter sur {}.",
            cat.name,
            cat.subjects.join(", ")
        );
        system.push_str(&format!(
            "\n\nFocus spécial sur la catégorie \"{}\".",
            cat.name
        ));
    }

    match mode {
        GameMode::Expert => {
            system.push_str(
                "\n\nNiveau EXPERT : Génère une question difficile avec des détails \
                 techniques précis.",
            );
        }
        GameMode::Marathon if question_number > 10 => {
            system.push_str(
                "\n\nNiveau AVANCÉ : Génère une question de difficulté moyenne à difficile.",
            );
        }
        GameMode::Chrono => {
            system.push_str(
                "\n\nMode CHRONO : Génère une question claire et directe, facile à \
                 comprendre rapidement.",
            );
        }
        _ => {}
    }

    (system, user)
}

/// Instructions for the answer-verification route: a single-line JSON
/// verdict, no markdown.
pub const VERDICT_SYSTEM_PROMPT: &str = "\
Tu es un expert en écologie qui évalue les réponses à un quiz.
On te donne une affirmation et la réponse de l'utilisateur (vrai ou faux).
Tu dois déterminer si la réponse est correcte et fournir une explication \
courte et éducative.

IMPORTANT: Réponds UNIQUEMENT avec un objet JSON valide, sans backticks \
markdown, sans formatage supplémentaire.
Format exact requis :
{\"correct\": true, \"explanation\": \"Votre explication ici\"}
ou
{\"correct\": false, \"explanation\": \"Votre explication ici\"}

Ne pas utiliser de backticks, ne pas ajouter de texte avant ou après le JSON.";

/// Build the user prompt for the answer-verification route.
pub fn verdict_prompt(statement: &str, user_answer: bool) -> String {
    format!(
        "Affirmation: \"{statement}\"\nRéponse de l'utilisateur: {user_answer}\n\n\
         Cette réponse est-elle correcte ? Fournis une explication."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::find_category;

    #[test]
    fn test_mode_config_lookup() {
        assert_eq!(mode_config(GameMode::Chrono).settings.time_limit, Some(5));
        assert_eq!(
            mode_config(GameMode::Marathon).settings.question_count,
            Some(20)
        );
        assert!(mode_config(GameMode::Multiplayer).settings.multiplayer);
    }

    #[test]
    fn test_from_name_lenient() {
        assert_eq!(GameMode::from_name("expert"), GameMode::Expert);
        assert_eq!(GameMode::from_name("definitely-not-a-mode"), GameMode::Classic);
        assert_eq!(GameMode::from_name(""), GameMode::Classic);
    }

    #[test]
    fn test_expert_prompt_addendum() {
        let (system, _) = question_prompts(GameMode::Expert, None, 1);
        assert!(system.contains("Niveau EXPERT"));
    }

    #[test]
    fn test_marathon_progression() {
        let (early, _) = question_prompts(GameMode::Marathon, None, 5);
        assert!(!early.contains("Niveau AVANCÉ"));
        let (late, _) = question_prompts(GameMode::Marathon, None, 11);
        assert!(late.contains("Niveau AVANCÉ"));
    }

    #[test]
    fn test_challenge_category_focus() {
        let cat = find_category("Transport").unwrap();
        let (system, user) = question_prompts(GameMode::Challenge, Some(cat), 1);
        assert!(system.contains("Transport"));
        assert!(user.contains("électrique"));
    }

    #[test]
    fn test_default_user_prompt_without_category() {
        let (_, user) = question_prompts(GameMode::Classic, None, 1);
        assert_eq!(user, DEFAULT_USER_PROMPT);
    }

    #[test]
    fn test_verdict_prompt_embeds_inputs() {
        let p = verdict_prompt("La Terre est ronde", true);
        assert!(p.contains("La Terre est ronde"));
        assert!(p.contains("true"));
    }

    #[test]
    fn test_mode_serde_names() {
        assert_eq!(
            serde_json::to_string(&GameMode::Challenge).unwrap(),
            "\"challenge\""
        );
        let m: GameMode = serde_json::from_str("\"marathon\"").unwrap();
        assert_eq!(m, GameMode::Marathon);
    }
}
