// Quiz category table and rotation.
//
// Rotation state is owned by the app state and injected where needed,
// instead of living in module-level globals.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Serialize)]
pub struct QuizCategory {
    pub name: &'static str,
    pub icon: &'static str,
    pub subjects: &'static [&'static str],
    pub prompts: &'static [&'static str],
}

pub const QUIZ_CATEGORIES: &[QuizCategory] = &[
    QuizCategory {
        name: "Changement Climatique",
        icon: "🌡️",
        subjects: &[
            "réchauffement",
            "CO2",
            "effet de serre",
            "températures",
            "glaciers",
            "niveau des mers",
        ],
        prompts: &[
            "Génère une affirmation sur le réchauffement climatique avec des données chiffrées précises",
            "Crée une question sur les conséquences du changement climatique",
            "Pose une question sur les causes des émissions de gaz à effet de serre",
        ],
    },
    QuizCategory {
        name: "Biodiversité",
        icon: "🦋",
        subjects: &[
            "espèces menacées",
            "extinction",
            "écosystèmes",
            "faune",
            "flore",
            "habitats",
        ],
        prompts: &[
            "Génère une question sur les espèces en voie de disparition",
            "Crée une affirmation sur la biodiversité et les écosystèmes",
            "Pose une question sur la protection des habitats naturels",
        ],
    },
    QuizCategory {
        name: "Énergies",
        icon: "⚡",
        subjects: &[
            "renouvelables",
            "fossiles",
            "éolien",
            "solaire",
            "nucléaire",
            "consommation",
        ],
        prompts: &[
            "Génère une question comparative entre énergies renouvelables et fossiles",
            "Crée une affirmation sur l'efficacité des panneaux solaires ou éoliennes",
            "Pose une question sur la consommation énergétique mondiale",
        ],
    },
    QuizCategory {
        name: "Pollution",
        icon: "🏭",
        subjects: &["plastique", "air", "eau", "sols", "déchets", "microplastiques"],
        prompts: &[
            "Génère une question sur la pollution plastique dans les océans",
            "Crée une affirmation sur la qualité de l'air en ville",
            "Pose une question sur les microplastiques et leur impact",
        ],
    },
    QuizCategory {
        name: "Océans",
        icon: "🌊",
        subjects: &[
            "acidification",
            "coraux",
            "pêche",
            "niveau",
            "courants",
            "vie marine",
        ],
        prompts: &[
            "Génère une question sur l'acidification des océans",
            "Crée une affirmation sur les récifs coralliens",
            "Pose une question sur la surpêche et ses conséquences",
        ],
    },
    QuizCategory {
        name: "Forêts",
        icon: "🌳",
        subjects: &[
            "déforestation",
            "Amazon",
            "reforestation",
            "bois",
            "papier",
            "carbone",
        ],
        prompts: &[
            "Génère une question sur la déforestation en Amazonie ou ailleurs",
            "Crée une affirmation sur le rôle des forêts dans le climat",
            "Pose une question sur la reforestation et ses bénéfices",
        ],
    },
    QuizCategory {
        name: "Agriculture",
        icon: "🌾",
        subjects: &["bio", "pesticides", "élevage", "végétarien", "eau", "sols"],
        prompts: &[
            "Génère une question sur l'agriculture biologique vs conventionnelle",
            "Crée une affirmation sur l'impact de l'élevage sur l'environnement",
            "Pose une question sur l'usage de l'eau en agriculture",
        ],
    },
    QuizCategory {
        name: "Transport",
        icon: "🚗",
        subjects: &[
            "électrique",
            "avion",
            "train",
            "vélo",
            "carburants",
            "mobilité",
        ],
        prompts: &[
            "Génère une question sur les véhicules électriques vs thermiques",
            "Crée une affirmation sur l'impact carbone des transports",
            "Pose une question sur les alternatives de mobilité durable",
        ],
    },
    QuizCategory {
        name: "Déchets",
        icon: "♻️",
        subjects: &[
            "recyclage",
            "compost",
            "incinération",
            "tri",
            "réduction",
            "économie circulaire",
        ],
        prompts: &[
            "Génère une question sur l'efficacité du recyclage",
            "Crée une affirmation sur la réduction des déchets",
            "Pose une question sur le compostage et ses bénéfices",
        ],
    },
    QuizCategory {
        name: "Innovations",
        icon: "🔬",
        subjects: &[
            "technologies vertes",
            "captage CO2",
            "hydrogène",
            "batteries",
            "smart cities",
        ],
        prompts: &[
            "Génère une question sur les nouvelles technologies écologiques",
            "Crée une affirmation sur l'hydrogène vert ou les batteries",
            "Pose une question sur les innovations pour capturer le CO2",
        ],
    },
];

/// Look up a category by its display name.
pub fn find_category(name: &str) -> Option<&'static QuizCategory> {
    QUIZ_CATEGORIES.iter().find(|c| c.name == name)
}

/// Pick a random prompt from a category.
pub fn random_prompt(category: &QuizCategory, rng: &mut impl Rng) -> &'static str {
    category
        .prompts
        .choose(rng)
        .copied()
        .unwrap_or("Génère une question écologique intéressante.")
}

/// Category rotation: no category repeats until all have been used.
#[derive(Debug, Default)]
pub struct CategoryRotation {
    recently_used: HashSet<usize>,
    history: Vec<usize>,
}

impl CategoryRotation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the next category, avoiding recent repeats.
    pub fn next(&mut self, rng: &mut impl Rng) -> &'static QuizCategory {
        if self.recently_used.len() >= QUIZ_CATEGORIES.len() {
            self.recently_used.clear();
        }

        let available: Vec<usize> = (0..QUIZ_CATEGORIES.len())
            .filter(|i| !self.recently_used.contains(i))
            .collect();
        let selected = *available
            .choose(rng)
            .expect("at least one category is always available");

        self.recently_used.insert(selected);
        self.history.push(selected);
        if self.history.len() > 5 {
            let overflow = self.history.len() - 5;
            self.history.drain(..overflow);
        }

        &QUIZ_CATEGORIES[selected]
    }

    /// Names of the most recently served categories, oldest first.
    pub fn recent(&self) -> Vec<&'static str> {
        self.history
            .iter()
            .map(|&i| QUIZ_CATEGORIES[i].name)
            .collect()
    }
}
