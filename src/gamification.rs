// XP, levels, and badge conditions.

pub const XP_PER_LEVEL: i64 = 100;

/// Aggregate player stats used to evaluate badge conditions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameStats {
    pub score: i64,
    pub total_questions: i64,
    pub current_streak: i64,
    pub max_streak: i64,
    pub correct_answers: i64,
    pub level: i64,
    pub xp: i64,
}

pub fn calculate_level(xp: i64) -> i64 {
    xp / XP_PER_LEVEL + 1
}

pub fn xp_for_next_level(level: i64) -> i64 {
    level * XP_PER_LEVEL
}

/// Progress through the current level, as a percentage.
pub fn xp_progress(xp: i64) -> f64 {
    let current_level_xp = (calculate_level(xp) - 1) * XP_PER_LEVEL;
    (xp - current_level_xp) as f64 / XP_PER_LEVEL as f64 * 100.0
}

pub struct Badge {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub condition: fn(&GameStats) -> bool,
}

pub const BADGES: &[Badge] = &[
    Badge {
        id: "first-correct",
        name: "Premier Pas",
        description: "Première bonne réponse",
        icon: "🌱",
        condition: |stats| stats.correct_answers >= 1,
    },
    Badge {
        id: "streak-3",
        name: "En Forme",
        description: "3 bonnes réponses d'affilée",
        icon: "🔥",
        condition: |stats| stats.max_streak >= 3,
    },
    Badge {
        id: "streak-5",
        name: "Expert",
        description: "5 bonnes réponses d'affilée",
        icon: "⚡",
        condition: |stats| stats.max_streak >= 5,
    },
    Badge {
        id: "score-10",
        name: "Connaisseur",
        description: "10 bonnes réponses",
        icon: "🧠",
        condition: |stats| stats.correct_answers >= 10,
    },
    Badge {
        id: "perfectionist",
        name: "Perfectionniste",
        description: "100% de réussite sur 5+ questions",
        icon: "💎",
        condition: |stats| stats.total_questions >= 5 && stats.score == stats.total_questions,
    },
    Badge {
        id: "persistent",
        name: "Persévérant",
        description: "20 questions répondues",
        icon: "🏆",
        condition: |stats| stats.total_questions >= 20,
    },
    Badge {
        id: "eco-warrior",
        name: "Guerrier Vert",
        description: "Niveau 5 atteint",
        icon: "🌍",
        condition: |stats| stats.level >= 5,
    },
];

pub fn find_badge(id: &str) -> Option<&'static Badge> {
    BADGES.iter().find(|b| b.id == id)
}

/// All badges whose condition the given stats satisfy.
pub fn earned_badges(stats: &GameStats) -> Vec<&'static Badge> {
    BADGES.iter().filter(|b| (b.condition)(stats)).collect()
}
