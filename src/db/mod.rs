// Database access layer (SQLite via sqlx): player profiles, per-mode
// and per-category statistics, sessions, and unlocked badges.

use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::gamification::{calculate_level, GameStats};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PlayerProfile {
    pub id: i64,
    pub name: String,
    pub avatar: String,
    pub created_at: String,
    pub last_played_at: String,
    pub total_score: i64,
    pub total_questions: i64,
    pub total_correct: i64,
    pub xp: i64,
    pub level: i64,
    pub current_streak: i64,
    pub max_streak: i64,
}

impl PlayerProfile {
    /// Snapshot of the stats used to evaluate badge conditions.
    pub fn stats(&self) -> GameStats {
        GameStats {
            score: self.total_score,
            total_questions: self.total_questions,
            current_streak: self.current_streak,
            max_streak: self.max_streak,
            correct_answers: self.total_correct,
            level: self.level,
            xp: self.xp,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ModeStats {
    pub profile_id: i64,
    pub mode: String,
    pub games_played: i64,
    pub total_score: i64,
    pub total_questions: i64,
    pub best_streak: i64,
    pub xp_gained: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CategoryStats {
    pub profile_id: i64,
    pub category: String,
    pub questions_answered: i64,
    pub correct_answers: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DifficultyStats {
    pub profile_id: i64,
    pub difficulty: String,
    pub questions_answered: i64,
    pub correct_answers: i64,
    pub xp_gained: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UnlockedBadge {
    pub profile_id: i64,
    pub badge_id: String,
    pub unlocked_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct GameSession {
    pub id: String,
    pub profile_id: i64,
    pub mode: String,
    pub played_at: String,
    pub score: i64,
    pub total_questions: i64,
    pub max_streak: i64,
    pub xp_gained: i64,
    pub duration_seconds: i64,
    /// JSON array of category names covered by the session.
    pub categories: String,
}

/// Number of sessions retained per profile.
const SESSION_HISTORY_LIMIT: i64 = 50;

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// In-memory database for tests. A single connection keeps every
    /// query on the same in-memory instance.
    pub async fn new_in_memory() -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS profiles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                avatar TEXT NOT NULL DEFAULT '🌱',
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                last_played_at TEXT NOT NULL DEFAULT (datetime('now')),
                total_score INTEGER NOT NULL DEFAULT 0,
                total_questions INTEGER NOT NULL DEFAULT 0,
                total_correct INTEGER NOT NULL DEFAULT 0,
                xp INTEGER NOT NULL DEFAULT 0,
                level INTEGER NOT NULL DEFAULT 1,
                current_streak INTEGER NOT NULL DEFAULT 0,
                max_streak INTEGER NOT NULL DEFAULT 0
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS mode_stats (
                profile_id INTEGER NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
                mode TEXT NOT NULL,
                games_played INTEGER NOT NULL DEFAULT 0,
                total_score INTEGER NOT NULL DEFAULT 0,
                total_questions INTEGER NOT NULL DEFAULT 0,
                best_streak INTEGER NOT NULL DEFAULT 0,
                xp_gained INTEGER NOT NULL DEFAULT 0,
                UNIQUE(profile_id, mode)
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS category_stats (
                profile_id INTEGER NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
                category TEXT NOT NULL,
                questions_answered INTEGER NOT NULL DEFAULT 0,
                correct_answers INTEGER NOT NULL DEFAULT 0,
                UNIQUE(profile_id, category)
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS difficulty_stats (
                profile_id INTEGER NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
                difficulty TEXT NOT NULL,
                questions_answered INTEGER NOT NULL DEFAULT 0,
                correct_answers INTEGER NOT NULL DEFAULT 0,
                xp_gained INTEGER NOT NULL DEFAULT 0,
                UNIQUE(profile_id, difficulty)
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS unlocked_badges (
                profile_id INTEGER NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
                badge_id TEXT NOT NULL,
                unlocked_at TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(profile_id, badge_id)
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                profile_id INTEGER NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
                mode TEXT NOT NULL,
                played_at TEXT NOT NULL DEFAULT (datetime('now')),
                score INTEGER NOT NULL DEFAULT 0,
                total_questions INTEGER NOT NULL DEFAULT 0,
                max_streak INTEGER NOT NULL DEFAULT 0,
                xp_gained INTEGER NOT NULL DEFAULT 0,
                duration_seconds INTEGER NOT NULL DEFAULT 0,
                categories TEXT NOT NULL DEFAULT '[]'
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ── Profile CRUD ──────────────────────────────────────────────────

    pub async fn create_profile(
        &self,
        name: &str,
        avatar: &str,
    ) -> Result<PlayerProfile, sqlx::Error> {
        let row = sqlx::query_as::<_, PlayerProfile>(
            "INSERT INTO profiles (name, avatar) VALUES (?, ?) RETURNING *",
        )
        .bind(name)
        .bind(avatar)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn list_profiles(&self) -> Result<Vec<PlayerProfile>, sqlx::Error> {
        let rows = sqlx::query_as::<_, PlayerProfile>("SELECT * FROM profiles ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn get_profile(&self, id: i64) -> Result<Option<PlayerProfile>, sqlx::Error> {
        let row = sqlx::query_as::<_, PlayerProfile>("SELECT * FROM profiles WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn update_profile(
        &self,
        id: i64,
        name: Option<&str>,
        avatar: Option<&str>,
    ) -> Result<Option<PlayerProfile>, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE profiles SET name = COALESCE(?, name), avatar = COALESCE(?, avatar) \
             WHERE id = ?",
        )
        .bind(name)
        .bind(avatar)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_profile(id).await
    }

    pub async fn delete_profile(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM profiles WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ── Answer recording ──────────────────────────────────────────────

    /// Record one answered question: global stats, streak, XP, level,
    /// and the per-category/per-difficulty breakdowns.
    pub async fn record_answer(
        &self,
        profile_id: i64,
        correct: bool,
        category: &str,
        difficulty: &str,
        xp_gained: i64,
    ) -> Result<Option<PlayerProfile>, sqlx::Error> {
        let profile = match self.get_profile(profile_id).await? {
            Some(p) => p,
            None => return Ok(None),
        };

        let new_streak = if correct {
            profile.current_streak + 1
        } else {
            0
        };
        let new_max_streak = profile.max_streak.max(new_streak);
        let new_xp = profile.xp + xp_gained;
        let new_level = calculate_level(new_xp);
        let score_delta: i64 = if correct { 1 } else { 0 };

        sqlx::query(
            "UPDATE profiles SET \
                total_score = total_score + ?, \
                total_questions = total_questions + 1, \
                total_correct = total_correct + ?, \
                xp = ?, level = ?, \
                current_streak = ?, max_streak = ?, \
                last_played_at = datetime('now') \
             WHERE id = ?",
        )
        .bind(score_delta)
        .bind(score_delta)
        .bind(new_xp)
        .bind(new_level)
        .bind(new_streak)
        .bind(new_max_streak)
        .bind(profile_id)
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "INSERT INTO category_stats (profile_id, category, questions_answered, correct_answers) \
             VALUES (?, ?, 1, ?) \
             ON CONFLICT(profile_id, category) DO UPDATE SET \
                questions_answered = questions_answered + 1, \
                correct_answers = correct_answers + excluded.correct_answers",
        )
        .bind(profile_id)
        .bind(category)
        .bind(score_delta)
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "INSERT INTO difficulty_stats \
                (profile_id, difficulty, questions_answered, correct_answers, xp_gained) \
             VALUES (?, ?, 1, ?, ?) \
             ON CONFLICT(profile_id, difficulty) DO UPDATE SET \
                questions_answered = questions_answered + 1, \
                correct_answers = correct_answers + excluded.correct_answers, \
                xp_gained = xp_gained + excluded.xp_gained",
        )
        .bind(profile_id)
        .bind(difficulty)
        .bind(score_delta)
        .bind(xp_gained)
        .execute(&self.pool)
        .await?;

        self.get_profile(profile_id).await
    }

    // ── Sessions ──────────────────────────────────────────────────────

    /// Record one completed game. Also folds the result into the
    /// per-mode stats and prunes session history past the cap.
    #[allow(clippy::too_many_arguments)]
    pub async fn record_session(
        &self,
        profile_id: i64,
        mode: &str,
        score: i64,
        total_questions: i64,
        max_streak: i64,
        xp_gained: i64,
        duration_seconds: i64,
        categories_json: &str,
    ) -> Result<Option<GameSession>, sqlx::Error> {
        if self.get_profile(profile_id).await?.is_none() {
            return Ok(None);
        }

        let session_id = uuid::Uuid::new_v4().to_string();
        // Sub-second timestamps keep the history ordered even when
        // several sessions land within the same second.
        let played_at = chrono::Utc::now().to_rfc3339();
        let session = sqlx::query_as::<_, GameSession>(
            "INSERT INTO sessions \
                (id, profile_id, mode, played_at, score, total_questions, max_streak, \
                 xp_gained, duration_seconds, categories) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(&session_id)
        .bind(profile_id)
        .bind(mode)
        .bind(&played_at)
        .bind(score)
        .bind(total_questions)
        .bind(max_streak)
        .bind(xp_gained)
        .bind(duration_seconds)
        .bind(categories_json)
        .fetch_one(&self.pool)
        .await?;

        sqlx::query(
            "INSERT INTO mode_stats \
                (profile_id, mode, games_played, total_score, total_questions, best_streak, \
                 xp_gained) \
             VALUES (?, ?, 1, ?, ?, ?, ?) \
             ON CONFLICT(profile_id, mode) DO UPDATE SET \
                games_played = games_played + 1, \
                total_score = total_score + excluded.total_score, \
                total_questions = total_questions + excluded.total_questions, \
                best_streak = MAX(best_streak, excluded.best_streak), \
                xp_gained = xp_gained + excluded.xp_gained",
        )
        .bind(profile_id)
        .bind(mode)
        .bind(score)
        .bind(total_questions)
        .bind(max_streak)
        .bind(xp_gained)
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "DELETE FROM sessions WHERE profile_id = ? AND id NOT IN \
                (SELECT id FROM sessions WHERE profile_id = ? \
                 ORDER BY played_at DESC, rowid DESC LIMIT ?)",
        )
        .bind(profile_id)
        .bind(profile_id)
        .bind(SESSION_HISTORY_LIMIT)
        .execute(&self.pool)
        .await?;

        sqlx::query("UPDATE profiles SET last_played_at = datetime('now') WHERE id = ?")
            .bind(profile_id)
            .execute(&self.pool)
            .await?;

        Ok(Some(session))
    }

    pub async fn recent_sessions(
        &self,
        profile_id: i64,
        limit: i64,
    ) -> Result<Vec<GameSession>, sqlx::Error> {
        let rows = sqlx::query_as::<_, GameSession>(
            "SELECT * FROM sessions WHERE profile_id = ? \
             ORDER BY played_at DESC, rowid DESC LIMIT ?",
        )
        .bind(profile_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // ── Stat breakdowns ───────────────────────────────────────────────

    pub async fn mode_stats(&self, profile_id: i64) -> Result<Vec<ModeStats>, sqlx::Error> {
        let rows = sqlx::query_as::<_, ModeStats>(
            "SELECT * FROM mode_stats WHERE profile_id = ? ORDER BY mode",
        )
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn category_stats(
        &self,
        profile_id: i64,
    ) -> Result<Vec<CategoryStats>, sqlx::Error> {
        let rows = sqlx::query_as::<_, CategoryStats>(
            "SELECT * FROM category_stats WHERE profile_id = ? ORDER BY category",
        )
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn difficulty_stats(
        &self,
        profile_id: i64,
    ) -> Result<Vec<DifficultyStats>, sqlx::Error> {
        let rows = sqlx::query_as::<_, DifficultyStats>(
            "SELECT * FROM difficulty_stats WHERE profile_id = ? ORDER BY difficulty",
        )
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // ── Badges ────────────────────────────────────────────────────────

    /// Unlock a badge for a profile. Returns true when newly unlocked.
    pub async fn unlock_badge(
        &self,
        profile_id: i64,
        badge_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO unlocked_badges (profile_id, badge_id) VALUES (?, ?)",
        )
        .bind(profile_id)
        .bind(badge_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_unlocked_badges(
        &self,
        profile_id: i64,
    ) -> Result<Vec<UnlockedBadge>, sqlx::Error> {
        let rows = sqlx::query_as::<_, UnlockedBadge>(
            "SELECT * FROM unlocked_badges WHERE profile_id = ? ORDER BY unlocked_at",
        )
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // ── Reset ─────────────────────────────────────────────────────────

    /// Zero out a profile's progress and drop its history.
    pub async fn reset_progress(&self, profile_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE profiles SET \
                total_score = 0, total_questions = 0, total_correct = 0, \
                xp = 0, level = 1, current_streak = 0, max_streak = 0 \
             WHERE id = ?",
        )
        .bind(profile_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        for table in ["mode_stats", "category_stats", "difficulty_stats", "unlocked_badges", "sessions"] {
            sqlx::query(&format!("DELETE FROM {table} WHERE profile_id = ?"))
                .bind(profile_id)
                .execute(&self.pool)
                .await?;
        }
        Ok(true)
    }
}
