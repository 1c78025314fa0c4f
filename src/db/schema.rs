pub const SCHEMA: &str = r#"
-- profiles table (mirrors externally-authenticated identities)
CREATE TABLE IF NOT EXISTS profiles (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL,
    name TEXT,
    avatar_url TEXT,
    role TEXT NOT NULL DEFAULT 'user',
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- problems table
CREATE TABLE IF NOT EXISTS problems (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    question_blocks TEXT NOT NULL,
    answer_blocks TEXT NOT NULL,
    background_video_url TEXT,
    background_music_url TEXT,
    effect TEXT NOT NULL DEFAULT 'none',
    is_published INTEGER NOT NULL DEFAULT 0,
    created_by TEXT REFERENCES profiles(id) ON DELETE SET NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_problems_is_published ON problems(is_published);
CREATE INDEX IF NOT EXISTS idx_problems_created_at ON problems(created_at DESC);

-- interactions table: one row per (user, problem), created lazily when the
-- problem is first served
CREATE TABLE IF NOT EXISTS interactions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    visible_id TEXT NOT NULL UNIQUE,
    user_id TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    problem_id INTEGER NOT NULL REFERENCES problems(id) ON DELETE CASCADE,
    reaction TEXT,
    solved INTEGER NOT NULL DEFAULT 0,
    started_at TEXT NOT NULL DEFAULT (datetime('now')),
    solved_at TEXT,
    time_spent_seconds INTEGER NOT NULL DEFAULT 0,
    UNIQUE(user_id, problem_id)
);

CREATE INDEX IF NOT EXISTS idx_interactions_user_id ON interactions(user_id);
CREATE INDEX IF NOT EXISTS idx_interactions_problem_id ON interactions(problem_id);
CREATE INDEX IF NOT EXISTS idx_interactions_visible_id ON interactions(visible_id);

-- daily_stats table: per (user, date) counters, maintained incrementally
CREATE TABLE IF NOT EXISTS daily_stats (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    date TEXT NOT NULL,
    problems_attempted INTEGER NOT NULL DEFAULT 0,
    problems_solved INTEGER NOT NULL DEFAULT 0,
    streak INTEGER NOT NULL DEFAULT 0,
    UNIQUE(user_id, date)
);

CREATE INDEX IF NOT EXISTS idx_daily_stats_user_date ON daily_stats(user_id, date);

-- shares table: immutable outcome snapshots for share links
CREATE TABLE IF NOT EXISTS shares (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    share_code TEXT NOT NULL UNIQUE,
    interaction_id INTEGER NOT NULL REFERENCES interactions(id) ON DELETE CASCADE,
    status TEXT NOT NULL,
    share_message TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_shares_interaction_id ON shares(interaction_id);
"#;
