/// SQL DDL for the quote log. Idempotent; runs once at startup.
pub const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS quotes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    captured_at TEXT NOT NULL,
    bid TEXT NOT NULL
);
"#;

pub const PRAGMAS: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
"#;

pub const INSERT_QUOTE: &str = "INSERT INTO quotes (captured_at, bid) VALUES (?1, ?2)";
