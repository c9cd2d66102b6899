//! Database schema and storage keys

/// SQL schema for initialization
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

/// Key of the serialized conversation collection
pub const CONVERSATIONS_KEY: &str = "conversations";

/// Key of the next conversation id to hand out
pub const ID_WATERMARK_KEY: &str = "conversation_id_watermark";
