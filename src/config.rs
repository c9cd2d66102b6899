//! Runtime configuration and fixed product copy
//!
//! Everything tunable comes from the environment; see `Config::from_env`.

use std::path::PathBuf;
use std::time::Duration;

/// Seed turn of every new conversation
pub const GREETING: &str = "**Chào bạn!** 🌴
Mình là chatbot du lịch Bình Định, rất vui được gặp bạn! Mình ở đây để:
- **Giới thiệu địa điểm**: Hỏi mình về Quy Nhơn, Eo Gió, hay bất kỳ nơi nào ở Bình Định nhé!
- **Gợi ý hoạt động**: Muốn biết đi đâu, ăn gì, chơi gì? Mình sẽ giúp!
Bạn muốn khám phá điều gì hôm nay? 😊";

/// Shown when the assistant could not be reached at all
pub const GENERIC_ERROR_MESSAGE: &str = "Có lỗi xảy ra khi gửi câu hỏi!";

/// Prefix of the toast shown after a model switch; the model name follows
pub const MODEL_CHANGED_NOTICE: &str = "Đã đổi model thành";

pub const MODEL_CHANGE_FAILED: &str = "Đổi model thất bại!";

/// Models offered for selection, default first
pub const MODELS: &[&str] = &["openai/gpt-4.1", "openai/gpt-4o", "openai/gpt-4o-mini"];

/// A one-click preset question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickQuery {
    pub label: &'static str,
    pub query: &'static str,
}

pub const QUICK_QUERIES: &[QuickQuery] = &[
    QuickQuery {
        label: "Địa điểm 🏕️",
        query: "Địa điểm vui chơi",
    },
    QuickQuery {
        label: "Lễ hội 🥁",
        query: "Lễ hội truyền thống tại Bình Định",
    },
    QuickQuery {
        label: "Ăn uống 🍜",
        query: "Món ngon",
    },
    QuickQuery {
        label: "Chỗ ở 💤",
        query: "Khách sạn",
    },
    QuickQuery {
        label: "Thư giãn ⛱️",
        query: "Địa điểm thư giãn",
    },
];

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_SERVER_URL: &str = "http://localhost:8080";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Settings for the remote assistant endpoint
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Base URL; `/chat` and `/set_model` are appended
    pub server_url: String,
    pub request_timeout: Duration,
    pub default_model: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            default_model: MODELS[0].to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub port: u16,
    pub assistant: AssistantConfig,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source (tests pass a map)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let db_path = lookup("CHATBOOK_DB_PATH").map_or_else(
            || {
                let home = lookup("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(format!("{home}/.chatbook/chatbook.db"))
            },
            PathBuf::from,
        );

        let port = lookup("CHATBOOK_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let defaults = AssistantConfig::default();
        let assistant = AssistantConfig {
            server_url: lookup("CHATBOOK_SERVER_URL")
                .map_or(defaults.server_url, |url| {
                    url.trim_end_matches('/').to_string()
                }),
            request_timeout: lookup("CHATBOOK_REQUEST_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .map_or(defaults.request_timeout, Duration::from_secs),
            default_model: lookup("CHATBOOK_DEFAULT_MODEL").unwrap_or(defaults.default_model),
        };

        Self {
            db_path,
            port,
            assistant,
        }
    }
}
