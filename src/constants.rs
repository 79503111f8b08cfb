// Runtime defaults, loaded from the environment (and `.env`) on first use.

use std::env;

lazy_static::lazy_static! {
    pub static ref OPENAI_API_URL: String = env::var("OPENAI_API_URL").unwrap_or_else(|_| "https://api.openai.com/v1/chat/completions".to_string());
    pub static ref QUPAL_MODEL: String = env::var("QUPAL_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string());
    pub static ref QUPAL_MAX_TOKENS: u32 = env::var("QUPAL_MAX_TOKENS").ok().and_then(|v| v.parse().ok()).unwrap_or(250);
    pub static ref QUPAL_REQUEST_TIMEOUT_SECS: u64 = env::var("QUPAL_REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(30);
    // Seeds the server's key store; rotated at runtime through the admin routes.
    pub static ref OPENAI_API_KEY: Option<String> = env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty());
    // Admin routes are disabled when this is unset.
    pub static ref QUPAL_ADMIN_TOKEN: Option<String> = env::var("QUPAL_ADMIN_TOKEN").ok().filter(|t| !t.is_empty());
    pub static ref QUPAL_TEMPLATES_DIR: String = env::var("QUPAL_TEMPLATES_DIR").unwrap_or_else(|_| "templates".to_string());
    pub static ref QUPAL_STATIC_DIR: String = env::var("QUPAL_STATIC_DIR").unwrap_or_else(|_| "static".to_string());
}

/// Header carrying the admin token on `/api/admin/*` requests.
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// First assistant message shown by every front end.
pub const WELCOME_MESSAGE: &str = "Hello! I'm QUPAL, your thrift shopping AI assistant. I can help you find amazing second-hand treasures, identify vintage items, estimate values, and give tips on thrifting. What are you looking for today?";
