use serde::{Serialize, Serializer};
use thiserror::Error;

/// What the user asked the assistant to do with this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    #[default]
    None,
    /// Pick one of the choices offered by a previous reply.
    Select,
}

impl Action {
    /// Wire form used by the web client. Anything but `"select"` is a plain message.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(a) if a.eq_ignore_ascii_case("select") => Action::Select,
            _ => Action::None,
        }
    }
}

/// Everything the orchestrator needs to resolve one turn.
#[derive(Debug, Clone, Default)]
pub struct TurnInput {
    pub message: String,
    pub action: Action,
    pub selection: Option<String>,
    pub local_override: bool,
    pub has_api_key: bool,
}

impl TurnInput {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn select(message: impl Into<String>, selection: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            action: Action::Select,
            selection: Some(selection.into()),
            ..Self::default()
        }
    }

    pub fn local(mut self, local_override: bool) -> Self {
        self.local_override = local_override;
        self
    }

    pub fn with_api_key(mut self, has_api_key: bool) -> Self {
        self.has_api_key = has_api_key;
        self
    }
}

/// A successful answer: either plain text or text plus a list of choices
/// the front end renders as buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Plain(String),
    Choices { text: String, choices: Vec<String> },
}

impl Reply {
    pub fn plain(text: impl Into<String>) -> Self {
        Reply::Plain(text.into())
    }

    pub fn text(&self) -> &str {
        match self {
            Reply::Plain(text) | Reply::Choices { text, .. } => text,
        }
    }

    pub fn choices(&self) -> Option<&[String]> {
        match self {
            Reply::Plain(_) => None,
            Reply::Choices { choices, .. } => Some(choices),
        }
    }
}

// `{"reply": ..}` or `{"reply": .., "choices": [..]}`
#[derive(Serialize)]
struct ReplyBody<'a> {
    reply: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    choices: Option<&'a [String]>,
}

impl Serialize for Reply {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ReplyBody {
            reply: self.text(),
            choices: self.choices(),
        }
        .serialize(serializer)
    }
}

/// Why a turn could not produce a reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnError {
    #[error("message must not be empty")]
    InvalidInput,
    #[error("remote model call failed: {0}")]
    RemoteCallFailed(String),
    #[error("no API key is configured for the remote model")]
    NoApiKey,
}

impl TurnError {
    /// Stable tag used in error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            TurnError::InvalidInput => "invalid_input",
            TurnError::RemoteCallFailed(_) => "remote_call_failed",
            TurnError::NoApiKey => "no_api_key",
        }
    }
}

/// Result of resolving one turn.
pub type TurnOutput = Result<Reply, TurnError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_reply_serializes_without_choices() {
        let value = serde_json::to_value(Reply::plain("hello")).unwrap();
        assert_eq!(value, json!({ "reply": "hello" }));
    }

    #[test]
    fn test_choice_reply_serializes_choices_in_order() {
        let reply = Reply::Choices {
            text: "pick".to_string(),
            choices: vec!["b".to_string(), "a".to_string()],
        };
        let value = serde_json::to_value(&reply).unwrap();
        assert_eq!(value, json!({ "reply": "pick", "choices": ["b", "a"] }));
    }

    #[test]
    fn test_action_parse() {
        assert_eq!(Action::parse(Some("select")), Action::Select);
        assert_eq!(Action::parse(Some(" Select ")), Action::Select);
        assert_eq!(Action::parse(Some("delete")), Action::None);
        assert_eq!(Action::parse(None), Action::None);
    }

    #[test]
    fn test_turn_error_kinds() {
        assert_eq!(TurnError::InvalidInput.kind(), "invalid_input");
        assert_eq!(TurnError::RemoteCallFailed("x".into()).kind(), "remote_call_failed");
        assert_eq!(TurnError::NoApiKey.kind(), "no_api_key");
        assert_eq!(
            TurnError::RemoteCallFailed("timed out".into()).to_string(),
            "remote model call failed: timed out"
        );
    }
}
