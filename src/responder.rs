//! Keyword rule responder used when the remote model is unavailable or
//! bypassed. Rules are tried in order against the lowercased message and
//! the first match answers.

use crate::catalog::{self, MODEL_INFO};
use crate::reply::Reply;

/// One entry of the rule table.
struct Rule {
    name: &'static str,
    matches: fn(&str) -> bool,
    respond: fn(&str) -> Reply,
}

// Order is observable behaviour: a greeting that names a model is still a greeting.
const RULES: [Rule; 7] = [
    Rule {
        name: "greeting",
        matches: is_greeting,
        respond: |_| Reply::plain(catalog::GREETING_REPLY),
    },
    Rule {
        name: "model_info",
        matches: |t| mentioned_model(t).is_some(),
        respond: |t| {
            let info = mentioned_model(t).map_or(catalog::FALLBACK_REPLY, |(_, info)| info);
            Reply::plain(info)
        },
    },
    Rule {
        name: "laptop",
        matches: |t| t.contains(catalog::LAPTOP_TOKEN),
        respond: |_| laptop_choices(),
    },
    Rule {
        name: "identify",
        matches: |t| contains_any(t, &catalog::IDENTIFY_KEYWORDS),
        respond: |_| Reply::plain(catalog::IDENTIFY_REPLY),
    },
    Rule {
        name: "value",
        matches: |t| contains_any(t, &catalog::VALUE_KEYWORDS),
        respond: |_| Reply::plain(catalog::VALUE_REPLY),
    },
    Rule {
        name: "tips",
        matches: |t| contains_any(t, &catalog::TIPS_KEYWORDS),
        respond: |_| Reply::plain(catalog::TIPS_REPLY),
    },
    Rule {
        name: "farewell",
        matches: |t| contains_any(t, &catalog::FAREWELL_KEYWORDS),
        respond: |_| Reply::plain(catalog::FAREWELL_REPLY),
    },
];

/// Answer a message from the rule table alone. Never fails.
pub fn resolve_locally(message: &str) -> Reply {
    let text = message.to_lowercase();
    match RULES.iter().find(|rule| (rule.matches)(&text)) {
        Some(rule) => {
            tracing::debug!(rule = rule.name, "Local rule matched");
            (rule.respond)(&text)
        }
        None => Reply::plain(catalog::FALLBACK_REPLY),
    }
}

/// Greeting keywords are matched as whole words so that e.g. "ThinkPad"
/// or "this" do not count as "hi".
pub fn is_greeting(message: &str) -> bool {
    message
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| {
            catalog::GREETING_KEYWORDS
                .iter()
                .any(|greeting| word.eq_ignore_ascii_case(greeting))
        })
}

/// The fixed choice list offered whenever laptops come up.
pub fn laptop_choices() -> Reply {
    Reply::Choices {
        text: catalog::LAPTOP_PROMPT.to_string(),
        choices: catalog::laptop_models(),
    }
}

/// Whether the message mentions the laptop topic token, in any case.
pub fn mentions_laptop(message: &str) -> bool {
    message.to_lowercase().contains(catalog::LAPTOP_TOKEN)
}

/// Case-insensitive substring test against a keyword set.
pub fn contains_any(text: &str, keywords: &[&str]) -> bool {
    let text = text.to_lowercase();
    keywords.iter().any(|k| text.contains(k))
}

// Expects `text` already lowercased.
fn mentioned_model(text: &str) -> Option<(&'static str, &'static str)> {
    MODEL_INFO
        .iter()
        .find(|(name, _)| text.contains(&name.to_lowercase()))
        .copied()
}
