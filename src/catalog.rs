//! Fixed vocabulary shared by the local responder, the selection resolver
//! and the topic filter. Front ends match on these strings, so they must
//! not change without updating every client.

/// Laptop models offered as choices, in display order, with the canned
/// second-hand buying notes for each.
pub const MODEL_INFO: [(&str, &str); 4] = [
    (
        "MacBook Air",
        "MacBook Air: lightweight and long battery life. When buying second-hand, check the battery cycle count, make sure Activation Lock is off, and look for keyboard wear and dents on the corners.",
    ),
    (
        "Dell XPS 13",
        "Dell XPS 13: compact with a sharp display. Used units are common from business refreshes; check for screen bleed, test the trackpad, and confirm the charger is genuine.",
    ),
    (
        "Lenovo ThinkPad X1 Carbon",
        "Lenovo ThinkPad X1 Carbon: durable and great keyboard. Off-lease units are a thrift favourite; verify the BIOS has no supervisor password and check the hinges for looseness.",
    ),
    (
        "HP Spectre x360",
        "HP Spectre x360: convertible 2-in-1 with a premium build. Inspect the hinge through its full range, test the touchscreen and pen, and look for battery swelling under the palm rest.",
    ),
];

/// Topic token that triggers the laptop choice list.
pub const LAPTOP_TOKEN: &str = "laptop";

pub const LAPTOP_PROMPT: &str =
    "Here are some popular laptop models you can often find second-hand. Pick one to learn more:";

pub const GREETING_KEYWORDS: [&str; 3] = ["hello", "hi", "hey"];
pub const GREETING_REPLY: &str = "Hi there! What kind of thrift item are you looking for?";

pub const IDENTIFY_KEYWORDS: [&str; 3] = ["vintage", "identify", "what is this"];
pub const IDENTIFY_REPLY: &str = "Tell me a bit about the item's markings, materials, and any labels. I can help identify it.";

pub const VALUE_KEYWORDS: [&str; 3] = ["value", "estimate", "worth"];
pub const VALUE_REPLY: &str =
    "I can give a rough estimate if you tell me the brand, condition, and approximate age.";

pub const TIPS_KEYWORDS: [&str; 2] = ["tips", "thrift"];
pub const TIPS_REPLY: &str = "Look for solid construction, classic brands, and minimal staining. Always inspect seams and zippers.";

pub const FAREWELL_KEYWORDS: [&str; 2] = ["bye", "thanks"];
pub const FAREWELL_REPLY: &str = "You're welcome, happy thrifting!";

pub const FALLBACK_REPLY: &str =
    "I don't have an exact answer for that, but I can help if you give more details.";

pub const NO_DETAILS_REPLY: &str = "Sorry, I don't have details for that model yet.";

/// Replaces remote answers that wander off the thrift domain.
pub const REFUSAL_REPLY: &str = "I can only assist with thrift-related questions. Ask me about finding second-hand items, identifying vintage pieces, estimating values, or thrifting tips.";

/// System instruction sent with every remote model call.
pub const SYSTEM_PROMPT: &str = "You are QUPAL, a helpful thrift-shopping assistant. Only answer questions about thrift shopping, second-hand and vintage items, identifying items, estimating resale value, and thrifting tips. If a question is unrelated, politely decline. Reply concisely.";

/// A remote answer passes the topic filter if it, or the user's message,
/// mentions one of these.
pub const THRIFT_KEYWORDS: [&str; 24] = [
    "thrift",
    "second-hand",
    "secondhand",
    "second hand",
    "pre-loved",
    "pre-owned",
    "preowned",
    "vintage",
    "antique",
    "resale",
    "resell",
    "consign",
    "flea market",
    "garage sale",
    "yard sale",
    "estate sale",
    "goodwill",
    "bargain",
    "value",
    "worth",
    "price",
    "condition",
    "laptop",
    "clothing",
];

/// Names of the selectable laptop models, in display order.
pub fn laptop_models() -> Vec<String> {
    MODEL_INFO.iter().map(|(name, _)| name.to_string()).collect()
}

/// Exact, case-sensitive lookup of a model's canned description.
pub fn model_info(name: &str) -> Option<&'static str> {
    MODEL_INFO
        .iter()
        .find(|(model, _)| *model == name)
        .map(|(_, info)| *info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_laptop_models_order() {
        assert_eq!(
            laptop_models(),
            vec![
                "MacBook Air",
                "Dell XPS 13",
                "Lenovo ThinkPad X1 Carbon",
                "HP Spectre x360"
            ]
        );
    }

    #[test]
    fn test_model_info_is_case_sensitive() {
        assert!(model_info("Dell XPS 13").is_some());
        assert!(model_info("dell xps 13").is_none());
    }

    #[test]
    fn test_refusal_prefix() {
        assert!(REFUSAL_REPLY.starts_with("I can only assist with thrift-related questions"));
    }
}
