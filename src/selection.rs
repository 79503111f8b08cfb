use crate::catalog;
use crate::reply::Reply;

/// Resolve a choice previously offered to the user. The identifier must be
/// one of the exact display names; anything else gets a polite fallback.
pub fn resolve_selection(selection_id: &str) -> Reply {
    match catalog::model_info(selection_id) {
        Some(info) => Reply::plain(info),
        None => {
            tracing::debug!(selection = selection_id, "No details for selection");
            Reply::plain(catalog::NO_DETAILS_REPLY)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_selection_is_stable() {
        let first = resolve_selection("MacBook Air");
        assert_eq!(first, resolve_selection("MacBook Air"));
        assert_eq!(first, Reply::plain(catalog::model_info("MacBook Air").unwrap()));
    }

    #[test]
    fn test_every_offered_choice_resolves() {
        for name in catalog::laptop_models() {
            assert_ne!(resolve_selection(&name), Reply::plain(catalog::NO_DETAILS_REPLY));
        }
    }

    #[test]
    fn test_unknown_selection_falls_back() {
        assert_eq!(
            resolve_selection("Unknown Model"),
            Reply::plain(catalog::NO_DETAILS_REPLY)
        );
        // exact match only
        assert_eq!(
            resolve_selection("macbook air"),
            Reply::plain(catalog::NO_DETAILS_REPLY)
        );
    }
}
