//! Resolves a single chat turn: shortcuts first, then either the local rule
//! table or the remote model with a topic filter on its answer.

use tracing::{debug, info, instrument, warn};

use crate::catalog;
use crate::model::{ModelCaller, ModelError};
use crate::reply::{Action, Reply, TurnError, TurnInput, TurnOutput};
use crate::responder::{self, contains_any};
use crate::selection::resolve_selection;

#[instrument(
    skip_all,
    fields(action = ?input.action, local = input.local_override, has_key = input.has_api_key)
)]
pub async fn handle_turn(input: &TurnInput, model: &dyn ModelCaller) -> TurnOutput {
    let message = input.message.trim();
    if message.is_empty() {
        return Err(TurnError::InvalidInput);
    }

    let selecting = input.action == Action::Select;

    if selecting {
        if let Some(selection) = input.selection.as_deref() {
            debug!(selection, "Resolving selection");
            return Ok(resolve_selection(selection));
        }
    }

    if !selecting && responder::is_greeting(message) {
        debug!("Greeting shortcut");
        return Ok(Reply::plain(catalog::GREETING_REPLY));
    }

    if input.local_override || !input.has_api_key {
        debug!("Answering from local rules");
        return Ok(responder::resolve_locally(message));
    }

    match model.complete(catalog::SYSTEM_PROMPT, message).await {
        Ok(answer) => {
            let mut reply = Reply::plain(answer.trim());
            if !on_topic(reply.text(), message) {
                info!("Remote answer was off-topic, replacing with refusal");
                reply = Reply::plain(catalog::REFUSAL_REPLY);
            }
            if !selecting && responder::mentions_laptop(message) {
                reply = responder::laptop_choices();
            }
            Ok(reply)
        }
        // The key was cleared after this turn's snapshot was taken.
        Err(ModelError::MissingApiKey) => {
            warn!("Remote model reported no API key");
            if selecting {
                Ok(resolve_selection(input.selection.as_deref().unwrap_or(message)))
            } else {
                Err(TurnError::NoApiKey)
            }
        }
        Err(e) => {
            warn!(error = %e, "Remote model call failed");
            Err(TurnError::RemoteCallFailed(e.to_string()))
        }
    }
}

/// Either side of the exchange has to mention something thrift-related.
fn on_topic(answer: &str, message: &str) -> bool {
    contains_any(answer, &catalog::THRIFT_KEYWORDS)
        || contains_any(message, &catalog::THRIFT_KEYWORDS)
}
