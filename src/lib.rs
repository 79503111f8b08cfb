//! QUPAL, a thrift-shopping chat assistant.
//!
//! [`orchestrator::handle_turn`] resolves one chat turn from a local rule
//! table or a remote chat-completions model. The web server and the terminal
//! chat are thin front ends over it.

pub mod admin_client;
pub mod catalog;
pub mod chat;
pub mod constants;
pub mod key_store;
pub mod llm_interaction;
pub mod model;
pub mod orchestrator;
pub mod reply;
pub mod responder;
pub mod selection;
pub mod web_server;

pub use model::{ModelCaller, ModelError};
pub use orchestrator::handle_turn;
pub use reply::{Action, Reply, TurnError, TurnInput, TurnOutput};
pub use responder::resolve_locally;
pub use selection::resolve_selection;
