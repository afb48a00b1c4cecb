mod batch_chat;
mod inference_client;
mod manage_scenarios;
mod session_store;

pub use batch_chat::*;
pub use inference_client::*;
pub use manage_scenarios::*;
pub use session_store::*;
