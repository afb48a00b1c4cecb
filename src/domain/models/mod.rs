mod batch;
mod chat;
mod history;
mod message;
mod scenario;
mod session;

pub use batch::*;
pub use chat::*;
pub use history::*;
pub use message::*;
pub use scenario::*;
pub use session::*;
