pub mod batch_controller;
pub mod chat_controller;
pub mod models_controller;
pub mod scenario_controller;
pub mod status_controller;

pub use batch_controller::{report_json, BatchController};
pub use chat_controller::ChatController;
pub use models_controller::ModelsController;
pub use scenario_controller::ScenarioController;
pub use status_controller::StatusController;
