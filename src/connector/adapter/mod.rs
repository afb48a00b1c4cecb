mod in_memory_scenario_repository;
mod mock_backend;
mod ollama_backend;
mod system_clock;

pub use in_memory_scenario_repository::*;
pub use mock_backend::*;
pub use ollama_backend::*;
pub use system_clock::*;
