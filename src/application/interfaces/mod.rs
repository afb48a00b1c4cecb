mod clock;
mod inference_backend;
mod scenario_repository;

pub use clock::*;
pub use inference_backend::*;
pub use scenario_repository::*;
