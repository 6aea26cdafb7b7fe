pub mod engine;
pub mod scheduler;
