pub mod repository;
pub mod universe;

pub use repository::BarRepository;
pub use universe::UniverseResolver;
