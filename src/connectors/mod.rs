pub mod chart;
pub mod goapi;
pub mod messages;
pub mod telegram;
pub mod traits;
