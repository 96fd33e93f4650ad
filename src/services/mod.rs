pub mod ai;
pub mod appointment;
pub mod classifier;
pub mod conversation;
pub mod sentiment;
pub mod templates;
