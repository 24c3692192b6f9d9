pub mod distribution;
pub mod list_manager;
