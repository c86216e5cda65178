pub mod api;
pub mod catalog;
pub mod config;
pub mod heartbeat;
pub mod logging;
pub mod orchestrator;
pub mod probe;
pub mod retry;
pub mod session;
