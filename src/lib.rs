// Library surface for the engine, persistence and event plumbing.
// The terminal app itself lives in main.rs.
pub mod app_dirs;
pub mod config;
pub mod history;
pub mod logging;
pub mod quote;
pub mod runtime;
pub mod sentence;
pub mod session;
pub mod share;
pub mod store;
pub mod timer;
pub mod typing_policy;
