pub mod config;
mod http_layers;
pub mod identifier_locks;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use http_layers::*;
pub use identifier_locks::IdentifierLocks;
#[allow(unused_imports)] // Used by main.rs
pub use server::run_server;
