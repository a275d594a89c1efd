pub mod constants;
pub mod engine;
pub mod server_protocol;
pub mod server_utils;
pub mod session;
pub mod stats_store;
pub mod ticker;
pub mod types;
pub mod world;
