pub mod config;
pub mod constants;
pub mod logging;
pub mod services;
pub mod srs;
pub mod store;
