pub mod auth;
pub mod cmdargs;
pub mod config;
pub mod crypto;
pub mod error;
pub mod http;
pub mod logging;
pub mod server_info;
