pub mod auth;
pub mod fleet;
pub mod gateway;
pub mod http;
