mod env_overrides;
mod loader;
mod types;

pub use env_overrides::parse_bool;
pub use types::{Config, ReliabilityConfig};
