mod bot;
mod core;
mod manager;
mod session;
mod watchdog;

pub use bot::{AdminConfig, BotConfig};
pub use core::{Config, ReliabilityConfig, parse_bool};
pub use manager::{FleetMember, ManagerConfig};
pub use session::SessionConfig;
pub use watchdog::{WatchItem, WatchdogConfig};
