pub mod schema;

pub use schema::{
    AdminConfig, BotConfig, Config, FleetMember, ManagerConfig, ReliabilityConfig, SessionConfig,
    WatchItem, WatchdogConfig, parse_bool,
};
