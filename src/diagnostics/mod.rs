pub mod health;

pub use health::{ComponentHealth, ComponentStatus, HealthRegistry, HealthSnapshot};
