pub mod cron;
pub mod daemon;
pub mod state;
pub mod task;
pub mod watchdog;
