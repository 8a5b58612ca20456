use chrono::Local;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::RwLock;
use std::time::Instant;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Starting,
    Ok,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    pub updated_at: String,
    pub last_ok: Option<String>,
    pub last_error: Option<String>,
    pub restart_count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    pub pid: u32,
    pub updated_at: String,
    pub uptime_seconds: u64,
    pub components: BTreeMap<String, ComponentHealth>,
}

/// Liveness of the long-running components of one process (scheduler,
/// gateway, watchdog...). Shared by `Arc` and served at `GET /health`.
#[derive(Debug)]
pub struct HealthRegistry {
    started_at: Instant,
    components: RwLock<BTreeMap<String, ComponentHealth>>,
}

fn now_string() -> String {
    Local::now().to_rfc3339()
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            components: RwLock::new(BTreeMap::new()),
        }
    }

    fn upsert<F>(&self, component: &str, update: F)
    where
        F: FnOnce(&mut ComponentHealth),
    {
        if let Ok(mut map) = self.components.write() {
            let now = now_string();
            let entry = map
                .entry(component.to_string())
                .or_insert_with(|| ComponentHealth {
                    status: ComponentStatus::Starting,
                    updated_at: now.clone(),
                    last_ok: None,
                    last_error: None,
                    restart_count: 0,
                });
            update(entry);
            entry.updated_at = now;
        }
    }

    pub fn mark_ok(&self, component: &str) {
        self.upsert(component, |entry| {
            entry.status = ComponentStatus::Ok;
            entry.last_ok = Some(now_string());
            entry.last_error = None;
        });
    }

    pub fn mark_error(&self, component: &str, error: impl ToString) {
        let err = error.to_string();
        self.upsert(component, move |entry| {
            entry.status = ComponentStatus::Error;
            entry.last_error = Some(err);
        });
    }

    pub fn bump_restart(&self, component: &str) {
        self.upsert(component, |entry| {
            entry.restart_count = entry.restart_count.saturating_add(1);
        });
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        let components = self
            .components
            .read()
            .map_or_else(|_| BTreeMap::new(), |map| map.clone());

        HealthSnapshot {
            pid: std::process::id(),
            updated_at: now_string(),
            uptime_seconds: self.started_at.elapsed().as_secs(),
            components,
        }
    }

    pub fn snapshot_json(&self) -> serde_json::Value {
        serde_json::to_value(self.snapshot()).unwrap_or_else(|_| {
            serde_json::json!({
                "status": "error",
                "message": "failed to serialize health snapshot"
            })
        })
    }
}

impl Default for HealthRegistry {
    fn default() -> Self {
        Self::new()
    }
}
