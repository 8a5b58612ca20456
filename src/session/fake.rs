//! In-process `SessionApi` double for unit tests.

use super::traits::{SessionApi, SessionFuture, clamp_like_times};
use crate::error::LikeError;
use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Default)]
pub(crate) struct FakeSession {
    rejected: HashSet<String>,
    panics_on: Option<String>,
    logged_in: bool,
    gate: Option<Arc<Notify>>,
    entered: Arc<Notify>,
    calls: Mutex<Vec<(String, u32)>>,
}

impl FakeSession {
    pub(crate) fn new() -> Self {
        Self {
            logged_in: true,
            ..Self::default()
        }
    }

    pub(crate) fn rejecting(mut self, user_id: &str) -> Self {
        self.rejected.insert(user_id.to_string());
        self
    }

    pub(crate) fn panicking_on(mut self, user_id: &str) -> Self {
        self.panics_on = Some(user_id.to_string());
        self
    }

    pub(crate) fn logged_out(mut self) -> Self {
        self.logged_in = false;
        self
    }

    /// Every `send_like` parks until `gate` is notified.
    pub(crate) fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Notified each time a `send_like` call starts.
    pub(crate) fn entered(&self) -> Arc<Notify> {
        Arc::clone(&self.entered)
    }

    pub(crate) fn calls(&self) -> Vec<(String, u32)> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl SessionApi for FakeSession {
    fn endpoint(&self) -> &str {
        "fake"
    }

    fn get_status(&self) -> SessionFuture<'_, Value> {
        let online = self.logged_in;
        Box::pin(async move { Ok(json!({"status": "ok", "retcode": 0, "data": {"online": online}})) })
    }

    fn get_login_info(&self) -> SessionFuture<'_, Value> {
        let user_id = if self.logged_in { json!(424242) } else { json!(0) };
        Box::pin(async move {
            Ok(json!({"status": "ok", "retcode": 0, "data": {"user_id": user_id, "nickname": "fake"}}))
        })
    }

    fn get_friend_list(&self) -> SessionFuture<'_, Vec<Value>> {
        Box::pin(async move { Ok(vec![json!({"user_id": 10001, "nickname": "alice"})]) })
    }

    fn send_like<'a>(&'a self, user_id: &'a str, times: u32) -> SessionFuture<'a, ()> {
        Box::pin(async move {
            self.entered.notify_one();
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.calls
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push((user_id.to_string(), clamp_like_times(times)));

            if self.panics_on.as_deref() == Some(user_id) {
                panic!("session client blew up on {user_id}");
            }
            if self.rejected.contains(user_id) {
                return Err(LikeError::UpstreamRejected {
                    target: user_id.to_string(),
                    retcode: Some(1200),
                    message: "like limit reached".into(),
                });
            }
            Ok(())
        })
    }
}
