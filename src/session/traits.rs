use crate::error::Result;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;

pub type SessionFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Highest like count the session API accepts in one call.
pub const MAX_LIKES_PER_CALL: u32 = 10;

/// Remote chat-session API, implemented for any OneBot-compatible endpoint.
///
/// Pure transport: implementations hold no run state and every call is
/// bounded by the implementation's own timeout.
pub trait SessionApi: Send + Sync {
    /// Human-readable endpoint label, used in logs
    fn endpoint(&self) -> &str;

    /// Raw `get_status` envelope (`data.online` tells whether the client is up)
    fn get_status(&self) -> SessionFuture<'_, Value>;

    /// Raw `get_login_info` envelope (`data.user_id`, `data.nickname`)
    fn get_login_info(&self) -> SessionFuture<'_, Value>;

    /// `data` array of the `get_friend_list` envelope
    fn get_friend_list(&self) -> SessionFuture<'_, Vec<Value>>;

    /// Likes `user_id`'s profile `times` times (clamped to `1..=10`).
    fn send_like<'a>(&'a self, user_id: &'a str, times: u32) -> SessionFuture<'a, ()>;
}

pub fn clamp_like_times(times: u32) -> u32 {
    times.clamp(1, MAX_LIKES_PER_CALL)
}
