use chrono::{DateTime, Local, NaiveDateTime, SubsecRound};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Mutable run state of one instance, mirrored 1:1 in the state file and
/// in `GET /api/state`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunState {
    /// Gates the daily schedule only; manual runs ignore it
    pub schedule_enabled: bool,
    /// `"scheduled"` or `"manual"`
    #[serde(rename = "last_action", alias = "last_action_reason")]
    pub last_action_reason: String,
    #[serde(
        serialize_with = "serialize_timestamp",
        deserialize_with = "deserialize_timestamp"
    )]
    pub last_action_at: Option<NaiveDateTime>,
    /// `None` until the first attempt
    pub last_action_ok: Option<bool>,
    pub last_action_detail: String,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            schedule_enabled: true,
            last_action_reason: String::new(),
            last_action_at: None,
            last_action_ok: None,
            last_action_detail: String::new(),
        }
    }
}

impl RunState {
    pub fn with_schedule_enabled(schedule_enabled: bool) -> Self {
        Self {
            schedule_enabled,
            ..Self::default()
        }
    }

    pub(super) fn apply_action(&mut self, action: ActionRecord) {
        self.last_action_reason = action.reason;
        self.last_action_at = Some(action.at);
        self.last_action_ok = Some(action.ok);
        self.last_action_detail = action.detail;
    }
}

/// Outcome of one execution attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRecord {
    pub reason: String,
    pub at: NaiveDateTime,
    pub ok: bool,
    pub detail: String,
}

impl ActionRecord {
    /// Stamped with the local wall clock, truncated to whole seconds (the
    /// resolution of the persisted form).
    pub fn now(reason: impl Into<String>, ok: bool, detail: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            at: local_now(),
            ok,
            detail: detail.into(),
        }
    }
}

/// Local wall clock at the persisted resolution.
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}

#[allow(clippy::ref_option)]
fn serialize_timestamp<S: Serializer>(
    value: &Option<NaiveDateTime>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(at) => serializer.collect_str(&at.format(TIMESTAMP_FORMAT)),
        None => serializer.serialize_str(""),
    }
}

fn deserialize_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<NaiveDateTime>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    parse_timestamp(raw.as_deref().unwrap_or_default()).map_err(serde::de::Error::custom)
}

/// Empty means "never"; accepts `YYYY-MM-DD HH:MM:SS` and RFC 3339.
pub fn parse_timestamp(raw: &str) -> Result<Option<NaiveDateTime>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    if let Ok(at) = NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT) {
        return Ok(Some(at));
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|at| Some(at.with_timezone(&Local).naive_local().trunc_subsecs(0)))
        .map_err(|_| format!("unrecognized timestamp {raw:?}"))
}

/// Problems found while decoding a persisted state document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadDiagnostics(Vec<String>);

impl LoadDiagnostics {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    fn push(&mut self, problem: String) {
        self.0.push(problem);
    }
}

/// Decodes a persisted document field by field over `defaults`.
///
/// Unknown keys are dropped, missing keys keep their default, and a key
/// whose value has the wrong type keeps its default and adds a diagnostic.
/// Content that is not a JSON object yields the defaults plus one
/// diagnostic.
pub fn decode_persisted(raw: &str, defaults: &RunState) -> (RunState, LoadDiagnostics) {
    let mut diagnostics = LoadDiagnostics::default();
    let mut state = defaults.clone();

    let map = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            diagnostics.push("state file is not a JSON object".into());
            return (state, diagnostics);
        }
        Err(e) => {
            diagnostics.push(format!("state file is not valid JSON: {e}"));
            return (state, diagnostics);
        }
    };

    if let Some(enabled) = field::<bool>(&map, "schedule_enabled", &mut diagnostics) {
        state.schedule_enabled = enabled;
    }
    let reason = field::<String>(&map, "last_action", &mut diagnostics)
        .or_else(|| field::<String>(&map, "last_action_reason", &mut diagnostics));
    if let Some(reason) = reason {
        state.last_action_reason = reason;
    }
    if let Some(raw_at) = field::<Option<String>>(&map, "last_action_at", &mut diagnostics) {
        match parse_timestamp(raw_at.as_deref().unwrap_or_default()) {
            Ok(at) => state.last_action_at = at,
            Err(problem) => diagnostics.push(format!("last_action_at: {problem}")),
        }
    }
    if let Some(ok) = field::<Option<bool>>(&map, "last_action_ok", &mut diagnostics) {
        state.last_action_ok = ok;
    }
    if let Some(detail) = field::<String>(&map, "last_action_detail", &mut diagnostics) {
        state.last_action_detail = detail;
    }

    (state, diagnostics)
}

fn field<T: DeserializeOwned>(
    map: &Map<String, Value>,
    key: &str,
    diagnostics: &mut LoadDiagnostics,
) -> Option<T> {
    let value = map.get(key)?;
    match serde_json::from_value::<T>(value.clone()) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            diagnostics.push(format!("{key}: {e}"));
            None
        }
    }
}
