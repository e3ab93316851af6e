use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::labels::Signature;

/// Lifecycle state reported by Alertmanager
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SilenceState {
    Active,
    Pending,
    Expired,
    #[serde(other)]
    Unknown,
}

impl Display for SilenceState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SilenceState::Active => write!(f, "active"),
            SilenceState::Pending => write!(f, "pending"),
            SilenceState::Expired => write!(f, "expired"),
            SilenceState::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SilenceStatus {
    pub state: SilenceState,
}

/// Single label condition attached to a silence
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Matcher {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub is_regex: bool,
}

impl Matcher {
    /// Create an exact-match (non-regex) matcher
    pub fn exact(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            is_regex: false,
        }
    }
}

/// Alertmanager silence
///
/// The `id` is assigned by Alertmanager and is absent on silences built
/// locally. `updated_at` is only maintained by the server; local silences
/// carry the zero timestamp (`0001-01-01T00:00:00Z`).
///
/// See: <https://prometheus.io/docs/alerting/latest/alertmanager/#silences>
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Silence {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SilenceStatus>,

    #[serde(default)]
    pub matchers: Vec<Matcher>,

    pub starts_at: DateTime<Utc>,

    pub ends_at: DateTime<Utc>,

    #[serde(default = "zero_timestamp")]
    pub updated_at: DateTime<Utc>,

    #[serde(default)]
    pub created_by: String,

    #[serde(default)]
    pub comment: String,
}

/// Timestamp Alertmanager uses to mean "never updated"
pub fn zero_timestamp() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn format_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

impl Silence {
    pub fn state(&self) -> Option<SilenceState> {
        self.status.as_ref().map(|s| s.state)
    }

    pub fn is_active(&self) -> bool {
        self.state() == Some(SilenceState::Active)
    }

    pub fn id(&self) -> &str {
        self.id.as_deref().unwrap_or_default()
    }

    pub fn signature(&self) -> Signature {
        Signature::of_matchers(&self.matchers)
    }

    /// Matchers rendered as `name=value,...` in their stored order
    pub fn labels_display(&self) -> String {
        self.matchers
            .iter()
            .map(|m| format!("{}={}", m.name, m.value))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Short description used in progress messages
    pub fn summary(&self) -> String {
        format!(
            "[creator: {}, comment: {}, start: {}, end: {}]",
            self.created_by,
            self.comment,
            format_time(&self.starts_at),
            format_time(&self.ends_at),
        )
    }
}

impl Display for Silence {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ID: {}, creator: {}, comment: {}, start: {}, end: {}, labels: {}",
            self.id(),
            self.created_by,
            self.comment,
            format_time(&self.starts_at),
            format_time(&self.ends_at),
            self.labels_display(),
        )
    }
}

/// Body of `GET /api/v1/silences`
#[derive(Debug, Clone, Deserialize)]
pub struct SilencesResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub data: Option<Vec<Silence>>,
}

impl SilencesResponse {
    pub fn into_silences(self) -> Vec<Silence> {
        self.data.unwrap_or_default()
    }
}

/// Body of `POST /api/v1/silences`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSilenceResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub data: Option<CreatedSilence>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedSilence {
    pub silence_id: String,
}
