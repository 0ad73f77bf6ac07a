//! Toast definitions, the persisted collection and its validation rules.
//!
//! The wire shape is fixed: `type` and `autoHide` keep their JSON names, and
//! unknown `type`/`position` strings deserialize into explicit fallback
//! variants instead of failing the whole document.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::error::DomainError;

pub const MIN_DURATION_MS: i64 = 1000;
pub const MAX_DURATION_MS: i64 = 30000;
pub const DEFAULT_DURATION_MS: i64 = 5000;

/// Severity category of a toast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    #[default]
    Success,
    Error,
    Warning,
    Info,
    /// Any kind this build does not recognize; shown without accent styling.
    #[serde(other)]
    Neutral,
}

impl ToastKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Neutral => "neutral",
        }
    }
}

/// Screen corner a toast stacks into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToastPosition {
    #[default]
    TopRight,
    TopLeft,
    BottomRight,
    BottomLeft,
    /// A position with no matching render region; such a toast is never shown.
    #[serde(other)]
    Unknown,
}

impl ToastPosition {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TopRight => "top-right",
            Self::TopLeft => "top-left",
            Self::BottomRight => "bottom-right",
            Self::BottomLeft => "bottom-left",
            Self::Unknown => "unknown",
        }
    }
}

/// One notification definition.
///
/// `id` is an opaque correlation handle minted by the editor; it is stored
/// verbatim and never interpreted, and need not be unique across a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Toast {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: ToastKind,
    #[serde(default)]
    pub position: ToastPosition,
    #[serde(default = "default_duration")]
    pub duration: i64,
    #[serde(rename = "autoHide", default = "default_auto_hide")]
    pub auto_hide: bool,
}

fn default_duration() -> i64 {
    DEFAULT_DURATION_MS
}

fn default_auto_hide() -> bool {
    true
}

/// The persisted unit: an ordered toast sequence plus the revision marker.
///
/// `timestamp` is epoch milliseconds, stamped at save time; it is `None` only
/// in the never-saved initial state. Polling clients compare it to detect
/// changes, nothing more.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToastCollection {
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub toasts: Vec<Toast>,
}

/// Epoch milliseconds for `at`.
pub fn epoch_ms(at: OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}

/// Rules enforced before a collection is stored: every toast carries a title
/// and a message once whitespace is trimmed. Fails on the first violation,
/// naming the entry by its 1-based number.
pub fn validate_stored(toasts: &[Toast]) -> Result<(), DomainError> {
    for (index, toast) in toasts.iter().enumerate() {
        let number = index + 1;
        if toast.title.trim().is_empty() {
            return Err(DomainError::validation(format!(
                "Toast #{number} missing title"
            )));
        }
        if toast.message.trim().is_empty() {
            return Err(DomainError::validation(format!(
                "Toast #{number} missing message"
            )));
        }
    }
    Ok(())
}

/// Editor-side rules: the stored rules plus the duration range. The editor
/// trims titles and messages before calling this, so presence checks are
/// plain emptiness tests. The duration check deliberately has no server-side
/// counterpart; an out-of-range duration saved by another client round-trips
/// untouched.
pub fn validate_drafts(toasts: &[Toast]) -> Result<(), DomainError> {
    for (index, toast) in toasts.iter().enumerate() {
        let number = index + 1;
        if toast.title.is_empty() {
            return Err(DomainError::validation(format!(
                "Toast #{number} is missing a title"
            )));
        }
        if toast.message.is_empty() {
            return Err(DomainError::validation(format!(
                "Toast #{number} is missing a message"
            )));
        }
        if toast.duration < MIN_DURATION_MS || toast.duration > MAX_DURATION_MS {
            return Err(DomainError::validation(format!(
                "Toast #{number} duration must be between 1000ms and 30000ms"
            )));
        }
    }
    Ok(())
}
