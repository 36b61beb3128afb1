use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Documented context keys. Stages communicate exclusively through these;
/// ad hoc keys are allowed but collide at the author's own risk.
pub mod keys {
    /// Subject identified earlier in the flow ([`Subject`](super::Subject) as JSON).
    pub const PENDING_USER: &str = "pending_user";
    /// Raw identifier the subject was resolved from.
    pub const PENDING_USER_IDENTIFIER: &str = "pending_user_identifier";
    /// Method that authenticated the subject (e.g. "password", "mfa").
    pub const AUTH_METHOD: &str = "auth_method";
    /// Device descriptors fetched for the pending MFA validation stage.
    pub const MFA_DEVICES: &str = "mfa_devices";
    /// Device that completed MFA validation.
    pub const MFA_DEVICE: &str = "mfa_device";
    /// Invitation data fixed into the context by the invitation stage.
    pub const INVITATION: &str = "invitation";
    /// Redirect target recorded for the caller on completion.
    pub const REDIRECT: &str = "redirect";
    /// Failed password attempts for the current password stage.
    pub const PASSWORD_ATTEMPTS: &str = "password_attempts";
}

/// A subject resolved during identification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Free-form attributes policies may inspect (e.g. `has_mfa`).
    #[serde(default)]
    pub attributes: serde_json::Map<String, Value>,
}

/// Key-value data accumulated across stages of one flow session.
///
/// Entries are append-or-overwrite only: merging never removes a key, so
/// later stages can rely on the outputs of earlier ones. Iteration order
/// is deterministic (sorted keys) to keep serialized sessions stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowContext {
    entries: BTreeMap<String, Value>,
}

impl FlowContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), value);
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge `updates` into this context, last-write-wins per key.
    /// Existing keys absent from `updates` are untouched.
    pub fn merge(&mut self, updates: FlowContext) {
        self.entries.extend(updates.entries);
    }

    pub fn pending_user(&self) -> Option<Subject> {
        self.get(keys::PENDING_USER)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn set_pending_user(&mut self, subject: &Subject) {
        self.insert(
            keys::PENDING_USER,
            serde_json::to_value(subject).unwrap_or(Value::Null),
        );
    }

    pub fn password_attempts(&self) -> u32 {
        self.get(keys::PASSWORD_ATTEMPTS)
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u32
    }

    pub fn redirect(&self) -> Option<String> {
        self.get(keys::REDIRECT)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }
}

impl FromIterator<(String, Value)> for FlowContext {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
