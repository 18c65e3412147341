//! Result types for the external activation boundary.
//!
//! The overlay is toggled by a host-controlled trigger (toolbar button,
//! keyboard shortcut) living outside this crate. The trigger reports back an
//! [`ActivationOutcome`] describing what it did; this crate only defines the
//! shared vocabulary so both sides agree on the wire shape.

use serde::{Deserialize, Serialize};

/// Why an activation attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActivationFailure {
    MissingTarget,
    RestrictedUrl,
    InjectionFailed,
    ReadinessTimeout,
    ShowFailed,
    HideFailed,
    StatusCheckFailed,
    Unknown,
}

/// What the trigger ended up doing to the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActivationAction {
    Opened,
    Closed,
    Noop,
}

/// Outcome reported by the activation trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationOutcome {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<ActivationFailure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ActivationAction>,
    /// Whether the overlay's visible state actually changed.
    pub changed: bool,
}

impl ActivationOutcome {
    /// Successful activation that changed the overlay state.
    pub fn ok(tab_id: i64, action: ActivationAction) -> Self {
        Self {
            ok: true,
            tab_id: Some(tab_id),
            reason: None,
            action: Some(action),
            changed: action != ActivationAction::Noop,
        }
    }

    /// Successful no-op (e.g. the overlay was already in the requested state).
    pub fn noop(tab_id: i64) -> Self {
        Self::ok(tab_id, ActivationAction::Noop)
    }

    /// Failed activation with a reason.
    pub fn failed(reason: ActivationFailure) -> Self {
        Self {
            ok: false,
            tab_id: None,
            reason: Some(reason),
            action: None,
            changed: false,
        }
    }
}
