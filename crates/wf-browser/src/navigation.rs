//! Navigation targets reachable from the custom-tab screen.

use serde::Deserialize;
use serde::Serialize;
use std::sync::Arc;
use wf_core::SessionId;

/// Edge a panel is anchored to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gravity {
    #[default]
    Top,
    Bottom,
}

impl Gravity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenId {
    Browser,
    ExternalAppBrowser,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    #[default]
    NoDecision,
    Allowed,
    Blocked,
}

/// Per-origin permission decisions shown in the quick settings sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitePermissions {
    pub origin: String,
    #[serde(default)]
    pub camera: PermissionStatus,
    #[serde(default)]
    pub microphone: PermissionStatus,
    #[serde(default)]
    pub location: PermissionStatus,
    #[serde(default)]
    pub notification: PermissionStatus,
}

impl SitePermissions {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ..Self::default()
        }
    }
}

/// Arguments for a navigation out of the browser screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum Directions {
    QuickSettingsSheet {
        session_id: SessionId,
        url: String,
        is_secured: bool,
        is_tracking_protection_on: bool,
        site_permissions: Option<SitePermissions>,
        gravity: Gravity,
    },
    TrackingProtectionPanel {
        session_id: SessionId,
        url: String,
        tracking_protection_enabled: bool,
        gravity: Gravity,
    },
}

impl Directions {
    pub fn session_id(&self) -> &SessionId {
        match self {
            Self::QuickSettingsSheet { session_id, .. }
            | Self::TrackingProtectionPanel { session_id, .. } => session_id,
        }
    }
}

/// Performs navigations requested by a screen.
pub trait Navigator: Send + Sync {
    fn navigate_to(&self, from: ScreenId, directions: Directions);
}

impl<T: Navigator + ?Sized> Navigator for Arc<T> {
    fn navigate_to(&self, from: ScreenId, directions: Directions) {
        (**self).navigate_to(from, directions);
    }
}
