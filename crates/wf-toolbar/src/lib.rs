//! Toolbar visibility for custom tabs whose page lies inside the host
//! application's trusted scope.

use serde::Deserialize;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use wf_core::CustomTabToken;
use wf_feature::Feature;
use wf_net::TrustedScope;
use wf_store::BrowserState;
use wf_store::DisplayOptions;

/// Sink for toolbar visibility decisions.
pub trait ToolbarController: Send + Sync {
    fn set_visible(&self, visible: bool);

    /// Styles the toolbar with the branding a custom tab asked for.
    fn apply_display_options(&self, _options: &DisplayOptions) {}
}

impl<T: ToolbarController + ?Sized> ToolbarController for Arc<T> {
    fn set_visible(&self, visible: bool) {
        (**self).set_visible(visible);
    }

    fn apply_display_options(&self, options: &DisplayOptions) {
        (**self).apply_display_options(options);
    }
}

/// When decisions reach the controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyMode {
    /// Only when the decision differs from the last one emitted.
    #[default]
    EdgeTriggered,
    /// On every snapshot that yields a decision.
    EverySnapshot,
}

impl NotifyMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EdgeTriggered => "edge_triggered",
            Self::EverySnapshot => "every_snapshot",
        }
    }

    pub fn from_name(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "edge_triggered" | "edge" => Some(Self::EdgeTriggered),
            "every_snapshot" | "every" => Some(Self::EverySnapshot),
            _ => None,
        }
    }
}

/// Decides whether the toolbar should show for the custom tab opened under `token`.
///
/// Returns `None` when no session carries the token. A missing custom tab
/// record counts as an empty scope, and a URL without a parsable origin is
/// never trusted.
pub fn toolbar_visible(state: &BrowserState, token: &CustomTabToken) -> Option<bool> {
    let session = state.custom_tab_session(token)?;
    let scope = state
        .custom_tab(token)
        .map(|record| TrustedScope::from_origins(&record.trusted_origins))
        .unwrap_or_default();
    Some(!scope.contains_url(&session.url))
}

/// Hides the toolbar while the custom tab stays inside its trusted scope.
#[derive(Debug)]
pub struct TrustedScopeToolbarFeature<C> {
    token: CustomTabToken,
    controller: C,
    mode: NotifyMode,
    started: bool,
    last_emitted: Option<bool>,
}

impl<C: ToolbarController> TrustedScopeToolbarFeature<C> {
    pub fn new(token: CustomTabToken, controller: C, mode: NotifyMode) -> Self {
        Self {
            token,
            controller,
            mode,
            started: false,
            last_emitted: None,
        }
    }

    pub fn token(&self) -> &CustomTabToken {
        &self.token
    }

    pub fn last_emitted(&self) -> Option<bool> {
        self.last_emitted
    }

    /// Recomputes the decision for `state` and returns it if it was pushed
    /// to the controller.
    pub fn on_snapshot(&mut self, state: &BrowserState) -> Option<bool> {
        if !self.started {
            return None;
        }

        let Some(visible) = toolbar_visible(state, &self.token) else {
            debug!(token = %self.token, "no session for custom tab token, keeping decision");
            return None;
        };

        if self.mode == NotifyMode::EdgeTriggered && self.last_emitted == Some(visible) {
            return None;
        }

        self.last_emitted = Some(visible);
        self.controller.set_visible(visible);
        debug!(token = %self.token, visible, "toolbar visibility emitted");
        Some(visible)
    }
}

impl<C: ToolbarController + 'static> Feature for TrustedScopeToolbarFeature<C> {
    fn start(&mut self) {
        self.started = true;
    }

    fn stop(&mut self) {
        self.started = false;
        self.last_emitted = None;
    }
}
