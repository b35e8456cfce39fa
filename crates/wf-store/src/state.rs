//! Session state published by the browser store.

use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use wf_core::CustomTabToken;
use wf_core::SessionId;

/// Whole-application session state at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserState {
    #[serde(default)]
    pub sessions: BTreeMap<SessionId, SessionRecord>,
    #[serde(default)]
    pub custom_tabs: BTreeMap<CustomTabToken, CustomTabRecord>,
    #[serde(default)]
    pub selected_session_id: Option<SessionId>,
}

impl BrowserState {
    pub fn session(&self, id: &SessionId) -> Option<&SessionRecord> {
        self.sessions.get(id)
    }

    pub fn selected_session(&self) -> Option<&SessionRecord> {
        self.selected_session_id
            .as_ref()
            .and_then(|id| self.sessions.get(id))
    }

    /// Finds the session opened for `token`. Matches on token identity only.
    pub fn custom_tab_session(&self, token: &CustomTabToken) -> Option<&SessionRecord> {
        self.sessions.values().find(|session| {
            session
                .custom_tab_config
                .as_ref()
                .is_some_and(|config| &config.token == token)
        })
    }

    pub fn custom_tab(&self, token: &CustomTabToken) -> Option<&CustomTabRecord> {
        self.custom_tabs.get(token)
    }
}

/// How a session came to exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionSource {
    CustomTab,
    ActionView,
    #[default]
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: SessionId,
    pub url: String,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub tracking_protection: bool,
    #[serde(default)]
    pub source: SessionSource,
    #[serde(default)]
    pub custom_tab_config: Option<CustomTabConfig>,
}

impl SessionRecord {
    pub fn new(id: SessionId, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
            secure: false,
            tracking_protection: true,
            source: SessionSource::Internal,
            custom_tab_config: None,
        }
    }

    /// Marks the session as opened by a host application under `token`.
    pub fn with_custom_tab(mut self, config: CustomTabConfig) -> Self {
        self.source = SessionSource::CustomTab;
        self.custom_tab_config = Some(config);
        self
    }

    pub fn with_source(mut self, source: SessionSource) -> Self {
        self.source = source;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomTabConfig {
    pub token: CustomTabToken,
    #[serde(default)]
    pub options: DisplayOptions,
}

impl CustomTabConfig {
    pub fn new(token: CustomTabToken) -> Self {
        Self {
            token,
            options: DisplayOptions::default(),
        }
    }
}

/// Branding the host application asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayOptions {
    #[serde(default)]
    pub toolbar_color: Option<u32>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub show_share_menu_item: bool,
    #[serde(default)]
    pub enable_url_bar_hiding: bool,
}

/// Per-token custom tab data kept by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomTabRecord {
    pub token: CustomTabToken,
    #[serde(default)]
    pub trusted_origins: BTreeSet<String>,
    #[serde(default)]
    pub options: DisplayOptions,
}

impl CustomTabRecord {
    pub fn new(token: CustomTabToken) -> Self {
        Self {
            token,
            trusted_origins: BTreeSet::new(),
            options: DisplayOptions::default(),
        }
    }

    pub fn with_trusted_origins<I>(mut self, origins: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.trusted_origins = origins.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::BrowserState;
    use super::CustomTabConfig;
    use super::SessionRecord;
    use super::SessionSource;
    use wf_core::CustomTabToken;
    use wf_core::SessionId;

    fn state_with_custom_tab() -> BrowserState {
        let mut state = BrowserState::default();
        let session = SessionRecord::new(SessionId::new("s1"), "https://mozilla.com/")
            .with_custom_tab(CustomTabConfig::new(CustomTabToken::new("T1")));
        state.sessions.insert(session.id.clone(), session);
        state.sessions.insert(
            SessionId::new("s2"),
            SessionRecord::new(SessionId::new("s2"), "https://example.com/"),
        );
        state
    }

    #[test]
    fn finds_session_by_custom_tab_token() {
        let state = state_with_custom_tab();
        let found = state.custom_tab_session(&CustomTabToken::new("T1"));
        assert_eq!(found.map(|session| session.id.as_str()), Some("s1"));
        assert_eq!(found.map(|session| session.source), Some(SessionSource::CustomTab));
        assert!(state.custom_tab_session(&CustomTabToken::new("T2")).is_none());
    }

    #[test]
    fn deserializes_sparse_json() {
        let json = r#"{
            "sessions": {
                "s1": {
                    "id": "s1",
                    "url": "https://mozilla.com/",
                    "customTabConfig": {"token": "T1"}
                }
            },
            "customTabs": {
                "T1": {"token": "T1", "trustedOrigins": ["https://mozilla.com"]}
            }
        }"#;
        let state: BrowserState = match serde_json::from_str(json) {
            Ok(state) => state,
            Err(error) => panic!("{error}"),
        };
        let token = CustomTabToken::new("T1");
        assert!(state.custom_tab_session(&token).is_some());
        assert_eq!(
            state
                .custom_tab(&token)
                .map(|record| record.trusted_origins.len()),
            Some(1)
        );
        assert!(state.selected_session().is_none());
    }
}
