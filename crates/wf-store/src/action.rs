use crate::state::CustomTabConfig;
use crate::state::SessionRecord;
use serde::Deserialize;
use serde::Serialize;
use wf_core::CustomTabToken;
use wf_core::SessionId;

/// State transitions accepted by the browser store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BrowserAction {
    AddSession {
        session: SessionRecord,
        #[serde(default)]
        select: bool,
    },
    RemoveSession {
        session_id: SessionId,
    },
    SelectSession {
        session_id: SessionId,
    },
    UpdateUrl {
        session_id: SessionId,
        url: String,
    },
    UpdateSecurity {
        session_id: SessionId,
        secure: bool,
    },
    UpdateTrackingProtection {
        session_id: SessionId,
        enabled: bool,
    },
    /// Registers custom tab data for `config.token`, keeping any trusted
    /// origins already recorded for it.
    AddCustomTab {
        config: CustomTabConfig,
    },
    RemoveCustomTab {
        token: CustomTabToken,
    },
    /// Adds one verified origin to the token's scope.
    TrustOrigin {
        token: CustomTabToken,
        origin: String,
    },
    SetTrustedOrigins {
        token: CustomTabToken,
        origins: Vec<String>,
    },
}

impl BrowserAction {
    pub fn add_custom_tab(token: CustomTabToken) -> Self {
        Self::AddCustomTab {
            config: CustomTabConfig::new(token),
        }
    }
}
