use crate::action::BrowserAction;
use crate::state::BrowserState;
use crate::state::CustomTabRecord;
use crate::state::SessionRecord;
use tracing::debug;
use wf_core::SessionId;

/// Applies `action` to `state` and returns the next state.
///
/// Actions that name an unknown session leave the state as it was.
pub fn reduce(state: &BrowserState, action: BrowserAction) -> BrowserState {
    let mut next = state.clone();

    match action {
        BrowserAction::AddSession { session, select } => {
            if select || next.selected_session_id.is_none() {
                next.selected_session_id = Some(session.id.clone());
            }
            next.sessions.insert(session.id.clone(), session);
        }
        BrowserAction::RemoveSession { session_id } => {
            if next.sessions.remove(&session_id).is_none() {
                debug!(session = %session_id, "remove for unknown session");
            }
            if next.selected_session_id.as_ref() == Some(&session_id) {
                next.selected_session_id = next.sessions.keys().next().cloned();
            }
        }
        BrowserAction::SelectSession { session_id } => {
            if next.sessions.contains_key(&session_id) {
                next.selected_session_id = Some(session_id);
            } else {
                debug!(session = %session_id, "select for unknown session");
            }
        }
        BrowserAction::UpdateUrl { session_id, url } => {
            update_session(&mut next, &session_id, |session| session.url = url);
        }
        BrowserAction::UpdateSecurity { session_id, secure } => {
            update_session(&mut next, &session_id, |session| session.secure = secure);
        }
        BrowserAction::UpdateTrackingProtection {
            session_id,
            enabled,
        } => {
            update_session(&mut next, &session_id, |session| {
                session.tracking_protection = enabled;
            });
        }
        BrowserAction::AddCustomTab { config } => {
            let record = next
                .custom_tabs
                .entry(config.token.clone())
                .or_insert_with(|| CustomTabRecord::new(config.token.clone()));
            record.options = config.options;
        }
        BrowserAction::RemoveCustomTab { token } => {
            next.custom_tabs.remove(&token);
        }
        BrowserAction::TrustOrigin { token, origin } => {
            next.custom_tabs
                .entry(token.clone())
                .or_insert_with(|| CustomTabRecord::new(token))
                .trusted_origins
                .insert(origin);
        }
        BrowserAction::SetTrustedOrigins { token, origins } => {
            next.custom_tabs
                .entry(token.clone())
                .or_insert_with(|| CustomTabRecord::new(token))
                .trusted_origins = origins.into_iter().collect();
        }
    }

    next
}

fn update_session<F>(state: &mut BrowserState, id: &SessionId, update: F)
where
    F: FnOnce(&mut SessionRecord),
{
    match state.sessions.get_mut(id) {
        Some(session) => update(session),
        None => debug!(session = %id, "update for unknown session"),
    }
}
