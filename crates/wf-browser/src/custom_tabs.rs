use std::sync::Arc;
use tracing::debug;
use wf_core::SessionId;
use wf_feature::BackHandler;
use wf_feature::Feature;
use wf_store::BrowserAction;
use wf_store::BrowserStore;
use wf_store::DisplayOptions;
use wf_toolbar::ToolbarController;

/// Invoked with the id of a session whose screen should close.
pub type CloseListener = Arc<dyn Fn(&SessionId) + Send + Sync>;

pub(crate) fn noop_close_listener() -> CloseListener {
    Arc::new(|_| {})
}

/// Custom-tab chrome for one session. Brands the toolbar on start and closes
/// the custom tab on back.
pub struct CustomTabsIntegration {
    store: BrowserStore,
    session_id: SessionId,
    toolbar: Arc<dyn ToolbarController>,
    on_close: CloseListener,
    started: bool,
}

impl CustomTabsIntegration {
    pub fn new(
        store: BrowserStore,
        session_id: SessionId,
        toolbar: Arc<dyn ToolbarController>,
        on_close: CloseListener,
    ) -> Self {
        Self {
            store,
            session_id,
            toolbar,
            on_close,
            started: false,
        }
    }

    /// Options registered for the session's token, falling back to the ones
    /// the session was opened with.
    fn display_options(&self) -> Option<DisplayOptions> {
        let snapshot = self.store.current_snapshot();
        let config = snapshot.session(&self.session_id)?.custom_tab_config.as_ref()?;
        let options = match snapshot.custom_tab(&config.token) {
            Some(record) => record.options.clone(),
            None => config.options.clone(),
        };
        Some(options)
    }
}

impl Feature for CustomTabsIntegration {
    fn start(&mut self) {
        self.started = true;
        match self.display_options() {
            Some(options) => {
                self.toolbar.apply_display_options(&options);
                debug!(
                    session = %self.session_id,
                    title = options.title.as_deref().unwrap_or_default(),
                    toolbar_color = ?options.toolbar_color,
                    share = options.show_share_menu_item,
                    url_bar_hiding = options.enable_url_bar_hiding,
                    "custom tab integration started"
                );
            }
            None => debug!(
                session = %self.session_id,
                "custom tab integration started unbranded"
            ),
        }
    }

    fn stop(&mut self) {
        self.started = false;
        debug!(session = %self.session_id, "custom tab integration stopped");
    }

    fn back_handler(&mut self) -> Option<&mut dyn BackHandler> {
        Some(self)
    }
}

impl BackHandler for CustomTabsIntegration {
    /// Removes the custom-tab session and closes the screen. Not consumed when
    /// the session is already gone.
    fn on_back_pressed(&mut self) -> bool {
        if !self.started {
            return false;
        }
        if self.store.current_snapshot().session(&self.session_id).is_none() {
            debug!(session = %self.session_id, "custom tab session already removed");
            return false;
        }

        self.store.dispatch(BrowserAction::RemoveSession {
            session_id: self.session_id.clone(),
        });
        (self.on_close)(&self.session_id);
        true
    }
}
