use crate::custom_tabs::CloseListener;
use crate::custom_tabs::CustomTabsIntegration;
use crate::custom_tabs::noop_close_listener;
use crate::layout::BrowserLayout;
use crate::layout::LayoutToolbar;
use crate::navigation::Directions;
use crate::navigation::Gravity;
use crate::navigation::Navigator;
use crate::navigation::ScreenId;
use crate::navigation::SitePermissions;
use crate::settings::WayfarerSettings;
use core::fmt;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;
use tracing::info;
use wf_core::SessionId;
use wf_feature::BackChain;
use wf_feature::BackOutcome;
use wf_feature::ViewBoundFeature;
use wf_lifecycle::Lifecycle;
use wf_store::BrowserAction;
use wf_store::BrowserState;
use wf_store::BrowserStore;
use wf_store::Consumer;
use wf_store::SessionRecord;
use wf_store::SessionSource;
use wf_store::consume_from;
use wf_toolbar::ToolbarController;
use wf_toolbar::TrustedScopeToolbarFeature;

const CUSTOM_TABS_CONSUMER: &str = "custom-tabs";
const REMOVE_SESSION_CONSUMER: &str = "remove-session";

type HideToolbarFeature<T> = TrustedScopeToolbarFeature<LayoutToolbar<T>>;

/// Browser screen hosting a page opened by another application.
///
/// The screen owns two feature slots: the custom-tab integration, bound to the
/// screen and its content view, and the toolbar visibility feature, bound to
/// the screen and the toolbar view. Store snapshots reach the toolbar feature
/// only while the screen is active.
pub struct ExternalAppBrowser<T: ToolbarController + 'static, N: Navigator> {
    store: BrowserStore,
    owner: Lifecycle,
    custom_tab_session_id: Option<SessionId>,
    toolbar: Arc<T>,
    navigator: N,
    settings: WayfarerSettings,
    layout: BrowserLayout,
    on_close: CloseListener,
    custom_tabs: ViewBoundFeature<CustomTabsIntegration>,
    hide_toolbar: ViewBoundFeature<HideToolbarFeature<T>>,
    back_chain: BackChain,
    consumer: Mutex<Option<Consumer>>,
}

impl<T: ToolbarController + 'static, N: Navigator> fmt::Debug for ExternalAppBrowser<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalAppBrowser")
            .field("owner", &self.owner.name())
            .field("custom_tab_session_id", &self.custom_tab_session_id)
            .field("custom_tabs", &self.custom_tabs)
            .field("hide_toolbar", &self.hide_toolbar)
            .field("back_chain", &self.back_chain)
            .finish()
    }
}

impl<T: ToolbarController + 'static, N: Navigator> ExternalAppBrowser<T, N> {
    pub fn new(
        store: BrowserStore,
        owner: Lifecycle,
        custom_tab_session_id: Option<SessionId>,
        toolbar: Arc<T>,
        navigator: N,
        settings: WayfarerSettings,
    ) -> Self {
        let layout = BrowserLayout::new(settings.toolbar.height_px, settings.toolbar.gravity);
        let mut host = Self {
            store,
            owner,
            custom_tab_session_id,
            toolbar,
            navigator,
            settings,
            layout,
            on_close: noop_close_listener(),
            custom_tabs: ViewBoundFeature::new("custom-tabs-integration"),
            hide_toolbar: ViewBoundFeature::new("hide-toolbar"),
            back_chain: BackChain::new(),
            consumer: Mutex::new(None),
        };
        host.back_chain = host.build_back_chain();
        host
    }

    /// Called when back navigation closes the screen.
    pub fn with_close_listener<F>(mut self, listener: F) -> Self
    where
        F: Fn(&SessionId) + Send + Sync + 'static,
    {
        self.on_close = Arc::new(listener);
        self.back_chain = self.build_back_chain();
        self
    }

    fn build_back_chain(&self) -> BackChain {
        let store = self.store.clone();
        let session_id = self.custom_tab_session_id.clone();
        let on_close = Arc::clone(&self.on_close);
        BackChain::new()
            .then(CUSTOM_TABS_CONSUMER, self.custom_tabs.clone())
            .then_fn(REMOVE_SESSION_CONSUMER, move || {
                remove_session_if_needed(&store, session_id.as_ref(), &on_close)
            })
    }

    pub fn store(&self) -> &BrowserStore {
        &self.store
    }

    pub fn owner(&self) -> &Lifecycle {
        &self.owner
    }

    pub fn custom_tab_session_id(&self) -> Option<&SessionId> {
        self.custom_tab_session_id.as_ref()
    }

    pub fn settings(&self) -> &WayfarerSettings {
        &self.settings
    }

    /// The session this screen shows: the custom-tab session when set,
    /// otherwise the selected one.
    pub fn session(&self) -> Option<SessionRecord> {
        let snapshot = self.store.current_snapshot();
        resolve_session(&snapshot, self.custom_tab_session_id.as_ref()).cloned()
    }

    /// Wires the screen's features to freshly created views.
    ///
    /// Returns the screen's session, or `None` (wiring nothing) when it is not
    /// in the store. Calling this again after the views are recreated replaces
    /// the previous features and subscription.
    pub fn initialize_ui(
        &self,
        view: &Lifecycle,
        toolbar_view: &Lifecycle,
    ) -> Option<SessionRecord> {
        let Some(session) = self.session() else {
            debug!(owner = self.owner.name(), "no session for screen, nothing to wire");
            return None;
        };

        self.layout.set_full_screen(false);

        if let Some(session_id) = &self.custom_tab_session_id {
            self.custom_tabs.set(
                CustomTabsIntegration::new(
                    self.store.clone(),
                    session_id.clone(),
                    Arc::clone(&self.toolbar) as Arc<dyn ToolbarController>,
                    Arc::clone(&self.on_close),
                ),
                &self.owner,
                view,
            );

            match session.custom_tab_config.as_ref() {
                Some(config) => {
                    let controller =
                        LayoutToolbar::new(Arc::clone(&self.toolbar), self.layout.clone());
                    self.hide_toolbar.set(
                        TrustedScopeToolbarFeature::new(
                            config.token.clone(),
                            controller,
                            self.settings.toolbar.notify,
                        ),
                        &self.owner,
                        toolbar_view,
                    );
                }
                None => debug!(session = %session_id, "session has no custom tab config"),
            }
        }

        let hide_toolbar = self.hide_toolbar.clone();
        let consumer = consume_from(&self.store, &self.owner, move |state: &BrowserState| {
            hide_toolbar.with_feature(|feature| feature.on_snapshot(state));
        });
        *self.consumer.lock() = Some(consumer);

        info!(
            session = %session.id,
            custom_tab = self.custom_tab_session_id.is_some(),
            toolbar_feature = self.hide_toolbar.is_present(),
            gravity = self.layout_gravity().as_str(),
            "external app browser initialized"
        );
        Some(session)
    }

    pub fn has_custom_tabs_integration(&self) -> bool {
        self.custom_tabs.is_present()
    }

    pub fn has_toolbar_feature(&self) -> bool {
        self.hide_toolbar.is_present()
    }

    pub fn is_consuming(&self) -> bool {
        self.consumer
            .lock()
            .as_ref()
            .is_some_and(Consumer::is_active)
    }

    pub fn in_full_screen(&self) -> bool {
        self.layout.in_full_screen()
    }

    /// Top and bottom margins of the engine view; zero in full screen.
    pub fn layout_margins(&self) -> (u32, u32) {
        self.layout.margins()
    }

    pub fn engine_margins(&self) -> (u32, u32) {
        self.layout.engine_margins()
    }

    pub fn layout_gravity(&self) -> Gravity {
        self.layout.gravity()
    }

    pub fn handle_back(&self) -> BackOutcome {
        self.handle_back_or(|| {})
    }

    /// Offers the back press to the screen's consumers and runs `default`
    /// when none takes it.
    pub fn handle_back_or<F: FnOnce()>(&self, default: F) -> BackOutcome {
        let outcome = self.back_chain.handle_back_or(default);
        info!(?outcome, "back press handled");
        outcome
    }

    /// Returns true if the screen consumed the back press.
    pub fn on_back_pressed(&self) -> bool {
        self.handle_back().is_consumed()
    }

    pub fn remove_session_if_needed(&self) -> bool {
        remove_session_if_needed(
            &self.store,
            self.custom_tab_session_id.as_ref(),
            &self.on_close,
        )
    }

    pub fn nav_to_quick_settings_sheet(
        &self,
        session: &SessionRecord,
        site_permissions: Option<SitePermissions>,
    ) {
        let directions = Directions::QuickSettingsSheet {
            session_id: session.id.clone(),
            url: session.url.clone(),
            is_secured: session.secure,
            is_tracking_protection_on: session.tracking_protection,
            site_permissions,
            gravity: self.layout_gravity(),
        };
        self.navigator.navigate_to(ScreenId::ExternalAppBrowser, directions);
    }

    pub fn nav_to_tracking_protection_panel(&self, session: &SessionRecord) {
        let directions = Directions::TrackingProtectionPanel {
            session_id: session.id.clone(),
            url: session.url.clone(),
            tracking_protection_enabled: session.tracking_protection,
            gravity: self.layout_gravity(),
        };
        self.navigator.navigate_to(ScreenId::ExternalAppBrowser, directions);
    }
}

fn resolve_session<'a>(
    state: &'a BrowserState,
    session_id: Option<&SessionId>,
) -> Option<&'a SessionRecord> {
    match session_id {
        Some(id) => state.session(id),
        None => state.selected_session(),
    }
}

/// Removes a session opened from an outside link and closes the screen.
fn remove_session_if_needed(
    store: &BrowserStore,
    session_id: Option<&SessionId>,
    on_close: &CloseListener,
) -> bool {
    let snapshot = store.current_snapshot();
    let Some(session) = resolve_session(&snapshot, session_id) else {
        return false;
    };
    if session.source != SessionSource::ActionView {
        return false;
    }

    let id = session.id.clone();
    store.dispatch(BrowserAction::RemoveSession { session_id: id.clone() });
    on_close(&id);
    true
}
