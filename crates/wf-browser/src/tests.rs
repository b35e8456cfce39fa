use crate::Directions;
use crate::ExternalAppBrowser;
use crate::Gravity;
use crate::Navigator;
use crate::ScreenId;
use crate::SitePermissions;
use crate::WayfarerSettings;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use wf_core::CustomTabToken;
use wf_core::SessionId;
use wf_feature::BackOutcome;
use wf_lifecycle::Lifecycle;
use wf_store::BrowserAction;
use wf_store::BrowserState;
use wf_store::BrowserStore;
use wf_store::CustomTabConfig;
use wf_store::CustomTabRecord;
use wf_store::DisplayOptions;
use wf_store::SessionRecord;
use wf_store::SessionSource;
use wf_store::browser_store;
use wf_toolbar::NotifyMode;
use wf_toolbar::ToolbarController;

const TRUSTED: &str = "https://mozilla.com";

#[derive(Default)]
struct RecordingToolbar {
    calls: Mutex<Vec<bool>>,
    branding: Mutex<Vec<DisplayOptions>>,
}

impl ToolbarController for RecordingToolbar {
    fn set_visible(&self, visible: bool) {
        self.calls.lock().push(visible);
    }

    fn apply_display_options(&self, options: &DisplayOptions) {
        self.branding.lock().push(options.clone());
    }
}

#[derive(Default)]
struct RecordingNavigator {
    calls: Mutex<Vec<(ScreenId, Directions)>>,
}

impl Navigator for RecordingNavigator {
    fn navigate_to(&self, from: ScreenId, directions: Directions) {
        self.calls.lock().push((from, directions));
    }
}

type Host = ExternalAppBrowser<RecordingToolbar, Arc<RecordingNavigator>>;

struct Screen {
    host: Host,
    store: BrowserStore,
    owner: Lifecycle,
    view: Lifecycle,
    toolbar_view: Lifecycle,
    toolbar: Arc<RecordingToolbar>,
    navigator: Arc<RecordingNavigator>,
    closed: Arc<AtomicUsize>,
}

impl Screen {
    fn decisions(&self) -> Vec<bool> {
        self.toolbar.calls.lock().clone()
    }
}

fn active(name: &str) -> Lifecycle {
    let lifecycle = Lifecycle::new(name);
    lifecycle.activate();
    lifecycle
}

fn custom_tab_state(url: &str, trusted: &[&str]) -> BrowserState {
    let token = CustomTabToken::new("T1");
    let mut state = BrowserState::default();
    let session = SessionRecord::new(SessionId::new("s1"), url)
        .with_custom_tab(CustomTabConfig::new(token.clone()));
    state.selected_session_id = Some(session.id.clone());
    state.sessions.insert(session.id.clone(), session);
    state.custom_tabs.insert(
        token.clone(),
        CustomTabRecord::new(token).with_trusted_origins(trusted.iter().copied()),
    );
    state
}

fn screen_with(
    state: BrowserState,
    custom_tab_session_id: Option<&str>,
    settings: WayfarerSettings,
) -> Screen {
    let store = browser_store(state);
    let owner = active("external app browser");
    let toolbar = Arc::new(RecordingToolbar::default());
    let navigator = Arc::new(RecordingNavigator::default());
    let closed = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&closed);
    let host = ExternalAppBrowser::new(
        store.clone(),
        owner.clone(),
        custom_tab_session_id.map(SessionId::new),
        Arc::clone(&toolbar),
        Arc::clone(&navigator),
        settings,
    )
    .with_close_listener(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    Screen {
        host,
        store,
        owner,
        view: active("engine view"),
        toolbar_view: active("toolbar view"),
        toolbar,
        navigator,
        closed,
    }
}

fn initialized(url: &str, trusted: &[&str]) -> Screen {
    let screen = screen_with(
        custom_tab_state(url, trusted),
        Some("s1"),
        WayfarerSettings::default(),
    );
    let session = screen.host.initialize_ui(&screen.view, &screen.toolbar_view);
    assert_eq!(session.map(|session| session.id), Some(SessionId::new("s1")));
    screen
}

fn navigate(store: &BrowserStore, url: &str) {
    store.dispatch(BrowserAction::UpdateUrl {
        session_id: SessionId::new("s1"),
        url: url.to_owned(),
    });
}

#[test]
fn trusted_page_hides_toolbar_and_goes_full_screen() {
    let screen = initialized("https://mozilla.com/page", &[TRUSTED]);

    assert_eq!(screen.decisions(), vec![false]);
    assert!(screen.host.in_full_screen());
    assert_eq!(screen.host.layout_margins(), (0, 0));
    assert!(screen.host.has_custom_tabs_integration());
    assert!(screen.host.has_toolbar_feature());
    assert!(screen.host.is_consuming());
}

#[test]
fn leaving_trusted_scope_shows_toolbar_once() {
    let screen = initialized("https://mozilla.com/page", &[TRUSTED]);

    navigate(&screen.store, "https://evil.example/");
    navigate(&screen.store, "https://evil.example/other");

    assert_eq!(screen.decisions(), vec![false, true]);
    assert!(!screen.host.in_full_screen());
    assert_eq!(screen.host.layout_margins(), (56, 0));
}

#[test]
fn trusting_origin_later_hides_toolbar() {
    let screen = initialized("https://mozilla.com/page", &[]);
    assert_eq!(screen.decisions(), vec![true]);

    screen.store.dispatch(BrowserAction::TrustOrigin {
        token: CustomTabToken::new("T1"),
        origin: TRUSTED.to_owned(),
    });

    assert_eq!(screen.decisions(), vec![true, false]);
    assert!(screen.host.in_full_screen());
}

#[test]
fn owner_deactivation_stops_all_updates() {
    let screen = initialized("https://mozilla.com/page", &[TRUSTED]);

    screen.owner.deactivate();
    navigate(&screen.store, "https://evil.example/");
    navigate(&screen.store, "https://mozilla.com/again");

    assert_eq!(screen.decisions(), vec![false]);
    assert!(!screen.host.has_custom_tabs_integration());
    assert!(!screen.host.has_toolbar_feature());
    assert!(!screen.host.is_consuming());
    assert_eq!(screen.store.observer_count(), 0);
}

#[test]
fn every_snapshot_mode_repeats_decisions() {
    let mut settings = WayfarerSettings::default();
    settings.toolbar.notify = NotifyMode::EverySnapshot;
    let state = custom_tab_state("https://mozilla.com/", &[TRUSTED]);
    let screen = screen_with(state, Some("s1"), settings);
    screen.host.initialize_ui(&screen.view, &screen.toolbar_view);

    navigate(&screen.store, "https://mozilla.com/next");

    assert_eq!(screen.decisions(), vec![false, false]);
}

#[test]
fn custom_tab_back_removes_session_and_closes() {
    let screen = initialized("https://mozilla.com/page", &[TRUSTED]);

    assert_eq!(screen.host.handle_back(), BackOutcome::Consumed("custom-tabs"));
    assert!(screen.store.current_snapshot().session(&SessionId::new("s1")).is_none());
    assert_eq!(screen.closed.load(Ordering::SeqCst), 1);

    assert!(!screen.host.on_back_pressed());
    assert_eq!(screen.closed.load(Ordering::SeqCst), 1);
}

#[test]
fn back_press_closing_the_view_tears_features_down() {
    let store = browser_store(custom_tab_state("https://mozilla.com/", &[TRUSTED]));
    let owner = active("external app browser");
    let view = active("engine view");
    let toolbar_view = active("toolbar view");
    let closing = view.clone();
    let host = ExternalAppBrowser::new(
        store.clone(),
        owner,
        Some(SessionId::new("s1")),
        Arc::new(RecordingToolbar::default()),
        Arc::new(RecordingNavigator::default()),
        WayfarerSettings::default(),
    )
    .with_close_listener(move |_| {
        closing.destroy();
    });
    host.initialize_ui(&view, &toolbar_view);

    assert!(host.on_back_pressed());
    assert!(!host.has_custom_tabs_integration());
    assert!(host.has_toolbar_feature());
}

#[test]
fn action_view_session_is_removed_on_back() {
    let mut state = BrowserState::default();
    let session = SessionRecord::new(SessionId::new("link"), "https://example.com/")
        .with_source(SessionSource::ActionView);
    state.selected_session_id = Some(session.id.clone());
    state.sessions.insert(session.id.clone(), session);
    let screen = screen_with(state, None, WayfarerSettings::default());

    let session = screen.host.initialize_ui(&screen.view, &screen.toolbar_view);
    assert!(session.is_some());
    assert!(!screen.host.has_custom_tabs_integration());
    assert!(!screen.host.has_toolbar_feature());

    assert_eq!(screen.host.handle_back(), BackOutcome::Consumed("remove-session"));
    assert!(screen.store.current_snapshot().sessions.is_empty());
    assert_eq!(screen.closed.load(Ordering::SeqCst), 1);
}

#[test]
fn internal_session_leaves_back_to_host_default() {
    let mut state = BrowserState::default();
    let session = SessionRecord::new(SessionId::new("tab"), "https://example.com/");
    state.selected_session_id = Some(session.id.clone());
    state.sessions.insert(session.id.clone(), session);
    let screen = screen_with(state, None, WayfarerSettings::default());
    screen.host.initialize_ui(&screen.view, &screen.toolbar_view);

    let mut defaulted = false;
    assert_eq!(
        screen.host.handle_back_or(|| defaulted = true),
        BackOutcome::Unhandled
    );
    assert!(defaulted);
    assert!(!screen.host.remove_session_if_needed());
    assert_eq!(screen.store.current_snapshot().sessions.len(), 1);
}

#[test]
fn unknown_session_wires_nothing() {
    let screen = screen_with(
        custom_tab_state("https://mozilla.com/", &[TRUSTED]),
        Some("missing"),
        WayfarerSettings::default(),
    );

    assert!(screen.host.initialize_ui(&screen.view, &screen.toolbar_view).is_none());
    assert!(!screen.host.has_custom_tabs_integration());
    assert!(!screen.host.is_consuming());
    assert_eq!(screen.store.observer_count(), 0);
    assert!(screen.decisions().is_empty());
}

#[test]
fn recreated_views_rewire_without_leaking_subscriptions() {
    let screen = initialized("https://mozilla.com/page", &[TRUSTED]);

    screen.toolbar_view.destroy();
    screen.view.destroy();
    assert!(!screen.host.has_toolbar_feature());
    assert!(!screen.host.has_custom_tabs_integration());

    let view = active("engine view 2");
    let toolbar_view = active("toolbar view 2");
    screen.host.initialize_ui(&view, &toolbar_view);
    screen.host.initialize_ui(&view, &toolbar_view);

    assert!(screen.host.has_toolbar_feature());
    assert!(screen.host.has_custom_tabs_integration());
    assert_eq!(screen.store.observer_count(), 1);
    assert_eq!(screen.owner.binding_count(), 1);
    assert_eq!(screen.decisions(), vec![false, false, false]);
}

#[test]
fn toolbar_view_loss_keeps_last_layout() {
    let screen = initialized("https://mozilla.com/page", &[TRUSTED]);

    screen.toolbar_view.deactivate();
    navigate(&screen.store, "https://evil.example/");

    assert_eq!(screen.decisions(), vec![false]);
    assert!(screen.host.is_consuming());
}

#[test]
fn navigation_carries_session_flags_and_gravity() {
    let screen = initialized("https://mozilla.com/page", &[TRUSTED]);
    screen.store.dispatch(BrowserAction::UpdateSecurity {
        session_id: SessionId::new("s1"),
        secure: true,
    });
    let Some(session) = screen.host.session() else {
        panic!("session s1 missing");
    };

    screen
        .host
        .nav_to_quick_settings_sheet(&session, Some(SitePermissions::new(TRUSTED)));
    screen.host.nav_to_tracking_protection_panel(&session);

    let calls = screen.navigator.calls.lock();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|(from, _)| *from == ScreenId::ExternalAppBrowser));
    assert_eq!(
        calls[0].1,
        Directions::QuickSettingsSheet {
            session_id: SessionId::new("s1"),
            url: "https://mozilla.com/page".to_owned(),
            is_secured: true,
            is_tracking_protection_on: true,
            site_permissions: Some(SitePermissions::new(TRUSTED)),
            gravity: Gravity::Top,
        }
    );
    assert_eq!(
        calls[1].1,
        Directions::TrackingProtectionPanel {
            session_id: SessionId::new("s1"),
            url: "https://mozilla.com/page".to_owned(),
            tracking_protection_enabled: true,
            gravity: Gravity::Top,
        }
    );
}

#[test]
fn configured_toolbar_height_sets_engine_margins() {
    let mut settings = WayfarerSettings::default();
    settings.toolbar.height_px = 64;
    let state = custom_tab_state("https://evil.example/", &[TRUSTED]);
    let screen = screen_with(state, Some("s1"), settings);
    screen.host.initialize_ui(&screen.view, &screen.toolbar_view);

    assert_eq!(screen.host.engine_margins(), (64, 0));
    assert_eq!(screen.host.layout_margins(), (64, 0));
    assert_eq!(screen.host.layout_gravity(), Gravity::Top);
}

#[test]
fn custom_tab_branding_reaches_toolbar_on_initialize() {
    let mut state = custom_tab_state("https://mozilla.com/page", &[TRUSTED]);
    let token = CustomTabToken::new("T1");
    let branding = DisplayOptions {
        toolbar_color: Some(0x0020_2340),
        title: Some("Partner".to_owned()),
        show_share_menu_item: true,
        enable_url_bar_hiding: false,
    };
    if let Some(record) = state.custom_tabs.get_mut(&token) {
        record.options = branding.clone();
    }
    let screen = screen_with(state, Some("s1"), WayfarerSettings::default());

    screen.host.initialize_ui(&screen.view, &screen.toolbar_view);

    assert_eq!(*screen.toolbar.branding.lock(), vec![branding]);
    assert_eq!(screen.decisions(), vec![false]);
}
