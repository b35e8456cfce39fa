use parking_lot::Mutex;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use wf_browser::Directions;
use wf_browser::ExternalAppBrowser;
use wf_browser::Navigator;
use wf_browser::ScreenId;
use wf_browser::SitePermissions;
use wf_browser::WayfarerSettings;
use wf_core::SessionId;
use wf_feature::BackOutcome;
use wf_lifecycle::Lifecycle;
use wf_store::BrowserAction;
use wf_store::BrowserState;
use wf_store::DisplayOptions;
use wf_store::browser_store;
use wf_toolbar::ToolbarController;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read scenario: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse scenario: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Settings(#[from] wf_browser::SettingsError),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    #[serde(default)]
    pub custom_tab_session_id: Option<SessionId>,
    #[serde(default)]
    pub initial_state: BrowserState,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    Dispatch { action: BrowserAction },
    Lifecycle { target: Target, event: LifecycleEvent },
    Initialize,
    Back,
    QuickSettings {
        #[serde(default)]
        site_permissions: Option<SitePermissions>,
    },
    TrackingProtection,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Owner,
    View,
    Toolbar,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    Activate,
    Deactivate,
    Destroy,
}

type Transcript = Arc<Mutex<Vec<String>>>;

struct PrintingToolbar {
    transcript: Transcript,
}

impl ToolbarController for PrintingToolbar {
    fn set_visible(&self, visible: bool) {
        self.transcript.lock().push(format!("toolbar visible={visible}"));
    }

    fn apply_display_options(&self, options: &DisplayOptions) {
        let color = options
            .toolbar_color
            .map_or_else(|| "-".to_owned(), |color| format!("{color:#08x}"));
        self.transcript.lock().push(format!(
            "toolbar branding title={} color={color} share={} url_bar_hiding={}",
            options.title.as_deref().unwrap_or("-"),
            options.show_share_menu_item,
            options.enable_url_bar_hiding,
        ));
    }
}

struct PrintingNavigator {
    transcript: Transcript,
}

impl Navigator for PrintingNavigator {
    fn navigate_to(&self, from: ScreenId, directions: Directions) {
        let rendered =
            serde_json::to_string(&directions).unwrap_or_else(|error| error.to_string());
        self.transcript.lock().push(format!(
            "navigate from={from:?} session={} {rendered}",
            directions.session_id()
        ));
    }
}

/// Runs `scenario` with the screen's owner and views initially active and
/// returns one line per observable event.
pub fn replay(scenario: &Scenario, settings: WayfarerSettings) -> Vec<String> {
    let transcript: Transcript = Arc::new(Mutex::new(Vec::new()));
    let store = browser_store(scenario.initial_state.clone());
    let owner = Lifecycle::new("external-app-browser");
    let view = Lifecycle::new("engine-view");
    let toolbar_view = Lifecycle::new("toolbar-view");
    for lifecycle in [&owner, &view, &toolbar_view] {
        lifecycle.activate();
    }

    let closed = Arc::clone(&transcript);
    let host = ExternalAppBrowser::new(
        store.clone(),
        owner.clone(),
        scenario.custom_tab_session_id.clone(),
        Arc::new(PrintingToolbar {
            transcript: Arc::clone(&transcript),
        }),
        PrintingNavigator {
            transcript: Arc::clone(&transcript),
        },
        settings,
    )
    .with_close_listener(move |session_id| {
        closed.lock().push(format!("closed session={session_id}"));
    });

    for (index, step) in scenario.steps.iter().enumerate() {
        debug!(index, ?step, "replaying step");
        match step {
            Step::Dispatch { action } => store.dispatch(action.clone()),
            Step::Lifecycle { target, event } => {
                let lifecycle = match target {
                    Target::Owner => &owner,
                    Target::View => &view,
                    Target::Toolbar => &toolbar_view,
                };
                match event {
                    LifecycleEvent::Activate => lifecycle.activate(),
                    LifecycleEvent::Deactivate => lifecycle.deactivate(),
                    LifecycleEvent::Destroy => lifecycle.destroy(),
                };
            }
            Step::Initialize => {
                let line = match host.initialize_ui(&view, &toolbar_view) {
                    Some(session) => format!("initialize session={}", session.id),
                    None => "initialize skipped".to_owned(),
                };
                transcript.lock().push(line);
            }
            Step::Back => {
                let line = match host.handle_back() {
                    BackOutcome::Consumed(by) => format!("back consumed by={by}"),
                    BackOutcome::Unhandled => "back unhandled".to_owned(),
                };
                transcript.lock().push(line);
            }
            Step::QuickSettings { site_permissions } => match host.session() {
                Some(session) => {
                    host.nav_to_quick_settings_sheet(&session, site_permissions.clone());
                }
                None => transcript.lock().push("navigate skipped".to_owned()),
            },
            Step::TrackingProtection => match host.session() {
                Some(session) => host.nav_to_tracking_protection_panel(&session),
                None => transcript.lock().push("navigate skipped".to_owned()),
            },
        }
    }

    transcript.lock().clone()
}

pub fn parse_scenario(json: &str) -> Result<Scenario, ReplayError> {
    Ok(serde_json::from_str(json)?)
}
