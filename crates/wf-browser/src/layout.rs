use crate::navigation::Gravity;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;
use wf_toolbar::ToolbarController;

#[derive(Debug)]
struct LayoutState {
    in_full_screen: bool,
    toolbar_height_px: u32,
    gravity: Gravity,
}

/// Engine view placement around the toolbar.
#[derive(Debug, Clone)]
pub(crate) struct BrowserLayout {
    state: Arc<Mutex<LayoutState>>,
}

impl BrowserLayout {
    pub(crate) fn new(toolbar_height_px: u32, gravity: Gravity) -> Self {
        Self {
            state: Arc::new(Mutex::new(LayoutState {
                in_full_screen: false,
                toolbar_height_px,
                gravity,
            })),
        }
    }

    pub(crate) fn in_full_screen(&self) -> bool {
        self.state.lock().in_full_screen
    }

    pub(crate) fn set_full_screen(&self, in_full_screen: bool) {
        let mut state = self.state.lock();
        if state.in_full_screen != in_full_screen {
            debug!(in_full_screen, "layout margins updated");
        }
        state.in_full_screen = in_full_screen;
    }

    /// Top and bottom margins reserved for the toolbar.
    pub(crate) fn engine_margins(&self) -> (u32, u32) {
        (self.state.lock().toolbar_height_px, 0)
    }

    pub(crate) fn margins(&self) -> (u32, u32) {
        if self.in_full_screen() {
            (0, 0)
        } else {
            self.engine_margins()
        }
    }

    pub(crate) fn gravity(&self) -> Gravity {
        self.state.lock().gravity
    }
}

/// Forwards toolbar decisions and flips the layout into full screen while the
/// toolbar is hidden.
pub(crate) struct LayoutToolbar<T: ?Sized> {
    inner: Arc<T>,
    layout: BrowserLayout,
}

impl<T: ToolbarController + ?Sized> LayoutToolbar<T> {
    pub(crate) fn new(inner: Arc<T>, layout: BrowserLayout) -> Self {
        Self { inner, layout }
    }
}

impl<T: ToolbarController + ?Sized> ToolbarController for LayoutToolbar<T> {
    fn set_visible(&self, visible: bool) {
        self.inner.set_visible(visible);
        self.layout.set_full_screen(!visible);
    }
}
