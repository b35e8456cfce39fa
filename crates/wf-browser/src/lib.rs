//! Wayfarer's custom-tab host screen.
//!
//! [`ExternalAppBrowser`] ties the store, the screen and view lifecycles, the
//! trusted-scope toolbar feature and back navigation together, with settings
//! loaded from `$HOME/.wayfarer/settings.json`.

mod custom_tabs;
mod host;
mod layout;
pub mod navigation;
pub mod settings;

#[cfg(test)]
mod tests;

pub use custom_tabs::CloseListener;
pub use custom_tabs::CustomTabsIntegration;
pub use host::ExternalAppBrowser;
pub use navigation::Directions;
pub use navigation::Gravity;
pub use navigation::Navigator;
pub use navigation::ScreenId;
pub use navigation::SitePermissions;
pub use settings::SettingsError;
pub use settings::WayfarerSettings;
