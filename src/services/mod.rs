mod config_screen;
pub mod reconciler;
pub mod version_check;

pub use config_screen::{ConfigScreen, RenderedForm, ScreenError, ScreenOutcome};
pub use reconciler::{ConfigReconciler, Decision, FormState};
pub use version_check::{
    DEFAULT_FEED_URL, VersionCheckError, VersionChecker, VersionOutcome, VersionStatus, parse_feed,
};
