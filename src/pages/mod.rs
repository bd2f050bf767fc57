//! Page components. Each page owns its fetches and renders to plain text.

pub mod config;
pub mod home;
pub mod stats;

pub use config::{ConfigDraft, ConfigField, ConfigPage};
pub use home::HomePage;
pub use stats::StatsPage;

use crate::fetch::{FetchPhase, FetchState, UNKNOWN_ERROR};

pub trait PageView {
    /// Current page body. Pages that mirror fetched data into local state do so here.
    fn render(&mut self) -> String;
    fn refetch(&self);
}

/// Substitute the whole body with `Loading...` or `Error: ...` until data is available.
pub(crate) fn render_state<T>(state: &FetchState<T>, body: impl FnOnce(&T) -> String) -> String {
    match state.phase() {
        FetchPhase::Loading => "Loading...".to_string(),
        FetchPhase::Error => format!("Error: {}", state.error.as_deref().unwrap_or(UNKNOWN_ERROR)),
        FetchPhase::Success => state.data.as_ref().map(body).unwrap_or_default(),
        FetchPhase::Idle => String::new(),
    }
}
