//! Backend-to-UI events and error modeling for the dashboard controller.

use client_core::{
    loader::{LoadError, LoadErrorSource},
    FetchErrorKind, FilterState, LoadState,
};

pub enum UiEvent {
    Info(String),
    FiltersChanged(FilterState),
    Loaded(LoadState),
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Configuration,
    Transport,
    Server,
    Decode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Customers,
    Stats,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn startup(message: impl Into<String>) -> Self {
        Self {
            category: UiErrorCategory::Configuration,
            context: UiErrorContext::BackendStartup,
            message: message.into(),
        }
    }

    pub fn from_load_error(err: &LoadError) -> Self {
        let category = match err.kind {
            FetchErrorKind::InvalidUrl => UiErrorCategory::Configuration,
            FetchErrorKind::Transport => UiErrorCategory::Transport,
            FetchErrorKind::Status => UiErrorCategory::Server,
            FetchErrorKind::Decode => UiErrorCategory::Decode,
        };
        let context = match err.source {
            LoadErrorSource::Customers => UiErrorContext::Customers,
            LoadErrorSource::Stats => UiErrorContext::Stats,
        };
        Self {
            category,
            context,
            message: err.message.clone(),
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// One-line description shown under the dashboard.
    pub fn summary(&self) -> String {
        let what = match self.context {
            UiErrorContext::BackendStartup => "Backend worker failed to start",
            UiErrorContext::Customers => "Could not load customers",
            UiErrorContext::Stats => "Could not load statistics",
        };
        let hint = match self.category {
            UiErrorCategory::Configuration => "check the api_url setting",
            UiErrorCategory::Transport => "API unreachable; check the URL or network, then `refresh`",
            UiErrorCategory::Server => "the API rejected the request; `refresh` to retry",
            UiErrorCategory::Decode => "unexpected response from the API; `refresh` to retry",
        };
        format!("{what}: {} ({hint})", self.message)
    }
}
