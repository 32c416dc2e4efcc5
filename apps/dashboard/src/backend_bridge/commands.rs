//! Backend commands queued from UI to backend worker.

use client_core::FilterAction;

#[derive(Debug)]
pub enum BackendCommand {
    Apply(FilterAction),
    Refresh,
    Shutdown,
}
