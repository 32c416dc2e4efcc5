//! Runtime bridge between UI command queue and backend event intake.

use std::{thread, time::Duration};

use client_core::{reduce, CrmClient, CustomerApi, DashboardLoader, FilterState};
use crossbeam_channel::{Receiver, Sender};

use crate::{
    backend_bridge::commands::BackendCommand,
    config::Settings,
    controller::events::{UiError, UiEvent},
};

pub fn launch(
    settings: Settings,
    initial: FilterState,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let client = match CrmClient::with_timeout(&settings.api_url, settings.request_timeout()) {
            Ok(client) => client,
            Err(err) => {
                tracing::error!(api_url = %settings.api_url, "failed to build api client: {err}");
                let _ = ui_tx.send(UiEvent::Error(UiError::startup(format!(
                    "invalid api url '{}': {err}",
                    settings.api_url
                ))));
                return;
            }
        };
        tracing::info!(api_url = %client.base_url(), "backend: api client ready");
        run_worker(client, settings.search_debounce(), initial, cmd_rx, ui_tx);
    })
}

/// Runs the filter/fetch loop on the current thread until the command queue
/// closes or a shutdown command arrives.
pub fn run_worker<A: CustomerApi>(
    api: A,
    debounce: Duration,
    initial: FilterState,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) {
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            let _ = ui_tx.send(UiEvent::Error(UiError::startup(format!(
                "failed to build runtime: {err}"
            ))));
            tracing::error!("failed to build backend runtime: {err}");
            return;
        }
    };

    runtime.block_on(async move {
        let loader = DashboardLoader::new(api).with_debounce(debounce);

        let mut updates = loader.subscribe();
        let forward_tx = ui_tx.clone();
        let forwarder = tokio::spawn(async move {
            while updates.changed().await.is_ok() {
                let state = updates.borrow_and_update().clone();
                if forward_tx.send(UiEvent::Loaded(state)).is_err() {
                    break;
                }
            }
        });

        let _ = ui_tx.send(UiEvent::Info("Backend worker ready".to_string()));
        let mut filters = initial;
        let _ = ui_tx.send(UiEvent::FiltersChanged(filters.clone()));
        loader.refresh(filters.clone()).await;

        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                BackendCommand::Apply(action) => {
                    tracing::info!(?action, "backend: apply filter action");
                    let next = reduce(filters.clone(), action);
                    if next == filters {
                        // Resubmitting the same filters retries a failed load.
                        if loader.snapshot().await.error.is_none() {
                            tracing::debug!("backend: filters unchanged; skipping fetch");
                            continue;
                        }
                        tracing::info!("backend: filters unchanged; retrying failed load");
                    } else {
                        filters = next;
                        let _ = ui_tx.send(UiEvent::FiltersChanged(filters.clone()));
                    }
                    loader.refresh(filters.clone()).await;
                }
                BackendCommand::Refresh => {
                    tracing::info!("backend: refresh");
                    loader.refresh(filters.clone()).await;
                }
                BackendCommand::Shutdown => {
                    tracing::info!("backend: shutdown");
                    break;
                }
            }
        }

        forwarder.abort();
    });
}

#[cfg(test)]
#[path = "tests/runtime_tests.rs"]
mod tests;
