use super::*;
use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use shared::{domain::CustomerId, protocol::Page};
use std::collections::HashMap;
use tokio::sync::oneshot;
use uuid::Uuid;

type PageResult = Result<Page<CustomerSummary>, FetchError>;

enum Scripted {
    Ready(PageResult),
    Gated(oneshot::Receiver<PageResult>),
}

/// Fake API keyed by the search text of each request.
#[derive(Default)]
struct ScriptedApi {
    responses: Mutex<HashMap<String, Scripted>>,
    stats: Mutex<Option<CustomerStats>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedApi {
    async fn ready(&self, search: &str, result: PageResult) {
        self.responses
            .lock()
            .await
            .insert(search.to_string(), Scripted::Ready(result));
    }

    async fn gated(&self, search: &str) -> oneshot::Sender<PageResult> {
        let (tx, rx) = oneshot::channel();
        self.responses
            .lock()
            .await
            .insert(search.to_string(), Scripted::Gated(rx));
        tx
    }

    async fn set_stats(&self, stats: Option<CustomerStats>) {
        *self.stats.lock().await = stats;
    }
}

#[async_trait]
impl CustomerApi for ScriptedApi {
    async fn fetch_customers(&self, filters: &FilterState) -> PageResult {
        self.calls.lock().await.push(filters.search.clone());
        let scripted = self.responses.lock().await.remove(&filters.search);
        match scripted {
            Some(Scripted::Ready(result)) => result,
            Some(Scripted::Gated(rx)) => rx.await.unwrap_or_else(|_| Err(status_error(503))),
            None => Err(status_error(404)),
        }
    }

    async fn fetch_stats(&self) -> Result<CustomerStats, FetchError> {
        self.stats.lock().await.ok_or_else(|| status_error(500))
    }
}

fn status_error(status: u16) -> FetchError {
    FetchError::Status { status, body: None }
}

fn customer(full_name: &str) -> CustomerSummary {
    CustomerSummary {
        id: CustomerId(Uuid::new_v4()),
        full_name: full_name.to_string(),
        email: format!("{}@example.com", full_name.to_lowercase().replace(' ', ".")),
        birthday_formatted: "February 05".to_string(),
        company_name: "Acme".to_string(),
        sales_rep_name: None,
        last_interaction_info: None,
        date_of_birth: NaiveDate::from_ymd_opt(1990, 2, 5).expect("date"),
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap(),
    }
}

fn page(names: &[&str], count: u64) -> Page<CustomerSummary> {
    Page {
        count,
        next: (count > names.len() as u64).then(|| "http://api/customers/?page=2".to_string()),
        previous: None,
        results: names.iter().map(|name| customer(name)).collect(),
    }
}

fn stats() -> CustomerStats {
    CustomerStats {
        total_customers: 120,
        birthday_this_week: 3,
        birthday_this_month: 11,
    }
}

fn search(text: &str) -> FilterState {
    FilterState::default().set_search_text(text)
}

fn names(state: &LoadState) -> Vec<&str> {
    state
        .customers
        .iter()
        .map(|customer| customer.full_name.as_str())
        .collect()
}

#[tokio::test]
async fn starts_in_loading_state() {
    let loader = DashboardLoader::new(ScriptedApi::default());
    let state = loader.snapshot().await;
    assert!(state.loading);
    assert!(state.customers.is_empty());
    assert_eq!(state.stats, None);
}

#[tokio::test]
async fn refresh_populates_customers_and_stats() {
    let api = Arc::new(ScriptedApi::default());
    api.ready("", Ok(page(&["Ana Torres", "Bob Lee"], 42))).await;
    api.set_stats(Some(stats())).await;
    let loader = DashboardLoader::new(Arc::clone(&api));

    let generation = loader.refresh(FilterState::default()).await;
    assert_eq!(generation, 1);

    let state = loader
        .wait_until(|state| !state.loading && state.stats.is_some())
        .await;
    assert_eq!(names(&state), vec!["Ana Torres", "Bob Lee"]);
    assert_eq!(state.total_count, 42);
    assert!(state.has_next);
    assert!(!state.has_previous);
    assert_eq!(state.stats, Some(stats()));
    assert_eq!(state.error, None);
    assert_eq!(state.generation, 1);
}

#[tokio::test]
async fn failed_customer_fetch_keeps_previous_results() {
    let api = Arc::new(ScriptedApi::default());
    api.ready("", Ok(page(&["Ana Torres"], 1))).await;
    api.ready("broken", Err(status_error(500))).await;
    api.set_stats(Some(stats())).await;
    let loader = DashboardLoader::new(Arc::clone(&api));

    loader.refresh(FilterState::default()).await;
    loader.wait_idle().await;

    loader.refresh(search("broken")).await;
    let state = loader.wait_idle().await;

    assert!(!state.loading);
    assert_eq!(names(&state), vec!["Ana Torres"]);
    assert_eq!(state.total_count, 1);
    let error = state.error.expect("error surfaced");
    assert_eq!(error.source, LoadErrorSource::Customers);
    assert_eq!(error.kind, FetchErrorKind::Status);
    assert!(error.message.contains("500"), "{}", error.message);
}

#[tokio::test]
async fn successful_refresh_clears_customer_error() {
    let api = Arc::new(ScriptedApi::default());
    api.ready("broken", Err(status_error(502))).await;
    api.ready("ana", Ok(page(&["Ana Torres"], 1))).await;
    api.set_stats(Some(stats())).await;
    let loader = DashboardLoader::new(Arc::clone(&api));

    loader.refresh(search("broken")).await;
    assert!(loader.wait_idle().await.error.is_some());

    loader.refresh(search("ana")).await;
    let state = loader.wait_idle().await;
    assert_eq!(state.error, None);
    assert_eq!(names(&state), vec!["Ana Torres"]);
}

#[tokio::test]
async fn latest_request_wins_when_earlier_one_resolves_last() {
    let api = Arc::new(ScriptedApi::default());
    let request_a = api.gated("a").await;
    let request_b = api.gated("b").await;
    api.set_stats(Some(stats())).await;
    let loader = DashboardLoader::new(Arc::clone(&api));

    loader.refresh(search("a")).await;
    loader.refresh(search("b")).await;

    let _ = request_b.send(Ok(page(&["Bea"], 1)));
    let state = loader.wait_idle().await;
    assert_eq!(names(&state), vec!["Bea"]);

    // A settles after B; its task was superseded, so nothing changes.
    let _ = request_a.send(Ok(page(&["Abe"], 1)));
    tokio::time::sleep(Duration::from_millis(20)).await;

    let state = loader.snapshot().await;
    assert_eq!(names(&state), vec!["Bea"]);
    assert_eq!(state.generation, 2);
    assert!(!state.loading);
}

#[tokio::test]
async fn superseded_request_does_not_clear_loading() {
    let api = Arc::new(ScriptedApi::default());
    let request_a = api.gated("a").await;
    let request_b = api.gated("b").await;
    api.set_stats(Some(stats())).await;
    let loader = DashboardLoader::new(Arc::clone(&api));

    loader.refresh(search("a")).await;
    loader.refresh(search("b")).await;

    let _ = request_a.send(Err(status_error(500)));
    tokio::time::sleep(Duration::from_millis(20)).await;

    let state = loader.snapshot().await;
    assert!(state.loading);
    assert_eq!(state.error, None);

    let _ = request_b.send(Ok(page(&["Bea"], 1)));
    let state = loader.wait_idle().await;
    assert_eq!(names(&state), vec!["Bea"]);
}

#[tokio::test]
async fn stats_failure_is_surfaced_without_touching_customers() {
    let api = Arc::new(ScriptedApi::default());
    api.ready("", Ok(page(&["Ana Torres"], 1))).await;
    let loader = DashboardLoader::new(Arc::clone(&api));

    loader.refresh(FilterState::default()).await;
    let state = loader
        .wait_until(|state| !state.loading && state.error.is_some())
        .await;

    assert_eq!(names(&state), vec!["Ana Torres"]);
    assert_eq!(state.stats, None);
    let error = state.error.expect("stats error");
    assert_eq!(error.source, LoadErrorSource::Stats);
}

#[tokio::test]
async fn debounce_skips_superseded_requests() {
    let api = Arc::new(ScriptedApi::default());
    api.ready("an", Ok(page(&["Ana Torres"], 1))).await;
    api.ready("ana", Ok(page(&["Ana Torres"], 1))).await;
    api.set_stats(Some(stats())).await;
    let loader =
        DashboardLoader::new(Arc::clone(&api)).with_debounce(Duration::from_millis(50));

    loader.refresh(search("an")).await;
    loader.refresh(search("ana")).await;
    loader.wait_idle().await;

    assert_eq!(*api.calls.lock().await, vec!["ana".to_string()]);
}

#[tokio::test]
async fn every_refresh_fetches_stats_again() {
    let api = Arc::new(ScriptedApi::default());
    api.ready("", Ok(page(&["Ana Torres"], 1))).await;
    api.ready("x", Ok(page(&[], 0))).await;
    api.set_stats(Some(stats())).await;
    let loader = DashboardLoader::new(Arc::clone(&api));

    loader.refresh(FilterState::default()).await;
    loader
        .wait_until(|state| !state.loading && state.stats.is_some())
        .await;

    let updated = CustomerStats {
        total_customers: 121,
        ..stats()
    };
    api.set_stats(Some(updated)).await;
    loader.refresh(search("x")).await;
    let state = loader
        .wait_until(|state| !state.loading && state.stats == Some(updated))
        .await;

    assert!(state.customers.is_empty());
    assert_eq!(state.total_count, 0);
}

/// Customer fetches blow up inside the implementation; stats still answer.
struct PanickingApi;

#[async_trait]
impl CustomerApi for PanickingApi {
    async fn fetch_customers(&self, _filters: &FilterState) -> PageResult {
        panic!("customer decoder blew up")
    }

    async fn fetch_stats(&self) -> Result<CustomerStats, FetchError> {
        Ok(stats())
    }
}

#[tokio::test]
async fn panicking_customer_fetch_still_clears_loading() {
    let loader = DashboardLoader::new(PanickingApi);

    loader.refresh(FilterState::default()).await;
    let state = tokio::time::timeout(Duration::from_millis(500), loader.wait_idle())
        .await
        .expect("loading cleared after the customer task ended");

    assert!(!state.loading);
    assert!(state.customers.is_empty());
    assert_eq!(state.generation, 1);
}

#[tokio::test]
async fn aborted_fetch_leaves_loading_to_the_newer_generation() {
    let api = Arc::new(ScriptedApi::default());
    let _request_a = api.gated("a").await;
    let request_b = api.gated("b").await;
    api.set_stats(Some(stats())).await;
    let loader = DashboardLoader::new(Arc::clone(&api));

    loader.refresh(search("a")).await;
    tokio::time::sleep(Duration::from_millis(10)).await;
    loader.refresh(search("b")).await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(loader.snapshot().await.loading);

    let _ = request_b.send(Ok(page(&["Bea"], 1)));
    let state = loader.wait_idle().await;
    assert_eq!(names(&state), vec!["Bea"]);
}
