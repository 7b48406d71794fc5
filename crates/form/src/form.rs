//! Form state and the debounced name validator
//!
//! The raw name is fed into a `Debouncer`; a background validator task
//! watches the settled name and is the only caller of
//! `check_name_available`. A reply is applied only while it still
//! describes the current form: a newer settled name cancels the in-flight
//! check, and `clear()` invalidates any reply that is already on its way.

use crate::api::{ApiError, FormApi};
use crate::records::{Record, RecordTable};
use debounce::{DebounceError, Debouncer, Phase};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Fallback re-check period for `wait_validated`
const WAIT_POLL: Duration = Duration::from_millis(10);

/// Form errors
#[derive(Debug, Error)]
pub enum FormError {
    #[error("name is required")]
    EmptyName,

    #[error("a location must be selected")]
    NoLocation,

    #[error("name '{0}' has already been taken")]
    NameTaken(String),

    #[error("unknown location: '{0}'")]
    UnknownLocation(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Debounce(#[from] DebounceError),
}

/// Availability of the settled name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NameStatus {
    /// Nothing to check (empty name, or form just cleared)
    Unchecked,
    /// A check is in flight
    Checking,
    Available,
    Taken,
    /// The last check failed
    Unavailable,
}

/// Read-only copy of the form for rendering
#[derive(Debug, Clone, Serialize)]
pub struct FormSnapshot {
    pub name: String,
    pub debounced_name: String,
    pub selected_location: Option<String>,
    pub locations: Vec<String>,
    pub name_status: NameStatus,
    pub records: Vec<Record>,
}

impl FormSnapshot {
    /// Whether `add()` would currently be accepted
    pub fn can_add(&self) -> bool {
        !self.name.trim().is_empty()
            && self.selected_location.is_some()
            && self.name_status != NameStatus::Taken
    }
}

struct FormState {
    name: String,
    selected_location: Option<String>,
    locations: Vec<String>,
    status: NameStatus,
    /// Settled name the current status was computed for
    checked_name: Option<String>,
    /// Bumped by `clear()`; replies from an older epoch are dropped
    epoch: u64,
}

struct Inner {
    api: Arc<dyn FormApi>,
    state: RwLock<FormState>,
    /// Revision counter, bumped on every validator transition
    progress: watch::Sender<u64>,
}

impl Inner {
    /// Whether the recorded status is final and describes `name`
    fn is_current(&self, name: &str) -> bool {
        let state = self.state.read();
        state.status != NameStatus::Checking && state.checked_name.as_deref() == Some(name)
    }

    fn set_status(&self, status: NameStatus, checked_name: Option<String>) {
        {
            let mut state = self.state.write();
            state.status = status;
            state.checked_name = checked_name;
        }
        self.progress.send_modify(|rev| *rev += 1);
    }
}

/// Name + location form backed by a `FormApi`
pub struct NameForm {
    inner: Arc<Inner>,
    debouncer: Debouncer<String>,
    records: RecordTable,
    validator: JoinHandle<()>,
}

impl NameForm {
    /// Create an empty form
    ///
    /// Must be called from within a tokio runtime; the validator task and
    /// the debounce timer both run on it.
    pub fn new(api: Arc<dyn FormApi>, delay: Duration) -> crate::Result<Self> {
        let runtime = Handle::try_current().map_err(|_| DebounceError::ResourceExhausted)?;

        let debouncer = Debouncer::new(String::new(), delay);
        let (progress, _) = watch::channel(0u64);
        let inner = Arc::new(Inner {
            api,
            state: RwLock::new(FormState {
                name: String::new(),
                selected_location: None,
                locations: Vec::new(),
                status: NameStatus::Unchecked,
                checked_name: None,
                epoch: 0,
            }),
            progress,
        });

        let validator = runtime.spawn(run_validator(
            inner.clone(),
            debouncer.subscribe(),
            debouncer.commits(),
        ));

        Ok(Self {
            inner,
            debouncer,
            records: RecordTable::new(),
            validator,
        })
    }

    /// Fetch the location list and make it selectable
    pub async fn load_locations(&self) -> crate::Result<Vec<String>> {
        let locations = self.inner.api.fetch_locations().await?;
        debug!(count = locations.len(), "Loaded locations");
        self.inner.state.write().locations = locations.clone();
        Ok(locations)
    }

    /// Set the raw name (one keystroke)
    ///
    /// Only the debounced value reaches the API.
    pub fn set_name(&self, name: &str) -> crate::Result<()> {
        self.debouncer.update(name.to_string())?;
        self.inner.state.write().name = name.to_string();
        Ok(())
    }

    /// Change the debounce delay; re-arms the timer for the current name
    pub fn set_delay(&self, delay: Duration) -> crate::Result<()> {
        let name = self.inner.state.read().name.clone();
        self.debouncer.observe(name, delay)?;
        Ok(())
    }

    /// Current debounce delay
    pub fn delay(&self) -> Duration {
        self.debouncer.delay()
    }

    /// Select one of the loaded locations
    pub fn select_location(&self, location: &str) -> crate::Result<()> {
        let mut state = self.inner.state.write();
        match state.locations.iter().find(|l| l.as_str() == location) {
            Some(found) => {
                state.selected_location = Some(found.clone());
                Ok(())
            }
            None => Err(FormError::UnknownLocation(location.to_string())),
        }
    }

    /// Reset name, location and status
    ///
    /// If a commit is still pending, the status is left unattributed so the
    /// validator re-checks whatever name that commit settles on, even when
    /// it equals the name settled before the clear.
    pub fn clear(&self) -> crate::Result<()> {
        self.debouncer.update(String::new())?;
        {
            let mut state = self.inner.state.write();
            state.name.clear();
            state.selected_location = None;
            state.epoch += 1;
            state.status = NameStatus::Unchecked;
            state.checked_name = match self.debouncer.phase() {
                Phase::Idle => Some(self.debouncer.settled()),
                Phase::Pending | Phase::Disposed => None,
            };
        }
        self.inner.progress.send_modify(|rev| *rev += 1);
        Ok(())
    }

    /// Submit the current name/location as a new record
    ///
    /// Rejected when the name is empty, no location is selected, or the
    /// name is known to be taken. On success the form is cleared.
    pub fn add(&self) -> crate::Result<Record> {
        let record = {
            let state = self.inner.state.read();
            let name = state.name.trim();
            if name.is_empty() {
                return Err(FormError::EmptyName);
            }
            let location = state
                .selected_location
                .as_ref()
                .ok_or(FormError::NoLocation)?;
            if state.status == NameStatus::Taken {
                return Err(FormError::NameTaken(name.to_string()));
            }
            Record::new(name, location.clone())
        };

        let row = self.records.push(record.clone());
        info!(id = %record.id, row, name = %record.name, location = %record.location, "Record added");

        self.clear()?;
        Ok(record)
    }

    /// Current status of the settled name
    pub fn name_status(&self) -> NameStatus {
        self.inner.state.read().status
    }

    /// Submitted records in insertion order
    pub fn records(&self) -> Vec<Record> {
        self.records.all()
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Copy of the full form state
    pub fn snapshot(&self) -> FormSnapshot {
        let state = self.inner.state.read();
        FormSnapshot {
            name: state.name.clone(),
            debounced_name: self.debouncer.settled(),
            selected_location: state.selected_location.clone(),
            locations: state.locations.clone(),
            name_status: state.status,
            records: self.records.all(),
        }
    }

    /// Wait until the name has settled and its status is final
    pub async fn wait_validated(&self) -> NameStatus {
        let mut progress = self.inner.progress.subscribe();
        loop {
            if let Some(status) = self.validated_status() {
                return status;
            }
            tokio::select! {
                _ = progress.changed() => {}
                _ = tokio::time::sleep(WAIT_POLL) => {}
            }
        }
    }

    fn validated_status(&self) -> Option<NameStatus> {
        match self.debouncer.phase() {
            Phase::Disposed => return Some(self.name_status()),
            Phase::Pending => return None,
            Phase::Idle => {}
        }

        let settled = self.debouncer.settled();
        self.inner
            .is_current(&settled)
            .then(|| self.name_status())
    }

    /// Stop the debounce timer and the validator; the form is inert afterwards
    pub fn shutdown(&self) {
        self.debouncer.dispose();
        self.validator.abort();
    }
}

impl Drop for NameForm {
    fn drop(&mut self) {
        self.validator.abort();
    }
}

/// How a single availability check ended
enum CheckOutcome {
    /// Status recorded for the checked name
    Done,
    /// Form was cleared while the reply was in flight; a commit is pending
    Stale,
    /// A newer commit replaced the checked name
    Superseded,
    /// Debouncer is gone
    Closed,
}

/// Validate settled names until the debouncer goes away
///
/// Runs on every commit rather than on value changes only: after `clear()`
/// the status no longer describes the settled name, so a commit that lands
/// on the same name has to be checked again.
async fn run_validator(
    inner: Arc<Inner>,
    settled: watch::Receiver<String>,
    mut commits: watch::Receiver<u64>,
) {
    loop {
        let name = settled.borrow().clone();

        if !inner.is_current(&name) {
            match check_name(&inner, &name, &settled, &mut commits).await {
                CheckOutcome::Superseded => continue,
                CheckOutcome::Closed => break,
                CheckOutcome::Done | CheckOutcome::Stale => {}
            }
        }

        if commits.changed().await.is_err() {
            break;
        }
    }

    debug!("Name validator stopped");
}

async fn check_name(
    inner: &Inner,
    name: &str,
    settled: &watch::Receiver<String>,
    commits: &mut watch::Receiver<u64>,
) -> CheckOutcome {
    if name.trim().is_empty() {
        inner.set_status(NameStatus::Unchecked, Some(name.to_string()));
        return CheckOutcome::Done;
    }

    let epoch = {
        let mut state = inner.state.write();
        state.status = NameStatus::Checking;
        state.checked_name = None;
        state.epoch
    };
    inner.progress.send_modify(|rev| *rev += 1);
    debug!(name = %name, "Checking name availability");

    let request = inner.api.check_name_available(name);
    tokio::pin!(request);

    let reply = loop {
        tokio::select! {
            reply = &mut request => break reply,
            changed = commits.changed() => {
                if changed.is_err() {
                    return CheckOutcome::Closed;
                }
                // A re-commit of the same name is answered by this request,
                // unless the form was cleared in between
                if *settled.borrow() != name || inner.state.read().epoch != epoch {
                    debug!(name = %name, "Name re-committed during check, superseding");
                    return CheckOutcome::Superseded;
                }
            }
        }
    };

    if inner.state.read().epoch != epoch {
        debug!(name = %name, "Discarding reply for cleared form");
        return CheckOutcome::Stale;
    }

    let status = match reply {
        Ok(true) => NameStatus::Available,
        Ok(false) => NameStatus::Taken,
        Err(e) => {
            warn!("Name check failed for '{}': {}", name, e);
            NameStatus::Unavailable
        }
    };
    inner.set_status(status, Some(name.to_string()));
    CheckOutcome::Done
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockApi, MockApiConfig};
    use tokio::time::sleep;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn mock(latency_ms: u64) -> Arc<MockApi> {
        Arc::new(MockApi::new(&MockApiConfig {
            latency_ms,
            ..MockApiConfig::default()
        }))
    }

    async fn typed(form: &NameForm, text: &str, gap: Duration) {
        let mut prefix = String::new();
        for ch in text.chars() {
            prefix.push(ch);
            form.set_name(&prefix).unwrap();
            sleep(gap).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_settled_names_are_checked() {
        let api = mock(100);
        let form = NameForm::new(api.clone(), ms(300)).unwrap();

        typed(&form, "alice", ms(50)).await;
        assert_eq!(form.wait_validated().await, NameStatus::Available);

        assert_eq!(api.checked_names(), vec!["alice"]);
        assert_eq!(form.snapshot().debounced_name, "alice");
    }

    #[tokio::test(start_paused = true)]
    async fn test_taken_name_blocks_add() {
        let api = mock(100);
        let form = NameForm::new(api, ms(300)).unwrap();
        form.load_locations().await.unwrap();

        form.set_name("invalid name").unwrap();
        form.select_location("Canada").unwrap();
        assert_eq!(form.wait_validated().await, NameStatus::Taken);

        assert!(!form.snapshot().can_add());
        assert!(matches!(form.add(), Err(FormError::NameTaken(_))));
        assert!(form.records().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_appends_record_and_clears() {
        let form = NameForm::new(mock(100), ms(300)).unwrap();
        form.load_locations().await.unwrap();

        form.set_name("bob").unwrap();
        form.select_location("USA").unwrap();
        form.wait_validated().await;

        let record = form.add().unwrap();
        assert_eq!(record.name, "bob");
        assert_eq!(record.location, "USA");

        let snapshot = form.snapshot();
        assert_eq!(snapshot.name, "");
        assert_eq!(snapshot.selected_location, None);
        assert_eq!(snapshot.name_status, NameStatus::Unchecked);
        assert_eq!(snapshot.records, vec![record]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_requires_name_and_location() {
        let form = NameForm::new(mock(0), ms(300)).unwrap();
        form.load_locations().await.unwrap();

        assert!(matches!(form.add(), Err(FormError::EmptyName)));

        form.set_name("   ").unwrap();
        assert!(matches!(form.add(), Err(FormError::EmptyName)));

        form.set_name("carol").unwrap();
        assert!(matches!(form.add(), Err(FormError::NoLocation)));

        // Add does not wait for validation
        form.select_location("Brazil").unwrap();
        assert!(form.add().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_location_is_rejected() {
        let form = NameForm::new(mock(0), ms(300)).unwrap();

        // Nothing loaded yet
        assert!(matches!(
            form.select_location("Canada"),
            Err(FormError::UnknownLocation(_))
        ));

        form.load_locations().await.unwrap();
        assert!(matches!(
            form.select_location("Atlantis"),
            Err(FormError::UnknownLocation(_))
        ));
        assert!(form.select_location("China").is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_name_supersedes_inflight_check() {
        let api = mock(500);
        let form = NameForm::new(api.clone(), ms(300)).unwrap();

        form.set_name("alice").unwrap();
        sleep(ms(350)).await;
        assert_eq!(form.name_status(), NameStatus::Checking);

        form.set_name("invalid name").unwrap();
        assert_eq!(form.wait_validated().await, NameStatus::Taken);

        // The alice reply would have landed meanwhile; it must not win
        sleep(ms(1_000)).await;
        assert_eq!(form.name_status(), NameStatus::Taken);
        assert_eq!(api.checked_names(), vec!["alice", "invalid name"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_discards_inflight_reply() {
        let form = NameForm::new(mock(100), ms(300)).unwrap();

        form.set_name("invalid name").unwrap();
        sleep(ms(350)).await;
        assert_eq!(form.name_status(), NameStatus::Checking);

        form.clear().unwrap();
        sleep(ms(100)).await;
        assert_eq!(form.name_status(), NameStatus::Unchecked);

        assert_eq!(form.wait_validated().await, NameStatus::Unchecked);
    }

    #[tokio::test(start_paused = true)]
    async fn test_outage_marks_name_unavailable() {
        let api = mock(50);
        let form = NameForm::new(api.clone(), ms(300)).unwrap();

        api.set_available(false);
        form.set_name("dave").unwrap();
        assert_eq!(form.wait_validated().await, NameStatus::Unavailable);

        api.set_available(true);
        form.set_name("dave2").unwrap();
        assert_eq!(form.wait_validated().await, NameStatus::Available);
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_locations_propagates_outage() {
        let api = mock(0);
        api.set_available(false);
        let form = NameForm::new(api, ms(300)).unwrap();

        assert!(matches!(
            form.load_locations().await,
            Err(FormError::Api(ApiError::Unavailable(_)))
        ));
        assert!(form.snapshot().locations.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_updates() {
        let api = mock(0);
        let form = NameForm::new(api.clone(), ms(300)).unwrap();

        form.set_name("erin").unwrap();
        form.shutdown();
        sleep(ms(1_000)).await;

        assert!(api.checked_names().is_empty());
        assert_eq!(form.snapshot().debounced_name, "");
        assert!(matches!(
            form.set_name("frank"),
            Err(FormError::Debounce(DebounceError::Disposed))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_delay_rearms_current_name() {
        let api = mock(0);
        let form = NameForm::new(api.clone(), ms(1_000)).unwrap();

        form.set_name("gina").unwrap();
        sleep(ms(100)).await;
        form.set_delay(ms(50)).unwrap();
        assert_eq!(form.delay(), ms(50));

        sleep(ms(60)).await;
        assert_eq!(form.snapshot().debounced_name, "gina");
        assert_eq!(form.wait_validated().await, NameStatus::Available);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_after_immediate_add_settles() {
        let form = NameForm::new(mock(100), ms(300)).unwrap();
        form.load_locations().await.unwrap();

        // Added before the name ever settled: the clear commits "" over ""
        form.set_name("carol").unwrap();
        form.select_location("Brazil").unwrap();
        form.add().unwrap();

        let status = tokio::time::timeout(ms(10_000), form.wait_validated())
            .await
            .expect("wait_validated hung after add");
        assert_eq!(status, NameStatus::Unchecked);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_after_clear_on_idle_form() {
        let form = NameForm::new(mock(0), ms(300)).unwrap();
        form.wait_validated().await;

        form.clear().unwrap();
        form.clear().unwrap();

        let status = tokio::time::timeout(ms(10_000), form.wait_validated())
            .await
            .expect("wait_validated hung after clear");
        assert_eq!(status, NameStatus::Unchecked);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retyping_taken_name_after_clear_is_rechecked() {
        let api = mock(100);
        let form = NameForm::new(api.clone(), ms(300)).unwrap();
        form.load_locations().await.unwrap();

        form.set_name("invalid name").unwrap();
        assert_eq!(form.wait_validated().await, NameStatus::Taken);

        // Same name again before the cleared "" ever settles
        form.clear().unwrap();
        sleep(ms(100)).await;
        form.set_name("invalid name").unwrap();
        form.select_location("Canada").unwrap();

        let status = tokio::time::timeout(ms(10_000), form.wait_validated())
            .await
            .expect("wait_validated hung after retype");
        assert_eq!(status, NameStatus::Taken);
        assert_eq!(api.checked_names(), vec!["invalid name", "invalid name"]);
        assert!(matches!(form.add(), Err(FormError::NameTaken(_))));
        assert!(form.records().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retype_during_inflight_check_after_clear() {
        let api = mock(500);
        let form = NameForm::new(api.clone(), ms(300)).unwrap();

        form.set_name("invalid name").unwrap();
        sleep(ms(350)).await;
        assert_eq!(form.name_status(), NameStatus::Checking);

        // Clear and retype while the first request is still out
        form.clear().unwrap();
        form.set_name("invalid name").unwrap();

        let status = tokio::time::timeout(ms(10_000), form.wait_validated())
            .await
            .expect("wait_validated hung");
        assert_eq!(status, NameStatus::Taken);
        assert_eq!(api.checked_names().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recommit_of_checked_name_does_not_call_api() {
        let api = mock(0);
        let form = NameForm::new(api.clone(), ms(300)).unwrap();

        form.set_name("hank").unwrap();
        assert_eq!(form.wait_validated().await, NameStatus::Available);

        form.set_name("han").unwrap();
        sleep(ms(100)).await;
        form.set_name("hank").unwrap();
        assert_eq!(form.wait_validated().await, NameStatus::Available);

        assert_eq!(api.checked_names(), vec!["hank"]);
    }

    #[test]
    fn test_new_without_runtime_fails() {
        let api: Arc<dyn FormApi> = mock(0);
        assert!(matches!(
            NameForm::new(api, ms(300)),
            Err(FormError::Debounce(DebounceError::ResourceExhausted))
        ));
    }
}
