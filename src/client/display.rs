//! Display session: poll the persistence API, detect revision changes and
//! drive the renderer.

use std::time::{Duration, Instant};

use time::macros::format_description;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::warn;

use crate::client::api::ToastApi;
use crate::client::screen::ToastScreen;
use crate::domain::toasts::Toast;

/// Fixed polling cadence; deliberately not configurable.
pub const POLL_INTERVAL: Duration = Duration::from_millis(5000);
/// Per-toast delay when replaying the whole collection.
pub const SHOW_ALL_STAGGER: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Active,
    Stopped,
}

/// One row of the on-screen summary table.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub number: usize,
    pub title: String,
    pub kind: &'static str,
    pub position: &'static str,
    pub duration: i64,
}

/// Surface the session drives. Regenerated wholesale on every adopted change.
pub trait DisplayView: Send {
    fn set_count(&mut self, count: usize);
    fn set_triggers(&mut self, labels: Vec<String>);
    fn render_summary(&mut self, rows: Vec<SummaryRow>);
    fn set_refresh_status(&mut self, status: &str);
    fn set_last_update(&mut self, clock: String);
    fn warn_empty(&mut self);
}

pub struct DisplaySession<A, V> {
    api: A,
    view: V,
    screen: ToastScreen,
    toasts: Vec<Toast>,
    last_seen: Option<i64>,
    state: PollState,
}

impl<A: ToastApi, V: DisplayView> DisplaySession<A, V> {
    pub fn new(api: A, view: V) -> Self {
        Self {
            api,
            view,
            screen: ToastScreen::new(),
            toasts: Vec::new(),
            last_seen: None,
            state: PollState::Active,
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn screen(&self) -> &ToastScreen {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut ToastScreen {
        &mut self.screen
    }

    /// One load and change-detection pass. A revision marker equal to the
    /// last seen one (including the never-saved null against null) leaves the
    /// view untouched. A failed load keeps the previous collection and flags
    /// the error; the next tick retries. Returns whether a re-render happened.
    pub async fn poll(&mut self) -> bool {
        match self.api.load().await {
            Ok(collection) => {
                if collection.timestamp == self.last_seen {
                    return false;
                }
                self.last_seen = collection.timestamp;
                self.toasts = collection.toasts;
                self.render();
                true
            }
            Err(err) => {
                warn!(
                    target = "toastdeck::display",
                    error = %err,
                    "poll failed; keeping previous collection"
                );
                self.view.set_refresh_status("Error");
                false
            }
        }
    }

    /// Present the toast behind trigger control `number` (1-based) immediately.
    pub fn trigger(&mut self, number: usize, now: Instant) {
        let Some(toast) = number.checked_sub(1).and_then(|i| self.toasts.get(i)) else {
            return;
        };
        let toast = toast.clone();
        self.screen.show(&toast, now);
    }

    /// Replay every toast with the fixed stagger; warns instead when the
    /// collection is empty.
    pub fn show_all(&mut self, now: Instant) {
        if self.toasts.is_empty() {
            self.view.warn_empty();
            return;
        }
        for (index, toast) in self.toasts.iter().enumerate() {
            self.screen
                .schedule_show(toast.clone(), now + SHOW_ALL_STAGGER * index as u32);
        }
    }

    /// Visibility transition. Returns whether an immediate poll is due
    /// (resuming from hidden triggers one on top of restarting the timer).
    pub fn set_visible(&mut self, visible: bool) -> bool {
        match (self.state, visible) {
            (PollState::Stopped, true) => {
                self.state = PollState::Active;
                self.view.set_refresh_status("Active");
                true
            }
            (PollState::Active, false) => {
                self.state = PollState::Stopped;
                self.view.set_refresh_status("Stopped");
                false
            }
            _ => false,
        }
    }

    /// Drive the session until the visibility channel closes: one immediate
    /// poll, then the fixed interval. Ticks are skipped while hidden; a slow
    /// poll outlasting a tick drops that tick rather than queueing it, since
    /// polls are awaited inline and the interval skips missed ticks.
    pub async fn run(&mut self, mut visibility: watch::Receiver<bool>) {
        self.view.set_refresh_status("Active");
        self.poll().await;

        let mut interval = tokio::time::interval(POLL_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        interval.tick().await; // consume the immediate first tick

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if self.state == PollState::Active {
                        self.poll().await;
                    }
                }
                changed = visibility.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    let visible = *visibility.borrow();
                    if self.set_visible(visible) {
                        self.poll().await;
                        // The resume poll restarts the cadence; the next tick
                        // lands a full interval later.
                        interval.reset();
                    }
                }
            }
        }
    }

    fn render(&mut self) {
        self.view.set_count(self.toasts.len());
        let labels = self
            .toasts
            .iter()
            .enumerate()
            .map(|(index, toast)| format!("Show Toast #{} ({})", index + 1, toast.title))
            .collect();
        self.view.set_triggers(labels);
        let rows = self
            .toasts
            .iter()
            .enumerate()
            .map(|(index, toast)| SummaryRow {
                number: index + 1,
                title: toast.title.clone(),
                kind: toast.kind.as_str(),
                position: toast.position.as_str(),
                duration: toast.duration,
            })
            .collect();
        self.view.render_summary(rows);
        self.view.set_last_update(clock_now());
    }
}

fn clock_now() -> String {
    time::OffsetDateTime::now_utc()
        .format(format_description!("[hour]:[minute]:[second]"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::api::ApiClientError;
    use crate::domain::toasts::{ToastCollection, ToastKind, ToastPosition};
    use crate::infra::http::models::SaveResponse;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    struct QueuedApi {
        responses: Mutex<VecDeque<Result<ToastCollection, ApiClientError>>>,
    }

    impl QueuedApi {
        fn new(responses: Vec<Result<ToastCollection, ApiClientError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().collect()),
            }
        }

        fn failure() -> ApiClientError {
            ApiClientError::Decode(serde_json::from_str::<serde_json::Value>("x").unwrap_err())
        }
    }

    #[async_trait]
    impl ToastApi for QueuedApi {
        async fn load(&self) -> Result<ToastCollection, ApiClientError> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(ToastCollection::default()))
        }

        async fn save(&self, _toasts: &[Toast]) -> Result<SaveResponse, ApiClientError> {
            unimplemented!("display sessions never save")
        }
    }

    /// Counts `load` calls; each answer carries a fresh revision marker. A
    /// non-zero `delay` makes every poll take that long.
    struct CountingApi {
        calls: Arc<AtomicUsize>,
        delay: Duration,
    }

    impl CountingApi {
        fn new(delay: Duration) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    calls: calls.clone(),
                    delay,
                },
                calls,
            )
        }
    }

    #[async_trait]
    impl ToastApi for CountingApi {
        async fn load(&self) -> Result<ToastCollection, ApiClientError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok(collection(Some(call as i64), Vec::new()))
        }

        async fn save(&self, _toasts: &[Toast]) -> Result<SaveResponse, ApiClientError> {
            unimplemented!("display sessions never save")
        }
    }

    #[derive(Default)]
    struct CountingView {
        renders: usize,
        count: usize,
        triggers: Vec<String>,
        rows: Vec<SummaryRow>,
        statuses: Vec<String>,
        warned_empty: usize,
    }

    impl DisplayView for CountingView {
        fn set_count(&mut self, count: usize) {
            self.count = count;
        }

        fn set_triggers(&mut self, labels: Vec<String>) {
            self.triggers = labels;
        }

        fn render_summary(&mut self, rows: Vec<SummaryRow>) {
            self.renders += 1;
            self.rows = rows;
        }

        fn set_refresh_status(&mut self, status: &str) {
            self.statuses.push(status.to_string());
        }

        fn set_last_update(&mut self, _clock: String) {}

        fn warn_empty(&mut self) {
            self.warned_empty += 1;
        }
    }

    fn toast(title: &str) -> Toast {
        Toast {
            id: String::new(),
            title: title.to_string(),
            message: "body".to_string(),
            kind: ToastKind::Info,
            position: ToastPosition::TopRight,
            duration: 3000,
            auto_hide: true,
        }
    }

    fn collection(timestamp: Option<i64>, toasts: Vec<Toast>) -> ToastCollection {
        ToastCollection { timestamp, toasts }
    }

    #[tokio::test]
    async fn unchanged_timestamp_skips_the_re_render() {
        let api = QueuedApi::new(vec![
            Ok(collection(Some(1), vec![toast("a")])),
            Ok(collection(Some(1), vec![toast("a")])),
            Ok(collection(Some(2), vec![toast("a"), toast("b")])),
        ]);
        let mut session = DisplaySession::new(api, CountingView::default());

        assert!(session.poll().await);
        assert_eq!(session.view.renders, 1);
        assert!(!session.poll().await);
        assert_eq!(session.view.renders, 1);
        assert!(session.poll().await);
        assert_eq!(session.view.renders, 2);
        assert_eq!(session.view.count, 2);
    }

    #[tokio::test]
    async fn never_saved_null_counts_as_unchanged() {
        let api = QueuedApi::new(vec![Ok(collection(None, Vec::new()))]);
        let mut session = DisplaySession::new(api, CountingView::default());
        assert!(!session.poll().await);
        assert_eq!(session.view.renders, 0);
    }

    #[tokio::test]
    async fn render_regenerates_triggers_and_summary() {
        let api = QueuedApi::new(vec![Ok(collection(
            Some(7),
            vec![toast("First"), toast("Second")],
        ))]);
        let mut session = DisplaySession::new(api, CountingView::default());
        session.poll().await;

        assert_eq!(
            session.view.triggers,
            vec!["Show Toast #1 (First)", "Show Toast #2 (Second)"]
        );
        assert_eq!(session.view.rows.len(), 2);
        assert_eq!(session.view.rows[1].number, 2);
        assert_eq!(session.view.rows[1].kind, "info");
        assert_eq!(session.view.rows[1].position, "top-right");
    }

    #[tokio::test]
    async fn failed_poll_flags_error_and_keeps_collection() {
        let api = QueuedApi::new(vec![
            Ok(collection(Some(1), vec![toast("kept")])),
            Err(QueuedApi::failure()),
            Ok(collection(Some(2), vec![toast("fresh")])),
        ]);
        let mut session = DisplaySession::new(api, CountingView::default());

        session.poll().await;
        assert!(!session.poll().await);
        assert_eq!(session.view.statuses.last().unwrap(), "Error");
        assert_eq!(session.toasts()[0].title, "kept");

        // The next cycle recovers.
        assert!(session.poll().await);
        assert_eq!(session.toasts()[0].title, "fresh");
    }

    #[tokio::test]
    async fn show_all_on_empty_collection_only_warns() {
        let mut session = DisplaySession::new(QueuedApi::new(Vec::new()), CountingView::default());
        session.show_all(Instant::now());
        assert_eq!(session.view.warned_empty, 1);
        assert!(session.screen().next_deadline().is_none());
    }

    #[tokio::test]
    async fn show_all_staggers_every_toast() {
        let api = QueuedApi::new(vec![Ok(collection(
            Some(1),
            vec![toast("a"), toast("b"), toast("c")],
        ))]);
        let mut session = DisplaySession::new(api, CountingView::default());
        session.poll().await;

        let now = Instant::now();
        session.show_all(now);
        let screen = session.screen_mut();
        screen.advance(now + SHOW_ALL_STAGGER);
        assert_eq!(screen.units(ToastPosition::TopRight).len(), 2);
        screen.advance(now + SHOW_ALL_STAGGER * 2);
        assert_eq!(screen.units(ToastPosition::TopRight).len(), 3);
    }

    #[tokio::test]
    async fn trigger_renders_one_toast_immediately() {
        let api = QueuedApi::new(vec![Ok(collection(Some(1), vec![toast("a"), toast("b")]))]);
        let mut session = DisplaySession::new(api, CountingView::default());
        session.poll().await;

        let now = Instant::now();
        session.trigger(2, now);
        let units = session.screen().units(ToastPosition::TopRight);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].title, "b");

        session.trigger(0, now);
        session.trigger(99, now);
        assert_eq!(session.screen().units(ToastPosition::TopRight).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn run_polls_immediately_then_on_the_fixed_cadence() {
        let (api, calls) = CountingApi::new(Duration::ZERO);
        let (visibility, receiver) = watch::channel(true);
        let mut session = DisplaySession::new(api, CountingView::default());
        let worker = tokio::spawn(async move { session.run(receiver).await });

        // Startup polls once before the first tick elapses.
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Then exactly one poll per interval.
        tokio::time::sleep(POLL_INTERVAL).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        tokio::time::sleep(POLL_INTERVAL).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        drop(visibility);
        worker.await.expect("run exits when the channel closes");
    }

    #[tokio::test(start_paused = true)]
    async fn hidden_sessions_skip_ticks_and_resume_on_a_fresh_cadence() {
        let (api, calls) = CountingApi::new(Duration::ZERO);
        let (visibility, receiver) = watch::channel(true);
        let mut session = DisplaySession::new(api, CountingView::default());
        let worker = tokio::spawn(async move { session.run(receiver).await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Two full intervals plus change elapse hidden: no polls.
        visibility.send(false).expect("receiver alive");
        tokio::time::sleep(POLL_INTERVAL * 2 + Duration::from_secs(2)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Becoming visible polls at once, mid-cycle.
        visibility.send(true).expect("receiver alive");
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        // The tick the old schedule would have fired here does not; the next
        // poll lands a full interval after the resume poll.
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        drop(visibility);
        worker.await.expect("run exits when the channel closes");
    }

    #[tokio::test(start_paused = true)]
    async fn a_slow_poll_drops_the_tick_it_overlaps() {
        // Every poll takes longer than the interval itself.
        let (api, calls) = CountingApi::new(Duration::from_secs(7));
        let (visibility, receiver) = watch::channel(true);
        let mut session = DisplaySession::new(api, CountingView::default());
        let worker = tokio::spawn(async move { session.run(receiver).await });

        // Startup poll runs from t=0 to t=7; the interval only starts after.
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        tokio::time::sleep(Duration::from_secs(7)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // First tick at t=12 starts the second poll (t=12..19).
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        // The t=17 tick fell inside that poll and is dropped, not queued:
        // nothing new has started by t=20.
        tokio::time::sleep(Duration::from_secs(7)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        // The next aligned tick at t=22 polls again.
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        drop(visibility);
        worker.await.expect("run exits when the channel closes");
    }

    #[tokio::test]
    async fn visibility_toggles_the_poll_state() {
        let mut session = DisplaySession::new(QueuedApi::new(Vec::new()), CountingView::default());
        assert_eq!(session.state(), PollState::Active);

        assert!(!session.set_visible(false));
        assert_eq!(session.state(), PollState::Stopped);
        assert_eq!(session.view.statuses.last().unwrap(), "Stopped");

        // Resuming requests one immediate poll.
        assert!(session.set_visible(true));
        assert_eq!(session.state(), PollState::Active);
        assert_eq!(session.view.statuses.last().unwrap(), "Active");

        // Redundant transitions are no-ops.
        assert!(!session.set_visible(true));
    }
}
