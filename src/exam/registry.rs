// src/exam/registry.rs

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, MutexGuard, Weak,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use serde::Serialize;
use tokio::{sync::watch, time::Instant};
use uuid::Uuid;

use crate::{
    exam::{
        error::ExamError,
        scorer::ScoreResult,
        session::{SessionPhase, Step, TestSession},
        source::QuestionSource,
        store::{AttemptRecord, AttemptStore},
        timer::{CountdownTimer, TimerListener},
    },
    models::{answer::Answer, question::PublicQuestion},
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Point-in-time view of a session for clients.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub status: &'static str,
    pub index: usize,
    pub total: usize,
    pub answered: usize,
    pub remaining_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<PublicQuestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ScoreResult>,
}

pub struct LiveSession {
    id: Uuid,
    user_id: i64,
    state: Mutex<TestSession>,
    timer: Mutex<Option<CountdownTimer>>,
    submitted: AtomicBool,
    finished_at: Mutex<Option<Instant>>,
    result_tx: watch::Sender<Option<ScoreResult>>,
    store: Option<Arc<dyn AttemptStore>>,
}

impl LiveSession {
    /// Loads questions once and, on success, starts the countdown.
    /// On failure nothing is allocated and no timer runs.
    pub async fn start(
        user_id: i64,
        duration_secs: u64,
        source: &dyn QuestionSource,
        store: Option<Arc<dyn AttemptStore>>,
    ) -> Result<Arc<Self>, ExamError> {
        let mut session = TestSession::new(duration_secs);
        session.begin(source.load().await)?;

        let live = Arc::new(Self {
            id: Uuid::new_v4(),
            user_id,
            state: Mutex::new(session),
            timer: Mutex::new(None),
            submitted: AtomicBool::new(false),
            finished_at: Mutex::new(None),
            result_tx: watch::channel(None).0,
            store,
        });
        live.start_timer();

        tracing::info!(
            session = %live.id,
            user_id,
            questions = lock(&live.state).question_count(),
            "Test session started"
        );
        Ok(live)
    }

    /// (Re)starts the countdown from the session's remaining time. A previous
    /// timer is cancelled first so expiry can never fire twice. Does nothing
    /// once the session is submitted.
    pub(crate) fn start_timer(self: &Arc<Self>) {
        let remaining = lock(&self.state).remaining_secs();
        // Checked under the slot lock: `finish` sets the flag before it empties the slot.
        let mut slot = lock(&self.timer);
        if self.submitted.load(Ordering::Acquire) {
            return;
        }
        let listener = Arc::new(SessionClock(Arc::downgrade(self)));
        if let Some(previous) = slot.replace(CountdownTimer::start(remaining, listener)) {
            previous.cancel();
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    /// Answers the current question. Answers after submission are dropped.
    pub fn answer(&self, answer: Answer) -> SessionSnapshot {
        let step = lock(&self.state).answer(answer);
        match step {
            Ok(Step::ReadyToSubmit) => self.finish(),
            Ok(_) => {}
            Err(e) => tracing::debug!(session = %self.id, "Answer ignored: {}", e),
        }
        self.snapshot()
    }

    fn on_tick(&self, remaining: u64) {
        lock(&self.state).tick(remaining);
    }

    fn on_expiry(&self) {
        let step = lock(&self.state).expire();
        if step == Step::ReadyToSubmit {
            tracing::info!(session = %self.id, "Time is up, submitting");
            self.finish();
        }
    }

    /// Scores, stops the clock, hands the result off and saves the attempt.
    /// Runs at most once no matter how many triggers race into it.
    fn finish(&self) {
        if self
            .submitted
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let (result, answers) = {
            let mut state = lock(&self.state);
            let Some(result) = state.submit() else {
                return;
            };
            (result, state.answers().cloned().unwrap_or_default())
        };

        if let Some(timer) = lock(&self.timer).take() {
            timer.cancel();
        }
        *lock(&self.finished_at) = Some(Instant::now());
        self.result_tx.send_replace(Some(result));

        tracing::info!(
            session = %self.id,
            score = result.score,
            percent = result.percent,
            band = result.band.as_str(),
            "Test session submitted"
        );

        if let Some(store) = self.store.clone() {
            let record = AttemptRecord::new(self.user_id, &result, answers);
            self.save_in_background(store, record);
        }
    }

    fn save_in_background(&self, store: Arc<dyn AttemptStore>, record: AttemptRecord) {
        let session = self.id;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = store.save(&record).await {
                        tracing::warn!(%session, "Attempt not saved: {}", e);
                    }
                });
            }
            Err(_) => tracing::warn!(%session, "Attempt not saved: no async runtime"),
        }
    }

    /// Cancels the countdown without submitting.
    pub fn abandon(&self) {
        if let Some(timer) = lock(&self.timer).take() {
            timer.cancel();
            tracing::info!(session = %self.id, "Test session abandoned");
        }
    }

    pub fn phase(&self) -> SessionPhase {
        lock(&self.state).phase().clone()
    }

    pub fn result(&self) -> Option<ScoreResult> {
        *self.result_tx.borrow()
    }

    /// Receives the result once the session is submitted.
    pub fn subscribe(&self) -> watch::Receiver<Option<ScoreResult>> {
        self.result_tx.subscribe()
    }

    pub fn is_timer_running(&self) -> bool {
        lock(&self.timer).is_some()
    }

    fn finished_before(&self, cutoff: Instant) -> bool {
        lock(&self.finished_at).is_some_and(|t| t <= cutoff)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = lock(&self.state);
        SessionSnapshot {
            id: self.id,
            status: state.phase().label(),
            index: state.pointer(),
            total: state.question_count(),
            answered: state.answers().map_or(0, |a| a.answered_count()),
            remaining_secs: state.remaining_secs(),
            question: state.current_question().map(PublicQuestion::from),
            result: state.result(),
        }
    }
}

impl Drop for LiveSession {
    fn drop(&mut self) {
        if let Some(timer) = lock(&self.timer).take() {
            timer.cancel();
        }
    }
}

/// Timer listener that holds the session weakly: ticks from a timer that
/// outlives its session are dropped.
struct SessionClock(Weak<LiveSession>);

impl TimerListener for SessionClock {
    fn on_tick(&self, remaining: u64) {
        if let Some(session) = self.0.upgrade() {
            session.on_tick(remaining);
        }
    }

    fn on_expiry(&self) {
        if let Some(session) = self.0.upgrade() {
            session.on_expiry();
        }
    }
}

/// All live sessions, keyed by id. Lookups are scoped to the owning user.
pub struct SessionRegistry {
    sessions: Mutex<HashMap<Uuid, Arc<LiveSession>>>,
    retention: Duration,
}

impl SessionRegistry {
    pub fn new(retention: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            retention,
        }
    }

    pub fn insert(&self, session: Arc<LiveSession>) {
        self.prune();
        lock(&self.sessions).insert(session.id(), session);
    }

    pub fn get(&self, id: Uuid, user_id: i64) -> Option<Arc<LiveSession>> {
        lock(&self.sessions)
            .get(&id)
            .filter(|s| s.user_id() == user_id)
            .cloned()
    }

    pub fn remove(&self, id: Uuid, user_id: i64) -> Option<Arc<LiveSession>> {
        let mut sessions = lock(&self.sessions);
        if sessions.get(&id)?.user_id() != user_id {
            return None;
        }
        sessions.remove(&id)
    }

    /// Forgets sessions submitted longer ago than the retention window.
    pub fn prune(&self) {
        let Some(cutoff) = Instant::now().checked_sub(self.retention) else {
            return;
        };
        let mut sessions = lock(&self.sessions);
        let before = sessions.len();
        sessions.retain(|_, s| !s.finished_before(cutoff));
        let pruned = before - sessions.len();
        if pruned > 0 {
            tracing::debug!(pruned, "Pruned finished test sessions");
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.sessions).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
