//! The drill loop: fetch a batch, collect answers, grade, report, track.
//!
//! [`DrillSession`] is driven from a single-threaded event loop. Every method
//! takes `&self`; state lives in `RefCell`s and no borrow is held across an
//! `.await`, so a level switch can start while a fetch is still in flight.
//! Each load takes a ticket and only the latest ticket may install its result.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use chrono::NaiveDate;
use drill_utils::feedback::Feedback;
use drill_utils::hint::{Hint, hint_for};
use drill_utils::{GradeResult, Level, SessionConfig, WordRecord};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::collaborators::{Clock, CollaboratorError, FetchedBatch, StatsService, SystemClock, WordProvider};
use crate::progress::DailyProgress;
use crate::snapshot::{self, PromptSkeleton, SessionSnapshot};
use crate::store::{KeyValueStore, StoreError};
use crate::{GradedBatch, QuizPrompt, build_batch, grade_batch};

pub const READY_MESSAGE: &str = "Fill all fields and press Enter to submit.";
pub const GRADED_MESSAGE: &str = "Press Enter to continue to the next quiz.";
pub const INCOMPLETE_MESSAGE: &str = "Please fill in all the answers before submitting.";
pub const FETCH_FAILED_MESSAGE: &str = "Error: Could not load words from the server.";
pub const POST_FAILED_MESSAGE: &str = "Error: Could not save your results. Please try again.";
pub const CAUGHT_UP_MESSAGE: &str = "You're all caught up for today!";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("{missing} answer(s) still empty")]
    IncompleteAnswers { missing: usize },

    #[error("This batch has already been submitted")]
    AlreadySubmitted,

    #[error("A newer request replaced this one")]
    Superseded,

    #[error("Results are still being submitted")]
    SubmissionInProgress,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Today's unfinished batch came back from the session store.
    Restored,
    Fetched { prompts: usize },
    /// The provider has nothing left for today.
    Empty,
    /// Switching to the level already selected.
    Unchanged,
}

#[derive(Clone, Debug, Default)]
struct SessionState {
    level: Level,
    date: Option<NaiveDate>,
    records: Vec<WordRecord>,
    prompts: Vec<QuizPrompt>,
    config: Option<SessionConfig>,
    inputs: BTreeMap<String, String>,
    results: BTreeMap<String, GradeResult>,
    submitted: bool,
    submitting: bool,
    feedback: String,
    progress: Option<DailyProgress>,
}

impl SessionState {
    fn new(level: Level) -> Self {
        Self {
            level,
            feedback: READY_MESSAGE.to_string(),
            ..Default::default()
        }
    }

    fn snapshot(&self, date: NaiveDate) -> SessionSnapshot {
        SessionSnapshot {
            date,
            level: self.level,
            prompts: self.prompts.iter().map(PromptSkeleton::from).collect(),
            records: self.records.clone(),
            session_config: self.config,
            feedback: self.feedback.clone(),
            submitted: self.submitted,
            inputs: self.inputs.clone(),
        }
    }

    fn missing_answers(&self) -> usize {
        self.prompts
            .iter()
            .filter(|prompt| {
                self.inputs
                    .get(&prompt.id)
                    .is_none_or(|input| input.trim().is_empty())
            })
            .count()
    }
}

pub struct DrillSession<P, S, K, C = SystemClock, R = StdRng> {
    provider: P,
    stats: S,
    clock: C,
    session_store: RefCell<K>,
    progress_store: RefCell<K>,
    rng: RefCell<R>,
    state: RefCell<SessionState>,
    ticket: Cell<u64>,
}

impl<P, S, K> DrillSession<P, S, K, SystemClock, StdRng>
where
    P: WordProvider,
    S: StatsService,
    K: KeyValueStore,
{
    pub fn new(level: Level, provider: P, stats: S, session_store: K, progress_store: K) -> Self {
        Self::with_clock_and_rng(
            level,
            provider,
            stats,
            session_store,
            progress_store,
            SystemClock,
            StdRng::from_os_rng(),
        )
    }
}

impl<P, S, K, C, R> DrillSession<P, S, K, C, R>
where
    P: WordProvider,
    S: StatsService,
    K: KeyValueStore,
    C: Clock,
    R: Rng,
{
    pub fn with_clock_and_rng(
        level: Level,
        provider: P,
        stats: S,
        session_store: K,
        progress_store: K,
        clock: C,
        rng: R,
    ) -> Self {
        Self {
            provider,
            stats,
            clock,
            session_store: RefCell::new(session_store),
            progress_store: RefCell::new(progress_store),
            rng: RefCell::new(rng),
            state: RefCell::new(SessionState::new(level)),
            ticket: Cell::new(0),
        }
    }

    pub fn level(&self) -> Level {
        self.state.borrow().level
    }

    pub fn prompts(&self) -> Vec<QuizPrompt> {
        self.state.borrow().prompts.clone()
    }

    pub fn inputs(&self) -> BTreeMap<String, String> {
        self.state.borrow().inputs.clone()
    }

    pub fn results(&self) -> BTreeMap<String, GradeResult> {
        self.state.borrow().results.clone()
    }

    pub fn is_submitted(&self) -> bool {
        self.state.borrow().submitted
    }

    pub fn is_submitting(&self) -> bool {
        self.state.borrow().submitting
    }

    pub fn feedback(&self) -> String {
        self.state.borrow().feedback.clone()
    }

    pub fn session_config(&self) -> Option<SessionConfig> {
        self.state.borrow().config
    }

    pub fn progress(&self) -> Option<DailyProgress> {
        self.state.borrow().progress.clone()
    }

    /// Per-prompt feedback once the batch has been graded.
    pub fn feedback_for(&self, id: &str) -> Option<Feedback> {
        let state = self.state.borrow();
        let result = *state.results.get(id)?;
        let prompt = state.prompts.iter().find(|prompt| prompt.id == id)?;
        let raw_input = state.inputs.get(id).map(String::as_str).unwrap_or("");
        Some(prompt.feedback(result, raw_input))
    }

    pub fn hint_for(&self, id: &str) -> Option<Hint> {
        let state = self.state.borrow();
        let record = state.records.iter().find(|record| record.id == id)?;
        hint_for(record)
    }

    /// Starts or resumes today's batch for the current level.
    ///
    /// Unless `force_refetch` is set, a snapshot saved earlier today is
    /// restored without contacting the provider. Refused while a submission
    /// is waiting for the statistics service.
    pub async fn load(&self, force_refetch: bool) -> Result<LoadOutcome, SessionError> {
        self.ensure_not_submitting()?;
        let ticket = self.ticket.get() + 1;
        self.ticket.set(ticket);
        let level = self.level();
        let today = self.clock.today();

        if !force_refetch {
            let restored = snapshot::restore(&mut *self.session_store.borrow_mut(), level, today)?;
            if let Some(snapshot) = restored {
                self.install_snapshot(snapshot, today)?;
                return Ok(LoadOutcome::Restored);
            }
        }

        snapshot::invalidate(&mut *self.session_store.borrow_mut(), level)?;
        *self.state.borrow_mut() = SessionState::new(level);

        let fetched = self.provider.fetch_batch(level).await;
        self.ensure_current(ticket, level)?;
        let FetchedBatch {
            records,
            session_config,
        } = fetched.map_err(|e| self.fetch_failed(e))?;

        if records.is_empty() {
            let progress = self.load_progress(level, today, Some(&session_config))?;
            let mut state = self.state.borrow_mut();
            state.date = Some(today);
            state.config = Some(session_config);
            state.progress = progress;
            state.feedback = CAUGHT_UP_MESSAGE.to_string();
            return Ok(LoadOutcome::Empty);
        }

        let ids = records
            .iter()
            .map(|record| record.id.clone())
            .collect::<Vec<_>>();
        let stats = self.stats.fetch_stats(&ids, level).await;
        self.ensure_current(ticket, level)?;
        let stats = stats.map_err(|e| self.fetch_failed(e))?;

        let prompts = build_batch(&records, &stats, &mut *self.rng.borrow_mut());
        let progress = self.load_progress(level, today, Some(&session_config))?;
        let count = prompts.len();
        let snapshot = {
            let mut state = self.state.borrow_mut();
            *state = SessionState {
                date: Some(today),
                records,
                prompts,
                config: Some(session_config),
                progress,
                ..SessionState::new(level)
            };
            state.snapshot(today)
        };
        snapshot::save(&mut *self.session_store.borrow_mut(), &snapshot)?;
        log::info!("Saved new quiz for level {level} with {count} prompts");

        Ok(LoadOutcome::Fetched { prompts: count })
    }

    /// Moves on to a fresh batch, discarding whatever is on screen.
    pub async fn next_batch(&self) -> Result<LoadOutcome, SessionError> {
        self.load(true).await
    }

    pub async fn switch_level(&self, level: Level) -> Result<LoadOutcome, SessionError> {
        if self.level() == level {
            return Ok(LoadOutcome::Unchanged);
        }
        self.ensure_not_submitting()?;
        *self.state.borrow_mut() = SessionState::new(level);
        self.load(true).await
    }

    /// Records the learner's current text for one prompt and persists it.
    pub fn set_input(&self, id: &str, value: &str) -> Result<(), SessionError> {
        let snapshot = {
            let mut state = self.state.borrow_mut();
            if state.submitted || state.submitting {
                return Err(SessionError::AlreadySubmitted);
            }
            if !state.prompts.iter().any(|prompt| prompt.id == id) {
                log::warn!("Ignoring input for unknown prompt {id}");
                return Ok(());
            }
            state.inputs.insert(id.to_string(), value.to_string());
            let Some(date) = state.date else {
                return Ok(());
            };
            state.snapshot(date)
        };
        snapshot::save(&mut *self.session_store.borrow_mut(), &snapshot)?;
        Ok(())
    }

    /// Grades the batch and reports it to the statistics service.
    ///
    /// Nothing is committed until the service acknowledges the results. Once
    /// it has, the batch is marked submitted even if saving the daily progress
    /// or invalidating the snapshot fails; that error is returned afterwards.
    pub async fn submit(&self) -> Result<GradedBatch, SessionError> {
        let (level, date, config, graded) = {
            let mut state = self.state.borrow_mut();
            if state.submitted || state.submitting {
                return Err(SessionError::AlreadySubmitted);
            }
            let missing = state.missing_answers();
            if missing > 0 {
                state.feedback = INCOMPLETE_MESSAGE.to_string();
                return Err(SessionError::IncompleteAnswers { missing });
            }
            state.submitting = true;
            let graded = grade_batch(&state.prompts, &state.inputs);
            let date = state.date.unwrap_or_else(|| self.clock.today());
            (state.level, date, state.config, graded)
        };

        let posted = self.stats.post_results(level, &graded.payload).await;
        if let Err(e) = posted {
            log::error!("Failed to update stats for level {level}: {e:?}");
            let mut state = self.state.borrow_mut();
            state.submitting = false;
            state.feedback = POST_FAILED_MESSAGE.to_string();
            return Err(e.into());
        }

        let progress = match &config {
            Some(config) => self
                .load_progress(level, date, Some(config))
                .map(|progress| progress.map(|progress| progress.apply_results(&graded.payload, config))),
            None => {
                log::warn!("No session configuration for level {level}, daily progress not updated");
                Ok(None)
            }
        };
        let saved = match &progress {
            Ok(Some(progress)) => progress
                .save(&mut *self.progress_store.borrow_mut())
                .inspect_err(|e| log::error!("Failed to save daily progress for {level}: {e:?}")),
            Ok(None) | Err(_) => Ok(()),
        };
        let invalidated = snapshot::invalidate(&mut *self.session_store.borrow_mut(), level);

        {
            let mut state = self.state.borrow_mut();
            state.submitting = false;
            state.submitted = true;
            state.results = graded.results.clone();
            state.feedback = GRADED_MESSAGE.to_string();
            if let Ok(Some(progress)) = &progress {
                state.progress = Some(progress.clone());
            }
        }

        progress?;
        saved?;
        invalidated?;
        Ok(graded)
    }

    fn install_snapshot(&self, snapshot: SessionSnapshot, today: NaiveDate) -> Result<(), SessionError> {
        let prompts = snapshot.rehydrate();
        let results = if snapshot.submitted {
            grade_batch(&prompts, &snapshot.inputs).results
        } else {
            BTreeMap::new()
        };
        let progress = self.load_progress(snapshot.level, today, snapshot.session_config.as_ref())?;
        let feedback = if snapshot.feedback.is_empty() {
            READY_MESSAGE.to_string()
        } else {
            snapshot.feedback
        };

        *self.state.borrow_mut() = SessionState {
            level: snapshot.level,
            date: Some(today),
            records: snapshot.records,
            prompts,
            config: snapshot.session_config,
            inputs: snapshot.inputs,
            results,
            submitted: snapshot.submitted,
            submitting: false,
            feedback,
            progress,
        };
        Ok(())
    }

    fn load_progress(
        &self,
        level: Level,
        date: NaiveDate,
        config: Option<&SessionConfig>,
    ) -> Result<Option<DailyProgress>, SessionError> {
        Ok(DailyProgress::load_or_start(
            &*self.progress_store.borrow(),
            level,
            date,
            config,
        )?)
    }

    fn ensure_not_submitting(&self) -> Result<(), SessionError> {
        if self.state.borrow().submitting {
            log::warn!("Ignoring a load while results are being submitted");
            return Err(SessionError::SubmissionInProgress);
        }
        Ok(())
    }

    fn ensure_current(&self, ticket: u64, level: Level) -> Result<(), SessionError> {
        if self.ticket.get() == ticket {
            Ok(())
        } else {
            log::info!("Discarding superseded fetch for level {level}");
            Err(SessionError::Superseded)
        }
    }

    fn fetch_failed(&self, error: CollaboratorError) -> SessionError {
        log::error!("Failed to fetch words: {error:?}");
        self.state.borrow_mut().feedback = FETCH_FAILED_MESSAGE.to_string();
        error.into()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::store::MemoryStore;
    use crate::test_utils::{gross, tisch};
    use drill_utils::{StatsPayload, WordStats};
    use futures::executor::block_on;
    use rand_chacha::ChaCha8Rng;

    struct FixedClock;

    impl Clock for FixedClock {
        fn today(&self) -> NaiveDate {
            NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
        }
    }

    struct FakeProvider(Result<FetchedBatch, CollaboratorError>);

    impl WordProvider for FakeProvider {
        async fn fetch_batch(&self, _level: Level) -> Result<FetchedBatch, CollaboratorError> {
            self.0.clone()
        }
    }

    #[derive(Default)]
    struct FakeStats {
        fail_post: Cell<bool>,
        posted: RefCell<Vec<Vec<StatsPayload>>>,
    }

    impl StatsService for &FakeStats {
        async fn fetch_stats(
            &self,
            _ids: &[String],
            _level: Level,
        ) -> Result<HashMap<String, WordStats>, CollaboratorError> {
            Ok(HashMap::new())
        }

        async fn post_results(
            &self,
            _level: Level,
            payload: &[StatsPayload],
        ) -> Result<(), CollaboratorError> {
            if self.fail_post.get() {
                return Err(CollaboratorError::Unavailable);
            }
            self.posted.borrow_mut().push(payload.to_vec());
            Ok(())
        }
    }

    fn config() -> SessionConfig {
        SessionConfig {
            mastery_goal: 3,
            failure_threshold: 2,
            daily_word_limit: 10,
            total_words_in_level: 2,
        }
    }

    fn batch(records: Vec<WordRecord>) -> FakeProvider {
        FakeProvider(Ok(FetchedBatch {
            records,
            session_config: config(),
        }))
    }

    fn session(
        provider: FakeProvider,
        stats: &FakeStats,
    ) -> DrillSession<FakeProvider, &FakeStats, MemoryStore, FixedClock, ChaCha8Rng> {
        DrillSession::with_clock_and_rng(
            Level::A1,
            provider,
            stats,
            MemoryStore::new(),
            MemoryStore::new(),
            FixedClock,
            ChaCha8Rng::seed_from_u64(1),
        )
    }

    #[test]
    fn test_incomplete_answers_are_refused() {
        let stats = FakeStats::default();
        let session = session(batch(vec![tisch(), gross()]), &stats);
        block_on(session.load(false)).unwrap();
        session.set_input("tisch", "der Tisch").unwrap();
        session.set_input("gross", "   ").unwrap();

        let err = block_on(session.submit()).unwrap_err();
        assert!(matches!(err, SessionError::IncompleteAnswers { missing: 1 }));
        assert_eq!(session.feedback(), INCOMPLETE_MESSAGE);
        assert!(!session.is_submitted());
        assert!(stats.posted.borrow().is_empty());
    }

    #[test]
    fn test_submit_commits_after_ack() {
        let stats = FakeStats::default();
        let session = session(batch(vec![tisch()]), &stats);
        block_on(session.load(false)).unwrap();
        let direction = session.prompts()[0].direction;
        let answer = match direction {
            drill_utils::Direction::MeaningToWord => "der Tisch",
            drill_utils::Direction::WordToMeaning => "table",
        };
        session.set_input("tisch", answer).unwrap();

        let graded = block_on(session.submit()).unwrap();
        assert_eq!(graded.results["tisch"], GradeResult::PerfectMatch);
        assert!(session.is_submitted());
        assert_eq!(session.feedback(), GRADED_MESSAGE);
        assert_eq!(session.feedback_for("tisch"), Some(Feedback::Correct));
        assert_eq!(session.progress().map(|p| (p.current, p.total)), Some((1, 6)));
        assert!(matches!(
            block_on(session.submit()),
            Err(SessionError::AlreadySubmitted)
        ));
        assert!(matches!(
            session.set_input("tisch", "x"),
            Err(SessionError::AlreadySubmitted)
        ));
    }

    #[test]
    fn test_failed_post_changes_nothing() {
        let stats = FakeStats::default();
        stats.fail_post.set(true);
        let session = session(batch(vec![tisch()]), &stats);
        block_on(session.load(false)).unwrap();
        session.set_input("tisch", "stuhl").unwrap();
        let before = session.progress();

        assert!(matches!(
            block_on(session.submit()),
            Err(SessionError::Collaborator(CollaboratorError::Unavailable))
        ));
        assert_eq!(session.feedback(), POST_FAILED_MESSAGE);
        assert!(!session.is_submitted());
        assert!(!session.is_submitting());
        assert!(session.results().is_empty());
        assert_eq!(session.progress(), before);
    }

    /// Session storage that works, progress storage that refuses writes.
    #[derive(Default)]
    struct ReadOnlyProgressStore(MemoryStore);

    impl KeyValueStore for ReadOnlyProgressStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.0.get(key)
        }

        fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
            if key.starts_with("dailyProgress_") {
                return Err(std::io::Error::other("disk full").into());
            }
            self.0.set(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<(), StoreError> {
            self.0.remove(key)
        }
    }

    #[test]
    fn test_acknowledged_submit_survives_progress_save_failure() {
        let stats = FakeStats::default();
        let session = DrillSession::with_clock_and_rng(
            Level::A1,
            batch(vec![tisch()]),
            &stats,
            ReadOnlyProgressStore::default(),
            ReadOnlyProgressStore::default(),
            FixedClock,
            ChaCha8Rng::seed_from_u64(1),
        );
        block_on(session.load(false)).unwrap();
        session.set_input("tisch", "stuhl").unwrap();

        assert!(matches!(
            block_on(session.submit()),
            Err(SessionError::Store(StoreError::Io(_)))
        ));
        assert!(session.is_submitted());
        assert!(!session.is_submitting());
        assert_eq!(session.feedback(), GRADED_MESSAGE);
        assert_eq!(session.results()["tisch"], GradeResult::NoMatch);
        assert_eq!(session.progress().map(|p| p.total), Some(7));

        // the service already has these results, so they are never sent twice
        assert!(matches!(
            block_on(session.submit()),
            Err(SessionError::AlreadySubmitted)
        ));
        assert_eq!(stats.posted.borrow().len(), 1);

        // the snapshot was invalidated, so the next load starts a fresh batch
        assert_eq!(
            block_on(session.load(false)).unwrap(),
            LoadOutcome::Fetched { prompts: 1 }
        );
    }

    #[test]
    fn test_empty_batch() {
        let stats = FakeStats::default();
        let session = session(batch(vec![]), &stats);
        assert_eq!(block_on(session.load(false)).unwrap(), LoadOutcome::Empty);
        assert_eq!(session.feedback(), CAUGHT_UP_MESSAGE);
        assert!(block_on(session.submit()).unwrap().payload.is_empty());
    }

    #[test]
    fn test_fetch_failure() {
        let stats = FakeStats::default();
        let session = session(FakeProvider(Err(CollaboratorError::Provider("boom".into()))), &stats);
        assert!(block_on(session.load(false)).is_err());
        assert_eq!(session.feedback(), FETCH_FAILED_MESSAGE);
        assert!(session.prompts().is_empty());
        assert_eq!(session.progress(), None);
    }

    #[test]
    fn test_hint_lookup() {
        let stats = FakeStats::default();
        let mut record = tisch();
        record.context = Some("Der Tisch ist rund.".to_string());
        let session = session(batch(vec![record]), &stats);
        block_on(session.load(false)).unwrap();
        let hint = session.hint_for("tisch").unwrap();
        assert_eq!(hint.context.as_deref(), Some("Der Tisch ist rund."));
        assert_eq!(session.hint_for("missing"), None);
    }

    #[test]
    fn test_switch_to_same_level() {
        let stats = FakeStats::default();
        let session = session(batch(vec![tisch()]), &stats);
        assert_eq!(
            block_on(session.switch_level(Level::A1)).unwrap(),
            LoadOutcome::Unchanged
        );
    }
}
