use super::config::{EngineConfig, FailPolicy, TestPolicy};
use super::scoring;
use super::store::ResultStore;
use super::trial::{ActiveTrial, PendingFeedback};
use chrono::Utc;
use rand::Rng;
use rand::seq::IndexedRandom;
use std::time::Duration;
use tracing::{debug, info};
use vscreen_core::{
    AmslerQuestion, Bearing, Direction, EngineError, Eye, Feedback, LevelResult, Response,
    SessionStatus, Stimulus, TestResult, TestType, Trial,
};
use vscreen_timing::Timer;

/// Discrete input delivered by a host.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SelectEye(Eye),
    Start,
    Respond(Response),
    Exit,
    Close,
}

/// Level movement caused by a recorded response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Same level, next trial.
    Continued,
    LevelChanged { from: u32, to: u32 },
    Completed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResponseOutcome {
    pub correct: bool,
    /// Set when a feedback window was opened.
    pub feedback: Option<Feedback>,
    pub transition: Transition,
    /// Set when this response filled the level's quota.
    pub level_result: Option<LevelResult>,
}

/// Changes applied by [`TestSession::update`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    FeedbackCleared,
    TimedOut(ResponseOutcome),
}

/// One run of one test type, optionally scoped to one eye.
///
/// Pure in-memory state: the only clock it reads is the injected [`Timer`],
/// and the only randomness is the injected [`Rng`].
pub struct TestSession<T, R>
where
    T: Timer<Timestamp = u64>,
    R: Rng,
{
    test_type: TestType,
    policy: TestPolicy,
    config: EngineConfig,
    timer: T,
    rng: R,
    status: SessionStatus,
    eye: Option<Eye>,
    level: u32,
    correct_in_level: u32,
    total_in_level: u32,
    current: Option<ActiveTrial>,
    trials: Vec<Trial>,
    level_results: Vec<LevelResult>,
    feedback: Option<PendingFeedback>,
    finalized: bool,
    screened_eyes: Vec<Eye>,
}

impl<T, R> TestSession<T, R>
where
    T: Timer<Timestamp = u64>,
    R: Rng,
{
    pub fn new(test_type: TestType, config: EngineConfig, timer: T, rng: R) -> Self {
        let policy = config.policy(test_type);
        Self {
            test_type,
            policy,
            config,
            timer,
            rng,
            status: SessionStatus::entry_for(test_type),
            eye: None,
            level: policy.start_level,
            correct_in_level: 0,
            total_in_level: 0,
            current: None,
            trials: Vec::new(),
            level_results: Vec::new(),
            feedback: None,
            finalized: false,
            screened_eyes: Vec::new(),
        }
    }

    /// Creates a session and takes it straight to `Running`.
    ///
    /// Two-eye tests need `eye`; for the others it only labels the result.
    /// The configuration is validated first.
    pub fn begin(
        test_type: TestType,
        eye: Option<Eye>,
        config: EngineConfig,
        timer: T,
        rng: R,
    ) -> Result<Self, EngineError> {
        config
            .validate()
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        let mut session = Self::new(test_type, config, timer, rng);
        if test_type.is_two_eye() {
            let eye = eye.ok_or(EngineError::WrongStatus {
                operation: "start without choosing an eye",
                status: SessionStatus::EyeSelection,
            })?;
            session.select_eye(eye)?;
        } else {
            session.eye = eye;
        }
        session.start()?;
        Ok(session)
    }

    pub fn select_eye(&mut self, eye: Eye) -> Result<(), EngineError> {
        if !self.test_type.is_two_eye() {
            return Err(EngineError::NotTwoEye);
        }
        self.expect_status("select an eye", SessionStatus::EyeSelection)?;
        self.eye = Some(eye);
        self.status = SessionStatus::Instructions;
        debug!(test = %self.test_type, %eye, "eye selected");
        Ok(())
    }

    /// Leaves the instructions and presents the first stimulus.
    pub fn start(&mut self) -> Result<(), EngineError> {
        self.expect_status("start", SessionStatus::Instructions)?;
        self.reset_progress();
        self.status = SessionStatus::Running;
        info!(
            test = %self.test_type,
            eye = ?self.eye,
            level = self.level,
            "session started"
        );
        self.present_next();
        Ok(())
    }

    /// Returns the stimulus awaiting a response, generating one if none is
    /// pending.
    pub fn present_trial(&mut self) -> Result<&Stimulus, EngineError> {
        self.expire_feedback();
        match self.status {
            SessionStatus::Running => {}
            status if status.is_terminal() => return Err(EngineError::StaleSession { status }),
            status => {
                return Err(EngineError::WrongStatus {
                    operation: "present a trial",
                    status,
                });
            }
        }
        self.present_next();
        self.current_stimulus().ok_or(EngineError::NoActiveTrial)
    }

    /// Judges `response` against the pending stimulus and applies the
    /// staircase rule for the current level.
    ///
    /// Input is dropped without touching the session while feedback is
    /// showing ([`EngineError::Debounced`]) and once the session is over
    /// ([`EngineError::StaleSession`]). A response arriving after the
    /// response window has lapsed is discarded and the stimulus' timeout
    /// response is recorded in its place.
    pub fn record_response(&mut self, response: Response) -> Result<ResponseOutcome, EngineError> {
        self.expire_feedback();
        match self.status {
            SessionStatus::Running => {}
            SessionStatus::Feedback => {
                debug!(test = %self.test_type, "response debounced");
                return Err(EngineError::Debounced);
            }
            status @ (SessionStatus::Complete | SessionStatus::Exited) => {
                debug!(test = %self.test_type, %status, "response to stale session");
                return Err(EngineError::StaleSession { status });
            }
            status => {
                return Err(EngineError::WrongStatus {
                    operation: "record a response",
                    status,
                });
            }
        }

        if let Some(outcome) = self.lapse_response_window() {
            debug!(test = %self.test_type, "late response discarded");
            return Ok(outcome);
        }
        let pending = self.current.as_ref().ok_or(EngineError::NoActiveTrial)?;
        let correct = pending.stimulus.judge(&response)?;
        let trial = self.current.take().ok_or(EngineError::NoActiveTrial)?;
        Ok(self.apply_response(trial, response, correct))
    }

    /// Advances time-driven state: clears an expired feedback window and
    /// times out a stimulus left unanswered past the response window.
    pub fn update(&mut self) -> Vec<SessionUpdate> {
        let mut updates = Vec::new();

        if self.expire_feedback() {
            updates.push(SessionUpdate::FeedbackCleared);
        }

        if let Some(outcome) = self.lapse_response_window() {
            updates.push(SessionUpdate::TimedOut(outcome));
        }

        updates
    }

    /// Aborts a running session back to its entry phase. Nothing is
    /// recorded and a pending feedback window is cancelled.
    pub fn exit(&mut self) -> Result<(), EngineError> {
        if !self.status.is_active() {
            return Err(EngineError::WrongStatus {
                operation: "exit",
                status: self.status,
            });
        }
        let trials = self.trials.len();
        self.reset_progress();
        self.status = SessionStatus::entry_for(self.test_type);
        if self.test_type.is_two_eye() {
            self.eye = None;
        }
        info!(test = %self.test_type, discarded_trials = trials, "session exited");
        Ok(())
    }

    /// Discards the session for good.
    pub fn close(&mut self) {
        self.feedback = None;
        self.current = None;
        self.status = SessionStatus::Exited;
        debug!(test = %self.test_type, "session closed");
    }

    /// Builds the result of a completed session. Only succeeds once.
    pub fn finalize(&mut self) -> Result<TestResult, EngineError> {
        let result = self.build_result()?;
        self.finalized = true;
        Ok(result)
    }

    /// Finalizes and hands the result to `store`. If the store fails the
    /// session stays unfinalized so the save can be retried.
    pub fn finalize_into<S>(&mut self, store: &mut S) -> Result<TestResult, EngineError>
    where
        S: ResultStore + ?Sized,
    {
        let result = self.build_result()?;
        store
            .save_result(self.test_type, self.eye, &result)
            .map_err(|e| EngineError::Store(e.to_string()))?;
        self.finalized = true;
        Ok(result)
    }

    /// After a finalized two-eye session, returns to eye selection with a
    /// fresh log. Yields the eye still to be screened, if any.
    pub fn next_eye(&mut self) -> Result<Option<Eye>, EngineError> {
        if !self.test_type.is_two_eye() {
            return Err(EngineError::NotTwoEye);
        }
        if self.status != SessionStatus::Complete || !self.finalized {
            return Err(EngineError::WrongStatus {
                operation: "switch eyes",
                status: self.status,
            });
        }
        if let Some(eye) = self.eye.take() {
            if !self.screened_eyes.contains(&eye) {
                self.screened_eyes.push(eye);
            }
        }
        self.reset_progress();
        self.status = SessionStatus::EyeSelection;
        Ok([Eye::Left, Eye::Right]
            .into_iter()
            .find(|e| !self.screened_eyes.contains(e)))
    }

    /// Single entry point for event-driven hosts.
    pub fn handle_event(
        &mut self,
        event: SessionEvent,
    ) -> Result<Option<ResponseOutcome>, EngineError> {
        match event {
            SessionEvent::SelectEye(eye) => self.select_eye(eye).map(|_| None),
            SessionEvent::Start => self.start().map(|_| None),
            SessionEvent::Respond(response) => self.record_response(response).map(Some),
            SessionEvent::Exit => self.exit().map(|_| None),
            SessionEvent::Close => {
                self.close();
                Ok(None)
            }
        }
    }

    fn apply_response(
        &mut self,
        trial: ActiveTrial,
        response: Response,
        correct: bool,
    ) -> ResponseOutcome {
        let now = self.timer.now();
        debug!(
            test = %self.test_type,
            trial = trial.id,
            level = trial.level,
            correct,
            "response recorded"
        );
        self.trials.push(Trial {
            index: trial.id,
            level: trial.level,
            expected: trial.stimulus.expected_response(),
            stimulus: trial.stimulus,
            actual: response,
            correct,
            presented_at_ns: trial.presented_at,
            responded_at_ns: now,
        });
        self.total_in_level += 1;
        if correct {
            self.correct_in_level += 1;
        }

        let mut transition = Transition::Continued;
        let mut level_result = None;
        if self.total_in_level >= self.policy.trials_per_level {
            let result = LevelResult::evaluate(
                self.level,
                self.correct_in_level,
                self.total_in_level,
                self.policy.min_correct,
            );
            level_result = Some(result);
            self.level_results.push(result);

            let stop = !result.passed && self.policy.on_fail == FailPolicy::Stop;
            transition = if stop || self.level >= self.policy.levels {
                Transition::Completed
            } else {
                let from = self.level;
                self.level += 1;
                self.correct_in_level = 0;
                self.total_in_level = 0;
                debug!(
                    test = %self.test_type,
                    from,
                    to = self.level,
                    passed = result.passed,
                    "level changed"
                );
                Transition::LevelChanged {
                    from,
                    to: self.level,
                }
            };
        }

        if transition == Transition::Completed {
            self.status = SessionStatus::Complete;
            self.feedback = None;
            info!(
                test = %self.test_type,
                eye = ?self.eye,
                level = self.level,
                trials = self.trials.len(),
                "session complete"
            );
            return ResponseOutcome {
                correct,
                feedback: None,
                transition,
                level_result,
            };
        }

        let feedback = if self.policy.feedback_ms > 0 {
            let cue = if self.policy.graded_feedback {
                Feedback::from_correct(correct)
            } else {
                Feedback::Recorded
            };
            self.feedback = Some(PendingFeedback {
                feedback: cue,
                until_ns: now.saturating_add(self.policy.feedback_ms.saturating_mul(1_000_000)),
            });
            self.status = SessionStatus::Feedback;
            Some(cue)
        } else {
            self.present_next();
            None
        };

        ResponseOutcome {
            correct,
            feedback,
            transition,
            level_result,
        }
    }

    /// Records the timeout response for a stimulus left pending past the
    /// response window.
    fn lapse_response_window(&mut self) -> Option<ResponseOutcome> {
        if self.status != SessionStatus::Running {
            return None;
        }
        let window = self.policy.response_window()?;
        let response = self.current.as_ref().and_then(|trial| {
            if self.timer.elapsed(trial.presented_at) >= window {
                trial.stimulus.timeout_response()
            } else {
                None
            }
        })?;
        let trial = self.current.take()?;
        debug!(test = %self.test_type, trial = trial.id, "response window lapsed");
        let correct = trial.stimulus.judge(&response).unwrap_or(false);
        Some(self.apply_response(trial, response, correct))
    }

    fn expire_feedback(&mut self) -> bool {
        match self.feedback {
            Some(pending)
                if self.status == SessionStatus::Feedback && self.timer.now() >= pending.until_ns =>
            {
                self.feedback = None;
                self.status = SessionStatus::Running;
                self.present_next();
                true
            }
            _ => false,
        }
    }

    fn present_next(&mut self) {
        if self.current.is_some() {
            return;
        }
        let stimulus = self.generate_stimulus();
        let trial = ActiveTrial {
            id: self.trials.len(),
            level: self.level,
            stimulus,
            presented_at: self.timer.now(),
        };
        debug!(
            test = %self.test_type,
            trial = trial.id,
            level = trial.level,
            stimulus = ?trial.stimulus,
            "stimulus presented"
        );
        self.current = Some(trial);
    }

    fn generate_stimulus(&mut self) -> Stimulus {
        let index = self.level.saturating_sub(1) as usize;
        match self.test_type {
            TestType::VisualAcuity => {
                let lines = &self.config.visual_acuity.snellen_denominators;
                let snellen_denominator = lines
                    .get(index)
                    .or(lines.last())
                    .copied()
                    .unwrap_or(20);
                let direction = Direction::ALL[self.rng.random_range(0..Direction::ALL.len())];
                Stimulus::TumblingE {
                    direction,
                    snellen_denominator,
                    // 20/20 optotype subtends 5 arcmin.
                    size_arcmin: 5.0 * f32::from(snellen_denominator) / 20.0,
                }
            }
            TestType::ContrastSensitivity => {
                let c = &self.config.contrast_sensitivity;
                let log_cs = c
                    .log_cs_steps
                    .get(index)
                    .or(c.log_cs_steps.last())
                    .copied()
                    .unwrap_or(0.0);
                let letter = c.letters.choose(&mut self.rng).copied().unwrap_or('C');
                Stimulus::ContrastLetter {
                    letter,
                    log_cs,
                    contrast: 10f32.powf(-log_cs),
                }
            }
            TestType::ColorVision => {
                let digits = self
                    .config
                    .color_vision
                    .plates
                    .get(index)
                    .cloned()
                    .unwrap_or_default();
                Stimulus::Plate {
                    number: self.level.min(u32::from(u8::MAX)) as u8,
                    digits,
                }
            }
            TestType::AmslerGrid => Stimulus::AmslerQuestion {
                question: AmslerQuestion::ALL[index.min(AmslerQuestion::ALL.len() - 1)],
            },
            TestType::Astigmatism => Stimulus::ClockDial {
                lines: self.config.astigmatism.dial_lines,
            },
            TestType::PeripheralVision => {
                let bearing = Bearing::ALL[self.rng.random_range(0..Bearing::ALL.len())];
                let (lo, hi) = self.config.peripheral_vision.eccentricity_range_deg;
                let eccentricity_deg = if hi > lo {
                    self.rng.random_range(lo..=hi)
                } else {
                    lo
                };
                Stimulus::PeripheralFlash {
                    bearing,
                    eccentricity_deg,
                }
            }
        }
    }

    fn build_result(&self) -> Result<TestResult, EngineError> {
        if self.status != SessionStatus::Complete {
            return Err(EngineError::WrongStatus {
                operation: "finalize",
                status: self.status,
            });
        }
        if self.finalized {
            return Err(EngineError::AlreadyFinalized);
        }
        let (summary, status) = scoring::summarize(
            self.test_type,
            &self.config,
            &self.trials,
            &self.level_results,
        );
        Ok(TestResult {
            test_type: self.test_type,
            eye: self.eye,
            summary,
            status,
            trials: self.trials.len(),
            highest_level: self.level,
            completed_at: Utc::now(),
        })
    }

    fn reset_progress(&mut self) {
        self.level = self.policy.start_level;
        self.correct_in_level = 0;
        self.total_in_level = 0;
        self.current = None;
        self.trials.clear();
        self.level_results.clear();
        self.feedback = None;
        self.finalized = false;
    }

    fn expect_status(
        &self,
        operation: &'static str,
        expected: SessionStatus,
    ) -> Result<(), EngineError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(EngineError::WrongStatus {
                operation,
                status: self.status,
            })
        }
    }

    pub fn test_type(&self) -> TestType {
        self.test_type
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn eye(&self) -> Option<Eye> {
        self.eye
    }

    /// Current difficulty level, 1-based.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Trials answered so far within the current level.
    pub fn trial_index(&self) -> u32 {
        self.total_in_level
    }

    pub fn correct_in_level(&self) -> u32 {
        self.correct_in_level
    }

    pub fn total_in_level(&self) -> u32 {
        self.total_in_level
    }

    pub fn policy(&self) -> &TestPolicy {
        &self.policy
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn current_stimulus(&self) -> Option<&Stimulus> {
        self.current.as_ref().map(|t| &t.stimulus)
    }

    /// Feedback cue while the window is open.
    pub fn feedback(&self) -> Option<Feedback> {
        self.feedback.map(|f| f.feedback)
    }

    pub fn feedback_remaining(&self) -> Option<Duration> {
        self.feedback.map(|f| {
            Duration::from_nanos(f.until_ns.saturating_sub(self.timer.now()))
        })
    }

    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    pub fn level_results(&self) -> &[LevelResult] {
        &self.level_results
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn screened_eyes(&self) -> &[Eye] {
        &self.screened_eyes
    }

    /// `(level, levels)` for progress display.
    pub fn level_progress(&self) -> (u32, u32) {
        (self.level, self.policy.levels)
    }
}
