use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::app::capture::ResponseCapture;
use crate::app::selection::select_questions;
use crate::domain::config::{CaptureConfig, ScoringConfig, SessionConfig, TimingConfig};
use crate::domain::{
    DomainError, Question, Response, ScoreBreakdown, SessionSettings, Stage,
};
use crate::ports::{MediaCapture, QuestionSource, ScoreProducer, ScoreRequest};

/// Outcome of answering the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionProgress {
    /// More questions remain; the next one is active.
    NextQuestion { index: usize },
    /// The last question was answered; the session is in Feedback.
    Finished,
}

/// Runtime configuration for one session controller.
#[derive(Debug, Clone, Default)]
pub struct SessionRuntime {
    pub timing: TimingConfig,
    pub capture: CaptureConfig,
    pub scoring: ScoringConfig,
    pub session: SessionConfig,
}

/// Interview session controller.
///
/// Owns the session state exclusively: settings, the ordered question
/// list, the in-progress index, collected responses and the stage. All
/// mutation goes through the transition operations below; state is
/// discarded on exit or restart, never persisted.
///
/// At most one `ResponseCapture` is active at a time, bound to the
/// current question; it must finish before the index advances.
pub struct InterviewSession {
    questions_source: Arc<dyn QuestionSource>,
    media: Arc<dyn MediaCapture>,
    scorer: Arc<dyn ScoreProducer>,
    runtime: SessionRuntime,
    rng: StdRng,

    stage: Stage,
    settings: Option<SessionSettings>,
    questions: Vec<Question>,
    current_index: usize,
    responses: Vec<Response>,
    capture: Option<ResponseCapture>,
    score: Option<ScoreBreakdown>,
}

impl InterviewSession {
    pub fn new(
        questions_source: Arc<dyn QuestionSource>,
        media: Arc<dyn MediaCapture>,
        scorer: Arc<dyn ScoreProducer>,
        runtime: SessionRuntime,
    ) -> Self {
        Self::with_rng(
            questions_source,
            media,
            scorer,
            runtime,
            StdRng::from_entropy(),
        )
    }

    /// Controller with a caller-supplied randomness source, for
    /// deterministic question selection.
    pub fn with_rng(
        questions_source: Arc<dyn QuestionSource>,
        media: Arc<dyn MediaCapture>,
        scorer: Arc<dyn ScoreProducer>,
        runtime: SessionRuntime,
        rng: StdRng,
    ) -> Self {
        Self {
            questions_source,
            media,
            scorer,
            runtime,
            rng,
            stage: Stage::Setup,
            settings: None,
            questions: Vec::new(),
            current_index: 0,
            responses: Vec::new(),
            capture: None,
            score: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn settings(&self) -> Option<&SessionSettings> {
        self.settings.as_ref()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn responses(&self) -> &[Response] {
        &self.responses
    }

    pub fn score(&self) -> Option<&ScoreBreakdown> {
        self.score.as_ref()
    }

    /// The capture controller bound to the current question.
    pub fn capture(&self) -> Option<&ResponseCapture> {
        self.capture.as_ref()
    }

    /// Start an interview with validated settings.
    ///
    /// Selects a fresh question sequence; an empty selection is a setup
    /// error and the session stays in Setup.
    pub fn start(&mut self, settings: SessionSettings) -> Result<(), DomainError> {
        if !self.stage.can_start() {
            return Err(DomainError::WrongStage {
                stage: self.stage,
                required: Stage::Setup,
            });
        }

        let selected = select_questions(
            self.questions_source.all(),
            settings.job_role,
            settings.difficulty,
            self.runtime.session.question_count,
            &mut self.rng,
        );
        if selected.is_empty() {
            return Err(DomainError::NoQuestions {
                role: settings.job_role.as_str().to_string(),
                difficulty: settings.difficulty.as_str().to_string(),
            });
        }

        info!(
            role = settings.job_role.as_str(),
            difficulty = settings.difficulty.as_str(),
            mode = ?settings.mode,
            questions = selected.len(),
            "Interview started"
        );

        self.settings = Some(settings);
        self.questions = selected;
        self.current_index = 0;
        self.responses.clear();
        self.score = None;
        self.stage = Stage::InProgress;
        self.activate_capture();
        Ok(())
    }

    /// Start recording the answer to the current question.
    pub async fn start_recording(&self) -> Result<(), DomainError> {
        self.active_capture()?.start_recording().await
    }

    /// Stop recording, collect the response and advance.
    pub async fn stop_recording(&mut self) -> Result<SessionProgress, DomainError> {
        let response = self.active_capture()?.stop_recording().await?;
        Ok(self.finish_question(response).await)
    }

    /// Submit a typed answer for the current question and advance.
    pub async fn submit_text(&mut self, text: &str) -> Result<SessionProgress, DomainError> {
        let response = self.active_capture()?.submit_text(text)?;
        Ok(self.finish_question(response).await)
    }

    /// Exit the interview mid-question. Any held capture device is
    /// released before the session returns to Setup.
    pub async fn exit(&mut self) -> Result<(), DomainError> {
        if !self.stage.can_answer() {
            return Err(DomainError::WrongStage {
                stage: self.stage,
                required: Stage::InProgress,
            });
        }
        if let Some(capture) = self.capture.take() {
            capture.cancel().await;
        }
        self.reset();
        info!("Interview exited");
        Ok(())
    }

    /// Discard the finished session for another practice run. The next
    /// start performs a brand-new question selection.
    pub fn practice_again(&mut self) -> Result<(), DomainError> {
        if !self.stage.can_restart() {
            return Err(DomainError::WrongStage {
                stage: self.stage,
                required: Stage::Feedback,
            });
        }
        self.reset();
        info!("Session reset for another practice run");
        Ok(())
    }

    fn active_capture(&self) -> Result<&ResponseCapture, DomainError> {
        if !self.stage.can_answer() {
            return Err(DomainError::WrongStage {
                stage: self.stage,
                required: Stage::InProgress,
            });
        }
        // InProgress always has an active capture; its absence would be a
        // controller bug, not caller misuse.
        Ok(self
            .capture
            .as_ref()
            .expect("in-progress session without active capture"))
    }

    async fn finish_question(&mut self, response: Response) -> SessionProgress {
        self.capture = None;
        self.responses.push(response);
        self.current_index += 1;
        assert_eq!(
            self.responses.len(),
            self.current_index,
            "session progress invariant broken"
        );
        assert!(
            self.current_index <= self.questions.len(),
            "current index advanced past question list"
        );

        if self.current_index < self.questions.len() {
            self.activate_capture();
            SessionProgress::NextQuestion {
                index: self.current_index,
            }
        } else {
            let score = self.request_score().await;
            self.score = Some(score);
            self.stage = Stage::Feedback;
            info!(questions = self.questions.len(), "Interview finished");
            SessionProgress::Finished
        }
    }

    fn activate_capture(&mut self) {
        let settings = self
            .settings
            .expect("in-progress session without settings");
        let question = self.questions[self.current_index].clone();
        self.capture = Some(ResponseCapture::new(
            question,
            settings.mode,
            Arc::clone(&self.media),
            self.runtime.timing.clone(),
            self.runtime.capture.clone(),
        ));
    }

    /// Score the collected responses, degrading on rejection or timeout so
    /// the feedback stage always renders.
    async fn request_score(&self) -> ScoreBreakdown {
        let settings = self
            .settings
            .expect("scoring requested without settings");
        let request = ScoreRequest {
            job_role: settings.job_role,
            difficulty: settings.difficulty,
            responses: self.responses.clone(),
        };

        match timeout(self.runtime.scoring.timeout(), self.scorer.score(request)).await {
            Ok(Ok(score)) => score,
            Ok(Err(err)) => {
                warn!(error = %err, "Scoring failed, using degraded score");
                ScoreBreakdown::degraded()
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.runtime.scoring.timeout_secs,
                    "Scoring timed out, using degraded score"
                );
                ScoreBreakdown::degraded()
            }
        }
    }

    fn reset(&mut self) {
        self.capture = None;
        self.settings = None;
        self.questions.clear();
        self.responses.clear();
        self.current_index = 0;
        self.score = None;
        self.stage = Stage::Setup;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::media_fake::FakeMediaCapture;
    use crate::adapters::{CannedScoreProducer, StaticQuestionBank};
    use crate::domain::{Difficulty, JobRole, Mode};
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::time::sleep;

    struct FailingScorer;

    #[async_trait]
    impl ScoreProducer for FailingScorer {
        async fn score(&self, _request: ScoreRequest) -> Result<ScoreBreakdown, DomainError> {
            Err(DomainError::Scoring("backend exploded".to_string()))
        }
    }

    struct HangingScorer;

    #[async_trait]
    impl ScoreProducer for HangingScorer {
        async fn score(&self, _request: ScoreRequest) -> Result<ScoreBreakdown, DomainError> {
            sleep(Duration::from_secs(3_600)).await;
            unreachable!("scorer never completes within the test window");
        }
    }

    fn settings(mode: Mode) -> SessionSettings {
        SessionSettings {
            job_role: JobRole::SoftwareEngineer,
            difficulty: Difficulty::Intermediate,
            mode,
        }
    }

    fn session_with(
        media: Arc<FakeMediaCapture>,
        scorer: Arc<dyn ScoreProducer>,
    ) -> InterviewSession {
        InterviewSession::with_rng(
            Arc::new(StaticQuestionBank::sample()),
            media,
            scorer,
            SessionRuntime::default(),
            StdRng::seed_from_u64(7),
        )
    }

    async fn wait_for_idle() {
        sleep(Duration::from_millis(1_600)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_requires_questions() {
        let media = Arc::new(FakeMediaCapture::new());
        let mut session = InterviewSession::with_rng(
            Arc::new(StaticQuestionBank::from_questions(Vec::new())),
            media,
            Arc::new(CannedScoreProducer::new()),
            SessionRuntime::default(),
            StdRng::seed_from_u64(7),
        );

        let err = session.start(settings(Mode::Text)).unwrap_err();
        assert!(matches!(err, DomainError::NoQuestions { .. }));
        assert_eq!(session.stage(), Stage::Setup);
        assert!(session.capture().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_invariant_through_full_session() {
        let media = Arc::new(FakeMediaCapture::new());
        let mut session = session_with(media, Arc::new(CannedScoreProducer::new()));

        session.start(settings(Mode::Text)).unwrap();
        assert_eq!(session.stage(), Stage::InProgress);
        // Software-engineer pool holds 3 questions in the sample bank.
        let total = session.questions().len();
        assert_eq!(total, 3);

        for answered in 1..=total {
            assert_eq!(session.responses().len(), session.current_index());
            wait_for_idle().await;
            let progress = session.submit_text("A typed answer.").await.unwrap();
            assert_eq!(session.responses().len(), answered);
            assert_eq!(session.current_index(), answered);

            if answered < total {
                assert_eq!(
                    progress,
                    SessionProgress::NextQuestion { index: answered }
                );
                assert_eq!(session.stage(), Stage::InProgress);
            } else {
                assert_eq!(progress, SessionProgress::Finished);
                assert_eq!(session.stage(), Stage::Feedback);
            }
        }

        let score = session.score().unwrap();
        assert!(!score.is_degraded());
    }

    #[tokio::test(start_paused = true)]
    async fn test_recorded_session_reaches_feedback() {
        let media = Arc::new(FakeMediaCapture::new());
        let mut session = session_with(Arc::clone(&media), Arc::new(CannedScoreProducer::new()));

        session.start(settings(Mode::Audio)).unwrap();
        let total = session.questions().len();

        for _ in 0..total {
            wait_for_idle().await;
            session.start_recording().await.unwrap();
            media.emit_partial("a spoken answer");
            sleep(Duration::from_secs(2)).await;
            session.stop_recording().await.unwrap();
        }

        assert_eq!(session.stage(), Stage::Feedback);
        assert_eq!(media.acquired_count(), 0);
        for response in session.responses() {
            assert_eq!(response.text.as_deref(), Some("a spoken answer"));
            assert_eq!(response.duration_secs, 2);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_exit_releases_device_before_setup() {
        let media = Arc::new(FakeMediaCapture::new());
        let mut session = session_with(Arc::clone(&media), Arc::new(CannedScoreProducer::new()));

        session.start(settings(Mode::Video)).unwrap();
        wait_for_idle().await;
        session.start_recording().await.unwrap();
        assert_eq!(media.acquired_count(), 1);

        session.exit().await.unwrap();
        assert_eq!(media.acquired_count(), 0);
        assert_eq!(session.stage(), Stage::Setup);
        assert!(session.responses().is_empty());
        assert!(session.questions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scoring_failure_degrades() {
        let media = Arc::new(FakeMediaCapture::new());
        let mut session = session_with(media, Arc::new(FailingScorer));

        session.start(settings(Mode::Text)).unwrap();
        let total = session.questions().len();
        for _ in 0..total {
            wait_for_idle().await;
            session.submit_text("answer").await.unwrap();
        }

        assert_eq!(session.stage(), Stage::Feedback);
        assert!(session.score().unwrap().is_degraded());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scoring_timeout_degrades() {
        let media = Arc::new(FakeMediaCapture::new());
        let mut session = session_with(media, Arc::new(HangingScorer));

        session.start(settings(Mode::Text)).unwrap();
        let total = session.questions().len();
        for _ in 0..total {
            wait_for_idle().await;
            session.submit_text("answer").await.unwrap();
        }

        assert_eq!(session.stage(), Stage::Feedback);
        assert!(session.score().unwrap().is_degraded());
    }

    #[tokio::test(start_paused = true)]
    async fn test_practice_again_reselects_questions() {
        let media = Arc::new(FakeMediaCapture::new());
        let mut session = session_with(media, Arc::new(CannedScoreProducer::new()));

        session.start(settings(Mode::Text)).unwrap();
        let total = session.questions().len();
        for _ in 0..total {
            wait_for_idle().await;
            session.submit_text("answer").await.unwrap();
        }
        assert_eq!(session.stage(), Stage::Feedback);

        session.practice_again().unwrap();
        assert_eq!(session.stage(), Stage::Setup);
        assert!(session.questions().is_empty());
        assert!(session.score().is_none());

        // A fresh selection is made; nothing of the old run remains.
        session.start(settings(Mode::Text)).unwrap();
        assert_eq!(session.questions().len(), 3);
        assert!(session.responses().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrong_stage_operations_are_rejected() {
        let media = Arc::new(FakeMediaCapture::new());
        let mut session = session_with(media, Arc::new(CannedScoreProducer::new()));

        assert!(matches!(
            session.submit_text("answer").await,
            Err(DomainError::WrongStage { .. })
        ));
        assert!(matches!(
            session.practice_again(),
            Err(DomainError::WrongStage { .. })
        ));
        assert!(matches!(session.exit().await, Err(DomainError::WrongStage { .. })));

        session.start(settings(Mode::Text)).unwrap();
        assert!(matches!(
            session.start(settings(Mode::Text)),
            Err(DomainError::WrongStage { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_text_does_not_advance() {
        let media = Arc::new(FakeMediaCapture::new());
        let mut session = session_with(media, Arc::new(CannedScoreProducer::new()));

        session.start(settings(Mode::Text)).unwrap();
        wait_for_idle().await;

        assert!(matches!(
            session.submit_text("").await,
            Err(DomainError::EmptyResponse)
        ));
        assert_eq!(session.current_index(), 0);
        assert!(session.responses().is_empty());
        assert_eq!(session.stage(), Stage::InProgress);
    }
}
