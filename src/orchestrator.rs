//! Generation lifecycle.
//!
//! [`GenerationState`] is the state machine (idle, loading, succeeded, failed) and only
//! changes through its transition methods. [`Generator`] owns one state, the form input
//! and the narrator, and runs attempts against a [`GenerationClient`].
//!
//! Triggers that arrive while an attempt is loading are ignored, and every completion is
//! checked against the attempt number it was started with.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, watch};
use tracing::{error, info, warn};

use crate::client::{GeneratedThumbnail, GenerationClient};
use crate::constants::{GENERATION_FAILED_MESSAGE, READ_FAILED_MESSAGE, VALIDATION_MESSAGE};
use crate::narrator::{NarrationGuard, Narrator};
use crate::payload::{ImagePayload, PayloadError};

/// Phase of the current generation attempt.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LifecycleState {
    /// Nothing has been submitted yet.
    #[default]
    Idle,
    /// Waiting for the generation service.
    Loading,
    /// The service returned a thumbnail.
    Succeeded {
        /// The generated image.
        thumbnail: GeneratedThumbnail,
    },
    /// Validation or generation failed.
    Failed {
        /// Message for the user.
        message: String,
    },
}

impl LifecycleState {
    /// Short lowercase name, eg `loading`.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Succeeded { .. } => "succeeded",
            Self::Failed { .. } => "failed",
        }
    }

    /// True while an attempt is in flight.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// The generated thumbnail, only present after success.
    pub fn thumbnail(&self) -> Option<&GeneratedThumbnail> {
        match self {
            Self::Succeeded { thumbnail } => Some(thumbnail),
            _ => None,
        }
    }

    /// The error message, only present after failure.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed { message } => Some(message),
            _ => None,
        }
    }
}

/// The lifecycle plus bookkeeping for the current attempt.
#[derive(Clone, Debug, Default)]
pub struct GenerationState {
    lifecycle: LifecycleState,
    attempt: u64,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl GenerationState {
    /// Current lifecycle phase.
    pub fn lifecycle(&self) -> &LifecycleState {
        &self.lifecycle
    }

    /// Number of the latest attempt; zero before the first.
    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    /// When the latest attempt started.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// When the latest attempt or validation failure settled.
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Enters loading for a new attempt, dropping any previous result or error.
    /// Returns the attempt number, or `None` if an attempt is already loading.
    pub fn begin(&mut self) -> Option<u64> {
        if self.lifecycle.is_loading() {
            return None;
        }
        self.attempt += 1;
        self.lifecycle = LifecycleState::Loading;
        self.started_at = Some(Utc::now());
        self.finished_at = None;
        Some(self.attempt)
    }

    /// Fails without starting an attempt. Ignored while loading.
    pub fn reject(&mut self, message: &str) -> bool {
        if self.lifecycle.is_loading() {
            return false;
        }
        self.lifecycle = LifecycleState::Failed {
            message: message.to_string(),
        };
        self.finished_at = Some(Utc::now());
        true
    }

    /// Completes `attempt` with a thumbnail. Ignored unless `attempt` is the one loading.
    pub fn succeed(&mut self, attempt: u64, thumbnail: GeneratedThumbnail) -> bool {
        if !self.settles(attempt) {
            return false;
        }
        self.lifecycle = LifecycleState::Succeeded { thumbnail };
        self.finished_at = Some(Utc::now());
        true
    }

    /// Completes `attempt` with an error. Ignored unless `attempt` is the one loading.
    pub fn fail(&mut self, attempt: u64, message: &str) -> bool {
        if !self.settles(attempt) {
            return false;
        }
        self.lifecycle = LifecycleState::Failed {
            message: message.to_string(),
        };
        self.finished_at = Some(Utc::now());
        true
    }

    fn settles(&self, attempt: u64) -> bool {
        self.lifecycle.is_loading() && self.attempt == attempt
    }
}

/// What the user has entered so far.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormInput {
    title: String,
    headshot: Option<ImagePayload>,
}

impl FormInput {
    /// The video title as typed.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The selected headshot, if any.
    pub fn headshot(&self) -> Option<&ImagePayload> {
        self.headshot.as_ref()
    }

    /// A request, if both a title and a headshot are present.
    pub fn request(&self) -> Option<GenerationRequest> {
        let title = self.title.trim();
        if title.is_empty() {
            return None;
        }
        let headshot = self.headshot.clone()?;
        Some(GenerationRequest {
            title: title.to_string(),
            headshot,
        })
    }
}

/// Everything one attempt sends to the generation service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Video title, trimmed.
    pub title: String,
    /// The headshot to build the thumbnail around.
    pub headshot: ImagePayload,
}

/// Result of triggering a generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Title or headshot missing; the state is now failed.
    Invalid,
    /// An attempt is already loading; nothing changed.
    AlreadyRunning,
    /// Attempt with this number was started.
    Started(u64),
}

/// A consistent view of the generator for rendering.
#[derive(Clone, Debug)]
pub struct Snapshot {
    /// Lifecycle phase.
    pub lifecycle: LifecycleState,
    /// Latest attempt number.
    pub attempt: u64,
    /// Narrator message, only while loading.
    pub loading_message: Option<&'static str>,
    /// Title as entered.
    pub title: String,
    /// Preview data URL of the selected headshot.
    pub headshot_preview: Option<String>,
    /// Start of the latest attempt.
    pub started_at: Option<DateTime<Utc>>,
    /// End of the latest attempt.
    pub finished_at: Option<DateTime<Utc>>,
}

struct Attempt {
    id: u64,
    request: GenerationRequest,
    narration: NarrationGuard,
}

/// Owns the lifecycle and runs generation attempts.
pub struct Generator<C> {
    client: Arc<C>,
    state: Arc<watch::Sender<GenerationState>>,
    input: Arc<RwLock<FormInput>>,
    narrator: Narrator,
}

impl<C> Clone for Generator<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            state: Arc::clone(&self.state),
            input: Arc::clone(&self.input),
            narrator: self.narrator.clone(),
        }
    }
}

impl<C: GenerationClient> Generator<C> {
    /// Creates an idle generator.
    pub fn new(client: C, narrator: Narrator) -> Self {
        let (state, _) = watch::channel(GenerationState::default());
        Self {
            client: Arc::new(client),
            state: Arc::new(state),
            input: Arc::new(RwLock::new(FormInput::default())),
            narrator,
        }
    }

    /// The generation service.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// The narrator driven by this generator.
    pub fn narrator(&self) -> &Narrator {
        &self.narrator
    }

    /// Replaces the title.
    pub async fn set_title(&self, title: impl Into<String>) {
        self.input.write().await.title = title.into();
    }

    /// Replaces the headshot.
    pub async fn set_headshot(&self, headshot: ImagePayload) {
        self.input.write().await.headshot = Some(headshot);
    }

    /// Surfaces a headshot that could not be read. The previous headshot is kept. Returns
    /// false if an attempt is loading, in which case only a warning is logged.
    pub fn report_unreadable_headshot(&self, err: &PayloadError) -> bool {
        warn!("Failed to read headshot: {err}");
        self.state
            .send_if_modified(|state| state.reject(READ_FAILED_MESSAGE))
    }

    /// Current input.
    pub async fn input(&self) -> FormInput {
        self.input.read().await.clone()
    }

    /// Current state.
    pub fn state(&self) -> GenerationState {
        self.state.borrow().clone()
    }

    /// Observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<GenerationState> {
        self.state.subscribe()
    }

    /// State, narrator message and input in one view.
    pub async fn snapshot(&self) -> Snapshot {
        let input = self.input().await;
        let state = self.state();
        let loading_message = if state.lifecycle().is_loading() {
            self.narrator.current_message()
        } else {
            None
        };
        Snapshot {
            lifecycle: state.lifecycle().clone(),
            attempt: state.attempt(),
            loading_message,
            title: input.title,
            headshot_preview: input
                .headshot
                .map(|headshot| headshot.preview_url().to_string()),
            started_at: state.started_at(),
            finished_at: state.finished_at(),
        }
    }

    /// Runs one attempt and waits for it to settle.
    pub async fn generate(&self) -> SubmitOutcome {
        match self.begin().await {
            Ok(attempt) => {
                let id = attempt.id;
                self.run(attempt).await;
                SubmitOutcome::Started(id)
            }
            Err(outcome) => outcome,
        }
    }

    /// Starts one attempt in the background and returns once it is loading.
    pub async fn submit(&self) -> SubmitOutcome {
        match self.begin().await {
            Ok(attempt) => {
                let id = attempt.id;
                let generator = self.clone();
                tokio::spawn(async move { generator.run(attempt).await });
                SubmitOutcome::Started(id)
            }
            Err(outcome) => outcome,
        }
    }

    async fn begin(&self) -> Result<Attempt, SubmitOutcome> {
        let request = self.input.read().await.request();

        let mut outcome = Err(SubmitOutcome::AlreadyRunning);
        self.state.send_if_modified(|state| {
            if state.lifecycle().is_loading() {
                return false;
            }
            outcome = if request.is_some() {
                // narration is back at the first message before anyone can observe loading
                let narration = self.narrator.start();
                state
                    .begin()
                    .map(|id| (id, narration))
                    .ok_or(SubmitOutcome::AlreadyRunning)
            } else {
                state.reject(VALIDATION_MESSAGE);
                Err(SubmitOutcome::Invalid)
            };
            true
        });

        let (id, narration) = outcome.inspect_err(|outcome| {
            if *outcome == SubmitOutcome::Invalid {
                info!("Rejected submission with missing title or headshot");
            }
        })?;
        let request = request.ok_or(SubmitOutcome::Invalid)?;
        info!(attempt = id, title = %request.title, "Generating thumbnail");
        Ok(Attempt {
            id,
            request,
            narration,
        })
    }

    async fn run(&self, attempt: Attempt) {
        let Attempt {
            id,
            request,
            narration,
        } = attempt;
        let result = self
            .client
            .generate_thumbnail(
                &request.title,
                request.headshot.base64(),
                request.headshot.mime_type(),
            )
            .await;
        narration.stop();

        match result {
            Ok(thumbnail) => {
                if self
                    .state
                    .send_if_modified(|state| state.succeed(id, thumbnail))
                {
                    info!(attempt = id, "Thumbnail generated");
                }
            }
            Err(err) => {
                error!(attempt = id, "Thumbnail generation failed: {err}");
                self.state
                    .send_if_modified(|state| state.fail(id, GENERATION_FAILED_MESSAGE));
            }
        }
    }
}
