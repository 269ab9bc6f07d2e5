//! Session controller: applies events to the machine and executes its commands.
//!
//! All transitions go through one lock, so two transitions never interleave.
//! The only suspension point is the extraction call inside [`SessionController::submit`],
//! and the lock is not held across it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::BaseExtractionService;
use crate::document::Document;
use crate::error::{Result, SessionError};
use crate::machine::{
    transition, AttemptId, Phase, Session, SessionCommand, SessionEvent, UploadRequest,
};
use crate::model::ModelId;
use crate::outcome::{ExtractionOutcome, ResultLocator};
use crate::view::SessionView;

struct Inner {
    session: Session,
    /// Cancellation handle for the attempt holding the in-flight slot.
    abort: Option<(AttemptId, CancellationToken)>,
}

/// Owns one [`Session`] for the lifetime of a user visit.
pub struct SessionController {
    service: Arc<dyn BaseExtractionService>,
    inner: Mutex<Inner>,
    view_tx: watch::Sender<SessionView>,
    shutdown: CancellationToken,
}

impl SessionController {
    pub fn new(service: Arc<dyn BaseExtractionService>) -> Self {
        Self::with_default_model(service, ModelId::default())
    }

    pub fn with_default_model(service: Arc<dyn BaseExtractionService>, model: ModelId) -> Self {
        let session = Session::new(model);
        let (view_tx, _) = watch::channel(SessionView::project(&session));

        Self {
            service,
            inner: Mutex::new(Inner {
                session,
                abort: None,
            }),
            view_tx,
            shutdown: CancellationToken::new(),
        }
    }

    /// Accept a candidate artifact from the upload surface.
    ///
    /// Non-PDF candidates fail with `ValidationError("invalid file type")` and
    /// move the session to `Error` (unless an attempt is in flight).
    pub fn select_file(&self, document: Document) -> Result<()> {
        let file = document.name().to_string();
        let media_type = document.media_type().to_string();

        let (_, rejected) = self.apply(SessionEvent::FileChosen(document));
        match rejected {
            Some(err) => {
                warn!(file = %file, media_type = %media_type, "Rejected candidate file");
                Err(err)
            }
            None => {
                info!(file = %file, "File selected");
                Ok(())
            }
        }
    }

    /// Choose the processing model. Unknown identifiers leave the current one in effect.
    pub fn select_model(&self, id: &str) -> Result<ModelId> {
        let (_, rejected) = self.apply(SessionEvent::ModelChosen(id.to_string()));
        if let Some(err) = rejected {
            warn!(model = id, "Rejected unknown model");
            return Err(err);
        }
        info!(model = id, "Model selected");
        Ok(self.lock().session.selected_model())
    }

    /// Upload the selected file with the selected model.
    ///
    /// Returns `Ok(None)` without any network call when no file is selected or
    /// an attempt is already in flight. Also returns `Ok(None)` when the attempt
    /// was cancelled or superseded by a newer file selection, and after
    /// [`SessionController::shutdown`].
    pub async fn submit(&self) -> Result<Option<ResultLocator>> {
        if self.shutdown.is_cancelled() {
            debug!("submit ignored: controller is shut down");
            return Ok(None);
        }

        let (request, token) = {
            let mut inner = self.lock();
            let (command, _) = self.apply_locked(&mut inner, SessionEvent::SubmitRequested);
            let Some(SessionCommand::Upload(request)) = command else {
                return Ok(None);
            };
            let token = self.shutdown.child_token();
            inner.abort = Some((request.attempt, token.clone()));
            (request, token)
        };

        info!(
            attempt = request.attempt.get(),
            file = request.document.name(),
            model = %request.model,
            "Submitting report"
        );

        let mut guard = AttemptGuard {
            controller: self,
            attempt: Some(request.attempt),
        };
        let outcome = self.run(&request, &token).await;
        guard.attempt = None;

        self.finish(request.attempt, outcome)
    }

    /// Abort the in-flight attempt, if any. Returns true when one was aborted.
    pub fn cancel(&self) -> bool {
        let mut inner = self.lock();
        let (command, _) = self.apply_locked(&mut inner, SessionEvent::CancelRequested);
        let Some(SessionCommand::Abort(attempt)) = command else {
            return false;
        };

        match &inner.abort {
            Some((current, token)) if *current == attempt => {
                info!(attempt = attempt.get(), "Cancelling extraction");
                token.cancel();
                true
            }
            _ => false,
        }
    }

    /// Cancel any in-flight attempt. Called automatically on drop.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn session(&self) -> Session {
        self.lock().session.clone()
    }

    pub fn view(&self) -> SessionView {
        self.view_tx.borrow().clone()
    }

    /// Receive a fresh [`SessionView`] after every transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view_tx.subscribe()
    }

    async fn run(&self, request: &UploadRequest, token: &CancellationToken) -> ExtractionOutcome {
        tokio::select! {
            biased;
            _ = token.cancelled() => ExtractionOutcome::Cancelled,
            result = self.service.extract(request) => ExtractionOutcome::from(result),
        }
    }

    fn finish(&self, attempt: AttemptId, outcome: ExtractionOutcome) -> Result<Option<ResultLocator>> {
        let mut inner = self.lock();
        if matches!(&inner.abort, Some((current, _)) if *current == attempt) {
            inner.abort = None;
        }

        let current = inner.session.in_flight() == Some(attempt);
        self.apply_locked(
            &mut inner,
            SessionEvent::ExtractionFinished {
                attempt,
                outcome: outcome.clone(),
            },
        );
        if !current {
            return Ok(None);
        }

        match (inner.session.phase(), outcome) {
            (Phase::Success, ExtractionOutcome::Success { locator }) => {
                info!(attempt = attempt.get(), locator = %locator, "Extraction succeeded");
                Ok(Some(locator))
            }
            (Phase::Error, ExtractionOutcome::Failure(err)) => {
                warn!(attempt = attempt.get(), kind = err.kind(), error = %err, "Extraction failed");
                Err(err)
            }
            (phase, _) => {
                debug!(attempt = attempt.get(), ?phase, "Extraction outcome discarded");
                Ok(None)
            }
        }
    }

    fn apply(&self, event: SessionEvent) -> (Option<SessionCommand>, Option<SessionError>) {
        let mut inner = self.lock();
        self.apply_locked(&mut inner, event)
    }

    fn apply_locked(
        &self,
        inner: &mut Inner,
        event: SessionEvent,
    ) -> (Option<SessionCommand>, Option<SessionError>) {
        let t = transition(&inner.session, event);
        if t.session != inner.session {
            inner.session = t.session;
            self.view_tx.send_replace(SessionView::project(&inner.session));
        }
        (t.command, t.rejected)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Releases the in-flight slot if a submit future is dropped mid-request.
struct AttemptGuard<'a> {
    controller: &'a SessionController,
    attempt: Option<AttemptId>,
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        if let Some(attempt) = self.attempt.take() {
            let _ = self.controller.finish(attempt, ExtractionOutcome::Cancelled);
        }
    }
}
