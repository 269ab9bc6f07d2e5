//! Session state and its pure transition function.
//!
//! The machine never performs IO. It interprets events (facts about what the
//! user or the endpoint did) and decides on commands (intent for IO) that the
//! controller executes.
//!
//! # Key Properties
//!
//! - **Immutable transitions**: `transition(&Session, event)` returns a new
//!   session, the previous one is untouched
//! - **Single in-flight slot**: entering `Submitting` allocates an
//!   [`AttemptId`]; completions for any other attempt are ignored
//! - **One event -> at most one command**
//!
//! ```text
//! Idle -[FileChosen: pdf]-> FileSelected
//! Idle/FileSelected/Error/Success -[FileChosen: not pdf]-> Error
//! FileSelected/Error/Success -[SubmitRequested]-> Submitting
//! Submitting -[ExtractionFinished: success]-> Success
//! Submitting -[ExtractionFinished: failure]-> Error
//! Submitting -[ExtractionFinished: cancelled]-> FileSelected
//! ```

use serde::Serialize;
use tracing::debug;

use crate::document::Document;
use crate::error::SessionError;
use crate::model::ModelId;
use crate::outcome::{ExtractionOutcome, ResultLocator};

/// Mutually exclusive phase of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    FileSelected,
    Submitting,
    Success,
    Error,
}

/// Identifies one submit attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AttemptId(u64);

impl AttemptId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct InFlight {
    attempt: AttemptId,
    /// A new file was chosen after this attempt started.
    superseded: bool,
}

/// The single stateful entity of the upload workflow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    phase: Phase,
    selected_file: Option<Document>,
    selected_model: ModelId,
    result_location: Option<ResultLocator>,
    error_message: Option<String>,
    in_flight: Option<InFlight>,
    next_attempt: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(ModelId::default())
    }
}

impl Session {
    pub fn new(default_model: ModelId) -> Self {
        Self {
            phase: Phase::Idle,
            selected_file: None,
            selected_model: default_model,
            result_location: None,
            error_message: None,
            in_flight: None,
            next_attempt: 1,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn selected_file(&self) -> Option<&Document> {
        self.selected_file.as_ref()
    }

    pub fn selected_model(&self) -> ModelId {
        self.selected_model
    }

    pub fn result_location(&self) -> Option<&ResultLocator> {
        self.result_location.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Attempt currently holding the in-flight slot, if any.
    pub fn in_flight(&self) -> Option<AttemptId> {
        self.in_flight.map(|f| f.attempt)
    }

    pub fn is_submitting(&self) -> bool {
        self.phase == Phase::Submitting
    }

    pub fn can_submit(&self) -> bool {
        !self.is_submitting() && self.selected_file.is_some()
    }

    fn clear_outcome(&mut self) {
        self.result_location = None;
        self.error_message = None;
    }

    fn fail(&mut self, err: &SessionError) {
        self.result_location = None;
        self.error_message = Some(err.to_string());
        self.phase = Phase::Error;
    }
}

/// Facts fed into the machine.
#[derive(Clone, Debug)]
pub enum SessionEvent {
    /// The upload surface produced a candidate artifact.
    FileChosen(Document),
    /// The user picked a model identifier (not yet validated).
    ModelChosen(String),
    SubmitRequested,
    ExtractionFinished {
        attempt: AttemptId,
        outcome: ExtractionOutcome,
    },
    CancelRequested,
}

/// Everything the extraction endpoint needs for one attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadRequest {
    pub attempt: AttemptId,
    pub document: Document,
    pub model: ModelId,
}

/// Intent for IO, executed by the controller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionCommand {
    Upload(UploadRequest),
    Abort(AttemptId),
}

/// Result of applying one event.
#[derive(Clone, Debug)]
pub struct Transition {
    pub session: Session,
    pub command: Option<SessionCommand>,
    /// Set when the event itself was invalid (bad file, unknown model).
    pub rejected: Option<SessionError>,
}

impl Transition {
    fn settled(session: Session) -> Self {
        Self {
            session,
            command: None,
            rejected: None,
        }
    }

    fn command(session: Session, command: SessionCommand) -> Self {
        Self {
            session,
            command: Some(command),
            rejected: None,
        }
    }

    fn rejected(session: Session, err: SessionError) -> Self {
        Self {
            session,
            command: None,
            rejected: Some(err),
        }
    }
}

/// Apply `event` to `session`, producing the next session and any command.
pub fn transition(session: &Session, event: SessionEvent) -> Transition {
    let mut next = session.clone();

    match event {
        SessionEvent::FileChosen(document) => {
            if !document.is_pdf() {
                let err = SessionError::invalid_file_type();
                if next.is_submitting() {
                    // Submitting stays authoritative; the caller still sees the rejection.
                    return Transition::rejected(next, err);
                }
                next.fail(&err);
                return Transition::rejected(next, err);
            }

            next.selected_file = Some(document);
            if let Some(flight) = next.in_flight.as_mut() {
                flight.superseded = true;
                return Transition::settled(next);
            }
            next.clear_outcome();
            next.phase = Phase::FileSelected;
            Transition::settled(next)
        }

        SessionEvent::ModelChosen(id) => match id.parse::<ModelId>() {
            Ok(model) => {
                next.selected_model = model;
                Transition::settled(next)
            }
            Err(err) => Transition::rejected(next, err),
        },

        SessionEvent::SubmitRequested => {
            if next.is_submitting() {
                debug!("submit ignored: attempt already in flight");
                return Transition::settled(next);
            }
            let Some(document) = next.selected_file.clone() else {
                debug!("submit ignored: no file selected");
                return Transition::settled(next);
            };

            let attempt = AttemptId(next.next_attempt);
            next.next_attempt += 1;
            next.in_flight = Some(InFlight {
                attempt,
                superseded: false,
            });
            next.clear_outcome();
            next.phase = Phase::Submitting;

            let request = UploadRequest {
                attempt,
                document,
                model: next.selected_model,
            };
            Transition::command(next, SessionCommand::Upload(request))
        }

        SessionEvent::ExtractionFinished { attempt, outcome } => {
            let flight = match next.in_flight {
                Some(flight) if flight.attempt == attempt => flight,
                _ => {
                    debug!(attempt = attempt.get(), "ignoring completion for stale attempt");
                    return Transition::settled(next);
                }
            };
            next.in_flight = None;

            if flight.superseded {
                next.clear_outcome();
                next.phase = Phase::FileSelected;
                return Transition::settled(next);
            }

            match outcome {
                ExtractionOutcome::Success { locator } => {
                    next.error_message = None;
                    next.result_location = Some(locator);
                    next.phase = Phase::Success;
                }
                ExtractionOutcome::Failure(err) => next.fail(&err),
                ExtractionOutcome::Cancelled => {
                    next.clear_outcome();
                    next.phase = Phase::FileSelected;
                }
            }
            Transition::settled(next)
        }

        SessionEvent::CancelRequested => match next.in_flight {
            Some(flight) => Transition::command(next, SessionCommand::Abort(flight.attempt)),
            None => Transition::settled(next),
        },
    }
}
