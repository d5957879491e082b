use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use ctb_api::requests::{self, ABORTED_BY_USER};
use ctb_api::{CreationParser, UploadDestination, UploadDestinationParser};
use ctb_auth::AuthenticatedDispatcher;
use ctb_transport::{CancellationToken, TransferProgress};
use parking_lot::Mutex;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::error::{Halt, UploadError, UploadResult, MISSING_DATA_MESSAGE};
use crate::outcome::{UploadOutcome, UploadStep};
use crate::spec::{PayloadSource, RunId, UploadSpec};

/// Marker storage services put in error documents, sometimes with a 2xx
/// status.
const STORAGE_ERROR_MARKER: &str = "<Error>";

#[derive(Debug)]
struct SessionState {
    outcome: UploadOutcome,
    /// Token of the current run, or the one armed for the next run.
    cancel: CancellationToken,
    transfer: Option<TransferProgress>,
}

impl SessionState {
    fn transfer_ratio(&self) -> f32 {
        match (&self.transfer, self.outcome.step) {
            (Some(progress), UploadStep::TransferPayload) => progress.upload(),
            _ => 0.0,
        }
    }
}

/// Cancel and observe a session from other tasks.
#[derive(Debug, Clone)]
pub struct UploadHandle {
    state: Arc<Mutex<SessionState>>,
}

impl UploadHandle {
    /// Requests cancellation of the current run.
    ///
    /// Idempotent, and a no-op once the run is done. A cancel issued before
    /// `upload()` starts stops that run at its first checkpoint.
    pub fn cancel(&self) {
        let mut state = self.state.lock();
        if state.outcome.done || state.outcome.cancelled {
            return;
        }
        state.outcome.cancelled = true;
        state.cancel.cancel();
        info!(step = %state.outcome.step, "upload cancellation requested");
    }

    /// Upload ratio of the payload transfer; 0 outside that step.
    pub fn progress(&self) -> f32 {
        self.state.lock().transfer_ratio()
    }

    /// Snapshot of the current run, with live transfer progress.
    pub fn outcome(&self) -> UploadOutcome {
        let state = self.state.lock();
        UploadOutcome {
            progress: state.transfer_ratio(),
            ..state.outcome.clone()
        }
    }

    pub fn is_done(&self) -> bool {
        self.state.lock().outcome.done
    }
}

/// Runs the upload workflow for one `UploadSpec`.
///
/// Steps run strictly in sequence, each suspending on its network call.
/// Every cancellable call shares the run's cancellation token; the finish
/// notification gets a token of its own so a late cancel cannot leave the
/// backend with an open upload slot.
#[derive(Debug)]
pub struct UploadSession {
    dispatcher: Arc<AuthenticatedDispatcher>,
    spec: Arc<UploadSpec>,
    handle: UploadHandle,
    running: tokio::sync::Mutex<()>,
}

impl UploadSession {
    pub fn new(dispatcher: Arc<AuthenticatedDispatcher>, spec: UploadSpec) -> Self {
        let state = SessionState {
            outcome: UploadOutcome::default(),
            cancel: CancellationToken::new(),
            transfer: None,
        };
        Self {
            dispatcher,
            spec: Arc::new(spec),
            handle: UploadHandle {
                state: Arc::new(Mutex::new(state)),
            },
            running: tokio::sync::Mutex::new(()),
        }
    }

    pub fn spec(&self) -> &UploadSpec {
        &self.spec
    }

    pub fn handle(&self) -> UploadHandle {
        self.handle.clone()
    }

    pub fn cancel(&self) {
        self.handle.cancel();
    }

    pub fn progress(&self) -> f32 {
        self.handle.progress()
    }

    pub fn outcome(&self) -> UploadOutcome {
        self.handle.outcome()
    }

    /// Runs the workflow to completion and returns the final outcome.
    ///
    /// Concurrent calls on one session run one after the other.
    pub async fn upload(&self) -> UploadOutcome {
        let _running = self.running.lock().await;

        let run_id = RunId::new();
        let cancel = self.begin_run(run_id.clone());
        let span = info_span!(
            "upload",
            run_id = %run_id,
            extension = %self.spec.extension(),
            creation_id = tracing::field::Empty
        );

        let result = self.run(&cancel).instrument(span.clone()).await;
        let outcome = self.finish_run(result);

        span.in_scope(|| match outcome.termination() {
            Some(termination) => info!(?termination, "upload finished"),
            None => debug!("upload finished without termination"),
        });
        outcome
    }

    fn begin_run(&self, run_id: RunId) -> CancellationToken {
        let mut state = self.handle.state.lock();
        let cancel = state.cancel.clone();
        state.outcome = UploadOutcome {
            run_id: Some(run_id),
            cancelled: cancel.is_cancelled(),
            started_at: Some(Utc::now()),
            ..UploadOutcome::default()
        };
        state.transfer = None;
        cancel
    }

    fn finish_run(&self, result: Result<(), Halt>) -> UploadOutcome {
        let mut state = self.handle.state.lock();
        let outcome = &mut state.outcome;
        match result {
            Ok(()) => {
                outcome.cancelled = false;
                outcome.error = None;
            }
            Err(Halt::Cancelled) => {
                outcome.cancelled = true;
                outcome.error = None;
            }
            Err(Halt::Failed(error)) => {
                outcome.cancelled = false;
                outcome.error = Some(error);
            }
        }
        outcome.step = UploadStep::Done;
        outcome.done = true;
        outcome.finished_at = Some(Utc::now());
        let finished = outcome.clone();

        state.transfer = None;
        state.cancel = CancellationToken::new();
        finished
    }

    async fn run(&self, cancel: &CancellationToken) -> Result<(), Halt> {
        checkpoint(cancel)?;
        let creation_id = self.ensure_creation(cancel).await?;
        self.record_creation_id(&creation_id);

        checkpoint(cancel)?;
        let destination = self.prepare_upload(&creation_id, cancel).await?;

        // From here on the backend holds an open upload slot.
        if cancel.is_cancelled() {
            return Err(self.abort_by_user(&destination).await);
        }

        let payload = match self.spec.payload() {
            PayloadSource::Bytes(bytes) => bytes.clone(),
            PayloadSource::Url(url) => match self.download_source(url, cancel).await {
                Ok(bytes) => bytes,
                Err(Halt::Cancelled) => return Err(self.abort_by_user(&destination).await),
                Err(Halt::Failed(failure)) => {
                    if let Err(notify_error) =
                        self.notify_finished(&destination, Some(&failure.to_string())).await
                    {
                        self.record_secondary(notify_error);
                    }
                    return Err(Halt::Failed(failure));
                }
            },
        };

        if cancel.is_cancelled() {
            return Err(self.abort_by_user(&destination).await);
        }

        let transfer = self.transfer_payload(&destination, payload, cancel).await;
        let aborted_with = match &transfer {
            Ok(()) => None,
            Err((Halt::Cancelled, _)) => Some(ABORTED_BY_USER.to_string()),
            Err((Halt::Failed(_), message)) => Some(message.clone()),
        };
        let notified = self.notify_finished(&destination, aborted_with.as_deref()).await;

        match transfer {
            Err((halt, _)) => {
                if let Err(notify_error) = notified {
                    self.record_secondary(notify_error);
                }
                return Err(halt);
            }
            Ok(()) => notified?,
        }

        if let Some(gallery_id) = self.spec.gallery_id() {
            checkpoint(cancel)?;
            self.submit_to_gallery(gallery_id, &creation_id, cancel).await?;
        }
        Ok(())
    }

    async fn ensure_creation(&self, cancel: &CancellationToken) -> Result<String, Halt> {
        if let Some(creation_id) = self.spec.creation_id() {
            debug!(creation_id, "uploading into existing creation");
            return Ok(creation_id.to_string());
        }

        self.enter(UploadStep::EnsureEntity);
        let creation = self
            .dispatcher
            .send(requests::new_creation(self.spec.metadata()), cancel)
            .await
            .decode(&CreationParser, Some("data"))
            .map_err(Halt::from_backend)
            .map_err(log_internal)?;

        if creation.id.trim().is_empty() {
            return Err(log_internal(Halt::Failed(UploadError::internal(format!(
                "{MISSING_DATA_MESSAGE} Creation id is missing."
            )))));
        }
        Ok(creation.id)
    }

    async fn prepare_upload(
        &self,
        creation_id: &str,
        cancel: &CancellationToken,
    ) -> Result<UploadDestination, Halt> {
        self.enter(UploadStep::PrepareUpload);
        let destination = self
            .dispatcher
            .send(requests::creation_upload(creation_id, self.spec.extension()), cancel)
            .await
            .decode(&UploadDestinationParser, Some("data"))
            .map_err(Halt::from_backend)
            .map_err(log_internal)?;

        if destination.ping_url.trim().is_empty() || destination.post_url.trim().is_empty() {
            return Err(log_internal(Halt::Failed(UploadError::internal(format!(
                "{MISSING_DATA_MESSAGE} Upload destination has no ping or post URL."
            )))));
        }
        Ok(destination)
    }

    async fn download_source(&self, url: &str, cancel: &CancellationToken) -> Result<Bytes, Halt> {
        self.enter(UploadStep::DownloadSourcePayload);
        let outcome = self.dispatcher.send(requests::download(url), cancel).await;
        let body = outcome.body_text();
        let response = outcome
            .into_result()
            .map_err(|e| log_internal(Halt::from_foreign(e, &body)))?;
        debug!(bytes = response.body.len(), "source payload downloaded");
        Ok(response.body)
    }

    /// On failure also returns what the finish notification should report.
    async fn transfer_payload(
        &self,
        destination: &UploadDestination,
        payload: Bytes,
        cancel: &CancellationToken,
    ) -> Result<(), (Halt, String)> {
        let progress = TransferProgress::new();
        {
            let mut state = self.handle.state.lock();
            state.transfer = Some(progress.clone());
        }
        self.enter(UploadStep::TransferPayload);
        info!(bytes = payload.len(), "transferring payload");

        let outcome = self
            .dispatcher
            .send_tracked(requests::upload_payload(destination, payload), cancel, progress)
            .await;
        let body = outcome.body_text();

        match outcome.into_result() {
            Ok(_) if body.contains(STORAGE_ERROR_MARKER) => {
                let halt = Halt::Failed(UploadError::internal(format!(
                    "Response code '200' and body '{body}'"
                )));
                Err((log_internal(halt), body))
            }
            Ok(_) => Ok(()),
            Err(request_error) => {
                let message = if body.is_empty() {
                    request_error.to_string()
                } else {
                    body.clone()
                };
                Err((log_internal(Halt::from_foreign(request_error, &body)), message))
            }
        }
    }

    /// Closes the upload slot. Runs on its own token: once issued it is
    /// never cancelled.
    async fn notify_finished(
        &self,
        destination: &UploadDestination,
        aborted_with: Option<&str>,
    ) -> UploadResult<()> {
        self.enter(UploadStep::NotifyFinished);
        debug!(aborted_with, "notifying upload finished");

        let outcome = self
            .dispatcher
            .send(
                requests::upload_finished(&destination.ping_url, aborted_with),
                &CancellationToken::new(),
            )
            .await;

        match outcome.into_result().map_err(Halt::from_backend) {
            Ok(_) => Ok(()),
            Err(Halt::Failed(error)) => Err(error),
            Err(Halt::Cancelled) => Err(UploadError::internal("Finish notification was cancelled")),
        }
    }

    /// Tells the backend the user aborted, then yields the cancelled halt.
    async fn abort_by_user(&self, destination: &UploadDestination) -> Halt {
        if let Err(error) = self.notify_finished(destination, Some(ABORTED_BY_USER)).await {
            self.record_secondary(error);
        }
        Halt::Cancelled
    }

    async fn submit_to_gallery(
        &self,
        gallery_id: &str,
        creation_id: &str,
        cancel: &CancellationToken,
    ) -> Result<(), Halt> {
        self.enter(UploadStep::SubmitToCollection);
        info!(gallery_id, "submitting creation to gallery");
        self.dispatcher
            .send(requests::gallery_submission(gallery_id, creation_id), cancel)
            .await
            .into_result()
            .map(|_| ())
            .map_err(Halt::from_backend)
    }

    fn enter(&self, step: UploadStep) {
        self.handle.state.lock().outcome.step = step;
        info!(%step, "upload step");
    }

    fn record_creation_id(&self, creation_id: &str) {
        self.handle.state.lock().outcome.creation_id = Some(creation_id.to_string());
        tracing::Span::current().record("creation_id", creation_id);
    }

    fn record_secondary(&self, error: UploadError) {
        warn!(%error, "best-effort call failed");
        self.handle.state.lock().outcome.secondary_errors.push(error);
    }
}

fn checkpoint(cancel: &CancellationToken) -> Result<(), Halt> {
    if cancel.is_cancelled() {
        Err(Halt::Cancelled)
    } else {
        Ok(())
    }
}

fn log_internal(halt: Halt) -> Halt {
    if let Halt::Failed(UploadError::Internal { message }) = &halt {
        error!(%message, "upload failed with internal error");
    }
    halt
}
