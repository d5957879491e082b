use std::collections::HashMap;

use ctb_core::{ApiError, JsonParser, RequestError, RequestResult};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{HttpRequest, HttpResponse, HttpTransport, TransferProgress, TransportError};

/// One outbound call, performed exactly once.
///
/// `send` consumes the unit, so a unit can never be re-sent. Cancellation is
/// driven by the token the unit was built with: cancelling it while the call
/// is in flight drops the transport future and the outcome reads as
/// cancelled. Cancelling after the call settled has no effect.
#[derive(Debug)]
pub struct TransportUnit {
    request: HttpRequest,
    cancel: CancellationToken,
    progress: TransferProgress,
}

impl TransportUnit {
    pub fn new(request: HttpRequest, cancel: CancellationToken) -> Self {
        Self {
            request,
            cancel,
            progress: TransferProgress::new(),
        }
    }

    /// Reports transfer progress into an existing tracker.
    pub fn with_progress(mut self, progress: TransferProgress) -> Self {
        self.progress = progress;
        self
    }

    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    pub fn progress(&self) -> TransferProgress {
        self.progress.clone()
    }

    /// Token that cancels this unit.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn send(self, transport: &dyn HttpTransport) -> UnitOutcome {
        let TransportUnit {
            request,
            cancel,
            progress,
        } = self;
        let method = request.method;
        let url = request.url.clone();

        if cancel.is_cancelled() {
            debug!(%method, %url, "request cancelled before dispatch");
            return UnitOutcome::new(UnitState::Cancelled, progress);
        }

        debug!(%method, %url, "sending request");
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = transport.execute(request, progress.clone()) => Some(result),
        };

        let state = match result {
            None => {
                debug!(%method, %url, "request cancelled in flight");
                UnitState::Cancelled
            }
            Some(Ok(response)) => {
                progress.complete();
                debug!(%method, %url, status = response.status, "request completed");
                UnitState::Completed(response)
            }
            Some(Err(error)) => {
                debug!(%method, %url, %error, "request failed in transport");
                UnitState::Failed(error)
            }
        };
        UnitOutcome::new(state, progress)
    }
}

/// How a unit settled.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitState {
    /// A response was obtained, whatever its status.
    Completed(HttpResponse),
    /// No response was obtained.
    Failed(TransportError),
    Cancelled,
}

/// Read-only result of a settled `TransportUnit`.
#[derive(Debug, Clone)]
pub struct UnitOutcome {
    state: UnitState,
    progress: TransferProgress,
}

impl UnitOutcome {
    pub fn new(state: UnitState, progress: TransferProgress) -> Self {
        Self { state, progress }
    }

    pub fn state(&self) -> &UnitState {
        &self.state
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.state, UnitState::Cancelled)
    }

    pub fn is_transport_error(&self) -> bool {
        matches!(self.state, UnitState::Failed(_))
    }

    /// A response arrived with a status outside 200..=399.
    pub fn is_http_error(&self) -> bool {
        matches!(&self.state, UnitState::Completed(response) if !response.is_success())
    }

    pub fn response(&self) -> Option<&HttpResponse> {
        match &self.state {
            UnitState::Completed(response) => Some(response),
            _ => None,
        }
    }

    pub fn transport_error(&self) -> Option<&TransportError> {
        match &self.state {
            UnitState::Failed(error) => Some(error),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        self.response().map(|response| response.status)
    }

    pub fn body_bytes(&self) -> &[u8] {
        self.response().map(|response| &response.body[..]).unwrap_or_default()
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(self.body_bytes()).into_owned()
    }

    pub fn headers(&self) -> Option<&HashMap<String, String>> {
        self.response().map(|response| &response.headers)
    }

    pub fn upload_progress(&self) -> f32 {
        self.progress.upload()
    }

    pub fn download_progress(&self) -> f32 {
        self.progress.download()
    }

    /// Classifies the outcome. Cancellation is checked first so an aborted
    /// call is never reported as a transport or HTTP failure.
    pub fn into_result(self) -> RequestResult<HttpResponse> {
        match self.state {
            UnitState::Cancelled => Err(RequestError::Cancelled),
            UnitState::Failed(error) => Err(RequestError::transport(error.to_string())),
            UnitState::Completed(response) if response.is_success() => Ok(response),
            UnitState::Completed(response) => {
                let errors = ApiError::list_from_response(response.status, &response.text());
                Err(RequestError::http(response.status, errors))
            }
        }
    }

    /// Classifies the outcome and decodes a successful body with `parser`.
    pub fn decode<P: JsonParser>(self, parser: &P, key: Option<&str>) -> RequestResult<P::Output> {
        let response = self.into_result()?;
        Ok(parser.parse_str(&response.text(), key, true)?)
    }
}
