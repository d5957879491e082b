use std::sync::Arc;

use ctb_auth::AuthenticatedDispatcher;
use ctb_core::{ApiConfig, ArrayParser, MemoryCredentialStore, RequestResult};
use ctb_transport::{CancellationToken, ReqwestTransport};
use tracing::instrument;

use crate::dto::{CreationDto, LandingUrlDto, UserDto};
use crate::parsers::{CreationParser, LandingUrlParser, UserParser};
use crate::requests;

/// Request/response calls against the Creatubbles API.
///
/// Cloning is cheap; clones share one dispatcher and therefore one
/// credential store.
#[derive(Debug, Clone)]
pub struct CtbClient {
    dispatcher: Arc<AuthenticatedDispatcher>,
}

impl CtbClient {
    pub fn new(dispatcher: AuthenticatedDispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }

    pub fn from_shared(dispatcher: Arc<AuthenticatedDispatcher>) -> Self {
        Self { dispatcher }
    }

    /// reqwest transport plus an in-memory credential store.
    pub fn from_config(config: ApiConfig) -> Self {
        Self::new(AuthenticatedDispatcher::new(
            config,
            ReqwestTransport::new(),
            MemoryCredentialStore::new(),
        ))
    }

    pub fn dispatcher(&self) -> &Arc<AuthenticatedDispatcher> {
        &self.dispatcher
    }

    pub async fn login(&self, username: &str, password: &str) -> RequestResult<()> {
        self.dispatcher
            .login(username, password, &CancellationToken::new())
            .await
            .map(|_| ())
    }

    pub fn logout(&self) {
        self.dispatcher.logout();
    }

    pub fn is_user_logged_in(&self) -> bool {
        self.dispatcher.is_user_logged_in()
    }

    pub fn set_user_token(&self, token: &str) {
        self.dispatcher.set_user_token(token);
    }

    #[instrument(skip(self))]
    pub async fn get_creation(&self, creation_id: &str) -> RequestResult<CreationDto> {
        self.dispatcher
            .send(requests::get_creation(creation_id), &CancellationToken::new())
            .await
            .decode(&CreationParser, Some("data"))
    }

    #[instrument(skip(self))]
    pub async fn landing_urls(&self) -> RequestResult<Vec<LandingUrlDto>> {
        self.dispatcher
            .send(requests::landing_urls(), &CancellationToken::new())
            .await
            .decode(&ArrayParser::new(LandingUrlParser), Some("data"))
    }

    #[instrument(skip(self))]
    pub async fn logged_in_user(&self) -> RequestResult<UserDto> {
        self.dispatcher
            .send(requests::logged_in_user(), &CancellationToken::new())
            .await
            .decode(&UserParser, Some("data"))
    }
}
