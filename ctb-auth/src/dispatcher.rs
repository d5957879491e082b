use std::sync::Arc;

use ctb_core::{
    ApiConfig, CredentialStore, JsonParser, ParsingError, ParsingErrors, RequestError,
    RequestResult, APP_TOKEN_KEY, USER_TOKEN_KEY,
};
use ctb_transport::{
    Authorization, CancellationToken, HttpRequest, HttpTransport, Request, Target,
    TransferProgress, TransportUnit, UnitOutcome,
};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::oauth::{
    client_credentials_request, login_failed_error, password_grant_request, OAuthToken,
    OAuthTokenParser,
};

pub const ACCEPT_JSON_API: &str = "application/vnd.api+json";

/// Resolves requests against the configured API and attaches the bearer
/// credential each one declares it needs.
///
/// - `Authorization::None`: sent as-is.
/// - `Authorization::AppLevel`: uses the cached application token, fetching
///   and caching one first when the store has none. If that exchange fails
///   the request still goes out without a token, so the caller sees the
///   backend's own authorization failure.
/// - `Authorization::UserLevel`: uses the cached user token when present.
pub struct AuthenticatedDispatcher {
    config: Arc<ApiConfig>,
    transport: Arc<dyn HttpTransport>,
    store: Arc<dyn CredentialStore>,
    app_token_lock: Mutex<()>,
}

impl AuthenticatedDispatcher {
    pub fn new<T, S>(config: ApiConfig, transport: T, store: S) -> Self
    where
        T: HttpTransport + 'static,
        S: CredentialStore + 'static,
    {
        Self::from_shared(Arc::new(config), Arc::new(transport), Arc::new(store))
    }

    /// Builds a dispatcher over collaborators the caller keeps handles to,
    /// e.g. one credential store shared by several dispatchers.
    pub fn from_shared(
        config: Arc<ApiConfig>,
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            config,
            transport,
            store,
            app_token_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub fn transport(&self) -> &Arc<dyn HttpTransport> {
        &self.transport
    }

    /// Absolute URL plus default headers; no credentials.
    pub fn resolve(&self, request: Request) -> HttpRequest {
        let url = match request.target {
            Target::Path(path) => self.config.url_for(&path),
            Target::Absolute(url) => url,
        };

        let mut headers = Vec::with_capacity(request.headers.len() + 2);
        if !request.without_default_headers {
            headers.push(("Accept".to_string(), ACCEPT_JSON_API.to_string()));
            if let Some(locale) = &self.config.locale {
                headers.push(("Accept-Language".to_string(), locale.clone()));
            }
        }
        headers.extend(request.headers);

        HttpRequest {
            method: request.method,
            url,
            headers,
            fields: request.fields,
            binary: request.binary,
        }
    }

    pub async fn send(&self, request: Request, cancel: &CancellationToken) -> UnitOutcome {
        self.send_tracked(request, cancel, TransferProgress::new()).await
    }

    /// Like `send`, reporting transfer progress into `progress`.
    #[instrument(
        name = "dispatch",
        skip_all,
        fields(method = %request.method, authorization = ?request.authorization)
    )]
    pub async fn send_tracked(
        &self,
        request: Request,
        cancel: &CancellationToken,
        progress: TransferProgress,
    ) -> UnitOutcome {
        let token = match request.authorization {
            Authorization::None => None,
            Authorization::AppLevel => self.app_token(cancel).await,
            Authorization::UserLevel => {
                let token = self.store.get(USER_TOKEN_KEY);
                if token.is_none() {
                    debug!("no user token cached; sending unauthenticated");
                }
                token
            }
        };

        let mut http = self.resolve(request);
        if let Some(token) = token {
            http.headers
                .push(("Authorization".to_string(), format!("Bearer {token}")));
        }

        TransportUnit::new(http, cancel.clone())
            .with_progress(progress)
            .send(self.transport.as_ref())
            .await
    }

    /// Cached application token, exchanging for one when absent.
    ///
    /// The exchange is serialized and re-checked under the lock, so
    /// concurrent callers on this dispatcher trigger at most one exchange.
    async fn app_token(&self, cancel: &CancellationToken) -> Option<String> {
        if let Some(token) = self.store.get(APP_TOKEN_KEY) {
            return Some(token);
        }

        let _guard = self.app_token_lock.lock().await;
        if let Some(token) = self.store.get(APP_TOKEN_KEY) {
            return Some(token);
        }

        match self.exchange(client_credentials_request(&self.config), cancel).await {
            Ok(token) => {
                self.store.set(APP_TOKEN_KEY, &token.access_token);
                info!("application token cached");
                Some(token.access_token)
            }
            Err(RequestError::Cancelled) => None,
            Err(error) => {
                warn!(%error, "application token exchange failed; sending without token");
                None
            }
        }
    }

    async fn exchange(&self, request: Request, cancel: &CancellationToken) -> RequestResult<OAuthToken> {
        token_from(self.send_exchange(request, cancel).await)
    }

    async fn send_exchange(&self, request: Request, cancel: &CancellationToken) -> UnitOutcome {
        TransportUnit::new(self.resolve(request), cancel.clone())
            .send(self.transport.as_ref())
            .await
    }

    /// Password grant; stores the user token on success.
    #[instrument(skip_all)]
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        cancel: &CancellationToken,
    ) -> RequestResult<OAuthToken> {
        let outcome = self
            .send_exchange(password_grant_request(&self.config, username, password), cancel)
            .await;
        let body = outcome.body_text();
        let token = match token_from(outcome) {
            Err(RequestError::Http { status, .. }) => {
                let error = login_failed_error(&body);
                warn!(status, code = %error.code, "login rejected");
                return Err(RequestError::http(status, vec![error]));
            }
            result => result?,
        };
        self.store.set(USER_TOKEN_KEY, &token.access_token);
        info!("user logged in");
        Ok(token)
    }

    pub fn logout(&self) {
        self.store.delete(USER_TOKEN_KEY);
        info!("user logged out");
    }

    pub fn is_user_logged_in(&self) -> bool {
        self.store.has(USER_TOKEN_KEY)
    }

    /// Adopts a user token obtained elsewhere.
    pub fn set_user_token(&self, token: &str) {
        self.store.set(USER_TOKEN_KEY, token);
    }
}

fn token_from(outcome: UnitOutcome) -> RequestResult<OAuthToken> {
    let token = outcome.decode(&OAuthTokenParser, None)?;
    if token.access_token.is_empty() {
        return Err(RequestError::Parsing(ParsingErrors::single(
            ParsingError::missing_required(Some("access_token"), OAuthTokenParser.type_name()),
        )));
    }
    Ok(token)
}

impl std::fmt::Debug for AuthenticatedDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedDispatcher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
