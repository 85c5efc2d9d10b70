//! Framework-agnostic HTTP request handlers.
//!
//! Request handling is expressed over [`http`] header and status types so any
//! server framework can adapt it: build an [`AuthRequest`] from the incoming
//! headers, call an [`AuthService`] operation, and copy the returned
//! [`AuthResponse`] onto the outgoing response.

use std::sync::Arc;

use http::header::{AUTHORIZATION, CACHE_CONTROL, COOKIE, SET_COOKIE, USER_AGENT};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{error, instrument, warn};

use crate::cookie::{CookieJar, CookieNames, parse_cookie_header};
use crate::credentials::Credentials;
use crate::engine::{AuthOutcome, Identity, SessionEngine};
use crate::error::{AuthError, Error, InvalidInputError};
use crate::tokens::PresentedTokens;
use crate::traits::{CredentialStore, SessionStore};
use crate::types::NewUser;

/// Side header carrying a refresh token for non-cookie clients.
pub const X_REFRESH: HeaderName = HeaderName::from_static("x-refresh");

/// Response header carrying a renewed access token.
pub const X_ACCESS_TOKEN: HeaderName = HeaderName::from_static("x-access-token");

/// The parts of an incoming request the auth layer reads.
#[derive(Debug, Clone, Default)]
pub struct AuthRequest {
    tokens: PresentedTokens,
    user_agent: Option<String>,
}

impl AuthRequest {
    /// Extract tokens and user agent from request headers.
    ///
    /// The access token comes from its cookie, else `Authorization: Bearer`.
    /// The refresh token comes from its cookie, else `x-refresh`.
    pub fn from_headers(headers: &HeaderMap, names: &CookieNames) -> Self {
        let cookies = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| parse_cookie_header(v).into_iter())
            .filter(|(_, value)| !value.is_empty())
            .fold(std::collections::HashMap::new(), |mut acc, (k, v)| {
                acc.entry(k).or_insert(v);
                acc
            });

        let header = |name: &HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        let bearer = header(&AUTHORIZATION).and_then(|v| {
            v.strip_prefix("Bearer ")
                .or_else(|| v.strip_prefix("bearer "))
                .map(str::to_string)
        });

        let access = cookies.get(&names.access).cloned().or(bearer);
        let refresh = cookies.get(&names.refresh).cloned().or_else(|| header(&X_REFRESH));

        Self {
            tokens: PresentedTokens::new(access.as_deref(), refresh.as_deref()),
            user_agent: header(&USER_AGENT),
        }
    }

    pub fn tokens(&self) -> &PresentedTokens {
        &self.tokens
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }
}

/// Status, headers, and optional JSON body to send back.
#[derive(Debug, Clone)]
pub struct AuthResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl AuthResponse {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn json(status: StatusCode, body: Value) -> Self {
        Self {
            body: Some(body),
            ..Self::new(status)
        }
    }

    fn error(status: StatusCode, message: impl std::fmt::Display) -> Self {
        Self::json(status, json!({ "error": message.to_string() }))
    }

    /// Append a `Set-Cookie` header.
    pub fn set_cookie(&mut self, cookie: &str) {
        match HeaderValue::from_str(cookie) {
            Ok(value) => {
                self.headers.append(SET_COOKIE, value);
            }
            Err(e) => warn!(error = %e, "Dropping unencodable cookie"),
        }
    }

    /// Set a header, replacing any previous value.
    pub fn set_header(&mut self, name: HeaderName, value: &str) {
        match HeaderValue::from_str(value) {
            Ok(value) => {
                self.headers.insert(name, value);
            }
            Err(e) => warn!(header = %name, error = %e, "Dropping unencodable header"),
        }
    }

    /// Convert into an [`http::Response`] with a serialized JSON body.
    pub fn into_http(self) -> http::Response<Vec<u8>> {
        let mut headers = self.headers;
        let bytes = match &self.body {
            Some(body) => {
                headers.insert(
                    http::header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                );
                serde_json::to_vec(body).unwrap_or_default()
            }
            None => Vec::new(),
        };

        let mut response = http::Response::new(bytes);
        *response.status_mut() = self.status;
        *response.headers_mut() = headers;
        response
    }
}

/// Identity attached to a request after [`AuthService::current_session`].
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub identity: Option<Identity>,
}

impl RequestContext {
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// The identity, or [`AuthError::Unauthenticated`].
    pub fn require(&self) -> Result<&Identity, Error> {
        self.identity
            .as_ref()
            .ok_or_else(|| AuthError::Unauthenticated.into())
    }
}

/// Body of a user registration request.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

/// Body of a login request.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body of a password change request.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Request handlers for registration, login, session listing, and logout.
pub struct AuthService<C, S> {
    engine: Arc<SessionEngine<C, S>>,
    cookies: CookieJar,
}

impl<C, S> AuthService<C, S>
where
    C: CredentialStore,
    S: SessionStore,
{
    pub fn new(engine: Arc<SessionEngine<C, S>>) -> Self {
        let cookies = CookieJar::new(engine.config().cookie.clone());
        Self { engine, cookies }
    }

    pub fn engine(&self) -> &SessionEngine<C, S> {
        &self.engine
    }

    pub fn cookie_names(&self) -> &CookieNames {
        self.cookies.names()
    }

    /// Parse an incoming request using this service's cookie names.
    pub fn request(&self, headers: &HeaderMap) -> AuthRequest {
        AuthRequest::from_headers(headers, self.cookies.names())
    }

    /// `POST /users`: 201 with the public user, 409 on conflict, 400 on bad input.
    #[instrument(skip_all)]
    pub async fn create_user(&self, body: CreateUserRequest) -> AuthResponse {
        if body.password != body.password_confirmation {
            return Self::failure(
                InvalidInputError::Other {
                    message: "passwords do not match".to_string(),
                }
                .into(),
            );
        }

        let new_user = match NewUser::new(&body.username, &body.email, &body.password) {
            Ok(new_user) => new_user,
            Err(e) => return Self::failure(e),
        };

        match self.engine.register(new_user).await {
            Ok(user) => AuthResponse::json(StatusCode::CREATED, json!(user)),
            Err(e) => Self::failure(e),
        }
    }

    /// `POST /sessions`: 201 with `{accessToken, refreshToken, user}` and
    /// both cookies set, or 401.
    #[instrument(skip_all)]
    pub async fn login(&self, req: &AuthRequest, body: LoginRequest) -> AuthResponse {
        let credentials = Credentials::new(body.email, body.password);
        let output = match self.engine.login(&credentials, req.user_agent()).await {
            Ok(output) => output,
            Err(e) => return Self::failure(e),
        };

        let config = self.engine.config();
        let mut response = AuthResponse::json(
            StatusCode::CREATED,
            json!({
                "accessToken": output.access_token.as_str(),
                "refreshToken": output.refresh_token.as_str(),
                "user": output.user,
            }),
        );
        response.set_cookie(
            &self
                .cookies
                .access(output.access_token.as_str(), config.access_ttl()),
        );
        response.set_cookie(
            &self
                .cookies
                .refresh(output.refresh_token.as_str(), config.refresh_ttl()),
        );
        response
    }

    /// Middleware step: attach an identity to the request if its tokens allow.
    ///
    /// On renewal the new access token is written to `response` as both the
    /// `x-access-token` header and the access cookie.
    pub async fn current_session(
        &self,
        req: &AuthRequest,
        response: &mut AuthResponse,
    ) -> RequestContext {
        let outcome = self.engine.authenticate_request(req.tokens()).await;

        if let AuthOutcome::Renewed { access_token, .. } = &outcome {
            response.set_header(X_ACCESS_TOKEN, access_token.as_str());
            response.set_cookie(
                &self
                    .cookies
                    .access(access_token.as_str(), self.engine.config().access_ttl()),
            );
        }

        RequestContext {
            identity: outcome.into_identity(),
        }
    }

    /// `GET /me`: 200 with the public user, or 401.
    #[instrument(skip_all)]
    pub async fn me(&self, req: &AuthRequest) -> AuthResponse {
        let mut response = AuthResponse::new(StatusCode::OK);
        let ctx = self.current_session(req, &mut response).await;

        match ctx.identity {
            Some(identity) => response.body = Some(json!(identity.user)),
            None => response.status = StatusCode::UNAUTHORIZED,
        }
        response
    }

    /// `GET /sessions`: 200 with the caller's valid sessions, or 401.
    #[instrument(skip_all)]
    pub async fn list_sessions(&self, req: &AuthRequest) -> AuthResponse {
        let mut response = AuthResponse::new(StatusCode::OK);
        response.set_header(CACHE_CONTROL, "no-store");

        let ctx = self.current_session(req, &mut response).await;
        let Some(identity) = ctx.identity else {
            response.status = StatusCode::UNAUTHORIZED;
            return response;
        };

        match self.engine.list_sessions(identity.user_id()).await {
            Ok(sessions) => response.body = Some(json!(sessions)),
            Err(e) => {
                error!(error = %e, "Failed to list sessions");
                response.status = StatusCode::INTERNAL_SERVER_ERROR;
            }
        }
        response
    }

    /// `DELETE /sessions`: always 204, always clears both cookies.
    #[instrument(skip_all)]
    pub async fn logout(&self, req: &AuthRequest) -> AuthResponse {
        self.engine.logout(req.tokens()).await;
        self.cleared(StatusCode::NO_CONTENT)
    }

    /// `DELETE /sessions/all`: 204 after invalidating every session of the
    /// caller, or 401.
    #[instrument(skip_all)]
    pub async fn logout_all(&self, req: &AuthRequest) -> AuthResponse {
        let mut scratch = AuthResponse::new(StatusCode::NO_CONTENT);
        let ctx = self.current_session(req, &mut scratch).await;
        let Ok(identity) = ctx.require() else {
            return AuthResponse::new(StatusCode::UNAUTHORIZED);
        };

        match self.engine.revoke_all(identity.user_id()).await {
            Ok(_) => self.cleared(StatusCode::NO_CONTENT),
            Err(e) => Self::failure(e),
        }
    }

    /// `PUT /users/me/password`: 204, 401 on a wrong current password, 400 on
    /// a policy violation.
    #[instrument(skip_all)]
    pub async fn change_password(
        &self,
        req: &AuthRequest,
        body: ChangePasswordRequest,
    ) -> AuthResponse {
        let mut response = AuthResponse::new(StatusCode::NO_CONTENT);
        let ctx = self.current_session(req, &mut response).await;
        let Ok(identity) = ctx.require() else {
            return AuthResponse::new(StatusCode::UNAUTHORIZED);
        };

        match self
            .engine
            .change_password(identity.user_id(), &body.current_password, &body.new_password)
            .await
        {
            Ok(_) => response,
            Err(e) => Self::failure(e),
        }
    }

    fn cleared(&self, status: StatusCode) -> AuthResponse {
        let mut response = AuthResponse::new(status);
        for cookie in self.cookies.clear() {
            response.set_cookie(&cookie);
        }
        response
    }

    fn failure(err: Error) -> AuthResponse {
        match err {
            Error::Conflict(e) => AuthResponse::error(StatusCode::CONFLICT, e),
            Error::InvalidInput(e) => AuthResponse::error(StatusCode::BAD_REQUEST, e),
            Error::Auth(AuthError::InvalidCredentials) => {
                AuthResponse::error(StatusCode::UNAUTHORIZED, AuthError::InvalidCredentials)
            }
            Error::Auth(_) | Error::Token(_) => AuthResponse::new(StatusCode::UNAUTHORIZED),
            other => {
                error!(error = %other, "Request failed");
                AuthResponse::error(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
            }
        }
    }
}
