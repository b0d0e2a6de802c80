use std::{convert::Infallible, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::json;
use warp::{
    hyper::{Response, StatusCode},
    path, Filter, Rejection, Reply,
};

use crate::{
    auth::{Auth, AuthInternal},
    error::AuthError,
    types::{UserRecord, Username},
};

pub fn build_api_route_filter(
    auth: &Auth,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    path!("login")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_auth_state(auth.internal.clone()))
        .and_then(user_login)
}

/// Filter that admits only requests carrying a valid bearer token, and hands
/// the re-resolved user record to the wrapped handler.
pub fn with_auth(auth: &Auth) -> impl Filter<Extract = (UserRecord,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization")
        .and(with_auth_state(auth.internal.clone()))
        .and_then(bearer_auth_check)
}

/// Recovery handler collapsing every auth failure into one uniform
/// unauthorized response. Which check failed is recorded in the logs only.
pub async fn handle_auth_errors(err: Rejection) -> Result<impl Reply, Rejection> {
    if let Some(auth_error) = err.find::<AuthError>() {
        let response = match auth_error {
            AuthError::Store { .. } | AuthError::Configuration(_) | AuthError::Hash { .. } => {
                tracing::error!(error = %auth_error, "auth infrastructure failure");
                warp::reply::with_status(
                    "an internal error has occurred",
                    StatusCode::INTERNAL_SERVER_ERROR,
                )
                .into_response()
            }
            _ => {
                tracing::debug!(reason = %auth_error, "request unauthorized");
                warp::reply::with_header(
                    warp::reply::with_status("access denied", StatusCode::UNAUTHORIZED),
                    "www-authenticate",
                    "Bearer",
                )
                .into_response()
            }
        };
        return Ok(response);
    }

    Err(err)
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
}

async fn user_login(
    input: LoginRequest,
    auth: Arc<AuthInternal>,
) -> Result<impl Reply, Rejection> {
    let username = Username(input.username);

    let record = auth.authenticate(&username, &input.password).await?;
    let access_token = auth.issue_token(&record.username)?;

    tracing::debug!(user = %record.username.0, "login succeeded");

    Ok(Response::builder().body(
        json!(LoginResponse {
            access_token,
            token_type: "bearer".into(),
        })
        .to_string(),
    ))
}

// Unwrap the bearer token, validate it, and re-resolve the subject
async fn bearer_auth_check(
    header: Option<String>,
    auth: Arc<AuthInternal>,
) -> Result<UserRecord, Rejection> {
    let header = header.ok_or(AuthError::BadSignature { source: None })?;
    let token =
        strip_bearer_scheme(&header).ok_or(AuthError::BadSignature { source: None })?;

    let claims = auth.validate_token(token)?;
    let record = auth.resolve_subject(&claims.sub).await?;

    Ok(record)
}

// The auth scheme is matched case-insensitively per RFC 7235
fn strip_bearer_scheme(header: &str) -> Option<&str> {
    const SCHEME: &str = "bearer ";

    let scheme = header.get(..SCHEME.len())?;
    scheme
        .eq_ignore_ascii_case(SCHEME)
        .then(|| &header[SCHEME.len()..])
}

// functor that adds a reference to the internal auth state into the filter chain
fn with_auth_state(
    auth: Arc<AuthInternal>,
) -> impl Filter<Extract = (Arc<AuthInternal>,), Error = Infallible> + Clone {
    warp::any().map(move || auth.clone())
}
