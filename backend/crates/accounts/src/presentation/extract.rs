//! Request Extractors

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequest, FromRequestParts, Multipart, Request};
use axum::http::{header, request::Parts};
use axum::{Form, Json};
use platform::client::{ClientFingerprint, extract_client_ip};
use platform::cookie::extract_cookie;
use serde::de::DeserializeOwned;

use crate::domain::repository::AccountsRepository;
use crate::error::AccountsError;
use crate::presentation::handlers::AccountsAppState;

/// Who is calling: fingerprint, IP and the presented session cookie
#[derive(Debug, Clone)]
pub struct ClientContext {
    pub fingerprint: ClientFingerprint,
    pub session_token: Option<String>,
}

impl<R> FromRequestParts<AccountsAppState<R>> for ClientContext
where
    R: AccountsRepository,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AccountsAppState<R>,
    ) -> Result<Self, Self::Rejection> {
        // Absent when the router is served without connect info (tests)
        let direct_ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.ip());

        let client_ip = extract_client_ip(&parts.headers, direct_ip);

        Ok(Self {
            fingerprint: ClientFingerprint::from_headers(&parts.headers, client_ip),
            session_token: extract_cookie(&parts.headers, &state.config.session_cookie_name),
        })
    }
}

/// Request body accepted as JSON, an urlencoded form or multipart form data
#[derive(Debug, Clone)]
pub struct Payload<T>(pub T);

enum BodyFormat {
    Json,
    Multipart,
    Form,
}

impl BodyFormat {
    fn of(req: &Request) -> Self {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.trim_start().to_ascii_lowercase())
            .unwrap_or_default();

        if content_type.starts_with("application/json") {
            BodyFormat::Json
        } else if content_type.starts_with("multipart/form-data") {
            BodyFormat::Multipart
        } else {
            BodyFormat::Form
        }
    }
}

impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = AccountsError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match BodyFormat::of(&req) {
            BodyFormat::Json => {
                let Json(value) = Json::<T>::from_request(req, state)
                    .await
                    .map_err(|e| AccountsError::MalformedBody(e.body_text()))?;
                Ok(Self(value))
            }
            BodyFormat::Multipart => {
                let multipart = Multipart::from_request(req, state)
                    .await
                    .map_err(|e| AccountsError::MalformedBody(e.body_text()))?;
                Ok(Self(from_multipart(multipart).await?))
            }
            BodyFormat::Form => {
                let Form(value) = Form::<T>::from_request(req, state)
                    .await
                    .map_err(|e| AccountsError::MalformedBody(e.body_text()))?;
                Ok(Self(value))
            }
        }
    }
}

/// Collects the text parts of a multipart body into `T`; file parts are ignored
async fn from_multipart<T: DeserializeOwned>(mut multipart: Multipart) -> Result<T, AccountsError> {
    let mut fields = serde_json::Map::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AccountsError::MalformedBody(e.body_text()))?
    {
        if field.file_name().is_some() {
            continue;
        }
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        let value = field
            .text()
            .await
            .map_err(|e| AccountsError::MalformedBody(e.body_text()))?;
        fields.insert(name, serde_json::Value::String(value));
    }

    serde_json::from_value(serde_json::Value::Object(fields))
        .map_err(|e| AccountsError::MalformedBody(e.to_string()))
}
