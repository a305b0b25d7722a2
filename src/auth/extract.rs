//! Axum extractors gating handlers on the request's credential.
//!
//! A handler that takes [`Identity`] requires a valid token; one that takes
//! [`Administrative`] additionally requires the admin/manager role. Which
//! extractor a route's handler uses *is* the route's capability tag.
use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};

use crate::{
    auth::{Capability, Identity, TokenService},
    core::error::ApiError,
};

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
    Arc<TokenService>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let tokens = Arc::<TokenService>::from_ref(state);
        let raw = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        tokens.authenticate(raw).map_err(ApiError::from)
    }
}

/// A verified identity that also passed the admin/manager gate.
#[derive(Debug, Clone)]
pub struct Administrative(pub Identity);

impl<S> FromRequestParts<S> for Administrative
where
    S: Send + Sync,
    Arc<TokenService>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let identity = Identity::from_request_parts(parts, state).await?;
        if !Capability::AdminOrManager.permits(&identity) {
            return Err(ApiError::Forbidden);
        }
        Ok(Administrative(identity))
    }
}
