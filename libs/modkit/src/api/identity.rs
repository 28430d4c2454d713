use axum::extract::FromRequestParts;
use axum::http::{request::Parts, HeaderName};
use uuid::Uuid;

use super::problem::{unauthorized, ProblemResponse};

/// Header set by the upstream identity provider for every authenticated request.
pub const USER_ID_HEADER: &str = "x-user-id";

pub fn header() -> HeaderName {
    HeaderName::from_static(USER_ID_HEADER)
}

/// Authenticated caller as asserted by the identity provider.
///
/// The service trusts the header; authorization happens downstream by comparing ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub Uuid);

impl Caller {
    pub fn id(&self) -> Uuid {
        self.0
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ProblemResponse;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| unauthorized("missing x-user-id header"))?;
        let raw = raw
            .to_str()
            .map_err(|_| unauthorized("x-user-id header is not valid text"))?;
        let id = Uuid::parse_str(raw.trim())
            .map_err(|_| unauthorized(format!("x-user-id '{raw}' is not a UUID")))?;
        Ok(Caller(id))
    }
}
