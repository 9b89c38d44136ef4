use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderMap, StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use log::warn;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

/// Header set by the gateway after validating the caller's token.
pub const AUTHORIZED_USER_HEADER: &str = "Authorized-User";

/// Authenticated caller as forwarded by the auth layer in the `Authorized-User` header.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedUser {
    /// UUID of the authenticated user.
    pub id: Uuid,
    /// Roles of the authenticated user.
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Rejection of a request without a valid `Authorized-User` header.
#[derive(Debug, PartialEq, Eq)]
pub struct MissingAuthorization(String);

impl IntoResponse for MissingAuthorization {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, Json(json!({ "error": self.0 }))).into_response()
    }
}

impl TryFrom<&HeaderMap> for AuthorizedUser {
    type Error = MissingAuthorization;

    /// Parses the JSON value of the `Authorized-User` header.
    fn try_from(headers: &HeaderMap) -> Result<Self, Self::Error> {
        let header = headers.get(AUTHORIZED_USER_HEADER).ok_or_else(|| {
            MissingAuthorization(format!("`{}` header is missing.", AUTHORIZED_USER_HEADER))
        })?;
        let value = header.to_str().map_err(|_| {
            MissingAuthorization(format!("`{}` header is not valid ASCII.", AUTHORIZED_USER_HEADER))
        })?;
        serde_json::from_str::<AuthorizedUser>(value).map_err(|e| {
            warn!("Malformed `{}` header: {}", AUTHORIZED_USER_HEADER, e);
            MissingAuthorization(format!("`{}` header is malformed.", AUTHORIZED_USER_HEADER))
        })
    }
}

impl<S> FromRequestParts<S> for AuthorizedUser
where
    S: Send + Sync,
{
    type Rejection = MissingAuthorization;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        AuthorizedUser::try_from(&parts.headers)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn parses_header_json() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZED_USER_HEADER,
            HeaderValue::from_str(&format!(r#"{{"id":"{id}","roles":["buyer"]}}"#)).unwrap(),
        );
        let user = AuthorizedUser::try_from(&headers).unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.roles, vec!["buyer".to_string()]);
    }

    #[test]
    fn roles_are_optional() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZED_USER_HEADER,
            HeaderValue::from_str(&format!(r#"{{"id":"{id}"}}"#)).unwrap(),
        );
        assert!(AuthorizedUser::try_from(&headers).unwrap().roles.is_empty());
    }

    #[test]
    fn missing_or_malformed_header_is_rejected() {
        assert!(AuthorizedUser::try_from(&HeaderMap::new()).is_err());
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZED_USER_HEADER, HeaderValue::from_static("{\"id\":42}"));
        assert!(AuthorizedUser::try_from(&headers).is_err());
    }
}
