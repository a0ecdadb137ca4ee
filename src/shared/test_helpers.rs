#[cfg(test)]
use crate::features::auth::model::AuthenticatedUser;

#[cfg(test)]
use axum::{extract::Request, middleware::Next, response::Response, Router};

#[cfg(test)]
pub fn create_admin_user() -> AuthenticatedUser {
    AuthenticatedUser {
        sub: "test-admin".to_string(),
        roles: vec![crate::shared::constants::ROLE_ADMIN.to_string()],
    }
}

#[cfg(test)]
async fn inject_admin_middleware(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(create_admin_user());
    next.run(request).await
}

#[cfg(test)]
pub fn with_admin_auth(router: Router) -> Router {
    router.layer(axum::middleware::from_fn(inject_admin_middleware))
}

#[cfg(test)]
pub const TEST_JWT_SECRET: &str = "test-secret-with-enough-entropy";

#[cfg(test)]
#[derive(serde::Serialize)]
struct TestClaims<'a> {
    sub: &'a str,
    exp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    iss: Option<&'a str>,
    roles: Vec<&'a str>,
}

/// Sign an HS256 token with `TEST_JWT_SECRET`, expiring `exp_offset` seconds from now
#[cfg(test)]
pub fn issue_token(sub: &str, roles: Vec<&str>, exp_offset: i64, iss: Option<&str>) -> String {
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

    let claims = TestClaims {
        sub,
        exp: chrono::Utc::now().timestamp() + exp_offset,
        iss,
        roles,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap()
}
