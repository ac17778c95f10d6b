use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rocket::http::Status;
use rocket::outcome::Outcome;
use rocket::request::{self, FromRequest, Request};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::util::date_time_as_unix_seconds;
use crate::data::user::User;
use crate::resp::problem::Problem;
use crate::role::Role;
use crate::security::Security;

pub static AUTH_HEADER: &str = "Authorization";
pub static BEARER_PREFIX: &str = "Bearer ";

/// Claims carried by the bearer credential: the caller's identity and role.
/// Handlers read authorization facts from this guard, never from the body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRoleToken {
    #[serde(with = "date_time_as_unix_seconds")]
    iat: DateTime<Utc>,
    #[serde(with = "date_time_as_unix_seconds")]
    exp: DateTime<Utc>,
    pub user: Uuid,
    pub role: Role,
}

impl UserRoleToken {
    pub fn new(user: &User) -> UserRoleToken {
        let now = Utc::now();
        UserRoleToken {
            iat: now,
            exp: now + Duration::weeks(1),
            user: user.id,
            role: user.role,
        }
    }

    #[cfg(test)]
    pub fn for_tests(user: Uuid, role: Role) -> UserRoleToken {
        let now = Utc::now();
        UserRoleToken {
            iat: now,
            exp: now + Duration::weeks(1),
            user,
            role,
        }
    }

    pub fn encode_jwt(
        &self,
        private_key: impl AsRef<[u8]>,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let header = Header::new(Algorithm::PS256);
        let key = EncodingKey::from_rsa_pem(private_key.as_ref())
            .expect("user_auth private key isn't valid. Unable to encode JWT.");

        encode(&header, &self, &key)
    }
}

pub fn auth_problem(detail: impl ToString) -> Problem {
    Problem::new_untyped(Status::Unauthorized, "Unable to authorize user.")
        .detail(detail)
        .clone()
}

pub fn extract_claims(
    auth_header: Option<&str>,
    public_key: impl AsRef<[u8]>,
) -> Result<UserRoleToken, Problem> {
    let token = match auth_header.and_then(|h| h.strip_prefix(BEARER_PREFIX)) {
        Some(token) => token.trim(),
        None => {
            return Err(auth_problem("No bearer credential."));
        }
    };

    match decode::<UserRoleToken>(
        token,
        &DecodingKey::from_rsa_pem(public_key.as_ref())
            .expect("user_auth public key isn't valid. Unable to decode JWT."),
        &Validation::new(Algorithm::PS256),
    )
    .map(|data| data.claims)
    {
        Ok(it) => {
            tracing::debug!("decoded user roles token for user: {}", it.user);

            Ok(it)
        }
        Err(_) => Err(auth_problem("Bearer credential was malformed or expired.")),
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for UserRoleToken {
    type Error = Problem;

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let security: &Security = req.rocket().state().expect("Security state is managed");

        tracing::trace!("extracting user roles token from the authorization header");
        let header = req.headers().get_one(AUTH_HEADER);
        match extract_claims(header, &security.jwt_keys.public) {
            Ok(claims) => Outcome::Success(claims),
            Err(e) => {
                tracing::debug!("unable to extract claims from authorization header");
                Outcome::Error((Status::Unauthorized, e))
            }
        }
    }
}

pub mod doc {
    use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

    /// Registers the bearer scheme referenced by `security(("jwt" = []))` on
    /// the documented routes.
    pub struct JWTAuth;

    impl utoipa::Modify for JWTAuth {
        fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
            let components = openapi
                .components
                .as_mut()
                .expect("generated document has component schemas");

            components.add_security_scheme(
                "jwt",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::SubsecRound;

    use super::*;
    use crate::security::Security;

    #[test]
    fn jwt_round_trips_through_bearer_header() {
        let mut now = Utc::now();
        now = now.round_subsecs(0);

        let user = Uuid::new_v4();

        let urt = UserRoleToken {
            iat: now,
            exp: now + Duration::weeks(1),
            user,
            role: Role::Admin,
        };

        let security = Security::load();

        let token = urt
            .encode_jwt(&security.jwt_keys.private)
            .expect("encoding should work for example");

        let header = format!("{}{}", BEARER_PREFIX, token);
        let decoded = extract_claims(Some(header.as_str()), &security.jwt_keys.public)
            .expect("decoding our own token should work");

        assert_eq!(now, decoded.iat);
        assert_eq!(now + Duration::weeks(1), decoded.exp);
        assert_eq!(user, decoded.user);
        assert_eq!(decoded.role, Role::Admin);
    }

    #[test]
    fn missing_header_is_rejected() {
        let security = Security::load();
        assert!(extract_claims(None, &security.jwt_keys.public).is_err());
        assert!(extract_claims(Some("Basic abc"), &security.jwt_keys.public).is_err());
    }
}
