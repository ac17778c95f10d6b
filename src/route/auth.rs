use mongodb::Database;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::State;
use utoipa::ToSchema;

use crate::config::Config;
use crate::data::user::db::{problem as user_problem, UserDbExt, UserLoginData, UserSignupData};
use crate::data::user::{PasswordHash, UserResponse};
use crate::resp::jwt::UserRoleToken;
use crate::resp::problem::Problem;
use crate::security::Security;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Register an account. Admin role is granted only through the configured
/// admin email list.
#[utoipa::path(request_body = UserSignupData, responses(
    (status = 201, description = "Account created", body = AuthResponse),
    (status = 400, description = "Invalid signup data or email already registered", body = Problem),
))]
#[post("/auth/register", format = "application/json", data = "<signup>")]
#[tracing::instrument(skip_all)]
pub async fn register(
    signup: Json<UserSignupData>,
    db: &State<Database>,
    c: &State<Config>,
    security: &State<Security>,
) -> Result<status::Created<Json<AuthResponse>>, Problem> {
    signup.validate()?;

    let user = db.create_user(signup.into_inner(), &c.admin_emails).await?;
    let token = UserRoleToken::new(&user).encode_jwt(&security.jwt_keys.private)?;

    Ok(status::Created::new(format!("/users/{}", user.id)).body(Json(AuthResponse {
        token,
        user: user.into(),
    })))
}

/// Exchange email and password for a bearer token.
#[utoipa::path(request_body = UserLoginData, responses(
    (status = 200, description = "Credentials accepted", body = AuthResponse),
    (status = 401, description = "Bad email or password", body = Problem),
))]
#[post("/auth/login", format = "application/json", data = "<login>")]
#[tracing::instrument(skip_all)]
pub async fn login(
    login: Json<UserLoginData>,
    db: &State<Database>,
    security: &State<Security>,
) -> Result<Json<AuthResponse>, Problem> {
    let user = db
        .find_user_by_email(&login.email)
        .await?
        .ok_or_else(user_problem::bad_login)?;

    if user.pw_hash != PasswordHash::new(&login.password) {
        return Err(user_problem::bad_login());
    }

    let token = UserRoleToken::new(&user).encode_jwt(&security.jwt_keys.private)?;

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}
