use std::str::FromStr;

use mongodb::Database;
use rocket::serde::json::Json;
use rocket::State;
use uuid::Uuid;

use crate::data::user::db::{
    problem as user_problem, ProfileUpdateData, RoleUpdateData, UserDbExt,
};
use crate::data::user::UserResponse;
use crate::resp::jwt::UserRoleToken;
use crate::resp::problem::{problems, Problem};
use crate::role::Role;

/// Current caller's profile.
#[utoipa::path(responses(
    (status = 200, body = UserResponse),
    (status = 401, description = "Missing or invalid bearer credential", body = Problem),
), security(("jwt" = [])))]
#[get("/users/me")]
#[tracing::instrument(skip_all)]
pub async fn user_me(
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<UserResponse>, Problem> {
    let user = db
        .get_user(auth.user)
        .await?
        .ok_or_else(|| user_problem::not_found(auth.user))?;

    Ok(Json(user.into()))
}

/// Partial profile update; a present password is re-hashed.
#[utoipa::path(request_body = ProfileUpdateData, security(("jwt" = [])))]
#[put("/users/me", format = "application/json", data = "<update>")]
#[tracing::instrument(skip_all)]
pub async fn user_update_me(
    update: Json<ProfileUpdateData>,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<UserResponse>, Problem> {
    if let Some(email) = &update.email {
        if !email.contains('@') {
            return Err(user_problem::bad_email(email, "Not a valid e-mail address."));
        }
    }
    if let Some(password) = &update.password {
        if password.len() < 8 {
            return Err(user_problem::bad_password(
                "Password must be at least 8 characters (bytes) long.",
            ));
        }
    }

    let user = db
        .update_profile(auth.user, update.into_inner())
        .await?
        .ok_or_else(|| user_problem::not_found(auth.user))?;

    Ok(Json(user.into()))
}

#[utoipa::path(responses(
    (status = 200, body = Vec<UserResponse>),
    (status = 403, description = "Caller isn't an admin", body = Problem),
), security(("jwt" = [])))]
#[get("/users")]
#[tracing::instrument(skip_all)]
pub async fn user_list(
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<Vec<UserResponse>>, Problem> {
    if !auth.role.is_admin() {
        return Err(problems::forbidden("Only admins can list users."));
    }

    let users = db.list_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[utoipa::path(security(("jwt" = [])))]
#[get("/users/<id>")]
#[tracing::instrument(skip_all)]
pub async fn user_get(
    id: Uuid,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<UserResponse>, Problem> {
    if !auth.role.is_admin() {
        return Err(problems::forbidden("Only admins can view other users."));
    }

    let user = db
        .get_user(id)
        .await?
        .ok_or_else(|| user_problem::not_found(id))?;

    Ok(Json(user.into()))
}

/// Change an account's role; the role string must name one of the three
/// known roles.
#[utoipa::path(request_body = RoleUpdateData, security(("jwt" = [])))]
#[put("/users/<id>/role", format = "application/json", data = "<update>")]
#[tracing::instrument(skip_all)]
pub async fn user_set_role(
    id: Uuid,
    update: Json<RoleUpdateData>,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<UserResponse>, Problem> {
    if !auth.role.is_admin() {
        return Err(problems::forbidden("Only admins can change user roles."));
    }

    let role = Role::from_str(&update.role).map_err(|_| {
        problems::validation("Bad role.", "Role must be student, teacher or admin.")
    })?;

    let user = db
        .set_role(id, role)
        .await?
        .ok_or_else(|| user_problem::not_found(id))?;

    Ok(Json(user.into()))
}
