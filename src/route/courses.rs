use mongodb::Database;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::State;
use uuid::Uuid;

use crate::data::course::db::{
    problem as course_problem, CourseCreateData, CourseDbExt, CourseUpdateData, RatingData,
};
use crate::data::course::Course;
use crate::resp::jwt::UserRoleToken;
use crate::resp::problem::{problems, Problem};
use crate::resp::ApiMessage;

#[utoipa::path(responses((status = 200, description = "All courses", body = Vec<Course>)))]
#[get("/courses")]
#[tracing::instrument(skip_all)]
pub async fn course_list(db: &State<Database>) -> Result<Json<Vec<Course>>, Problem> {
    Ok(Json(db.list_courses().await?))
}

#[utoipa::path(responses(
    (status = 200, body = Course),
    (status = 404, description = "Course doesn't exist", body = Problem),
))]
#[get("/courses/<id>")]
#[tracing::instrument(skip_all)]
pub async fn course_get(id: Uuid, db: &State<Database>) -> Result<Json<Course>, Problem> {
    let course = db
        .get_course(id)
        .await?
        .ok_or_else(|| course_problem::not_found(id))?;

    Ok(Json(course))
}

#[utoipa::path(responses((status = 200, body = Vec<Course>)))]
#[get("/courses/instructor/<instructor_id>")]
#[tracing::instrument(skip_all)]
pub async fn course_list_by_instructor(
    instructor_id: Uuid,
    db: &State<Database>,
) -> Result<Json<Vec<Course>>, Problem> {
    Ok(Json(db.list_courses_by_instructor(instructor_id).await?))
}

/// Courses the caller is enrolled in.
#[utoipa::path(security(("jwt" = [])))]
#[get("/courses/enrolled/me")]
#[tracing::instrument(skip_all)]
pub async fn course_list_enrolled(
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<Vec<Course>>, Problem> {
    Ok(Json(db.list_enrolled_courses(auth.user).await?))
}

#[utoipa::path(request_body = CourseCreateData, responses(
    (status = 201, body = Course),
    (status = 403, description = "Caller can't create courses", body = Problem),
), security(("jwt" = [])))]
#[post("/courses", format = "application/json", data = "<create>")]
#[tracing::instrument(skip_all)]
pub async fn course_create(
    create: Json<CourseCreateData>,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<status::Created<Json<Course>>, Problem> {
    if !auth.role.can_instruct() {
        return Err(problems::forbidden("Only teachers and admins can create courses."));
    }

    create.validate()?;

    let course = create.into_inner().into_course(auth.user);
    db.insert_course(&course).await?;

    Ok(status::Created::new(format!("/courses/{}", course.id)).body(Json(course)))
}

/// Partial update, restricted to the course's instructor or an admin.
#[utoipa::path(request_body = CourseUpdateData, security(("jwt" = [])))]
#[put("/courses/<id>", format = "application/json", data = "<update>")]
#[tracing::instrument(skip_all)]
pub async fn course_update(
    id: Uuid,
    update: Json<CourseUpdateData>,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<Course>, Problem> {
    update.validate()?;

    let course = db
        .get_course(id)
        .await?
        .ok_or_else(|| course_problem::not_found(id))?;

    if !course.can_modify(&auth) {
        return Err(problems::forbidden("Course not owned by user."));
    }

    let updated = db
        .update_course(id, update.into_inner())
        .await?
        .ok_or_else(|| course_problem::not_found(id))?;

    Ok(Json(updated))
}

/// Hard delete; the course's assignments go with it, questions keep their
/// snapshots.
#[utoipa::path(security(("jwt" = [])))]
#[delete("/courses/<id>")]
#[tracing::instrument(skip_all)]
pub async fn course_delete(
    id: Uuid,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<ApiMessage>, Problem> {
    let course = db
        .get_course(id)
        .await?
        .ok_or_else(|| course_problem::not_found(id))?;

    if !course.can_modify(&auth) {
        return Err(problems::forbidden("Course not owned by user."));
    }

    db.delete_course(id).await?;

    Ok(Json(ApiMessage::new("Course deleted successfully")))
}

/// Enrolling twice is rejected and leaves the student set unchanged.
#[utoipa::path(security(("jwt" = [])))]
#[post("/courses/<id>/enroll")]
#[tracing::instrument(skip_all)]
pub async fn course_enroll(
    id: Uuid,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<ApiMessage>, Problem> {
    let course = db
        .get_course(id)
        .await?
        .ok_or_else(|| course_problem::not_found(id))?;

    if course.is_enrolled(&auth.user) {
        return Err(problems::validation(
            "Already enrolled.",
            "Already enrolled in this course.",
        ));
    }

    db.enroll_student(id, auth.user).await?;

    Ok(Json(ApiMessage::new("Successfully enrolled in course")))
}

/// One rating per user per course; rating again replaces the earlier entry.
#[utoipa::path(request_body = RatingData, security(("jwt" = [])))]
#[post("/courses/<id>/rate", format = "application/json", data = "<rating>")]
#[tracing::instrument(skip_all)]
pub async fn course_rate(
    id: Uuid,
    rating: Json<RatingData>,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<ApiMessage>, Problem> {
    rating.validate()?;

    let course = db
        .get_course(id)
        .await?
        .ok_or_else(|| course_problem::not_found(id))?;

    if !course.is_enrolled(&auth.user) {
        return Err(problems::forbidden(
            "You must be enrolled to rate this course.",
        ));
    }

    db.put_rating(id, auth.user, rating.into_inner().into_rating())
        .await?;

    Ok(Json(ApiMessage::new("Course rated successfully")))
}

///////////////////////
//       TESTS
///////////////////////

// Gate rejections that fire before any collection is touched; the managed
// MongoDB client connects lazily, so no server is needed.
#[cfg(test)]
mod course_endpoints {
    use rocket::http::{ContentType, Header, Status};
    use rocket::local::asynchronous::Client;
    use uuid::Uuid;

    use crate::config::Config;
    use crate::resp::jwt::{UserRoleToken, AUTH_HEADER, BEARER_PREFIX};
    use crate::role::Role;
    use crate::security::Security;

    async fn test_client() -> Client {
        let db = mongodb::Client::with_uri_str("mongodb://localhost:27017")
            .await
            .expect("client construction doesn't contact the server")
            .database("learnhub_route_tests");

        let rocket = crate::route::mount_api(
            rocket::build()
                .manage(Config::default())
                .manage(db)
                .manage(Security::load()),
        );

        Client::tracked(rocket).await.expect("invalid backend")
    }

    fn bearer(client: &Client, role: Role) -> Header<'static> {
        let security: &Security = client.rocket().state().unwrap();
        let token = UserRoleToken::for_tests(Uuid::new_v4(), role)
            .encode_jwt(&security.jwt_keys.private)
            .expect("signing with our own key works");

        Header::new(AUTH_HEADER, format!("{}{}", BEARER_PREFIX, token))
    }

    #[rocket::async_test]
    async fn create_course_requires_instructor_role() {
        let client = test_client().await;
        let auth = bearer(&client, Role::Student);

        let response = client
            .post("/courses")
            .header(auth)
            .header(ContentType::JSON)
            .body(
                r#"{
                    "title": "Intro to Rust",
                    "description": "Ownership and borrowing",
                    "category": "programming",
                    "level": "beginner",
                    "duration_hours": 12
                }"#,
            )
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Forbidden);
    }

    #[rocket::async_test]
    async fn out_of_range_rating_is_rejected_before_lookup() {
        let client = test_client().await;
        let auth = bearer(&client, Role::Student);

        let response = client
            .post(format!("/courses/{}/rate", Uuid::new_v4()))
            .header(auth)
            .header(ContentType::JSON)
            .body(r#"{ "rating": 6 }"#)
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::BadRequest);
    }

    #[rocket::async_test]
    async fn missing_bearer_credential_is_rejected() {
        let client = test_client().await;

        let response = client.get("/courses/enrolled/me").dispatch().await;
        assert_eq!(response.status(), Status::Unauthorized);

        let response = client
            .get("/courses/enrolled/me")
            .header(Header::new(AUTH_HEADER, "Basic abc"))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Unauthorized);
    }
}
