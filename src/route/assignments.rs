use mongodb::Database;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::State;
use uuid::Uuid;

use crate::data::assignment::db::{
    problem as assignment_problem, AssignmentCreateData, AssignmentDbExt, AssignmentUpdateData,
    GradeData, SubmissionData,
};
use crate::data::assignment::Assignment;
use crate::data::course::db::{problem as course_problem, CourseDbExt};
use crate::data::course::Course;
use crate::resp::jwt::UserRoleToken;
use crate::resp::problem::{problems, Problem};
use crate::resp::ApiMessage;

/// Assignment mutation is gated on the parent course, re-fetched on every
/// call: the actor must be its instructor or an admin.
async fn fetch_owned_course(
    db: &Database,
    course_id: Uuid,
    auth: &UserRoleToken,
) -> Result<Course, Problem> {
    let course = db
        .get_course(course_id)
        .await?
        .ok_or_else(|| course_problem::not_found(course_id))?;

    if !course.can_modify(auth) {
        return Err(problems::forbidden("Course not owned by user."));
    }

    Ok(course)
}

#[utoipa::path(responses((status = 200, body = Vec<Assignment>)), security(("jwt" = [])))]
#[get("/assignments")]
#[tracing::instrument(skip_all)]
pub async fn assignment_list(
    _auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<Vec<Assignment>>, Problem> {
    Ok(Json(db.list_assignments().await?))
}

#[utoipa::path(security(("jwt" = [])))]
#[get("/assignments/course/<course_id>")]
#[tracing::instrument(skip_all)]
pub async fn assignment_list_by_course(
    course_id: Uuid,
    _auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<Vec<Assignment>>, Problem> {
    Ok(Json(db.list_assignments_by_course(course_id).await?))
}

#[utoipa::path(responses(
    (status = 200, body = Assignment),
    (status = 404, description = "Assignment doesn't exist", body = Problem),
), security(("jwt" = [])))]
#[get("/assignments/<id>")]
#[tracing::instrument(skip_all)]
pub async fn assignment_get(
    id: Uuid,
    _auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<Assignment>, Problem> {
    let assignment = db
        .get_assignment(id)
        .await?
        .ok_or_else(|| assignment_problem::not_found(id))?;

    Ok(Json(assignment))
}

#[utoipa::path(request_body = AssignmentCreateData, responses(
    (status = 201, body = Assignment),
    (status = 403, description = "Caller doesn't own the parent course", body = Problem),
), security(("jwt" = [])))]
#[post("/assignments", format = "application/json", data = "<create>")]
#[tracing::instrument(skip_all)]
pub async fn assignment_create(
    create: Json<AssignmentCreateData>,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<status::Created<Json<Assignment>>, Problem> {
    if !auth.role.can_instruct() {
        return Err(problems::forbidden(
            "Only teachers and admins can create assignments.",
        ));
    }

    create.validate()?;
    fetch_owned_course(db, create.course, &auth).await?;

    let assignment = create.into_inner().into_assignment();
    db.insert_assignment(&assignment).await?;

    Ok(status::Created::new(format!("/assignments/{}", assignment.id)).body(Json(assignment)))
}

#[utoipa::path(request_body = AssignmentUpdateData, security(("jwt" = [])))]
#[put("/assignments/<id>", format = "application/json", data = "<update>")]
#[tracing::instrument(skip_all)]
pub async fn assignment_update(
    id: Uuid,
    update: Json<AssignmentUpdateData>,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<Assignment>, Problem> {
    update.validate()?;

    let assignment = db
        .get_assignment(id)
        .await?
        .ok_or_else(|| assignment_problem::not_found(id))?;

    fetch_owned_course(db, assignment.course, &auth).await?;

    let updated = db
        .update_assignment(id, update.into_inner())
        .await?
        .ok_or_else(|| assignment_problem::not_found(id))?;

    Ok(Json(updated))
}

#[utoipa::path(security(("jwt" = [])))]
#[delete("/assignments/<id>")]
#[tracing::instrument(skip_all)]
pub async fn assignment_delete(
    id: Uuid,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<ApiMessage>, Problem> {
    let assignment = db
        .get_assignment(id)
        .await?
        .ok_or_else(|| assignment_problem::not_found(id))?;

    fetch_owned_course(db, assignment.course, &auth).await?;

    db.delete_assignment(id).await?;

    Ok(Json(ApiMessage::new("Assignment removed")))
}

/// Students submit (or resubmit, replacing their earlier entry) before the
/// due date; enrollment in the parent course is required.
#[utoipa::path(request_body = SubmissionData, security(("jwt" = [])))]
#[post("/assignments/<id>/submit", format = "application/json", data = "<submission>")]
#[tracing::instrument(skip_all)]
pub async fn assignment_submit(
    id: Uuid,
    submission: Json<SubmissionData>,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<ApiMessage>, Problem> {
    if !auth.role.is_student() {
        return Err(problems::forbidden("Only students can submit assignments."));
    }

    submission.validate()?;

    let assignment = db
        .get_assignment(id)
        .await?
        .ok_or_else(|| assignment_problem::not_found(id))?;

    let course = db
        .get_course(assignment.course)
        .await?
        .ok_or_else(|| course_problem::not_found(assignment.course))?;

    if !course.is_enrolled(&auth.user) {
        return Err(problems::forbidden(
            "You must be enrolled in this course to submit assignments.",
        ));
    }

    if assignment.is_past_due(chrono::Utc::now()) {
        return Err(problems::validation(
            "Past due date.",
            "Assignment past due date.",
        ));
    }

    db.put_submission(id, auth.user, submission.into_inner().into_submission())
        .await?;

    Ok(Json(ApiMessage::new("Assignment submitted successfully")))
}

/// Grade one student's submission in place. With submissions keyed by
/// student, the submission identifier in the path is the student's id.
#[utoipa::path(request_body = GradeData, security(("jwt" = [])))]
#[post("/assignments/<id>/grade/<student>", format = "application/json", data = "<grade>")]
#[tracing::instrument(skip_all)]
pub async fn assignment_grade(
    id: Uuid,
    student: Uuid,
    grade: Json<GradeData>,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<ApiMessage>, Problem> {
    grade.validate()?;

    let assignment = db
        .get_assignment(id)
        .await?
        .ok_or_else(|| assignment_problem::not_found(id))?;

    fetch_owned_course(db, assignment.course, &auth).await?;

    if assignment.submission_for(&student).is_none() {
        return Err(assignment_problem::submission_not_found(student));
    }

    let data = grade.into_inner();
    db.grade_submission(
        id,
        student,
        data.grade as u8,
        data.feedback.unwrap_or_default(),
    )
    .await?;

    Ok(Json(ApiMessage::new("Assignment graded successfully")))
}
