use mongodb::Database;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::State;
use uuid::Uuid;

use crate::data::question::db::{
    problem as question_problem, AnswerData, QuestionCreateData, QuestionDbExt,
};
use crate::data::question::Question;
use crate::data::user::db::{problem as user_problem, UserDbExt};
use crate::resp::jwt::UserRoleToken;
use crate::resp::problem::{problems, Problem};
use crate::resp::ApiMessage;

#[utoipa::path(responses((status = 200, body = Vec<Question>)), security(("jwt" = [])))]
#[get("/api/questions")]
#[tracing::instrument(skip_all)]
pub async fn question_list(
    _auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<Vec<Question>>, Problem> {
    Ok(Json(db.list_questions().await?))
}

#[utoipa::path(responses(
    (status = 200, body = Vec<Question>),
    (status = 403, description = "Caller isn't a teacher or admin", body = Problem),
), security(("jwt" = [])))]
#[get("/api/questions/unanswered")]
#[tracing::instrument(skip_all)]
pub async fn question_list_unanswered(
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<Vec<Question>>, Problem> {
    if !auth.role.can_instruct() {
        return Err(problems::forbidden(
            "Only teachers and admins can view unanswered questions.",
        ));
    }

    Ok(Json(db.list_unanswered_questions().await?))
}

/// Questions asked by the caller.
#[utoipa::path(security(("jwt" = [])))]
#[get("/api/questions/student")]
#[tracing::instrument(skip_all)]
pub async fn question_list_mine(
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<Vec<Question>>, Problem> {
    Ok(Json(db.list_questions_by_student(auth.user).await?))
}

#[utoipa::path(security(("jwt" = [])))]
#[get("/api/questions/<id>")]
#[tracing::instrument(skip_all)]
pub async fn question_get(
    id: Uuid,
    _auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<Question>, Problem> {
    let question = db
        .get_question(id)
        .await?
        .ok_or_else(|| question_problem::not_found(id))?;

    Ok(Json(question))
}

/// Posting a question snapshots the asker's current name; later renames
/// don't propagate.
#[utoipa::path(request_body = QuestionCreateData, responses(
    (status = 201, body = Question),
), security(("jwt" = [])))]
#[post("/api/questions", format = "application/json", data = "<create>")]
#[tracing::instrument(skip_all)]
pub async fn question_create(
    create: Json<QuestionCreateData>,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<status::Created<Json<Question>>, Problem> {
    create.validate()?;

    let asker = db
        .get_user(auth.user)
        .await?
        .ok_or_else(|| user_problem::not_found(auth.user))?;

    let question = create.into_inner().into_question(auth.user, asker.name);
    db.insert_question(&question).await?;

    Ok(status::Created::new(format!("/api/questions/{}", question.id)).body(Json(question)))
}

/// Answer a question or mark it answered; omitted answer text falls back to
/// a fixed placeholder. Stamps the answering teacher.
#[utoipa::path(request_body = AnswerData, security(("jwt" = [])))]
#[put("/api/questions/<id>/answer", format = "application/json", data = "<answer>")]
#[tracing::instrument(skip_all)]
pub async fn question_answer(
    id: Uuid,
    answer: Json<AnswerData>,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<Question>, Problem> {
    if !auth.role.can_instruct() {
        return Err(problems::forbidden(
            "Only teachers and admins can answer questions.",
        ));
    }

    let data = answer.into_inner();
    let text = data.answer_text();

    let question = db
        .answer_question(id, data.answered, text, auth.user)
        .await?
        .ok_or_else(|| question_problem::not_found(id))?;

    Ok(Json(question))
}

#[utoipa::path(security(("jwt" = [])))]
#[delete("/api/questions/<id>")]
#[tracing::instrument(skip_all)]
pub async fn question_delete(
    id: Uuid,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<ApiMessage>, Problem> {
    let question = db
        .get_question(id)
        .await?
        .ok_or_else(|| question_problem::not_found(id))?;

    if !question.can_delete(&auth) {
        return Err(problems::forbidden(
            "Only the asking student or staff can delete this question.",
        ));
    }

    db.delete_question(id).await?;

    Ok(Json(ApiMessage::new("Question removed")))
}
