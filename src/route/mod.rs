use rocket::serde::json::Json;
use rocket::{Build, Rocket, Route};

pub mod assignments;
pub mod auth;
pub mod courses;
pub mod questions;
pub mod users;

use assignments::*;
use auth::*;
use courses::*;
use questions::*;
use users::*;

use utoipa::OpenApi;

use crate::data::assignment::db::{
    AssignmentCreateData, AssignmentUpdateData, GradeData, SubmissionData,
};
use crate::data::assignment::{Assignment, Submission};
use crate::data::course::db::{CourseCreateData, CourseUpdateData, RatingData};
use crate::data::course::{Course, Lesson, Level, QuizQuestion, Rating};
use crate::data::question::db::{AnswerData, QuestionCreateData};
use crate::data::question::Question;
use crate::data::user::db::{ProfileUpdateData, RoleUpdateData, UserLoginData, UserSignupData};
use crate::data::user::UserResponse;
use crate::resp::jwt::doc::JWTAuth;
use crate::resp::problem::Problem;
use crate::resp::ApiMessage;
use crate::role::Role;

#[derive(OpenApi)]
#[openapi(
    paths(
        register,
        login,
        user_me,
        user_update_me,
        user_list,
        user_get,
        user_set_role,
        course_list,
        course_get,
        course_list_by_instructor,
        course_list_enrolled,
        course_create,
        course_update,
        course_delete,
        course_enroll,
        course_rate,
        assignment_list,
        assignment_list_by_course,
        assignment_get,
        assignment_create,
        assignment_update,
        assignment_delete,
        assignment_submit,
        assignment_grade,
        question_list,
        question_list_unanswered,
        question_list_mine,
        question_get,
        question_create,
        question_answer,
        question_delete
    ),
    components(schemas(
        Role,
        Level,
        Course,
        Lesson,
        QuizQuestion,
        Rating,
        Assignment,
        Submission,
        Question,
        UserResponse,
        AuthResponse,
        UserSignupData,
        UserLoginData,
        ProfileUpdateData,
        RoleUpdateData,
        CourseCreateData,
        CourseUpdateData,
        RatingData,
        AssignmentCreateData,
        AssignmentUpdateData,
        SubmissionData,
        GradeData,
        QuestionCreateData,
        AnswerData,
        ApiMessage,
        Problem
    )),
    modifiers(&JWTAuth)
)]
pub struct ApiDoc;

#[get("/openapi.json")]
pub fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn api_routes() -> Vec<Route> {
    routes![
        register,
        login,
        user_me,
        user_update_me,
        user_list,
        user_get,
        user_set_role,
        course_list,
        course_get,
        course_list_by_instructor,
        course_list_enrolled,
        course_create,
        course_update,
        course_delete,
        course_enroll,
        course_rate,
        assignment_list,
        assignment_list_by_course,
        assignment_get,
        assignment_create,
        assignment_update,
        assignment_delete,
        assignment_submit,
        assignment_grade,
        question_list,
        question_list_unanswered,
        question_list_mine,
        question_get,
        question_create,
        question_answer,
        question_delete,
        openapi_json
    ]
}

pub fn mount_api(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket.mount("/", api_routes())
}
