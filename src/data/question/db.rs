use bson::doc;
use chrono::Utc;
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::Database;
use rocket::futures::TryStreamExt;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{default_avatar, Question, ANSWERED_PLACEHOLDER, QUESTION_COLLECTION_NAME};
use crate::data::filter;
use crate::resp::problem::{problems, Problem};

pub mod problem {
    use uuid::Uuid;

    use crate::resp::problem::{problems, Problem};

    #[inline]
    pub fn not_found(id: Uuid) -> Problem {
        problems::not_found("Question", id)
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct QuestionCreateData {
    pub text: String,
    pub course_title: String,
    pub course: Option<Uuid>,
    pub student_avatar: Option<String>,
}

impl QuestionCreateData {
    pub fn validate(&self) -> Result<(), Problem> {
        if self.text.trim().is_empty() {
            return Err(problems::validation(
                "Bad question.",
                "Question text is required.",
            ));
        }
        if self.course_title.trim().is_empty() {
            return Err(problems::validation(
                "Bad question.",
                "Course title is required.",
            ));
        }
        Ok(())
    }

    /// Snapshots the asking student's name and avatar at write time.
    pub fn into_question(self, student: Uuid, student_name: String) -> Question {
        Question {
            id: Uuid::new_v4(),
            student_name,
            student,
            student_avatar: self.student_avatar.unwrap_or_else(default_avatar),
            course_title: self.course_title,
            course: self.course,
            text: self.text,
            timestamp: Utc::now(),
            answered: false,
            answer: None,
            teacher: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AnswerData {
    pub answered: bool,
    pub answer: Option<String>,
}

impl AnswerData {
    pub fn answer_text(&self) -> String {
        match &self.answer {
            Some(text) if !text.trim().is_empty() => text.clone(),
            _ => ANSWERED_PLACEHOLDER.to_string(),
        }
    }
}

pub trait QuestionDbExt {
    async fn insert_question(&self, question: &Question) -> Result<(), Problem>;
    async fn get_question(&self, id: Uuid) -> Result<Option<Question>, Problem>;
    /// Newest first.
    async fn list_questions(&self) -> Result<Vec<Question>, Problem>;
    async fn list_unanswered_questions(&self) -> Result<Vec<Question>, Problem>;
    async fn list_questions_by_student(&self, student: Uuid) -> Result<Vec<Question>, Problem>;

    async fn answer_question(
        &self,
        id: Uuid,
        answered: bool,
        answer: String,
        teacher: Uuid,
    ) -> Result<Option<Question>, Problem>;

    async fn delete_question(&self, id: Uuid) -> Result<Option<Question>, Problem>;
}

fn newest_first() -> FindOptions {
    FindOptions::builder().sort(doc! { "timestamp": -1 }).build()
}

impl QuestionDbExt for Database {
    async fn insert_question(&self, question: &Question) -> Result<(), Problem> {
        self.collection::<Question>(QUESTION_COLLECTION_NAME)
            .insert_one(question, None)
            .await
            .map_err(Problem::from)?;
        Ok(())
    }

    async fn get_question(&self, id: Uuid) -> Result<Option<Question>, Problem> {
        self.collection::<Question>(QUESTION_COLLECTION_NAME)
            .find_one(filter::by_id(id), None)
            .await
            .map_err(Problem::from)
    }

    async fn list_questions(&self) -> Result<Vec<Question>, Problem> {
        self.collection::<Question>(QUESTION_COLLECTION_NAME)
            .find(None, newest_first())
            .await
            .map_err(Problem::from)?
            .try_collect()
            .await
            .map_err(Problem::from)
    }

    async fn list_unanswered_questions(&self) -> Result<Vec<Question>, Problem> {
        self.collection::<Question>(QUESTION_COLLECTION_NAME)
            .find(doc! { "answered": false }, newest_first())
            .await
            .map_err(Problem::from)?
            .try_collect()
            .await
            .map_err(Problem::from)
    }

    async fn list_questions_by_student(&self, student: Uuid) -> Result<Vec<Question>, Problem> {
        self.collection::<Question>(QUESTION_COLLECTION_NAME)
            .find(doc! { "student": student.to_string() }, newest_first())
            .await
            .map_err(Problem::from)?
            .try_collect()
            .await
            .map_err(Problem::from)
    }

    async fn answer_question(
        &self,
        id: Uuid,
        answered: bool,
        answer: String,
        teacher: Uuid,
    ) -> Result<Option<Question>, Problem> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        self.collection::<Question>(QUESTION_COLLECTION_NAME)
            .find_one_and_update(
                filter::by_id(id),
                doc! {
                    "$set": {
                        "answered": answered,
                        "answer": answer,
                        "teacher": teacher.to_string(),
                    }
                },
                options,
            )
            .await
            .map_err(Problem::from)
    }

    async fn delete_question(&self, id: Uuid) -> Result<Option<Question>, Problem> {
        self.collection::<Question>(QUESTION_COLLECTION_NAME)
            .find_one_and_delete(filter::by_id(id), None)
            .await
            .map_err(Problem::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_text_is_rejected() {
        let data = QuestionCreateData {
            text: " ".to_string(),
            course_title: "Intro to Rust".to_string(),
            course: None,
            student_avatar: None,
        };
        assert!(data.validate().is_err());
    }

    #[test]
    fn answer_text_falls_back_to_placeholder() {
        let explicit = AnswerData {
            answered: true,
            answer: Some("Lifetimes bound borrows.".to_string()),
        };
        assert_eq!(explicit.answer_text(), "Lifetimes bound borrows.");

        let marked_only = AnswerData {
            answered: true,
            answer: None,
        };
        assert_eq!(marked_only.answer_text(), ANSWERED_PLACEHOLDER);

        let blank = AnswerData {
            answered: true,
            answer: Some("   ".to_string()),
        };
        assert_eq!(blank.answer_text(), ANSWERED_PLACEHOLDER);
    }

    #[test]
    fn creation_snapshots_name_and_avatar() {
        let student = Uuid::new_v4();
        let question = QuestionCreateData {
            text: "What is a trait object?".to_string(),
            course_title: "Intro to Rust".to_string(),
            course: None,
            student_avatar: None,
        }
        .into_question(student, "Sam Student".to_string());

        assert_eq!(question.student, student);
        assert_eq!(question.student_name, "Sam Student");
        assert_eq!(question.student_avatar, default_avatar());
        assert!(!question.answered);
    }
}
