use chrono::{DateTime, Utc};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::resp::jwt::UserRoleToken;

pub mod db;

pub static QUESTION_COLLECTION_NAME: &str = "questions";

/// Answer text stored when a teacher marks a question answered without
/// writing one.
pub static ANSWERED_PLACEHOLDER: &str = "Marked as answered by teacher";

pub fn default_avatar() -> String {
    "assets/images/default_avatar.jpg".to_string()
}

/// A question posted against a course. `student_name` and `course_title` are
/// snapshots taken at creation time and deliberately not kept in sync with
/// later renames.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Question {
    #[serde(default = "Uuid::new_v4", rename = "_id")]
    pub id: Uuid,
    pub student_name: String,
    pub student: Uuid,
    #[serde(default = "default_avatar")]
    pub student_avatar: String,
    pub course_title: String,
    #[serde(default)]
    pub course: Option<Uuid>,
    pub text: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub answered: bool,
    #[serde(default)]
    pub answer: Option<String>,
    /// The teacher who answered, stamped by the answer route.
    #[serde(default)]
    pub teacher: Option<Uuid>,
}

impl Question {
    /// Deletion is permitted for the original asker or any teacher/admin.
    pub fn can_delete(&self, auth: &UserRoleToken) -> bool {
        auth.user == self.student || auth.role.can_instruct()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;

    pub(crate) fn example_question(student: Uuid) -> Question {
        Question {
            id: Uuid::new_v4(),
            student_name: "Sam Student".to_string(),
            student,
            student_avatar: default_avatar(),
            course_title: "Intro to Rust".to_string(),
            course: None,
            text: "What is a lifetime?".to_string(),
            timestamp: Utc::now(),
            answered: false,
            answer: None,
            teacher: None,
        }
    }

    #[test]
    fn asker_and_staff_can_delete() {
        let asker = Uuid::new_v4();
        let question = example_question(asker);

        assert!(question.can_delete(&UserRoleToken::for_tests(asker, Role::Student)));
        assert!(question.can_delete(&UserRoleToken::for_tests(Uuid::new_v4(), Role::Teacher)));
        assert!(question.can_delete(&UserRoleToken::for_tests(Uuid::new_v4(), Role::Admin)));
        assert!(!question.can_delete(&UserRoleToken::for_tests(Uuid::new_v4(), Role::Student)));
    }

    #[test]
    fn snapshot_fields_survive_round_trip() {
        let question = example_question(Uuid::new_v4());
        let doc = bson::to_document(&question).unwrap();
        let back: Question = bson::from_document(doc).unwrap();
        assert_eq!(back.student_name, "Sam Student");
        assert_eq!(back.course_title, "Intro to Rust");
        assert!(!back.answered);
    }
}
