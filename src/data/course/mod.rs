use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::resp::jwt::UserRoleToken;

pub mod db;

pub static COURSE_COLLECTION_NAME: &str = "courses";

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    /// Index into `options`. Signed so an out-of-range value in a request
    /// reaches validation as a 400 instead of failing deserialization.
    pub correct_answer: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Lesson {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default)]
    pub quizzes: Vec<QuizQuestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Rating {
    pub rating: u8,
    #[serde(default)]
    pub review: String,
    #[serde(default = "Utc::now")]
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Course {
    #[serde(default = "Uuid::new_v4", rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub instructor: Uuid,
    #[serde(default)]
    pub image_url: Option<String>,
    pub category: String,
    pub level: Level,
    #[serde(default)]
    pub price: f64,
    pub duration_hours: u32,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
    #[serde(default)]
    pub enrolled_students: Vec<Uuid>,
    /// One rating per user, keyed by the rater's UUID in hyphenated form.
    /// A repeat rating replaces the entry under the same key.
    #[serde(default)]
    pub ratings: BTreeMap<String, Rating>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Course {
    pub fn is_enrolled(&self, user: &Uuid) -> bool {
        self.enrolled_students.contains(user)
    }

    /// Mutation is restricted to the course's instructor; admins bypass
    /// the ownership check.
    pub fn can_modify(&self, auth: &UserRoleToken) -> bool {
        auth.role.is_admin() || self.instructor == auth.user
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;

    pub(crate) fn example_course(instructor: Uuid) -> Course {
        Course {
            id: Uuid::new_v4(),
            title: "Intro to Rust".to_string(),
            description: "Ownership and borrowing".to_string(),
            instructor,
            image_url: None,
            category: "programming".to_string(),
            level: Level::Beginner,
            price: 0.0,
            duration_hours: 12,
            lessons: vec![],
            enrolled_students: vec![],
            ratings: BTreeMap::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn instructor_and_admin_can_modify() {
        let instructor = Uuid::new_v4();
        let course = example_course(instructor);

        let owner = UserRoleToken::for_tests(instructor, Role::Teacher);
        let other_teacher = UserRoleToken::for_tests(Uuid::new_v4(), Role::Teacher);
        let admin = UserRoleToken::for_tests(Uuid::new_v4(), Role::Admin);
        let student = UserRoleToken::for_tests(Uuid::new_v4(), Role::Student);

        assert!(course.can_modify(&owner));
        assert!(course.can_modify(&admin));
        assert!(!course.can_modify(&other_teacher));
        assert!(!course.can_modify(&student));
    }

    #[test]
    fn enrollment_is_membership() {
        let student = Uuid::new_v4();
        let mut course = example_course(Uuid::new_v4());
        assert!(!course.is_enrolled(&student));

        course.enrolled_students.push(student);
        assert!(course.is_enrolled(&student));
    }

    #[test]
    fn repeat_rating_replaces_entry() {
        let rater = Uuid::new_v4();
        let mut course = example_course(Uuid::new_v4());

        course.ratings.insert(
            rater.to_string(),
            Rating {
                rating: 2,
                review: "meh".to_string(),
                date: Utc::now(),
            },
        );
        course.ratings.insert(
            rater.to_string(),
            Rating {
                rating: 5,
                review: "improved a lot".to_string(),
                date: Utc::now(),
            },
        );

        assert_eq!(course.ratings.len(), 1);
        assert_eq!(course.ratings[&rater.to_string()].rating, 5);
    }

    #[test]
    fn bson_round_trip_preserves_id() {
        let course = example_course(Uuid::new_v4());
        let doc = bson::to_document(&course).unwrap();
        assert_eq!(doc.get_str("_id").unwrap(), course.id.to_string());

        let back: Course = bson::from_document(doc).unwrap();
        assert_eq!(back.id, course.id);
        assert_eq!(back.instructor, course.instructor);
    }
}
