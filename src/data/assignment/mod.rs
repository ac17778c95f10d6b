use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use utoipa::ToSchema;
use uuid::Uuid;

pub mod db;

pub static ASSIGNMENT_COLLECTION_NAME: &str = "assignments";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Submission {
    pub submission_url: String,
    #[serde(default)]
    pub submission_text: String,
    /// Closed range [0, 100], set by grading.
    #[serde(default)]
    pub grade: Option<u8>,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default = "Utc::now")]
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Assignment {
    #[serde(default = "Uuid::new_v4", rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub course: Uuid,
    pub due_date: DateTime<Utc>,
    #[serde(default = "default_points")]
    pub points: u32,
    #[serde(default)]
    pub attachments: Vec<String>,
    /// One submission per student, keyed by the student's UUID in hyphenated
    /// form. Resubmission replaces the entry under the same key.
    #[serde(default)]
    pub submissions: BTreeMap<String, Submission>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn default_points() -> u32 {
    100
}

impl Assignment {
    pub fn is_past_due(&self, now: DateTime<Utc>) -> bool {
        now > self.due_date
    }

    pub fn submission_for(&self, student: &Uuid) -> Option<&Submission> {
        self.submissions.get(&student.to_string())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    pub(crate) fn example_assignment(course: Uuid, due_in: Duration) -> Assignment {
        Assignment {
            id: Uuid::new_v4(),
            title: "Worksheet 1".to_string(),
            description: "First worksheet".to_string(),
            course,
            due_date: Utc::now() + due_in,
            points: 100,
            attachments: vec![],
            submissions: BTreeMap::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn due_date_is_a_hard_cutoff() {
        let open = example_assignment(Uuid::new_v4(), Duration::hours(1));
        assert!(!open.is_past_due(Utc::now()));

        let closed = example_assignment(Uuid::new_v4(), Duration::hours(-1));
        assert!(closed.is_past_due(Utc::now()));
    }

    #[test]
    fn resubmission_replaces_previous_entry() {
        let student = Uuid::new_v4();
        let mut assignment = example_assignment(Uuid::new_v4(), Duration::hours(1));

        assignment.submissions.insert(
            student.to_string(),
            Submission {
                submission_url: "https://files/first.pdf".to_string(),
                submission_text: String::new(),
                grade: None,
                feedback: None,
                submitted_at: Utc::now(),
            },
        );
        assignment.submissions.insert(
            student.to_string(),
            Submission {
                submission_url: "https://files/second.pdf".to_string(),
                submission_text: "fixed a typo".to_string(),
                grade: None,
                feedback: None,
                submitted_at: Utc::now(),
            },
        );

        assert_eq!(assignment.submissions.len(), 1);
        let current = assignment.submission_for(&student).unwrap();
        assert_eq!(current.submission_url, "https://files/second.pdf");
    }

    #[test]
    fn points_default_to_100() {
        let json = serde_json::json!({
            "title": "t",
            "description": "d",
            "course": Uuid::new_v4(),
            "due_date": Utc::now(),
        });
        let assignment: Assignment = serde_json::from_value(json).unwrap();
        assert_eq!(assignment.points, 100);
    }
}
