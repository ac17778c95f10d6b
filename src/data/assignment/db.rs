use bson::doc;
use chrono::{DateTime, Utc};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::Database;
use rocket::futures::TryStreamExt;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{Assignment, Submission, ASSIGNMENT_COLLECTION_NAME};
use crate::data::filter;
use crate::resp::problem::{problems, Problem};

pub mod problem {
    use uuid::Uuid;

    use crate::resp::problem::{problems, Problem};

    #[inline]
    pub fn not_found(id: Uuid) -> Problem {
        problems::not_found("Assignment", id)
    }

    #[inline]
    pub fn submission_not_found(student: Uuid) -> Problem {
        problems::not_found("Submission", student)
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AssignmentCreateData {
    pub title: String,
    pub description: String,
    pub course: Uuid,
    pub due_date: DateTime<Utc>,
    /// Signed for the same reason as [`GradeData::grade`].
    pub points: Option<i64>,
    pub attachments: Option<Vec<String>>,
}

impl AssignmentCreateData {
    pub fn validate(&self) -> Result<(), Problem> {
        if self.title.trim().is_empty() || self.description.trim().is_empty() {
            return Err(problems::validation(
                "Bad assignment.",
                "Title and description are required.",
            ));
        }
        if self.points.is_some_and(|p| p < 0) {
            return Err(problems::validation(
                "Bad assignment.",
                "Points must not be negative.",
            ));
        }
        Ok(())
    }

    pub fn into_assignment(self) -> Assignment {
        Assignment {
            id: Uuid::new_v4(),
            title: self.title,
            description: self.description,
            course: self.course,
            due_date: self.due_date,
            points: self.points.unwrap_or(100) as u32,
            attachments: self.attachments.unwrap_or_default(),
            submissions: Default::default(),
            created_at: Utc::now(),
        }
    }
}

/// Partial assignment update; only fields present in the request are applied.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct AssignmentUpdateData {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub points: Option<i64>,
    pub attachments: Option<Vec<String>>,
}

impl AssignmentUpdateData {
    pub fn validate(&self) -> Result<(), Problem> {
        if self.points.is_some_and(|p| p < 0) {
            return Err(problems::validation(
                "Bad assignment.",
                "Points must not be negative.",
            ));
        }
        Ok(())
    }

    pub fn set_document(&self) -> Result<bson::Document, Problem> {
        let mut set = bson::Document::new();
        if let Some(title) = &self.title {
            set.insert("title", title);
        }
        if let Some(description) = &self.description {
            set.insert("description", description);
        }
        if let Some(due_date) = &self.due_date {
            set.insert("due_date", bson::to_bson(due_date)?);
        }
        if let Some(points) = self.points {
            set.insert("points", points);
        }
        if let Some(attachments) = &self.attachments {
            set.insert("attachments", bson::to_bson(attachments)?);
        }
        Ok(set)
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SubmissionData {
    pub submission_url: String,
    pub submission_text: Option<String>,
}

impl SubmissionData {
    pub fn validate(&self) -> Result<(), Problem> {
        if self.submission_url.trim().is_empty() {
            return Err(problems::validation(
                "Bad submission.",
                "A submission URL is required.",
            ));
        }
        Ok(())
    }

    pub fn into_submission(self) -> Submission {
        Submission {
            submission_url: self.submission_url,
            submission_text: self.submission_text.unwrap_or_default(),
            grade: None,
            feedback: None,
            submitted_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GradeData {
    /// Closed range [0, 100]; validated before any document is touched.
    pub grade: i32,
    pub feedback: Option<String>,
}

impl GradeData {
    pub fn validate(&self) -> Result<(), Problem> {
        if !(0..=100).contains(&self.grade) {
            return Err(problems::validation(
                "Bad grade.",
                "Grade must be between 0 and 100.",
            ));
        }
        Ok(())
    }
}

pub trait AssignmentDbExt {
    async fn insert_assignment(&self, assignment: &Assignment) -> Result<(), Problem>;
    async fn get_assignment(&self, id: Uuid) -> Result<Option<Assignment>, Problem>;
    /// Newest first.
    async fn list_assignments(&self) -> Result<Vec<Assignment>, Problem>;
    /// Soonest due first.
    async fn list_assignments_by_course(&self, course: Uuid) -> Result<Vec<Assignment>, Problem>;

    async fn update_assignment(
        &self,
        id: Uuid,
        update: AssignmentUpdateData,
    ) -> Result<Option<Assignment>, Problem>;

    async fn delete_assignment(&self, id: Uuid) -> Result<Option<Assignment>, Problem>;

    /// Upserts a single map key; a student's resubmission replaces their own
    /// entry without touching anyone else's.
    async fn put_submission(
        &self,
        id: Uuid,
        student: Uuid,
        submission: Submission,
    ) -> Result<(), Problem>;

    /// Sets grade and feedback on one student's submission in place.
    async fn grade_submission(
        &self,
        id: Uuid,
        student: Uuid,
        grade: u8,
        feedback: String,
    ) -> Result<(), Problem>;
}

impl AssignmentDbExt for Database {
    async fn insert_assignment(&self, assignment: &Assignment) -> Result<(), Problem> {
        self.collection::<Assignment>(ASSIGNMENT_COLLECTION_NAME)
            .insert_one(assignment, None)
            .await
            .map_err(Problem::from)?;
        Ok(())
    }

    async fn get_assignment(&self, id: Uuid) -> Result<Option<Assignment>, Problem> {
        self.collection::<Assignment>(ASSIGNMENT_COLLECTION_NAME)
            .find_one(filter::by_id(id), None)
            .await
            .map_err(Problem::from)
    }

    async fn list_assignments(&self) -> Result<Vec<Assignment>, Problem> {
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .build();

        self.collection::<Assignment>(ASSIGNMENT_COLLECTION_NAME)
            .find(None, options)
            .await
            .map_err(Problem::from)?
            .try_collect()
            .await
            .map_err(Problem::from)
    }

    async fn list_assignments_by_course(&self, course: Uuid) -> Result<Vec<Assignment>, Problem> {
        let options = FindOptions::builder().sort(doc! { "due_date": 1 }).build();

        self.collection::<Assignment>(ASSIGNMENT_COLLECTION_NAME)
            .find(doc! { "course": course.to_string() }, options)
            .await
            .map_err(Problem::from)?
            .try_collect()
            .await
            .map_err(Problem::from)
    }

    async fn update_assignment(
        &self,
        id: Uuid,
        update: AssignmentUpdateData,
    ) -> Result<Option<Assignment>, Problem> {
        let set = update.set_document()?;
        if set.is_empty() {
            return self.get_assignment(id).await;
        }

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        self.collection::<Assignment>(ASSIGNMENT_COLLECTION_NAME)
            .find_one_and_update(filter::by_id(id), doc! { "$set": set }, options)
            .await
            .map_err(Problem::from)
    }

    async fn delete_assignment(&self, id: Uuid) -> Result<Option<Assignment>, Problem> {
        self.collection::<Assignment>(ASSIGNMENT_COLLECTION_NAME)
            .find_one_and_delete(filter::by_id(id), None)
            .await
            .map_err(Problem::from)
    }

    async fn put_submission(
        &self,
        id: Uuid,
        student: Uuid,
        submission: Submission,
    ) -> Result<(), Problem> {
        let mut set = bson::Document::new();
        set.insert(
            format!("submissions.{}", student),
            bson::to_bson(&submission)?,
        );

        self.collection::<Assignment>(ASSIGNMENT_COLLECTION_NAME)
            .update_one(filter::by_id(id), doc! { "$set": set }, None)
            .await
            .map_err(Problem::from)?;
        Ok(())
    }

    async fn grade_submission(
        &self,
        id: Uuid,
        student: Uuid,
        grade: u8,
        feedback: String,
    ) -> Result<(), Problem> {
        let mut set = bson::Document::new();
        set.insert(format!("submissions.{}.grade", student), grade as i32);
        set.insert(format!("submissions.{}.feedback", student), feedback);

        self.collection::<Assignment>(ASSIGNMENT_COLLECTION_NAME)
            .update_one(filter::by_id(id), doc! { "$set": set }, None)
            .await
            .map_err(Problem::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_range_is_closed() {
        assert!(GradeData { grade: -5, feedback: None }.validate().is_err());
        assert!(GradeData { grade: 0, feedback: None }.validate().is_ok());
        assert!(GradeData { grade: 85, feedback: None }.validate().is_ok());
        assert!(GradeData { grade: 100, feedback: None }.validate().is_ok());
        assert!(GradeData { grade: 150, feedback: None }.validate().is_err());
    }

    #[test]
    fn negative_points_are_rejected() {
        let data = AssignmentCreateData {
            title: "t".to_string(),
            description: "d".to_string(),
            course: Uuid::new_v4(),
            due_date: Utc::now(),
            points: Some(-10),
            attachments: None,
        };
        assert!(data.validate().is_err());

        let update = AssignmentUpdateData {
            points: Some(-10),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn update_touches_only_present_fields() {
        let update = AssignmentUpdateData {
            points: Some(50),
            ..Default::default()
        };
        let set = update.set_document().unwrap();
        assert_eq!(set.get_i64("points").unwrap(), 50);
        assert!(set.get("title").is_none());
        assert!(set.get("due_date").is_none());
    }

    #[test]
    fn submission_requires_url() {
        let bad = SubmissionData {
            submission_url: "  ".to_string(),
            submission_text: None,
        };
        assert!(bad.validate().is_err());

        let ok = SubmissionData {
            submission_url: "https://files/hw.pdf".to_string(),
            submission_text: Some("see attached".to_string()),
        };
        assert!(ok.validate().is_ok());
        let submission = ok.into_submission();
        assert_eq!(submission.grade, None);
        assert_eq!(submission.submission_text, "see attached");
    }
}
