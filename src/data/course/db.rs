use std::collections::BTreeMap;

use bson::doc;
use chrono::Utc;
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};
use mongodb::Database;
use rocket::futures::TryStreamExt;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{Course, Lesson, Level, Rating, COURSE_COLLECTION_NAME};
use crate::data::assignment::ASSIGNMENT_COLLECTION_NAME;
use crate::data::filter;
use crate::resp::problem::{problems, Problem};

pub mod problem {
    use uuid::Uuid;

    use crate::resp::problem::{problems, Problem};

    #[inline]
    pub fn not_found(id: Uuid) -> Problem {
        problems::not_found("Course", id)
    }
}

fn validate_lessons(lessons: &[Lesson]) -> Result<(), Problem> {
    for lesson in lessons {
        if lesson.title.trim().is_empty() || lesson.content.trim().is_empty() {
            return Err(problems::validation(
                "Bad lesson.",
                "Lesson title and content are required.",
            ));
        }
        for quiz in &lesson.quizzes {
            if quiz.correct_answer < 0 || quiz.correct_answer as usize >= quiz.options.len() {
                return Err(problems::validation(
                    "Bad quiz question.",
                    "The correct answer must index one of the provided options.",
                ));
            }
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CourseCreateData {
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub category: String,
    pub level: Level,
    pub price: Option<f64>,
    /// Signed for the same reason as [`RatingData::rating`].
    pub duration_hours: i64,
    pub lessons: Option<Vec<Lesson>>,
}

impl CourseCreateData {
    pub fn validate(&self) -> Result<(), Problem> {
        if self.title.trim().is_empty()
            || self.description.trim().is_empty()
            || self.category.trim().is_empty()
        {
            return Err(problems::validation(
                "Bad course.",
                "Title, description and category are required.",
            ));
        }

        if self.duration_hours < 0 {
            return Err(problems::validation(
                "Bad course.",
                "Duration must not be negative.",
            ));
        }

        if let Some(lessons) = &self.lessons {
            validate_lessons(lessons)?;
        }

        Ok(())
    }

    pub fn into_course(self, instructor: Uuid) -> Course {
        let now = Utc::now();
        Course {
            id: Uuid::new_v4(),
            title: self.title,
            description: self.description,
            instructor,
            image_url: self.image_url,
            category: self.category,
            level: self.level,
            price: self.price.unwrap_or(0.0),
            duration_hours: self.duration_hours as u32,
            lessons: self.lessons.unwrap_or_default(),
            enrolled_students: vec![],
            ratings: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial course update; only fields present in the request are applied and
/// `updated_at` is refreshed on every write.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CourseUpdateData {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub level: Option<Level>,
    pub price: Option<f64>,
    pub duration_hours: Option<i64>,
    pub lessons: Option<Vec<Lesson>>,
}

impl CourseUpdateData {
    pub fn validate(&self) -> Result<(), Problem> {
        if self.duration_hours.is_some_and(|h| h < 0) {
            return Err(problems::validation(
                "Bad course.",
                "Duration must not be negative.",
            ));
        }
        if let Some(lessons) = &self.lessons {
            validate_lessons(lessons)?;
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
        if let Some(image_url) = &self.image_url {
            set.insert("image_url", image_url);
        }
        if let Some(category) = &self.category {
            set.insert("category", category);
        }
        if let Some(level) = &self.level {
            set.insert("level", bson::to_bson(level)?);
        }
        if let Some(price) = self.price {
            set.insert("price", price);
        }
        if let Some(duration_hours) = self.duration_hours {
            set.insert("duration_hours", duration_hours);
        }
        if let Some(lessons) = &self.lessons {
            set.insert("lessons", bson::to_bson(lessons)?);
        }
        set.insert("updated_at", bson::to_bson(&Utc::now())?);
        Ok(set)
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RatingData {
    /// Closed range [1, 5]; validated before any document is touched.
    pub rating: i32,
    pub review: Option<String>,
}

impl RatingData {
    pub fn validate(&self) -> Result<(), Problem> {
        if !(1..=5).contains(&self.rating) {
            return Err(problems::validation(
                "Bad rating.",
                "Rating must be between 1 and 5.",
            ));
        }
        Ok(())
    }

    pub fn into_rating(self) -> Rating {
        Rating {
            rating: self.rating as u8,
            review: self.review.unwrap_or_default(),
            date: Utc::now(),
        }
    }
}

pub trait CourseDbExt {
    async fn insert_course(&self, course: &Course) -> Result<(), Problem>;
    async fn get_course(&self, id: Uuid) -> Result<Option<Course>, Problem>;
    async fn list_courses(&self) -> Result<Vec<Course>, Problem>;
    async fn list_courses_by_instructor(&self, instructor: Uuid) -> Result<Vec<Course>, Problem>;
    async fn list_enrolled_courses(&self, student: Uuid) -> Result<Vec<Course>, Problem>;

    async fn update_course(
        &self,
        id: Uuid,
        update: CourseUpdateData,
    ) -> Result<Option<Course>, Problem>;

    /// Hard delete. Assignments belonging to the course are removed with it;
    /// questions keep their creation-time snapshots.
    async fn delete_course(&self, id: Uuid) -> Result<Option<Course>, Problem>;

    async fn enroll_student(&self, id: Uuid, student: Uuid) -> Result<(), Problem>;

    /// Upserts a single map key, so two concurrent raters never clobber each
    /// other's entries.
    async fn put_rating(&self, id: Uuid, rater: Uuid, rating: Rating) -> Result<(), Problem>;
}

impl CourseDbExt for Database {
    async fn insert_course(&self, course: &Course) -> Result<(), Problem> {
        self.collection::<Course>(COURSE_COLLECTION_NAME)
            .insert_one(course, None)
            .await
            .map_err(Problem::from)?;
        Ok(())
    }

    async fn get_course(&self, id: Uuid) -> Result<Option<Course>, Problem> {
        self.collection::<Course>(COURSE_COLLECTION_NAME)
            .find_one(filter::by_id(id), None)
            .await
            .map_err(Problem::from)
    }

    async fn list_courses(&self) -> Result<Vec<Course>, Problem> {
        self.collection::<Course>(COURSE_COLLECTION_NAME)
            .find(None, None)
            .await
            .map_err(Problem::from)?
            .try_collect()
            .await
            .map_err(Problem::from)
    }

    async fn list_courses_by_instructor(&self, instructor: Uuid) -> Result<Vec<Course>, Problem> {
        self.collection::<Course>(COURSE_COLLECTION_NAME)
            .find(doc! { "instructor": instructor.to_string() }, None)
            .await
            .map_err(Problem::from)?
            .try_collect()
            .await
            .map_err(Problem::from)
    }

    async fn list_enrolled_courses(&self, student: Uuid) -> Result<Vec<Course>, Problem> {
        self.collection::<Course>(COURSE_COLLECTION_NAME)
            .find(doc! { "enrolled_students": student.to_string() }, None)
            .await
            .map_err(Problem::from)?
            .try_collect()
            .await
            .map_err(Problem::from)
    }

    async fn update_course(
        &self,
        id: Uuid,
        update: CourseUpdateData,
    ) -> Result<Option<Course>, Problem> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        self.collection::<Course>(COURSE_COLLECTION_NAME)
            .find_one_and_update(
                filter::by_id(id),
                doc! { "$set": update.set_document()? },
                options,
            )
            .await
            .map_err(Problem::from)
    }

    async fn delete_course(&self, id: Uuid) -> Result<Option<Course>, Problem> {
        let removed = self
            .collection::<Course>(COURSE_COLLECTION_NAME)
            .find_one_and_delete(filter::by_id(id), None)
            .await
            .map_err(Problem::from)?;

        if removed.is_some() {
            self.collection::<bson::Document>(ASSIGNMENT_COLLECTION_NAME)
                .delete_many(doc! { "course": id.to_string() }, None)
                .await
                .map_err(Problem::from)?;
        }

        Ok(removed)
    }

    async fn enroll_student(&self, id: Uuid, student: Uuid) -> Result<(), Problem> {
        self.collection::<Course>(COURSE_COLLECTION_NAME)
            .update_one(
                filter::by_id(id),
                doc! { "$addToSet": { "enrolled_students": student.to_string() } },
                None,
            )
            .await
            .map_err(Problem::from)?;
        Ok(())
    }

    async fn put_rating(&self, id: Uuid, rater: Uuid, rating: Rating) -> Result<(), Problem> {
        let mut set = bson::Document::new();
        set.insert(format!("ratings.{}", rater), bson::to_bson(&rating)?);
        set.insert("updated_at", bson::to_bson(&Utc::now())?);

        self.collection::<Course>(COURSE_COLLECTION_NAME)
            .update_one(filter::by_id(id), doc! { "$set": set }, None)
            .await
            .map_err(Problem::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::course::QuizQuestion;

    #[test]
    fn rating_range_is_closed() {
        assert!(RatingData { rating: 0, review: None }.validate().is_err());
        assert!(RatingData { rating: 1, review: None }.validate().is_ok());
        assert!(RatingData { rating: 5, review: None }.validate().is_ok());
        assert!(RatingData { rating: 6, review: None }.validate().is_err());
        assert!(RatingData { rating: -1, review: None }.validate().is_err());
    }

    #[test]
    fn update_touches_only_present_fields() {
        let update = CourseUpdateData {
            title: Some("Renamed".to_string()),
            price: Some(25.0),
            ..Default::default()
        };
        let set = update.set_document().unwrap();

        assert_eq!(set.get_str("title").unwrap(), "Renamed");
        assert_eq!(set.get_f64("price").unwrap(), 25.0);
        assert!(set.get("description").is_none());
        assert!(set.get("lessons").is_none());
        // every write refreshes the modification stamp
        assert!(set.get("updated_at").is_some());
    }

    #[test]
    fn quiz_answer_index_must_be_in_range() {
        let lesson = Lesson {
            title: "L1".to_string(),
            content: "text".to_string(),
            video_url: None,
            resources: vec![],
            quizzes: vec![QuizQuestion {
                question: "2 + 2?".to_string(),
                options: vec!["3".to_string(), "4".to_string()],
                correct_answer: 2,
            }],
        };
        assert!(validate_lessons(&[lesson.clone()]).is_err());

        let mut negative = lesson.clone();
        negative.quizzes[0].correct_answer = -1;
        assert!(validate_lessons(&[negative]).is_err());

        let mut ok = lesson;
        ok.quizzes[0].correct_answer = 1;
        assert!(validate_lessons(&[ok]).is_ok());
    }

    #[test]
    fn negative_duration_is_rejected() {
        let data = CourseCreateData {
            title: "t".to_string(),
            description: "d".to_string(),
            image_url: None,
            category: "c".to_string(),
            level: Level::Beginner,
            price: None,
            duration_hours: -4,
            lessons: None,
        };
        assert!(data.validate().is_err());

        let update = CourseUpdateData {
            duration_hours: Some(-4),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn create_data_requires_core_fields() {
        let data = CourseCreateData {
            title: " ".to_string(),
            description: "d".to_string(),
            image_url: None,
            category: "c".to_string(),
            level: Level::Beginner,
            price: None,
            duration_hours: 1,
            lessons: None,
        };
        assert!(data.validate().is_err());
    }
}
