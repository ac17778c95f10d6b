use mongodb::options::IndexOptions;
use mongodb::{Database, IndexModel};

pub mod assignment;
pub mod course;
pub mod question;
pub mod user;

pub mod filter {
    use bson::{doc, Document};
    use uuid::Uuid;

    /// UUIDs are stored in their hyphenated string form, `_id` included, so
    /// documents read back the same way they render in JSON responses.
    #[inline]
    pub fn by_id(id: Uuid) -> Document {
        doc! { "_id": id.to_string() }
    }
}

/// Secondary lookup indexes, matching what the seed script creates: a unique
/// index on user email plus lookups on course instructor/category and the
/// assignment-to-course reference.
pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    let unique = IndexOptions::builder().unique(true).build();

    db.collection::<user::User>(user::USER_COLLECTION_NAME)
        .create_index(
            IndexModel::builder()
                .keys(bson::doc! { "email": 1 })
                .options(unique)
                .build(),
            None,
        )
        .await?;

    let courses = db.collection::<course::Course>(course::COURSE_COLLECTION_NAME);
    courses
        .create_index(
            IndexModel::builder()
                .keys(bson::doc! { "instructor": 1 })
                .build(),
            None,
        )
        .await?;
    courses
        .create_index(
            IndexModel::builder()
                .keys(bson::doc! { "category": 1 })
                .build(),
            None,
        )
        .await?;

    db.collection::<assignment::Assignment>(assignment::ASSIGNMENT_COLLECTION_NAME)
        .create_index(
            IndexModel::builder()
                .keys(bson::doc! { "course": 1 })
                .build(),
            None,
        )
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    #[test]
    fn id_filter_uses_hyphenated_string() {
        let id = Uuid::new_v4();
        let filter = super::filter::by_id(id);
        assert_eq!(filter.get_str("_id").unwrap(), id.to_string());
    }
}
