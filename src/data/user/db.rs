use bson::doc;
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};
use mongodb::Database;
use rocket::futures::TryStreamExt;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{PasswordHash, User, USER_COLLECTION_NAME};
use crate::data::filter;
use crate::resp::problem::Problem;
use crate::role::Role;

pub mod problem {
    use rocket::http::Status;
    use uuid::Uuid;

    use crate::resp::problem::Problem;

    #[inline]
    pub fn bad_email(email: impl ToString, detail: impl ToString) -> Problem {
        Problem::new_untyped(Status::BadRequest, "Bad email.")
            .insert_str("email", email)
            .detail(detail)
            .to_owned()
    }

    #[inline]
    pub fn bad_password(detail: impl ToString) -> Problem {
        Problem::new_untyped(Status::BadRequest, "Bad password.")
            .detail(detail)
            .to_owned()
    }

    #[inline]
    pub fn not_found(id: Uuid) -> Problem {
        crate::resp::problem::problems::not_found("User", id)
    }

    #[inline]
    pub fn bad_login() -> Problem {
        Problem::new_untyped(Status::Unauthorized, "Bad email or password.")
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UserSignupData {
    pub name: String,
    #[schema(format = "email")]
    pub email: String,
    #[schema(format = "password")]
    pub password: String,
    /// Requested role; admin can't be self-assigned.
    pub role: Option<Role>,
}

impl UserSignupData {
    pub fn validate(&self) -> Result<(), Problem> {
        if self.name.trim().is_empty() {
            return Err(crate::resp::problem::problems::validation(
                "Bad name.",
                "Name is required.",
            ));
        }

        if !self.email.contains('@') {
            return Err(problem::bad_email(
                self.email.to_string(),
                "Not a valid e-mail address.",
            ));
        }

        if self.password.len() < 8 {
            return Err(problem::bad_password(
                "Password must be at least 8 characters (bytes) long.",
            ));
        }

        if self.password.len() > 1024 {
            return Err(problem::bad_password(
                "Passwords longer than 1024 characters aren't supported.",
            ));
        }

        if self.role == Some(Role::Admin) {
            return Err(crate::resp::problem::problems::validation(
                "Bad role.",
                "Admin accounts can't be self-registered.",
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UserLoginData {
    #[schema(format = "email")]
    pub email: String,
    #[schema(format = "password")]
    pub password: String,
}

/// Partial profile update; only fields present in the request are applied.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ProfileUpdateData {
    pub name: Option<String>,
    #[schema(format = "email")]
    pub email: Option<String>,
    #[schema(format = "password")]
    pub password: Option<String>,
}

impl ProfileUpdateData {
    pub fn set_document(&self) -> Result<bson::Document, Problem> {
        let mut set = bson::Document::new();
        if let Some(name) = &self.name {
            set.insert("name", name);
        }
        if let Some(email) = &self.email {
            set.insert("email", email);
        }
        if let Some(password) = &self.password {
            set.insert("pw_hash", bson::to_bson(&PasswordHash::new(password))?);
        }
        Ok(set)
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RoleUpdateData {
    pub role: String,
}

pub trait UserDbExt {
    async fn create_user(
        &self,
        signup: UserSignupData,
        admin_emails: impl AsRef<[String]>,
    ) -> Result<User, Problem>;

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, Problem>;
    async fn find_user_by_email(&self, email: impl AsRef<str>) -> Result<Option<User>, Problem>;
    async fn list_users(&self) -> Result<Vec<User>, Problem>;

    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdateData,
    ) -> Result<Option<User>, Problem>;

    async fn set_role(&self, id: Uuid, role: Role) -> Result<Option<User>, Problem>;
}

impl UserDbExt for Database {
    async fn create_user(
        &self,
        signup: UserSignupData,
        admin_emails: impl AsRef<[String]>,
    ) -> Result<User, Problem> {
        if self.find_user_by_email(&signup.email).await?.is_some() {
            return Err(problem::bad_email(
                signup.email.to_string(),
                "Email already registered.",
            ));
        }

        let role = if admin_emails.as_ref().contains(&signup.email) {
            Role::Admin
        } else {
            signup.role.unwrap_or(Role::Student)
        };

        let user = User::new(&signup.name, &signup.email, &signup.password, role);

        self.collection::<User>(USER_COLLECTION_NAME)
            .insert_one(&user, None)
            .await
            .map_err(Problem::from)?;

        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, Problem> {
        self.collection::<User>(USER_COLLECTION_NAME)
            .find_one(filter::by_id(id), None)
            .await
            .map_err(Problem::from)
    }

    async fn find_user_by_email(&self, email: impl AsRef<str>) -> Result<Option<User>, Problem> {
        self.collection::<User>(USER_COLLECTION_NAME)
            .find_one(doc! { "email": email.as_ref() }, None)
            .await
            .map_err(Problem::from)
    }

    async fn list_users(&self) -> Result<Vec<User>, Problem> {
        self.collection::<User>(USER_COLLECTION_NAME)
            .find(None, None)
            .await
            .map_err(Problem::from)?
            .try_collect()
            .await
            .map_err(Problem::from)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdateData,
    ) -> Result<Option<User>, Problem> {
        let set = update.set_document()?;
        if set.is_empty() {
            return self.get_user(id).await;
        }

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        self.collection::<User>(USER_COLLECTION_NAME)
            .find_one_and_update(filter::by_id(id), doc! { "$set": set }, options)
            .await
            .map_err(Problem::from)
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<Option<User>, Problem> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        self.collection::<User>(USER_COLLECTION_NAME)
            .find_one_and_update(
                filter::by_id(id),
                doc! { "$set": { "role": role.to_string() } },
                options,
            )
            .await
            .map_err(Problem::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(email: &str, password: &str) -> UserSignupData {
        UserSignupData {
            name: "Test User".to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role: None,
        }
    }

    #[test]
    fn signup_rejects_bad_email() {
        assert!(signup("not-an-email", "long enough pw").validate().is_err());
        assert!(signup("ok@example.com", "long enough pw").validate().is_ok());
    }

    #[test]
    fn signup_rejects_short_password() {
        assert!(signup("ok@example.com", "short").validate().is_err());
    }

    #[test]
    fn signup_rejects_self_assigned_admin() {
        let mut data = signup("ok@example.com", "long enough pw");
        data.role = Some(Role::Admin);
        assert!(data.validate().is_err());

        data.role = Some(Role::Teacher);
        assert!(data.validate().is_ok());
    }

    #[test]
    fn profile_update_applies_only_present_fields() {
        let update = ProfileUpdateData {
            name: Some("New Name".to_string()),
            email: None,
            password: None,
        };
        let set = update.set_document().unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.get_str("name").unwrap(), "New Name");
        assert!(set.get("email").is_none());
        assert!(set.get("pw_hash").is_none());
    }

    #[test]
    fn profile_update_rehashes_password() {
        let update = ProfileUpdateData {
            name: None,
            email: None,
            password: Some("another password".to_string()),
        };
        let set = update.set_document().unwrap();
        assert!(set.get("pw_hash").is_some());
        assert!(set.get("password").is_none());
    }
}
