use std::env;

use crate::error::ConfigurationError;

fn default_mongodb_uri() -> String {
    env::var("MONGODB_URI").unwrap_or("mongodb://localhost:27017".to_string())
}

fn default_mongodb_db() -> String {
    env::var("MONGODB_DB_NAME").unwrap_or("learnhub".to_string())
}

#[cfg(debug_assertions)]
fn default_admin_emails() -> Vec<String> {
    vec![String::from("admin@learnhub.local")]
}
#[cfg(not(debug_assertions))]
fn default_admin_emails() -> Vec<String> {
    vec![]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_mongodb_uri")]
    pub mongodb_uri: String,
    #[serde(default = "default_mongodb_db")]
    pub mongodb_db: String,

    pub port: u16,

    /// Accounts registered with one of these emails are granted the admin role.
    #[serde(default = "default_admin_emails")]
    pub admin_emails: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigurationError> {
        let port = match env::var("PORT") {
            Ok(value) => value
                .parse::<u16>()
                .map_err(|_| ConfigurationError::InvalidPort(value))?,
            Err(_) => 5000,
        };

        let admin_emails = match env::var("ADMIN_EMAILS") {
            Ok(list) => list
                .split(',')
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty())
                .collect(),
            Err(_) => default_admin_emails(),
        };

        Ok(Config {
            mongodb_uri: default_mongodb_uri(),
            mongodb_db: default_mongodb_db(),
            port,
            admin_emails,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            mongodb_uri: default_mongodb_uri(),
            mongodb_db: default_mongodb_db(),
            port: 5000,
            admin_emails: default_admin_emails(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_env_uses_defaults() {
        let c = Config::from_env().expect("defaults should always load");
        assert_eq!(c.port, 5000);
        assert!(!c.mongodb_uri.is_empty());
        assert!(!c.mongodb_db.is_empty());
    }
}
