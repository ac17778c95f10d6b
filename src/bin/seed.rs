//! One-shot database bootstrap: creates the lookup indexes and a starter
//! account per role so a fresh deployment is immediately usable.

use anyhow::Context;
use mongodb::{Client, Database};
use tracing::Level;

use learnhub_backend::config::Config;
use learnhub_backend::data;
use learnhub_backend::data::user::db::UserDbExt;
use learnhub_backend::data::user::{User, USER_COLLECTION_NAME};
use learnhub_backend::role::Role;

async fn seed_user(
    db: &Database,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<()> {
    if db
        .find_user_by_email(email)
        .await
        .map_err(|p| anyhow::anyhow!("user lookup failed: {}", p))?
        .is_some()
    {
        tracing::info!("user {} already exists, skipping", email);
        return Ok(());
    }

    let user = User::new(name, email, password, role);
    db.collection::<User>(USER_COLLECTION_NAME)
        .insert_one(&user, None)
        .await
        .with_context(|| format!("unable to insert seed user {}", email))?;

    tracing::info!("created {} account: {}", user.role, email);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("unable to set global tracing subscriber")?;

    #[cfg(debug_assertions)]
    dotenv::dotenv().ok();

    let c = Config::from_env().context("bad configuration")?;

    let client = Client::with_uri_str(&c.mongodb_uri)
        .await
        .context("unable to connect to MongoDB")?;
    let db = client.database(&c.mongodb_db);

    data::ensure_indexes(&db)
        .await
        .context("unable to create indexes")?;
    tracing::info!("indexes ensured on {}", c.mongodb_db);

    let password =
        std::env::var("SEED_PASSWORD").unwrap_or_else(|_| "changeme123".to_string());

    seed_user(&db, "Admin", "admin@learnhub.local", &password, Role::Admin).await?;
    seed_user(
        &db,
        "Terry Teacher",
        "teacher@learnhub.local",
        &password,
        Role::Teacher,
    )
    .await?;
    seed_user(
        &db,
        "Sam Student",
        "student@learnhub.local",
        &password,
        Role::Student,
    )
    .await?;

    Ok(())
}
