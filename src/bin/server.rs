use tracing::Level;

#[rocket::main]
async fn main() {
    #[cfg(debug_assertions)]
    let level = Some(Level::DEBUG);
    #[cfg(not(debug_assertions))]
    let level = Some(Level::INFO);

    let rocket = match learnhub_backend::create(level).await {
        Ok(rocket) => rocket,
        Err(e) => {
            tracing::error!("Error preparing server: {}", e);
            return;
        }
    };

    match rocket.launch().await {
        Ok(_) => {}
        Err(e) => {
            tracing::error!("Error launching server: {}", e);
        }
    };
}
