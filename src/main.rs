use dotenv::dotenv;
use handlebars::Handlebars;
use log::*;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use std::env;
use std::str::FromStr;
use std::sync::Arc;

mod models;
mod polls;
mod routes;

/**
 * Struct for carrying application state into tide request handlers
 */
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub hbs: Arc<Handlebars<'static>>,
}

/**
 * Create the sqlx connection pool for sqlite
 */
async fn create_pool() -> Result<SqlitePool, sqlx::Error> {
    dotenv().ok();

    let database_url = env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set");
    let options = SqliteConnectOptions::from_str(&database_url)?
        .create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}

/**
 * Register all the Handlebars templates found in templates/
 */
fn load_templates() -> Result<Handlebars<'static>, handlebars::TemplateFileError> {
    let mut hbs = Handlebars::new();
    hbs.register_templates_directory(".hbs", "templates")?;
    Ok(hbs)
}

#[async_std::main]
async fn main() -> Result<(), std::io::Error> {
    pretty_env_logger::init();

    match create_pool().await {
        Ok(db) => {
            if let Err(err) = sqlx::migrate!().run(&db).await {
                error!("Could not run migrations! {:?}", err);
                return Err(std::io::Error::new(std::io::ErrorKind::Other, err));
            }

            let hbs = load_templates().map_err(|err| {
                error!("Could not load templates! {:?}", err);
                std::io::Error::new(std::io::ErrorKind::Other, format!("{}", err))
            })?;

            let state = AppState {
                db,
                hbs: Arc::new(hbs),
            };
            let mut app = tide::with_state(state);
            app.with(driftwood::DevLogger);
            app.at("/").get(routes::index);
            app.at("/polls/all").get(routes::questions::all);
            app.at("/polls/popular").get(routes::questions::popular);
            app.at("/polls/:id").get(routes::questions::detail);
            app.at("/polls/:id/results").get(routes::questions::results);
            app.at("/polls/:id/vote").post(routes::questions::vote);

            let bind = env::var("BIND").unwrap_or_else(|_| "127.0.0.1:8000".to_string());
            app.listen(bind).await?;
            Ok(())
        },
        Err(err) => {
            error!("Could not initialize pool! {:?}", err);
            Err(std::io::Error::new(std::io::ErrorKind::Other, err))
        },
    }
}
