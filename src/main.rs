mod db;
mod errors;
mod middleware;
mod models;
mod routes;
mod services;
mod utils;

use actix_web::{App, HttpServer, web};
use std::env;
use std::sync::Arc;

use services::storage::{DepotFichiers, DepotLocal};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let db = db::establish_connection()
        .await
        .map_err(|e| std::io::Error::other(format!("connexion à la base: {e}")))?;
    tracing::info!("base de données connectée");
    let db = web::Data::new(db);

    let depot: Arc<dyn DepotFichiers> = Arc::new(DepotLocal::new(
        env::var("STORAGE_DIR").unwrap_or_else(|_| "storage".to_string()),
    ));

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    tracing::info!(host, port, "démarrage du serveur");

    HttpServer::new(move || {
        App::new()
            .app_data(db.clone())
            .app_data(web::Data::from(depot.clone()))
            .configure(routes::configure_routes)
    })
    .bind((host, port))?
    .run()
    .await
}
