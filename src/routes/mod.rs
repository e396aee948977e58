pub mod auth;
pub mod citoyens;
pub mod documents_mariage;
pub mod etapes_mariage;
pub mod fonctionnaires;
pub mod health;
pub mod mariages;
pub mod paiements;
pub mod pieces_jointes;

use actix_web::web;
use serde::Deserialize;

/// Paramètre de pagination commun aux listings (page 1 par défaut).
#[derive(Debug, Deserialize)]
pub struct Pagination {
    pub page: Option<u64>,
}

impl Pagination {
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1)
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(health::health_check)
            .configure(auth::auth_routes)
            .configure(citoyens::citoyens_routes)
            .configure(fonctionnaires::fonctionnaires_routes)
            .configure(mariages::mariages_routes)
            .configure(documents_mariage::documents_mariage_routes)
            .configure(etapes_mariage::etapes_mariage_routes)
            .configure(paiements::paiements_routes)
            .configure(pieces_jointes::pieces_jointes_routes),
    );
}
