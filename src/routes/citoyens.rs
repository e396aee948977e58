use actix_web::{HttpResponse, delete, get, post, put, web};
use sea_orm::DatabaseConnection;

use crate::errors::ServiceError;
use crate::middleware::AuthUser;
use crate::models::citoyen;
use crate::models::dto::{CitoyenRequest, FiltresCitoyens};
use crate::routes::Pagination;
use crate::services::citoyen_service::CitoyenService;
use crate::services::storage::DepotFichiers;

#[get("")]
pub async fn list(
    _auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    filtres: web::Query<FiltresCitoyens>,
    pagination: web::Query<Pagination>,
) -> Result<HttpResponse, ServiceError> {
    let page = CitoyenService::list(db.get_ref(), filtres.into_inner(), pagination.page()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "citoyens": page,
        "sexes": citoyen::SEXES,
        "etats_civils": citoyen::ETATS_CIVILS,
    })))
}

#[post("")]
pub async fn create(
    auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    depot: web::Data<dyn DepotFichiers>,
    body: web::Json<CitoyenRequest>,
) -> Result<HttpResponse, ServiceError> {
    let citoyen = CitoyenService::create(
        db.get_ref(),
        depot.get_ref(),
        Some(auth.user_id),
        body.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "citoyen": citoyen,
    })))
}

#[get("/{ref}")]
pub async fn show(
    _auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    chemin: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let citoyen = CitoyenService::show(db.get_ref(), &chemin).await?;
    Ok(HttpResponse::Ok().json(citoyen))
}

#[put("/{ref}")]
pub async fn update(
    auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    depot: web::Data<dyn DepotFichiers>,
    chemin: web::Path<String>,
    body: web::Json<CitoyenRequest>,
) -> Result<HttpResponse, ServiceError> {
    let citoyen = CitoyenService::update(
        db.get_ref(),
        depot.get_ref(),
        Some(auth.user_id),
        &chemin,
        body.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "citoyen": citoyen,
    })))
}

#[delete("/{ref}")]
pub async fn remove(
    _auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    depot: web::Data<dyn DepotFichiers>,
    chemin: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    CitoyenService::delete(db.get_ref(), depot.get_ref(), &chemin).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

pub fn citoyens_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/citoyens")
            .service(list)
            .service(create)
            .service(show)
            .service(update)
            .service(remove),
    );
}
