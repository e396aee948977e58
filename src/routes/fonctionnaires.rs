use actix_web::{HttpResponse, delete, get, post, put, web};
use sea_orm::DatabaseConnection;

use crate::errors::ServiceError;
use crate::middleware::AuthUser;
use crate::models::dto::{FiltresFonctionnaires, FonctionnaireRequest};
use crate::models::fonctionnaire;
use crate::routes::Pagination;
use crate::services::fonctionnaire_service::FonctionnaireService;
use crate::services::storage::DepotFichiers;

#[get("")]
pub async fn list(
    _auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    filtres: web::Query<FiltresFonctionnaires>,
    pagination: web::Query<Pagination>,
) -> Result<HttpResponse, ServiceError> {
    let page =
        FonctionnaireService::list(db.get_ref(), filtres.into_inner(), pagination.page()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "fonctionnaires": page,
        "fonctions": fonctionnaire::FONCTIONS,
    })))
}

#[post("")]
pub async fn create(
    auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    depot: web::Data<dyn DepotFichiers>,
    body: web::Json<FonctionnaireRequest>,
) -> Result<HttpResponse, ServiceError> {
    let fonctionnaire = FonctionnaireService::create(
        db.get_ref(),
        depot.get_ref(),
        Some(auth.user_id),
        body.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "fonctionnaire": fonctionnaire,
    })))
}

#[get("/{ref}")]
pub async fn show(
    _auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    chemin: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let fonctionnaire = FonctionnaireService::show(db.get_ref(), &chemin).await?;
    Ok(HttpResponse::Ok().json(fonctionnaire))
}

#[put("/{ref}")]
pub async fn update(
    auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    depot: web::Data<dyn DepotFichiers>,
    chemin: web::Path<String>,
    body: web::Json<FonctionnaireRequest>,
) -> Result<HttpResponse, ServiceError> {
    let fonctionnaire = FonctionnaireService::update(
        db.get_ref(),
        depot.get_ref(),
        Some(auth.user_id),
        &chemin,
        body.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "fonctionnaire": fonctionnaire,
    })))
}

#[delete("/{ref}")]
pub async fn remove(
    _auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    depot: web::Data<dyn DepotFichiers>,
    chemin: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    FonctionnaireService::delete(db.get_ref(), depot.get_ref(), &chemin).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

pub fn fonctionnaires_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/fonctionnaires")
            .service(list)
            .service(create)
            .service(show)
            .service(update)
            .service(remove),
    );
}
