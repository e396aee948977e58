use actix_web::{HttpResponse, delete, get, post, put, web};
use sea_orm::DatabaseConnection;

use crate::errors::ServiceError;
use crate::middleware::AuthUser;
use crate::models::dto::{CreatePaiementRequest, FiltresPaiements, UpdatePaiementRequest};
use crate::models::paiement;
use crate::routes::Pagination;
use crate::services::paiement_service::PaiementService;

#[get("")]
pub async fn list(
    _auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    filtres: web::Query<FiltresPaiements>,
    pagination: web::Query<Pagination>,
) -> Result<HttpResponse, ServiceError> {
    let page = PaiementService::list(db.get_ref(), filtres.into_inner(), pagination.page()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "paiements": page,
        "modes_paiement": paiement::MODES_PAIEMENT,
        "statuts": paiement::STATUTS,
    })))
}

#[post("")]
pub async fn create(
    auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    body: web::Json<CreatePaiementRequest>,
) -> Result<HttpResponse, ServiceError> {
    let paiement =
        PaiementService::create(db.get_ref(), Some(auth.user_id), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "paiement": paiement,
    })))
}

#[get("/{ref}")]
pub async fn show(
    _auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    chemin: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let paiement = PaiementService::show(db.get_ref(), &chemin).await?;
    Ok(HttpResponse::Ok().json(paiement))
}

#[put("/{ref}")]
pub async fn update(
    auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    chemin: web::Path<String>,
    body: web::Json<UpdatePaiementRequest>,
) -> Result<HttpResponse, ServiceError> {
    let paiement =
        PaiementService::update(db.get_ref(), Some(auth.user_id), &chemin, body.into_inner())
            .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "paiement": paiement,
    })))
}

#[delete("/{ref}")]
pub async fn remove(
    _auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    chemin: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    PaiementService::delete(db.get_ref(), &chemin).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

pub fn paiements_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/paiements")
            .service(list)
            .service(create)
            .service(show)
            .service(update)
            .service(remove),
    );
}
