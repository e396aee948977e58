use actix_web::{HttpResponse, delete, get, post, put, web};
use sea_orm::DatabaseConnection;

use crate::errors::ServiceError;
use crate::middleware::AuthUser;
use crate::models::dto::{EtapeMariageRequest, FiltresEtapes};
use crate::models::etape_mariage;
use crate::routes::Pagination;
use crate::services::etape_service::EtapeService;

#[get("")]
pub async fn list(
    _auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    filtres: web::Query<FiltresEtapes>,
    pagination: web::Query<Pagination>,
) -> Result<HttpResponse, ServiceError> {
    let page = EtapeService::list(db.get_ref(), filtres.into_inner(), pagination.page()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "etapes": page,
        "types_etapes": etape_mariage::etapes(),
        "statuts": etape_mariage::statuts(),
    })))
}

#[post("")]
pub async fn create(
    auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    body: web::Json<EtapeMariageRequest>,
) -> Result<HttpResponse, ServiceError> {
    let etape = EtapeService::create(db.get_ref(), Some(auth.user_id), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "etape": etape,
    })))
}

#[get("/{ref}")]
pub async fn show(
    _auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    chemin: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let etape = EtapeService::show(db.get_ref(), &chemin).await?;
    Ok(HttpResponse::Ok().json(etape))
}

#[put("/{ref}")]
pub async fn update(
    auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    chemin: web::Path<String>,
    body: web::Json<EtapeMariageRequest>,
) -> Result<HttpResponse, ServiceError> {
    let etape =
        EtapeService::update(db.get_ref(), Some(auth.user_id), &chemin, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "etape": etape,
    })))
}

#[delete("/{ref}")]
pub async fn remove(
    _auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    chemin: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    EtapeService::delete(db.get_ref(), &chemin).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

pub fn etapes_mariage_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/etapes-mariage")
            .service(list)
            .service(create)
            .service(show)
            .service(update)
            .service(remove),
    );
}
