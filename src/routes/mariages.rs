use actix_web::{HttpResponse, delete, get, post, put, web};
use sea_orm::DatabaseConnection;

use crate::errors::ServiceError;
use crate::middleware::AuthUser;
use crate::models::dto::{FiltresMariages, MariageRequest};
use crate::models::mariage;
use crate::routes::Pagination;
use crate::services::mariage_service::MariageService;

#[get("")]
pub async fn list(
    _auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    filtres: web::Query<FiltresMariages>,
    pagination: web::Query<Pagination>,
) -> Result<HttpResponse, ServiceError> {
    let page = MariageService::list(db.get_ref(), filtres.into_inner(), pagination.page()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "mariages": page,
        "statuts": mariage::statuts(),
        "regimes_matrimoniaux": mariage::regimes_matrimoniaux(),
    })))
}

#[post("")]
pub async fn create(
    auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    body: web::Json<MariageRequest>,
) -> Result<HttpResponse, ServiceError> {
    let mariage =
        MariageService::create(db.get_ref(), Some(auth.user_id), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "mariage": mariage,
    })))
}

#[get("/{ref}")]
pub async fn show(
    _auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    chemin: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let mariage = MariageService::show(db.get_ref(), &chemin).await?;
    Ok(HttpResponse::Ok().json(mariage))
}

#[put("/{ref}")]
pub async fn update(
    auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    chemin: web::Path<String>,
    body: web::Json<MariageRequest>,
) -> Result<HttpResponse, ServiceError> {
    let mariage =
        MariageService::update(db.get_ref(), Some(auth.user_id), &chemin, body.into_inner())
            .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "mariage": mariage,
    })))
}

#[delete("/{ref}")]
pub async fn remove(
    _auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    chemin: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    MariageService::delete(db.get_ref(), &chemin).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

pub fn mariages_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/mariages")
            .service(list)
            .service(create)
            .service(show)
            .service(update)
            .service(remove),
    );
}
