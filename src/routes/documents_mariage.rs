use actix_web::{HttpResponse, delete, get, post, put, web};
use sea_orm::DatabaseConnection;

use crate::errors::ServiceError;
use crate::middleware::AuthUser;
use crate::models::document_mariage;
use crate::models::dto::{DocumentMariageRequest, FiltresDocuments};
use crate::routes::Pagination;
use crate::services::document_service::DocumentService;
use crate::services::storage::DepotFichiers;

#[get("")]
pub async fn list(
    _auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    filtres: web::Query<FiltresDocuments>,
    pagination: web::Query<Pagination>,
) -> Result<HttpResponse, ServiceError> {
    let page = DocumentService::list(db.get_ref(), filtres.into_inner(), pagination.page()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "documents": page,
        "types_documents": document_mariage::types_documents(),
    })))
}

#[post("")]
pub async fn create(
    auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    depot: web::Data<dyn DepotFichiers>,
    body: web::Json<DocumentMariageRequest>,
) -> Result<HttpResponse, ServiceError> {
    let document = DocumentService::create(
        db.get_ref(),
        depot.get_ref(),
        Some(auth.user_id),
        body.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "document": document,
    })))
}

#[get("/{ref}")]
pub async fn show(
    _auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    chemin: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let document = DocumentService::show(db.get_ref(), &chemin).await?;
    Ok(HttpResponse::Ok().json(document))
}

#[put("/{ref}")]
pub async fn update(
    auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    depot: web::Data<dyn DepotFichiers>,
    chemin: web::Path<String>,
    body: web::Json<DocumentMariageRequest>,
) -> Result<HttpResponse, ServiceError> {
    let document = DocumentService::update(
        db.get_ref(),
        depot.get_ref(),
        Some(auth.user_id),
        &chemin,
        body.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "document": document,
    })))
}

#[delete("/{ref}")]
pub async fn remove(
    _auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    depot: web::Data<dyn DepotFichiers>,
    chemin: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    DocumentService::delete(db.get_ref(), depot.get_ref(), &chemin).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

pub fn documents_mariage_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/documents-mariage")
            .service(list)
            .service(create)
            .service(show)
            .service(update)
            .service(remove),
    );
}
