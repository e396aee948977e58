use actix_web::{HttpResponse, delete, get, post, put, web};
use sea_orm::DatabaseConnection;

use crate::errors::ServiceError;
use crate::middleware::AuthUser;
use crate::models::dto::{
    CreatePieceJointeRequest, FiltresPiecesJointes, UpdatePieceJointeRequest,
};
use crate::models::piece_jointe;
use crate::routes::Pagination;
use crate::services::piece_jointe_service::PieceJointeService;
use crate::services::storage::DepotFichiers;

#[get("")]
pub async fn list(
    _auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    filtres: web::Query<FiltresPiecesJointes>,
    pagination: web::Query<Pagination>,
) -> Result<HttpResponse, ServiceError> {
    let page =
        PieceJointeService::list(db.get_ref(), filtres.into_inner(), pagination.page()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "pieces_jointes": page,
        "types_pieces": piece_jointe::types_pieces(),
    })))
}

#[post("")]
pub async fn create(
    auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    depot: web::Data<dyn DepotFichiers>,
    body: web::Json<CreatePieceJointeRequest>,
) -> Result<HttpResponse, ServiceError> {
    let piece = PieceJointeService::create(
        db.get_ref(),
        depot.get_ref(),
        Some(auth.user_id),
        body.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "piece_jointe": piece,
    })))
}

#[get("/{ref}")]
pub async fn show(
    _auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    chemin: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let piece = PieceJointeService::show(db.get_ref(), &chemin).await?;
    Ok(HttpResponse::Ok().json(piece))
}

#[put("/{ref}")]
pub async fn update(
    auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    depot: web::Data<dyn DepotFichiers>,
    chemin: web::Path<String>,
    body: web::Json<UpdatePieceJointeRequest>,
) -> Result<HttpResponse, ServiceError> {
    let piece = PieceJointeService::update(
        db.get_ref(),
        depot.get_ref(),
        Some(auth.user_id),
        &chemin,
        body.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "piece_jointe": piece,
    })))
}

#[delete("/{ref}")]
pub async fn remove(
    _auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    depot: web::Data<dyn DepotFichiers>,
    chemin: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    PieceJointeService::delete(db.get_ref(), depot.get_ref(), &chemin).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

pub fn pieces_jointes_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/pieces-jointes")
            .service(list)
            .service(create)
            .service(show)
            .service(update)
            .service(remove),
    );
}
