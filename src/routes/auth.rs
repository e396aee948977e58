use actix_web::{HttpResponse, get, post, web};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Serialize;
use validator::Validate;

use crate::errors::ServiceError;
use crate::middleware::AuthUser;
use crate::models::dto::LoginRequest;
use crate::models::users::{Column as UserColumn, Entity as Users};
use crate::utils::{jwt, password};

/// Réponse après login
#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user_id: i32,
    pub name: String,
    pub role: String,
}

/// POST /auth/login - Se connecter (PUBLIC)
#[post("/login")]
pub async fn login(
    body: web::Json<LoginRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ServiceError> {
    let body = body.into_inner();
    body.validate()?;

    let user = Users::find()
        .filter(UserColumn::Email.eq(&body.email))
        .one(db.get_ref())
        .await?;

    let Some(user) = user else {
        return Ok(identifiants_invalides());
    };

    let valide = password::verify_password(&body.password, &user.password_hash)
        .map_err(ServiceError::Storage)?;
    if !valide {
        return Ok(identifiants_invalides());
    }

    let token = jwt::generate_token(user.id, &user.name).map_err(ServiceError::Storage)?;
    tracing::info!(user_id = user.id, "connexion réussie");

    Ok(HttpResponse::Ok().json(AuthResponse {
        token,
        user_id: user.id,
        name: user.name,
        role: user.role,
    }))
}

/// GET /auth/me - Vérifier le token (PROTÉGÉE)
#[get("/me")]
pub async fn me(auth_user: AuthUser) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "user_id": auth_user.user_id,
        "name": auth_user.name,
    }))
}

fn identifiants_invalides() -> HttpResponse {
    // Même message que l'email existe ou non
    HttpResponse::Unauthorized().json(serde_json::json!({
        "error": "Email ou mot de passe invalide"
    }))
}

pub fn auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/auth").service(login).service(me));
}
