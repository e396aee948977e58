use actix_web::{Error, FromRequest, HttpRequest, HttpResponse, dev::Payload};
use futures::future::{Ready, ready};
use serde::{Deserialize, Serialize};

use crate::utils::jwt;

/// Infos de l'utilisateur authentifié, extraites du JWT.
/// Utilisée comme extracteur dans les routes protégées.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: i32,
    pub name: String,
}

fn non_autorise(message: impl Into<String>) -> Error {
    let response = HttpResponse::Unauthorized().json(serde_json::json!({
        "error": message.into()
    }));
    actix_web::error::InternalError::from_response("", response).into()
}

impl FromRequest for AuthUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        // Header Authorization au format "Bearer <token>"
        let auth_header = match req.headers().get("Authorization") {
            Some(header) => header,
            None => return ready(Err(non_autorise("Missing Authorization header"))),
        };

        let auth_str = match auth_header.to_str() {
            Ok(s) => s,
            Err(_) => return ready(Err(non_autorise("Invalid Authorization header"))),
        };

        let token = match auth_str.strip_prefix("Bearer ") {
            Some(token) => token,
            None => {
                return ready(Err(non_autorise(
                    "Invalid Authorization format (expected: Bearer <token>)",
                )));
            }
        };

        let claims = match jwt::verify_token(token) {
            Ok(claims) => claims,
            Err(e) => return ready(Err(non_autorise(format!("Invalid token: {}", e)))),
        };

        ready(Ok(AuthUser {
            user_id: claims.sub,
            name: claims.name,
        }))
    }
}
