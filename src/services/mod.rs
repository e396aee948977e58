// ============================================================================
// SERVICES - LOGIQUE MÉTIER
// ============================================================================
//
// Description:
//   Un service par entité (CRUD validé + recherche filtrée paginée), plus:
//   - audit   : références opaques et cachets créateur/modificateur
//   - storage : dépôt de fichiers (collaborateur blob)
//
//   Flux d'une commande: validation du payload → vérifications d'existence
//   et d'unicité → cachet d'audit → persistance. La porte de workflow des
//   paiements vit dans paiement_service.
//
// ============================================================================

pub mod audit;
pub mod citoyen_service;
pub mod document_service;
pub mod etape_service;
pub mod fonctionnaire_service;
pub mod mariage_service;
pub mod paiement_service;
pub mod piece_jointe_service;
pub mod storage;

use base64::{Engine, engine::general_purpose::STANDARD};
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::collections::HashMap;

use crate::errors::ServiceError;
use crate::models::dto::FichierUpload;
use crate::models::users;

/// Taille de page fixe pour tous les listings.
pub const PAR_PAGE: u64 = 10;

/// Identifiant du principal authentifié, absent hors contexte authentifié.
pub type Principal = Option<i32>;

/// Prédicat "contient la sous-chaîne, sans tenir compte de la casse".
pub(crate) fn contient<C: ColumnTrait>(colonne: C, terme: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(colonne))).like(format!("%{}%", terme.to_lowercase()))
}

/// Décode le contenu base64 d'un fichier uploadé.
pub(crate) fn decoder_fichier(fichier: &FichierUpload) -> Result<Vec<u8>, ServiceError> {
    STANDARD
        .decode(fichier.contenu.as_bytes())
        .map_err(|_| ServiceError::champ("fichier", "Le contenu du fichier doit être en base64"))
}

/// Résout des ids de comptes utilisateurs en noms affichables, en une requête
/// groupée (affichage créé par / modifié par).
pub(crate) async fn noms_utilisateurs(
    db: &DatabaseConnection,
    ids: impl IntoIterator<Item = i32>,
) -> Result<HashMap<i32, String>, ServiceError> {
    let ids: Vec<i32> = ids.into_iter().collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(users::Entity::find()
        .filter(users::Column::Id.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u.name))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoder_fichier_invalide() {
        let fichier = FichierUpload {
            nom: "photo.png".into(),
            contenu: "pas du base64 !!!".into(),
        };
        assert!(decoder_fichier(&fichier).is_err());
    }

    #[test]
    fn test_decoder_fichier_valide() {
        let fichier = FichierUpload {
            nom: "photo.png".into(),
            contenu: STANDARD.encode(b"octets"),
        };
        assert_eq!(decoder_fichier(&fichier).unwrap(), b"octets");
    }
}
