// ============================================================================
// ERREURS - TAXONOMIE DES ERREURS DE SERVICE
// ============================================================================
//
// Description:
//   Toutes les erreurs renvoyées par la couche services. Chaque variante
//   correspond à une famille d'erreur distincte côté appelant:
//   - Validation : payload invalide, rapporté champ par champ (HTTP 400)
//   - NotFound   : la référence ne résout aucun enregistrement (HTTP 404)
//   - Workflow   : violation d'une règle métier (mariage non approuvé) (HTTP 409)
//   - Conflict   : violation d'unicité détectée au commit (HTTP 409)
//   - Database / Storage : défaillances des collaborateurs (HTTP 500)
//
//   Aucune de ces erreurs n'est fatale au processus: elles sont locales à une
//   commande et transformées en réponse JSON par l'impl ResponseError.
//
// ============================================================================

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use sea_orm::{DbErr, SqlErr, TransactionError};
use std::collections::BTreeMap;
use thiserror::Error;

/// Messages d'erreur par champ, dans l'ordre des champs.
pub type ErreursChamps = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Le payload ne respecte pas les règles de forme/enum/inter-champs/unicité.
    /// Ne mute jamais l'état.
    #[error("Les données fournies sont invalides")]
    Validation(ErreursChamps),

    /// La référence ne correspond à aucun enregistrement existant.
    #[error("{0} introuvable")]
    NotFound(&'static str),

    /// Rejet par une règle métier (ex: porte de paiement du mariage).
    #[error("{0}")]
    Workflow(String),

    /// Une écriture concurrente a violé une contrainte d'unicité au commit.
    #[error("La valeur « {valeur} » du champ {champ} est déjà utilisée")]
    Conflict {
        champ: &'static str,
        valeur: String,
    },

    /// Défaillance du collaborateur de persistance.
    #[error("Erreur de base de données: {0}")]
    Database(#[from] DbErr),

    /// Défaillance du dépôt de fichiers.
    #[error("Erreur de stockage de fichier: {0}")]
    Storage(String),
}

impl ServiceError {
    /// Erreur de validation portant sur un seul champ.
    pub fn champ(champ: &str, message: &str) -> Self {
        let mut erreurs = ErreursChamps::new();
        erreurs.insert(champ.to_string(), vec![message.to_string()]);
        Self::Validation(erreurs)
    }

    /// Convertit une erreur d'insertion/mise à jour en Conflict si la base a
    /// signalé une violation d'unicité, sinon la propage telle quelle.
    /// C'est la base qui tranche les courses entre écrivains concurrents.
    pub fn depuis_ecriture(err: DbErr, champ: &'static str, valeur: &str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Self::Conflict {
                champ,
                valeur: valeur.to_string(),
            },
            _ => Self::Database(err),
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(erreurs: validator::ValidationErrors) -> Self {
        let mut champs = ErreursChamps::new();
        for (champ, liste) in erreurs.field_errors() {
            let messages = liste
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            champs.insert(champ.to_string(), messages);
        }
        Self::Validation(champs)
    }
}

impl From<TransactionError<ServiceError>> for ServiceError {
    fn from(err: TransactionError<ServiceError>) -> Self {
        match err {
            TransactionError::Connection(e) => Self::Database(e),
            TransactionError::Transaction(e) => e,
        }
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Workflow(_) | Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Database(_) | Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            Self::Validation(erreurs) => {
                HttpResponse::build(self.status_code()).json(serde_json::json!({
                    "error": self.to_string(),
                    "erreurs": erreurs,
                }))
            }
            Self::Database(e) => {
                // Le détail reste dans les logs, pas dans la réponse
                tracing::error!(erreur = %e, "erreur de base de données");
                HttpResponse::build(self.status_code()).json(serde_json::json!({
                    "error": "Une erreur interne est survenue"
                }))
            }
            Self::Storage(e) => {
                tracing::error!(erreur = %e, "erreur de stockage");
                HttpResponse::build(self.status_code()).json(serde_json::json!({
                    "error": "Une erreur interne est survenue"
                }))
            }
            autre => HttpResponse::build(self.status_code()).json(serde_json::json!({
                "error": autre.to_string(),
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_erreur_champ_unique() {
        let err = ServiceError::champ("matricule", "Ce matricule est déjà utilisé");
        match err {
            ServiceError::Validation(champs) => {
                assert_eq!(champs.len(), 1);
                assert_eq!(
                    champs.get("matricule").unwrap(),
                    &vec!["Ce matricule est déjà utilisé".to_string()]
                );
            }
            autre => panic!("variante inattendue: {autre:?}"),
        }
    }

    #[test]
    fn test_statuts_http() {
        assert_eq!(
            ServiceError::champ("nom", "requis").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::NotFound("Citoyen").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::Workflow("mariage non approuvé".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::Conflict {
                champ: "matricule",
                valeur: "MAT-1".into()
            }
            .status_code(),
            StatusCode::CONFLICT
        );
    }
}
