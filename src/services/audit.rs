// ============================================================================
// AUDIT - RÉFÉRENCES OPAQUES ET CACHETS CRÉATEUR/MODIFICATEUR
// ============================================================================
//
// Description:
//   Attribution explicite de l'identifiant externe `ref` et des colonnes
//   d'audit created_by/updated_by + created_at/updated_at. Chaque service
//   appelle ces helpers sur ses chemins de création/mise à jour: pas de hook
//   implicite, le contrat d'audit reste visible et testable.
//
//   Le principal est optionnel: une création hors contexte authentifié
//   (seed, CLI) laisse created_by/updated_by à NULL.
//
// ============================================================================

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Cachet appliqué à la création d'un enregistrement.
#[derive(Debug, Clone)]
pub struct CreationStamp {
    /// Identifiant opaque externe (UUID v4), immuable après création.
    pub reference: String,
    pub created_by: Option<i32>,
    pub updated_by: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CreationStamp {
    pub fn generate(principal: Option<i32>) -> Self {
        let maintenant = Utc::now();
        Self {
            reference: Uuid::new_v4().to_string(),
            created_by: principal,
            updated_by: principal,
            created_at: maintenant,
            updated_at: maintenant,
        }
    }
}

/// Cachet appliqué à la mise à jour: ne touche ni `ref` ni created_by/at.
#[derive(Debug, Clone)]
pub struct UpdateStamp {
    pub updated_by: Option<i32>,
    pub updated_at: DateTime<Utc>,
}

impl UpdateStamp {
    pub fn generate(principal: Option<i32>) -> Self {
        Self {
            updated_by: principal,
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_references_uniques() {
        // Sur N créations, toutes les refs sont distinctes deux à deux
        let refs: HashSet<String> = (0..1000)
            .map(|_| CreationStamp::generate(None).reference)
            .collect();
        assert_eq!(refs.len(), 1000);
    }

    #[test]
    fn test_creation_authentifiee() {
        // Créer en tant que principal p donne created_by = updated_by = p
        let cachet = CreationStamp::generate(Some(42));
        assert_eq!(cachet.created_by, Some(42));
        assert_eq!(cachet.updated_by, Some(42));
        assert_eq!(cachet.created_at, cachet.updated_at);
    }

    #[test]
    fn test_creation_non_authentifiee() {
        let cachet = CreationStamp::generate(None);
        assert_eq!(cachet.created_by, None);
        assert_eq!(cachet.updated_by, None);
        assert!(Uuid::parse_str(&cachet.reference).is_ok());
    }

    #[test]
    fn test_mise_a_jour_ne_porte_pas_created_by() {
        // Le cachet de mise à jour n'a aucun moyen de toucher ref/created_by:
        // il ne transporte que updated_by/updated_at
        let cachet = UpdateStamp::generate(Some(7));
        assert_eq!(cachet.updated_by, Some(7));
    }
}
