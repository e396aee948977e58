// ============================================================================
// STORAGE - DÉPÔT DE FICHIERS (COLLABORATEUR BLOB)
// ============================================================================
//
// Description:
//   Contrat du dépôt de fichiers: store(octets) -> référence opaque,
//   delete(référence). La référence est une chaîne sûre à persister dans le
//   champ fichier/photo d'un enregistrement.
//
//   Implémentation locale sur disque: un sous-dossier par catégorie
//   (citoyens/photos, documents-mariage, pieces-jointes), nom de fichier UUID
//   + extension d'origine.
//
// ============================================================================

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::errors::ServiceError;

#[async_trait]
pub trait DepotFichiers: Send + Sync {
    /// Enregistre un blob et renvoie sa référence opaque.
    async fn enregistrer(
        &self,
        categorie: &str,
        nom_origine: &str,
        contenu: &[u8],
    ) -> Result<String, ServiceError>;

    /// Supprime un blob par référence. L'absence du blob n'est pas une erreur.
    async fn supprimer(&self, reference: &str) -> Result<(), ServiceError>;
}

/// Dépôt local sur disque, sous `racine` (variable STORAGE_DIR).
pub struct DepotLocal {
    racine: PathBuf,
}

impl DepotLocal {
    pub fn new(racine: impl Into<PathBuf>) -> Self {
        Self {
            racine: racine.into(),
        }
    }

    fn chemin(&self, reference: &str) -> PathBuf {
        self.racine.join(reference)
    }
}

#[async_trait]
impl DepotFichiers for DepotLocal {
    async fn enregistrer(
        &self,
        categorie: &str,
        nom_origine: &str,
        contenu: &[u8],
    ) -> Result<String, ServiceError> {
        let extension = Path::new(nom_origine)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default();
        let reference = format!("{categorie}/{}{extension}", Uuid::new_v4());

        let chemin = self.chemin(&reference);
        if let Some(parent) = chemin.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ServiceError::Storage(e.to_string()))?;
        }
        tokio::fs::write(&chemin, contenu)
            .await
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        tracing::debug!(reference, octets = contenu.len(), "fichier enregistré");
        Ok(reference)
    }

    async fn supprimer(&self, reference: &str) -> Result<(), ServiceError> {
        match tokio::fs::remove_file(self.chemin(reference)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ServiceError::Storage(e.to_string())),
        }
    }
}

/// Supprime un ancien blob après remplacement ou suppression de
/// l'enregistrement. Un échec est journalisé mais jamais propagé: le
/// nettoyage des blobs n'est pas transactionnel.
pub async fn supprimer_sans_echec(depot: &dyn DepotFichiers, reference: &str) {
    if let Err(e) = depot.supprimer(reference).await {
        tracing::warn!(reference, erreur = %e, "échec de suppression d'un fichier, ignoré");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_enregistrer_puis_supprimer() {
        let dossier = std::env::temp_dir().join(format!("depot-test-{}", Uuid::new_v4()));
        let depot = DepotLocal::new(&dossier);

        let reference = depot
            .enregistrer("pieces-jointes", "cni.png", b"contenu")
            .await
            .unwrap();
        assert!(reference.starts_with("pieces-jointes/"));
        assert!(reference.ends_with(".png"));
        assert!(dossier.join(&reference).exists());

        depot.supprimer(&reference).await.unwrap();
        assert!(!dossier.join(&reference).exists());

        // Supprimer un blob absent n'est pas une erreur
        depot.supprimer(&reference).await.unwrap();

        let _ = std::fs::remove_dir_all(&dossier);
    }
}
