use sea_orm::*;
use std::collections::HashMap;

use crate::errors::ServiceError;
use crate::models::document_mariage::{self, Entity as DocumentMariage};
use crate::models::dto::{
    DocumentMariageAffichage, DocumentMariageRequest, FiltresDocuments, Page, ReferenceAffichage,
};
use crate::models::fonctionnaire::{self, Entity as Fonctionnaire};
use crate::models::mariage::{self, Entity as Mariage};
use crate::services::audit::{CreationStamp, UpdateStamp};
use crate::services::mariage_service::ids_mariages_par_conjoint;
use crate::services::storage::{DepotFichiers, supprimer_sans_echec};
use crate::services::{PAR_PAGE, Principal, contient, decoder_fichier, noms_utilisateurs};
use validator::Validate;

pub struct DocumentService;

impl DocumentService {
    /// Crée un document de mariage. `numero_document` est unique au niveau
    /// du registre entier, pas seulement du dossier.
    pub async fn create(
        db: &DatabaseConnection,
        depot: &dyn DepotFichiers,
        principal: Principal,
        payload: DocumentMariageRequest,
    ) -> Result<document_mariage::Model, ServiceError> {
        payload.validate()?;
        Self::verifier_references(db, &payload).await?;
        Self::verifier_numero_unique(db, &payload.numero_document, None).await?;

        let fichier = match &payload.fichier {
            Some(upload) => {
                let contenu = decoder_fichier(upload)?;
                Some(
                    depot
                        .enregistrer("documents-mariage", &upload.nom, &contenu)
                        .await?,
                )
            }
            None => None,
        };

        let cachet = CreationStamp::generate(principal);
        let numero = payload.numero_document.clone();
        let nouveau = document_mariage::ActiveModel {
            r#ref: Set(cachet.reference),
            mariage_id: Set(payload.mariage_id),
            type_document: Set(payload.type_document),
            numero_document: Set(payload.numero_document),
            date_emission: Set(payload.date_emission),
            date_expiration: Set(payload.date_expiration),
            fichier: Set(fichier),
            livre: Set(payload.livre),
            date_livraison: Set(payload.date_livraison),
            livre_par: Set(payload.livre_par),
            created_by: Set(cachet.created_by),
            updated_by: Set(cachet.updated_by),
            created_at: Set(cachet.created_at),
            updated_at: Set(cachet.updated_at),
            ..Default::default()
        };
        nouveau
            .insert(db)
            .await
            .map_err(|e| ServiceError::depuis_ecriture(e, "numero_document", &numero))
    }

    pub async fn find_by_ref(
        db: &DatabaseConnection,
        reference: &str,
    ) -> Result<document_mariage::Model, ServiceError> {
        DocumentMariage::find()
            .filter(document_mariage::Column::Ref.eq(reference))
            .one(db)
            .await?
            .ok_or(ServiceError::NotFound("Document de mariage"))
    }

    pub async fn update(
        db: &DatabaseConnection,
        depot: &dyn DepotFichiers,
        principal: Principal,
        reference: &str,
        payload: DocumentMariageRequest,
    ) -> Result<document_mariage::Model, ServiceError> {
        payload.validate()?;
        let existant = Self::find_by_ref(db, reference).await?;
        Self::verifier_references(db, &payload).await?;
        Self::verifier_numero_unique(db, &payload.numero_document, Some(existant.id)).await?;

        let ancien_fichier = existant.fichier.clone();
        let nouveau_fichier = match &payload.fichier {
            Some(upload) => {
                let contenu = decoder_fichier(upload)?;
                Some(
                    depot
                        .enregistrer("documents-mariage", &upload.nom, &contenu)
                        .await?,
                )
            }
            None => None,
        };

        let cachet = UpdateStamp::generate(principal);
        let numero = payload.numero_document.clone();
        let mut actif: document_mariage::ActiveModel = existant.into();
        actif.mariage_id = Set(payload.mariage_id);
        actif.type_document = Set(payload.type_document);
        actif.numero_document = Set(payload.numero_document);
        actif.date_emission = Set(payload.date_emission);
        actif.date_expiration = Set(payload.date_expiration);
        actif.livre = Set(payload.livre);
        actif.date_livraison = Set(payload.date_livraison);
        actif.livre_par = Set(payload.livre_par);
        if let Some(fichier) = &nouveau_fichier {
            actif.fichier = Set(Some(fichier.clone()));
        }
        if let Some(p) = cachet.updated_by {
            actif.updated_by = Set(Some(p));
        }
        actif.updated_at = Set(cachet.updated_at);

        let modele = actif
            .update(db)
            .await
            .map_err(|e| ServiceError::depuis_ecriture(e, "numero_document", &numero))?;

        if nouveau_fichier.is_some() {
            if let Some(ancien) = ancien_fichier {
                supprimer_sans_echec(depot, &ancien).await;
            }
        }
        Ok(modele)
    }

    pub async fn delete(
        db: &DatabaseConnection,
        depot: &dyn DepotFichiers,
        reference: &str,
    ) -> Result<(), ServiceError> {
        let existant = Self::find_by_ref(db, reference).await?;
        let fichier = existant.fichier.clone();
        DocumentMariage::delete_by_id(existant.id).exec(db).await?;
        if let Some(fichier) = fichier {
            supprimer_sans_echec(depot, &fichier).await;
        }
        Ok(())
    }

    /// Liste paginée. Recherche sur le numéro du document ou les noms des
    /// conjoints du mariage; filtres exacts sur type_document et livre.
    pub async fn list(
        db: &DatabaseConnection,
        filtres: FiltresDocuments,
        page: u64,
    ) -> Result<Page<DocumentMariageAffichage, FiltresDocuments>, ServiceError> {
        let mut requete = DocumentMariage::find();
        if let Some(recherche) = filtres.search.as_deref().filter(|s| !s.is_empty()) {
            let mariages = ids_mariages_par_conjoint(db, recherche).await?;
            requete = requete.filter(
                Condition::any()
                    .add(contient(document_mariage::Column::NumeroDocument, recherche))
                    .add(document_mariage::Column::MariageId.is_in(mariages)),
            );
        }
        if let Some(type_document) = filtres.type_document.as_deref().filter(|s| !s.is_empty()) {
            requete = requete.filter(document_mariage::Column::TypeDocument.eq(type_document));
        }
        if let Some(livre) = filtres.livre {
            requete = requete.filter(document_mariage::Column::Livre.eq(livre));
        }

        let page = page.max(1);
        let paginateur = requete
            .order_by_desc(document_mariage::Column::CreatedAt)
            .paginate(db, PAR_PAGE);
        let compte = paginateur.num_items_and_pages().await?;
        let donnees = Self::afficher(db, paginateur.fetch_page(page - 1).await?).await?;

        Ok(Page {
            donnees,
            page,
            par_page: PAR_PAGE,
            total: compte.number_of_items,
            total_pages: compte.number_of_pages,
            filtres,
        })
    }

    pub async fn show(
        db: &DatabaseConnection,
        reference: &str,
    ) -> Result<DocumentMariageAffichage, ServiceError> {
        let modele = Self::find_by_ref(db, reference).await?;
        let mut affichages = Self::afficher(db, vec![modele]).await?;
        affichages
            .pop()
            .ok_or(ServiceError::NotFound("Document de mariage"))
    }

    async fn afficher(
        db: &DatabaseConnection,
        modeles: Vec<document_mariage::Model>,
    ) -> Result<Vec<DocumentMariageAffichage>, ServiceError> {
        let auteurs = noms_utilisateurs(
            db,
            modeles
                .iter()
                .flat_map(|m| [m.created_by, m.updated_by])
                .flatten(),
        )
        .await?;

        let ids_mariages: Vec<i32> = modeles.iter().map(|m| m.mariage_id).collect();
        let mariages: HashMap<i32, ReferenceAffichage> = Mariage::find()
            .filter(mariage::Column::Id.is_in(ids_mariages))
            .all(db)
            .await?
            .into_iter()
            .map(|m| {
                (
                    m.id,
                    ReferenceAffichage {
                        r#ref: m.r#ref.clone(),
                        libelle: format!("Mariage {}", m.r#ref),
                    },
                )
            })
            .collect();

        let ids_livreurs: Vec<i32> = modeles.iter().filter_map(|m| m.livre_par).collect();
        let livreurs: HashMap<i32, ReferenceAffichage> = Fonctionnaire::find()
            .filter(fonctionnaire::Column::Id.is_in(ids_livreurs))
            .all(db)
            .await?
            .into_iter()
            .map(|f| {
                (
                    f.id,
                    ReferenceAffichage {
                        r#ref: f.r#ref.clone(),
                        libelle: f.nom_complet(),
                    },
                )
            })
            .collect();

        Ok(modeles
            .into_iter()
            .map(|m| DocumentMariageAffichage {
                r#ref: m.r#ref,
                mariage: mariages.get(&m.mariage_id).cloned(),
                type_document: m.type_document,
                numero_document: m.numero_document,
                date_emission: m.date_emission,
                date_expiration: m.date_expiration,
                fichier: m.fichier,
                livre: m.livre,
                date_livraison: m.date_livraison,
                livre_par: m.livre_par.and_then(|id| livreurs.get(&id).cloned()),
                cree_par: m.created_by.and_then(|id| auteurs.get(&id).cloned()),
                modifie_par: m.updated_by.and_then(|id| auteurs.get(&id).cloned()),
                created_at: m.created_at,
            })
            .collect())
    }

    async fn verifier_references(
        db: &DatabaseConnection,
        payload: &DocumentMariageRequest,
    ) -> Result<(), ServiceError> {
        if Mariage::find_by_id(payload.mariage_id).one(db).await?.is_none() {
            return Err(ServiceError::champ("mariage_id", "Mariage inexistant"));
        }
        if let Some(livre_par) = payload.livre_par {
            if Fonctionnaire::find_by_id(livre_par).one(db).await?.is_none() {
                return Err(ServiceError::champ("livre_par", "Fonctionnaire inexistant"));
            }
        }
        Ok(())
    }

    async fn verifier_numero_unique(
        db: &DatabaseConnection,
        numero: &str,
        ignorer_id: Option<i32>,
    ) -> Result<(), ServiceError> {
        let mut requete =
            DocumentMariage::find().filter(document_mariage::Column::NumeroDocument.eq(numero));
        if let Some(id) = ignorer_id {
            requete = requete.filter(document_mariage::Column::Id.ne(id));
        }
        if requete.one(db).await?.is_some() {
            return Err(ServiceError::champ(
                "numero_document",
                "Ce numéro de document est déjà utilisé",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::storage::DepotLocal;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn mariage_fixture(id: i32) -> mariage::Model {
        mariage::Model {
            id,
            r#ref: format!("m-{id}"),
            homme_id: 1,
            femme_id: 2,
            date_mariage: NaiveDate::from_ymd_opt(2026, 9, 12).unwrap(),
            heure_mariage: chrono::NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            officier_id: 7,
            lieu_mariage: "Hôtel de ville".into(),
            regime_matrimonial: "séparation_de_biens".into(),
            temoins_homme: None,
            temoins_femme: None,
            statut: "en_attente".into(),
            notes: None,
            created_by: None,
            updated_by: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap(),
        }
    }

    fn document_fixture() -> document_mariage::Model {
        document_mariage::Model {
            id: 5,
            r#ref: "d-ref".into(),
            mariage_id: 3,
            type_document: "certificat_celibat".into(),
            numero_document: "DOC-1".into(),
            date_emission: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            date_expiration: None,
            fichier: None,
            livre: false,
            date_livraison: None,
            livre_par: None,
            created_by: None,
            updated_by: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap(),
        }
    }

    fn payload_fixture() -> DocumentMariageRequest {
        DocumentMariageRequest {
            mariage_id: 9,
            type_document: "certificat_celibat".into(),
            numero_document: "DOC-1".into(),
            date_emission: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
            date_expiration: None,
            fichier: None,
            livre: false,
            date_livraison: None,
            livre_par: None,
        }
    }

    #[tokio::test]
    async fn test_numero_document_deja_utilise() {
        // Le même numero_document est refusé même sur un autre mariage
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![mariage_fixture(9)]]) // le mariage existe
            .append_query_results([vec![document_fixture()]]) // numéro déjà pris
            .into_connection();

        let depot = DepotLocal::new(std::env::temp_dir().join("depot-tests-documents"));
        let resultat = DocumentService::create(&db, &depot, Some(1), payload_fixture()).await;
        match resultat {
            Err(ServiceError::Validation(champs)) => {
                assert!(champs.contains_key("numero_document"));
            }
            autre => panic!("attendu Validation, obtenu {autre:?}"),
        }
    }
}
