use sea_orm::*;
use std::collections::HashMap;

use crate::errors::ServiceError;
use crate::models::dto::{
    EtapeMariageAffichage, EtapeMariageRequest, FiltresEtapes, Page, ReferenceAffichage,
};
use crate::models::etape_mariage::{self, Entity as EtapeMariage};
use crate::models::fonctionnaire::{self, Entity as Fonctionnaire};
use crate::models::mariage::{self, Entity as Mariage};
use crate::services::audit::{CreationStamp, UpdateStamp};
use crate::services::mariage_service::ids_mariages_par_conjoint;
use crate::services::{PAR_PAGE, Principal, noms_utilisateurs};
use validator::Validate;

pub struct EtapeService;

impl EtapeService {
    pub async fn create(
        db: &DatabaseConnection,
        principal: Principal,
        payload: EtapeMariageRequest,
    ) -> Result<etape_mariage::Model, ServiceError> {
        payload.validate()?;
        Self::verifier_references(db, &payload).await?;

        let cachet = CreationStamp::generate(principal);
        let nouveau = etape_mariage::ActiveModel {
            r#ref: Set(cachet.reference),
            mariage_id: Set(payload.mariage_id),
            etape: Set(payload.etape),
            statut: Set(payload.statut),
            date_debut: Set(payload.date_debut),
            date_fin: Set(payload.date_fin),
            responsable_id: Set(payload.responsable_id),
            commentaires: Set(payload.commentaires),
            created_by: Set(cachet.created_by),
            updated_by: Set(cachet.updated_by),
            created_at: Set(cachet.created_at),
            updated_at: Set(cachet.updated_at),
            ..Default::default()
        };
        Ok(nouveau.insert(db).await?)
    }

    pub async fn find_by_ref(
        db: &DatabaseConnection,
        reference: &str,
    ) -> Result<etape_mariage::Model, ServiceError> {
        EtapeMariage::find()
            .filter(etape_mariage::Column::Ref.eq(reference))
            .one(db)
            .await?
            .ok_or(ServiceError::NotFound("Étape de mariage"))
    }

    pub async fn update(
        db: &DatabaseConnection,
        principal: Principal,
        reference: &str,
        payload: EtapeMariageRequest,
    ) -> Result<etape_mariage::Model, ServiceError> {
        payload.validate()?;
        let existant = Self::find_by_ref(db, reference).await?;
        Self::verifier_references(db, &payload).await?;

        let cachet = UpdateStamp::generate(principal);
        let mut actif: etape_mariage::ActiveModel = existant.into();
        actif.mariage_id = Set(payload.mariage_id);
        actif.etape = Set(payload.etape);
        actif.statut = Set(payload.statut);
        actif.date_debut = Set(payload.date_debut);
        actif.date_fin = Set(payload.date_fin);
        actif.responsable_id = Set(payload.responsable_id);
        actif.commentaires = Set(payload.commentaires);
        if let Some(p) = cachet.updated_by {
            actif.updated_by = Set(Some(p));
        }
        actif.updated_at = Set(cachet.updated_at);
        Ok(actif.update(db).await?)
    }

    pub async fn delete(db: &DatabaseConnection, reference: &str) -> Result<(), ServiceError> {
        let existant = Self::find_by_ref(db, reference).await?;
        EtapeMariage::delete_by_id(existant.id).exec(db).await?;
        Ok(())
    }

    /// Liste paginée. Recherche sur les noms des conjoints du mariage;
    /// filtres exacts sur `etape` et `statut`, combinés en ET.
    pub async fn list(
        db: &DatabaseConnection,
        filtres: FiltresEtapes,
        page: u64,
    ) -> Result<Page<EtapeMariageAffichage, FiltresEtapes>, ServiceError> {
        let mut requete = EtapeMariage::find();
        if let Some(recherche) = filtres.search.as_deref().filter(|s| !s.is_empty()) {
            let mariages = ids_mariages_par_conjoint(db, recherche).await?;
            requete = requete.filter(etape_mariage::Column::MariageId.is_in(mariages));
        }
        if let Some(etape) = filtres.etape.as_deref().filter(|s| !s.is_empty()) {
            requete = requete.filter(etape_mariage::Column::Etape.eq(etape));
        }
        if let Some(statut) = filtres.statut.as_deref().filter(|s| !s.is_empty()) {
            requete = requete.filter(etape_mariage::Column::Statut.eq(statut));
        }

        let page = page.max(1);
        let paginateur = requete
            .order_by_desc(etape_mariage::Column::CreatedAt)
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
    ) -> Result<EtapeMariageAffichage, ServiceError> {
        let modele = Self::find_by_ref(db, reference).await?;
        let mut affichages = Self::afficher(db, vec![modele]).await?;
        affichages
            .pop()
            .ok_or(ServiceError::NotFound("Étape de mariage"))
    }

    async fn afficher(
        db: &DatabaseConnection,
        modeles: Vec<etape_mariage::Model>,
    ) -> Result<Vec<EtapeMariageAffichage>, ServiceError> {
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

        let ids_responsables: Vec<i32> = modeles.iter().filter_map(|m| m.responsable_id).collect();
        let responsables: HashMap<i32, ReferenceAffichage> = Fonctionnaire::find()
            .filter(fonctionnaire::Column::Id.is_in(ids_responsables))
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
            .map(|m| EtapeMariageAffichage {
                r#ref: m.r#ref,
                mariage: mariages.get(&m.mariage_id).cloned(),
                etape: m.etape,
                statut: m.statut,
                date_debut: m.date_debut,
                date_fin: m.date_fin,
                responsable: m.responsable_id.and_then(|id| responsables.get(&id).cloned()),
                commentaires: m.commentaires,
                cree_par: m.created_by.and_then(|id| auteurs.get(&id).cloned()),
                modifie_par: m.updated_by.and_then(|id| auteurs.get(&id).cloned()),
                created_at: m.created_at,
            })
            .collect())
    }

    async fn verifier_references(
        db: &DatabaseConnection,
        payload: &EtapeMariageRequest,
    ) -> Result<(), ServiceError> {
        if Mariage::find_by_id(payload.mariage_id).one(db).await?.is_none() {
            return Err(ServiceError::champ("mariage_id", "Mariage inexistant"));
        }
        if let Some(responsable_id) = payload.responsable_id {
            if Fonctionnaire::find_by_id(responsable_id)
                .one(db)
                .await?
                .is_none()
            {
                return Err(ServiceError::champ(
                    "responsable_id",
                    "Fonctionnaire inexistant",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn payload_fixture() -> EtapeMariageRequest {
        EtapeMariageRequest {
            mariage_id: 4,
            etape: "publication_bans".into(),
            statut: "en_cours".into(),
            date_debut: Some(NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()),
            date_fin: None,
            responsable_id: None,
            commentaires: None,
        }
    }

    #[tokio::test]
    async fn test_etape_mariage_inexistant_refuse() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<mariage::Model>::new()])
            .into_connection();

        let resultat = EtapeService::create(&db, Some(1), payload_fixture()).await;
        match resultat {
            Err(ServiceError::Validation(champs)) => {
                assert!(champs.contains_key("mariage_id"));
            }
            autre => panic!("attendu Validation, obtenu {autre:?}"),
        }
    }

    #[tokio::test]
    async fn test_etape_inconnue_refusee_sans_requete() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let mut payload = payload_fixture();
        payload.etape = "fiancailles".into();

        let resultat = EtapeService::create(&db, Some(1), payload).await;
        assert!(matches!(resultat, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_etape_introuvable() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<etape_mariage::Model>::new()])
            .into_connection();

        let resultat = EtapeService::find_by_ref(&db, "inconnu").await;
        assert!(matches!(
            resultat,
            Err(ServiceError::NotFound("Étape de mariage"))
        ));
    }
}
