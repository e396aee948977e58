use sea_orm::*;

use crate::errors::ServiceError;
use crate::models::citoyen::{self, Entity as Citoyen};
use crate::models::dto::{CitoyenRequest, FicheDetail, FiltresCitoyens, Page};
use crate::models::mariage::{self, Entity as Mariage};
use crate::models::piece_jointe::{self, Entity as PieceJointe};
use crate::services::audit::{CreationStamp, UpdateStamp};
use crate::services::piece_jointe_service::Attachable;
use crate::services::storage::{DepotFichiers, supprimer_sans_echec};
use crate::services::{PAR_PAGE, Principal, contient, decoder_fichier, noms_utilisateurs};
use validator::Validate;

pub struct CitoyenService;

impl CitoyenService {
    /// Crée un citoyen: validation, unicité du numéro d'identification
    /// national, stockage éventuel de la photo, cachet d'audit, insertion.
    pub async fn create(
        db: &DatabaseConnection,
        depot: &dyn DepotFichiers,
        principal: Principal,
        payload: CitoyenRequest,
    ) -> Result<citoyen::Model, ServiceError> {
        payload.validate()?;
        Self::verifier_nin_unique(db, payload.numero_identification_national.as_deref(), None)
            .await?;

        let photo = match &payload.photo {
            Some(fichier) => {
                let contenu = decoder_fichier(fichier)?;
                Some(
                    depot
                        .enregistrer("citoyens/photos", &fichier.nom, &contenu)
                        .await?,
                )
            }
            None => None,
        };

        let cachet = CreationStamp::generate(principal);
        let nin = payload.numero_identification_national.clone();
        let nouveau = citoyen::ActiveModel {
            r#ref: Set(cachet.reference),
            nom: Set(payload.nom),
            postnom: Set(payload.postnom),
            prenom: Set(payload.prenom),
            sexe: Set(payload.sexe),
            date_naissance: Set(payload.date_naissance),
            lieu_naissance: Set(payload.lieu_naissance),
            etat_civil: Set(payload.etat_civil),
            profession: Set(payload.profession),
            adresse: Set(payload.adresse),
            nom_pere: Set(payload.nom_pere),
            nom_mere: Set(payload.nom_mere),
            numero_identification_national: Set(nin.clone()),
            photo: Set(photo),
            created_by: Set(cachet.created_by),
            updated_by: Set(cachet.updated_by),
            created_at: Set(cachet.created_at),
            updated_at: Set(cachet.updated_at),
            ..Default::default()
        };

        // L'index unique de la base reste l'arbitre en cas de course
        nouveau.insert(db).await.map_err(|e| {
            ServiceError::depuis_ecriture(
                e,
                "numero_identification_national",
                nin.as_deref().unwrap_or_default(),
            )
        })
    }

    pub async fn find_by_ref(
        db: &DatabaseConnection,
        reference: &str,
    ) -> Result<citoyen::Model, ServiceError> {
        Citoyen::find()
            .filter(citoyen::Column::Ref.eq(reference))
            .one(db)
            .await?
            .ok_or(ServiceError::NotFound("Citoyen"))
    }

    /// Fiche détaillée: le citoyen plus les noms des comptes créateur et
    /// dernier modificateur.
    pub async fn show(
        db: &DatabaseConnection,
        reference: &str,
    ) -> Result<FicheDetail<citoyen::Model>, ServiceError> {
        let modele = Self::find_by_ref(db, reference).await?;
        let auteurs =
            noms_utilisateurs(db, [modele.created_by, modele.updated_by].into_iter().flatten())
                .await?;
        Ok(FicheDetail {
            cree_par: modele.created_by.and_then(|id| auteurs.get(&id).cloned()),
            modifie_par: modele.updated_by.and_then(|id| auteurs.get(&id).cloned()),
            fiche: modele,
        })
    }

    /// Met à jour un citoyen. `ref` n'est jamais réassigné. Si une nouvelle
    /// photo est fournie: stocker la nouvelle → persister → supprimer
    /// l'ancienne (échec de suppression journalisé, non propagé).
    pub async fn update(
        db: &DatabaseConnection,
        depot: &dyn DepotFichiers,
        principal: Principal,
        reference: &str,
        payload: CitoyenRequest,
    ) -> Result<citoyen::Model, ServiceError> {
        payload.validate()?;
        let existant = Self::find_by_ref(db, reference).await?;
        Self::verifier_nin_unique(
            db,
            payload.numero_identification_national.as_deref(),
            Some(existant.id),
        )
        .await?;

        let ancienne_photo = existant.photo.clone();
        let nouvelle_photo = match &payload.photo {
            Some(fichier) => {
                let contenu = decoder_fichier(fichier)?;
                Some(
                    depot
                        .enregistrer("citoyens/photos", &fichier.nom, &contenu)
                        .await?,
                )
            }
            None => None,
        };

        let cachet = UpdateStamp::generate(principal);
        let nin = payload.numero_identification_national.clone();
        let mut actif: citoyen::ActiveModel = existant.into();
        actif.nom = Set(payload.nom);
        actif.postnom = Set(payload.postnom);
        actif.prenom = Set(payload.prenom);
        actif.sexe = Set(payload.sexe);
        actif.date_naissance = Set(payload.date_naissance);
        actif.lieu_naissance = Set(payload.lieu_naissance);
        actif.etat_civil = Set(payload.etat_civil);
        actif.profession = Set(payload.profession);
        actif.adresse = Set(payload.adresse);
        actif.nom_pere = Set(payload.nom_pere);
        actif.nom_mere = Set(payload.nom_mere);
        actif.numero_identification_national = Set(nin.clone());
        if let Some(photo) = &nouvelle_photo {
            actif.photo = Set(Some(photo.clone()));
        }
        if let Some(p) = cachet.updated_by {
            actif.updated_by = Set(Some(p));
        }
        actif.updated_at = Set(cachet.updated_at);

        let modele = actif.update(db).await.map_err(|e| {
            ServiceError::depuis_ecriture(
                e,
                "numero_identification_national",
                nin.as_deref().unwrap_or_default(),
            )
        })?;

        if nouvelle_photo.is_some() {
            if let Some(ancienne) = ancienne_photo {
                supprimer_sans_echec(depot, &ancienne).await;
            }
        }
        Ok(modele)
    }

    /// Supprime un citoyen. Interdit s'il est partie à un mariage ou s'il
    /// possède encore des pièces jointes.
    pub async fn delete(
        db: &DatabaseConnection,
        depot: &dyn DepotFichiers,
        reference: &str,
    ) -> Result<(), ServiceError> {
        let existant = Self::find_by_ref(db, reference).await?;

        let mariages = Mariage::find()
            .filter(
                Condition::any()
                    .add(mariage::Column::HommeId.eq(existant.id))
                    .add(mariage::Column::FemmeId.eq(existant.id)),
            )
            .count(db)
            .await?;
        if mariages > 0 {
            return Err(ServiceError::champ(
                "citoyen",
                "Impossible de supprimer: ce citoyen est partie à un mariage",
            ));
        }

        let pieces = PieceJointe::find()
            .filter(piece_jointe::Column::AttachableType.eq(Attachable::Citoyen.tag()))
            .filter(piece_jointe::Column::AttachableId.eq(existant.id))
            .count(db)
            .await?;
        if pieces > 0 {
            return Err(ServiceError::champ(
                "citoyen",
                "Impossible de supprimer: ce citoyen possède des pièces jointes",
            ));
        }

        let photo = existant.photo.clone();
        Citoyen::delete_by_id(existant.id).exec(db).await?;
        if let Some(photo) = photo {
            supprimer_sans_echec(depot, &photo).await;
        }
        Ok(())
    }

    /// Liste paginée, du plus récent au plus ancien. La recherche couvre
    /// nom, postnom, prénom et numéro d'identification national.
    pub async fn list(
        db: &DatabaseConnection,
        filtres: FiltresCitoyens,
        page: u64,
    ) -> Result<Page<citoyen::Model, FiltresCitoyens>, ServiceError> {
        let mut requete = Citoyen::find();
        if let Some(recherche) = filtres.search.as_deref().filter(|s| !s.is_empty()) {
            requete = requete.filter(
                Condition::any()
                    .add(contient(citoyen::Column::Nom, recherche))
                    .add(contient(citoyen::Column::Postnom, recherche))
                    .add(contient(citoyen::Column::Prenom, recherche))
                    .add(contient(
                        citoyen::Column::NumeroIdentificationNational,
                        recherche,
                    )),
            );
        }

        let page = page.max(1);
        let paginateur = requete
            .order_by_desc(citoyen::Column::CreatedAt)
            .paginate(db, PAR_PAGE);
        let compte = paginateur.num_items_and_pages().await?;
        let donnees = paginateur.fetch_page(page - 1).await?;

        Ok(Page {
            donnees,
            page,
            par_page: PAR_PAGE,
            total: compte.number_of_items,
            total_pages: compte.number_of_pages,
            filtres,
        })
    }

    async fn verifier_nin_unique(
        db: &DatabaseConnection,
        nin: Option<&str>,
        ignorer_id: Option<i32>,
    ) -> Result<(), ServiceError> {
        let Some(nin) = nin else { return Ok(()) };
        let mut requete = Citoyen::find()
            .filter(citoyen::Column::NumeroIdentificationNational.eq(nin));
        if let Some(id) = ignorer_id {
            requete = requete.filter(citoyen::Column::Id.ne(id));
        }
        if requete.one(db).await?.is_some() {
            return Err(ServiceError::champ(
                "numero_identification_national",
                "Ce numéro d'identification national est déjà utilisé",
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

    fn citoyen_fixture() -> citoyen::Model {
        citoyen::Model {
            id: 1,
            r#ref: "c-ref".into(),
            nom: "Mbala".into(),
            postnom: "Kalala".into(),
            prenom: "Jean".into(),
            sexe: "M".into(),
            date_naissance: NaiveDate::from_ymd_opt(1990, 5, 20).unwrap(),
            lieu_naissance: "Kinshasa".into(),
            etat_civil: "Célibataire".into(),
            profession: "Enseignant".into(),
            adresse: "12 avenue de la Paix".into(),
            nom_pere: "Mbala Joseph".into(),
            nom_mere: "Ngalula Marie".into(),
            numero_identification_national: Some("NIN-001".into()),
            photo: None,
            created_by: None,
            updated_by: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap(),
        }
    }

    fn payload_fixture() -> CitoyenRequest {
        CitoyenRequest {
            nom: "Tshala".into(),
            postnom: "Mwamba".into(),
            prenom: "Alice".into(),
            sexe: "F".into(),
            date_naissance: NaiveDate::from_ymd_opt(1993, 2, 14).unwrap(),
            lieu_naissance: "Lubumbashi".into(),
            etat_civil: "Célibataire".into(),
            profession: "Infirmière".into(),
            adresse: "5 avenue Lumumba".into(),
            nom_pere: "Tshala Albert".into(),
            nom_mere: "Mujinga Rose".into(),
            numero_identification_national: Some("NIN-001".into()),
            photo: None,
        }
    }

    fn depot_inutilise() -> DepotLocal {
        DepotLocal::new(std::env::temp_dir().join("depot-tests-citoyens"))
    }

    #[tokio::test]
    async fn test_nin_deja_utilise() {
        // Deux citoyens ne peuvent pas partager le même numéro d'identification
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![citoyen_fixture()]])
            .into_connection();

        let resultat =
            CitoyenService::create(&db, &depot_inutilise(), Some(1), payload_fixture()).await;
        match resultat {
            Err(ServiceError::Validation(champs)) => {
                assert!(champs.contains_key("numero_identification_national"));
            }
            autre => panic!("attendu Validation, obtenu {autre:?}"),
        }
    }

    #[tokio::test]
    async fn test_sexe_invalide_refuse_sans_requete() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let mut payload = payload_fixture();
        payload.sexe = "X".into();

        let resultat =
            CitoyenService::create(&db, &depot_inutilise(), Some(1), payload).await;
        assert!(matches!(resultat, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_citoyen_introuvable() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<citoyen::Model>::new()])
            .into_connection();

        let resultat = CitoyenService::find_by_ref(&db, "inconnu").await;
        assert!(matches!(resultat, Err(ServiceError::NotFound("Citoyen"))));
    }
}
