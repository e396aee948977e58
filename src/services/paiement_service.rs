use rust_decimal::Decimal;
use sea_orm::*;
use std::collections::HashMap;

use crate::errors::ServiceError;
use crate::models::dto::{
    CreatePaiementRequest, FiltresPaiements, Page, PaiementAffichage, ReferenceAffichage,
    UpdatePaiementRequest,
};
use crate::models::fonctionnaire::{self, Entity as Fonctionnaire};
use crate::models::mariage::{self, Entity as Mariage};
use crate::models::paiement::{self, Entity as Paiement};
use crate::services::audit::{CreationStamp, UpdateStamp};
use crate::services::{PAR_PAGE, Principal, contient, noms_utilisateurs};
use validator::Validate;

/// Message de la porte de workflow, identique à la pré-vérification et à la
/// re-vérification transactionnelle.
const MARIAGE_NON_APPROUVE: &str =
    "Le mariage doit être approuvé avant d'enregistrer un paiement";

pub struct PaiementService;

impl PaiementService {
    /// Enregistre un paiement pour un mariage approuvé.
    ///
    /// Défense en profondeur: une pré-vérification rapide donne un message
    /// clair sans ouvrir de transaction, puis la règle est re-vérifiée sous
    /// verrou de ligne (SELECT ... FOR UPDATE) dans la transaction qui
    /// insère le paiement. Un rejet concurrent du mariage ne peut donc pas
    /// s'intercaler entre la lecture du statut et l'insertion.
    pub async fn create(
        db: &DatabaseConnection,
        principal: Principal,
        payload: CreatePaiementRequest,
    ) -> Result<paiement::Model, ServiceError> {
        payload.validate()?;
        let montant = Decimal::from_f64_retain(payload.montant)
            .ok_or_else(|| ServiceError::champ("montant", "Montant invalide"))?;

        if Fonctionnaire::find_by_id(payload.encaisser_par)
            .one(db)
            .await?
            .is_none()
        {
            return Err(ServiceError::champ(
                "encaisser_par",
                "Fonctionnaire inexistant",
            ));
        }

        // Pré-vérification rapide
        let mariage = Mariage::find_by_id(payload.mariage_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::champ("mariage_id", "Mariage inexistant"))?;
        if mariage.statut != mariage::STATUT_APPROUVE {
            return Err(ServiceError::Workflow(MARIAGE_NON_APPROUVE.to_string()));
        }

        let cachet = CreationStamp::generate(principal);
        db.transaction::<_, paiement::Model, ServiceError>(move |txn| {
            Box::pin(async move {
                // Re-vérification faisant autorité, sous verrou de ligne
                let mariage = Mariage::find_by_id(payload.mariage_id)
                    .lock_exclusive()
                    .one(txn)
                    .await?
                    .ok_or_else(|| ServiceError::champ("mariage_id", "Mariage inexistant"))?;
                if mariage.statut != mariage::STATUT_APPROUVE {
                    return Err(ServiceError::Workflow(MARIAGE_NON_APPROUVE.to_string()));
                }

                if Paiement::find()
                    .filter(paiement::Column::ReferencePaiement.eq(&payload.reference_paiement))
                    .one(txn)
                    .await?
                    .is_some()
                {
                    return Err(ServiceError::champ(
                        "reference_paiement",
                        "Cette référence de paiement est déjà utilisée",
                    ));
                }

                let nouveau = paiement::ActiveModel {
                    r#ref: Set(cachet.reference),
                    mariage_id: Set(payload.mariage_id),
                    montant: Set(montant),
                    mode_paiement: Set(payload.mode_paiement),
                    reference_paiement: Set(payload.reference_paiement.clone()),
                    date_paiement: Set(payload.date_paiement),
                    statut: Set(payload.statut),
                    encaisser_par: Set(payload.encaisser_par),
                    notes: Set(payload.notes),
                    created_by: Set(cachet.created_by),
                    updated_by: Set(cachet.updated_by),
                    created_at: Set(cachet.created_at),
                    updated_at: Set(cachet.updated_at),
                    ..Default::default()
                };
                nouveau.insert(txn).await.map_err(|e| {
                    ServiceError::depuis_ecriture(
                        e,
                        "reference_paiement",
                        &payload.reference_paiement,
                    )
                })
            })
        })
        .await
        .map_err(ServiceError::from)
    }

    pub async fn find_by_ref(
        db: &DatabaseConnection,
        reference: &str,
    ) -> Result<paiement::Model, ServiceError> {
        Paiement::find()
            .filter(paiement::Column::Ref.eq(reference))
            .one(db)
            .await?
            .ok_or(ServiceError::NotFound("Paiement"))
    }

    /// Met à jour un paiement. Le rattachement au mariage ne change pas.
    pub async fn update(
        db: &DatabaseConnection,
        principal: Principal,
        reference: &str,
        payload: UpdatePaiementRequest,
    ) -> Result<paiement::Model, ServiceError> {
        payload.validate()?;
        let existant = Self::find_by_ref(db, reference).await?;
        let montant = Decimal::from_f64_retain(payload.montant)
            .ok_or_else(|| ServiceError::champ("montant", "Montant invalide"))?;

        if Fonctionnaire::find_by_id(payload.encaisser_par)
            .one(db)
            .await?
            .is_none()
        {
            return Err(ServiceError::champ(
                "encaisser_par",
                "Fonctionnaire inexistant",
            ));
        }
        if Paiement::find()
            .filter(paiement::Column::ReferencePaiement.eq(&payload.reference_paiement))
            .filter(paiement::Column::Id.ne(existant.id))
            .one(db)
            .await?
            .is_some()
        {
            return Err(ServiceError::champ(
                "reference_paiement",
                "Cette référence de paiement est déjà utilisée",
            ));
        }

        let cachet = UpdateStamp::generate(principal);
        let reference_paiement = payload.reference_paiement.clone();
        let mut actif: paiement::ActiveModel = existant.into();
        actif.montant = Set(montant);
        actif.mode_paiement = Set(payload.mode_paiement);
        actif.reference_paiement = Set(payload.reference_paiement);
        actif.date_paiement = Set(payload.date_paiement);
        actif.statut = Set(payload.statut);
        actif.encaisser_par = Set(payload.encaisser_par);
        actif.notes = Set(payload.notes);
        if let Some(p) = cachet.updated_by {
            actif.updated_by = Set(Some(p));
        }
        actif.updated_at = Set(cachet.updated_at);

        actif
            .update(db)
            .await
            .map_err(|e| ServiceError::depuis_ecriture(e, "reference_paiement", &reference_paiement))
    }

    pub async fn delete(db: &DatabaseConnection, reference: &str) -> Result<(), ServiceError> {
        let existant = Self::find_by_ref(db, reference).await?;
        Paiement::delete_by_id(existant.id).exec(db).await?;
        Ok(())
    }

    /// Liste paginée. La recherche couvre la référence du paiement et la
    /// référence externe du mariage rattaché.
    pub async fn list(
        db: &DatabaseConnection,
        filtres: FiltresPaiements,
        page: u64,
    ) -> Result<Page<PaiementAffichage, FiltresPaiements>, ServiceError> {
        let mut requete = Paiement::find();
        if let Some(recherche) = filtres.search.as_deref().filter(|s| !s.is_empty()) {
            let mariages: Vec<i32> = Mariage::find()
                .filter(contient(mariage::Column::Ref, recherche))
                .select_only()
                .column(mariage::Column::Id)
                .into_tuple::<i32>()
                .all(db)
                .await?;
            requete = requete.filter(
                Condition::any()
                    .add(contient(paiement::Column::ReferencePaiement, recherche))
                    .add(paiement::Column::MariageId.is_in(mariages)),
            );
        }

        let page = page.max(1);
        let paginateur = requete
            .order_by_desc(paiement::Column::CreatedAt)
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
    ) -> Result<PaiementAffichage, ServiceError> {
        let modele = Self::find_by_ref(db, reference).await?;
        let mut affichages = Self::afficher(db, vec![modele]).await?;
        affichages.pop().ok_or(ServiceError::NotFound("Paiement"))
    }

    async fn afficher(
        db: &DatabaseConnection,
        modeles: Vec<paiement::Model>,
    ) -> Result<Vec<PaiementAffichage>, ServiceError> {
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

        let ids_encaisseurs: Vec<i32> = modeles.iter().map(|m| m.encaisser_par).collect();
        let encaisseurs: HashMap<i32, ReferenceAffichage> = Fonctionnaire::find()
            .filter(fonctionnaire::Column::Id.is_in(ids_encaisseurs))
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
            .map(|m| PaiementAffichage {
                r#ref: m.r#ref,
                mariage: mariages.get(&m.mariage_id).cloned(),
                montant: m.montant.to_string(),
                mode_paiement: m.mode_paiement,
                reference_paiement: m.reference_paiement,
                date_paiement: m.date_paiement,
                statut: m.statut,
                encaisseur: encaisseurs.get(&m.encaisser_par).cloned(),
                notes: m.notes,
                cree_par: m.created_by.and_then(|id| auteurs.get(&id).cloned()),
                modifie_par: m.updated_by.and_then(|id| auteurs.get(&id).cloned()),
                created_at: m.created_at,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn fonctionnaire_fixture() -> fonctionnaire::Model {
        fonctionnaire::Model {
            id: 7,
            r#ref: "f-ref".into(),
            nom: "Ilunga".into(),
            postnom: "Kasongo".into(),
            prenom: "Pierre".into(),
            fonction: "Officier d'état civil".into(),
            grade: "A1".into(),
            matricule: "MAT-7".into(),
            email: "pierre@registre.cd".into(),
            telephone: "+243810000000".into(),
            date_embauche: NaiveDate::from_ymd_opt(2020, 1, 6).unwrap(),
            photo: None,
            user_id: 7,
            created_by: None,
            updated_by: None,
            created_at: Utc.with_ymd_and_hms(2020, 1, 6, 8, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2020, 1, 6, 8, 0, 0).unwrap(),
        }
    }

    fn mariage_fixture(statut: &str) -> mariage::Model {
        mariage::Model {
            id: 3,
            r#ref: "m-ref".into(),
            homme_id: 1,
            femme_id: 2,
            date_mariage: NaiveDate::from_ymd_opt(2026, 9, 12).unwrap(),
            heure_mariage: chrono::NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            officier_id: 7,
            lieu_mariage: "Hôtel de ville".into(),
            regime_matrimonial: "communauté_universelle".into(),
            temoins_homme: None,
            temoins_femme: None,
            statut: statut.into(),
            notes: None,
            created_by: None,
            updated_by: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap(),
        }
    }

    fn paiement_fixture() -> paiement::Model {
        paiement::Model {
            id: 11,
            r#ref: "p-ref".into(),
            mariage_id: 3,
            montant: Decimal::new(100_000, 0),
            mode_paiement: "Espèces".into(),
            reference_paiement: "PAY-0001".into(),
            date_paiement: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            statut: "payé".into(),
            encaisser_par: 7,
            notes: None,
            created_by: None,
            updated_by: None,
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
        }
    }

    fn payload_fixture() -> CreatePaiementRequest {
        CreatePaiementRequest {
            mariage_id: 3,
            montant: 100_000.0,
            mode_paiement: "Espèces".into(),
            reference_paiement: "PAY-0001".into(),
            date_paiement: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            statut: "payé".into(),
            encaisser_par: 7,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_porte_refuse_mariage_non_approuve() {
        // Statut en_attente: refus Workflow, rien n'est inséré
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![fonctionnaire_fixture()]])
            .append_query_results([vec![mariage_fixture(mariage::STATUT_EN_ATTENTE)]])
            .into_connection();

        let resultat = PaiementService::create(&db, Some(1), payload_fixture()).await;
        assert!(matches!(resultat, Err(ServiceError::Workflow(_))));

        // La pré-vérification échoue avant toute transaction d'écriture
        let journal = db.into_transaction_log();
        assert!(
            journal
                .iter()
                .all(|t| !format!("{t:?}").contains("INSERT"))
        );
    }

    #[tokio::test]
    async fn test_porte_re_verifie_sous_verrou() {
        // La pré-vérification voit approuvé, mais la
        // relecture verrouillée dans la transaction voit rejeté → refus
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![fonctionnaire_fixture()]])
            .append_query_results([vec![mariage_fixture(mariage::STATUT_APPROUVE)]])
            .append_query_results([vec![mariage_fixture(mariage::STATUT_REJETE)]])
            .into_connection();

        let resultat = PaiementService::create(&db, Some(1), payload_fixture()).await;
        assert!(matches!(resultat, Err(ServiceError::Workflow(_))));

        let journal = db.into_transaction_log();
        assert!(
            journal
                .iter()
                .all(|t| !format!("{t:?}").contains("INSERT"))
        );
    }

    #[tokio::test]
    async fn test_paiement_accepte_mariage_approuve() {
        // Statut approuvé: le paiement est créé
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![fonctionnaire_fixture()]])
            .append_query_results([vec![mariage_fixture(mariage::STATUT_APPROUVE)]])
            .append_query_results([vec![mariage_fixture(mariage::STATUT_APPROUVE)]])
            .append_query_results([Vec::<paiement::Model>::new()]) // référence libre
            .append_query_results([vec![paiement_fixture()]]) // INSERT .. RETURNING
            .into_connection();

        let paiement = PaiementService::create(&db, Some(1), payload_fixture())
            .await
            .unwrap();
        assert_eq!(paiement.reference_paiement, "PAY-0001");
        assert_eq!(paiement.mariage_id, 3);
    }

    #[tokio::test]
    async fn test_reference_paiement_deja_utilisee() {
        // La pré-vérification d'unicité refuse une référence existante
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![fonctionnaire_fixture()]])
            .append_query_results([vec![mariage_fixture(mariage::STATUT_APPROUVE)]])
            .append_query_results([vec![mariage_fixture(mariage::STATUT_APPROUVE)]])
            .append_query_results([vec![paiement_fixture()]]) // déjà prise
            .into_connection();

        let resultat = PaiementService::create(&db, Some(1), payload_fixture()).await;
        match resultat {
            Err(ServiceError::Validation(champs)) => {
                assert!(champs.contains_key("reference_paiement"));
            }
            autre => panic!("attendu Validation, obtenu {autre:?}"),
        }
    }

    #[tokio::test]
    async fn test_paiement_introuvable() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<paiement::Model>::new()])
            .into_connection();

        let resultat = PaiementService::find_by_ref(&db, "inconnu").await;
        assert!(matches!(resultat, Err(ServiceError::NotFound("Paiement"))));
    }

    #[tokio::test]
    async fn test_montant_negatif_refuse_sans_requete() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let mut payload = payload_fixture();
        payload.montant = -1.0;

        let resultat = PaiementService::create(&db, Some(1), payload).await;
        assert!(matches!(resultat, Err(ServiceError::Validation(_))));
    }
}
