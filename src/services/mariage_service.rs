use sea_orm::*;
use std::collections::HashMap;

use crate::errors::ServiceError;
use crate::models::citoyen::{self, Entity as Citoyen};
use crate::models::document_mariage::{self, Entity as DocumentMariage};
use crate::models::dto::{FiltresMariages, MariageAffichage, MariageRequest, Page, ReferenceAffichage};
use crate::models::etape_mariage::{self, Entity as EtapeMariage};
use crate::models::fonctionnaire::{self, Entity as Fonctionnaire};
use crate::models::mariage::{self, Entity as Mariage};
use crate::models::paiement::{self, Entity as Paiement};
use crate::models::piece_jointe::{self, Entity as PieceJointe};
use crate::services::audit::{CreationStamp, UpdateStamp};
use crate::services::piece_jointe_service::Attachable;
use crate::services::{PAR_PAGE, Principal, contient, noms_utilisateurs};
use validator::Validate;

pub struct MariageService;

impl MariageService {
    /// Crée un dossier de mariage. La date du mariage ne peut pas être dans
    /// le passé à l'enregistrement du dossier.
    pub async fn create(
        db: &DatabaseConnection,
        principal: Principal,
        payload: MariageRequest,
    ) -> Result<mariage::Model, ServiceError> {
        payload.validate()?;
        if payload.date_mariage < chrono::Utc::now().date_naive() {
            return Err(ServiceError::champ(
                "date_mariage",
                "La date du mariage doit être aujourd'hui ou ultérieure",
            ));
        }
        Self::verifier_references(db, &payload).await?;

        let cachet = CreationStamp::generate(principal);
        let nouveau = mariage::ActiveModel {
            r#ref: Set(cachet.reference),
            homme_id: Set(payload.homme_id),
            femme_id: Set(payload.femme_id),
            date_mariage: Set(payload.date_mariage),
            heure_mariage: Set(payload.heure_mariage),
            officier_id: Set(payload.officier_id),
            lieu_mariage: Set(payload.lieu_mariage),
            regime_matrimonial: Set(payload.regime_matrimonial),
            temoins_homme: Set(payload.temoins_homme.map(|t| serde_json::json!(t))),
            temoins_femme: Set(payload.temoins_femme.map(|t| serde_json::json!(t))),
            statut: Set(payload.statut),
            notes: Set(payload.notes),
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
    ) -> Result<mariage::Model, ServiceError> {
        Mariage::find()
            .filter(mariage::Column::Ref.eq(reference))
            .one(db)
            .await?
            .ok_or(ServiceError::NotFound("Mariage"))
    }

    /// Met à jour un dossier. Un changement de `statut` doit suivre la
    /// machine à états: en_attente → approuvé|rejeté, approuvé → célébré.
    pub async fn update(
        db: &DatabaseConnection,
        principal: Principal,
        reference: &str,
        payload: MariageRequest,
    ) -> Result<mariage::Model, ServiceError> {
        payload.validate()?;
        let existant = Self::find_by_ref(db, reference).await?;
        if !mariage::transition_autorisee(&existant.statut, &payload.statut) {
            return Err(ServiceError::Workflow(format!(
                "Transition de statut non autorisée: {} → {}",
                existant.statut, payload.statut
            )));
        }
        Self::verifier_references(db, &payload).await?;

        let cachet = UpdateStamp::generate(principal);
        let mut actif: mariage::ActiveModel = existant.into();
        actif.homme_id = Set(payload.homme_id);
        actif.femme_id = Set(payload.femme_id);
        actif.date_mariage = Set(payload.date_mariage);
        actif.heure_mariage = Set(payload.heure_mariage);
        actif.officier_id = Set(payload.officier_id);
        actif.lieu_mariage = Set(payload.lieu_mariage);
        actif.regime_matrimonial = Set(payload.regime_matrimonial);
        actif.temoins_homme = Set(payload.temoins_homme.map(|t| serde_json::json!(t)));
        actif.temoins_femme = Set(payload.temoins_femme.map(|t| serde_json::json!(t)));
        actif.statut = Set(payload.statut);
        actif.notes = Set(payload.notes);
        if let Some(p) = cachet.updated_by {
            actif.updated_by = Set(Some(p));
        }
        actif.updated_at = Set(cachet.updated_at);
        Ok(actif.update(db).await?)
    }

    /// Supprime un dossier. Interdit tant qu'il reste des documents, étapes,
    /// paiements ou pièces jointes rattachés.
    pub async fn delete(db: &DatabaseConnection, reference: &str) -> Result<(), ServiceError> {
        let existant = Self::find_by_ref(db, reference).await?;

        let dependances: [(&str, u64); 4] = [
            (
                "des documents",
                DocumentMariage::find()
                    .filter(document_mariage::Column::MariageId.eq(existant.id))
                    .count(db)
                    .await?,
            ),
            (
                "des étapes",
                EtapeMariage::find()
                    .filter(etape_mariage::Column::MariageId.eq(existant.id))
                    .count(db)
                    .await?,
            ),
            (
                "des paiements",
                Paiement::find()
                    .filter(paiement::Column::MariageId.eq(existant.id))
                    .count(db)
                    .await?,
            ),
            (
                "des pièces jointes",
                PieceJointe::find()
                    .filter(piece_jointe::Column::AttachableType.eq(Attachable::Mariage.tag()))
                    .filter(piece_jointe::Column::AttachableId.eq(existant.id))
                    .count(db)
                    .await?,
            ),
        ];
        if let Some((quoi, _)) = dependances.iter().find(|(_, compte)| *compte > 0) {
            return Err(ServiceError::champ(
                "mariage",
                &format!("Impossible de supprimer: ce mariage a encore {quoi}"),
            ));
        }

        Mariage::delete_by_id(existant.id).exec(db).await?;
        Ok(())
    }

    /// Liste paginée. La recherche porte sur les noms des deux conjoints;
    /// le filtre `statut` est une égalité exacte; les deux se combinent en ET.
    pub async fn list(
        db: &DatabaseConnection,
        filtres: FiltresMariages,
        page: u64,
    ) -> Result<Page<MariageAffichage, FiltresMariages>, ServiceError> {
        let mut requete = Mariage::find();
        if let Some(recherche) = filtres.search.as_deref().filter(|s| !s.is_empty()) {
            let conjoints = ids_citoyens_par_nom(db, recherche).await?;
            requete = requete.filter(
                Condition::any()
                    .add(mariage::Column::HommeId.is_in(conjoints.clone()))
                    .add(mariage::Column::FemmeId.is_in(conjoints)),
            );
        }
        if let Some(statut) = filtres.statut.as_deref().filter(|s| !s.is_empty()) {
            requete = requete.filter(mariage::Column::Statut.eq(statut));
        }

        let page = page.max(1);
        let paginateur = requete
            .order_by_desc(mariage::Column::CreatedAt)
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
    ) -> Result<MariageAffichage, ServiceError> {
        let modele = Self::find_by_ref(db, reference).await?;
        let mut affichages = Self::afficher(db, vec![modele]).await?;
        affichages.pop().ok_or(ServiceError::NotFound("Mariage"))
    }

    /// Résout conjoints et officier en libellés affichables, en deux requêtes
    /// groupées plutôt qu'une paire de requêtes par ligne.
    pub async fn afficher(
        db: &DatabaseConnection,
        modeles: Vec<mariage::Model>,
    ) -> Result<Vec<MariageAffichage>, ServiceError> {
        let auteurs = noms_utilisateurs(
            db,
            modeles
                .iter()
                .flat_map(|m| [m.created_by, m.updated_by])
                .flatten(),
        )
        .await?;

        let ids_citoyens: Vec<i32> = modeles
            .iter()
            .flat_map(|m| [m.homme_id, m.femme_id])
            .collect();
        let citoyens: HashMap<i32, ReferenceAffichage> = Citoyen::find()
            .filter(citoyen::Column::Id.is_in(ids_citoyens))
            .all(db)
            .await?
            .into_iter()
            .map(|c| {
                (
                    c.id,
                    ReferenceAffichage {
                        r#ref: c.r#ref.clone(),
                        libelle: c.nom_complet(),
                    },
                )
            })
            .collect();

        let ids_officiers: Vec<i32> = modeles.iter().map(|m| m.officier_id).collect();
        let officiers: HashMap<i32, ReferenceAffichage> = Fonctionnaire::find()
            .filter(fonctionnaire::Column::Id.is_in(ids_officiers))
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
            .map(|m| MariageAffichage {
                r#ref: m.r#ref,
                homme: citoyens.get(&m.homme_id).cloned(),
                femme: citoyens.get(&m.femme_id).cloned(),
                officier: officiers.get(&m.officier_id).cloned(),
                date_mariage: m.date_mariage,
                heure_mariage: m.heure_mariage,
                lieu_mariage: m.lieu_mariage,
                regime_matrimonial: m.regime_matrimonial,
                temoins_homme: m.temoins_homme,
                temoins_femme: m.temoins_femme,
                statut: m.statut,
                notes: m.notes,
                cree_par: m.created_by.and_then(|id| auteurs.get(&id).cloned()),
                modifie_par: m.updated_by.and_then(|id| auteurs.get(&id).cloned()),
                created_at: m.created_at,
                updated_at: m.updated_at,
            })
            .collect())
    }

    async fn verifier_references(
        db: &DatabaseConnection,
        payload: &MariageRequest,
    ) -> Result<(), ServiceError> {
        for (champ, id) in [("homme_id", payload.homme_id), ("femme_id", payload.femme_id)] {
            if Citoyen::find_by_id(id).count(db).await? == 0 {
                return Err(ServiceError::champ(champ, "Citoyen inexistant"));
            }
        }
        if Fonctionnaire::find_by_id(payload.officier_id).count(db).await? == 0 {
            return Err(ServiceError::champ("officier_id", "Fonctionnaire inexistant"));
        }
        Ok(())
    }
}

/// Ids des citoyens dont le nom, postnom ou prénom contient `recherche`.
pub(crate) async fn ids_citoyens_par_nom(
    db: &DatabaseConnection,
    recherche: &str,
) -> Result<Vec<i32>, ServiceError> {
    Ok(Citoyen::find()
        .filter(
            Condition::any()
                .add(contient(citoyen::Column::Nom, recherche))
                .add(contient(citoyen::Column::Postnom, recherche))
                .add(contient(citoyen::Column::Prenom, recherche)),
        )
        .select_only()
        .column(citoyen::Column::Id)
        .into_tuple::<i32>()
        .all(db)
        .await?)
}

/// Ids des mariages dont l'un des conjoints correspond à la recherche.
pub(crate) async fn ids_mariages_par_conjoint(
    db: &DatabaseConnection,
    recherche: &str,
) -> Result<Vec<i32>, ServiceError> {
    let conjoints = ids_citoyens_par_nom(db, recherche).await?;
    Ok(Mariage::find()
        .filter(
            Condition::any()
                .add(mariage::Column::HommeId.is_in(conjoints.clone()))
                .add(mariage::Column::FemmeId.is_in(conjoints)),
        )
        .select_only()
        .column(mariage::Column::Id)
        .into_tuple::<i32>()
        .all(db)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::dto::MariageRequest;
    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};

    fn mariage_fixture(statut: &str) -> mariage::Model {
        mariage::Model {
            id: 3,
            r#ref: "m-ref".into(),
            homme_id: 1,
            femme_id: 2,
            date_mariage: NaiveDate::from_ymd_opt(2026, 9, 12).unwrap(),
            heure_mariage: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
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

    fn payload_fixture(statut: &str) -> MariageRequest {
        MariageRequest {
            homme_id: 1,
            femme_id: 2,
            date_mariage: NaiveDate::from_ymd_opt(2026, 9, 12).unwrap(),
            heure_mariage: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            officier_id: 7,
            lieu_mariage: "Hôtel de ville".into(),
            regime_matrimonial: "communauté_universelle".into(),
            temoins_homme: None,
            temoins_femme: None,
            statut: statut.into(),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_transition_depuis_etat_terminal_refusee() {
        // Un dossier rejeté ne peut plus être approuvé
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![mariage_fixture(mariage::STATUT_REJETE)]])
            .into_connection();

        let resultat = MariageService::update(
            &db,
            Some(1),
            "m-ref",
            payload_fixture(mariage::STATUT_APPROUVE),
        )
        .await;
        match resultat {
            Err(ServiceError::Workflow(message)) => {
                assert!(message.contains("rejeté"));
                assert!(message.contains("approuvé"));
            }
            autre => panic!("attendu Workflow, obtenu {autre:?}"),
        }
    }

    #[tokio::test]
    async fn test_liste_combine_recherche_et_statut() {
        // search (noms des conjoints) et statut se cumulent en ET
        use std::collections::BTreeMap;
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![BTreeMap::from([("id", Value::from(1i32))])]])
            .append_query_results([vec![BTreeMap::from([("num_items", Value::from(1i64))])]])
            .append_query_results([vec![mariage_fixture(mariage::STATUT_APPROUVE)]])
            .append_query_results([Vec::<citoyen::Model>::new()])
            .append_query_results([Vec::<fonctionnaire::Model>::new()])
            .into_connection();

        let filtres = FiltresMariages {
            search: Some("Mbala".into()),
            statut: Some(mariage::STATUT_APPROUVE.into()),
        };
        let page = MariageService::list(&db, filtres, 1).await.unwrap();
        assert_eq!(page.donnees.len(), 1);

        // Les deux prédicats doivent apparaître dans le SQL émis
        let journal = format!("{:?}", db.into_transaction_log());
        assert!(journal.contains("LOWER("), "recherche insensible à la casse absente: {journal}");
        assert!(journal.contains("homme_id"), "filtre conjoints absent: {journal}");
        assert!(journal.contains("statut"), "filtre statut absent: {journal}");
    }

    #[tokio::test]
    async fn test_date_mariage_passee_refusee_sans_requete() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let mut payload = payload_fixture(mariage::STATUT_EN_ATTENTE);
        payload.date_mariage = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();

        let resultat = MariageService::create(&db, Some(1), payload).await;
        match resultat {
            Err(ServiceError::Validation(champs)) => {
                assert!(champs.contains_key("date_mariage"));
            }
            autre => panic!("attendu Validation, obtenu {autre:?}"),
        }
    }
}
