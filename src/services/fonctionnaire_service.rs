use sea_orm::*;

use crate::errors::ServiceError;
use crate::models::document_mariage::{self, Entity as DocumentMariage};
use crate::models::dto::{FicheDetail, FiltresFonctionnaires, FonctionnaireRequest, Page};
use crate::models::etape_mariage::{self, Entity as EtapeMariage};
use crate::models::fonctionnaire::{self, Entity as Fonctionnaire};
use crate::models::mariage::{self, Entity as Mariage};
use crate::models::paiement::{self, Entity as Paiement};
use crate::models::users::{self, Entity as Users};
use crate::services::audit::{CreationStamp, UpdateStamp};
use crate::services::storage::{DepotFichiers, supprimer_sans_echec};
use crate::services::{PAR_PAGE, Principal, contient, decoder_fichier, noms_utilisateurs};
use crate::utils::password;
use validator::Validate;

/// Mot de passe initial du compte apparié, à changer à la première connexion.
const MOT_DE_PASSE_DEFAUT: &str = "password";

pub struct FonctionnaireService;

impl FonctionnaireService {
    /// Crée un fonctionnaire et son compte utilisateur apparié, dans la même
    /// transaction (tout ou rien).
    pub async fn create(
        db: &DatabaseConnection,
        depot: &dyn DepotFichiers,
        principal: Principal,
        payload: FonctionnaireRequest,
    ) -> Result<fonctionnaire::Model, ServiceError> {
        payload.validate()?;
        Self::verifier_unicite(db, &payload.matricule, &payload.email, None).await?;

        let photo = match &payload.photo {
            Some(fichier) => {
                let contenu = decoder_fichier(fichier)?;
                Some(
                    depot
                        .enregistrer("fonctionnaires/photos", &fichier.nom, &contenu)
                        .await?,
                )
            }
            None => None,
        };

        let hash = password::hash_password(MOT_DE_PASSE_DEFAUT)
            .map_err(|e| ServiceError::Storage(format!("hash du mot de passe: {e}")))?;
        let cachet = CreationStamp::generate(principal);

        let matricule = payload.matricule.clone();
        db.transaction::<_, fonctionnaire::Model, ServiceError>(move |txn| {
            Box::pin(async move {
                let compte = users::ActiveModel {
                    name: Set(format!("{} {}", payload.nom, payload.postnom)),
                    email: Set(payload.email.clone()),
                    password_hash: Set(hash),
                    role: Set("fonctionnaire".to_string()),
                    ..Default::default()
                }
                .insert(txn)
                .await
                .map_err(|e| ServiceError::depuis_ecriture(e, "email", &payload.email))?;

                let nouveau = fonctionnaire::ActiveModel {
                    r#ref: Set(cachet.reference),
                    nom: Set(payload.nom),
                    postnom: Set(payload.postnom),
                    prenom: Set(payload.prenom),
                    fonction: Set(payload.fonction),
                    grade: Set(payload.grade),
                    matricule: Set(payload.matricule.clone()),
                    email: Set(payload.email),
                    telephone: Set(payload.telephone),
                    date_embauche: Set(payload.date_embauche),
                    photo: Set(photo),
                    user_id: Set(compte.id),
                    created_by: Set(cachet.created_by),
                    updated_by: Set(cachet.updated_by),
                    created_at: Set(cachet.created_at),
                    updated_at: Set(cachet.updated_at),
                    ..Default::default()
                };
                nouveau
                    .insert(txn)
                    .await
                    .map_err(|e| ServiceError::depuis_ecriture(e, "matricule", &payload.matricule))
            })
        })
        .await
        .map_err(ServiceError::from)
        .inspect(|f| tracing::info!(matricule, r#ref = f.r#ref, "fonctionnaire créé"))
    }

    pub async fn find_by_ref(
        db: &DatabaseConnection,
        reference: &str,
    ) -> Result<fonctionnaire::Model, ServiceError> {
        Fonctionnaire::find()
            .filter(fonctionnaire::Column::Ref.eq(reference))
            .one(db)
            .await?
            .ok_or(ServiceError::NotFound("Fonctionnaire"))
    }

    /// Fiche détaillée: le fonctionnaire plus les noms des comptes créateur
    /// et dernier modificateur.
    pub async fn show(
        db: &DatabaseConnection,
        reference: &str,
    ) -> Result<FicheDetail<fonctionnaire::Model>, ServiceError> {
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

    pub async fn update(
        db: &DatabaseConnection,
        depot: &dyn DepotFichiers,
        principal: Principal,
        reference: &str,
        payload: FonctionnaireRequest,
    ) -> Result<fonctionnaire::Model, ServiceError> {
        payload.validate()?;
        let existant = Self::find_by_ref(db, reference).await?;
        Self::verifier_unicite(db, &payload.matricule, &payload.email, Some(existant.id)).await?;

        let ancienne_photo = existant.photo.clone();
        let nouvelle_photo = match &payload.photo {
            Some(fichier) => {
                let contenu = decoder_fichier(fichier)?;
                Some(
                    depot
                        .enregistrer("fonctionnaires/photos", &fichier.nom, &contenu)
                        .await?,
                )
            }
            None => None,
        };

        let cachet = UpdateStamp::generate(principal);
        let matricule = payload.matricule.clone();
        let mut actif: fonctionnaire::ActiveModel = existant.into();
        actif.nom = Set(payload.nom);
        actif.postnom = Set(payload.postnom);
        actif.prenom = Set(payload.prenom);
        actif.fonction = Set(payload.fonction);
        actif.grade = Set(payload.grade);
        actif.matricule = Set(payload.matricule);
        actif.email = Set(payload.email);
        actif.telephone = Set(payload.telephone);
        actif.date_embauche = Set(payload.date_embauche);
        if let Some(photo) = &nouvelle_photo {
            actif.photo = Set(Some(photo.clone()));
        }
        if let Some(p) = cachet.updated_by {
            actif.updated_by = Set(Some(p));
        }
        actif.updated_at = Set(cachet.updated_at);

        let modele = actif
            .update(db)
            .await
            .map_err(|e| ServiceError::depuis_ecriture(e, "matricule", &matricule))?;

        if nouvelle_photo.is_some() {
            if let Some(ancienne) = ancienne_photo {
                supprimer_sans_echec(depot, &ancienne).await;
            }
        }
        Ok(modele)
    }

    /// Supprime un fonctionnaire et son compte apparié. Interdit tant qu'il
    /// est référencé comme officier, encaisseur, responsable ou livreur.
    pub async fn delete(
        db: &DatabaseConnection,
        depot: &dyn DepotFichiers,
        reference: &str,
    ) -> Result<(), ServiceError> {
        let existant = Self::find_by_ref(db, reference).await?;

        let references: [(&str, u64); 4] = [
            (
                "officier d'un mariage",
                Mariage::find()
                    .filter(mariage::Column::OfficierId.eq(existant.id))
                    .count(db)
                    .await?,
            ),
            (
                "encaisseur d'un paiement",
                Paiement::find()
                    .filter(paiement::Column::EncaisserPar.eq(existant.id))
                    .count(db)
                    .await?,
            ),
            (
                "responsable d'une étape",
                EtapeMariage::find()
                    .filter(etape_mariage::Column::ResponsableId.eq(existant.id))
                    .count(db)
                    .await?,
            ),
            (
                "livreur d'un document",
                DocumentMariage::find()
                    .filter(document_mariage::Column::LivrePar.eq(existant.id))
                    .count(db)
                    .await?,
            ),
        ];
        if let Some((role, _)) = references.iter().find(|(_, compte)| *compte > 0) {
            return Err(ServiceError::champ(
                "fonctionnaire",
                &format!("Impossible de supprimer: ce fonctionnaire est {role}"),
            ));
        }

        let photo = existant.photo.clone();
        let user_id = existant.user_id;
        db.transaction::<_, (), ServiceError>(move |txn| {
            Box::pin(async move {
                Fonctionnaire::delete_by_id(existant.id).exec(txn).await?;
                // La suppression cascade sur le compte apparié
                Users::delete_by_id(user_id).exec(txn).await?;
                Ok(())
            })
        })
        .await
        .map_err(ServiceError::from)?;

        if let Some(photo) = photo {
            supprimer_sans_echec(depot, &photo).await;
        }
        Ok(())
    }

    /// Liste paginée; recherche sur nom, postnom, prénom et matricule.
    pub async fn list(
        db: &DatabaseConnection,
        filtres: FiltresFonctionnaires,
        page: u64,
    ) -> Result<Page<fonctionnaire::Model, FiltresFonctionnaires>, ServiceError> {
        let mut requete = Fonctionnaire::find();
        if let Some(recherche) = filtres.search.as_deref().filter(|s| !s.is_empty()) {
            requete = requete.filter(
                Condition::any()
                    .add(contient(fonctionnaire::Column::Nom, recherche))
                    .add(contient(fonctionnaire::Column::Postnom, recherche))
                    .add(contient(fonctionnaire::Column::Prenom, recherche))
                    .add(contient(fonctionnaire::Column::Matricule, recherche)),
            );
        }

        let page = page.max(1);
        let paginateur = requete
            .order_by_desc(fonctionnaire::Column::CreatedAt)
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

    async fn verifier_unicite(
        db: &DatabaseConnection,
        matricule: &str,
        email: &str,
        ignorer_id: Option<i32>,
    ) -> Result<(), ServiceError> {
        let mut par_matricule =
            Fonctionnaire::find().filter(fonctionnaire::Column::Matricule.eq(matricule));
        let mut par_email = Fonctionnaire::find().filter(fonctionnaire::Column::Email.eq(email));
        if let Some(id) = ignorer_id {
            par_matricule = par_matricule.filter(fonctionnaire::Column::Id.ne(id));
            par_email = par_email.filter(fonctionnaire::Column::Id.ne(id));
        }
        if par_matricule.count(db).await? > 0 {
            return Err(ServiceError::champ(
                "matricule",
                "Ce matricule est déjà utilisé",
            ));
        }
        if par_email.count(db).await? > 0 {
            return Err(ServiceError::champ(
                "email",
                "Cette adresse email est déjà utilisée",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::storage::DepotLocal;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn payload_fixture() -> FonctionnaireRequest {
        FonctionnaireRequest {
            nom: "Ilunga".into(),
            postnom: "Kabeya".into(),
            prenom: "Patrice".into(),
            fonction: "officier_etat_civil".into(),
            grade: "A1".into(),
            matricule: "MAT-001".into(),
            email: "p.ilunga@registre.cd".into(),
            telephone: "+243810000000".into(),
            date_embauche: NaiveDate::from_ymd_opt(2020, 3, 1).unwrap(),
            photo: None,
        }
    }

    fn depot_inutilise() -> DepotLocal {
        DepotLocal::new(std::env::temp_dir().join("depot-tests-fonctionnaires"))
    }

    #[tokio::test]
    async fn test_matricule_deja_utilise() {
        // Le pré-contrôle refuse un matricule déjà pris, rien n'est inséré
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![BTreeMap::from([("num_items", Value::from(1i64))])]])
            .into_connection();

        let resultat =
            FonctionnaireService::create(&db, &depot_inutilise(), Some(1), payload_fixture()).await;
        match resultat {
            Err(ServiceError::Validation(champs)) => {
                assert!(champs.contains_key("matricule"));
            }
            autre => panic!("attendu Validation, obtenu {autre:?}"),
        }
    }

    #[tokio::test]
    async fn test_email_deja_utilise() {
        // Matricule libre, email déjà pris
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![BTreeMap::from([("num_items", Value::from(0i64))])],
                vec![BTreeMap::from([("num_items", Value::from(1i64))])],
            ])
            .into_connection();

        let resultat =
            FonctionnaireService::create(&db, &depot_inutilise(), Some(1), payload_fixture()).await;
        match resultat {
            Err(ServiceError::Validation(champs)) => {
                assert!(champs.contains_key("email"));
            }
            autre => panic!("attendu Validation, obtenu {autre:?}"),
        }
    }
}
