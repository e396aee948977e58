use sea_orm::*;
use std::collections::HashMap;

use crate::errors::ServiceError;
use crate::models::citoyen::{self, Entity as Citoyen};
use crate::models::dto::{
    CreatePieceJointeRequest, FiltresPiecesJointes, Page, PieceJointeAffichage,
    ReferenceAffichage, UpdatePieceJointeRequest,
};
use crate::models::mariage::{self, Entity as Mariage};
use crate::models::piece_jointe::{self, Entity as PieceJointe};
use crate::services::audit::{CreationStamp, UpdateStamp};
use crate::services::mariage_service::{ids_citoyens_par_nom, ids_mariages_par_conjoint};
use crate::services::storage::{DepotFichiers, supprimer_sans_echec};
use crate::services::{PAR_PAGE, Principal, contient, decoder_fichier, noms_utilisateurs};
use validator::Validate;

/// Propriétaire possible d'une pièce jointe. Le jeu est fermé: tout tag
/// stocké en base provient de [`Attachable::tag`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Attachable {
    Citoyen,
    Mariage,
}

impl Attachable {
    pub fn tag(self) -> &'static str {
        match self {
            Attachable::Citoyen => "citoyen",
            Attachable::Mariage => "mariage",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "citoyen" => Some(Attachable::Citoyen),
            "mariage" => Some(Attachable::Mariage),
            _ => None,
        }
    }
}

pub struct PieceJointeService;

impl PieceJointeService {
    /// Crée une pièce jointe. Le fichier est obligatoire à la création et le
    /// propriétaire désigné doit exister.
    pub async fn create(
        db: &DatabaseConnection,
        depot: &dyn DepotFichiers,
        principal: Principal,
        payload: CreatePieceJointeRequest,
    ) -> Result<piece_jointe::Model, ServiceError> {
        payload.validate()?;
        let proprietaire = Attachable::parse(&payload.attachable_type).ok_or_else(|| {
            ServiceError::champ(
                "attachable_type",
                "Le propriétaire doit être un citoyen ou un mariage",
            )
        })?;
        Self::verifier_proprietaire(db, proprietaire, payload.attachable_id).await?;

        let contenu = decoder_fichier(&payload.fichier)?;
        let fichier = depot
            .enregistrer("pieces-jointes", &payload.fichier.nom, &contenu)
            .await?;

        let cachet = CreationStamp::generate(principal);
        let nouveau = piece_jointe::ActiveModel {
            r#ref: Set(cachet.reference),
            attachable_type: Set(proprietaire.tag().to_string()),
            attachable_id: Set(payload.attachable_id),
            type_piece: Set(payload.type_piece),
            numero_piece: Set(payload.numero_piece),
            fichier: Set(fichier),
            date_emission: Set(payload.date_emission),
            date_expiration: Set(payload.date_expiration),
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
    ) -> Result<piece_jointe::Model, ServiceError> {
        PieceJointe::find()
            .filter(piece_jointe::Column::Ref.eq(reference))
            .one(db)
            .await?
            .ok_or(ServiceError::NotFound("Pièce jointe"))
    }

    /// Met à jour une pièce jointe. Le propriétaire ne change jamais; le
    /// fichier n'est remplacé que s'il est fourni (nouveau stocké → ligne
    /// persistée → ancien supprimé).
    pub async fn update(
        db: &DatabaseConnection,
        depot: &dyn DepotFichiers,
        principal: Principal,
        reference: &str,
        payload: UpdatePieceJointeRequest,
    ) -> Result<piece_jointe::Model, ServiceError> {
        payload.validate()?;
        let existant = Self::find_by_ref(db, reference).await?;

        let ancien_fichier = existant.fichier.clone();
        let nouveau_fichier = match &payload.fichier {
            Some(upload) => {
                let contenu = decoder_fichier(upload)?;
                Some(
                    depot
                        .enregistrer("pieces-jointes", &upload.nom, &contenu)
                        .await?,
                )
            }
            None => None,
        };

        let cachet = UpdateStamp::generate(principal);
        let mut actif: piece_jointe::ActiveModel = existant.into();
        actif.type_piece = Set(payload.type_piece);
        actif.numero_piece = Set(payload.numero_piece);
        actif.date_emission = Set(payload.date_emission);
        actif.date_expiration = Set(payload.date_expiration);
        if let Some(fichier) = &nouveau_fichier {
            actif.fichier = Set(fichier.clone());
        }
        if let Some(p) = cachet.updated_by {
            actif.updated_by = Set(Some(p));
        }
        actif.updated_at = Set(cachet.updated_at);

        let modele = actif.update(db).await?;

        if nouveau_fichier.is_some() {
            supprimer_sans_echec(depot, &ancien_fichier).await;
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
        PieceJointe::delete_by_id(existant.id).exec(db).await?;
        supprimer_sans_echec(depot, &fichier).await;
        Ok(())
    }

    /// Liste paginée. La recherche accepte un numéro de pièce ou un nom: elle
    /// combine en OU le numéro de pièce et, par famille de propriétaires, les
    /// ids dont le nom correspond. Le filtre `type_piece` se combine en ET.
    pub async fn list(
        db: &DatabaseConnection,
        filtres: FiltresPiecesJointes,
        page: u64,
    ) -> Result<Page<PieceJointeAffichage, FiltresPiecesJointes>, ServiceError> {
        let mut requete = PieceJointe::find();
        if let Some(recherche) = filtres.search.as_deref().filter(|s| !s.is_empty()) {
            let citoyens = ids_citoyens_par_nom(db, recherche).await?;
            let mariages = ids_mariages_par_conjoint(db, recherche).await?;
            requete = requete.filter(
                Condition::any()
                    .add(contient(piece_jointe::Column::NumeroPiece, recherche))
                    .add(
                        Condition::all()
                            .add(
                                piece_jointe::Column::AttachableType
                                    .eq(Attachable::Citoyen.tag()),
                            )
                            .add(piece_jointe::Column::AttachableId.is_in(citoyens)),
                    )
                    .add(
                        Condition::all()
                            .add(
                                piece_jointe::Column::AttachableType
                                    .eq(Attachable::Mariage.tag()),
                            )
                            .add(piece_jointe::Column::AttachableId.is_in(mariages)),
                    ),
            );
        }
        if let Some(type_piece) = filtres.type_piece.as_deref().filter(|s| !s.is_empty()) {
            requete = requete.filter(piece_jointe::Column::TypePiece.eq(type_piece));
        }

        let page = page.max(1);
        let paginateur = requete
            .order_by_desc(piece_jointe::Column::CreatedAt)
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
    ) -> Result<PieceJointeAffichage, ServiceError> {
        let modele = Self::find_by_ref(db, reference).await?;
        let mut affichages = Self::afficher(db, vec![modele]).await?;
        affichages.pop().ok_or(ServiceError::NotFound("Pièce jointe"))
    }

    /// Résout les propriétaires en libellés, une requête groupée par famille.
    async fn afficher(
        db: &DatabaseConnection,
        modeles: Vec<piece_jointe::Model>,
    ) -> Result<Vec<PieceJointeAffichage>, ServiceError> {
        let auteurs = noms_utilisateurs(
            db,
            modeles
                .iter()
                .flat_map(|m| [m.created_by, m.updated_by])
                .flatten(),
        )
        .await?;

        let mut ids_citoyens = Vec::new();
        let mut ids_mariages = Vec::new();
        for modele in &modeles {
            match Attachable::parse(&modele.attachable_type) {
                Some(Attachable::Citoyen) => ids_citoyens.push(modele.attachable_id),
                Some(Attachable::Mariage) => ids_mariages.push(modele.attachable_id),
                None => {}
            }
        }

        let citoyens: HashMap<i32, ReferenceAffichage> = if ids_citoyens.is_empty() {
            HashMap::new()
        } else {
            Citoyen::find()
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
                .collect()
        };
        let mariages: HashMap<i32, ReferenceAffichage> = if ids_mariages.is_empty() {
            HashMap::new()
        } else {
            Mariage::find()
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
                .collect()
        };

        Ok(modeles
            .into_iter()
            .map(|m| {
                let proprietaire = match Attachable::parse(&m.attachable_type) {
                    Some(Attachable::Citoyen) => citoyens.get(&m.attachable_id).cloned(),
                    Some(Attachable::Mariage) => mariages.get(&m.attachable_id).cloned(),
                    None => None,
                };
                PieceJointeAffichage {
                    r#ref: m.r#ref,
                    attachable_type: m.attachable_type,
                    proprietaire,
                    type_piece: m.type_piece,
                    numero_piece: m.numero_piece,
                    fichier: m.fichier,
                    date_emission: m.date_emission,
                    date_expiration: m.date_expiration,
                    cree_par: m.created_by.and_then(|id| auteurs.get(&id).cloned()),
                    modifie_par: m.updated_by.and_then(|id| auteurs.get(&id).cloned()),
                    created_at: m.created_at,
                }
            })
            .collect())
    }

    async fn verifier_proprietaire(
        db: &DatabaseConnection,
        proprietaire: Attachable,
        id: i32,
    ) -> Result<(), ServiceError> {
        let existe = match proprietaire {
            Attachable::Citoyen => Citoyen::find_by_id(id).one(db).await?.is_some(),
            Attachable::Mariage => Mariage::find_by_id(id).one(db).await?.is_some(),
        };
        if existe {
            Ok(())
        } else {
            Err(ServiceError::champ(
                "attachable_id",
                "Le propriétaire désigné n'existe pas",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::storage::DepotLocal;
    use base64::Engine as _;
    use chrono::NaiveDate;

    #[test]
    fn test_tags_attachable() {
        assert_eq!(Attachable::Citoyen.tag(), "citoyen");
        assert_eq!(Attachable::Mariage.tag(), "mariage");
        assert_eq!(Attachable::parse("citoyen"), Some(Attachable::Citoyen));
        assert_eq!(Attachable::parse("mariage"), Some(Attachable::Mariage));
        assert_eq!(Attachable::parse("document"), None);
        assert_eq!(Attachable::parse("Citoyen"), None);
    }

    fn payload_fixture(attachable_type: &str) -> CreatePieceJointeRequest {
        CreatePieceJointeRequest {
            attachable_type: attachable_type.into(),
            attachable_id: 1,
            type_piece: "cni".into(),
            numero_piece: "CNI-123".into(),
            fichier: crate::models::dto::FichierUpload {
                nom: "cni.pdf".into(),
                contenu: base64::engine::general_purpose::STANDARD.encode(b"contenu"),
            },
            date_emission: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            date_expiration: None,
        }
    }

    fn depot_inutilise() -> DepotLocal {
        DepotLocal::new(std::env::temp_dir().join("depot-tests-pieces"))
    }

    #[tokio::test]
    async fn test_tag_proprietaire_inconnu_refuse_sans_requete() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let resultat = PieceJointeService::create(
            &db,
            &depot_inutilise(),
            Some(1),
            payload_fixture("document"),
        )
        .await;
        match resultat {
            Err(ServiceError::Validation(champs)) => {
                assert!(champs.contains_key("attachable_type"));
            }
            autre => panic!("attendu Validation, obtenu {autre:?}"),
        }
    }

    #[tokio::test]
    async fn test_proprietaire_inexistant_refuse() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<citoyen::Model>::new()])
            .into_connection();

        let resultat = PieceJointeService::create(
            &db,
            &depot_inutilise(),
            Some(1),
            payload_fixture("citoyen"),
        )
        .await;
        match resultat {
            Err(ServiceError::Validation(champs)) => {
                assert!(champs.contains_key("attachable_id"));
            }
            autre => panic!("attendu Validation, obtenu {autre:?}"),
        }
    }

    #[tokio::test]
    async fn test_piece_introuvable() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<piece_jointe::Model>::new()])
            .into_connection();

        let resultat = PieceJointeService::find_by_ref(&db, "inconnu").await;
        assert!(matches!(
            resultat,
            Err(ServiceError::NotFound("Pièce jointe"))
        ));
    }
}
