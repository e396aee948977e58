use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Dossier de mariage entre deux citoyens, célébré par un officier.
///
/// Le champ `statut` suit une machine à états stricte (voir
/// [`transition_autorisee`]); les paiements ne sont admis que lorsque le
/// mariage est `approuvé`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "mariages")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip_serializing)]
    pub id: i32,
    #[sea_orm(unique)]
    pub r#ref: String,
    pub homme_id: i32,
    pub femme_id: i32,
    pub date_mariage: Date,
    pub heure_mariage: Time,
    pub officier_id: i32,
    pub lieu_mariage: String,
    pub regime_matrimonial: String,
    /// Listes ordonnées de noms de témoins, stockées en JSON.
    pub temoins_homme: Option<Json>,
    pub temoins_femme: Option<Json>,
    pub statut: String,
    pub notes: Option<String>,
    pub created_by: Option<i32>,
    pub updated_by: Option<i32>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::citoyen::Entity",
        from = "Column::HommeId",
        to = "super::citoyen::Column::Id"
    )]
    Homme,
    #[sea_orm(
        belongs_to = "super::citoyen::Entity",
        from = "Column::FemmeId",
        to = "super::citoyen::Column::Id"
    )]
    Femme,
    #[sea_orm(
        belongs_to = "super::fonctionnaire::Entity",
        from = "Column::OfficierId",
        to = "super::fonctionnaire::Column::Id"
    )]
    Officier,
    #[sea_orm(has_many = "super::document_mariage::Entity")]
    Documents,
    #[sea_orm(has_many = "super::etape_mariage::Entity")]
    Etapes,
    #[sea_orm(has_many = "super::paiement::Entity")]
    Paiements,
}

impl Related<super::document_mariage::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Documents.def()
    }
}

impl Related<super::etape_mariage::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Etapes.def()
    }
}

impl Related<super::paiement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Paiements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub const STATUT_EN_ATTENTE: &str = "en_attente";
pub const STATUT_APPROUVE: &str = "approuvé";
pub const STATUT_REJETE: &str = "rejeté";
pub const STATUT_CELEBRE: &str = "célébré";

/// Statuts d'un dossier de mariage (clé stockée, libellé affiché).
pub fn statuts() -> &'static [(&'static str, &'static str)] {
    &[
        (STATUT_EN_ATTENTE, "En attente"),
        (STATUT_APPROUVE, "Approuvé"),
        (STATUT_REJETE, "Rejeté"),
        (STATUT_CELEBRE, "Célébré"),
    ]
}

/// Régimes matrimoniaux (clé stockée, libellé affiché).
pub fn regimes_matrimoniaux() -> &'static [(&'static str, &'static str)] {
    &[
        ("séparation_de_biens", "Séparation de biens"),
        ("communauté_réduite", "Communauté réduite aux acquêts"),
        ("communauté_universelle", "Communauté universelle"),
        ("participation_aux_acquêts", "Participation aux acquêts"),
    ]
}

/// Machine à états du statut:
/// en_attente → approuvé | rejeté, approuvé → célébré.
/// `rejeté` et `célébré` sont terminaux. Conserver le même statut est
/// toujours permis (mise à jour des autres champs).
pub fn transition_autorisee(de: &str, vers: &str) -> bool {
    de == vers
        || matches!(
            (de, vers),
            (STATUT_EN_ATTENTE, STATUT_APPROUVE)
                | (STATUT_EN_ATTENTE, STATUT_REJETE)
                | (STATUT_APPROUVE, STATUT_CELEBRE)
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions_autorisees() {
        assert!(transition_autorisee(STATUT_EN_ATTENTE, STATUT_APPROUVE));
        assert!(transition_autorisee(STATUT_EN_ATTENTE, STATUT_REJETE));
        assert!(transition_autorisee(STATUT_APPROUVE, STATUT_CELEBRE));
    }

    #[test]
    fn test_etats_terminaux() {
        for vers in [STATUT_EN_ATTENTE, STATUT_APPROUVE, STATUT_CELEBRE] {
            assert!(!transition_autorisee(STATUT_REJETE, vers));
        }
        for vers in [STATUT_EN_ATTENTE, STATUT_APPROUVE, STATUT_REJETE] {
            assert!(!transition_autorisee(STATUT_CELEBRE, vers));
        }
        // Pas de retour en arrière depuis approuvé
        assert!(!transition_autorisee(STATUT_APPROUVE, STATUT_EN_ATTENTE));
        assert!(!transition_autorisee(STATUT_APPROUVE, STATUT_REJETE));
    }

    #[test]
    fn test_statut_identique_toujours_permis() {
        for (statut, _) in statuts() {
            assert!(transition_autorisee(statut, statut));
        }
    }

    #[test]
    fn test_catalogues() {
        assert_eq!(statuts().len(), 4);
        assert_eq!(regimes_matrimoniaux().len(), 4);
        assert!(statuts().iter().any(|(cle, _)| *cle == "approuvé"));
    }
}
