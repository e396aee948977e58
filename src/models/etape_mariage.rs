use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Étape procédurale d'un dossier de mariage (dépôt, publication des bans,
/// célébration...), avec un responsable optionnel.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "etape_mariages")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip_serializing)]
    pub id: i32,
    #[sea_orm(unique)]
    pub r#ref: String,
    pub mariage_id: i32,
    pub etape: String,
    pub statut: String,
    pub date_debut: Option<Date>,
    pub date_fin: Option<Date>,
    pub responsable_id: Option<i32>,
    pub commentaires: Option<String>,
    pub created_by: Option<i32>,
    pub updated_by: Option<i32>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::mariage::Entity",
        from = "Column::MariageId",
        to = "super::mariage::Column::Id"
    )]
    Mariage,
    #[sea_orm(
        belongs_to = "super::fonctionnaire::Entity",
        from = "Column::ResponsableId",
        to = "super::fonctionnaire::Column::Id"
    )]
    Responsable,
}

impl Related<super::mariage::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Mariage.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Étapes de la procédure de mariage (clé stockée, libellé affiché).
pub fn etapes() -> &'static [(&'static str, &'static str)] {
    &[
        ("depot_dossier", "Dépôt du dossier"),
        ("paiement", "Paiement des frais"),
        ("publication_bans", "Publication des bans"),
        ("verification", "Vérification des documents"),
        ("celebration", "Célébration du mariage"),
        ("enregistrement", "Enregistrement civil"),
        ("livraison_acte", "Livraison de l'acte"),
    ]
}

/// Statuts d'une étape (clé stockée, libellé affiché).
pub fn statuts() -> &'static [(&'static str, &'static str)] {
    &[
        ("en_attente", "En attente"),
        ("en_cours", "En cours"),
        ("complet", "Complété"),
        ("rejete", "Rejeté"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogues() {
        assert_eq!(etapes().len(), 7);
        assert_eq!(statuts().len(), 4);
        assert!(etapes().iter().any(|(cle, _)| *cle == "publication_bans"));
    }
}
