use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Fonctionnaire de l'état civil, apparié 1:1 à un compte utilisateur.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "fonctionnaires")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip_serializing)]
    pub id: i32,
    #[sea_orm(unique)]
    pub r#ref: String,
    pub nom: String,
    pub postnom: String,
    pub prenom: String,
    pub fonction: String,
    pub grade: String,
    #[sea_orm(unique)]
    pub matricule: String,
    #[sea_orm(unique)]
    pub email: String,
    pub telephone: String,
    pub date_embauche: Date,
    pub photo: Option<String>,
    #[serde(skip_serializing)]
    pub user_id: i32,
    pub created_by: Option<i32>,
    pub updated_by: Option<i32>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Fonctions proposées par le formulaire de création (liste indicative,
/// le champ reste un libellé libre).
pub const FONCTIONS: &[&str] = &[
    "Maire",
    "Officier d'état civil",
    "Secrétaire",
    "Agent administratif",
    "Autre",
];

impl Model {
    pub fn nom_complet(&self) -> String {
        format!("{} {} {}", self.nom, self.postnom, self.prenom)
    }
}
