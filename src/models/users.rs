use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Compte utilisateur du système. Chaque fonctionnaire est apparié 1:1 avec un
/// compte (créés ensemble, supprimés ensemble): le compte porte l'identité
/// d'authentification, la fiche fonctionnaire porte les attributs métier.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)] // Ne jamais exposer le hash en JSON
    pub password_hash: String, // Format: pbkdf2:sha256:iterations$salt$hash
    pub role: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::fonctionnaire::Entity")]
    Fonctionnaire,
}

impl Related<super::fonctionnaire::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Fonctionnaire.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
