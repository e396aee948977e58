use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Citoyen enregistré à l'état civil.
///
/// `id` est la clé interne, jamais exposée; `ref` est l'identifiant opaque
/// externe (UUID), unique et immuable après création.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "citoyens")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip_serializing)]
    pub id: i32,
    #[sea_orm(unique)]
    pub r#ref: String,
    pub nom: String,
    pub postnom: String,
    pub prenom: String,
    pub sexe: String,
    pub date_naissance: Date,
    pub lieu_naissance: String,
    pub etat_civil: String,
    pub profession: String,
    pub adresse: String,
    pub nom_pere: String,
    pub nom_mere: String,
    #[sea_orm(unique, nullable)]
    pub numero_identification_national: Option<String>,
    pub photo: Option<String>,
    pub created_by: Option<i32>,
    pub updated_by: Option<i32>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

// Un citoyen peut être partie à des mariages via homme_id ou femme_id; la
// double clé rend la relation dérivée ambiguë, les services joignent
// explicitement.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub const SEXES: &[&str] = &["M", "F"];

/// États civils acceptés (clé stockée = libellé affiché pour ce catalogue).
pub const ETATS_CIVILS: &[&str] = &["Célibataire", "Marié(e)", "Divorcé(e)", "Veuf/Veuve"];

impl Model {
    pub fn nom_complet(&self) -> String {
        format!("{} {} {}", self.nom, self.postnom, self.prenom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogues_fermes() {
        assert_eq!(SEXES, &["M", "F"]);
        assert!(ETATS_CIVILS.contains(&"Célibataire"));
        assert!(ETATS_CIVILS.contains(&"Veuf/Veuve"));
        assert_eq!(ETATS_CIVILS.len(), 4);
    }
}
