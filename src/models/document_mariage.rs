use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Document émis pour un dossier de mariage (certificat, bulletin, acte...).
///
/// `livre` indique si le document a été remis; dans ce cas `date_livraison`
/// et `livre_par` sont obligatoires (règle inter-champs validée en amont).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "document_mariages")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip_serializing)]
    pub id: i32,
    #[sea_orm(unique)]
    pub r#ref: String,
    pub mariage_id: i32,
    pub type_document: String,
    #[sea_orm(unique)]
    pub numero_document: String,
    pub date_emission: Date,
    pub date_expiration: Option<Date>,
    pub fichier: Option<String>,
    pub livre: bool,
    pub date_livraison: Option<Date>,
    pub livre_par: Option<i32>,
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
        from = "Column::LivrePar",
        to = "super::fonctionnaire::Column::Id"
    )]
    LivrePar,
}

impl Related<super::mariage::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Mariage.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Types de documents de mariage (clé stockée, libellé affiché).
pub fn types_documents() -> &'static [(&'static str, &'static str)] {
    &[
        ("certificat_celibat", "Certificat de célibat"),
        ("bulletin_mariage", "Bulletin de mariage"),
        ("copie_acte_mariage", "Copie d'acte de mariage"),
        ("attestation_mariage", "Attestation de mariage"),
        ("autre", "Autre document"),
    ]
}
