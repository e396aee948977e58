use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Paiement des frais d'un mariage.
///
/// Invariant: un paiement n'est créé que si le mariage est `approuvé` au
/// moment de l'écriture — pré-vérifié à la validation et re-vérifié sous
/// verrou dans la transaction d'insertion (voir PaiementService).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "paiements")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip_serializing)]
    pub id: i32,
    #[sea_orm(unique)]
    pub r#ref: String,
    pub mariage_id: i32,
    pub montant: Decimal,
    pub mode_paiement: String,
    #[sea_orm(unique)]
    pub reference_paiement: String,
    pub date_paiement: Date,
    pub statut: String,
    pub encaisser_par: i32,
    pub notes: Option<String>,
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
        from = "Column::EncaisserPar",
        to = "super::fonctionnaire::Column::Id"
    )]
    Encaisseur,
}

impl Related<super::mariage::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Mariage.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Modes de paiement acceptés (la clé stockée est le libellé).
pub const MODES_PAIEMENT: &[&str] = &[
    "Espèces",
    "Mobile Money",
    "Carte Bancaire",
    "Virement",
    "Chèque",
];

/// Statuts d'un paiement (la clé stockée est le libellé).
pub const STATUTS: &[&str] = &["payé", "impayé", "remboursé"];
