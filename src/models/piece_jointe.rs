use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Pièce jointe polymorphe: appartient soit à un citoyen, soit à un mariage,
/// via la paire (attachable_type, attachable_id). Le jeu de propriétaires est
/// fermé — voir [`crate::services::piece_jointe_service::Attachable`].
///
/// `numero_piece` n'est volontairement pas unique: deux pièces distinctes
/// peuvent porter le même numéro (ex: CNI recto/verso re-déposée).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "piece_jointes")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip_serializing)]
    pub id: i32,
    #[sea_orm(unique)]
    pub r#ref: String,
    pub attachable_type: String,
    pub attachable_id: i32,
    pub type_piece: String,
    pub numero_piece: String,
    pub fichier: String,
    pub date_emission: Date,
    pub date_expiration: Option<Date>,
    pub created_by: Option<i32>,
    pub updated_by: Option<i32>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

// Le propriétaire est résolu par dispatch sur attachable_type, pas par une
// relation dérivée.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Types de pièces jointes (clé stockée, libellé affiché).
pub fn types_pieces() -> &'static [(&'static str, &'static str)] {
    &[
        ("cni", "Carte Nationale d'Identité"),
        ("acte_naissance", "Acte de naissance"),
        ("certificat_celibat", "Certificat de célibat"),
        ("bulletin_mariage", "Bulletin de mariage"),
        ("justificatif_domicile", "Justificatif de domicile"),
        ("autre", "Autre document"),
    ]
}
