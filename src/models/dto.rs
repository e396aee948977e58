// ============================================================================
// DTO - PAYLOADS DE REQUÊTE ET RÉPONSES STRUCTURÉES
// ============================================================================
//
// Description:
//   Data Transfer Objects de l'API: payloads de création/mise à jour (validés
//   avec `validator`), filtres de listing, et objets d'affichage (références
//   résolues en noms complets).
//
// Points d'attention:
//   - Les règles de validation reprennent le tableau des champs de chaque
//     entité: champs requis, appartenance aux catalogues, règles inter-champs
//     (date_expiration après date_emission, conjoints distincts, champs de
//     livraison requis quand livre = true).
//   - L'appartenance aux catalogues référence les constantes des modèles:
//     aucune liste n'est dupliquée ici.
//
// ============================================================================

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::{citoyen, document_mariage, etape_mariage, mariage, paiement, piece_jointe};

fn erreur(code: &'static str, message: &'static str) -> ValidationError {
    let mut e = ValidationError::new(code);
    e.message = Some(message.into());
    e
}

// ---------------------------------------------------------------------------
// Authentification
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Adresse email invalide"))]
    pub email: String,
    #[validate(length(min = 1, message = "Le mot de passe est requis"))]
    pub password: String,
}

// ---------------------------------------------------------------------------
// Fichiers uploadés
// ---------------------------------------------------------------------------

/// Fichier transmis dans le payload JSON, contenu encodé en base64.
#[derive(Debug, Clone, Deserialize)]
pub struct FichierUpload {
    pub nom: String,
    pub contenu: String,
}

// ---------------------------------------------------------------------------
// Citoyens
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct CitoyenRequest {
    #[validate(length(min = 1, max = 255, message = "Le nom est requis"))]
    pub nom: String,
    #[validate(length(min = 1, max = 255, message = "Le postnom est requis"))]
    pub postnom: String,
    #[validate(length(min = 1, max = 255, message = "Le prénom est requis"))]
    pub prenom: String,
    #[validate(custom(function = "valider_sexe"))]
    pub sexe: String,
    pub date_naissance: NaiveDate,
    #[validate(length(min = 1, max = 255, message = "Le lieu de naissance est requis"))]
    pub lieu_naissance: String,
    #[validate(custom(function = "valider_etat_civil"))]
    pub etat_civil: String,
    #[validate(length(min = 1, max = 255, message = "La profession est requise"))]
    pub profession: String,
    #[validate(length(min = 1, max = 255, message = "L'adresse est requise"))]
    pub adresse: String,
    #[validate(length(min = 1, max = 255, message = "Le nom du père est requis"))]
    pub nom_pere: String,
    #[validate(length(min = 1, max = 255, message = "Le nom de la mère est requis"))]
    pub nom_mere: String,
    #[validate(length(max = 255))]
    pub numero_identification_national: Option<String>,
    pub photo: Option<FichierUpload>,
}

fn valider_sexe(valeur: &str) -> Result<(), ValidationError> {
    if citoyen::SEXES.contains(&valeur) {
        Ok(())
    } else {
        Err(erreur("sexe", "Le sexe doit être M ou F"))
    }
}

fn valider_etat_civil(valeur: &str) -> Result<(), ValidationError> {
    if citoyen::ETATS_CIVILS.contains(&valeur) {
        Ok(())
    } else {
        Err(erreur("etat_civil", "État civil inconnu"))
    }
}

// ---------------------------------------------------------------------------
// Fonctionnaires
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct FonctionnaireRequest {
    #[validate(length(min = 1, max = 255, message = "Le nom est requis"))]
    pub nom: String,
    #[validate(length(min = 1, max = 255, message = "Le postnom est requis"))]
    pub postnom: String,
    #[validate(length(min = 1, max = 255, message = "Le prénom est requis"))]
    pub prenom: String,
    #[validate(length(min = 1, max = 255, message = "La fonction est requise"))]
    pub fonction: String,
    #[validate(length(min = 1, max = 255, message = "Le grade est requis"))]
    pub grade: String,
    #[validate(length(min = 1, max = 255, message = "Le matricule est requis"))]
    pub matricule: String,
    #[validate(email(message = "Adresse email invalide"))]
    pub email: String,
    #[validate(length(min = 1, max = 255, message = "Le téléphone est requis"))]
    pub telephone: String,
    pub date_embauche: NaiveDate,
    pub photo: Option<FichierUpload>,
}

// ---------------------------------------------------------------------------
// Mariages
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "valider_conjoints_distincts"))]
pub struct MariageRequest {
    pub homme_id: i32,
    pub femme_id: i32,
    pub date_mariage: NaiveDate,
    pub heure_mariage: NaiveTime,
    pub officier_id: i32,
    #[validate(length(min = 1, max = 255, message = "Le lieu du mariage est requis"))]
    pub lieu_mariage: String,
    #[validate(custom(function = "valider_regime_matrimonial"))]
    pub regime_matrimonial: String,
    #[validate(custom(function = "valider_temoins"))]
    pub temoins_homme: Option<Vec<String>>,
    #[validate(custom(function = "valider_temoins"))]
    pub temoins_femme: Option<Vec<String>>,
    #[validate(custom(function = "valider_statut_mariage"))]
    pub statut: String,
    pub notes: Option<String>,
}

fn valider_conjoints_distincts(payload: &MariageRequest) -> Result<(), ValidationError> {
    if payload.homme_id == payload.femme_id {
        Err(erreur(
            "femme_id",
            "Les deux conjoints doivent être des citoyens différents",
        ))
    } else {
        Ok(())
    }
}

fn valider_regime_matrimonial(valeur: &str) -> Result<(), ValidationError> {
    if mariage::regimes_matrimoniaux()
        .iter()
        .any(|(cle, _)| *cle == valeur)
    {
        Ok(())
    } else {
        Err(erreur("regime_matrimonial", "Régime matrimonial inconnu"))
    }
}

fn valider_statut_mariage(valeur: &str) -> Result<(), ValidationError> {
    if mariage::statuts().iter().any(|(cle, _)| *cle == valeur) {
        Ok(())
    } else {
        Err(erreur("statut", "Statut de mariage inconnu"))
    }
}

fn valider_temoins(temoins: &[String]) -> Result<(), ValidationError> {
    if temoins.iter().any(|t| t.is_empty() || t.len() > 255) {
        Err(erreur(
            "temoins",
            "Chaque témoin doit être un nom de 1 à 255 caractères",
        ))
    } else {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Documents de mariage
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "valider_document_mariage"))]
pub struct DocumentMariageRequest {
    pub mariage_id: i32,
    #[validate(custom(function = "valider_type_document"))]
    pub type_document: String,
    #[validate(length(min = 1, max = 255, message = "Le numéro de document est requis"))]
    pub numero_document: String,
    pub date_emission: NaiveDate,
    pub date_expiration: Option<NaiveDate>,
    pub fichier: Option<FichierUpload>,
    #[serde(default)]
    pub livre: bool,
    pub date_livraison: Option<NaiveDate>,
    pub livre_par: Option<i32>,
}

fn valider_type_document(valeur: &str) -> Result<(), ValidationError> {
    if document_mariage::types_documents()
        .iter()
        .any(|(cle, _)| *cle == valeur)
    {
        Ok(())
    } else {
        Err(erreur("type_document", "Type de document inconnu"))
    }
}

fn valider_document_mariage(payload: &DocumentMariageRequest) -> Result<(), ValidationError> {
    if let Some(expiration) = payload.date_expiration {
        if expiration <= payload.date_emission {
            return Err(erreur(
                "date_expiration",
                "La date d'expiration doit être postérieure à la date d'émission",
            ));
        }
    }
    if payload.livre {
        if payload.date_livraison.is_none() {
            return Err(erreur(
                "date_livraison",
                "La date de livraison est requise quand le document est livré",
            ));
        }
        if payload.livre_par.is_none() {
            return Err(erreur(
                "livre_par",
                "Le fonctionnaire livreur est requis quand le document est livré",
            ));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Étapes de mariage
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "valider_dates_etape"))]
pub struct EtapeMariageRequest {
    pub mariage_id: i32,
    #[validate(custom(function = "valider_etape"))]
    pub etape: String,
    #[validate(custom(function = "valider_statut_etape"))]
    pub statut: String,
    pub date_debut: Option<NaiveDate>,
    pub date_fin: Option<NaiveDate>,
    pub responsable_id: Option<i32>,
    pub commentaires: Option<String>,
}

fn valider_etape(valeur: &str) -> Result<(), ValidationError> {
    if etape_mariage::etapes().iter().any(|(cle, _)| *cle == valeur) {
        Ok(())
    } else {
        Err(erreur("etape", "Étape inconnue"))
    }
}

fn valider_statut_etape(valeur: &str) -> Result<(), ValidationError> {
    if etape_mariage::statuts()
        .iter()
        .any(|(cle, _)| *cle == valeur)
    {
        Ok(())
    } else {
        Err(erreur("statut", "Statut d'étape inconnu"))
    }
}

fn valider_dates_etape(payload: &EtapeMariageRequest) -> Result<(), ValidationError> {
    if let (Some(debut), Some(fin)) = (payload.date_debut, payload.date_fin) {
        if fin < debut {
            return Err(erreur(
                "date_fin",
                "La date de fin doit être égale ou postérieure à la date de début",
            ));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Paiements
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePaiementRequest {
    pub mariage_id: i32,
    #[validate(range(min = 0.0, message = "Le montant doit être positif ou nul"))]
    pub montant: f64,
    #[validate(custom(function = "valider_mode_paiement"))]
    pub mode_paiement: String,
    #[validate(length(min = 1, max = 255, message = "La référence de paiement est requise"))]
    pub reference_paiement: String,
    pub date_paiement: NaiveDate,
    #[validate(custom(function = "valider_statut_paiement"))]
    pub statut: String,
    pub encaisser_par: i32,
    pub notes: Option<String>,
}

/// La mise à jour ne permet pas de rattacher le paiement à un autre mariage.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePaiementRequest {
    #[validate(range(min = 0.0, message = "Le montant doit être positif ou nul"))]
    pub montant: f64,
    #[validate(custom(function = "valider_mode_paiement"))]
    pub mode_paiement: String,
    #[validate(length(min = 1, max = 255, message = "La référence de paiement est requise"))]
    pub reference_paiement: String,
    pub date_paiement: NaiveDate,
    #[validate(custom(function = "valider_statut_paiement"))]
    pub statut: String,
    pub encaisser_par: i32,
    pub notes: Option<String>,
}

fn valider_mode_paiement(valeur: &str) -> Result<(), ValidationError> {
    if paiement::MODES_PAIEMENT.contains(&valeur) {
        Ok(())
    } else {
        Err(erreur("mode_paiement", "Mode de paiement inconnu"))
    }
}

fn valider_statut_paiement(valeur: &str) -> Result<(), ValidationError> {
    if paiement::STATUTS.contains(&valeur) {
        Ok(())
    } else {
        Err(erreur("statut", "Statut de paiement inconnu"))
    }
}

// ---------------------------------------------------------------------------
// Pièces jointes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "valider_dates_piece_creation"))]
pub struct CreatePieceJointeRequest {
    /// Tag du propriétaire: "citoyen" ou "mariage".
    pub attachable_type: String,
    pub attachable_id: i32,
    #[validate(custom(function = "valider_type_piece"))]
    pub type_piece: String,
    #[validate(length(min = 1, max = 255, message = "Le numéro de pièce est requis"))]
    pub numero_piece: String,
    pub fichier: FichierUpload,
    pub date_emission: NaiveDate,
    pub date_expiration: Option<NaiveDate>,
}

/// Le propriétaire ne change pas après création; le fichier est optionnel
/// (remplacé seulement s'il est fourni).
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "valider_dates_piece_maj"))]
pub struct UpdatePieceJointeRequest {
    #[validate(custom(function = "valider_type_piece"))]
    pub type_piece: String,
    #[validate(length(min = 1, max = 255, message = "Le numéro de pièce est requis"))]
    pub numero_piece: String,
    pub fichier: Option<FichierUpload>,
    pub date_emission: NaiveDate,
    pub date_expiration: Option<NaiveDate>,
}

fn valider_type_piece(valeur: &str) -> Result<(), ValidationError> {
    if piece_jointe::types_pieces()
        .iter()
        .any(|(cle, _)| *cle == valeur)
    {
        Ok(())
    } else {
        Err(erreur("type_piece", "Type de pièce inconnu"))
    }
}

fn valider_dates_piece(
    emission: NaiveDate,
    expiration: Option<NaiveDate>,
) -> Result<(), ValidationError> {
    if let Some(expiration) = expiration {
        if expiration <= emission {
            return Err(erreur(
                "date_expiration",
                "La date d'expiration doit être postérieure à la date d'émission",
            ));
        }
    }
    Ok(())
}

fn valider_dates_piece_creation(payload: &CreatePieceJointeRequest) -> Result<(), ValidationError> {
    valider_dates_piece(payload.date_emission, payload.date_expiration)
}

fn valider_dates_piece_maj(payload: &UpdatePieceJointeRequest) -> Result<(), ValidationError> {
    valider_dates_piece(payload.date_emission, payload.date_expiration)
}

// ---------------------------------------------------------------------------
// Filtres de listing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FiltresCitoyens {
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FiltresFonctionnaires {
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FiltresMariages {
    pub search: Option<String>,
    pub statut: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FiltresDocuments {
    pub search: Option<String>,
    pub type_document: Option<String>,
    pub livre: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FiltresEtapes {
    pub search: Option<String>,
    pub etape: Option<String>,
    pub statut: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FiltresPaiements {
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FiltresPiecesJointes {
    pub search: Option<String>,
    pub type_piece: Option<String>,
}

// ---------------------------------------------------------------------------
// Réponses structurées
// ---------------------------------------------------------------------------

/// Page de résultats. `filtres` renvoie les filtres actifs tels quels pour
/// que l'appelant les réinjecte dans la requête de la page suivante.
#[derive(Debug, Serialize)]
pub struct Page<T: Serialize, F: Serialize> {
    pub donnees: Vec<T>,
    pub page: u64,
    pub par_page: u64,
    pub total: u64,
    pub total_pages: u64,
    pub filtres: F,
}

/// Référence affichable d'un enregistrement lié: ref externe + libellé.
#[derive(Debug, Clone, Serialize)]
pub struct ReferenceAffichage {
    pub r#ref: String,
    pub libelle: String,
}

/// Fiche détaillée: l'enregistrement lui-même, plus les noms des comptes
/// créateur et dernier modificateur.
#[derive(Debug, Serialize)]
pub struct FicheDetail<T: Serialize> {
    #[serde(flatten)]
    pub fiche: T,
    pub cree_par: Option<String>,
    pub modifie_par: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MariageAffichage {
    pub r#ref: String,
    pub homme: Option<ReferenceAffichage>,
    pub femme: Option<ReferenceAffichage>,
    pub officier: Option<ReferenceAffichage>,
    pub date_mariage: NaiveDate,
    pub heure_mariage: NaiveTime,
    pub lieu_mariage: String,
    pub regime_matrimonial: String,
    pub temoins_homme: Option<serde_json::Value>,
    pub temoins_femme: Option<serde_json::Value>,
    pub statut: String,
    pub notes: Option<String>,
    pub cree_par: Option<String>,
    pub modifie_par: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct DocumentMariageAffichage {
    pub r#ref: String,
    pub mariage: Option<ReferenceAffichage>,
    pub type_document: String,
    pub numero_document: String,
    pub date_emission: NaiveDate,
    pub date_expiration: Option<NaiveDate>,
    pub fichier: Option<String>,
    pub livre: bool,
    pub date_livraison: Option<NaiveDate>,
    pub livre_par: Option<ReferenceAffichage>,
    pub cree_par: Option<String>,
    pub modifie_par: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct EtapeMariageAffichage {
    pub r#ref: String,
    pub mariage: Option<ReferenceAffichage>,
    pub etape: String,
    pub statut: String,
    pub date_debut: Option<NaiveDate>,
    pub date_fin: Option<NaiveDate>,
    pub responsable: Option<ReferenceAffichage>,
    pub commentaires: Option<String>,
    pub cree_par: Option<String>,
    pub modifie_par: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct PaiementAffichage {
    pub r#ref: String,
    pub mariage: Option<ReferenceAffichage>,
    pub montant: String,
    pub mode_paiement: String,
    pub reference_paiement: String,
    pub date_paiement: NaiveDate,
    pub statut: String,
    pub encaisseur: Option<ReferenceAffichage>,
    pub notes: Option<String>,
    pub cree_par: Option<String>,
    pub modifie_par: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct PieceJointeAffichage {
    pub r#ref: String,
    /// Propriétaire résolu: tag + référence + libellé affichable.
    pub attachable_type: String,
    pub proprietaire: Option<ReferenceAffichage>,
    pub type_piece: String,
    pub numero_piece: String,
    pub fichier: String,
    pub date_emission: NaiveDate,
    pub date_expiration: Option<NaiveDate>,
    pub cree_par: Option<String>,
    pub modifie_par: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document_valide() -> DocumentMariageRequest {
        DocumentMariageRequest {
            mariage_id: 1,
            type_document: "certificat_celibat".into(),
            numero_document: "DOC-1".into(),
            date_emission: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            date_expiration: None,
            fichier: None,
            livre: false,
            date_livraison: None,
            livre_par: None,
        }
    }

    #[test]
    fn test_document_expiration_avant_emission_refusee() {
        let mut payload = document_valide();
        payload.date_expiration = Some(NaiveDate::from_ymd_opt(2025, 1, 5).unwrap());
        assert!(payload.validate().is_err());

        payload.date_expiration = Some(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn test_document_livre_exige_livraison() {
        let mut payload = document_valide();
        payload.livre = true;
        assert!(payload.validate().is_err());

        payload.date_livraison = Some(NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
        assert!(payload.validate().is_err());

        payload.livre_par = Some(3);
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn test_document_type_inconnu_refuse() {
        let mut payload = document_valide();
        payload.type_document = "permis_conduire".into();
        assert!(payload.validate().is_err());
    }

    fn mariage_valide() -> MariageRequest {
        MariageRequest {
            homme_id: 1,
            femme_id: 2,
            date_mariage: NaiveDate::from_ymd_opt(2026, 9, 12).unwrap(),
            heure_mariage: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
            officier_id: 1,
            lieu_mariage: "Hôtel de ville".into(),
            regime_matrimonial: "communauté_universelle".into(),
            temoins_homme: Some(vec!["Kabongo Ilunga".into()]),
            temoins_femme: None,
            statut: "en_attente".into(),
            notes: None,
        }
    }

    #[test]
    fn test_mariage_conjoints_identiques_refuses() {
        let mut payload = mariage_valide();
        payload.femme_id = payload.homme_id;
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_mariage_statut_inconnu_refuse() {
        let mut payload = mariage_valide();
        payload.statut = "annulé".into();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_mariage_valide_accepte() {
        assert!(mariage_valide().validate().is_ok());
    }

    #[test]
    fn test_paiement_montant_negatif_refuse() {
        let payload = CreatePaiementRequest {
            mariage_id: 1,
            montant: -5.0,
            mode_paiement: "Espèces".into(),
            reference_paiement: "PAY-0001".into(),
            date_paiement: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            statut: "payé".into(),
            encaisser_par: 1,
            notes: None,
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_paiement_mode_inconnu_refuse() {
        let payload = CreatePaiementRequest {
            mariage_id: 1,
            montant: 100_000.0,
            mode_paiement: "Troc".into(),
            reference_paiement: "PAY-0001".into(),
            date_paiement: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            statut: "payé".into(),
            encaisser_par: 1,
            notes: None,
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_etape_date_fin_avant_debut_refusee() {
        let payload = EtapeMariageRequest {
            mariage_id: 1,
            etape: "publication_bans".into(),
            statut: "en_cours".into(),
            date_debut: Some(NaiveDate::from_ymd_opt(2025, 4, 10).unwrap()),
            date_fin: Some(NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()),
            responsable_id: None,
            commentaires: None,
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_etape_dates_egales_acceptees() {
        let jour = NaiveDate::from_ymd_opt(2025, 4, 10).unwrap();
        let payload = EtapeMariageRequest {
            mariage_id: 1,
            etape: "verification".into(),
            statut: "complet".into(),
            date_debut: Some(jour),
            date_fin: Some(jour),
            responsable_id: Some(2),
            commentaires: Some("Dossier conforme".into()),
        };
        assert!(payload.validate().is_ok());
    }
}
