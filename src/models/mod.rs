// ============================================================================
// MODELS - MODULE PRINCIPAL
// ============================================================================
//
// Description:
//   Point d'entrée pour tous les modèles de données.
//   Chaque modèle correspond à une table PostgreSQL avec SeaORM.
//
// Liste des modules:
//   - citoyen          : Citoyens enregistrés à l'état civil
//   - fonctionnaire    : Fonctionnaires (appariés 1:1 à un compte users)
//   - mariage          : Dossiers de mariage + machine à états du statut
//   - document_mariage : Documents émis pour un mariage
//   - etape_mariage    : Étapes procédurales d'un dossier
//   - paiement         : Paiements des frais de mariage
//   - piece_jointe     : Pièces jointes polymorphes (citoyen ou mariage)
//   - users            : Comptes utilisateurs (authentification)
//   - dto              : Payloads validés, filtres et objets d'affichage
//
// Points d'attention:
//   - Tous les modèles utilisent SeaORM (pas de SQL brut)
//   - Les catalogues d'énumérations (statuts, types, régimes...) vivent dans
//     le module du modèle concerné, comme constantes de processus
//   - `id` est interne; seul `ref` (UUID) est exposé à l'extérieur
//
// ============================================================================

pub mod citoyen;
pub mod document_mariage;
pub mod dto;
pub mod etape_mariage;
pub mod fonctionnaire;
pub mod mariage;
pub mod paiement;
pub mod piece_jointe;
pub mod users;
