// crates/shared-kernel/src/errors/domain_error.rs

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Validation failed for field '{field}': {reason}")]
    Validation {
        field: &'static str,
        reason: String,
    },

    #[error("{entity} not found with id '{id}'")]
    NotFound {
        entity: &'static str,
        id: String,
    },

    #[error("{entity} already exists with {field} = '{value}'")]
    AlreadyExists {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    /// Erreur de concurrence (conflit de sérialisation Postgres)
    #[error("Concurrency conflict: {reason}")]
    ConcurrencyConflict {
        reason: String,
    },

    /// Échec définitif après épuisement du moteur de retry.
    /// Conserve la dernière erreur observée pour l'inspection de la chaîne.
    #[error("Retry exhausted after {max_attempts} attempts: {source}")]
    RetryExhausted {
        max_attempts: u32,
        #[source]
        source: Box<DomainError>,
    },

    /// L'opération a été interrompue par le signal d'annulation
    #[error("Operation cancelled")]
    Cancelled,

    /// Une ligne relue depuis le store ne passe plus la validation du domaine
    #[error("Stored {entity} failed domain validation: {reason}")]
    DataCorruption {
        entity: &'static str,
        reason: String,
    },

    /// Erreur liée à l'infrastructure (DB, bus de messages)
    #[error("Infrastructure failure: {0}")]
    Infrastructure(String),

    /// Erreur générique interne
    #[error("Internal domain error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Utilisé pour savoir si l'erreur est un rejeu idempotent (ex: 23505 sur idempotency_key)
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }

    pub fn is_retry_exhausted(&self) -> bool {
        matches!(self, Self::RetryExhausted { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Descend la chaîne des causes jusqu'à l'erreur d'origine.
    /// Permet à la couche de bord de retrouver un NotFound derrière un RetryExhausted.
    pub fn root_cause(&self) -> &DomainError {
        match self {
            Self::RetryExhausted { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
