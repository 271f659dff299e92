// crates/shared-kernel/src/infrastructure/postgres/mappers/postgres_error_mapper.rs

use crate::errors::DomainError;

pub trait SqlxErrorExt<T> {
    /// Traduit les erreurs sqlx en erreurs du domaine pour `entity` :
    /// ligne absente, violation d'unicité, conflit de sérialisation.
    fn map_domain(self, entity: &'static str) -> Result<T, DomainError>;

    /// Traduction brute en erreur d'infrastructure avec préfixe d'opération
    fn map_domain_infra(self, context: &'static str) -> Result<T, DomainError>;
}

impl<T> SqlxErrorExt<T> for std::result::Result<T, sqlx::Error> {
    fn map_domain(self, entity: &'static str) -> Result<T, DomainError> {
        self.map_err(|e| match e {
            sqlx::Error::RowNotFound => DomainError::NotFound {
                entity,
                id: "unknown".into(),
            },
            sqlx::Error::Database(db_err) => {
                // 1. Violation d'unicité (Code Postgres 23505)
                if db_err.code().map(|c| c == "23505").unwrap_or(false) {
                    return DomainError::AlreadyExists {
                        entity,
                        field: "unique_constraint",
                        value: db_err.constraint().unwrap_or("unknown").to_string(),
                    };
                }

                // 2. Conflit de sérialisation (Code Postgres 40001)
                if db_err.code().map(|c| c == "40001").unwrap_or(false) {
                    return DomainError::ConcurrencyConflict {
                        reason: format!("Concurrency conflict on {entity}"),
                    };
                }

                DomainError::Infrastructure(db_err.message().into())
            }
            _ => DomainError::Infrastructure(e.to_string()),
        })
    }

    fn map_domain_infra(self, context: &'static str) -> Result<T, DomainError> {
        self.map_err(|e| DomainError::Infrastructure(format!("{}: {}", context, e)))
    }
}
