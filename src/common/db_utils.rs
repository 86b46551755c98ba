// src/common/db_utils.rs

use crate::common::error::AppError;

/// Converte violação de chave estrangeira em NotFound com a mensagem dada.
pub(crate) fn map_fk_violation(e: sqlx::Error, message: impl Into<String>) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_foreign_key_violation() {
            return AppError::NotFound(message.into());
        }
    }
    e.into()
}

/// Converte violação de unicidade em InvalidTransition com a mensagem dada.
pub(crate) fn map_unique_violation(e: sqlx::Error, message: impl Into<String>) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::InvalidTransition(message.into());
        }
    }
    e.into()
}
