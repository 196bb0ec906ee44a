use std::error::Error as StdError;

use thiserror::Error;

use crate::{
    application::{catalog::CatalogError, documents::DocumentError},
    infra::error::InfraError,
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Message safe to show to the person at the counter.
    pub fn presentation_message(&self) -> &'static str {
        match self {
            AppError::Document(err) => err.public_message(),
            AppError::Catalog(CatalogError::NotFound { .. }) => "Registro no encontrado",
            AppError::Catalog(CatalogError::Validation { .. }) | AppError::Validation(_) => {
                "La solicitud no pudo procesarse"
            }
            AppError::Infra(_) | AppError::Catalog(_) | AppError::Unexpected(_) => {
                "Ocurrió un error inesperado"
            }
        }
    }

    /// Full cause chain for operator logs.
    pub fn report(&self) -> Vec<String> {
        let mut messages = vec![self.to_string()];
        let mut current = StdError::source(self);
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        messages
    }
}
