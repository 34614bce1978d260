use thiserror::Error;

/// Failures reported by a record store backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unreachable: {0}")]
    Unreachable(String),

    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("foreign key violated: {0}")]
    ForeignKeyViolation(String),

    #[error("store rejected request ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    #[error("unexpected store payload: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Decode(e.to_string())
    }
}

/// Errors surfaced by the registry services. Display strings are shown to
/// the operator as-is.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("{0}")]
    Validation(String),

    #[error("Ya existe un usuario con el NIP {nip}")]
    Duplicate { nip: String },

    #[error("No se encontró el registro {id}")]
    NotFound { id: String },

    #[error("Error al acceder a la base de datos: {0}")]
    Store(#[from] StoreError),
}

impl RegistryError {
    pub fn validation(message: impl Into<String>) -> Self {
        RegistryError::Validation(message.into())
    }

    pub fn is_connectivity(&self) -> bool {
        matches!(self, RegistryError::Store(StoreError::Unreachable(_)))
    }
}
