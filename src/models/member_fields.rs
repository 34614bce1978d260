use std::fmt;

use crate::error::RegistryError;

pub const NIP_LEN: usize = 6;

/// Personnel number: exactly six ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Nip(String);

impl Nip {
    pub fn parse(raw: &str) -> Result<Self, RegistryError> {
        let raw = raw.trim();
        if raw.len() != NIP_LEN || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RegistryError::validation(format!(
                "El NIP debe tener exactamente {} dígitos numéricos",
                NIP_LEN
            )));
        }
        Ok(Nip(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Nip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Motorista,
    Patrullas,
    Goa,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Motorista, Section::Patrullas, Section::Goa];

    pub fn as_str(self) -> &'static str {
        match self {
            Section::Motorista => "Motorista",
            Section::Patrullas => "Patrullas",
            Section::Goa => "GOA",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, RegistryError> {
        let raw = raw.trim();
        Section::ALL
            .into_iter()
            .find(|s| s.as_str() == raw)
            .ok_or_else(|| RegistryError::validation(format!("Sección no válida: {}", raw)))
    }
}

/// Work group number, 1 through 9. Stored as "Grupo N".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkGroup(u8);

impl WorkGroup {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 9;

    pub fn all() -> impl Iterator<Item = WorkGroup> {
        (Self::MIN..=Self::MAX).map(WorkGroup)
    }

    pub fn number(self) -> u8 {
        self.0
    }

    pub fn label(self) -> String {
        format!("Grupo {}", self.0)
    }

    pub fn parse(raw: &str) -> Result<Self, RegistryError> {
        let raw = raw.trim();
        raw.strip_prefix("Grupo ")
            .and_then(|n| n.parse::<u8>().ok())
            .filter(|n| (Self::MIN..=Self::MAX).contains(n))
            .map(WorkGroup)
            .ok_or_else(|| {
                RegistryError::validation(format!("Grupo de trabajo no válido: {}", raw))
            })
    }
}

/// Columns the search view can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Nip,
    Name,
    Surname,
    Section,
    WorkGroup,
}

impl SearchField {
    pub const ALL: [SearchField; 5] = [
        SearchField::Nip,
        SearchField::Name,
        SearchField::Surname,
        SearchField::Section,
        SearchField::WorkGroup,
    ];

    pub fn column(self) -> &'static str {
        match self {
            SearchField::Nip => "nip",
            SearchField::Name => "nombre",
            SearchField::Surname => "apellidos",
            SearchField::Section => "seccion",
            SearchField::WorkGroup => "grupo_trabajo",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SearchField::Nip => "NIP",
            SearchField::Name => "Nombre",
            SearchField::Surname => "Apellidos",
            SearchField::Section => "Sección",
            SearchField::WorkGroup => "Grupo de trabajo",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        SearchField::ALL
            .into_iter()
            .find(|f| f.column() == raw.trim())
    }

    /// NIP is the unique key and is matched exactly; everything else is a
    /// case-insensitive substring match.
    pub fn is_exact(self) -> bool {
        matches!(self, SearchField::Nip)
    }
}
