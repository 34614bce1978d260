use serde::{Deserialize, Serialize};

/// Row of `usuarios_gimnasio`. Column names are the store's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRow {
    pub id: String,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "apellidos")]
    pub surname: String,
    pub nip: String,
    #[serde(rename = "seccion")]
    pub section: String,
    #[serde(rename = "grupo_trabajo")]
    pub workgroup: String,
    #[serde(rename = "fecha_registro", default)]
    pub created_at: Option<String>,
    #[serde(
        rename = "actualizado_el",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<String>,
}

impl MemberRow {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.surname)
    }

    /// "NIP - Nombre Apellidos", used in selectors.
    pub fn display_label(&self) -> String {
        format!("{} - {}", self.nip, self.full_name())
    }
}

/// Editable columns written by an update.
#[derive(Debug, Clone, Serialize)]
pub struct MemberChanges<'a> {
    #[serde(rename = "nombre")]
    pub name: &'a str,
    #[serde(rename = "apellidos")]
    pub surname: &'a str,
    pub nip: &'a str,
    #[serde(rename = "seccion")]
    pub section: &'a str,
    #[serde(rename = "grupo_trabajo")]
    pub workgroup: &'a str,
    #[serde(rename = "actualizado_el")]
    pub updated_at: &'a str,
}
