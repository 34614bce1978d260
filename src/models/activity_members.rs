use serde::{Deserialize, Serialize};

// Join rows between activities and members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityMemberRow {
    #[serde(rename = "actividad_id")]
    pub activity_id: String,
    #[serde(rename = "usuario_id")]
    pub member_id: String,
    #[serde(rename = "asignado_el", default)]
    pub assigned_at: Option<String>,
}
