use serde::{Deserialize, Serialize};

/// Supplier reference data, owned by the registrations module upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    #[serde(rename = "codcad")]
    pub id: i64,
    #[serde(rename = "nomcad")]
    pub name: String,
    #[serde(rename = "doccad", default)]
    pub document: Option<String>,
    #[serde(rename = "statcad")]
    pub status: String,
}

impl Supplier {
    pub fn is_active(&self) -> bool {
        self.status == "ATIVO"
    }
}
