use serde::{Deserialize, Serialize};

use crate::domain::Medicine;

/// Body of the remote medicine listing:
/// `{"arlibmedicines": [{"id": "1", "name": "...", ...}]}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicineListResponse {
    #[serde(rename = "arlibmedicines")]
    pub medicines: Vec<Medicine>,
}
