use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::MedicineIdError;

/// Stable identifier of a medicine record. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MedicineId(String);

impl MedicineId {
    pub fn new(raw: impl Into<String>) -> Result<Self, MedicineIdError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(MedicineIdError::Empty);
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MedicineId {
    type Error = MedicineIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MedicineId> for String {
    fn from(value: MedicineId) -> Self {
        value.0
    }
}

impl fmt::Display for MedicineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medicine {
    pub id: MedicineId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dose: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Medicine {
    pub fn new(id: MedicineId) -> Self {
        Self {
            id,
            name: None,
            dose: None,
            strength: None,
            description: None,
        }
    }
}
