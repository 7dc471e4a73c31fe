use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MedicineIdError {
    #[error("medicine id must not be empty")]
    Empty,
}
