//! Read side for the list and detail views.

use std::sync::Arc;

use anyhow::Result;
use shared::domain::{Medicine, MedicineId};
use storage::MedicineStore;
use tokio::sync::watch;

pub struct MedicineCatalog {
    store: Arc<dyn MedicineStore>,
    medicines: watch::Sender<Vec<Medicine>>,
}

impl MedicineCatalog {
    pub fn new(store: Arc<dyn MedicineStore>) -> Self {
        let (medicines, _) = watch::channel(Vec::new());
        Self { store, medicines }
    }

    /// Reloads the list snapshot from the store and notifies subscribers.
    pub async fn refresh(&self) -> Result<Vec<Medicine>> {
        let medicines = self.store.get_all().await?;
        self.medicines.send_replace(medicines.clone());
        Ok(medicines)
    }

    /// Last loaded list; empty until the first [`MedicineCatalog::refresh`].
    pub fn medicines(&self) -> Vec<Medicine> {
        self.medicines.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Medicine>> {
        self.medicines.subscribe()
    }

    pub async fn medicine_details(&self, id: &MedicineId) -> Result<Option<Medicine>> {
        self.store.get_by_id(id).await
    }
}
