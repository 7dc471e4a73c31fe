//! Plain-text list and detail views.

use shared::domain::Medicine;

const MISSING: &str = "N/A";

fn field(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(MISSING)
}

pub fn medicine_card(medicine: &Medicine) -> String {
    format!(
        "[{}]\nName: {}\nDose: {}\nStrength: {}",
        medicine.id,
        field(&medicine.name),
        field(&medicine.dose),
        field(&medicine.strength),
    )
}

pub fn medicine_list(medicines: &[Medicine]) -> String {
    if medicines.is_empty() {
        return "No medicines cached yet; sign in to fetch the list.".to_string();
    }
    medicines
        .iter()
        .map(medicine_card)
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn medicine_detail(medicine: &Medicine) -> String {
    format!(
        "Name: {}\nDose: {}\nStrength: {}\nDescription: {}",
        field(&medicine.name),
        field(&medicine.dose),
        field(&medicine.strength),
        field(&medicine.description),
    )
}
