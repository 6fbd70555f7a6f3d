pub mod enums;
pub mod medication;

pub use enums::{DoseForm, InvalidEnum, Meal, MealRelation};
pub use medication::{format_amount, Medication, PatientContext};
