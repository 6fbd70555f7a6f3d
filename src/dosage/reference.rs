//! Reference tables for dose checks: unit families, per-form safe ranges,
//! per-drug mass ranges, and conditions that call for dose reduction.

use serde::{Deserialize, Serialize};

use crate::models::DoseForm;

use super::types::DosageError;

// ═══════════════════════════════════════════════════════════
// Units
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitFamily {
    Count,
    Volume,
    Mass,
    Puff,
    Drop,
    Application,
    InternationalUnit,
}

/// A recognised unit: its family, the canonical unit of that family, and
/// the factor that converts one of this unit into canonical units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unit {
    pub family: UnitFamily,
    pub canonical: &'static str,
    pub factor: f64,
}

const fn unit(family: UnitFamily, canonical: &'static str, factor: f64) -> Unit {
    Unit {
        family,
        canonical,
        factor,
    }
}

/// Parse a unit label ("mg", "Tablets", "tsp", "µg").
pub fn parse_unit(label: &str) -> Option<Unit> {
    let lower = label.trim().to_lowercase();
    let u = match lower.as_str() {
        "tablet" | "tablets" | "tab" | "tabs" => unit(UnitFamily::Count, "tablet", 1.0),
        "capsule" | "capsules" | "cap" | "caps" => unit(UnitFamily::Count, "capsule", 1.0),
        "ml" | "milliliter" | "milliliters" | "millilitre" | "millilitres" | "cc" => {
            unit(UnitFamily::Volume, "ml", 1.0)
        }
        "l" | "liter" | "liters" | "litre" | "litres" => unit(UnitFamily::Volume, "ml", 1000.0),
        "tsp" | "teaspoon" | "teaspoons" => unit(UnitFamily::Volume, "ml", 5.0),
        "tbsp" | "tablespoon" | "tablespoons" => unit(UnitFamily::Volume, "ml", 15.0),
        "mg" | "milligram" | "milligrams" => unit(UnitFamily::Mass, "mg", 1.0),
        "g" | "gram" | "grams" => unit(UnitFamily::Mass, "mg", 1000.0),
        "mcg" | "ug" | "µg" | "microgram" | "micrograms" => unit(UnitFamily::Mass, "mg", 0.001),
        "puff" | "puffs" | "inhalation" | "inhalations" => unit(UnitFamily::Puff, "puff", 1.0),
        "drop" | "drops" | "gtt" | "gtts" => unit(UnitFamily::Drop, "drop", 1.0),
        "application" | "applications" | "apply" => unit(UnitFamily::Application, "application", 1.0),
        "unit" | "units" | "iu" => unit(UnitFamily::InternationalUnit, "unit", 1.0),
        _ => return None,
    };
    Some(u)
}

/// Convert an amount to milligrams when the unit is a mass unit.
pub fn to_mg(amount: f64, unit_label: &str) -> Option<f64> {
    parse_unit(unit_label)
        .filter(|u| u.family == UnitFamily::Mass)
        .map(|u| amount * u.factor)
}

/// Format a milligram value for display.
pub fn format_dose_mg(mg: f64) -> String {
    if mg >= 1000.0 {
        format!("{}g", mg / 1000.0)
    } else if mg < 1.0 {
        format!("{}mcg", (mg * 1000.0).round())
    } else {
        format!("{}mg", mg)
    }
}

// ═══════════════════════════════════════════════════════════
// Per-form ranges
// ═══════════════════════════════════════════════════════════

/// Safe range for one unit family of a dose form, in canonical units.
#[derive(Debug, Clone, Copy)]
pub struct FamilyRange {
    pub family: UnitFamily,
    pub min: f64,
    pub max: f64,
    pub whole_only: bool,
    /// Singular canonical label used in suggestions.
    pub label: &'static str,
}

#[derive(Debug)]
pub struct FormRule {
    pub form: DoseForm,
    /// First entry is the form's primary family.
    pub ranges: &'static [FamilyRange],
    /// Mass doses are accepted and checked against the per-drug table.
    pub mass_allowed: bool,
}

impl FormRule {
    pub fn primary(&self) -> &FamilyRange {
        &self.ranges[0]
    }

    pub fn range_for(&self, family: UnitFamily) -> Option<&FamilyRange> {
        self.ranges.iter().find(|r| r.family == family)
    }

    pub fn allows(&self, family: UnitFamily) -> bool {
        (family == UnitFamily::Mass && self.mass_allowed) || self.range_for(family).is_some()
    }
}

const fn range(family: UnitFamily, min: f64, max: f64, whole_only: bool, label: &'static str) -> FamilyRange {
    FamilyRange {
        family,
        min,
        max,
        whole_only,
        label,
    }
}

static FORM_RULES: &[FormRule] = &[
    FormRule {
        form: DoseForm::Tablet,
        ranges: &[range(UnitFamily::Count, 1.0, 4.0, true, "tablet")],
        mass_allowed: true,
    },
    FormRule {
        form: DoseForm::Capsule,
        ranges: &[range(UnitFamily::Count, 1.0, 4.0, true, "capsule")],
        mass_allowed: true,
    },
    FormRule {
        form: DoseForm::Liquid,
        ranges: &[range(UnitFamily::Volume, 1.0, 30.0, false, "ml")],
        mass_allowed: true,
    },
    FormRule {
        form: DoseForm::Injection,
        ranges: &[
            range(UnitFamily::Volume, 0.1, 10.0, false, "ml"),
            range(UnitFamily::InternationalUnit, 1.0, 100.0, true, "unit"),
        ],
        mass_allowed: true,
    },
    FormRule {
        form: DoseForm::Inhaler,
        ranges: &[range(UnitFamily::Puff, 1.0, 4.0, true, "puff")],
        mass_allowed: true,
    },
    FormRule {
        form: DoseForm::Drops,
        ranges: &[range(UnitFamily::Drop, 1.0, 10.0, true, "drop")],
        mass_allowed: false,
    },
    FormRule {
        form: DoseForm::Topical,
        ranges: &[range(UnitFamily::Application, 1.0, 4.0, true, "application")],
        mass_allowed: false,
    },
];

pub fn form_rule(form: DoseForm) -> &'static FormRule {
    FORM_RULES
        .iter()
        .find(|r| r.form == form)
        .unwrap_or(&FORM_RULES[0])
}

// ═══════════════════════════════════════════════════════════
// Conditions requiring dose reduction
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    Renal,
    Hepatic,
}

#[derive(Debug)]
pub struct ConditionRule {
    pub label: &'static str,
    pub keywords: &'static [&'static str],
    pub adjustment: Adjustment,
    /// Multiplier applied to the maximum single dose.
    pub factor: f64,
}

pub static CONDITION_RULES: &[ConditionRule] = &[
    ConditionRule {
        label: "renal impairment",
        keywords: &["kidney", "renal", "ckd", "dialysis"],
        adjustment: Adjustment::Renal,
        factor: 0.5,
    },
    ConditionRule {
        label: "hepatic impairment",
        keywords: &["liver", "hepatic", "cirrhosis", "hepatitis"],
        adjustment: Adjustment::Hepatic,
        factor: 0.5,
    },
];

// ═══════════════════════════════════════════════════════════
// Per-drug ranges
// ═══════════════════════════════════════════════════════════

/// Plausible dose range for a medication (loadable from dose_ranges.json).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoseRange {
    pub generic_name: String,
    pub min_single_dose_mg: f64,
    pub max_single_dose_mg: f64,
    pub max_daily_dose_mg: f64,
    pub common_doses: Vec<String>,
    #[serde(default)]
    pub renal_adjust: bool,
    #[serde(default)]
    pub hepatic_adjust: bool,
}

impl DoseRange {
    pub fn requires(&self, adjustment: Adjustment) -> bool {
        match adjustment {
            Adjustment::Renal => self.renal_adjust,
            Adjustment::Hepatic => self.hepatic_adjust,
        }
    }
}

/// Loaded per-drug reference ranges.
#[derive(Debug, Clone, Default)]
pub struct DoseReference {
    pub dose_ranges: Vec<DoseRange>,
}

impl DoseReference {
    /// Load reference ranges from a JSON file holding a list of `DoseRange`.
    pub fn load(path: &std::path::Path) -> Result<Self, DosageError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| DosageError::ReferenceDataLoad(path.display().to_string(), e.to_string()))?;
        let dose_ranges: Vec<DoseRange> = serde_json::from_str(&json)
            .map_err(|e| DosageError::ReferenceDataParse(path.display().to_string(), e.to_string()))?;
        Ok(Self { dose_ranges })
    }

    /// Ranges bundled with the crate.
    pub fn builtin() -> Self {
        let r = |name: &str, min: f64, max: f64, daily: f64, common: &[&str], renal: bool, hepatic: bool| DoseRange {
            generic_name: name.into(),
            min_single_dose_mg: min,
            max_single_dose_mg: max,
            max_daily_dose_mg: daily,
            common_doses: common.iter().map(|s| s.to_string()).collect(),
            renal_adjust: renal,
            hepatic_adjust: hepatic,
        };
        Self {
            dose_ranges: vec![
                r("metformin", 250.0, 1000.0, 2550.0, &["500mg", "850mg", "1000mg"], true, false),
                r("lisinopril", 2.5, 40.0, 80.0, &["5mg", "10mg", "20mg", "40mg"], true, false),
                r("atorvastatin", 10.0, 80.0, 80.0, &["10mg", "20mg", "40mg", "80mg"], false, true),
                r("amoxicillin", 250.0, 1000.0, 3000.0, &["250mg", "500mg", "875mg"], true, false),
                r("warfarin", 1.0, 10.0, 15.0, &["2mg", "5mg", "7.5mg"], false, true),
                r("ibuprofen", 200.0, 800.0, 3200.0, &["200mg", "400mg", "600mg", "800mg"], true, true),
                r("acetaminophen", 325.0, 1000.0, 4000.0, &["325mg", "500mg", "650mg", "1000mg"], false, true),
                r("aspirin", 81.0, 1000.0, 4000.0, &["81mg", "325mg", "500mg"], true, false),
                r("sertraline", 25.0, 200.0, 200.0, &["25mg", "50mg", "100mg"], false, true),
                r("levothyroxine", 0.025, 0.3, 0.3, &["25mcg", "50mcg", "100mcg"], false, false),
                r("prednisone", 1.0, 80.0, 80.0, &["5mg", "10mg", "20mg", "40mg"], false, false),
            ],
        }
    }

    /// Look up the range for a medication name. Matches the generic name
    /// exactly or as the first word ("Metformin ER" finds metformin).
    pub fn get_dose_range(&self, medication_name: &str) -> Option<&DoseRange> {
        let lower = medication_name.trim().to_lowercase();
        let first = lower.split_whitespace().next().unwrap_or_default();
        self.dose_ranges.iter().find(|d| {
            let generic = d.generic_name.to_lowercase();
            generic == lower || generic == first
        })
    }
}
