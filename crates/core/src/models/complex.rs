use serde::{Deserialize, Serialize};

/// One apartment hit from the keyword search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Bare complex name as matched (e.g., "광안자이")
    pub text: String,

    /// Name qualified with its district, used as the key for the detail lookup
    /// (e.g., "(수영구 광안동)광안자이")
    pub display_name: String,

    /// Short district address (e.g., "수영구 광안동")
    pub address: String,
}

/// Resolved details of an apartment complex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexDetails {
    /// Provider-assigned complex id
    pub complex_id: String,

    pub name: String,

    /// Lot-number address
    pub address: String,

    /// Road-name address, when the provider has one
    pub road_address: Option<String>,

    /// Number of households in the complex, when known
    pub households: Option<u32>,
}

/// A floor-plan/size variant within a complex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitType {
    /// Provider-assigned area id, passed back when requesting price history
    pub type_id: String,

    /// Exclusive (private) floor area in m²
    pub exclusive_area_sqm: f64,

    /// Supply floor area in m², including shared space
    pub supply_area_sqm: f64,

    /// Floor-plan label (e.g., "84A"), when the provider has one
    pub type_label: Option<String>,

    pub households: Option<u32>,
}

impl UnitType {
    /// Exclusive area with unit, as used in export file names (e.g., "84.97㎡").
    pub fn area_label(&self) -> String {
        format!("{}㎡", format_area(self.exclusive_area_sqm))
    }

    /// Picker label: exclusive area with the supply area in parentheses.
    pub fn display_label(&self) -> String {
        format!(
            "{}㎡ ({}㎡)",
            format_area(self.exclusive_area_sqm),
            format_area(self.supply_area_sqm)
        )
    }
}

/// Areas print without a trailing `.0` for whole numbers.
fn format_area(sqm: f64) -> String {
    if sqm.fract() == 0.0 {
        format!("{sqm:.0}")
    } else {
        sqm.to_string()
    }
}

/// Metadata written into an exported report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub apartment_name: String,
    pub address: String,
    pub unit_area_label: String,
}

impl Selection {
    pub fn new(
        apartment_name: impl Into<String>,
        address: impl Into<String>,
        unit_area_label: impl Into<String>,
    ) -> Self {
        Self {
            apartment_name: apartment_name.into(),
            address: address.into(),
            unit_area_label: unit_area_label.into(),
        }
    }

    pub fn from_parts(complex: &ComplexDetails, unit: &UnitType) -> Self {
        Self::new(complex.name.clone(), complex.address.clone(), unit.area_label())
    }
}
