use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Structured Australian street address.
///
/// `raw` always holds the cleaned original text; the components are filled
/// in only when the deterministic parse rules matched. An address that did
/// not parse is retained (with `ServiceLocation::needs_review` set) rather
/// than dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Address {
    pub street: Option<String>,
    pub suburb: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
    pub raw: String,
}

/// Validated geographic coordinates (lat ∈ [-90, 90], lon ∈ [-180, 180]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Optional contact details.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contact {
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Closed vocabulary of offered service categories.
///
/// Labels that do not map to a known code are kept under `Other` together
/// with their original text; an empty set is represented explicitly by
/// `Unknown` so downstream consumers can tell "offers nothing we know of"
/// from "page said nothing".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ServiceCategory {
    GeneralWaste,
    Recycling,
    Organics,
    LiquidWaste,
    HazardousWaste,
    MedicalWaste,
    EWaste,
    SkipBins,
    ResourceRecovery,
    Other(String),
    Unknown,
}

impl ServiceCategory {
    /// Stable code used in the dataset's `categories` column.
    pub fn code(&self) -> String {
        match self {
            ServiceCategory::GeneralWaste => "general_waste".to_string(),
            ServiceCategory::Recycling => "recycling".to_string(),
            ServiceCategory::Organics => "organics".to_string(),
            ServiceCategory::LiquidWaste => "liquid_waste".to_string(),
            ServiceCategory::HazardousWaste => "hazardous_waste".to_string(),
            ServiceCategory::MedicalWaste => "medical_waste".to_string(),
            ServiceCategory::EWaste => "e_waste".to_string(),
            ServiceCategory::SkipBins => "skip_bins".to_string(),
            ServiceCategory::ResourceRecovery => "resource_recovery".to_string(),
            ServiceCategory::Other(label) => format!("other:{}", label),
            ServiceCategory::Unknown => "unknown".to_string(),
        }
    }

    /// Inverse of [`code`](Self::code), used when reading a previously
    /// published dataset back for merging.
    pub fn from_code(code: &str) -> Self {
        if let Some(label) = code.strip_prefix("other:") {
            return ServiceCategory::Other(label.to_string());
        }
        match code {
            "general_waste" => ServiceCategory::GeneralWaste,
            "recycling" => ServiceCategory::Recycling,
            "organics" => ServiceCategory::Organics,
            "liquid_waste" => ServiceCategory::LiquidWaste,
            "hazardous_waste" => ServiceCategory::HazardousWaste,
            "medical_waste" => ServiceCategory::MedicalWaste,
            "e_waste" => ServiceCategory::EWaste,
            "skip_bins" => ServiceCategory::SkipBins,
            "resource_recovery" => ServiceCategory::ResourceRecovery,
            _ => ServiceCategory::Unknown,
        }
    }
}

/// A validated service location: the unit of the published dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceLocation {
    /// Stable identifier derived from the normalized name + address.
    pub id: String,

    pub name: String,
    pub address: Address,
    pub coordinates: Option<Coordinates>,
    pub categories: Vec<ServiceCategory>,
    pub contact: Contact,

    /// Canonicalized operating-hours schedule, when one was found.
    pub hours: Option<String>,

    /// Set when the address text could not be parsed into components.
    pub needs_review: bool,

    pub source_url: String,
    pub last_seen: DateTime<Utc>,
}

impl ServiceLocation {
    /// Field-by-field equality ignoring `last_seen`, used by the merge to
    /// decide whether an incoming record actually changed anything.
    pub fn same_content(&self, other: &ServiceLocation) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.address == other.address
            && self.coordinates == other.coordinates
            && self.categories == other.categories
            && self.contact == other.contact
            && self.hours == other.hours
            && self.needs_review == other.needs_review
            && self.source_url == other.source_url
    }
}

/// Computes the stable identifier for a location.
///
/// The key is the lowercased, whitespace-squeezed name and raw address
/// joined with `|`, hashed with SHA-256; the id is `SVC` plus the first 12
/// hex characters. Case and spacing variations of the same listing collapse
/// to one id across pages and runs.
pub fn stable_id(name: &str, address_raw: &str) -> String {
    let key = format!("{}|{}", squeeze(name), squeeze(address_raw));
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("SVC{}", &digest[..12])
}

fn squeeze(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
