//! Service-label vocabulary
//!
//! Free-text service labels from the site are mapped onto a closed set of
//! category codes through an explicit lookup table. A label the table does
//! not know is never discarded: it is kept as `Other` with its original
//! text so vocabulary gaps surface in the dataset instead of vanishing.

use crate::model::ServiceCategory;

/// Known label → category pairs, lowercased.
const LABEL_TABLE: [(&str, ServiceCategoryTag); 27] = [
    ("general waste", ServiceCategoryTag::GeneralWaste),
    ("general waste services", ServiceCategoryTag::GeneralWaste),
    ("putrescible waste", ServiceCategoryTag::GeneralWaste),
    ("solid waste", ServiceCategoryTag::GeneralWaste),
    ("recycling", ServiceCategoryTag::Recycling),
    ("commingled recycling", ServiceCategoryTag::Recycling),
    ("paper and cardboard", ServiceCategoryTag::Recycling),
    ("paper & cardboard", ServiceCategoryTag::Recycling),
    ("cardboard recycling", ServiceCategoryTag::Recycling),
    ("organics", ServiceCategoryTag::Organics),
    ("green waste", ServiceCategoryTag::Organics),
    ("garden organics", ServiceCategoryTag::Organics),
    ("food organics", ServiceCategoryTag::Organics),
    ("liquid waste", ServiceCategoryTag::LiquidWaste),
    ("liquids", ServiceCategoryTag::LiquidWaste),
    ("grease trap", ServiceCategoryTag::LiquidWaste),
    ("hazardous waste", ServiceCategoryTag::HazardousWaste),
    ("chemical waste", ServiceCategoryTag::HazardousWaste),
    ("asbestos", ServiceCategoryTag::HazardousWaste),
    ("medical waste", ServiceCategoryTag::MedicalWaste),
    ("clinical waste", ServiceCategoryTag::MedicalWaste),
    ("e-waste", ServiceCategoryTag::EWaste),
    ("ewaste", ServiceCategoryTag::EWaste),
    ("electronic waste", ServiceCategoryTag::EWaste),
    ("skip bins", ServiceCategoryTag::SkipBins),
    ("bin hire", ServiceCategoryTag::SkipBins),
    ("resource recovery", ServiceCategoryTag::ResourceRecovery),
];

/// Table-side tag, const-constructible (ServiceCategory::Other carries a
/// String and cannot appear in a const table).
#[derive(Clone, Copy)]
enum ServiceCategoryTag {
    GeneralWaste,
    Recycling,
    Organics,
    LiquidWaste,
    HazardousWaste,
    MedicalWaste,
    EWaste,
    SkipBins,
    ResourceRecovery,
}

impl From<ServiceCategoryTag> for ServiceCategory {
    fn from(tag: ServiceCategoryTag) -> Self {
        match tag {
            ServiceCategoryTag::GeneralWaste => ServiceCategory::GeneralWaste,
            ServiceCategoryTag::Recycling => ServiceCategory::Recycling,
            ServiceCategoryTag::Organics => ServiceCategory::Organics,
            ServiceCategoryTag::LiquidWaste => ServiceCategory::LiquidWaste,
            ServiceCategoryTag::HazardousWaste => ServiceCategory::HazardousWaste,
            ServiceCategoryTag::MedicalWaste => ServiceCategory::MedicalWaste,
            ServiceCategoryTag::EWaste => ServiceCategory::EWaste,
            ServiceCategoryTag::SkipBins => ServiceCategory::SkipBins,
            ServiceCategoryTag::ResourceRecovery => ServiceCategory::ResourceRecovery,
        }
    }
}

/// Maps a comma-separated label list onto categories.
///
/// Missing or empty text yields `[Unknown]` — the set is never empty.
pub fn map_labels(services_text: Option<&str>) -> Vec<ServiceCategory> {
    let Some(text) = services_text else {
        return vec![ServiceCategory::Unknown];
    };

    let mut categories: Vec<ServiceCategory> = Vec::new();
    for label in text.split(',') {
        let label = label.trim();
        if label.is_empty() {
            continue;
        }
        let category = lookup(label);
        if !categories.contains(&category) {
            categories.push(category);
        }
    }

    if categories.is_empty() {
        return vec![ServiceCategory::Unknown];
    }
    categories
}

fn lookup(label: &str) -> ServiceCategory {
    let key = label.to_lowercase();
    for (known, tag) in LABEL_TABLE {
        if known == key {
            return (tag).into();
        }
    }
    ServiceCategory::Other(label.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_labels_map_to_codes() {
        let categories = map_labels(Some("General Waste, Recycling, Green Waste"));
        assert_eq!(
            categories,
            vec![
                ServiceCategory::GeneralWaste,
                ServiceCategory::Recycling,
                ServiceCategory::Organics,
            ]
        );
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(lookup("RECYCLING"), ServiceCategory::Recycling);
        assert_eq!(lookup("e-Waste"), ServiceCategory::EWaste);
    }

    #[test]
    fn test_unknown_label_is_kept_as_other() {
        let categories = map_labels(Some("General Waste, Tyre Disposal"));
        assert_eq!(
            categories,
            vec![
                ServiceCategory::GeneralWaste,
                ServiceCategory::Other("Tyre Disposal".to_string()),
            ]
        );
    }

    #[test]
    fn test_missing_text_is_unknown() {
        assert_eq!(map_labels(None), vec![ServiceCategory::Unknown]);
        assert_eq!(map_labels(Some("")), vec![ServiceCategory::Unknown]);
        assert_eq!(map_labels(Some(" , ,")), vec![ServiceCategory::Unknown]);
    }

    #[test]
    fn test_duplicate_labels_collapse() {
        let categories = map_labels(Some("Recycling, recycling, Commingled Recycling"));
        assert_eq!(categories, vec![ServiceCategory::Recycling]);
    }
}
