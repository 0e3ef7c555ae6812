/// An unvalidated record as extracted from a page.
///
/// Every field is text straight out of the markup; nothing has been trimmed,
/// parsed, or checked yet. A listing card produces a partial record (name,
/// address, detail URL); the detail page fills in the rest. Records are
/// ephemeral and never persisted in this form beyond the raw capture.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    pub name: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,

    /// Free-text service labels, comma-separated as the site renders them.
    pub services: Option<String>,

    pub phone: Option<String>,
    pub email: Option<String>,
    pub hours: Option<String>,

    /// The page this record came from (the detail URL once known).
    pub source_url: String,
}

impl RawRecord {
    /// Seed record from a listing card: just a name, an address, and where
    /// the detail page lives.
    pub fn from_card(name: String, address: Option<String>, detail_url: String) -> Self {
        RawRecord {
            name: Some(name),
            address,
            source_url: detail_url,
            ..RawRecord::default()
        }
    }
}
