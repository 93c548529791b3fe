//! District contact lookup table.

use hashbrown::HashMap;
use tracing::{info, warn};

use super::LoadError;
use crate::models::ContactInfo;

/// Parse the contact table (a JSON array) into a name-keyed lookup.
///
/// Records without a `DistrictName` are dropped. Keys are matched exactly
/// (case-sensitive) against district names.
pub fn load_contacts(json: &str) -> Result<HashMap<String, ContactInfo>, LoadError> {
    let records: Vec<ContactInfo> = serde_json::from_str(json)?;
    let total = records.len();

    let mut lookup = HashMap::with_capacity(total);
    for record in records {
        let Some(key) = record.key().map(str::to_string) else {
            warn!("Skipping contact info with missing or empty DistrictName");
            continue;
        };
        if lookup.insert(key.clone(), record).is_some() {
            warn!("Duplicate contact info for {}, keeping the later entry", key);
        }
    }

    info!("Loaded contact info for {} of {} records", lookup.len(), total);
    Ok(lookup)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"[
        { "DistrictName": "STAYTON FD", "BurnLinePhone": "503-769-2601", "MainPhone": "503-769-2601" },
        { "DistrictName": "", "BurnLinePhone": "555-0000" },
        { "BurnLinePhone": "555-0001" },
        { "DistrictName": "SUTHERLIN FD", "Website": "https://www.dfpa.net/", "OFCDistrict": "Douglas" }
    ]"#;

    #[test]
    fn test_drops_nameless_entries() {
        let lookup = load_contacts(TABLE).unwrap();
        assert_eq!(lookup.len(), 2);
        assert!(lookup.get("").is_none());
        assert!(lookup
            .values()
            .all(|c| c.burn_line_phone.as_deref() != Some("555-0000")));
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let lookup = load_contacts(TABLE).unwrap();
        assert!(lookup.contains_key("STAYTON FD"));
        assert!(!lookup.contains_key("Stayton FD"));
        assert_eq!(
            lookup["SUTHERLIN FD"].ofc_district.as_deref(),
            Some("Douglas")
        );
    }

    #[test]
    fn test_duplicate_keeps_later() {
        let json = r#"[
            { "DistrictName": "A", "MainPhone": "1" },
            { "DistrictName": "A", "MainPhone": "2" }
        ]"#;
        let lookup = load_contacts(json).unwrap();
        assert_eq!(lookup.len(), 1);
        assert_eq!(lookup["A"].main_phone.as_deref(), Some("2"));
    }

    #[test]
    fn test_malformed_table_is_an_error() {
        assert!(load_contacts("{\"DistrictName\": \"A\"}").is_err());
    }
}
