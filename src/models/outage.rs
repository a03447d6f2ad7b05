use serde::{Deserialize, Deserializer, Serialize};

/// One outage record from the NES map feed.
///
/// Every poll returns the complete current snapshot; records appear and
/// disappear between polls as outages are created and resolved, so a new
/// snapshot always replaces the previous one wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outage {
    /// Stable unique id. The feed serializes this as either a JSON string
    /// or a bare number depending on the event source.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Display code shown on the map; may differ from `id`.
    #[serde(default)]
    pub identifier: Option<String>,
    /// Free-text status, e.g. "Assigned", "Unassigned", "Crew On Site".
    #[serde(default)]
    pub status: Option<String>,
    /// Number of customers affected.
    #[serde(rename = "numPeople", default)]
    pub num_people: u32,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Epoch milliseconds.
    #[serde(rename = "startTime", default)]
    pub start_time: Option<i64>,
    /// Epoch milliseconds.
    #[serde(rename = "lastUpdatedTime", default)]
    pub last_updated_time: Option<i64>,
    #[serde(default)]
    pub cause: Option<String>,
}

impl Outage {
    /// True when the record carries both coordinates and can be geocoded
    /// or placed on a map.
    pub fn has_location(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(i64),
    }

    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_record() {
        let json = r#"{
            "id": "OUT-1001",
            "identifier": "1001",
            "status": "Assigned",
            "numPeople": 245,
            "latitude": 36.1627,
            "longitude": -86.7816,
            "startTime": 1724900000000,
            "lastUpdatedTime": 1724903600000,
            "cause": "Tree on line"
        }"#;

        let outage: Outage = serde_json::from_str(json).unwrap();
        assert_eq!(outage.id, "OUT-1001");
        assert_eq!(outage.num_people, 245);
        assert_eq!(outage.status.as_deref(), Some("Assigned"));
        assert!(outage.has_location());
    }

    #[test]
    fn test_deserialize_numeric_id() {
        let json = r#"{"id": 4242, "numPeople": 3}"#;
        let outage: Outage = serde_json::from_str(json).unwrap();
        assert_eq!(outage.id, "4242");
    }

    #[test]
    fn test_deserialize_sparse_record() {
        // The feed occasionally omits everything but the id
        let json = r#"{"id": "X"}"#;
        let outage: Outage = serde_json::from_str(json).unwrap();
        assert_eq!(outage.num_people, 0);
        assert!(outage.status.is_none());
        assert!(!outage.has_location());
    }
}
