//! Pure filter, search, and sort pipeline for the outage list.
//!
//! `apply_filters` composes the three stages in a fixed order - status,
//! then search, then sort. The order matters: with ties, sorting before
//! filtering would surface different rows, so keep it as is.

use std::collections::HashMap;

use crate::models::{Address, Outage};

/// Sort order for the displayed list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortBy {
    /// Descending `num_people`.
    #[default]
    MostAffected,
    /// Newest `start_time` first.
    Recent,
    /// Oldest `start_time` first.
    Oldest,
    /// Newest `last_updated_time` first.
    LastUpdated,
}

impl SortBy {
    /// Parse the option keys used on the wire and the command line.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "most-affected" => Some(SortBy::MostAffected),
            "recent" => Some(SortBy::Recent),
            "oldest" => Some(SortBy::Oldest),
            "last-updated" => Some(SortBy::LastUpdated),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    pub query: String,
    /// Free-text status token; "all" or empty disables the filter.
    pub status: String,
    pub sort_by: SortBy,
}

/// Keep outages whose status contains the filter token, case-insensitive.
/// "all" or an empty filter is a no-op.
pub fn filter_by_status(outages: &[Outage], status_filter: &str) -> Vec<Outage> {
    if status_filter.is_empty() || status_filter == "all" {
        return outages.to_vec();
    }

    let token = status_filter.to_lowercase();
    outages
        .iter()
        .filter(|o| status_matches(o.status.as_deref().unwrap_or(""), &token))
        .cloned()
        .collect()
}

/// Substring match, except that occurrences inside the "un"-negated form
/// do not count: an "Unassigned" status must not match the "assigned"
/// filter.
pub(crate) fn status_matches(status: &str, token: &str) -> bool {
    let status = status.to_lowercase();
    let negated = format!("un{}", token);
    status.matches(token).count() > status.matches(negated.as_str()).count()
}

/// Case-insensitive substring search over outage ids and any resolved
/// address fields. An outage matches if any field matches.
pub fn search_outages(
    outages: &[Outage],
    query: &str,
    addresses: &HashMap<String, Address>,
) -> Vec<Outage> {
    let term = query.trim().to_lowercase();
    if term.is_empty() {
        return outages.to_vec();
    }

    outages
        .iter()
        .filter(|o| {
            if o.id.to_lowercase().contains(&term) {
                return true;
            }
            if let Some(identifier) = &o.identifier {
                if identifier.to_lowercase().contains(&term) {
                    return true;
                }
            }
            if let Some(addr) = addresses.get(&o.id) {
                return [
                    &addr.street,
                    &addr.city,
                    &addr.zip,
                    &addr.neighborhood,
                    &addr.formatted,
                ]
                .iter()
                .any(|field| field.to_lowercase().contains(&term));
            }
            false
        })
        .cloned()
        .collect()
}

/// Stable sort; missing numeric fields compare as 0.
pub fn sort_outages(outages: &[Outage], sort_by: SortBy) -> Vec<Outage> {
    let mut sorted = outages.to_vec();

    match sort_by {
        SortBy::MostAffected => {
            sorted.sort_by(|a, b| b.num_people.cmp(&a.num_people));
        }
        SortBy::Recent => {
            sorted.sort_by(|a, b| {
                b.start_time.unwrap_or(0).cmp(&a.start_time.unwrap_or(0))
            });
        }
        SortBy::Oldest => {
            sorted.sort_by(|a, b| {
                a.start_time.unwrap_or(0).cmp(&b.start_time.unwrap_or(0))
            });
        }
        SortBy::LastUpdated => {
            sorted.sort_by(|a, b| {
                b.last_updated_time
                    .unwrap_or(0)
                    .cmp(&a.last_updated_time.unwrap_or(0))
            });
        }
    }

    sorted
}

/// Derive the displayed view: status filter, then text search, then sort.
pub fn apply_filters(
    outages: &[Outage],
    options: &FilterOptions,
    addresses: &HashMap<String, Address>,
) -> Vec<Outage> {
    let filtered = filter_by_status(outages, &options.status);
    let searched = search_outages(&filtered, &options.query, addresses);
    sort_outages(&searched, options.sort_by)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outage(id: &str, num_people: u32, status: Option<&str>) -> Outage {
        Outage {
            id: id.to_string(),
            identifier: None,
            status: status.map(|s| s.to_string()),
            num_people,
            latitude: None,
            longitude: None,
            start_time: None,
            last_updated_time: None,
            cause: None,
        }
    }

    fn ids(outages: &[Outage]) -> Vec<&str> {
        outages.iter().map(|o| o.id.as_str()).collect()
    }

    #[test]
    fn test_status_all_is_noop() {
        let outages = vec![outage("1", 1, Some("Assigned")), outage("2", 2, None)];
        assert_eq!(filter_by_status(&outages, "all").len(), 2);
        assert_eq!(filter_by_status(&outages, "").len(), 2);
    }

    #[test]
    fn test_status_filter_case_insensitive() {
        let outages = vec![
            outage("1", 100, Some("Unassigned")),
            outage("2", 500, Some("Assigned")),
        ];
        // "assigned" must not swallow the Unassigned row
        assert_eq!(ids(&filter_by_status(&outages, "assigned")), vec!["2"]);
        assert_eq!(ids(&filter_by_status(&outages, "unassigned")), vec!["1"]);
        assert_eq!(ids(&filter_by_status(&outages, "ASSIGNED")), vec!["2"]);
    }

    #[test]
    fn test_status_filter_plain_substring() {
        let outages = vec![
            outage("1", 1, Some("Crew On Site")),
            outage("2", 2, Some("Restored")),
        ];
        assert_eq!(ids(&filter_by_status(&outages, "crew")), vec!["1"]);
        assert_eq!(ids(&filter_by_status(&outages, "restored")), vec!["2"]);
    }

    #[test]
    fn test_search_by_zip_in_address() {
        let outages = vec![outage("1", 1, None), outage("2", 2, None)];
        let mut addresses = HashMap::new();
        addresses.insert(
            "1".to_string(),
            Address {
                zip: "37206".to_string(),
                ..Address::default()
            },
        );
        addresses.insert(
            "2".to_string(),
            Address {
                zip: "37215".to_string(),
                ..Address::default()
            },
        );

        assert_eq!(ids(&search_outages(&outages, "37206", &addresses)), vec!["1"]);
    }

    #[test]
    fn test_search_matches_id_and_identifier() {
        let mut with_code = outage("OUT-77", 1, None);
        with_code.identifier = Some("E4411".to_string());
        let outages = vec![with_code, outage("OUT-88", 2, None)];
        let addresses = HashMap::new();

        assert_eq!(ids(&search_outages(&outages, "out-77", &addresses)), vec!["OUT-77"]);
        assert_eq!(ids(&search_outages(&outages, "e44", &addresses)), vec!["OUT-77"]);
    }

    #[test]
    fn test_blank_query_is_noop() {
        let outages = vec![outage("1", 1, None)];
        assert_eq!(search_outages(&outages, "   ", &HashMap::new()).len(), 1);
    }

    #[test]
    fn test_sort_most_affected_missing_fields_as_zero() {
        let outages = vec![outage("small", 10, None), outage("big", 500, None)];
        let sorted = sort_outages(&outages, SortBy::MostAffected);
        assert_eq!(ids(&sorted), vec!["big", "small"]);
    }

    #[test]
    fn test_sort_is_stable_on_ties() {
        let outages = vec![
            outage("first", 100, None),
            outage("second", 100, None),
            outage("third", 100, None),
        ];
        let sorted = sort_outages(&outages, SortBy::MostAffected);
        assert_eq!(ids(&sorted), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_sort_by_start_time() {
        let mut older = outage("older", 1, None);
        older.start_time = Some(1_000);
        let mut newer = outage("newer", 1, None);
        newer.start_time = Some(2_000);
        let missing = outage("missing", 1, None); // treated as 0

        let outages = vec![older, newer, missing];
        assert_eq!(
            ids(&sort_outages(&outages, SortBy::Recent)),
            vec!["newer", "older", "missing"]
        );
        assert_eq!(
            ids(&sort_outages(&outages, SortBy::Oldest)),
            vec!["missing", "older", "newer"]
        );
    }

    #[test]
    fn test_sort_by_last_updated() {
        let mut stale = outage("stale", 1, None);
        stale.last_updated_time = Some(5);
        let mut fresh = outage("fresh", 1, None);
        fresh.last_updated_time = Some(50);

        let sorted = sort_outages(&[stale, fresh], SortBy::LastUpdated);
        assert_eq!(ids(&sorted), vec!["fresh", "stale"]);
    }

    #[test]
    fn test_apply_filters_scenario() {
        let outages = vec![
            outage("1", 100, Some("Unassigned")),
            outage("2", 500, Some("Assigned")),
        ];
        let options = FilterOptions {
            query: String::new(),
            status: "assigned".to_string(),
            sort_by: SortBy::MostAffected,
        };
        let result = apply_filters(&outages, &options, &HashMap::new());
        assert_eq!(ids(&result), vec!["2"]);

        let options = FilterOptions {
            status: "unassigned".to_string(),
            ..options
        };
        let result = apply_filters(&outages, &options, &HashMap::new());
        assert_eq!(ids(&result), vec!["1"]);
    }

    #[test]
    fn test_apply_filters_is_idempotent() {
        let outages = vec![
            outage("a", 10, Some("Assigned")),
            outage("b", 500, None),
            outage("c", 10, Some("Assigned")),
        ];
        let options = FilterOptions::default();
        let addresses = HashMap::new();

        let once = apply_filters(&outages, &options, &addresses);
        let twice = apply_filters(&once, &options, &addresses);
        assert_eq!(ids(&once), ids(&twice));
    }

    #[test]
    fn test_unfiltered_most_affected_ordering() {
        let outages = vec![outage("big", 500, None), outage("small", 10, None)];
        let result = apply_filters(
            &filter_by_status(&outages, "all"),
            &FilterOptions::default(),
            &HashMap::new(),
        );
        assert_eq!(ids(&result), vec!["big", "small"]);
    }

    #[test]
    fn test_sort_by_parse() {
        assert_eq!(SortBy::parse("most-affected"), Some(SortBy::MostAffected));
        assert_eq!(SortBy::parse("recent"), Some(SortBy::Recent));
        assert_eq!(SortBy::parse("oldest"), Some(SortBy::Oldest));
        assert_eq!(SortBy::parse("last-updated"), Some(SortBy::LastUpdated));
        assert_eq!(SortBy::parse("bogus"), None);
    }
}
