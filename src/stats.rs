//! Summary statistics over the current outage snapshot.

use crate::filters::status_matches;
use crate::models::Outage;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutageStats {
    pub total_outages: usize,
    pub total_affected: u64,
    pub unassigned: usize,
    pub assigned: usize,
    /// Mean affected count, rounded to the nearest whole customer.
    pub average_affected: u64,
    pub largest_outage: u32,
}

impl OutageStats {
    pub fn compute(outages: &[Outage]) -> Self {
        let total_outages = outages.len();
        let total_affected: u64 = outages.iter().map(|o| u64::from(o.num_people)).sum();

        let status_of = |o: &Outage| o.status.clone().unwrap_or_default();
        let unassigned = outages
            .iter()
            .filter(|o| status_matches(&status_of(o), "unassigned"))
            .count();
        let assigned = outages
            .iter()
            .filter(|o| status_matches(&status_of(o), "assigned"))
            .count();

        let average_affected = if total_outages > 0 {
            (total_affected as f64 / total_outages as f64).round() as u64
        } else {
            0
        };

        let largest_outage = outages.iter().map(|o| o.num_people).max().unwrap_or(0);

        Self {
            total_outages,
            total_affected,
            unassigned,
            assigned,
            average_affected,
            largest_outage,
        }
    }
}
