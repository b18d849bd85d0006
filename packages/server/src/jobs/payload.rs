//! Versioned prospect payload.
//!
//! The full ordered prospect collection persists as a single JSON blob with a
//! `schema_version` tag so future row-shape changes can be migrated instead
//! of silently dropped.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::prospect::Prospect;

/// Current payload schema version.
pub const PAYLOAD_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProspectPayload {
    pub schema_version: u32,
    pub prospects: Vec<Prospect>,
}

impl ProspectPayload {
    pub fn new(prospects: Vec<Prospect>) -> Self {
        Self {
            schema_version: PAYLOAD_SCHEMA_VERSION,
            prospects,
        }
    }

    /// Number of rows still pending.
    pub fn pending_count(&self) -> usize {
        self.prospects.iter().filter(|p| p.is_pending()).count()
    }

    /// Stable indices of pending rows, in payload order.
    pub fn pending_indices(&self) -> Vec<u32> {
        self.prospects
            .iter()
            .filter(|p| p.is_pending())
            .map(|p| p.index)
            .collect()
    }

    /// Look up a row by its stable index.
    pub fn get_mut(&mut self, index: u32) -> Option<&mut Prospect> {
        self.prospects.iter_mut().find(|p| p.index == index)
    }

    pub fn get(&self, index: u32) -> Option<&Prospect> {
        self.prospects.iter().find(|p| p.index == index)
    }

    /// Detect a row-count mismatch against the job's declared total.
    ///
    /// A mismatch is an integrity fault in the persisted payload. It is
    /// logged and processing continues with what was loaded; it is never
    /// silently corrected.
    pub fn check_integrity(&self, job_id: uuid::Uuid, declared_total: i32) -> bool {
        let loaded = self.prospects.len();
        if loaded as i64 != declared_total as i64 {
            warn!(
                job_id = %job_id,
                declared_total,
                loaded,
                "prospect payload row count does not match declared total"
            );
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::prospect::{ProspectInput, ProspectStatus};

    fn payload(n: u32) -> ProspectPayload {
        let prospects = (1..=n)
            .map(|i| {
                Prospect::from_input(
                    i,
                    ProspectInput {
                        first_name: format!("P{}", i),
                        company: "Acme".into(),
                        website: "acme.example.com".into(),
                        ..Default::default()
                    },
                )
            })
            .collect();
        ProspectPayload::new(prospects)
    }

    #[test]
    fn pending_indices_follow_payload_order() {
        let mut p = payload(4);
        p.get_mut(2).unwrap().complete(vec![]);
        assert_eq!(p.pending_indices(), vec![1, 3, 4]);
        assert_eq!(p.pending_count(), 3);
    }

    #[test]
    fn lookup_is_by_stable_index_not_position() {
        let mut p = payload(3);
        p.prospects.reverse();
        let row = p.get(1).unwrap();
        assert_eq!(row.input.first_name, "P1");
    }

    #[test]
    fn integrity_check_flags_count_mismatch() {
        let p = payload(3);
        assert!(p.check_integrity(uuid::Uuid::new_v4(), 3));
        assert!(!p.check_integrity(uuid::Uuid::new_v4(), 5));
    }

    #[test]
    fn payload_round_trips_with_schema_version() {
        let p = payload(2);
        let json = serde_json::to_string(&p).unwrap();
        let back: ProspectPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back.schema_version, PAYLOAD_SCHEMA_VERSION);
        assert_eq!(back.prospects.len(), 2);
        assert_eq!(back.prospects[0].status, ProspectStatus::Pending);
    }
}
