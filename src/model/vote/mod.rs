use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::Pseudonym;

mod ledger;

pub use ledger::VoteLedger;

/// Key of the single record in the election results collection.
pub const RESULT_KEY: &str = "result";

/// A stored vote, keyed by its pseudonym.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub pseudonym: Pseudonym,
    pub encrypted_candidate_id: String,
    /// Base64 signature supplied by the voter, stored verbatim.
    pub signature: String,
    pub encrypted_timestamp: String,
}

/// Vote counts per candidate ID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TallyResult {
    counts: BTreeMap<String, u64>,
}

impl TallyResult {
    /// Count one vote for `candidate_id`.
    pub fn add(&mut self, candidate_id: impl Into<String>) {
        *self.counts.entry(candidate_id.into()).or_insert(0) += 1;
    }

    pub fn counts(&self) -> &BTreeMap<String, u64> {
        &self.counts
    }

    pub fn get(&self, candidate_id: &str) -> u64 {
        self.counts.get(candidate_id).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// The candidate with the most votes.
    ///
    /// Ties go to the lexicographically lowest candidate ID. `None` if nobody voted.
    pub fn winner(&self) -> Option<&str> {
        let mut leader: Option<(&str, u64)> = None;
        // Ascending key order, so only a strictly greater count displaces the leader.
        for (candidate_id, &count) in &self.counts {
            if leader.map_or(true, |(_, best)| count > best) {
                leader = Some((candidate_id, count));
            }
        }
        leader.map(|(candidate_id, _)| candidate_id)
    }
}

impl<S: Into<String>> FromIterator<S> for TallyResult {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut tally = Self::default();
        for candidate_id in iter {
            tally.add(candidate_id);
        }
        tally
    }
}

/// A declared election outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionResult {
    pub winner: Option<String>,
    pub vote_count: TallyResult,
    pub total_votes: u64,
    pub declared_at: DateTime<Utc>,
}

impl ElectionResult {
    pub fn new(tally: TallyResult, declared_at: DateTime<Utc>) -> Self {
        Self {
            winner: tally.winner().map(str::to_string),
            total_votes: tally.total(),
            vote_count: tally,
            declared_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rocket::serde::json::{json, serde_json};

    use super::*;

    #[test]
    fn counts_and_total() {
        let tally: TallyResult = ["A", "B", "A", "C", "A", "B"].into_iter().collect();
        assert_eq!(3, tally.get("A"));
        assert_eq!(2, tally.get("B"));
        assert_eq!(1, tally.get("C"));
        assert_eq!(0, tally.get("D"));
        assert_eq!(6, tally.total());
        assert_eq!(Some("A"), tally.winner());
    }

    #[test]
    fn tie_goes_to_lowest_candidate_id() {
        let tally: TallyResult = ["B", "A", "B", "A"].into_iter().collect();
        assert_eq!(Some("A"), tally.winner());

        let tally: TallyResult = ["zeta", "alpha", "mid", "zeta", "mid"].into_iter().collect();
        assert_eq!(Some("mid"), tally.winner());
    }

    #[test]
    fn no_votes_no_winner() {
        let tally = TallyResult::default();
        assert_eq!(None, tally.winner());
        assert_eq!(0, tally.total());
    }

    #[test]
    fn result_serializes_camel_case() {
        let declared_at = Utc.with_ymd_and_hms(2024, 5, 1, 18, 0, 0).unwrap();
        let result = ElectionResult::new(["A", "A", "B"].into_iter().collect(), declared_at);
        assert_eq!(Some("A".to_string()), result.winner);
        assert_eq!(3, result.total_votes);

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json!({
                "winner": "A",
                "voteCount": {"A": 2, "B": 1},
                "totalVotes": 3,
                "declaredAt": "2024-05-01T18:00:00Z",
            }),
            value
        );
    }
}
