use std::sync::Arc;

use data_encoding::BASE64;
use log::{debug, info};
use mongodb::bson::Document;

use crate::{
    clock::Clock,
    crypto::{CryptoError, Pseudonym, SymmetricCipher},
    error::{Error, Result},
    model::store::{
        from_record, to_record, InsertOutcome, Store, StoreError, ELECTION_RESULTS, VOTES,
    },
};

use super::{ElectionResult, TallyResult, Vote, RESULT_KEY};

const DUPLICATE_VOTE: &str = "This voter has already cast a vote";

/// Records votes, at most one per pseudonym, and counts them.
pub struct VoteLedger {
    store: Store,
    cipher: Arc<SymmetricCipher>,
    clock: Arc<dyn Clock>,
}

impl VoteLedger {
    pub fn new(store: Store, cipher: Arc<SymmetricCipher>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            cipher,
            clock,
        }
    }

    /// Accept a vote for `candidate_id` from `pseudonym`.
    ///
    /// Fails with [`Error::DuplicateVote`] if this pseudonym has voted before, including
    /// when a concurrent submission for the same pseudonym got there first.
    pub async fn submit_vote(
        &self,
        pseudonym: &Pseudonym,
        candidate_id: &str,
        signature: &str,
    ) -> Result<()> {
        if candidate_id.trim().is_empty() {
            return Err(Error::Validation("Candidate ID must not be empty".to_string()));
        }
        if signature.is_empty() || BASE64.decode(signature.as_bytes()).is_err() {
            return Err(Error::Validation("Signature must be valid base64".to_string()));
        }

        // Fast path only; the conditional insert below is what enforces uniqueness.
        let existing = self
            .store
            .query_by_field(VOTES, "pseudonym", pseudonym.as_str())
            .await?;
        if !existing.is_empty() {
            info!("Rejected repeat vote");
            return Err(Error::DuplicateVote(DUPLICATE_VOTE.to_string()));
        }

        let vote = Vote {
            pseudonym: pseudonym.clone(),
            encrypted_candidate_id: self.cipher.encrypt(candidate_id),
            signature: signature.to_string(),
            encrypted_timestamp: self.cipher.encrypt(&self.clock.now().to_rfc3339()),
        };
        let record = to_record(pseudonym.as_str(), &vote)?;

        match self
            .store
            .conditional_insert(VOTES, pseudonym.as_str(), record)
            .await?
        {
            InsertOutcome::Inserted => {
                info!("Accepted vote");
                Ok(())
            }
            InsertOutcome::Conflict => {
                info!("Rejected repeat vote after losing a concurrent submission");
                Err(Error::DuplicateVote(DUPLICATE_VOTE.to_string()))
            }
        }
    }

    /// Decrypt and count every stored vote.
    pub async fn tally(&self) -> Result<TallyResult> {
        let records = self.store.list(VOTES).await?;
        let mut tally = TallyResult::default();
        for record in records {
            tally.add(self.candidate_of(record)?);
        }
        debug!("Tallied {} votes", tally.total());
        Ok(tally)
    }

    /// Tally, pick the winner and persist the outcome.
    ///
    /// Declaring again overwrites the previous result.
    pub async fn declare_results(&self) -> Result<ElectionResult> {
        let result = ElectionResult::new(self.tally().await?, self.clock.now());
        self.store
            .set(ELECTION_RESULTS, RESULT_KEY, to_record(RESULT_KEY, &result)?)
            .await?;
        info!(
            "Declared results: {} votes, winner {:?}",
            result.total_votes, result.winner
        );
        Ok(result)
    }

    /// The most recently declared result, if any.
    pub async fn declared_results(&self) -> Result<Option<ElectionResult>> {
        match self.store.get(ELECTION_RESULTS, RESULT_KEY).await? {
            Some(record) => Ok(Some(from_record(record)?)),
            None => Ok(None),
        }
    }

    /// Every stored vote, still encrypted.
    pub async fn votes(&self) -> Result<Vec<Vote>> {
        let records = self.store.list(VOTES).await?;
        let votes = records
            .into_iter()
            .map(from_record::<Vote>)
            .collect::<std::result::Result<Vec<_>, StoreError>>()?;
        Ok(votes)
    }

    /// Decrypt a single stored field.
    pub fn decrypt(&self, ciphertext: &str) -> std::result::Result<String, CryptoError> {
        self.cipher.decrypt(ciphertext)
    }

    fn candidate_of(&self, record: Document) -> Result<String> {
        let vote: Vote = from_record(record)?;
        Ok(self.cipher.decrypt(&vote.encrypted_candidate_id)?)
    }
}
