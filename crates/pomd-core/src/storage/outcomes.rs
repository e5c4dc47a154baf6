//! Append-only outcome store on sled.
//!
//! Counts are never overwritten in place: every outcome appends a record
//! keyed `outcome/{identity}/{kind}/{timestamp}` whose value is its 1-based
//! sequence number, so the count of a kind is the value of the last record
//! under its prefix. Clearing rotates the identity token and removes the
//! old records in one atomic batch, which orphans nothing and resets every
//! count to zero in a single step.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::error::StoreError;
use crate::outcome::{Outcome, OutcomeCounts};

const IDENTITY_KEY: &str = "identity/current";

pub struct OutcomeStore {
    db: sled::Db,
    /// Current identity token. Held across compound operations so a
    /// concurrent clear cannot interleave with a read-then-append.
    identity: Mutex<String>,
}

impl OutcomeStore {
    /// Opens (or creates) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let db = sled::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let identity = Self::load_or_create_identity(&db)?;
        Ok(Self {
            db,
            identity: Mutex::new(identity),
        })
    }

    fn load_or_create_identity(db: &sled::Db) -> Result<String, StoreError> {
        if let Some(raw) = db.get(IDENTITY_KEY)? {
            return String::from_utf8(raw.to_vec()).map_err(|e| StoreError::CorruptRecord {
                key: IDENTITY_KEY.to_string(),
                message: e.to_string(),
            });
        }
        let identity = Uuid::new_v4().to_string();
        db.insert(IDENTITY_KEY, identity.as_bytes())?;
        db.flush()?;
        Ok(identity)
    }

    /// Appends one outcome record and returns its sequence number, which
    /// is also the new count for that kind.
    pub fn record_outcome(
        &self,
        kind: Outcome,
        occurred_at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let identity = self.identity.lock().unwrap();
        let prefix = Self::outcome_prefix(&identity, kind);
        let sequence = self.last_sequence(&prefix)? + 1;
        let key = format!("{prefix}{}", sortable_timestamp(occurred_at));
        self.db.insert(key.as_bytes(), &sequence.to_be_bytes())?;
        self.db.flush()?;
        Ok(sequence)
    }

    /// Count of recorded outcomes of one kind under the current identity.
    pub fn count_of(&self, kind: Outcome) -> Result<u64, StoreError> {
        let identity = self.identity.lock().unwrap();
        self.last_sequence(&Self::outcome_prefix(&identity, kind))
    }

    /// All three counts, read under one identity observation.
    pub fn counts(&self) -> Result<OutcomeCounts, StoreError> {
        let identity = self.identity.lock().unwrap();
        Ok(OutcomeCounts {
            completed: self.last_sequence(&Self::outcome_prefix(&identity, Outcome::Completed))?,
            cancelled: self.last_sequence(&Self::outcome_prefix(&identity, Outcome::Cancelled))?,
            paused: self.last_sequence(&Self::outcome_prefix(&identity, Outcome::Paused))?,
        })
    }

    /// Drops every record under the current identity and rotates to a
    /// fresh one, atomically.
    pub fn reset_all(&self) -> Result<(), StoreError> {
        let mut identity = self.identity.lock().unwrap();
        let mut batch = sled::Batch::default();
        for kind in Outcome::ALL {
            let prefix = Self::outcome_prefix(&identity, kind);
            for entry in self.db.scan_prefix(prefix.as_bytes()) {
                let (key, _) = entry?;
                batch.remove(key);
            }
        }
        let next = Uuid::new_v4().to_string();
        batch.insert(IDENTITY_KEY, next.as_bytes());
        self.db.apply_batch(batch)?;
        self.db.flush()?;
        *identity = next;
        Ok(())
    }

    /// The current identity token. Rotated by [`OutcomeStore::reset_all`].
    pub fn identity(&self) -> String {
        self.identity.lock().unwrap().clone()
    }

    fn outcome_prefix(identity: &str, kind: Outcome) -> String {
        format!("outcome/{identity}/{}/", kind.key())
    }

    fn last_sequence(&self, prefix: &str) -> Result<u64, StoreError> {
        match self.db.scan_prefix(prefix.as_bytes()).last() {
            Some(entry) => {
                let (key, value) = entry?;
                decode_sequence(&key, &value)
            }
            None => Ok(0),
        }
    }
}

/// RFC 3339 with fixed nanosecond width, so byte order is time order.
fn sortable_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn decode_sequence(key: &[u8], value: &[u8]) -> Result<u64, StoreError> {
    let bytes: [u8; 8] = value.try_into().map_err(|_| StoreError::CorruptRecord {
        key: String::from_utf8_lossy(key).into_owned(),
        message: format!("expected an 8-byte sequence, got {} bytes", value.len()),
    })?;
    Ok(u64::from_be_bytes(bytes))
}
