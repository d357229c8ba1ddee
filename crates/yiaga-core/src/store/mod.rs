//! Record storage backed by sled.
//!
//! Every record type lives in its own tree keyed by a big-endian numeric id,
//! with a sibling `<name>.idx` tree mapping `field:value` to the owning id for
//! fields declared unique. Index maintenance happens in the same transaction
//! as the record write.

use std::marker::PhantomData;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use sled::Transactional;
use sled::transaction::{TransactionError, TransactionResult, abort};
use thiserror::Error;

/// Store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying sled failure.
    #[error("Storage error: {0}")]
    Storage(#[from] sled::Error),

    /// Record (de)serialization failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A unique field already holds this value.
    #[error("{field} already exists: {value}")]
    Conflict {
        /// Name of the unique field.
        field: &'static str,
        /// Conflicting value.
        value: String,
    },

    /// No record with this id.
    #[error("{collection} {id} not found")]
    NotFound {
        /// Collection name.
        collection: &'static str,
        /// Requested id.
        id: u64,
    },
}

impl From<TransactionError<Self>> for StoreError {
    fn from(err: TransactionError<Self>) -> Self {
        match err {
            TransactionError::Abort(e) => e,
            TransactionError::Storage(e) => Self::Storage(e),
        }
    }
}

/// Bookkeeping fields shared by every stored record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMeta {
    /// Numeric identifier, assigned on insert.
    #[serde(default)]
    pub id: u64,
    /// When the record was created.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// When the record was last written.
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

/// A type that can be persisted in a [`Collection`].
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Tree name.
    const COLLECTION: &'static str;

    /// Shared bookkeeping fields.
    fn meta(&self) -> &RecordMeta;

    /// Mutable bookkeeping fields.
    fn meta_mut(&mut self) -> &mut RecordMeta;

    /// Fields that must be unique across the collection, with their values.
    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    /// Record id.
    fn id(&self) -> u64 {
        self.meta().id
    }
}

/// Handle to the database.
#[derive(Clone)]
pub struct Store {
    db: sled::Db,
}

impl Store {
    /// Open or create a store at the given directory.
    ///
    /// # Errors
    ///
    /// Returns error if the database cannot be opened.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        tracing::debug!(path = %path.display(), "Opened record store");
        Ok(Self { db })
    }

    /// Open a throwaway in-memory store.
    ///
    /// # Errors
    ///
    /// Returns error if sled fails to initialise.
    pub fn temporary() -> Result<Self, StoreError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }

    /// Open the typed collection for `T`.
    ///
    /// # Errors
    ///
    /// Returns error if the trees cannot be opened.
    pub fn collection<T: Record>(&self) -> Result<Collection<T>, StoreError> {
        let records = self.db.open_tree(T::COLLECTION)?;
        let index = self.db.open_tree(format!("{}.idx", T::COLLECTION))?;
        Ok(Collection {
            db: self.db.clone(),
            records,
            index,
            _marker: PhantomData,
        })
    }

    /// Flush pending writes to disk.
    ///
    /// # Errors
    ///
    /// Returns error if the flush fails.
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("size_on_disk", &self.db.size_on_disk().ok())
            .finish_non_exhaustive()
    }
}

/// Typed view over one record tree and its unique index.
pub struct Collection<T> {
    db: sled::Db,
    records: sled::Tree,
    index: sled::Tree,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            records: self.records.clone(),
            index: self.index.clone(),
            _marker: PhantomData,
        }
    }
}

fn id_key(id: u64) -> Vec<u8> {
    id.to_be_bytes().to_vec()
}

fn index_key(field: &str, value: &str) -> Vec<u8> {
    format!("{field}:{value}").into_bytes()
}

fn decode_id(bytes: &[u8]) -> Option<u64> {
    bytes.try_into().ok().map(u64::from_be_bytes)
}

impl<T: Record> Collection<T> {
    /// Insert a new record, assigning its id and timestamps.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if a unique field is taken.
    pub fn insert(&self, mut record: T) -> Result<T, StoreError> {
        let id = self.db.generate_id()? + 1;
        let now = Utc::now();
        {
            let meta = record.meta_mut();
            meta.id = id;
            meta.created_at = now;
            meta.updated_at = now;
        }

        let key = id_key(id);
        let value = serde_json::to_vec(&record)?;
        let keys = record.unique_keys();

        let result: TransactionResult<(), StoreError> =
            (&self.records, &self.index).transaction(|(records, index)| {
                for (field, val) in &keys {
                    let k = index_key(field, val);
                    if index.get(&k)?.is_some() {
                        return abort(StoreError::Conflict {
                            field: *field,
                            value: val.clone(),
                        });
                    }
                    index.insert(k, key.clone())?;
                }
                records.insert(key.clone(), value.clone())?;
                Ok(())
            });
        result?;

        tracing::debug!(collection = T::COLLECTION, id, "Inserted record");
        Ok(record)
    }

    /// Get a record by id.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    pub fn get(&self, id: u64) -> Result<Option<T>, StoreError> {
        match self.records.get(id_key(id))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Look up a record through one of its unique fields.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    pub fn find_by(&self, field: &str, value: &str) -> Result<Option<T>, StoreError> {
        match self.index.get(index_key(field, value))? {
            Some(id_bytes) => match decode_id(&id_bytes) {
                Some(id) => self.get(id),
                None => Ok(None),
            },
            None => Ok(None),
        }
    }

    /// Replace an existing record, keeping its creation time.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the id is unknown, or
    /// `StoreError::Conflict` if a changed unique field collides.
    pub fn update(&self, record: T) -> Result<T, StoreError> {
        let id = record.id();
        let key = id_key(id);
        let now = Utc::now();

        let result: TransactionResult<T, StoreError> =
            (&self.records, &self.index).transaction(|(records, index)| {
                let Some(old_bytes) = records.get(&key)? else {
                    return abort(StoreError::NotFound {
                        collection: T::COLLECTION,
                        id,
                    });
                };
                let old: T = match serde_json::from_slice(&old_bytes) {
                    Ok(old) => old,
                    Err(e) => return abort(StoreError::Serialization(e)),
                };

                let mut next = record.clone();
                {
                    let meta = next.meta_mut();
                    meta.created_at = old.meta().created_at;
                    meta.updated_at = now;
                }

                let new_keys = next.unique_keys();
                for (field, val) in old.unique_keys() {
                    if !new_keys.iter().any(|(f, v)| *f == field && *v == val) {
                        index.remove(index_key(field, &val))?;
                    }
                }
                for (field, val) in &new_keys {
                    let k = index_key(field, val);
                    if let Some(owner) = index.get(&k)? {
                        if owner.as_ref() != key.as_slice() {
                            return abort(StoreError::Conflict {
                                field: *field,
                                value: val.clone(),
                            });
                        }
                    }
                    index.insert(k, key.clone())?;
                }

                let value = match serde_json::to_vec(&next) {
                    Ok(value) => value,
                    Err(e) => return abort(StoreError::Serialization(e)),
                };
                records.insert(key.clone(), value)?;
                Ok(next)
            });

        let updated = result?;
        tracing::debug!(collection = T::COLLECTION, id, "Updated record");
        Ok(updated)
    }

    /// Delete a record and its index entries.
    ///
    /// Returns whether a record was removed.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    pub fn delete(&self, id: u64) -> Result<bool, StoreError> {
        let key = id_key(id);

        let result: TransactionResult<bool, StoreError> =
            (&self.records, &self.index).transaction(|(records, index)| {
                let Some(old_bytes) = records.remove(key.clone())? else {
                    return Ok(false);
                };
                let old: T = match serde_json::from_slice(&old_bytes) {
                    Ok(old) => old,
                    Err(e) => return abort(StoreError::Serialization(e)),
                };
                for (field, val) in old.unique_keys() {
                    index.remove(index_key(field, &val))?;
                }
                Ok(true)
            });

        let removed = result?;
        if removed {
            tracing::debug!(collection = T::COLLECTION, id, "Deleted record");
        }
        Ok(removed)
    }

    /// List all records in id order.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    pub fn list(&self) -> Result<Vec<T>, StoreError> {
        let mut out = Vec::with_capacity(self.records.len());
        for result in self.records.iter().values() {
            let bytes = result?;
            out.push(serde_json::from_slice(&bytes)?);
        }
        Ok(out)
    }

    /// Count stored records.
    #[must_use]
    pub fn count(&self) -> usize {
        self.records.len()
    }

    /// Check whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
