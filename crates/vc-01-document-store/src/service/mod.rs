//! # Document Store Service
//!
//! Implements [`DocumentLifecycle`] over any [`KeyValueCache`].


use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use shared_types::{Document, UnixSeconds, Validation};
use tracing::{debug, warn};

use crate::domain::fields::{self, PAYLOAD_FIELDS};
use crate::domain::{Bucket, DocumentError, DocumentStoreConfig, RevocationPolicy};
use crate::ports::inbound::DocumentLifecycle;
use crate::ports::outbound::{KeyValueCache, SystemTimeSource, TimeSource};

/// The lifecycle store.
pub struct DocumentStore {
    cache: Arc<dyn KeyValueCache>,
    clock: Arc<dyn TimeSource>,
    config: DocumentStoreConfig,
}

impl DocumentStore {
    #[must_use]
    pub fn new(cache: Arc<dyn KeyValueCache>, config: DocumentStoreConfig) -> Self {
        Self::with_clock(cache, Arc::new(SystemTimeSource), config)
    }

    #[must_use]
    pub fn with_clock(
        cache: Arc<dyn KeyValueCache>,
        clock: Arc<dyn TimeSource>,
        config: DocumentStoreConfig,
    ) -> Self {
        Self {
            cache,
            clock,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &DocumentStoreConfig {
        &self.config
    }

    #[must_use]
    pub fn revocation_policy(&self) -> RevocationPolicy {
        self.config.revocation_policy
    }

    fn require_id(transaction_id: &str) -> Result<(), DocumentError> {
        if transaction_id.is_empty() {
            return Err(DocumentError::NoTransactionId);
        }
        Ok(())
    }

    /// Write `encoded` and drop every field of `all` it leaves unset.
    ///
    /// `ts` is always written, so the entry never empties in between and
    /// keeps any TTL already set on it.
    async fn overwrite(
        &self,
        key: &str,
        encoded: Vec<(String, String)>,
        all: &[&'static str],
    ) -> Result<(), DocumentError> {
        let stale = fields::unset_fields(all, &encoded);
        self.cache.hset(key, encoded).await?;
        if !stale.is_empty() {
            self.cache.hdel(key, &stale).await?;
        }
        Ok(())
    }

    async fn save(&self, bucket: Bucket, doc: &Document) -> Result<(), DocumentError> {
        doc.require_transaction_id()?;
        let key = bucket.key(&doc.transaction_id);
        let encoded = fields::encode_document(doc, self.clock.now());
        self.overwrite(&key, encoded, fields::DOCUMENT_FIELDS).await?;
        debug!(key = %key, "[vc-01] Document saved");
        Ok(())
    }

    /// Apply the revocation override and policy before a bucket read.
    async fn ensure_readable(&self, transaction_id: &str) -> Result<(), DocumentError> {
        match self.is_revoked(transaction_id).await {
            Ok(false) => Ok(()),
            Ok(true) => Err(DocumentError::Revoked {
                transaction_id: transaction_id.to_string(),
            }),
            Err(err) => match self.config.revocation_policy {
                RevocationPolicy::FailClosed => Err(err),
                RevocationPolicy::FailOpen => {
                    warn!(
                        transaction_id,
                        error = %err,
                        "[vc-01] Revocation check failed, reading as not revoked"
                    );
                    Ok(())
                }
            },
        }
    }

    async fn get(&self, bucket: Bucket, transaction_id: &str) -> Result<Document, DocumentError> {
        Self::require_id(transaction_id)?;
        self.ensure_readable(transaction_id).await?;

        let key = bucket.key(transaction_id);
        let map = self.cache.hgetall(&key).await?;
        if map.is_empty() {
            return Err(DocumentError::NotFound {
                transaction_id: transaction_id.to_string(),
                bucket,
            });
        }
        let doc = fields::decode_document(&key, &map)?;
        if doc.is_revoked() {
            return Err(DocumentError::Revoked {
                transaction_id: transaction_id.to_string(),
            });
        }
        Ok(doc)
    }

    async fn exists(&self, bucket: Bucket, transaction_id: &str) -> Result<bool, DocumentError> {
        Self::require_id(transaction_id)?;
        Ok(self.cache.exists(&bucket.key(transaction_id)).await?)
    }

    async fn del(&self, bucket: Bucket, transaction_id: &str) -> Result<(), DocumentError> {
        Self::require_id(transaction_id)?;
        let key = bucket.key(transaction_id);
        let removed = self.cache.hdel(&key, PAYLOAD_FIELDS).await?;
        debug!(key = %key, removed, "[vc-01] Document payload deleted");
        Ok(())
    }

    async fn add_ttl(
        &self,
        bucket: Bucket,
        transaction_id: &str,
        ttl: Duration,
    ) -> Result<(), DocumentError> {
        Self::require_id(transaction_id)?;
        let key = bucket.key(transaction_id);
        if !self.cache.expire(&key, ttl).await? {
            debug!(key = %key, "[vc-01] TTL requested for missing key");
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentLifecycle for DocumentStore {
    async fn save_unsigned(&self, doc: &Document) -> Result<(), DocumentError> {
        self.save(Bucket::Unsigned, doc).await
    }

    async fn get_unsigned(&self, transaction_id: &str) -> Result<Document, DocumentError> {
        self.get(Bucket::Unsigned, transaction_id).await
    }

    async fn exists_unsigned(&self, transaction_id: &str) -> Result<bool, DocumentError> {
        self.exists(Bucket::Unsigned, transaction_id).await
    }

    async fn del_unsigned(&self, transaction_id: &str) -> Result<(), DocumentError> {
        self.del(Bucket::Unsigned, transaction_id).await
    }

    async fn add_ttl_unsigned(&self, transaction_id: &str) -> Result<(), DocumentError> {
        self.add_ttl(Bucket::Unsigned, transaction_id, self.config.keep_unsigned)
            .await
    }

    async fn save_signed(&self, doc: &Document) -> Result<(), DocumentError> {
        doc.require_transaction_id()?;
        doc.require_data()?;
        self.save(Bucket::Signed, doc).await
    }

    async fn get_signed(&self, transaction_id: &str) -> Result<Document, DocumentError> {
        self.get(Bucket::Signed, transaction_id).await
    }

    async fn exists_signed(&self, transaction_id: &str) -> Result<bool, DocumentError> {
        self.exists(Bucket::Signed, transaction_id).await
    }

    async fn del_signed(&self, transaction_id: &str) -> Result<(), DocumentError> {
        self.del(Bucket::Signed, transaction_id).await
    }

    async fn add_ttl_signed(&self, transaction_id: &str) -> Result<(), DocumentError> {
        self.add_ttl(Bucket::Signed, transaction_id, self.config.keep_signed)
            .await
    }

    async fn save_revoked(&self, transaction_id: &str) -> Result<(), DocumentError> {
        Self::require_id(transaction_id)?;
        let key = Bucket::Revoked.key(transaction_id);
        let now = self.clock.now();
        self.cache
            .hset(&key, vec![(fields::TS.to_string(), now.to_string())])
            .await?;
        debug!(transaction_id, revoked_at = now, "[vc-01] Document revoked");
        Ok(())
    }

    async fn get_revoked(&self, transaction_id: &str) -> Result<UnixSeconds, DocumentError> {
        Self::require_id(transaction_id)?;
        let key = Bucket::Revoked.key(transaction_id);
        match self.cache.hget(&key, fields::TS).await? {
            Some(raw) => Ok(fields::parse_revoked_ts(&key, &raw)?),
            None => Err(DocumentError::NotFound {
                transaction_id: transaction_id.to_string(),
                bucket: Bucket::Revoked,
            }),
        }
    }

    async fn is_revoked(&self, transaction_id: &str) -> Result<bool, DocumentError> {
        Self::require_id(transaction_id)?;
        Ok(self
            .cache
            .hexists(&Bucket::Revoked.key(transaction_id), fields::TS)
            .await?)
    }

    async fn save_signing_failure(
        &self,
        transaction_id: &str,
        message: &str,
    ) -> Result<(), DocumentError> {
        let doc = Document {
            transaction_id: transaction_id.to_string(),
            error: Some(message.to_string()),
            ..Default::default()
        };
        self.save(Bucket::Signed, &doc).await
    }

    async fn save_validation(&self, report: &Validation) -> Result<(), DocumentError> {
        Self::require_id(&report.transaction_id)?;
        let key = Bucket::Ladok.key(&report.transaction_id);
        let encoded = fields::encode_validation(report, self.clock.now());
        self.overwrite(&key, encoded, fields::VALIDATION_FIELDS).await
    }

    async fn get_validation(&self, transaction_id: &str) -> Result<Validation, DocumentError> {
        Self::require_id(transaction_id)?;
        let key = Bucket::Ladok.key(transaction_id);
        let map = self.cache.hgetall(&key).await?;
        if map.is_empty() {
            return Err(DocumentError::NotFound {
                transaction_id: transaction_id.to_string(),
                bucket: Bucket::Ladok,
            });
        }
        Ok(fields::decode_validation(&key, &map)?)
    }
}
