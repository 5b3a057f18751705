//! Partition writer
//!
//! Serializes projected records as newline-delimited JSON and stores each
//! batch as one uniquely named object under its hour partition.

use super::cloud::CloudDestination;
use super::partition::OutputPartition;
use crate::error::{Error, Result};
use crate::projection::ProjectedRecord;
use crate::types::TransformationContext;
use async_trait::async_trait;
use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;
use uuid::Uuid;

/// Outcome of one successful write call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReceipt {
    /// Full path of the written object
    pub path: String,
    /// Number of records written
    pub records: usize,
    /// Number of bytes written
    pub bytes: usize,
}

/// Writes a batch of projected records into a partition
#[async_trait]
pub trait PartitionWriter: Send + Sync {
    /// Persist `records` under `partition`
    ///
    /// Every call creates a new object, so calling it repeatedly for the same
    /// partition never overwrites earlier output.
    async fn write(
        &self,
        records: &[ProjectedRecord],
        partition: &OutputPartition,
        ctx: &TransformationContext,
    ) -> Result<WriteReceipt>;
}

/// Encode records as NDJSON: one JSON object per line, no array wrapper
pub fn encode_ndjson(records: &[ProjectedRecord]) -> Result<Bytes> {
    let mut writer = BytesMut::new().writer();
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.get_mut().put_u8(b'\n');
    }
    Ok(writer.into_inner().freeze())
}

/// Object name for one write call
///
/// `part-<batch id>-<uuid>.json`; the uuid keeps concurrent job instances and
/// retried calls from colliding.
pub fn object_name(ctx: &TransformationContext) -> String {
    format!("part-{:08}-{}.json", ctx.batch_id, Uuid::new_v4().simple())
}

/// Partition writer backed by an object store destination
#[derive(Debug, Clone)]
pub struct ObjectStoreWriter {
    destination: CloudDestination,
}

impl ObjectStoreWriter {
    /// Create a writer for a destination
    pub fn new(destination: CloudDestination) -> Self {
        Self { destination }
    }

    /// Create a writer from a destination URL
    pub fn from_url(url: &str) -> Result<Self> {
        Ok(Self::new(CloudDestination::parse(url)?))
    }

    /// Underlying destination
    pub fn destination(&self) -> &CloudDestination {
        &self.destination
    }
}

#[async_trait]
impl PartitionWriter for ObjectStoreWriter {
    async fn write(
        &self,
        records: &[ProjectedRecord],
        partition: &OutputPartition,
        ctx: &TransformationContext,
    ) -> Result<WriteReceipt> {
        if records.is_empty() {
            return Err(Error::write(partition.path(), "No records to write"));
        }

        let data = encode_ndjson(records)?;
        let bytes = data.len();
        let relative = format!("{}{}", partition.prefix(), object_name(ctx));

        let path = self.destination.write(&relative, data).await?;
        debug!(path = %path, records = records.len(), bytes, transformation_ctx = %ctx, "Wrote object");

        Ok(WriteReceipt {
            path,
            records: records.len(),
            bytes,
        })
    }
}
