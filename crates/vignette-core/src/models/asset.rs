use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::COLLECTION_NAMESPACE;

/// Named grouping of assets in the asset store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionRef {
    pub id: Uuid,
    pub name: String,
}

impl CollectionRef {
    /// Collection reference with an id derived from its name.
    ///
    /// The same name always yields the same id, so backends without a unique
    /// constraint can still get-or-create without coordination.
    pub fn named(name: &str) -> Self {
        Self {
            id: Uuid::new_v5(&COLLECTION_NAMESPACE, name.as_bytes()),
            name: name.to_string(),
        }
    }
}

/// Reference to an asset stored in the asset store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    pub id: Uuid,
    pub collection_id: Uuid,
    pub filename: String,
    pub storage_key: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

/// A stored preview image.
///
/// Created once from a successful conversion and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedAsset {
    pub asset: AssetRef,
    pub collection: CollectionRef,
    pub filename: String,
    pub bytes: Bytes,
}
