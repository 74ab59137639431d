use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use standops_core::{
    AllocationError, AllocationResult, InventoryItemId, ItemTypeId, SectorId, Versioned,
};

/// Informational availability tag shown on dashboards.
///
/// Derived for display only. The allocation engine never reads it; the
/// authoritative numbers come from the allocation snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemDisplayTag {
    Available,
    Limited,
    SoldOut,
}

/// A pool of physical stand/booth units tracked by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    id: InventoryItemId,
    type_id: ItemTypeId,
    sector_id: SectorId,
    /// Total capacity in units. Immutable once set by inventory management.
    quantity: i64,
    /// Price in smallest currency unit (e.g., cents).
    current_price: u64,
    /// Floor price in smallest currency unit.
    min_price: u64,
    status: ItemDisplayTag,
    version: u64,
    updated_at: DateTime<Utc>,
}

impl InventoryItem {
    pub fn new(
        id: InventoryItemId,
        type_id: ItemTypeId,
        sector_id: SectorId,
        quantity: i64,
        current_price: u64,
        min_price: u64,
        updated_at: DateTime<Utc>,
    ) -> AllocationResult<Self> {
        if quantity < 0 {
            return Err(AllocationError::validation("quantity cannot be negative"));
        }
        if min_price > current_price {
            return Err(AllocationError::validation(
                "min_price cannot exceed current_price",
            ));
        }

        Ok(Self {
            id,
            type_id,
            sector_id,
            quantity,
            current_price,
            min_price,
            status: derive_display_tag(0, quantity),
            version: 1,
            updated_at,
        })
    }

    pub fn type_id(&self) -> ItemTypeId {
        self.type_id
    }

    pub fn sector_id(&self) -> SectorId {
        self.sector_id
    }

    /// Total capacity in units.
    pub fn capacity(&self) -> i64 {
        self.quantity
    }

    pub fn current_price(&self) -> u64 {
        self.current_price
    }

    pub fn min_price(&self) -> u64 {
        self.min_price
    }

    pub fn display_tag(&self) -> ItemDisplayTag {
        self.status
    }

    /// Refresh the informational tag (dashboard concern, not allocation).
    pub fn set_display_tag(&mut self, tag: ItemDisplayTag, updated_at: DateTime<Utc>) {
        self.status = tag;
        self.version += 1;
        self.updated_at = updated_at;
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl Versioned for InventoryItem {
    type Id = InventoryItemId;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Derive the dashboard tag from committed demand vs capacity.
///
/// `Limited` kicks in once 80% or more of capacity is committed.
pub fn derive_display_tag(committed: i64, capacity: i64) -> ItemDisplayTag {
    if committed >= capacity {
        ItemDisplayTag::SoldOut
    } else if committed * 5 >= capacity * 4 {
        ItemDisplayTag::Limited
    } else {
        ItemDisplayTag::Available
    }
}
