//! Specialized collection types

pub use slotmap::{new_key_type, Key, SlotMap};

new_key_type! {
    /// Stable, generation-checked handle to a visual instance
    pub struct VisualHandle;

    /// Stable, generation-checked handle to an attachment point
    pub struct AttachmentPoint;
}

/// Handle-based map using slot map for stable references
pub type HandleMap<K, T> = SlotMap<K, T>;
