use core::fmt;

/// A 64-bit checkpointable identifier
///
/// - 46 bits timestamp (ms since [`CUSTOM_EPOCH`])
/// - 10 bits node ID
/// - 8 bits sequence
///
/// ```text
///  Bit Index:  63             18 17          8 7            0
///              +----------------+-------------+--------------+
///  Field:      | timestamp (46) | node ID (10)| sequence (8) |
///              +----------------+-------------+--------------+
///              |<---- MSB --------- 64 bits -------- LSB --->|
/// ```
///
/// Because the timestamp occupies the most significant bits, identifiers
/// from a single node compare in issue order, and the raw word can be
/// advanced as one monotonic counter: incrementing by 1 walks the sequence
/// field and only carries into neighboring fields on overflow.
///
/// [`CUSTOM_EPOCH`]: crate::CUSTOM_EPOCH
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PermafrostId {
    id: u64,
}

impl PermafrostId {
    /// Bitmask for extracting the 46-bit timestamp field. Occupies bits 18
    /// through 63.
    pub const TIMESTAMP_MASK: u64 = (1 << 46) - 1;

    /// Bitmask for extracting the 10-bit node ID field. Occupies bits 8
    /// through 17.
    pub const NODE_ID_MASK: u64 = (1 << 10) - 1;

    /// Bitmask for extracting the 8-bit sequence field. Occupies bits 0
    /// through 7.
    pub const SEQUENCE_MASK: u64 = (1 << 8) - 1;

    /// Number of bits to shift the timestamp to its correct position (bit
    /// 18).
    pub const TIMESTAMP_SHIFT: u64 = 18;

    /// Number of bits to shift the node ID to its correct position (bit 8).
    pub const NODE_ID_SHIFT: u64 = 8;

    /// Number of bits to shift the sequence field (bit 0).
    pub const SEQUENCE_SHIFT: u64 = 0;

    /// Constructs an ID from its components.
    ///
    /// Each component is masked to its field width first: any higher bits
    /// are silently discarded, matching the construction-time node-id
    /// truncation documented on
    /// [`CheckpointedGenerator::new`](crate::CheckpointedGenerator::new).
    pub const fn from_parts(timestamp: u64, node_id: u64, sequence: u64) -> Self {
        let timestamp = (timestamp & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT;
        let node_id = (node_id & Self::NODE_ID_MASK) << Self::NODE_ID_SHIFT;
        let sequence = (sequence & Self::SEQUENCE_MASK) << Self::SEQUENCE_SHIFT;
        Self {
            id: timestamp | node_id | sequence,
        }
    }

    /// Extracts the timestamp from the packed ID.
    pub const fn timestamp(&self) -> u64 {
        (self.id >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK
    }

    /// Extracts the node ID from the packed ID.
    pub const fn node_id(&self) -> u64 {
        (self.id >> Self::NODE_ID_SHIFT) & Self::NODE_ID_MASK
    }

    /// Extracts the sequence number from the packed ID.
    pub const fn sequence(&self) -> u64 {
        (self.id >> Self::SEQUENCE_SHIFT) & Self::SEQUENCE_MASK
    }

    /// Returns the raw 64-bit representation.
    pub const fn to_raw(&self) -> u64 {
        self.id
    }

    /// Reinterprets a raw 64-bit word as an ID.
    pub const fn from_raw(raw: u64) -> Self {
        Self { id: raw }
    }

    /// Returns the ID as a zero-padded 20-digit string.
    pub fn to_padded_string(&self) -> String {
        format!("{:020}", self.id)
    }
}

impl fmt::Display for PermafrostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for PermafrostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermafrostId")
            .field("raw", &format_args!("0x{:016x}", self.id))
            .field("timestamp", &self.timestamp())
            .field("node_id", &self.node_id())
            .field("sequence", &self.sequence())
            .finish()
    }
}

impl From<PermafrostId> for u64 {
    fn from(id: PermafrostId) -> Self {
        id.to_raw()
    }
}

impl From<u64> for PermafrostId {
    fn from(raw: u64) -> Self {
        Self::from_raw(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_and_extracts_components() {
        let id = PermafrostId::from_parts(1000, 2, 1);
        assert_eq!(id.timestamp(), 1000);
        assert_eq!(id.node_id(), 2);
        assert_eq!(id.sequence(), 1);
    }

    #[test]
    fn raw_round_trip() {
        let id = PermafrostId::from_parts(123_456_789, 1023, 255);
        let raw = id.to_raw();
        assert_eq!(PermafrostId::from_raw(raw), id);
        assert_eq!(u64::from(id), raw);
    }

    #[test]
    fn max_field_values() {
        let id = PermafrostId::from_parts(
            PermafrostId::TIMESTAMP_MASK,
            PermafrostId::NODE_ID_MASK,
            PermafrostId::SEQUENCE_MASK,
        );
        assert_eq!(id.timestamp(), PermafrostId::TIMESTAMP_MASK);
        assert_eq!(id.node_id(), 1023);
        assert_eq!(id.sequence(), 255);
        assert_eq!(id.to_raw(), u64::MAX);
    }

    #[test]
    fn truncates_oversized_components() {
        // Anything beyond the field width is silently discarded.
        let id = PermafrostId::from_parts(0, 1024 + 7, 256 + 3);
        assert_eq!(id.node_id(), 7);
        assert_eq!(id.sequence(), 3);
        assert_eq!(id.timestamp(), 0);
    }

    #[test]
    fn fields_do_not_overlap() {
        let ts_only = PermafrostId::from_parts(PermafrostId::TIMESTAMP_MASK, 0, 0);
        let node_only = PermafrostId::from_parts(0, PermafrostId::NODE_ID_MASK, 0);
        let seq_only = PermafrostId::from_parts(0, 0, PermafrostId::SEQUENCE_MASK);
        assert_eq!(ts_only.to_raw() & node_only.to_raw(), 0);
        assert_eq!(ts_only.to_raw() & seq_only.to_raw(), 0);
        assert_eq!(node_only.to_raw() & seq_only.to_raw(), 0);
    }

    #[test]
    fn orders_by_timestamp_then_sequence() {
        let a = PermafrostId::from_parts(1, 5, 200);
        let b = PermafrostId::from_parts(2, 5, 0);
        let c = PermafrostId::from_parts(2, 5, 1);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn increment_walks_the_sequence_field() {
        let id = PermafrostId::from_parts(42, 7, 0);
        let next = PermafrostId::from_raw(id.to_raw() + 1);
        assert_eq!(next.timestamp(), 42);
        assert_eq!(next.node_id(), 7);
        assert_eq!(next.sequence(), 1);
    }

    #[test]
    fn sequence_overflow_carries_into_node_id() {
        // Capacity limit: the 257th increment within one millisecond leaves
        // the sequence field and disturbs the node id.
        let id = PermafrostId::from_parts(42, 7, PermafrostId::SEQUENCE_MASK);
        let next = PermafrostId::from_raw(id.to_raw() + 1);
        assert_eq!(next.sequence(), 0);
        assert_eq!(next.node_id(), 8);
        assert_eq!(next.timestamp(), 42);
    }

    #[test]
    fn display_and_padded_string() {
        let id = PermafrostId::from_raw(42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(id.to_padded_string(), "00000000000000000042");
        assert_eq!(id.to_padded_string().len(), 20);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_round_trip() {
        let id = PermafrostId::from_parts(1000, 2, 1);
        let json = serde_json::to_string(&id).unwrap();
        let back: PermafrostId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
