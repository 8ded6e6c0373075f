//! Tunables for the synchronization core.

/// Page sizes and channel capacities used across the sync stack.
///
/// One instance is handed to the session at startup and shared by every
/// list it creates. Directory implementations size their push channels
/// from the same struct so producers and consumers agree.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Items per joined-rooms backfill request.
    pub room_list_page_size: u16,
    /// Items per timeline history request.
    pub timeline_page_size: u16,
    /// Items per space child-list backfill request.
    pub space_page_size: u16,
    /// Members per chunk when paging a room's member list.
    pub member_chunk_size: u16,
    /// Capacity of each diff batch channel.
    pub diff_channel_capacity: usize,
    /// Capacity of pagination status, typing, connection, and space
    /// metadata channels.
    pub signal_channel_capacity: usize,
    /// Capacity of each projection's outcome event channel.
    pub event_channel_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            room_list_page_size: 100,
            timeline_page_size: 200,
            space_page_size: 100,
            member_chunk_size: 1000,
            diff_channel_capacity: 64,
            signal_channel_capacity: 16,
            event_channel_capacity: 16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.room_list_page_size, 100);
        assert_eq!(config.timeline_page_size, 200);
        assert_eq!(config.member_chunk_size, 1000);
        assert_eq!(config.diff_channel_capacity, 64);
    }
}
