use vcframe_protocol::{FrameType, Packet, VideoCodec};

use crate::error::{NackListError, PayloadError};

/// Per-insertion knobs the frame buffer forwards to its assembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InsertContext {
    /// Allow a partial frame to be declared decodable.
    pub decodable_mode: bool,
    pub rtt_ms: u32,
}

/// How a frame's payload is laid out for the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionMode {
    /// One contiguous run of packets from the first packet on.
    Contiguous,
    /// Independently decodable partitions described by a [`Fragmentation`].
    Partitioned,
}

impl PartitionMode {
    pub fn for_codec(codec: VideoCodec, independent_partitions: bool) -> Self {
        if independent_partitions && codec.has_independent_partitions() {
            Self::Partitioned
        } else {
            Self::Contiguous
        }
    }
}

/// One decodable partition inside the finalized payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentEntry {
    pub partition_id: u8,
    pub offset: usize,
    pub length: usize,
}

/// Partition boundaries of a finalized frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Fragmentation {
    pub entries: Vec<FragmentEntry>,
}

impl Fragmentation {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Result of rewriting a payload into decoder-ready form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedFrame {
    pub length: usize,
    pub fragmentation: Option<Fragmentation>,
}

/// Places packet payloads into a frame buffer and judges the frame.
///
/// The frame buffer owns the byte storage and passes it in on every call
/// that touches payload bytes. Implementations keep only offsets relative to
/// the start of that storage, never references into it.
pub trait PayloadAssembler {
    /// Write `packet` into `buffer`, whose first `filled` bytes hold the
    /// frame so far. Returns the number of bytes added.
    ///
    /// `buffer.len()` is the current capacity; the caller grows it before
    /// the call so the packet fits.
    fn insert_payload(
        &mut self,
        packet: &Packet,
        buffer: &mut [u8],
        filled: usize,
        ctx: InsertContext,
    ) -> Result<usize, PayloadError>;

    fn have_start_seq_num(&self) -> bool;

    fn set_start_seq_num(&mut self, seq: u16);

    fn is_complete(&self) -> bool;

    fn is_decodable(&self) -> bool;

    /// Called by the owner after every reallocation of the frame storage.
    fn buffer_resized(&mut self, old_capacity: usize, new_capacity: usize);

    /// Clear, in a sequence-ordered list of missing sequence numbers, every
    /// entry this frame has already covered.
    fn zero_out_seq_nums(&self, list: &mut [Option<u16>]) -> Result<(), NackListError>;

    /// Like [`zero_out_seq_nums`](Self::zero_out_seq_nums), also dropping
    /// FEC packets and gaps not worth requesting at `rtt_ms`.
    fn zero_out_seq_nums_hybrid(
        &self,
        list: &mut [Option<u16>],
        rtt_ms: u32,
    ) -> Result<(), NackListError>;

    fn frame_type(&self) -> FrameType;

    fn previous_frame_loss(&self) -> bool;

    fn set_previous_frame_loss(&mut self);

    fn low_seq_num(&self) -> Option<u16>;

    fn high_seq_num(&self) -> Option<u16>;

    fn have_last_packet(&self) -> bool;

    fn picture_id(&self) -> Option<u16>;

    /// Drop packets that cannot be decoded. Returns the bytes removed from
    /// the end of the first `filled` bytes of `buffer`.
    fn make_decodable(&mut self, buffer: &mut [u8], filled: usize) -> usize;

    fn prepare_for_decode(
        &mut self,
        buffer: &mut [u8],
        filled: usize,
        mode: PartitionMode,
    ) -> PreparedFrame;

    /// Media packets dropped by [`make_decodable`](Self::make_decodable) or
    /// finalization.
    fn not_decodable_packets(&self) -> usize;

    fn reset(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_mode_needs_switch_and_capability() {
        assert_eq!(PartitionMode::for_codec(VideoCodec::Vp8, true), PartitionMode::Partitioned);
        assert_eq!(PartitionMode::for_codec(VideoCodec::Vp8, false), PartitionMode::Contiguous);
        assert_eq!(PartitionMode::for_codec(VideoCodec::H264, true), PartitionMode::Contiguous);
    }
}
