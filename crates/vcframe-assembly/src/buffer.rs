use tracing::{debug, trace, warn};
use vcframe_protocol::{CodecSpecificInfo, FrameType, Packet, StoredFrame, VideoCodec};

use crate::assembler::{Fragmentation, InsertContext, PartitionMode, PayloadAssembler};
use crate::config::AssemblyConfig;
use crate::error::{FrameError, InsertError, PayloadError, SizeError};
use crate::session::SessionAssembler;
use crate::state::FrameState;

/// Outcome of an accepted insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Incomplete,
    Decodable,
    Complete,
}

/// Size limits applied to one frame buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLimits {
    pub max_frame_size: usize,
    pub growth_step: usize,
    pub independent_partitions: bool,
}

impl Default for FrameLimits {
    fn default() -> Self {
        AssemblyConfig::default().limits()
    }
}

/// Capacity to grow to so that `required` bytes fit: the smallest multiple
/// of `step` not below `required`. `None` when that exceeds `max`.
pub fn grown_capacity(required: usize, step: usize, max: usize) -> Option<usize> {
    let capacity = required.div_ceil(step).checked_mul(step)?;
    (capacity <= max).then_some(capacity)
}

/// Frame information frozen when the frame is handed to the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedFrame {
    pub frame_type: FrameType,
    pub complete: bool,
    /// A frame before this one was lost.
    pub missing_previous: bool,
    pub fragmentation: Option<Fragmentation>,
}

/// Assembles the packets of one video frame.
///
/// Not synchronized: the owner serializes every call on one buffer. The
/// byte storage is kept across occupancies and only ever grows.
#[derive(Debug)]
pub struct FrameBuffer<A = SessionAssembler> {
    state: FrameState,
    /// Allocated frame storage; its length is the buffer capacity.
    data: Vec<u8>,
    /// Payload bytes written so far.
    length: usize,
    timestamp: Option<u32>,
    codec: VideoCodec,
    payload_type: u8,
    codec_info: CodecSpecificInfo,
    nack_count: u16,
    latest_packet_time_ms: Option<i64>,
    frame_counted: bool,
    encoded_width: u32,
    encoded_height: u32,
    render_time_ms: i64,
    finalized: Option<FinalizedFrame>,
    limits: FrameLimits,
    assembler: A,
}

impl FrameBuffer<SessionAssembler> {
    pub fn new(config: &AssemblyConfig) -> Self {
        Self::with_assembler(config.limits(), SessionAssembler::new(config))
    }
}

impl<A: PayloadAssembler> FrameBuffer<A> {
    pub fn with_assembler(limits: FrameLimits, assembler: A) -> Self {
        Self {
            state: FrameState::Free,
            data: Vec::new(),
            length: 0,
            timestamp: None,
            codec: VideoCodec::Generic,
            payload_type: 0,
            codec_info: CodecSpecificInfo::Unknown,
            nack_count: 0,
            latest_packet_time_ms: None,
            frame_counted: false,
            encoded_width: 0,
            encoded_height: 0,
            render_time_ms: 0,
            finalized: None,
            limits,
            assembler,
        }
    }

    /// Insert one packet of this frame.
    ///
    /// Nothing is modified unless the packet passes the state, timestamp
    /// and size checks. A frame already handed to the decoder swallows the
    /// packet and reports `Incomplete`.
    pub fn insert(
        &mut self,
        packet: &Packet,
        arrival_time_ms: i64,
        decodable_mode: bool,
        rtt_ms: u32,
    ) -> Result<SessionStatus, InsertError> {
        if !self.state.accepts_packets() {
            if self.state == FrameState::Decoding {
                trace!(seq = packet.seq_num, "frame already decoding, packet ignored");
                return Ok(SessionStatus::Incomplete);
            }
            return Err(InsertError::State);
        }

        if let Some(expected) = self.timestamp {
            if expected != packet.timestamp {
                debug!(expected, got = packet.timestamp, seq = packet.seq_num, "timestamp mismatch");
                return Err(InsertError::Timestamp {
                    expected,
                    got: packet.timestamp,
                });
            }
        }

        let required = self.length + packet.required_bytes();
        if required > self.limits.max_frame_size {
            debug!(required, max = self.limits.max_frame_size, seq = packet.seq_num, "frame too large");
            return Err(SizeError::ExceedsMax {
                required,
                max: self.limits.max_frame_size,
            }
            .into());
        }
        if packet.size_bytes > 0 && packet.payload.is_none() {
            return Err(SizeError::MissingPayload {
                declared: packet.size_bytes,
            }
            .into());
        }

        if required > self.capacity() {
            self.grow(required)?;
        }

        if packet.is_media() && !self.assembler.have_start_seq_num() {
            self.assembler.set_start_seq_num(packet.seq_num);
        }
        if packet.payload.is_some() {
            self.payload_type = packet.payload_type;
        }
        if self.timestamp.is_none() {
            self.timestamp = Some(packet.timestamp);
        }
        if self.state == FrameState::Empty && packet.is_media() {
            self.codec = packet.codec;
            self.transition(FrameState::Incomplete);
        }
        self.codec_info.merge(&packet.codec_header);

        let ctx = InsertContext { decodable_mode, rtt_ms };
        let written = match self
            .assembler
            .insert_payload(packet, &mut self.data, self.length, ctx)
        {
            Ok(n) => n,
            Err(PayloadError::Duplicate(seq)) => {
                trace!(seq, "duplicate packet");
                return Err(InsertError::Duplicate(seq));
            }
            Err(PayloadError::Size) => return Err(SizeError::Rejected.into()),
        };
        self.length += written;
        self.latest_packet_time_ms = Some(arrival_time_ms);

        Ok(self.update_status())
    }

    /// Derive the state from the assembler's verdict after a write.
    fn update_status(&mut self) -> SessionStatus {
        if self.assembler.is_complete() {
            self.transition(FrameState::Complete);
            return SessionStatus::Complete;
        }

        if self.state == FrameState::Complete {
            // A later layer of this frame is still missing.
            debug!(timestamp = ?self.timestamp, "complete frame reverted to incomplete");
            self.state = FrameState::Incomplete;
        }

        if self.assembler.is_decodable() {
            self.transition(FrameState::Decodable);
            return SessionStatus::Decodable;
        }
        SessionStatus::Incomplete
    }

    /// Internal transition on a path that has already validated it.
    fn transition(&mut self, to: FrameState) {
        debug_assert!(
            self.state.can_transition_to(to),
            "illegal frame state transition {:?} -> {:?}",
            self.state,
            to
        );
        self.state = to;
    }

    /// Grow the storage so `required` bytes fit, then tell the assembler.
    fn grow(&mut self, required: usize) -> Result<(), SizeError> {
        let max = self.limits.max_frame_size;
        let step = self.limits.growth_step;
        let capacity = grown_capacity(required, step, max).ok_or(SizeError::Growth {
            capacity: required.div_ceil(step).saturating_mul(step),
            max,
        })?;
        self.resize_storage(capacity)
            .map_err(|_| SizeError::Allocation { capacity })
    }

    fn resize_storage(&mut self, capacity: usize) -> Result<(), std::collections::TryReserveError> {
        let old_capacity = self.data.len();
        self.data.try_reserve_exact(capacity - old_capacity)?;
        self.data.resize(capacity, 0);
        self.assembler.buffer_resized(old_capacity, capacity);
        debug!(old_capacity, capacity, "frame buffer grown");
        Ok(())
    }

    /// Move the occupancy to `target`.
    ///
    /// `Free` resets from any state. `Decoding` is final for the occupancy:
    /// only `Free` leaves it. Entering `Decoding` finalizes the payload.
    pub fn set_state(&mut self, target: FrameState) -> Result<(), FrameError> {
        if self.state == target {
            return Ok(());
        }
        if target == FrameState::Free {
            self.reset();
            return Ok(());
        }
        if self.state == FrameState::Decoding || !self.state.can_transition_to(target) {
            return Err(FrameError::InvalidTransition {
                from: self.state,
                to: target,
            });
        }
        if target == FrameState::Decoding {
            self.finalize();
        }
        self.state = target;
        Ok(())
    }

    /// Reserve a free buffer for the frame with `timestamp`.
    pub fn reserve(&mut self, timestamp: u32) -> Result<(), FrameError> {
        self.set_state(FrameState::Empty)?;
        self.timestamp = Some(timestamp);
        Ok(())
    }

    fn finalize(&mut self) {
        if self.finalized.is_some() {
            // Extracted from storage; already decoder-ready.
            return;
        }
        let mode = self.partition_mode();
        let prepared = self
            .assembler
            .prepare_for_decode(&mut self.data, self.length, mode);
        self.length = prepared.length;
        self.finalized = Some(FinalizedFrame {
            frame_type: self.assembler.frame_type(),
            complete: self.assembler.is_complete(),
            missing_previous: self.assembler.previous_frame_loss(),
            fragmentation: prepared.fragmentation,
        });
        trace!(timestamp = ?self.timestamp, length = self.length, "frame finalized");
    }

    fn partition_mode(&self) -> PartitionMode {
        PartitionMode::for_codec(self.codec, self.limits.independent_partitions)
    }

    /// Drop the packets the decoder cannot use.
    pub fn make_session_decodable(&mut self) {
        if self.finalized.is_some() || self.partition_mode() == PartitionMode::Partitioned {
            return;
        }
        let removed = self.assembler.make_decodable(&mut self.data, self.length);
        self.length -= removed;
    }

    /// Return the occupancy to `Free`. The storage is kept for reuse.
    pub fn reset(&mut self) {
        self.length = 0;
        self.timestamp = None;
        self.codec = VideoCodec::Generic;
        self.payload_type = 0;
        self.codec_info = CodecSpecificInfo::Unknown;
        self.nack_count = 0;
        self.latest_packet_time_ms = None;
        self.frame_counted = false;
        self.encoded_width = 0;
        self.encoded_height = 0;
        self.render_time_ms = 0;
        self.finalized = None;
        self.assembler.reset();
        self.state = FrameState::Free;
    }

    /// Fill the occupancy from a frame recovered from storage.
    ///
    /// Only a `Free` or `Empty` buffer can take a stored frame; whatever
    /// padding an `Empty` one collected is dropped.
    pub fn extract_from_storage(&mut self, stored: &StoredFrame) -> Result<(), FrameError> {
        if !matches!(self.state, FrameState::Free | FrameState::Empty) {
            return Err(FrameError::Occupied(self.state));
        }
        let size = stored.payload.len();
        let max = self.limits.max_frame_size;
        if size > self.capacity() {
            let Some(capacity) = grown_capacity(size, self.limits.growth_step, max) else {
                warn!(size, max, timestamp = stored.timestamp, "stored frame too large");
                return Err(FrameError::Memory { size, max });
            };
            self.resize_storage(capacity)
                .map_err(|_| FrameError::Memory { size, max })?;
        }

        let state = self.state;
        self.reset();
        self.state = state;

        self.data[..size].copy_from_slice(&stored.payload);
        self.length = size;
        self.timestamp = Some(stored.timestamp);
        self.payload_type = stored.payload_type;
        self.codec = stored.codec;
        self.encoded_width = stored.encoded_width;
        self.encoded_height = stored.encoded_height;
        self.render_time_ms = stored.render_time_ms;
        self.finalized = Some(FinalizedFrame {
            frame_type: stored.frame_type,
            complete: stored.complete_frame,
            missing_previous: stored.missing_frame,
            fragmentation: None,
        });
        Ok(())
    }

    /// Clear, in a sequence-ordered list of missing sequence numbers, the
    /// entries up to and including this frame's lowest sequence number and
    /// every entry the frame already received.
    pub fn zero_out_seq_nums(&self, list: &mut [Option<u16>]) -> Result<(), FrameError> {
        if self.state == FrameState::Free {
            return Err(FrameError::NotOccupied);
        }
        self.assembler.zero_out_seq_nums(list)?;
        Ok(())
    }

    /// Like [`zero_out_seq_nums`](Self::zero_out_seq_nums); FEC packets and
    /// gaps not worth a retransmission at `rtt_ms` are cleared as well.
    pub fn zero_out_seq_nums_hybrid(
        &self,
        list: &mut [Option<u16>],
        rtt_ms: u32,
    ) -> Result<(), FrameError> {
        if self.state == FrameState::Free {
            return Err(FrameError::NotOccupied);
        }
        self.assembler.zero_out_seq_nums_hybrid(list, rtt_ms)?;
        Ok(())
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn state_with_timestamp(&self) -> (FrameState, Option<u32>) {
        (self.state, self.timestamp)
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// The assembled payload.
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.length]
    }

    pub fn timestamp(&self) -> Option<u32> {
        self.timestamp
    }

    pub fn latest_packet_time_ms(&self) -> Option<i64> {
        self.latest_packet_time_ms
    }

    pub fn nack_count(&self) -> u16 {
        self.nack_count
    }

    pub fn increment_nack_count(&mut self) {
        self.nack_count = self.nack_count.saturating_add(1);
    }

    pub fn frame_counted(&self) -> bool {
        self.frame_counted
    }

    pub fn set_frame_counted(&mut self, counted: bool) {
        self.frame_counted = counted;
    }

    pub fn codec(&self) -> VideoCodec {
        self.codec
    }

    pub fn payload_type(&self) -> u8 {
        self.payload_type
    }

    pub fn codec_info(&self) -> &CodecSpecificInfo {
        &self.codec_info
    }

    pub fn encoded_size(&self) -> (u32, u32) {
        (self.encoded_width, self.encoded_height)
    }

    pub fn render_time_ms(&self) -> i64 {
        self.render_time_ms
    }

    /// Decoder-facing information; set once the frame entered `Decoding`
    /// or was extracted from storage.
    pub fn finalized(&self) -> Option<&FinalizedFrame> {
        self.finalized.as_ref()
    }

    pub fn frame_type(&self) -> FrameType {
        match &self.finalized {
            Some(f) => f.frame_type,
            None => self.assembler.frame_type(),
        }
    }

    pub fn set_previous_frame_loss(&mut self) {
        self.assembler.set_previous_frame_loss();
    }

    pub fn low_seq_num(&self) -> Option<u16> {
        self.assembler.low_seq_num()
    }

    pub fn high_seq_num(&self) -> Option<u16> {
        self.assembler.high_seq_num()
    }

    pub fn picture_id(&self) -> Option<u16> {
        self.assembler.picture_id()
    }

    pub fn is_session_complete(&self) -> bool {
        self.assembler.is_complete()
    }

    pub fn have_last_packet(&self) -> bool {
        self.assembler.have_last_packet()
    }

    pub fn not_decodable_packets(&self) -> usize {
        self.assembler.not_decodable_packets()
    }

    pub fn assembler(&self) -> &A {
        &self.assembler
    }
}
