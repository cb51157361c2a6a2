use tracing::trace;
use vcframe_protocol::{FrameType, Packet, START_CODE, START_CODE_LENGTH};

use crate::assembler::{
    FragmentEntry, Fragmentation, InsertContext, PartitionMode, PayloadAssembler, PreparedFrame,
};
use crate::config::AssemblyConfig;
use crate::error::{NackListError, PayloadError};
use crate::seq;

/// Position of one received packet inside the frame payload.
#[derive(Debug, Clone)]
struct Slot {
    seq: u16,
    /// Relative to the start of the owner's buffer.
    offset: usize,
    /// Bytes occupied, start code included.
    size: usize,
    frame_type: FrameType,
    first: bool,
    marker: bool,
    layer: u8,
    partition_id: u8,
    beginning_of_partition: bool,
}

impl Slot {
    fn end(&self) -> usize {
        self.offset + self.size
    }

    fn is_media(&self) -> bool {
        self.frame_type.is_media()
    }
}

/// Default [`PayloadAssembler`].
///
/// Keeps the frame's packets sorted by sequence number (wrap-aware) and
/// their payloads laid out back to back in the same order, so the payload
/// is identical whatever order the packets arrived in. A packet that lands
/// between two others shifts the later payloads to make room.
///
/// A frame is complete when every simulcast layer seen so far has its first
/// packet, its marker packet and no sequence gap in between. Padding/FEC
/// packets occupy sequence numbers but no bytes.
#[derive(Debug)]
pub struct SessionAssembler {
    slots: Vec<Slot>,
    start_seq: Option<u16>,
    frame_type: FrameType,
    picture_id: Option<u16>,
    complete: bool,
    decodable: bool,
    previous_frame_loss: bool,
    not_decodable_packets: usize,
    capacity: usize,
    max_packets: usize,
    decodable_rtt_threshold_ms: u32,
    nack_rtt_threshold_ms: u32,
}

impl SessionAssembler {
    pub fn new(config: &AssemblyConfig) -> Self {
        Self {
            slots: Vec::new(),
            start_seq: None,
            frame_type: FrameType::Empty,
            picture_id: None,
            complete: false,
            decodable: false,
            previous_frame_loss: false,
            not_decodable_packets: 0,
            capacity: 0,
            max_packets: config.max_packets_per_frame,
            decodable_rtt_threshold_ms: config.decodable_rtt_threshold_ms,
            nack_rtt_threshold_ms: config.nack_rtt_threshold_ms,
        }
    }

    /// Sequence number of the first media packet that reached this frame.
    pub fn start_seq_num(&self) -> Option<u16> {
        self.start_seq
    }

    /// Packets currently held, padding included.
    pub fn packet_count(&self) -> usize {
        self.slots.len()
    }

    /// Capacity the owner last reported.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn contains(&self, seq: u16) -> bool {
        self.slots.iter().any(|s| s.seq == seq)
    }

    fn count_in_range(&self, low: u16, high: u16) -> usize {
        self.slots
            .iter()
            .filter(|s| seq::in_range(s.seq, low, high))
            .count()
    }

    /// No sequence number between `low` and `high` is missing.
    fn contiguous(&self, low: u16, high: u16) -> bool {
        self.count_in_range(low, high) == seq::span(low, high)
    }

    fn insert_position(&self, seq: u16) -> Result<usize, PayloadError> {
        // Packets mostly arrive in order: scan from the back.
        for (i, slot) in self.slots.iter().enumerate().rev() {
            if slot.seq == seq {
                return Err(PayloadError::Duplicate(seq));
            }
            if seq::is_newer(seq, slot.seq) {
                return Ok(i + 1);
            }
        }
        Ok(0)
    }

    fn has_first_packet(&self) -> bool {
        self.slots
            .iter()
            .find(|s| s.is_media())
            .is_some_and(|s| s.first)
    }

    fn high_media_seq(&self) -> Option<u16> {
        self.slots.iter().rev().find(|s| s.is_media()).map(|s| s.seq)
    }

    fn layer_complete(&self, layer: u8) -> bool {
        let mut media = self
            .slots
            .iter()
            .filter(|s| s.is_media() && s.layer == layer);
        let Some(head) = media.next() else {
            return false;
        };
        let tail = media.last().unwrap_or(head);
        head.first && tail.marker && self.contiguous(head.seq, tail.seq)
    }

    fn compute_complete(&self) -> bool {
        let mut layers: Vec<u8> = self
            .slots
            .iter()
            .filter(|s| s.is_media())
            .map(|s| s.layer)
            .collect();
        layers.sort_unstable();
        layers.dedup();
        !layers.is_empty() && layers.iter().all(|&l| self.layer_complete(l))
    }

    fn update_decodable(&mut self, ctx: InsertContext) {
        if self.complete || self.decodable || !ctx.decodable_mode {
            return;
        }
        if self.frame_type.is_key() || !self.has_first_packet() {
            return;
        }
        if ctx.rtt_ms >= self.decodable_rtt_threshold_ms {
            self.decodable = true;
        }
    }

    /// Number of leading slots that decode: everything up to the first gap
    /// after a first packet. Zero when the first packet is missing.
    fn decodable_prefix(&self) -> usize {
        let Some(start) = self.slots.iter().position(Slot::is_media) else {
            return self.slots.len();
        };
        if !self.slots[start].first {
            return 0;
        }
        let mut end = start + 1;
        while end < self.slots.len()
            && self.slots[end].seq == self.slots[end - 1].seq.wrapping_add(1)
        {
            end += 1;
        }
        end
    }

    fn build_fragmentation(&mut self, buffer: &mut [u8], filled: usize) -> PreparedFrame {
        let media: Vec<Slot> = self.slots.iter().filter(|s| s.is_media()).cloned().collect();

        // Split into runs of one partition without sequence gaps.
        let mut runs = Vec::new();
        let mut start = 0;
        for i in 1..=media.len() {
            let breaks = i == media.len()
                || media[i].beginning_of_partition
                || media[i].partition_id != media[i - 1].partition_id
                || !self.contiguous(media[i - 1].seq, media[i].seq);
            if breaks {
                runs.push((start, i));
                start = i;
            }
        }

        let mut entries = Vec::new();
        let mut dst = 0;
        for (a, b) in runs {
            let head = &media[a];
            let tail = &media[b - 1];
            let closed = tail.marker
                || media.get(b).is_some_and(|next| {
                    next.beginning_of_partition && self.contiguous(tail.seq, next.seq)
                });
            if !(head.beginning_of_partition && closed) {
                self.not_decodable_packets += b - a;
                continue;
            }
            let offset = head.offset;
            let length = tail.end() - offset;
            buffer.copy_within(offset..offset + length, dst);
            entries.push(FragmentEntry {
                partition_id: head.partition_id,
                offset: dst,
                length,
            });
            dst += length;
        }
        debug_assert!(dst <= filled);

        PreparedFrame {
            length: dst,
            fragmentation: Some(Fragmentation { entries }),
        }
    }
}

fn check_order(list: &[Option<u16>]) -> Result<(), NackListError> {
    let mut prev: Option<u16> = None;
    for (i, entry) in list.iter().enumerate() {
        let Some(seq) = *entry else { continue };
        if let Some(p) = prev {
            if !seq::is_newer(seq, p) {
                return Err(NackListError::Unordered(i));
            }
        }
        prev = Some(seq);
    }
    Ok(())
}

impl PayloadAssembler for SessionAssembler {
    fn insert_payload(
        &mut self,
        packet: &Packet,
        buffer: &mut [u8],
        filled: usize,
        ctx: InsertContext,
    ) -> Result<usize, PayloadError> {
        if self.slots.len() >= self.max_packets {
            return Err(PayloadError::Size);
        }
        let payload = packet.payload_bytes().ok_or(PayloadError::Size)?;
        let position = self.insert_position(packet.seq_num)?;
        let size = packet.required_bytes();
        let offset = position
            .checked_sub(1)
            .map_or(0, |i| self.slots[i].end());
        if offset > filled || filled + size > buffer.len() {
            return Err(PayloadError::Size);
        }

        buffer.copy_within(offset..filled, offset + size);
        let mut cursor = offset;
        if packet.insert_start_code {
            buffer[cursor..cursor + START_CODE_LENGTH].copy_from_slice(&START_CODE);
            cursor += START_CODE_LENGTH;
        }
        buffer[cursor..cursor + payload.len()].copy_from_slice(payload);
        for slot in &mut self.slots[position..] {
            slot.offset += size;
        }

        let (partition_id, beginning_of_partition) = packet.codec_header.partition();
        self.slots.insert(
            position,
            Slot {
                seq: packet.seq_num,
                offset,
                size,
                frame_type: packet.frame_type,
                first: packet.is_first_packet,
                marker: packet.marker_bit,
                layer: packet.simulcast_idx,
                partition_id,
                beginning_of_partition,
            },
        );

        if packet.is_media() {
            if self.frame_type == FrameType::Empty || packet.is_first_packet {
                self.frame_type = packet.frame_type;
            }
            if let Some(id) = packet.codec_header.picture_id() {
                self.picture_id = Some(id);
            }
        }

        self.complete = self.compute_complete();
        self.update_decodable(ctx);
        trace!(seq = packet.seq_num, offset, size, "payload placed");
        Ok(size)
    }

    fn have_start_seq_num(&self) -> bool {
        self.start_seq.is_some()
    }

    fn set_start_seq_num(&mut self, seq: u16) {
        self.start_seq = Some(seq);
    }

    fn is_complete(&self) -> bool {
        self.complete
    }

    fn is_decodable(&self) -> bool {
        self.decodable
    }

    fn buffer_resized(&mut self, old_capacity: usize, new_capacity: usize) {
        debug_assert!(self.slots.iter().all(|s| s.end() <= new_capacity));
        trace!(old_capacity, new_capacity, "frame storage resized");
        self.capacity = new_capacity;
    }

    fn zero_out_seq_nums(&self, list: &mut [Option<u16>]) -> Result<(), NackListError> {
        check_order(list)?;
        let Some(low) = self.low_seq_num() else {
            return Ok(());
        };
        for entry in list.iter_mut() {
            if entry.is_some_and(|seq| !seq::is_newer(seq, low) || self.contains(seq)) {
                *entry = None;
            }
        }
        Ok(())
    }

    fn zero_out_seq_nums_hybrid(
        &self,
        list: &mut [Option<u16>],
        rtt_ms: u32,
    ) -> Result<(), NackListError> {
        self.zero_out_seq_nums(list)?;
        let (Some(low), Some(high)) = (self.low_seq_num(), self.high_seq_num()) else {
            return Ok(());
        };

        // FEC and padding follow the last media packet.
        if let Some(high_media) = self.high_media_seq() {
            for entry in list.iter_mut() {
                if entry.is_some_and(|s| seq::is_newer(s, high_media) && seq::in_range(s, low, high)) {
                    *entry = None;
                }
            }
        }

        if rtt_ms >= self.nack_rtt_threshold_ms && self.has_first_packet() && self.have_last_packet() {
            for entry in list.iter_mut() {
                if entry.is_some_and(|s| seq::in_range(s, low, high)) {
                    *entry = None;
                }
            }
        }
        Ok(())
    }

    fn frame_type(&self) -> FrameType {
        self.frame_type
    }

    fn previous_frame_loss(&self) -> bool {
        self.previous_frame_loss
    }

    fn set_previous_frame_loss(&mut self) {
        self.previous_frame_loss = true;
    }

    fn low_seq_num(&self) -> Option<u16> {
        self.slots.first().map(|s| s.seq)
    }

    fn high_seq_num(&self) -> Option<u16> {
        self.slots.last().map(|s| s.seq)
    }

    fn have_last_packet(&self) -> bool {
        self.slots.iter().any(|s| s.is_media() && s.marker)
    }

    fn picture_id(&self) -> Option<u16> {
        self.picture_id
    }

    fn make_decodable(&mut self, buffer: &mut [u8], filled: usize) -> usize {
        let keep = self.decodable_prefix();
        if keep == self.slots.len() {
            return 0;
        }
        let dropped = self.slots.split_off(keep);
        self.not_decodable_packets += dropped.iter().filter(|s| s.is_media()).count();
        let end = self.slots.last().map_or(0, Slot::end).min(filled);
        buffer[end..filled].fill(0);
        self.complete = self.compute_complete();
        trace!(dropped = dropped.len(), removed = filled - end, "dropped undecodable packets");
        filled - end
    }

    fn prepare_for_decode(
        &mut self,
        buffer: &mut [u8],
        filled: usize,
        mode: PartitionMode,
    ) -> PreparedFrame {
        match mode {
            PartitionMode::Partitioned => self.build_fragmentation(buffer, filled),
            PartitionMode::Contiguous if self.complete => PreparedFrame {
                length: filled,
                fragmentation: None,
            },
            PartitionMode::Contiguous => {
                let removed = self.make_decodable(buffer, filled);
                PreparedFrame {
                    length: filled - removed,
                    fragmentation: None,
                }
            }
        }
    }

    fn not_decodable_packets(&self) -> usize {
        self.not_decodable_packets
    }

    fn reset(&mut self) {
        self.slots.clear();
        self.start_seq = None;
        self.frame_type = FrameType::Empty;
        self.picture_id = None;
        self.complete = false;
        self.decodable = false;
        self.previous_frame_loss = false;
        self.not_decodable_packets = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vcframe_protocol::{CodecHeader, VideoCodec, Vp8Header};

    fn assembler() -> SessionAssembler {
        SessionAssembler::new(&AssemblyConfig::default())
    }

    fn delta(seq: u16, byte: u8, len: usize) -> Packet {
        Packet::media(seq, 3000, FrameType::Delta, VideoCodec::Generic, vec![byte; len])
    }

    /// Insert into `buf`, tracking the filled length like the frame buffer does.
    fn put(
        a: &mut SessionAssembler,
        buf: &mut [u8],
        filled: &mut usize,
        pkt: &Packet,
    ) -> Result<usize, PayloadError> {
        let n = a.insert_payload(pkt, buf, *filled, InsertContext::default())?;
        *filled += n;
        Ok(n)
    }

    #[test]
    fn out_of_order_payload_lands_in_sequence_order() {
        let mut a = assembler();
        let mut buf = vec![0u8; 64];
        let mut filled = 0;

        put(&mut a, &mut buf, &mut filled, &delta(3, 0xCC, 2).last()).unwrap();
        put(&mut a, &mut buf, &mut filled, &delta(1, 0xAA, 2).first()).unwrap();
        assert!(!a.is_complete());
        put(&mut a, &mut buf, &mut filled, &delta(2, 0xBB, 2)).unwrap();

        assert!(a.is_complete());
        assert_eq!(&buf[..filled], &[0xAA, 0xAA, 0xBB, 0xBB, 0xCC, 0xCC]);
        assert_eq!(a.low_seq_num(), Some(1));
        assert_eq!(a.high_seq_num(), Some(3));
    }

    #[test]
    fn duplicate_sequence_number_rejected() {
        let mut a = assembler();
        let mut buf = vec![0u8; 16];
        let mut filled = 0;
        put(&mut a, &mut buf, &mut filled, &delta(5, 1, 4)).unwrap();
        assert_eq!(
            put(&mut a, &mut buf, &mut filled, &delta(5, 1, 4)),
            Err(PayloadError::Duplicate(5))
        );
        assert_eq!(filled, 4);
        assert_eq!(a.packet_count(), 1);
    }

    #[test]
    fn payload_beyond_capacity_is_size_error() {
        let mut a = assembler();
        let mut buf = vec![0u8; 4];
        assert_eq!(
            a.insert_payload(&delta(1, 0, 8), &mut buf, 0, InsertContext::default()),
            Err(PayloadError::Size)
        );
        assert_eq!(a.packet_count(), 0);
    }

    #[test]
    fn packet_limit_is_size_error() {
        let config = AssemblyConfig {
            max_packets_per_frame: 2,
            ..Default::default()
        };
        let mut a = SessionAssembler::new(&config);
        let mut buf = vec![0u8; 16];
        let mut filled = 0;
        put(&mut a, &mut buf, &mut filled, &delta(1, 0, 1)).unwrap();
        put(&mut a, &mut buf, &mut filled, &delta(2, 0, 1)).unwrap();
        assert_eq!(
            put(&mut a, &mut buf, &mut filled, &delta(3, 0, 1)),
            Err(PayloadError::Size)
        );
    }

    #[test]
    fn start_code_is_prepended() {
        let mut a = assembler();
        let mut buf = vec![0u8; 16];
        let pkt = Packet::media(1, 0, FrameType::Key, VideoCodec::H264, vec![0x65, 0x88])
            .with_start_code()
            .first()
            .last();
        let n = a.insert_payload(&pkt, &mut buf, 0, InsertContext::default()).unwrap();
        assert_eq!(n, 6);
        assert_eq!(&buf[..n], &[0, 0, 0, 1, 0x65, 0x88]);
        assert_eq!(a.frame_type(), FrameType::Key);
    }

    #[test]
    fn sequence_wrap_keeps_order() {
        let mut a = assembler();
        let mut buf = vec![0u8; 16];
        let mut filled = 0;
        put(&mut a, &mut buf, &mut filled, &delta(0, 2, 1).last()).unwrap();
        put(&mut a, &mut buf, &mut filled, &delta(65535, 1, 1).first()).unwrap();
        assert!(a.is_complete());
        assert_eq!(&buf[..filled], &[1, 2]);
        assert_eq!(a.low_seq_num(), Some(65535));
        assert_eq!(a.high_seq_num(), Some(0));
    }

    #[test]
    fn padding_fills_sequence_gap() {
        let mut a = assembler();
        let mut buf = vec![0u8; 16];
        let mut filled = 0;
        put(&mut a, &mut buf, &mut filled, &delta(1, 1, 2).first()).unwrap();
        put(&mut a, &mut buf, &mut filled, &delta(3, 3, 2).last()).unwrap();
        assert!(!a.is_complete());
        put(&mut a, &mut buf, &mut filled, &Packet::empty(2, 3000)).unwrap();
        assert!(a.is_complete());
        assert_eq!(filled, 4);
    }

    #[test]
    fn only_padding_is_never_complete() {
        let mut a = assembler();
        let mut buf = vec![0u8; 4];
        a.insert_payload(&Packet::empty(9, 0).first().last(), &mut buf, 0, InsertContext::default())
            .unwrap();
        assert!(!a.is_complete());
        assert!(!a.have_last_packet());
    }

    #[test]
    fn new_layer_revokes_completeness() {
        let mut a = assembler();
        let mut buf = vec![0u8; 16];
        let mut filled = 0;
        put(&mut a, &mut buf, &mut filled, &delta(1, 1, 1).first().last()).unwrap();
        assert!(a.is_complete());
        put(&mut a, &mut buf, &mut filled, &delta(2, 2, 1).first().on_layer(1)).unwrap();
        assert!(!a.is_complete());
        put(&mut a, &mut buf, &mut filled, &delta(3, 3, 1).last().on_layer(1)).unwrap();
        assert!(a.is_complete());
    }

    #[test]
    fn decodable_needs_mode_first_packet_and_rtt() {
        let mut a = assembler();
        let mut buf = vec![0u8; 16];
        let high_rtt = InsertContext { decodable_mode: true, rtt_ms: 150 };

        // Missing first packet: not decodable
        a.insert_payload(&delta(2, 0, 1), &mut buf, 0, high_rtt).unwrap();
        assert!(!a.is_decodable());

        // First packet at low RTT: still waiting for retransmission
        let low_rtt = InsertContext { decodable_mode: true, rtt_ms: 20 };
        a.insert_payload(&delta(1, 0, 1).first(), &mut buf, 1, low_rtt).unwrap();
        assert!(!a.is_decodable());

        a.insert_payload(&delta(4, 0, 1), &mut buf, 2, high_rtt).unwrap();
        assert!(a.is_decodable());
        assert!(!a.is_complete());
    }

    #[test]
    fn key_frames_are_never_partially_decodable() {
        let mut a = assembler();
        let mut buf = vec![0u8; 16];
        let ctx = InsertContext { decodable_mode: true, rtt_ms: 500 };
        let pkt = Packet::media(1, 0, FrameType::Key, VideoCodec::Vp8, vec![0u8]).first();
        a.insert_payload(&pkt, &mut buf, 0, ctx).unwrap();
        assert!(!a.is_decodable());
    }

    #[test]
    fn zero_out_clears_up_to_low_and_received() {
        let mut a = assembler();
        let mut buf = vec![0u8; 16];
        let mut filled = 0;
        put(&mut a, &mut buf, &mut filled, &delta(10, 0, 1).first()).unwrap();
        put(&mut a, &mut buf, &mut filled, &delta(12, 0, 1)).unwrap();

        let mut list = vec![Some(8), Some(9), Some(10), Some(11), Some(12), Some(13)];
        a.zero_out_seq_nums(&mut list).unwrap();
        assert_eq!(list, vec![None, None, None, Some(11), None, Some(13)]);
    }

    #[test]
    fn zero_out_clears_older_without_low_in_list() {
        let mut a = assembler();
        let mut buf = vec![0u8; 16];
        let mut filled = 0;
        put(&mut a, &mut buf, &mut filled, &delta(1, 0, 1).first()).unwrap();
        put(&mut a, &mut buf, &mut filled, &delta(3, 0, 1).last()).unwrap();

        // Wraps: 65534 and 65535 precede 1
        let mut list = vec![Some(65534), Some(65535), Some(0), Some(2), Some(4)];
        a.zero_out_seq_nums(&mut list).unwrap();
        assert_eq!(list, vec![None, None, None, Some(2), Some(4)]);
    }

    #[test]
    fn zero_out_rejects_unordered_list() {
        let a = assembler();
        let mut list = vec![Some(5), None, Some(3)];
        assert_eq!(a.zero_out_seq_nums(&mut list), Err(NackListError::Unordered(2)));
    }

    #[test]
    fn hybrid_skips_trailing_fec() {
        let mut a = assembler();
        let mut buf = vec![0u8; 16];
        let mut filled = 0;
        put(&mut a, &mut buf, &mut filled, &delta(1, 0, 1).first()).unwrap();
        put(&mut a, &mut buf, &mut filled, &delta(3, 0, 1).last()).unwrap();
        put(&mut a, &mut buf, &mut filled, &Packet::empty(6, 3000)).unwrap();

        let mut list = vec![Some(2), Some(4), Some(5), Some(7)];
        a.zero_out_seq_nums_hybrid(&mut list, 10).unwrap();
        // 2 is a media gap worth requesting at low RTT; 4 and 5 sit between
        // the last media packet and the FEC packet.
        assert_eq!(list, vec![Some(2), None, None, Some(7)]);
    }

    #[test]
    fn hybrid_drops_gaps_at_high_rtt() {
        let mut a = assembler();
        let mut buf = vec![0u8; 16];
        let mut filled = 0;
        put(&mut a, &mut buf, &mut filled, &delta(1, 0, 1).first()).unwrap();
        put(&mut a, &mut buf, &mut filled, &delta(3, 0, 1).last()).unwrap();

        let mut list = vec![Some(2), Some(4)];
        a.zero_out_seq_nums_hybrid(&mut list, 300).unwrap();
        assert_eq!(list, vec![None, Some(4)]);
    }

    #[test]
    fn make_decodable_drops_after_gap() {
        let mut a = assembler();
        let mut buf = vec![0u8; 16];
        let mut filled = 0;
        put(&mut a, &mut buf, &mut filled, &delta(1, 1, 2).first()).unwrap();
        put(&mut a, &mut buf, &mut filled, &delta(2, 2, 2)).unwrap();
        put(&mut a, &mut buf, &mut filled, &delta(4, 4, 2).last()).unwrap();

        let removed = a.make_decodable(&mut buf, filled);
        assert_eq!(removed, 2);
        assert_eq!(a.not_decodable_packets(), 1);
        assert_eq!(a.high_seq_num(), Some(2));
        assert_eq!(&buf[..filled - removed], &[1, 1, 2, 2]);
    }

    #[test]
    fn make_decodable_without_first_packet_drops_everything() {
        let mut a = assembler();
        let mut buf = vec![0u8; 16];
        let mut filled = 0;
        put(&mut a, &mut buf, &mut filled, &delta(2, 2, 3)).unwrap();
        assert_eq!(a.make_decodable(&mut buf, filled), 3);
        assert_eq!(a.packet_count(), 0);
    }

    #[test]
    fn partitioned_prepare_keeps_closed_partitions() {
        let mut a = assembler();
        let mut buf = vec![0u8; 32];
        let mut filled = 0;
        let vp8 = |seq: u16, part: u8, begin: bool, byte: u8| {
            Packet::media(seq, 0, FrameType::Delta, VideoCodec::Vp8, vec![byte; 2]).with_codec_header(
                CodecHeader::Vp8(Vp8Header {
                    partition_id: part,
                    beginning_of_partition: begin,
                    ..Default::default()
                }),
            )
        };
        // Partition 0: seq 1-2, partition 1: seq 3 then lost 4, partition 2: seq 5 (marker)
        put(&mut a, &mut buf, &mut filled, &vp8(1, 0, true, 0xA0).first()).unwrap();
        put(&mut a, &mut buf, &mut filled, &vp8(2, 0, false, 0xA1)).unwrap();
        put(&mut a, &mut buf, &mut filled, &vp8(3, 1, true, 0xB0)).unwrap();
        put(&mut a, &mut buf, &mut filled, &vp8(5, 2, true, 0xC0).last()).unwrap();

        let prepared = a.prepare_for_decode(&mut buf, filled, PartitionMode::Partitioned);
        let frag = prepared.fragmentation.expect("fragmentation");
        assert_eq!(frag.len(), 2);
        assert_eq!(frag.entries[0], FragmentEntry { partition_id: 0, offset: 0, length: 4 });
        assert_eq!(frag.entries[1], FragmentEntry { partition_id: 2, offset: 4, length: 2 });
        assert_eq!(prepared.length, 6);
        assert_eq!(&buf[..6], &[0xA0, 0xA0, 0xA1, 0xA1, 0xC0, 0xC0]);
        assert_eq!(a.not_decodable_packets(), 1);
    }

    #[test]
    fn reset_clears_session() {
        let mut a = assembler();
        let mut buf = vec![0u8; 8];
        a.set_start_seq_num(1);
        a.set_previous_frame_loss();
        a.insert_payload(&delta(1, 0, 1).first().last(), &mut buf, 0, InsertContext::default())
            .unwrap();
        a.reset();
        assert!(!a.have_start_seq_num());
        assert!(!a.is_complete());
        assert!(!a.previous_frame_loss());
        assert_eq!(a.low_seq_num(), None);
        assert_eq!(a.frame_type(), FrameType::Empty);
    }
}
