use bytes::Bytes;

use crate::codec::{CodecHeader, VideoCodec};
use crate::frame::FrameType;

/// Length of the Annex-B start code some NAL units must be prefixed with.
pub const START_CODE_LENGTH: usize = 4;

pub const START_CODE: [u8; START_CODE_LENGTH] = [0x00, 0x00, 0x00, 0x01];

/// One depacketized RTP fragment of a video frame.
///
/// Produced by the transport layer; all packets of a frame share
/// `timestamp`. `size_bytes` is the payload length the depacketizer
/// announced, which a malformed packet may not back with data.
#[derive(Debug, Clone)]
pub struct Packet {
    /// RTP sequence number, wraps modulo 2^16.
    pub seq_num: u16,
    /// Capture timestamp shared by every packet of the frame.
    pub timestamp: u32,
    pub payload: Option<Bytes>,
    pub size_bytes: usize,
    pub frame_type: FrameType,
    pub payload_type: u8,
    pub codec: VideoCodec,
    pub codec_header: CodecHeader,
    /// Prepend [`START_CODE`] before the payload.
    pub insert_start_code: bool,
    /// First packet of the frame, or of its simulcast layer.
    pub is_first_packet: bool,
    /// RTP marker bit: last packet of the frame, or of its simulcast layer.
    pub marker_bit: bool,
    pub simulcast_idx: u8,
}

impl Packet {
    /// Create a media packet carrying `payload`.
    pub fn media(
        seq_num: u16,
        timestamp: u32,
        frame_type: FrameType,
        codec: VideoCodec,
        payload: impl Into<Bytes>,
    ) -> Self {
        let payload = payload.into();
        Self {
            seq_num,
            timestamp,
            size_bytes: payload.len(),
            payload: Some(payload),
            frame_type,
            payload_type: 0,
            codec,
            codec_header: CodecHeader::None,
            insert_start_code: false,
            is_first_packet: false,
            marker_bit: false,
            simulcast_idx: 0,
        }
    }

    /// Create a padding/FEC packet that only occupies a sequence number.
    pub fn empty(seq_num: u16, timestamp: u32) -> Self {
        Self {
            seq_num,
            timestamp,
            payload: None,
            size_bytes: 0,
            frame_type: FrameType::Empty,
            payload_type: 0,
            codec: VideoCodec::Generic,
            codec_header: CodecHeader::None,
            insert_start_code: false,
            is_first_packet: false,
            marker_bit: false,
            simulcast_idx: 0,
        }
    }

    pub fn first(mut self) -> Self {
        self.is_first_packet = true;
        self
    }

    pub fn last(mut self) -> Self {
        self.marker_bit = true;
        self
    }

    pub fn with_start_code(mut self) -> Self {
        self.insert_start_code = true;
        self
    }

    pub fn with_payload_type(mut self, payload_type: u8) -> Self {
        self.payload_type = payload_type;
        self
    }

    pub fn with_codec_header(mut self, header: CodecHeader) -> Self {
        self.codec_header = header;
        self
    }

    pub fn on_layer(mut self, simulcast_idx: u8) -> Self {
        self.simulcast_idx = simulcast_idx;
        self
    }

    pub fn is_media(&self) -> bool {
        self.frame_type.is_media()
    }

    /// Announced payload bytes, or `None` when the data is missing or
    /// shorter than announced.
    pub fn payload_bytes(&self) -> Option<&[u8]> {
        match &self.payload {
            Some(p) if p.len() >= self.size_bytes => Some(&p[..self.size_bytes]),
            None if self.size_bytes == 0 => Some(&[]),
            _ => None,
        }
    }

    /// Bytes this packet occupies once written into a frame.
    pub fn required_bytes(&self) -> usize {
        self.size_bytes + if self.insert_start_code { START_CODE_LENGTH } else { 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_packet_sizes_from_payload() {
        let pkt = Packet::media(7, 9000, FrameType::Delta, VideoCodec::Vp8, vec![1u8, 2, 3]);
        assert_eq!(pkt.size_bytes, 3);
        assert_eq!(pkt.payload_bytes(), Some(&[1u8, 2, 3][..]));
        assert!(pkt.is_media());
        assert!(!pkt.is_first_packet);
        assert!(!pkt.marker_bit);
    }

    #[test]
    fn start_code_adds_to_required_bytes() {
        let pkt = Packet::media(1, 0, FrameType::Key, VideoCodec::H264, vec![0u8; 10])
            .with_start_code();
        assert_eq!(pkt.required_bytes(), 10 + START_CODE_LENGTH);
    }

    #[test]
    fn empty_packet_has_no_payload() {
        let pkt = Packet::empty(3, 100);
        assert!(!pkt.is_media());
        assert_eq!(pkt.required_bytes(), 0);
        assert_eq!(pkt.payload_bytes(), Some(&[][..]));
    }

    #[test]
    fn missing_payload_is_not_readable() {
        let mut pkt = Packet::empty(3, 100);
        pkt.size_bytes = 20;
        assert!(pkt.payload_bytes().is_none());

        let mut short = Packet::media(4, 100, FrameType::Delta, VideoCodec::Generic, vec![0u8; 5]);
        short.size_bytes = 8;
        assert!(short.payload_bytes().is_none());
    }

    #[test]
    fn builders_set_flags() {
        let pkt = Packet::media(1, 0, FrameType::Key, VideoCodec::Vp8, vec![0u8])
            .first()
            .last()
            .on_layer(2)
            .with_payload_type(96);
        assert!(pkt.is_first_packet);
        assert!(pkt.marker_bit);
        assert_eq!(pkt.simulcast_idx, 2);
        assert_eq!(pkt.payload_type, 96);
    }
}
