use serde::{Deserialize, Serialize};

/// Video codecs a frame can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum VideoCodec {
    Vp8 = 0x01,
    H264 = 0x02,
    I420 = 0x03,
    #[default]
    Generic = 0xFF,
}

impl VideoCodec {
    /// Whether the codec can split a frame into partitions that decode
    /// independently of each other (VP8 token partitions).
    pub fn has_independent_partitions(self) -> bool {
        matches!(self, Self::Vp8)
    }
}

/// VP8 payload descriptor fields the depacketizer extracted for one packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Vp8Header {
    pub picture_id: Option<u16>,
    pub tl0_pic_idx: Option<u8>,
    pub temporal_idx: Option<u8>,
    pub layer_sync: bool,
    pub key_idx: Option<u8>,
    pub non_reference: bool,
    pub partition_id: u8,
    pub beginning_of_partition: bool,
}

/// Codec-specific part of a packet's RTP video header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodecHeader {
    #[default]
    None,
    Vp8(Vp8Header),
    H264,
}

impl CodecHeader {
    pub fn vp8(&self) -> Option<&Vp8Header> {
        match self {
            Self::Vp8(h) => Some(h),
            _ => None,
        }
    }

    pub fn picture_id(&self) -> Option<u16> {
        self.vp8().and_then(|h| h.picture_id)
    }

    /// VP8 partition this packet belongs to, and whether it opens it.
    /// Other codecs behave as a single partition opened by every packet.
    pub fn partition(&self) -> (u8, bool) {
        match self {
            Self::Vp8(h) => (h.partition_id, h.beginning_of_partition),
            _ => (0, true),
        }
    }
}

/// Per-frame VP8 information accumulated from the packet headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Vp8Info {
    pub picture_id: Option<u16>,
    pub tl0_pic_idx: Option<u8>,
    pub temporal_idx: u8,
    pub layer_sync: bool,
    pub key_idx: Option<u8>,
    pub non_reference: bool,
}

/// Codec-specific frame information handed to the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodecSpecificInfo {
    #[default]
    Unknown,
    Vp8(Vp8Info),
}

impl CodecSpecificInfo {
    /// Fold one packet's header into the frame information.
    ///
    /// Fields the packet leaves unset keep the value an earlier packet of the
    /// same frame provided. Headers of other codecs clear the information;
    /// packets without a codec header leave it as is.
    pub fn merge(&mut self, header: &CodecHeader) {
        match header {
            CodecHeader::Vp8(h) => {
                if !matches!(self, Self::Vp8(_)) {
                    *self = Self::Vp8(Vp8Info::default());
                }
                if let Self::Vp8(info) = self {
                    info.non_reference = h.non_reference;
                    if h.picture_id.is_some() {
                        info.picture_id = h.picture_id;
                    }
                    if h.tl0_pic_idx.is_some() {
                        info.tl0_pic_idx = h.tl0_pic_idx;
                    }
                    if let Some(tid) = h.temporal_idx {
                        info.temporal_idx = tid;
                        info.layer_sync = h.layer_sync;
                    }
                    if h.key_idx.is_some() {
                        info.key_idx = h.key_idx;
                    }
                }
            }
            CodecHeader::H264 => *self = Self::Unknown,
            CodecHeader::None => {}
        }
    }
}
