use serde::{Deserialize, Serialize};

/// Frame type tag carried by every depacketized packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum FrameType {
    /// Padding or FEC packet with no media of its own.
    #[default]
    Empty = 0x00,
    /// Part of an intra-coded (IDR) frame.
    Key = 0x01,
    /// Part of an inter-coded frame.
    Delta = 0x02,
}

impl FrameType {
    /// Whether packets of this type carry media payload.
    pub fn is_media(self) -> bool {
        !matches!(self, Self::Empty)
    }

    pub fn is_key(self) -> bool {
        matches!(self, Self::Key)
    }
}
