use serde::{Deserialize, Serialize};

use crate::codec::VideoCodec;
use crate::error::ProtocolError;
use crate::frame::FrameType;

/// A complete encoded frame as persisted by the frame store.
///
/// Frames recovered from storage bypass packet-by-packet assembly and are
/// copied straight into a frame buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFrame {
    pub frame_type: FrameType,
    pub timestamp: u32,
    pub payload_type: u8,
    pub codec: VideoCodec,
    pub encoded_width: u32,
    pub encoded_height: u32,
    /// Wall-clock time the frame should be rendered at, in milliseconds.
    pub render_time_ms: i64,
    pub complete_frame: bool,
    /// The frame preceding this one was lost.
    pub missing_frame: bool,
    pub payload: Vec<u8>,
}

impl StoredFrame {
    /// Serialize for the frame store.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ProtocolError> {
        Ok(postcard::to_allocvec(self)?)
    }

    /// Deserialize a stored frame, refusing payloads above `max_payload`.
    pub fn from_bytes(data: &[u8], max_payload: usize) -> Result<Self, ProtocolError> {
        let frame: Self = postcard::from_bytes(data)?;
        if frame.payload.len() > max_payload {
            return Err(ProtocolError::StoredFrameTooLarge {
                size: frame.payload.len(),
                max: max_payload,
            });
        }
        Ok(frame)
    }
}
