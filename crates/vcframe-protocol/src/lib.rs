//! Packet and frame vocabulary shared between the depacketizer, the frame
//! assembly buffers and the frame store.

pub mod codec;
pub mod error;
pub mod frame;
pub mod packet;
pub mod storage;

pub use codec::{CodecHeader, CodecSpecificInfo, Vp8Header, Vp8Info, VideoCodec};
pub use error::ProtocolError;
pub use frame::FrameType;
pub use packet::{Packet, START_CODE, START_CODE_LENGTH};
pub use storage::StoredFrame;
