//! Per-frame assembly of video packets that arrive out of order, duplicated
//! or not at all.
//!
//! A [`FrameBuffer`] collects the packets of one capture timestamp into a
//! contiguous payload and reports after every insertion whether the frame is
//! complete, decodable or still incomplete. Byte placement and completeness
//! rules live behind the [`PayloadAssembler`] trait; [`SessionAssembler`] is
//! the default implementation. A [`FramePool`] owns the buffers and hands
//! out exclusive access per timestamp.

pub mod assembler;
pub mod buffer;
pub mod config;
pub mod error;
pub mod pool;
pub mod seq;
pub mod session;
pub mod state;

pub use assembler::{
    FragmentEntry, Fragmentation, InsertContext, PartitionMode, PayloadAssembler, PreparedFrame,
};
pub use buffer::{FinalizedFrame, FrameBuffer, FrameLimits, SessionStatus};
pub use config::AssemblyConfig;
pub use error::{FrameError, InsertError, NackListError, PayloadError, PoolError, SizeError};
pub use pool::FramePool;
pub use session::SessionAssembler;
pub use state::FrameState;
