use thiserror::Error;

use crate::state::FrameState;

/// Why a packet was refused for exceeding what the frame can hold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SizeError {
    #[error("frame would grow to {required} bytes (max {max})")]
    ExceedsMax { required: usize, max: usize },

    #[error("packet announces {declared} payload bytes but carries fewer")]
    MissingPayload { declared: usize },

    #[error("buffer growth to {capacity} bytes exceeds max {max}")]
    Growth { capacity: usize, max: usize },

    #[error("buffer allocation of {capacity} bytes failed")]
    Allocation { capacity: usize },

    #[error("assembler refused the payload")]
    Rejected,
}

/// Failure of [`FrameBuffer::insert`](crate::FrameBuffer::insert).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InsertError {
    #[error("frame buffer is not reserved for any frame")]
    State,

    #[error("timestamp mismatch: frame holds {expected}, packet has {got}")]
    Timestamp { expected: u32, got: u32 },

    #[error("size error: {0}")]
    Size(#[from] SizeError),

    #[error("duplicate packet {0}")]
    Duplicate(u16),
}

impl InsertError {
    /// Duplicates are expected under retransmission and change nothing.
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::Duplicate(_))
    }

    /// Size errors end the frame; the owner should reset the occupancy.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Size(_))
    }
}

/// Failure reported by a [`PayloadAssembler`](crate::PayloadAssembler) on insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("payload does not fit the frame")]
    Size,

    #[error("sequence number {0} already inserted")]
    Duplicate(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NackListError {
    #[error("nack list out of sequence order at index {0}")]
    Unordered(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("invalid frame state transition {from:?} -> {to:?}")]
    InvalidTransition { from: FrameState, to: FrameState },

    #[error("frame buffer is not reserved for any frame")]
    NotOccupied,

    #[error("frame buffer already holds packets ({0:?})")]
    Occupied(FrameState),

    #[error("stored frame of {size} bytes does not fit (max {max})")]
    Memory { size: usize, max: usize },

    #[error("nack list: {0}")]
    NackList(#[from] NackListError),
}

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("all {0} frame buffers are in use")]
    Exhausted(usize),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Insert(#[from] InsertError),
}
