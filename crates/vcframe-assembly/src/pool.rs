use tracing::debug;
use vcframe_protocol::Packet;

use crate::assembler::PayloadAssembler;
use crate::buffer::{FrameBuffer, SessionStatus};
use crate::config::AssemblyConfig;
use crate::error::PoolError;
use crate::session::SessionAssembler;
use crate::state::FrameState;

/// Fixed set of reusable frame buffers keyed by capture timestamp.
///
/// Access to a buffer goes through `&mut self`, so at most one caller can
/// hold a given occupancy at a time. Share a pool between threads behind a
/// mutex.
#[derive(Debug)]
pub struct FramePool<A = SessionAssembler> {
    frames: Vec<FrameBuffer<A>>,
}

impl FramePool<SessionAssembler> {
    pub fn new(config: &AssemblyConfig) -> Self {
        let frames = (0..config.pool_size).map(|_| FrameBuffer::new(config)).collect();
        Self { frames }
    }
}

impl<A: PayloadAssembler> FramePool<A> {
    pub fn from_frames(frames: Vec<FrameBuffer<A>>) -> Self {
        Self { frames }
    }

    fn position(&self, timestamp: u32) -> Option<usize> {
        self.frames
            .iter()
            .position(|f| f.state() != FrameState::Free && f.timestamp() == Some(timestamp))
    }

    /// The buffer holding `timestamp`, reserving a free one if none does.
    pub fn frame_for(&mut self, timestamp: u32) -> Result<&mut FrameBuffer<A>, PoolError> {
        let index = match self.position(timestamp) {
            Some(i) => i,
            None => {
                let i = self
                    .frames
                    .iter()
                    .position(|f| f.state() == FrameState::Free)
                    .ok_or(PoolError::Exhausted(self.frames.len()))?;
                self.frames[i].reserve(timestamp)?;
                debug!(timestamp, slot = i, "frame buffer reserved");
                i
            }
        };
        Ok(&mut self.frames[index])
    }

    /// Route a packet to the buffer of its timestamp.
    pub fn insert(
        &mut self,
        packet: &Packet,
        arrival_time_ms: i64,
        decodable_mode: bool,
        rtt_ms: u32,
    ) -> Result<SessionStatus, PoolError> {
        let frame = self.frame_for(packet.timestamp)?;
        Ok(frame.insert(packet, arrival_time_ms, decodable_mode, rtt_ms)?)
    }

    pub fn get(&self, timestamp: u32) -> Option<&FrameBuffer<A>> {
        self.position(timestamp).map(|i| &self.frames[i])
    }

    pub fn get_mut(&mut self, timestamp: u32) -> Option<&mut FrameBuffer<A>> {
        self.position(timestamp).map(|i| &mut self.frames[i])
    }

    /// Reset the buffer holding `timestamp`. Returns whether one did.
    pub fn release(&mut self, timestamp: u32) -> bool {
        match self.get_mut(timestamp) {
            Some(frame) => {
                frame.reset();
                true
            }
            None => false,
        }
    }

    pub fn free_count(&self) -> usize {
        self.frames
            .iter()
            .filter(|f| f.state() == FrameState::Free)
            .count()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Occupied buffers, in pool order.
    pub fn occupied(&self) -> impl Iterator<Item = &FrameBuffer<A>> {
        self.frames.iter().filter(|f| f.state() != FrameState::Free)
    }
}
