/// Lifecycle state of a frame buffer occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameState {
    /// Not reserved for any frame.
    #[default]
    Free,
    /// Reserved for a timestamp, no media yet.
    Empty,
    Incomplete,
    /// Not complete, but enough arrived to decode with acceptable loss.
    Decodable,
    Complete,
    /// Handed to the decoder; accepts no further packets.
    Decoding,
}

impl FrameState {
    /// Whether `self -> to` is in the transition table.
    ///
    /// Same-state transitions are no-ops and always allowed. Reverting a
    /// `Complete` frame to `Incomplete` when another layer turns up is done
    /// by the insertion path directly and is not part of this table.
    pub fn can_transition_to(self, to: FrameState) -> bool {
        use FrameState::*;

        if self == to {
            return true;
        }
        match to {
            Free => true,
            Empty => self == Free,
            Incomplete => matches!(self, Empty | Decoding),
            Complete => matches!(self, Empty | Incomplete | Decodable),
            Decodable => matches!(self, Empty | Incomplete),
            Decoding => matches!(self, Complete | Incomplete | Decodable | Empty),
        }
    }

    /// Whether the occupancy may still receive packets.
    pub fn accepts_packets(self) -> bool {
        !matches!(self, FrameState::Free | FrameState::Decoding)
    }
}
