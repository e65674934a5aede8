use crate::{error::TransportError, sequence::BitSequence};

/// Raw SWDIO access provided by a debug probe, bridge or simulator.
///
/// This is the only seam between the protocol engine and hardware.
pub trait Transport {
    /// Clock out `sequence` on SWDIO.
    ///
    /// For every [`Drive`](crate::Direction::Drive) position the probe drives the line
    /// with the given bit, for every [`Receive`](crate::Direction::Receive) position it
    /// releases the line and samples it.
    ///
    /// The returned sequence must have the same length and directions as `sequence`,
    /// with the sampled value stored at each receive position. Driven positions are
    /// echoed back.
    fn exchange(&mut self, sequence: &BitSequence) -> Result<BitSequence, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn exchange(&mut self, sequence: &BitSequence) -> Result<BitSequence, TransportError> {
        (**self).exchange(sequence)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn exchange(&mut self, sequence: &BitSequence) -> Result<BitSequence, TransportError> {
        (**self).exchange(sequence)
    }
}
