//! Bit sequences exchanged on the SWDIO line.

use std::fmt;
use std::ops::Add;

use bitvec::prelude::*;

/// Direction of a single SWDIO clock cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// The host drives the line with the associated bit.
    Drive,
    /// The host releases the line and samples whatever the target drives.
    Receive,
}

/// An ordered list of SWDIO bits, each tagged with the direction of the line
/// during that clock cycle.
///
/// For [`Direction::Receive`] positions the stored bit is a placeholder
/// (`false`) until a [`Transport`](crate::Transport) fills in the sampled value.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct BitSequence {
    io: Vec<bool>,
    direction: Vec<Direction>,
}

impl BitSequence {
    /// Create an empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sequence of driven bits.
    pub fn drive(bits: impl IntoIterator<Item = bool>) -> Self {
        let mut this = Self::new();
        for bit in bits {
            this.add_output(bit);
        }
        this
    }

    /// Create a sequence of `length` receive cycles.
    pub fn receive(length: usize) -> Self {
        let mut this = Self::new();
        this.add_input_sequence(length);
        this
    }

    /// Create a sequence driving the lowest `bits` bits of `data`, least significant bit
    /// of the first byte first.
    pub fn from_bytes(data: &[u8], bits: usize) -> Self {
        Self::drive(data.view_bits::<Lsb0>().iter().by_vals().take(bits))
    }

    /// Concatenate two sequences.
    pub fn concat(mut self, other: &BitSequence) -> Self {
        self.extend(other);
        self
    }

    /// Append `other` to the end of this sequence.
    pub fn extend(&mut self, other: &BitSequence) {
        self.io.extend_from_slice(&other.io);
        self.direction.extend_from_slice(&other.direction);
    }

    pub fn add_output(&mut self, bit: bool) {
        self.io.push(bit);
        self.direction.push(Direction::Drive);
    }

    pub fn add_input(&mut self) {
        self.io.push(false);
        self.direction.push(Direction::Receive);
    }

    pub fn add_input_sequence(&mut self, length: usize) {
        for _ in 0..length {
            self.add_input();
        }
    }

    pub fn len(&self) -> usize {
        self.io.len()
    }

    pub fn is_empty(&self) -> bool {
        self.io.is_empty()
    }

    /// The line values, one per clock cycle.
    pub fn io_bits(&self) -> impl Iterator<Item = bool> + '_ {
        self.io.iter().copied()
    }

    /// The line directions, one per clock cycle.
    pub fn direction_bits(&self) -> impl Iterator<Item = Direction> + '_ {
        self.direction.iter().copied()
    }

    /// The values at [`Direction::Drive`] positions, in order.
    pub fn driven_bits(&self) -> impl Iterator<Item = bool> + '_ {
        self.iter()
            .filter(|(_, dir)| *dir == Direction::Drive)
            .map(|(bit, _)| bit)
    }

    /// The values at [`Direction::Receive`] positions, in order.
    pub fn received_bits(&self) -> impl Iterator<Item = bool> + '_ {
        self.iter()
            .filter(|(_, dir)| *dir == Direction::Receive)
            .map(|(bit, _)| bit)
    }

    /// Iterate over `(bit, direction)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (bool, Direction)> + '_ {
        self.io_bits().zip(self.direction_bits())
    }

    /// Number of [`Direction::Receive`] positions.
    pub fn receive_len(&self) -> usize {
        self.direction
            .iter()
            .filter(|dir| **dir == Direction::Receive)
            .count()
    }

    /// Replace the values at receive positions with `sampled`, in order.
    ///
    /// Returns `None` if `sampled` does not contain exactly one bit per receive position.
    pub fn with_received(&self, sampled: impl IntoIterator<Item = bool>) -> Option<Self> {
        let mut sampled = sampled.into_iter();
        let mut filled = self.clone();

        for (bit, dir) in filled.io.iter_mut().zip(&filled.direction) {
            if *dir == Direction::Receive {
                *bit = sampled.next()?;
            }
        }

        match sampled.next() {
            Some(_) => None,
            None => Some(filled),
        }
    }
}

impl Add<&BitSequence> for BitSequence {
    type Output = BitSequence;

    fn add(self, rhs: &BitSequence) -> BitSequence {
        self.concat(rhs)
    }
}

impl Add for BitSequence {
    type Output = BitSequence;

    fn add(self, rhs: BitSequence) -> BitSequence {
        self.concat(&rhs)
    }
}

impl FromIterator<(bool, Direction)> for BitSequence {
    fn from_iter<I: IntoIterator<Item = (bool, Direction)>>(iter: I) -> Self {
        let (io, direction) = iter.into_iter().unzip();
        BitSequence { io, direction }
    }
}

impl<'a> Extend<&'a BitSequence> for BitSequence {
    fn extend<I: IntoIterator<Item = &'a BitSequence>>(&mut self, iter: I) {
        for sequence in iter {
            BitSequence::extend(self, sequence);
        }
    }
}

/// `1`/`0` for driven bits, `h`/`l` for receive cycles.
impl fmt::Display for BitSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (bit, dir) in self.iter() {
            let c = match (dir, bit) {
                (Direction::Drive, true) => '1',
                (Direction::Drive, false) => '0',
                (Direction::Receive, true) => 'h',
                (Direction::Receive, false) => 'l',
            };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for BitSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitSequence({}: {})", self.len(), self)
    }
}

/// Assemble up to 32 bits, least significant first, into a word.
pub(crate) fn bits_to_word(bits: impl IntoIterator<Item = bool>) -> u32 {
    let mut word = BitArray::<[u32; 1], Lsb0>::new([0]);

    for (index, bit) in bits.into_iter().take(32).enumerate() {
        word.set(index, bit);
    }

    word.load_le()
}

#[cfg(test)]
mod test {
    use super::{bits_to_word, BitSequence, Direction};
    use pretty_assertions::assert_eq;

    #[test]
    fn drive_and_receive_directions() {
        let seq = BitSequence::drive([true, false]) + BitSequence::receive(3);

        assert_eq!(seq.len(), 5);
        assert_eq!(
            seq.direction_bits().collect::<Vec<_>>(),
            vec![
                Direction::Drive,
                Direction::Drive,
                Direction::Receive,
                Direction::Receive,
                Direction::Receive
            ]
        );
        assert_eq!(seq.receive_len(), 3);
        assert!(seq.received_bits().all(|bit| !bit));
    }

    #[test]
    fn concat_is_associative_with_empty_identity() {
        let a = BitSequence::drive([true, true, false]);
        let b = BitSequence::receive(2);
        let c = BitSequence::drive([false, true]);

        let left = (a.clone() + &b) + &c;
        let right = a.clone() + (b.clone() + &c);
        assert_eq!(left, right);

        assert_eq!(BitSequence::new() + &a, a);
        assert_eq!(a.clone() + BitSequence::new(), a);
    }

    #[test]
    fn from_bytes_is_lsb_first() {
        let seq = BitSequence::from_bytes(&[0b0000_0110, 0x01], 10);

        assert_eq!(seq.to_string(), "0110000010");
    }

    #[test]
    fn with_received_fills_only_receive_positions() {
        let seq = BitSequence::drive([true]) + BitSequence::receive(2) + BitSequence::drive([false]);

        let filled = seq.with_received([true, false]).unwrap();
        assert_eq!(filled.to_string(), "1hl0");
        assert_eq!(filled.driven_bits().collect::<Vec<_>>(), vec![true, false]);

        assert!(seq.with_received([true]).is_none());
        assert!(seq.with_received([true, true, true]).is_none());
    }

    #[test]
    fn collect_pairs() {
        let seq: BitSequence = [(true, Direction::Drive), (false, Direction::Receive)]
            .into_iter()
            .collect();

        assert_eq!(seq.to_string(), "1l");
    }

    #[test]
    fn word_from_bits() {
        let bits = (0..32).map(|i| (0xDEAD_BEEFu32 >> i) & 1 == 1);
        assert_eq!(bits_to_word(bits), 0xDEAD_BEEF);

        assert_eq!(bits_to_word([true, false, true]), 0b101);
    }
}
