//! SWD packet framing.
//!
//! All functions in this module are pure constructors of [`BitSequence`]s. Every sequence
//! is listed in wire order: the first bit of the sequence is the first bit clocked out
//! on SWDIO.

use bitvec::prelude::*;

use crate::sequence::BitSequence;

/// Number of bits in a request header.
pub const HEADER_BITS: usize = 8;
/// Number of acknowledge bits following a header.
pub const ACK_BITS: usize = 3;
/// Number of data bits in a read or write payload.
pub const DATA_BITS: usize = 32;
/// Number of parity bits following a payload.
pub const PARITY_BITS: usize = 1;
/// Idle cycles appended to every receive window, keeping the line in a known state.
pub const TURNAROUND_BITS: usize = 8;
/// Number of driven high bits in a reset sequence.
pub const RESET_BITS: usize = 56;
/// Number of bits sampled after the header of a wake probe.
pub const WAKE_PROBE_RECEIVE_BITS: usize = 38;

/// The JTAG-to-SWD select sequence, transmitted least significant bit first.
///
/// On the wire this is `0111 1001 1110 0111`.
pub const JTAG_SWD_SWITCH: u16 = 0xE79E;

/// Number of bits in [`JTAG_SWD_SWITCH`].
pub const JTAG_SWD_SWITCH_BITS: usize = 16;

/// Selects which register set a request addresses.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum PortType {
    DebugPort,
    AccessPort,
}

/// A register inside a port, identified by the address bits A\[3:2\].
///
/// SWD requests can only address four 32-bit registers per port (per bank), so the
/// address is stored as an index in the range `0..=3`.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
pub struct RegisterAddress(u8);

impl RegisterAddress {
    /// Create an address from a register index in the range `0..=3`.
    ///
    /// Higher bits are discarded.
    pub const fn new(index: u8) -> Self {
        debug_assert!(index < 4, "Invalid register index");
        Self(index & 0b11)
    }

    /// Create an address from a byte address (`0x0`, `0x4`, `0x8` or `0xC`).
    ///
    /// Only bits 2 and 3 are used.
    pub const fn from_byte_address(address: u8) -> Self {
        debug_assert!(address & !0b1100 == 0, "Invalid register address");
        Self((address >> 2) & 0b11)
    }

    /// The register index, `0..=3`.
    pub const fn index(self) -> u8 {
        self.0
    }

    /// The byte address of the register, `0x0`, `0x4`, `0x8` or `0xC`.
    pub const fn byte_address(self) -> u8 {
        self.0 << 2
    }

    /// Address bit A2.
    pub const fn a2(self) -> bool {
        self.0 & 0b01 != 0
    }

    /// Address bit A3.
    pub const fn a3(self) -> bool {
        self.0 & 0b10 != 0
    }
}

impl std::fmt::Display for RegisterAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.byte_address())
    }
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum TransferDirection {
    Read,
    Write,
}

/// A single register access.
///
/// `value` holds the data to write for a write, and is filled in by
/// [`SwdEngine::transfer`](crate::SwdEngine::transfer) after a successful read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub port: PortType,
    pub address: RegisterAddress,
    pub direction: TransferDirection,
    pub value: Option<u32>,
}

impl Transaction {
    pub fn read(port: PortType, address: RegisterAddress) -> Self {
        Self {
            port,
            address,
            direction: TransferDirection::Read,
            value: None,
        }
    }

    pub fn write(port: PortType, address: RegisterAddress, value: u32) -> Self {
        Self {
            port,
            address,
            direction: TransferDirection::Write,
            value: Some(value),
        }
    }
}

/// Build the 8-bit request header.
pub fn header(address: RegisterAddress, read: bool, port: PortType) -> BitSequence {
    // APnDP (0 for DP, 1 for AP).
    let ap_n_dp = port == PortType::AccessPort;

    let a2 = address.a2();
    let a3 = address.a3();

    BitSequence::drive([
        // Start bit (always 1).
        true,
        ap_n_dp,
        // RnW (0 for Write, 1 for Read).
        read,
        a2,
        a3,
        // Even parity over APnDP, RnW, A2 and A3.
        ap_n_dp ^ read ^ a2 ^ a3,
        // Stop bit (always 0).
        false,
        // Park bit (always 1).
        true,
    ])
}

/// Build a write data phase: 32 data bits, LSB first, followed by the parity bit.
pub fn write_payload(value: u32) -> BitSequence {
    let data = value.view_bits::<Lsb0>();

    let mut sequence = BitSequence::drive(data.iter().by_vals());
    sequence.add_output(parity(value));

    sequence
}

/// Even parity of a data word: `true` if an odd number of bits is set.
pub fn parity(value: u32) -> bool {
    value.count_ones() % 2 == 1
}

/// [`RESET_BITS`] driven high bits.
pub fn reset() -> BitSequence {
    BitSequence::drive(std::iter::repeat(true).take(RESET_BITS))
}

/// A reset followed by [`TURNAROUND_BITS`] idle receive cycles.
pub fn line_reset() -> BitSequence {
    reset() + BitSequence::receive(TURNAROUND_BITS)
}

/// The 16-bit JTAG-to-SWD select sequence.
pub fn jtag_swd_switch() -> BitSequence {
    BitSequence::from_bytes(&JTAG_SWD_SWITCH.to_le_bytes(), JTAG_SWD_SWITCH_BITS)
}

#[cfg(test)]
mod test {
    use super::{
        header, jtag_swd_switch, line_reset, reset, write_payload, PortType, RegisterAddress,
        HEADER_BITS, RESET_BITS, TURNAROUND_BITS,
    };
    use crate::sequence::Direction;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test]
    fn dp_read_header() {
        let header = header(RegisterAddress::new(0), true, PortType::DebugPort);

        assert_eq!(
            header.io_bits().collect::<Vec<_>>(),
            vec![true, false, true, false, false, true, false, true]
        );
    }

    #[test]
    fn ap_write_header() {
        // APnDP=1, RnW=0, A2=1, A3=0 -> parity 0
        let header = header(RegisterAddress::from_byte_address(0x4), false, PortType::AccessPort);

        assert_eq!(header.to_string(), "11010001");
    }

    #[test]
    fn header_parity_for_all_requests() {
        for index in 0..4 {
            for read in [true, false] {
                for port in [PortType::DebugPort, PortType::AccessPort] {
                    let header = header(RegisterAddress::new(index), read, port);
                    let bits = header.io_bits().collect::<Vec<_>>();

                    assert_eq!(bits.len(), HEADER_BITS);
                    assert!(header.direction_bits().all(|d| d == Direction::Drive));
                    assert!(bits[0], "start bit");
                    assert_eq!(bits[1], port == PortType::AccessPort);
                    assert_eq!(bits[2], read);
                    assert_eq!(bits[5], bits[1] ^ bits[2] ^ bits[3] ^ bits[4]);
                    assert!(!bits[6], "stop bit");
                    assert!(bits[7], "park bit");
                }
            }
        }
    }

    #[test_case(0x0, 0; "dpidr")]
    #[test_case(0x4, 1; "ctrl stat")]
    #[test_case(0x8, 2; "select")]
    #[test_case(0xC, 3; "rdbuff")]
    fn byte_address_to_index(byte_address: u8, index: u8) {
        let address = RegisterAddress::from_byte_address(byte_address);

        assert_eq!(address.index(), index);
        assert_eq!(address.byte_address(), byte_address);
        assert_eq!(address, RegisterAddress::new(index));
    }

    #[test_case(0x0000_0000; "zero")]
    #[test_case(0x0000_0001; "one")]
    #[test_case(0xFFFF_FFFF; "all ones")]
    #[test_case(0x8000_0000; "msb")]
    #[test_case(0x1234_5678; "mixed")]
    fn write_payload_layout(value: u32) {
        let payload = write_payload(value);
        let bits = payload.io_bits().collect::<Vec<_>>();

        assert_eq!(bits.len(), 33);
        for (i, bit) in bits[..32].iter().enumerate() {
            assert_eq!(*bit, (value >> i) & 1 == 1, "bit {i}");
        }
        assert_eq!(bits[32], value.count_ones() % 2 == 1);
    }

    #[test]
    fn write_payload_parity_random() {
        for _ in 0..256 {
            let value: u32 = rand::random();
            let payload = write_payload(value);

            assert_eq!(payload.len(), 33);
            let ones = payload.io_bits().filter(|bit| *bit).count();
            // Data plus parity always has an even number of ones.
            assert_eq!(ones % 2, 0);
        }
    }

    #[test]
    fn reset_is_all_ones() {
        let reset = reset();

        assert_eq!(reset.len(), RESET_BITS);
        assert!(reset.io_bits().all(|bit| bit));
        assert!(reset.direction_bits().all(|d| d == Direction::Drive));
    }

    #[test]
    fn line_reset_ends_in_receive_cycles() {
        let line_reset = line_reset();

        assert_eq!(line_reset.len(), RESET_BITS + TURNAROUND_BITS);
        assert_eq!(line_reset.receive_len(), TURNAROUND_BITS);
        assert!(line_reset
            .direction_bits()
            .skip(RESET_BITS)
            .all(|d| d == Direction::Receive));
    }

    #[test]
    fn jtag_to_swd_pattern() {
        let switch = jtag_swd_switch();

        assert_eq!(switch.to_string(), "0111100111100111");
        assert_eq!(switch.receive_len(), 0);
    }
}
