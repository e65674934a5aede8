//! A simulated SWD target, usable as a [`Transport`] in tests and dry runs.

use std::collections::VecDeque;

use crate::{
    ack::AckCode,
    dp,
    error::TransportError,
    protocol::{self, PortType, RegisterAddress, DATA_BITS, HEADER_BITS, PARITY_BITS},
    sequence::{bits_to_word, BitSequence, Direction},
    transport::Transport,
};

/// Minimum number of consecutive high bits the target treats as a line reset.
const LINE_RESET_MIN_BITS: usize = 50;

#[derive(Debug, Clone, Copy)]
struct Request {
    port: PortType,
    address: RegisterAddress,
    read: bool,
}

impl Request {
    /// Decode the last [`HEADER_BITS`] driven bits, if they form a valid header.
    fn decode(bits: &[bool]) -> Option<Self> {
        let &[start, ap_n_dp, read, a2, a3, parity, stop, park] = bits else {
            return None;
        };

        if !start || stop || !park || parity != (ap_n_dp ^ read ^ a2 ^ a3) {
            return None;
        }

        let port = if ap_n_dp {
            PortType::AccessPort
        } else {
            PortType::DebugPort
        };

        Some(Request {
            port,
            address: RegisterAddress::new(u8::from(a2) | (u8::from(a3) << 1)),
            read,
        })
    }

    fn is_dp_write_to_targetsel(&self) -> bool {
        self.port == PortType::DebugPort && self.address == dp::TARGETSEL && !self.read
    }
}

#[derive(Debug)]
struct PendingWrite {
    port: PortType,
    address: RegisterAddress,
    targetsel: bool,
    bits: Vec<bool>,
}

/// A loop-back SWD target.
///
/// The target decodes request headers from the driven bits, answers with an acknowledge
/// and keeps one 32-bit value per DP and AP register address. Reads return the last
/// value written, so DP and AP registers behave like plain memory.
///
/// Acknowledges default to OK, other responses can be queued with
/// [`FakeTarget::queue_ack`].
#[derive(Debug)]
pub struct FakeTarget {
    dp: [u32; 4],
    ap: [u32; 4],

    acks: VecDeque<AckCode>,
    connected: bool,
    corrupt_read_parity: bool,

    pending_write: Option<PendingWrite>,
    after_line_reset: bool,
    selected_target: Option<u32>,

    exchanges: Vec<BitSequence>,
    line_resets: usize,
    write_parity_errors: usize,
}

impl Default for FakeTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeTarget {
    pub fn new() -> Self {
        FakeTarget {
            dp: [0; 4],
            ap: [0; 4],
            acks: VecDeque::new(),
            connected: true,
            corrupt_read_parity: false,
            pending_write: None,
            after_line_reset: false,
            selected_target: None,
            exchanges: Vec::new(),
            line_resets: 0,
            write_parity_errors: 0,
        }
    }

    /// Preload a register value.
    pub fn with_register(mut self, port: PortType, address: RegisterAddress, value: u32) -> Self {
        self.set_register(port, address, value);
        self
    }

    pub fn set_register(&mut self, port: PortType, address: RegisterAddress, value: u32) {
        *self.register_mut(port, address) = value;
    }

    pub fn register(&self, port: PortType, address: RegisterAddress) -> u32 {
        match port {
            PortType::DebugPort => self.dp[address.index() as usize],
            PortType::AccessPort => self.ap[address.index() as usize],
        }
    }

    fn register_mut(&mut self, port: PortType, address: RegisterAddress) -> &mut u32 {
        match port {
            PortType::DebugPort => &mut self.dp[address.index() as usize],
            PortType::AccessPort => &mut self.ap[address.index() as usize],
        }
    }

    /// Answer the next request with `ack` instead of OK.
    pub fn queue_ack(&mut self, ack: AckCode) {
        self.acks.push_back(ack);
    }

    /// A disconnected target never drives the line, which then reads high.
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    /// Invert the parity bit of every read response.
    pub fn set_corrupt_read_parity(&mut self, corrupt: bool) {
        self.corrupt_read_parity = corrupt;
    }

    /// All sequences received through [`Transport::exchange`], in order.
    pub fn exchanges(&self) -> &[BitSequence] {
        &self.exchanges
    }

    pub fn clear_exchanges(&mut self) {
        self.exchanges.clear();
    }

    /// Number of line resets seen on the wire.
    pub fn line_resets(&self) -> usize {
        self.line_resets
    }

    /// The last value written to TARGETSEL directly after a line reset.
    pub fn selected_target(&self) -> Option<u32> {
        self.selected_target
    }

    /// Number of write data phases dropped because of a parity error.
    pub fn write_parity_errors(&self) -> usize {
        self.write_parity_errors
    }

    /// Level of the line while the target is not driving it.
    fn idle_level(&self) -> bool {
        !self.connected
    }

    fn respond(&mut self, request: Request) -> VecDeque<bool> {
        let mut out = VecDeque::new();

        if !self.connected {
            return out;
        }

        // The first request after a line reset may be a TARGETSEL write, which is never
        // acknowledged.
        let after_line_reset = std::mem::take(&mut self.after_line_reset);
        if after_line_reset && request.is_dp_write_to_targetsel() {
            self.start_write(request, true);
            return out;
        }

        let ack = self.acks.pop_front().unwrap_or(AckCode::Ok);
        tracing::trace!("Fake target: {:?} -> {}", request, ack);

        let code = ack.raw();
        out.extend((0..3).map(|i| (code >> i) & 1 == 1));

        if !ack.is_ok() {
            return out;
        }

        if request.read {
            let value = self.register(request.port, request.address);
            out.extend((0..DATA_BITS).map(|i| (value >> i) & 1 == 1));
            out.push_back(protocol::parity(value) ^ self.corrupt_read_parity);
        } else {
            self.start_write(request, false);
        }

        out
    }

    fn start_write(&mut self, request: Request, targetsel: bool) {
        self.pending_write = Some(PendingWrite {
            port: request.port,
            address: request.address,
            targetsel,
            bits: Vec::with_capacity(DATA_BITS + PARITY_BITS),
        });
    }

    fn finish_write(&mut self, write: PendingWrite) {
        let value = bits_to_word(write.bits[..DATA_BITS].iter().copied());

        if protocol::parity(value) != write.bits[DATA_BITS] {
            tracing::debug!("Fake target: parity error in write data {:#010x}", value);
            self.write_parity_errors += 1;
            return;
        }

        if write.targetsel {
            self.selected_target = Some(value);
        } else {
            self.set_register(write.port, write.address, value);
        }
    }

    fn record_line_reset(&mut self) {
        tracing::trace!("Fake target: line reset");
        self.line_resets += 1;
        self.pending_write = None;
        self.after_line_reset = true;
    }
}

impl Transport for FakeTarget {
    fn exchange(&mut self, sequence: &BitSequence) -> Result<BitSequence, TransportError> {
        self.exchanges.push(sequence.clone());

        let mut response = Vec::with_capacity(sequence.len());

        // Driven bits since the last receive cycle.
        let mut driven: Vec<bool> = Vec::new();
        let mut high_bits = 0;
        let mut target_output: VecDeque<bool> = VecDeque::new();

        for (bit, dir) in sequence.iter() {
            match dir {
                Direction::Drive => {
                    response.push((bit, dir));
                    target_output.clear();

                    if bit {
                        high_bits += 1;
                    } else {
                        if high_bits >= LINE_RESET_MIN_BITS {
                            self.record_line_reset();
                        }
                        high_bits = 0;
                    }

                    // A line reset is recognised in any state, including a data phase.
                    if high_bits == LINE_RESET_MIN_BITS && self.pending_write.take().is_some() {
                        tracing::trace!("Fake target: write data phase aborted by line reset");
                    }

                    if let Some(write) = self.pending_write.as_mut() {
                        write.bits.push(bit);
                        let complete = write.bits.len() == DATA_BITS + PARITY_BITS;

                        if complete {
                            if let Some(write) = self.pending_write.take() {
                                self.finish_write(write);
                            }
                        }
                        continue;
                    }

                    driven.push(bit);
                }
                Direction::Receive => {
                    if !driven.is_empty() {
                        if high_bits >= LINE_RESET_MIN_BITS {
                            self.record_line_reset();
                        }
                        high_bits = 0;

                        let header = &driven[driven.len().saturating_sub(HEADER_BITS)..];
                        if let Some(request) = Request::decode(header) {
                            target_output = self.respond(request);
                        }
                        driven.clear();
                    }

                    let level = target_output
                        .pop_front()
                        .unwrap_or_else(|| self.idle_level());
                    response.push((level, dir));
                }
            }
        }

        if high_bits >= LINE_RESET_MIN_BITS {
            self.record_line_reset();
        }

        Ok(response.into_iter().collect())
    }
}
