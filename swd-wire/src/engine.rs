//! Register transactions on top of a [`Transport`].

use crate::{
    ack::AckCode,
    dp::{self, DebugPortId, Dpidr, TargetSel},
    error::{SwdError, TransportError},
    protocol::{
        self, PortType, RegisterAddress, Transaction, TransferDirection, ACK_BITS, DATA_BITS,
        PARITY_BITS, TURNAROUND_BITS, WAKE_PROBE_RECEIVE_BITS,
    },
    sequence::{bits_to_word, BitSequence, Direction},
    transport::Transport,
};

/// Settings for the SWD engine.
///
/// The defaults match what SWD targets expect out of reset.
#[derive(Debug, Clone, Default)]
pub struct SwdSettings {
    /// Check the parity bit of read data and fail with
    /// [`SwdError::IncorrectParity`] on a mismatch.
    ///
    /// Off by default, in which case the parity bit is sampled but ignored.
    pub verify_read_parity: bool,
}

/// Performs SWD line sequences and register transactions.
///
/// Every call is self-contained: the engine keeps no protocol state between calls.
/// WAIT and FAULT acknowledges are returned to the caller as errors, nothing is retried.
#[derive(Debug)]
pub struct SwdEngine<T> {
    transport: T,
    settings: SwdSettings,
}

impl<T: Transport> SwdEngine<T> {
    pub fn new(transport: T) -> Self {
        Self::with_settings(transport, SwdSettings::default())
    }

    pub fn with_settings(transport: T, settings: SwdSettings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    pub fn settings(&self) -> &SwdSettings {
        &self.settings
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Clock out `sequence` and return the bits sampled at its receive positions.
    fn exchange(&mut self, sequence: &BitSequence) -> Result<Vec<bool>, TransportError> {
        tracing::trace!("SWD out: {}", sequence);

        let response = self.transport.exchange(sequence)?;

        if response.len() != sequence.len() {
            return Err(TransportError::LengthMismatch {
                expected: sequence.len(),
                actual: response.len(),
            });
        }

        tracing::trace!("SWD in:  {}", response);

        // Use the request's directions, the transport only has to get the values right.
        Ok(sequence
            .direction_bits()
            .zip(response.io_bits())
            .filter(|(dir, _)| *dir == Direction::Receive)
            .map(|(_, bit)| bit)
            .collect())
    }

    /// Drive a line reset: 56 high bits followed by 8 idle cycles.
    pub fn line_reset(&mut self) -> Result<(), TransportError> {
        tracing::debug!("Performing line reset");

        self.exchange(&protocol::line_reset())?;

        Ok(())
    }

    /// Switch a SWJ-DP from JTAG to SWD.
    pub fn jtag_to_swd_switch(&mut self) -> Result<(), TransportError> {
        tracing::debug!("Switching from JTAG to SWD");

        let sequence = protocol::reset() + protocol::jtag_swd_switch() + protocol::reset();
        self.exchange(&sequence)?;

        Ok(())
    }

    /// Switch to SWD and try to read DPIDR.
    ///
    /// Returns `None` if the target does not acknowledge the read, e.g. because it is
    /// asleep or not connected.
    pub fn wake_probe(&mut self) -> Result<Option<u32>, TransportError> {
        let sequence = protocol::reset()
            + protocol::jtag_swd_switch()
            + protocol::reset()
            + protocol::header(dp::DPIDR, true, PortType::DebugPort)
            + BitSequence::receive(WAKE_PROBE_RECEIVE_BITS);

        let response = self.exchange(&sequence)?;

        let ack = AckCode::from_bits(response.iter().copied());
        if !ack.is_ok() {
            tracing::debug!("No response to wake probe: {}", ack);
            return Ok(None);
        }

        let dpidr = bits_to_word(response[ACK_BITS..][..DATA_BITS].iter().copied());
        tracing::debug!("Wake probe read DPIDR {:#010x}", dpidr);

        Ok(Some(dpidr))
    }

    /// Read a DP or AP register.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn read_register(
        &mut self,
        port: PortType,
        address: RegisterAddress,
    ) -> Result<u32, SwdError> {
        let request = protocol::header(address, true, port)
            + BitSequence::receive(ACK_BITS + DATA_BITS + PARITY_BITS)
            + BitSequence::receive(TURNAROUND_BITS);

        let response = self.exchange(&request)?;

        let ack = AckCode::from_bits(response.iter().copied());
        if !ack.is_ok() {
            tracing::debug!("Read of {:?} register {} failed: {}", port, address, ack);
            return Err(SwdError::Acknowledge(ack));
        }

        let data = &response[ACK_BITS..][..DATA_BITS];
        let value = bits_to_word(data.iter().copied());
        let parity_bit = response[ACK_BITS + DATA_BITS];

        if self.settings.verify_read_parity && protocol::parity(value) != parity_bit {
            tracing::debug!("Parity error on read of {:#010x}", value);
            return Err(SwdError::IncorrectParity { value });
        }

        tracing::trace!("DAP read {:#010x}", value);

        Ok(value)
    }

    /// Write a DP or AP register.
    ///
    /// The data phase is only driven if the target acknowledges the request with OK.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn write_register(
        &mut self,
        port: PortType,
        address: RegisterAddress,
        value: u32,
    ) -> Result<(), SwdError> {
        let request = protocol::header(address, false, port) + BitSequence::receive(ACK_BITS);

        let response = self.exchange(&request)?;

        let ack = AckCode::from_bits(response);
        if !ack.is_ok() {
            tracing::debug!("Write to {:?} register {} failed: {}", port, address, ack);
            return Err(SwdError::Acknowledge(ack));
        }

        self.exchange(&protocol::write_payload(value))?;

        Ok(())
    }

    /// Line reset immediately followed by a DP register write.
    ///
    /// Used for writing TARGETSEL, which the target does not acknowledge. The acknowledge
    /// window is clocked but ignored, and the data phase is always driven.
    pub fn line_reset_and_write(
        &mut self,
        address: RegisterAddress,
        value: u32,
    ) -> Result<(), TransportError> {
        tracing::debug!("Line reset and write of {:#010x} to DP {}", value, address);

        let sequence = protocol::line_reset()
            + protocol::header(address, false, PortType::DebugPort)
            + BitSequence::receive(ACK_BITS)
            + protocol::write_payload(value);

        self.exchange(&sequence)?;

        Ok(())
    }

    /// Select a target on a multi-drop bus.
    pub fn select_target(&mut self, target: TargetSel) -> Result<(), TransportError> {
        self.line_reset_and_write(dp::TARGETSEL, target.into())
    }

    /// Read and decode DPIDR.
    pub fn read_dpidr(&mut self) -> Result<DebugPortId, SwdError> {
        let dpidr = Dpidr::from(self.read_register(PortType::DebugPort, dp::DPIDR)?);

        Ok(dpidr.into())
    }

    /// Perform `transaction`, storing the value read for a read.
    ///
    /// A write without a value fails with [`SwdError::MissingWriteValue`] and nothing is
    /// sent to the target.
    pub fn transfer(&mut self, transaction: &mut Transaction) -> Result<(), SwdError> {
        match transaction.direction {
            TransferDirection::Read => {
                let value = self.read_register(transaction.port, transaction.address)?;
                transaction.value = Some(value);
            }
            TransferDirection::Write => {
                let value = transaction.value.ok_or(SwdError::MissingWriteValue(
                    transaction.port,
                    transaction.address,
                ))?;
                self.write_register(transaction.port, transaction.address, value)?;
            }
        }

        Ok(())
    }
}
