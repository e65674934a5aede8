//! # Serial Wire Debug framing and register transactions
//!
//! This crate implements the host side of the ARM Serial Wire Debug (SWD) protocol at
//! the bit level: it builds the sequences clocked out on SWDIO, decodes the acknowledge
//! returned by the target and performs DP and AP register reads and writes.
//!
//! The physical side is abstracted by the [`Transport`] trait, which a probe driver,
//! FPGA bridge or simulator implements. [`FakeTarget`] is a simulated target that can
//! be used in its place.
//!
//! ## Reading the DPIDR register
//!
//! ```
//! use swd_wire::{dp, FakeTarget, PortType, SwdEngine};
//!
//! let target = FakeTarget::new().with_register(PortType::DebugPort, dp::DPIDR, 0x2BA0_1477);
//! let mut engine = SwdEngine::new(target);
//!
//! engine.jtag_to_swd_switch()?;
//! engine.line_reset()?;
//!
//! let dpidr = engine.read_register(PortType::DebugPort, dp::DPIDR)?;
//! assert_eq!(dpidr, 0x2BA0_1477);
//! # Ok::<(), swd_wire::SwdError>(())
//! ```
//!
//! ## Handling acknowledges
//!
//! WAIT, FAULT and malformed acknowledges are returned as [`SwdError::Acknowledge`].
//! The engine never retries: the caller decides whether to issue a line reset, clear
//! sticky errors through [`dp::ABORT`] or give up.
//!
//! ```
//! use swd_wire::{AckCode, FakeTarget, PortType, RegisterAddress, SwdEngine, SwdError};
//!
//! let mut target = FakeTarget::new();
//! target.queue_ack(AckCode::Wait);
//!
//! let mut engine = SwdEngine::new(target);
//! let result = engine.write_register(PortType::AccessPort, RegisterAddress::new(1), 0x23);
//!
//! assert!(matches!(result, Err(SwdError::Acknowledge(AckCode::Wait))));
//! ```

mod ack;
pub mod dp;
mod engine;
mod error;
mod fake_target;
pub mod protocol;
mod sequence;
mod transport;

pub use crate::ack::AckCode;
pub use crate::engine::{SwdEngine, SwdSettings};
pub use crate::error::{SwdError, TransportError};
pub use crate::fake_target::FakeTarget;
pub use crate::protocol::{PortType, RegisterAddress, Transaction, TransferDirection};
pub use crate::sequence::{BitSequence, Direction};
pub use crate::transport::Transport;
