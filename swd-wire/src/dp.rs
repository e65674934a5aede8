//! Debug Port registers used during connection setup.

use bitfield::bitfield;
use jep106::JEP106Code;

use crate::protocol::RegisterAddress;

/// DPIDR, read only.
pub const DPIDR: RegisterAddress = RegisterAddress::new(0);
/// ABORT, write only. Shares its address with [`DPIDR`].
pub const ABORT: RegisterAddress = RegisterAddress::new(0);
/// CTRL/STAT, in DP bank 0.
pub const CTRL_STAT: RegisterAddress = RegisterAddress::new(1);
/// SELECT, write only.
pub const SELECT: RegisterAddress = RegisterAddress::new(2);
/// RDBUFF, read only.
pub const RDBUFF: RegisterAddress = RegisterAddress::new(3);
/// TARGETSEL, write only. Shares its address with [`RDBUFF`].
pub const TARGETSEL: RegisterAddress = RegisterAddress::new(3);

bitfield! {
    /// Debug Port identification register.
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct Dpidr(u32);
    impl Debug;
    pub u8, revision, _: 31, 28;
    pub u8, part_no, _: 27, 20;
    pub min, _: 16;
    pub u8, version, _: 15, 12;
    pub u16, designer, _: 11, 1;
    u8, jep_cc, _: 11, 8;
    u8, jep_id, _: 7, 1;
    /// Always set in a valid DPIDR.
    pub rao, _: 0;
}

impl From<u32> for Dpidr {
    fn from(raw: u32) -> Self {
        Dpidr(raw)
    }
}

impl From<Dpidr> for u32 {
    fn from(raw: Dpidr) -> Self {
        raw.0
    }
}

/// Decoded contents of [`Dpidr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugPortId {
    pub revision: u8,
    pub part_no: u8,
    pub version: DebugPortVersion,
    pub min_dp_support: MinDpSupport,
    pub designer: JEP106Code,
}

impl DebugPortId {
    /// Name of the designer, if it is a known JEP106 code.
    pub fn designer_name(&self) -> Option<&'static str> {
        self.designer.get()
    }
}

impl From<Dpidr> for DebugPortId {
    fn from(dpidr: Dpidr) -> DebugPortId {
        DebugPortId {
            revision: dpidr.revision(),
            part_no: dpidr.part_no(),
            version: dpidr.version().into(),
            min_dp_support: dpidr.min().into(),
            designer: JEP106Code::new(dpidr.jep_cc(), dpidr.jep_id()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinDpSupport {
    NotImplemented,
    Implemented,
}

impl From<bool> for MinDpSupport {
    fn from(bit_set: bool) -> Self {
        if bit_set {
            MinDpSupport::Implemented
        } else {
            MinDpSupport::NotImplemented
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugPortVersion {
    DPv0,
    DPv1,
    DPv2,
    DPv3,
    Unsupported(u8),
}

impl From<u8> for DebugPortVersion {
    fn from(value: u8) -> Self {
        match value {
            0 => DebugPortVersion::DPv0,
            1 => DebugPortVersion::DPv1,
            2 => DebugPortVersion::DPv2,
            3 => DebugPortVersion::DPv3,
            other => DebugPortVersion::Unsupported(other),
        }
    }
}

bitfield! {
    /// Value written to the ABORT register.
    #[derive(Clone, Copy, Default)]
    pub struct Abort(u32);
    impl Debug;
    pub _, set_orunerrclr: 4;
    pub _, set_wderrclr: 3;
    pub _, set_stkerrclr: 2;
    pub _, set_stkcmpclr: 1;
    pub _, set_dapabort: 0;
}

impl From<u32> for Abort {
    fn from(raw: u32) -> Self {
        Abort(raw)
    }
}

impl From<Abort> for u32 {
    fn from(raw: Abort) -> Self {
        raw.0
    }
}

/// Selects one target on a multi-drop SWD bus.
///
/// Written to [`TARGETSEL`] directly after a line reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetSel {
    /// TARGETID of the target, bits 27:0.
    pub target_id: u32,
    /// Instance number of the target, bits 3:0.
    pub instance: u8,
}

impl TargetSel {
    pub fn new(target_id: u32, instance: u8) -> Self {
        debug_assert!(target_id <= 0x0FFF_FFFF, "TARGETID is 28 bits wide");
        debug_assert!(instance <= 0xF, "TINSTANCE is 4 bits wide");

        Self {
            target_id: target_id & 0x0FFF_FFFF,
            instance: instance & 0xF,
        }
    }
}

impl From<TargetSel> for u32 {
    fn from(sel: TargetSel) -> Self {
        (sel.target_id & 0x0FFF_FFFF) | ((sel.instance as u32 & 0xF) << 28)
    }
}

impl From<u32> for TargetSel {
    fn from(raw: u32) -> Self {
        Self {
            target_id: raw & 0x0FFF_FFFF,
            instance: (raw >> 28) as u8,
        }
    }
}
