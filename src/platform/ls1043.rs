// Copyright The LS TEE Core Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! LS1043A reference design board.
//!
//! Trusted firmware below us handles power management and core release. The
//! GIC block placement depends on the chip revision, so this flavor uses the
//! revision-gated locator.

use super::Platform;
use crate::boot::ReleaseConfig;
use crate::csu::CsuConfig;
use crate::gic::GicLayout;
use crate::logger::{self, LockedWriter};
use crate::mmio::PhysAddr;
use crate::ns16550::Ns16550;
use arm_sysregs::MpidrEl1;

/// DUART1 register block.
const UART0_BASE: usize = 0x021C_0500;

/// Device configuration unit.
const DCFG_BASE: PhysAddr = 0x01EE_0000;
/// System version register offset in DCFG; the low byte is the revision.
const DCFG_SVR: usize = 0xA4;

/// Supplemental configuration unit.
const SCFG_BASE: PhysAddr = 0x0157_0000;
/// GIC address-alignment selector offset in SCFG.
const SCFG_GIC400_ALIGN: usize = 0x188;

const GIC_BASE: PhysAddr = 0x0140_0000;

/// The LS1043A-RDB board.
pub struct Ls1043aRdb;

impl Platform for Ls1043aRdb {
    const CORE_COUNT: usize = 4;

    const SECURITY_DOMAIN: Option<CsuConfig> = None;

    const GIC_LAYOUT: GicLayout = GicLayout::RevisionGated {
        base: GIC_BASE,
        svr: DCFG_BASE + DCFG_SVR,
        align_reg: SCFG_BASE + SCFG_GIC400_ALIGN,
    };

    const SECONDARY_RELEASE: Option<ReleaseConfig> = None;

    type LogSinkImpl = LockedWriter<Ns16550>;

    fn init_console() {
        // SAFETY: `UART0_BASE` is DUART1's register block, configured by the
        // boot ROM, and nothing else in the secure world drives it.
        let uart = unsafe { Ns16550::new(UART0_BASE as *mut u8) };
        logger::init(LockedWriter::new(uart)).expect("Failed to initialise logger");
    }

    fn core_position(mpidr: u64) -> usize {
        usize::from(MpidrEl1::from_bits_retain(mpidr).aff0())
    }
}
