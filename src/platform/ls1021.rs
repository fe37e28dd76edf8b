// Copyright The LS TEE Core Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! LS1021A tower system board.
//!
//! The oldest flavor: two cores the TEE releases itself, a CSU to lock down,
//! and a fixed 4 KiB-aligned GIC layout.

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
/// Boot release register offset in DCFG.
const DCFG_CCSR_BRR: usize = 0xE4;
/// Scratch register the secondary entry address is published through.
const DCFG_SCRATCHRW1: usize = 0x200;

/// Central security unit.
const CSU_BASE: PhysAddr = 0x0151_0000;

const GIC_BASE: PhysAddr = 0x0140_0000;

/// Secure DRAM carve-out the TEE is loaded at; released cores jump here.
const TEE_LOAD_ADDR: u32 = 0x3C00_0000;

/// The LS1021A-TWR board.
pub struct Ls1021aTwr;

impl Platform for Ls1021aTwr {
    const CORE_COUNT: usize = 2;

    const SECURITY_DOMAIN: Option<CsuConfig> = Some(CsuConfig {
        base: CSU_BASE,
        slots: 0x0..0xE8,
        // CSL30 (QSPI pair) and CSL37 (OCRAM pair).
        secure_only: [0x78, 0x94],
    });

    const GIC_LAYOUT: GicLayout = GicLayout::Fixed {
        base: GIC_BASE,
        gicc: Some(0x2000),
        gicd: 0x1000,
    };

    const SECONDARY_RELEASE: Option<ReleaseConfig> = Some(ReleaseConfig {
        scratch_reg: DCFG_BASE + DCFG_SCRATCHRW1,
        release_reg: DCFG_BASE + DCFG_CCSR_BRR,
        // Core 1 is the only secondary.
        core_mask: 1 << 1,
        entry: TEE_LOAD_ADDR,
    });

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
