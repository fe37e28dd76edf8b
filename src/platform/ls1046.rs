// Copyright The LS TEE Core Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! LS1046A reference design board.
//!
//! Like the LS1043A but with the GIC blocks fixed at 64 KiB alignment, so no
//! revision probing is needed.

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

const GIC_BASE: PhysAddr = 0x0140_0000;

/// The LS1046A-RDB board.
pub struct Ls1046aRdb;

impl Platform for Ls1046aRdb {
    const CORE_COUNT: usize = 4;

    const SECURITY_DOMAIN: Option<CsuConfig> = None;

    const GIC_LAYOUT: GicLayout = GicLayout::Fixed {
        base: GIC_BASE,
        gicc: Some(0x2_0000),
        gicd: 0x1_0000,
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
