// Copyright The LS TEE Core Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! LX2160A reference design board.
//!
//! The big one: sixteen cores, a GICv3 whose CPU interface is reached
//! through system registers, and a PL011 console.

use super::Platform;
use crate::boot::ReleaseConfig;
use crate::csu::CsuConfig;
use crate::gic::GicLayout;
use crate::logger::{self, LockedWriter};
use crate::mmio::PhysAddr;
use arm_pl011_uart::{PL011Registers, Uart, UniqueMmioPointer};
use arm_sysregs::MpidrEl1;
use core::ptr::NonNull;

/// UART1 register block.
const UART1_BASE: usize = 0x021C_0000;
const PL011_BASE_ADDRESS: *mut PL011Registers = UART1_BASE as _;

const GIC_BASE: PhysAddr = 0x0600_0000;

/// Cores per cluster.
const CORES_PER_CLUSTER: usize = 2;
/// Number of clusters.
const CLUSTER_COUNT: usize = 8;

/// The LX2160A-RDB board.
pub struct Lx2160aRdb;

impl Platform for Lx2160aRdb {
    const CORE_COUNT: usize = CLUSTER_COUNT * CORES_PER_CLUSTER;

    const SECURITY_DOMAIN: Option<CsuConfig> = None;

    const GIC_LAYOUT: GicLayout = GicLayout::Fixed {
        base: GIC_BASE,
        // The CPU interface is system-register based on this part.
        gicc: None,
        gicd: 0x0,
    };

    const SECONDARY_RELEASE: Option<ReleaseConfig> = None;

    type LogSinkImpl = LockedWriter<Uart<'static>>;

    fn init_console() {
        // SAFETY: `PL011_BASE_ADDRESS` is the base address of a PL011 device
        // already configured by earlier boot firmware, and nothing else
        // accesses that address range.
        let uart_pointer =
            unsafe { UniqueMmioPointer::new(NonNull::new(PL011_BASE_ADDRESS).unwrap()) };
        logger::init(LockedWriter::new(Uart::new(uart_pointer)))
            .expect("Failed to initialise logger");
    }

    fn core_position(mpidr: u64) -> usize {
        let mpidr = MpidrEl1::from_bits_retain(mpidr);
        usize::from(mpidr.aff1()) * CORES_PER_CLUSTER + usize::from(mpidr.aff0())
    }
}
