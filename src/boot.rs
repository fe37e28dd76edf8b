// Copyright The LS TEE Core Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! Boot-phase sequencing for the primary and secondary cores.
//!
//! No scheduler exists at this level; "concurrency" is physical cores
//! running the same image. The primary core (index 0) performs the one-time
//! work. The structural ordering (release the secondary cores, then
//! configure and lock the security domain, then bring up the interrupt
//! controller) is what keeps the cores from racing, not locks.

use crate::aarch64::{dsb_sy, sev};
use crate::csu;
use crate::gic;
use crate::mmio::{Mmio, PhysAddr};
use crate::platform::{CoresImpl, Platform, PlatformImpl};
use log::debug;
use percore::Cores;

/// Scratch and release registers used to start parked secondary cores.
pub struct ReleaseConfig {
    /// Register that receives the shared entry address (big-endian).
    pub scratch_reg: PhysAddr,
    /// Register whose bits release the corresponding cores (big-endian).
    pub release_reg: PhysAddr,
    /// Cores to release.
    pub core_mask: u32,
    /// Entry address the released cores jump to.
    pub entry: u32,
}

/// Publishes the entry address and starts the parked secondary cores.
///
/// The cores sit in a wait loop installed by the boot vector; once the
/// barrier has made both writes visible, the wake event releases them.
pub fn release_secondaries(mmio: &impl Mmio, config: &ReleaseConfig) {
    mmio.write32_be(config.scratch_reg, config.entry);
    mmio.write32_be(config.release_reg, config.core_mask);
    dsb_sy();
    sev();
    debug!("released secondary cores {:#x}", config.core_mask);
}

/// Late reset hook; runs on every core with translation still off.
///
/// Only the primary core acts. The secondary-core release strictly precedes
/// the security domain lock pass: a released core may still need a
/// peripheral that the lock pass closes to it.
pub fn cpu_reset_late(mmio: &impl Mmio) {
    if CoresImpl::core_index() != 0 {
        return;
    }
    primary_reset_late(mmio);
}

fn primary_reset_late(mmio: &impl Mmio) {
    #[cfg(feature = "secondary-release")]
    if let Some(release) = &PlatformImpl::SECONDARY_RELEASE {
        release_secondaries(mmio, release);
    }

    if let Some(config) = &PlatformImpl::SECURITY_DOMAIN {
        csu::configure(mmio, config);
    }
}

/// Resolves and initializes the interrupt controller on the boot core.
pub fn init_gic(mmio: &impl Mmio) {
    gic::init(mmio);
}

/// Per-core interrupt-controller bring-up for a secondary core.
pub fn secondary_init_gic(mmio: &impl Mmio) {
    gic::secondary_init(mmio);
}
