// Copyright The LS TEE Core Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! Central Security Unit (CSU) configuration.
//!
//! The CSU gates which execution world may reach each peripheral. Its
//! config-security-level slots are written once by the primary core during
//! cold boot and then locked; a locked slot cannot be changed again until the
//! next power-on reset.

use crate::mmio::{Mmio, PhysAddr};
use bitflags::bitflags;
use core::ops::Range;
use log::debug;

/// Width in bytes of one config-security-level slot.
const SLOT_SIZE: usize = 4;

bitflags! {
    /// Policy word for one CSU config-security-level slot.
    ///
    /// Each 32-bit slot carries two mirrored 16-bit halves, one per
    /// peripheral sharing the slot. The block is big-endian.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct CslPolicy: u32 {
        /// Both worlds, at any privilege level, may access the peripherals.
        const ACCESS_ALL = 0x00FF_00FF;
        /// Only the secure world may access the peripherals.
        const SEC_ONLY = 0x003F_003F;
        /// Freezes the slot until the next power-on reset.
        const LOCK = 0x0100_0100;
    }
}

/// Location of the CSU and the slots that must stay secure-only.
pub struct CsuConfig {
    /// Physical base of the CSU register block.
    pub base: PhysAddr,
    /// Byte-offset range of the config-security-level slots.
    pub slots: Range<usize>,
    /// Slots forced to [`CslPolicy::SEC_ONLY`] before the lock pass.
    pub secure_only: [usize; 2],
}

/// Applies the boot-time security domain policy and locks it in.
///
/// Runs exactly once, on the primary core, before any secondary core can
/// reach a restricted peripheral; translation is still off, so the register
/// addresses are used as given. The order of the three passes is
/// load-bearing: every slot first gets the open policy, the sensitive slots
/// are then tightened, and only after that is the lock bit ORed into each
/// slot. Locking is irreversible until the next power-on reset, so there is
/// no rollback path if the sequence is interrupted.
pub fn configure(mmio: &impl Mmio, config: &CsuConfig) {
    // Default-open baseline for every peripheral.
    for offset in config.slots.clone().step_by(SLOT_SIZE) {
        mmio.write32_be(config.base + offset, CslPolicy::ACCESS_ALL.bits());
    }

    // Keep the sensitive peripherals out of reach of the normal world.
    for offset in config.secure_only {
        mmio.write32_be(config.base + offset, CslPolicy::SEC_ONLY.bits());
    }

    // Lock every slot, preserving the permission bits written above.
    for offset in config.slots.clone().step_by(SLOT_SIZE) {
        let addr = config.base + offset;
        mmio.write32_be(addr, mmio.read32_be(addr) | CslPolicy::LOCK.bits());
    }

    debug!("security domain configured and locked");
}
