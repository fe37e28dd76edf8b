// Copyright The LS TEE Core Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! Thin wrappers over the instructions the boot path needs.
//!
//! On targets other than AArch64 these compile to nothing, so code built for
//! host unit tests can call them freely.

/// Data synchronization barrier covering the full system.
#[inline]
pub fn dsb_sy() {
    // SAFETY: A barrier does not affect memory safety.
    #[cfg(target_arch = "aarch64")]
    unsafe {
        core::arch::asm!("dsb sy", options(nostack));
    }
}

/// Instruction synchronization barrier.
#[inline]
pub fn isb() {
    // SAFETY: A barrier does not affect memory safety.
    #[cfg(target_arch = "aarch64")]
    unsafe {
        core::arch::asm!("isb", options(nostack));
    }
}

/// Signals an event to all cores, waking any that wait in `wfe`.
#[inline]
pub fn sev() {
    // SAFETY: Sending an event does not affect memory safety.
    #[cfg(target_arch = "aarch64")]
    unsafe {
        core::arch::asm!("sev", options(nostack));
    }
}

/// Writes `ICC_PMR_EL1`, the GICv3 CPU interface priority mask.
#[cfg(feature = "gicv3")]
#[inline]
pub fn write_icc_pmr(value: u64) {
    // SAFETY: The priority mask only filters interrupt delivery.
    #[cfg(target_arch = "aarch64")]
    unsafe {
        core::arch::asm!("msr S3_0_C4_C6_0, {}", in(reg) value, options(nostack));
    }
    #[cfg(not(target_arch = "aarch64"))]
    let _ = value;
}

/// Writes `ICC_IGRPEN1_EL1`, enabling group 1 interrupt signalling on the
/// calling core's GICv3 CPU interface.
#[cfg(feature = "gicv3")]
#[inline]
pub fn write_icc_igrpen1(value: u64) {
    // SAFETY: The group enable only gates interrupt delivery.
    #[cfg(target_arch = "aarch64")]
    unsafe {
        core::arch::asm!("msr S3_0_C12_C12_7, {}", in(reg) value, options(nostack));
    }
    #[cfg(not(target_arch = "aarch64"))]
    let _ = value;
}
