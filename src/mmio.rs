// Copyright The LS TEE Core Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! Register access layer.
//!
//! Translation between physical and accessible addresses belongs to the TEE's
//! memory manager; this module only defines the seam through which the boot
//! path reaches device registers, plus [`DirectMmio`] for the window before
//! translation is live.

use core::ptr;
use log::info;

/// A physical address.
pub type PhysAddr = usize;

/// An address usable for register access in the current translation regime.
pub type VirtAddr = usize;

/// Device-memory mapping classes understood by the memory manager.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MemArea {
    /// Secure-world device mapping.
    IoSec,
    /// Non-secure device mapping.
    IoNsec,
}

/// Ordered, width-typed access to memory-mapped device registers.
///
/// Implemented by the TEE's memory manager once translation is up, by
/// [`DirectMmio`] before that, and by a fake register bank in unit tests.
pub trait Mmio {
    /// Translates a physical address, returning `None` while it is unmapped.
    fn phys_to_virt(&self, pa: PhysAddr, area: MemArea) -> Option<VirtAddr>;

    /// Requests an on-demand device mapping of `len` bytes at `pa`.
    ///
    /// Returns whether the request was accepted.
    fn add_mapping(&self, area: MemArea, pa: PhysAddr, len: usize) -> bool;

    /// Translates an accessible address back to its physical address.
    fn virt_to_phys(&self, va: VirtAddr) -> Option<PhysAddr>;

    /// Reads a 32-bit register.
    fn read32(&self, va: VirtAddr) -> u32;

    /// Writes a 32-bit register.
    fn write32(&self, va: VirtAddr, value: u32);

    /// Reads a 32-bit register from a big-endian block.
    ///
    /// The DCFG, SCFG and CSU blocks on this SoC family are big-endian.
    fn read32_be(&self, va: VirtAddr) -> u32 {
        self.read32(va).swap_bytes()
    }

    /// Writes a 32-bit register in a big-endian block.
    fn write32_be(&self, va: VirtAddr, value: u32) {
        self.write32(va, value.swap_bytes());
    }
}

/// Translates `pa`, attempting a single on-demand mapping when it is not
/// already mapped.
///
/// Returns `None` only once the mapping attempt has also failed; the caller
/// decides whether that is fatal.
pub fn translate_or_map(
    mmio: &impl Mmio,
    pa: PhysAddr,
    area: MemArea,
    len: usize,
) -> Option<VirtAddr> {
    if let Some(va) = mmio.phys_to_virt(pa, area) {
        return Some(va);
    }
    if !mmio.add_mapping(area, pa, len) {
        info!("unable to map register at {pa:#010x}");
    }
    mmio.phys_to_virt(pa, area)
}

/// Identity-mapped register access for the window before the MMU comes up.
pub struct DirectMmio;

impl DirectMmio {
    /// Creates an identity-mapped accessor.
    ///
    /// # Safety
    ///
    /// The caller must only use the returned instance while physical
    /// addresses are directly dereferenceable (MMU off or identity mapped),
    /// and must only pass it addresses of device registers.
    pub const unsafe fn new() -> Self {
        Self
    }
}

impl Mmio for DirectMmio {
    fn phys_to_virt(&self, pa: PhysAddr, _area: MemArea) -> Option<VirtAddr> {
        Some(pa)
    }

    fn add_mapping(&self, _area: MemArea, _pa: PhysAddr, _len: usize) -> bool {
        true
    }

    fn virt_to_phys(&self, va: VirtAddr) -> Option<PhysAddr> {
        Some(va)
    }

    fn read32(&self, va: VirtAddr) -> u32 {
        // SAFETY: `new` makes the caller responsible for only handing this
        // accessor identity-mapped device register addresses.
        unsafe { ptr::read_volatile(va as *const u32) }
    }

    fn write32(&self, va: VirtAddr, value: u32) {
        // SAFETY: As for `read32`.
        unsafe { ptr::write_volatile(va as *mut u32, value) }
    }
}
