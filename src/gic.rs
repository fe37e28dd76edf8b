// Copyright The LS TEE Core Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! Interrupt controller discovery and bring-up.
//!
//! The distributor is shared and initialized once by the primary core; every
//! core then brings up its own CPU interface. On the LS1043A the placement of
//! the register blocks depends on the chip revision, so discovery reads the
//! revision register before settling on an offset pair.

use crate::aarch64::{dsb_sy, isb};
use crate::mmio::{MemArea, Mmio, PhysAddr, VirtAddr, translate_or_map};
use crate::platform::{CoresImpl, Platform, PlatformImpl};
use bitflags::bitflags;
use core::sync::atomic::{AtomicBool, Ordering};
use log::debug;
use num_enum::TryFromPrimitive;
use percore::Cores;
use spin::Once;

/// Number of interrupts covered by one distributor bitmap register.
const INTS_PER_REG: usize = 32;

/// Width in bytes of a discovery register.
const REGISTER_SIZE: usize = 4;

// Distributor register offsets.
const GICD_CTLR: usize = 0x000;
const GICD_TYPER: usize = 0x004;
const GICD_IGROUPR: usize = 0x080;
const GICD_ICENABLER: usize = 0x180;
const GICD_ICPENDR: usize = 0x280;

// Memory-mapped CPU interface register offsets.
const GICC_CTLR: usize = 0x000;
const GICC_PMR: usize = 0x004;

/// Most permissive priority mask: nothing is filtered.
const GIC_PRI_MASK: u32 = 0xff;

bitflags! {
    struct GicdCtlr: u32 {
        const ENABLE_GRP0 = 1 << 0;
        const ENABLE_GRP1 = 1 << 1;
    }

    struct GiccCtlr: u32 {
        const ENABLE_GRP0 = 1 << 0;
        const ENABLE_GRP1 = 1 << 1;
        const FIQ_EN = 1 << 3;
    }

    /// SCFG register selecting the GIC block alignment on LS1043A rev 1.1.
    struct GicAlign: u32 {
        const ADDR_4K = 1 << 31;
    }
}

/// Chip revisions with layout-relevant behavior.
#[derive(Clone, Copy, Debug, Eq, PartialEq, TryFromPrimitive)]
#[repr(u8)]
enum SocRevision {
    /// First production revision; the GIC blocks are 4 KiB aligned.
    Rev1_0 = 0x10,
    /// Rev 1.1 moved the alignment choice into SCFG.
    Rev1_1 = 0x11,
}

/// Byte offsets of the CPU-interface and distributor blocks from the GIC base.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GicOffsets {
    /// CPU-interface block offset.
    pub gicc: usize,
    /// Distributor block offset.
    pub gicd: usize,
}

/// Block offsets on parts with 4 KiB alignment.
pub const OFFSETS_4K: GicOffsets = GicOffsets {
    gicc: 0x2000,
    gicd: 0x1000,
};

/// Block offsets on parts with 64 KiB alignment.
pub const OFFSETS_64K: GicOffsets = GicOffsets {
    gicc: 0x2_0000,
    gicd: 0x1_0000,
};

/// How a platform flavor finds its interrupt controller blocks.
pub enum GicLayout {
    /// Block offsets known at build time.
    Fixed {
        /// Physical base of the GIC register window.
        base: PhysAddr,
        /// CPU-interface offset; `None` on SoCs whose CPU interface is
        /// system-register based.
        gicc: Option<usize>,
        /// Distributor offset.
        gicd: usize,
    },
    /// Offsets keyed on the chip revision.
    RevisionGated {
        /// Physical base of the GIC register window.
        base: PhysAddr,
        /// Address of the chip-revision register (big-endian).
        svr: PhysAddr,
        /// Address of the SCFG alignment register (big-endian).
        align_reg: PhysAddr,
    },
}

/// Resolved, translated base addresses of the controller blocks.
pub struct GicBases {
    /// CPU-interface base, when the layout carries one.
    pub gicc: Option<VirtAddr>,
    /// Distributor base.
    pub gicd: VirtAddr,
}

impl GicLayout {
    /// Resolves the controller's base-address pair.
    ///
    /// Halts when a required block or discovery register stays unreachable
    /// after a single on-demand mapping attempt; running with guessed
    /// offsets would scribble over whatever hardware lives there instead.
    pub fn resolve(&self, mmio: &impl Mmio) -> GicBases {
        match self {
            Self::Fixed { base, gicc, gicd } => GicBases {
                gicc: gicc.map(|offset| resolve_block(mmio, base + offset, "GIC CPU interface")),
                gicd: resolve_block(mmio, base + gicd, "GIC distributor"),
            },
            Self::RevisionGated {
                base,
                svr,
                align_reg,
            } => {
                let offsets = discover_offsets(mmio, *svr, *align_reg);
                GicBases {
                    gicc: Some(resolve_block(
                        mmio,
                        base + offsets.gicc,
                        "GIC CPU interface",
                    )),
                    gicd: resolve_block(mmio, base + offsets.gicd, "GIC distributor"),
                }
            }
        }
    }
}

/// Reads the chip revision and, on rev 1.1, the SCFG alignment bit, to pick
/// the offset pair. The revision is the sole discriminator: anything other
/// than rev 1.1 keeps the 4 KiB layout.
fn discover_offsets(mmio: &impl Mmio, svr: PhysAddr, align_reg: PhysAddr) -> GicOffsets {
    let Some(svr_va) = translate_or_map(mmio, svr, MemArea::IoSec, REGISTER_SIZE) else {
        panic!("chip revision register at {svr:#010x} is not mapped");
    };
    let revision = (mmio.read32_be(svr_va) & 0xff) as u8;

    match SocRevision::try_from(revision) {
        Ok(SocRevision::Rev1_1) => {
            let Some(align_va) = translate_or_map(mmio, align_reg, MemArea::IoSec, REGISTER_SIZE)
            else {
                panic!("GIC alignment register at {align_reg:#010x} is not mapped");
            };
            if GicAlign::from_bits_retain(mmio.read32_be(align_va)).contains(GicAlign::ADDR_4K) {
                OFFSETS_4K
            } else {
                OFFSETS_64K
            }
        }
        _ => OFFSETS_4K,
    }
}

fn resolve_block(mmio: &impl Mmio, pa: PhysAddr, what: &str) -> VirtAddr {
    let Some(va) = mmio.phys_to_virt(pa, MemArea::IoSec) else {
        panic!("{what} at {pa:#010x} is not mapped");
    };
    va
}

/// The interrupt controller, once discovered and initialized.
pub static GIC: Once<Gic> = Once::new();

/// Driver state for the controller.
///
/// The distributor is set up exactly once, in [`Gic::new`]; the per-core path
/// touches only the calling core's banked registers and may therefore run
/// concurrently on distinct cores.
pub struct Gic {
    bases: GicBases,
    per_core_ready: [AtomicBool; PlatformImpl::CORE_COUNT],
}

impl Gic {
    /// Initializes the shared distributor state over the resolved bases.
    pub(crate) fn new(mmio: &impl Mmio, bases: GicBases) -> Self {
        if cfg!(not(feature = "gicv3")) && bases.gicc.is_none() {
            panic!("GIC CPU interface base is required without system-register access");
        }

        init_distributor(mmio, bases.gicd);

        Self {
            bases,
            per_core_ready: [const { AtomicBool::new(false) }; PlatformImpl::CORE_COUNT],
        }
    }

    /// Brings up `core_index`'s CPU interface.
    ///
    /// Safe to call concurrently from distinct cores; calling it twice for
    /// the same core without an intervening reset is a contract violation
    /// and halts.
    pub fn per_core_init(&self, mmio: &impl Mmio, core_index: usize) {
        assert!(
            !self.per_core_ready[core_index].swap(true, Ordering::AcqRel),
            "core {core_index} initialized its GIC CPU interface twice"
        );

        // Private interrupts (SGIs and PPIs) live in the banked first
        // distributor registers: disable and clear them, then hand them to
        // the non-secure group.
        mmio.write32(self.bases.gicd + GICD_ICENABLER, 0xffff_ffff);
        mmio.write32(self.bases.gicd + GICD_ICPENDR, 0xffff_ffff);
        mmio.write32(self.bases.gicd + GICD_IGROUPR, 0xffff_ffff);

        if let Some(gicc) = self.bases.gicc {
            mmio.write32(gicc + GICC_PMR, GIC_PRI_MASK);
            mmio.write32(
                gicc + GICC_CTLR,
                (GiccCtlr::ENABLE_GRP0 | GiccCtlr::ENABLE_GRP1 | GiccCtlr::FIQ_EN).bits(),
            );
        }

        #[cfg(feature = "gicv3")]
        {
            crate::aarch64::write_icc_pmr(u64::from(GIC_PRI_MASK));
            crate::aarch64::write_icc_igrpen1(1);
        }

        isb();
        dsb_sy();
    }
}

/// One-time distributor setup: disable and clear every shared peripheral
/// interrupt, group them non-secure, then enable both interrupt groups.
fn init_distributor(mmio: &impl Mmio, gicd: VirtAddr) {
    let typer = mmio.read32(gicd + GICD_TYPER);
    let num_ints = (((typer & 0x1f) as usize) + 1) * INTS_PER_REG;

    for n in 1..(num_ints / INTS_PER_REG) {
        mmio.write32(gicd + GICD_ICENABLER + REGISTER_SIZE * n, 0xffff_ffff);
        mmio.write32(gicd + GICD_ICPENDR + REGISTER_SIZE * n, 0xffff_ffff);
        mmio.write32(gicd + GICD_IGROUPR + REGISTER_SIZE * n, 0xffff_ffff);
    }

    mmio.write32(
        gicd + GICD_CTLR,
        (GicdCtlr::ENABLE_GRP0 | GicdCtlr::ENABLE_GRP1).bits(),
    );
}

/// Discovers and initializes the controller on the boot core.
///
/// Called once by the primary core during cold boot; later calls are
/// ignored.
pub fn init(mmio: &impl Mmio) {
    if GIC.get().is_some() {
        return;
    }

    let gic = GIC.call_once(|| Gic::new(mmio, PlatformImpl::GIC_LAYOUT.resolve(mmio)));
    gic.per_core_init(mmio, CoresImpl::core_index());
    debug!("GIC distributor and boot core CPU interface configured");
}

/// Per-core bring-up, run by each secondary core for itself.
pub fn secondary_init(mmio: &impl Mmio) {
    let Some(gic) = GIC.get() else {
        panic!("secondary core started before the GIC was initialized");
    };
    gic.per_core_init(mmio, CoresImpl::core_index());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::test::FakeMmio;

    // The LS1043A-RDB addresses.
    const GIC_BASE: PhysAddr = 0x0140_0000;
    const SVR: PhysAddr = 0x01EE_00A4;
    const ALIGN_REG: PhysAddr = 0x0157_0188;

    fn layout() -> GicLayout {
        GicLayout::RevisionGated {
            base: GIC_BASE,
            svr: SVR,
            align_reg: ALIGN_REG,
        }
    }

    fn mapped_fake() -> FakeMmio {
        let mmio = FakeMmio::new();
        mmio.map_range(SVR..SVR + 4);
        mmio.map_range(ALIGN_REG..ALIGN_REG + 4);
        mmio.map_range(GIC_BASE..GIC_BASE + 0x3_0000);
        mmio
    }

    #[test]
    fn rev_1_1_with_alignment_bit_uses_4k_offsets() {
        let mmio = mapped_fake();
        mmio.set32_be(SVR, 0x8700_0011);
        mmio.set32_be(ALIGN_REG, 0x8000_0000);

        let bases = layout().resolve(&mmio);

        assert_eq!(bases.gicc, Some(GIC_BASE + 0x2000));
        assert_eq!(bases.gicd, GIC_BASE + 0x1000);
    }

    #[test]
    fn rev_1_1_without_alignment_bit_uses_64k_offsets() {
        let mmio = mapped_fake();
        mmio.set32_be(SVR, 0x8700_0011);
        mmio.set32_be(ALIGN_REG, 0x7fff_ffff);

        let bases = layout().resolve(&mmio);

        assert_eq!(bases.gicc, Some(GIC_BASE + 0x2_0000));
        assert_eq!(bases.gicd, GIC_BASE + 0x1_0000);
    }

    #[test]
    fn other_revisions_use_4k_offsets_regardless_of_alignment() {
        let mmio = mapped_fake();
        mmio.set32_be(SVR, 0x8700_0010);
        // Alignment register says 64 KiB, but it must not even be consulted.
        mmio.set32_be(ALIGN_REG, 0x0);

        let bases = layout().resolve(&mmio);

        assert_eq!(bases.gicc, Some(GIC_BASE + 0x2000));
        assert_eq!(bases.gicd, GIC_BASE + 0x1000);
    }

    #[test]
    fn revision_register_is_mapped_on_demand() {
        let mmio = FakeMmio::new();
        mmio.map_range(ALIGN_REG..ALIGN_REG + 4);
        mmio.map_range(GIC_BASE..GIC_BASE + 0x3_0000);
        mmio.set32_be(SVR, 0x8700_0020);

        let bases = layout().resolve(&mmio);

        assert_eq!(bases.gicd, GIC_BASE + 0x1000);
    }

    #[test]
    #[should_panic(expected = "chip revision register")]
    fn unmapped_revision_register_halts() {
        let mmio = FakeMmio::refusing_mappings();

        layout().resolve(&mmio);
    }

    #[test]
    #[should_panic(expected = "GIC distributor")]
    fn unmapped_distributor_halts() {
        let mmio = FakeMmio::new();

        GicLayout::Fixed {
            base: GIC_BASE,
            gicc: None,
            gicd: 0x1000,
        }
        .resolve(&FakeMmioNoMapping(mmio));
    }

    /// Wrapper that refuses every translation and mapping request.
    struct FakeMmioNoMapping(FakeMmio);

    impl Mmio for FakeMmioNoMapping {
        fn phys_to_virt(&self, _pa: PhysAddr, _area: MemArea) -> Option<VirtAddr> {
            None
        }

        fn add_mapping(&self, _area: MemArea, _pa: PhysAddr, _len: usize) -> bool {
            false
        }

        fn virt_to_phys(&self, va: VirtAddr) -> Option<PhysAddr> {
            self.0.virt_to_phys(va)
        }

        fn read32(&self, va: VirtAddr) -> u32 {
            self.0.read32(va)
        }

        fn write32(&self, va: VirtAddr, value: u32) {
            self.0.write32(va, value);
        }
    }

    fn fixed_bases(mmio: &FakeMmio) -> GicBases {
        mmio.map_range(GIC_BASE..GIC_BASE + 0x3000);
        // Distributor with three interrupt-bitmap registers' worth of SPIs.
        mmio.set32(GIC_BASE + 0x1000 + GICD_TYPER, 0x2);
        GicLayout::Fixed {
            base: GIC_BASE,
            gicc: Some(0x2000),
            gicd: 0x1000,
        }
        .resolve(mmio)
    }

    #[test]
    fn distributor_init_disables_and_groups_spis() {
        let mmio = FakeMmio::new();
        let _gic = Gic::new(&mmio, fixed_bases(&mmio));
        let gicd = GIC_BASE + 0x1000;

        for n in 1..3 {
            assert_eq!(mmio.read32(gicd + GICD_ICENABLER + 4 * n), 0xffff_ffff);
            assert_eq!(mmio.read32(gicd + GICD_ICPENDR + 4 * n), 0xffff_ffff);
            assert_eq!(mmio.read32(gicd + GICD_IGROUPR + 4 * n), 0xffff_ffff);
        }
        assert_eq!(mmio.read32(gicd + GICD_CTLR), 0x3);

        // The boot core has not initialized its CPU interface yet.
        assert_eq!(mmio.read32(GIC_BASE + 0x2000 + GICC_CTLR), 0);
    }

    #[test]
    fn per_core_init_configures_the_cpu_interface() {
        let mmio = FakeMmio::new();
        let gic = Gic::new(&mmio, fixed_bases(&mmio));
        let gicc = GIC_BASE + 0x2000;

        gic.per_core_init(&mmio, 0);

        assert_eq!(mmio.read32(gicc + GICC_PMR), GIC_PRI_MASK);
        assert_eq!(mmio.read32(gicc + GICC_CTLR), 0xb);
        assert_eq!(mmio.read32(GIC_BASE + 0x1000 + GICD_IGROUPR), 0xffff_ffff);
    }

    #[test]
    #[should_panic(expected = "twice")]
    fn per_core_init_twice_on_one_core_halts() {
        let mmio = FakeMmio::new();
        let gic = Gic::new(&mmio, fixed_bases(&mmio));

        gic.per_core_init(&mmio, 1);
        gic.per_core_init(&mmio, 1);
    }

    #[cfg(not(feature = "gicv3"))]
    #[test]
    #[should_panic(expected = "CPU interface base is required")]
    fn missing_cpu_interface_base_halts() {
        let mmio = FakeMmio::new();
        mmio.map_range(GIC_BASE..GIC_BASE + 0x3000);
        let bases = GicLayout::Fixed {
            base: GIC_BASE,
            gicc: None,
            gicd: 0x1000,
        }
        .resolve(&mmio);

        Gic::new(&mmio, bases);
    }

    #[test]
    fn concurrent_per_core_init_matches_serial_runs() {
        let serial = FakeMmio::new();
        let gic = Gic::new(&serial, fixed_bases(&serial));
        gic.per_core_init(&serial, 0);
        gic.per_core_init(&serial, 1);
        let expected = serial.snapshot();

        let concurrent = FakeMmio::new();
        let gic = Gic::new(&concurrent, fixed_bases(&concurrent));
        std::thread::scope(|scope| {
            scope.spawn(|| gic.per_core_init(&concurrent, 0));
            scope.spawn(|| gic.per_core_init(&concurrent, 1));
        });

        assert_eq!(concurrent.snapshot(), expected);
    }
}
