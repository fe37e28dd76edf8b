// Copyright The LS TEE Core Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! Board flavor definitions and the build-time selection between them.
//!
//! Exactly one flavor is compiled in: the one named by `--cfg
//! platform="<board>"`, the LS1043A-RDB when none is given, or the fake test
//! platform in unit tests.

macro_rules! select_platform {
    (platform = $condition:literal, $mod:ident::$plat_impl:ident) => {
        #[cfg(all(not(test), platform = $condition))]
        mod $mod;

        #[cfg(all(not(test), platform = $condition))]
        pub use $mod::$plat_impl as PlatformImpl;
    };
    (default, $mod:ident::$plat_impl:ident) => {
        #[cfg(all(
            not(test),
            not(any(
                platform = "ls1021atwr",
                platform = "ls1046ardb",
                platform = "lx2160ardb"
            ))
        ))]
        mod $mod;

        #[cfg(all(
            not(test),
            not(any(
                platform = "ls1021atwr",
                platform = "ls1046ardb",
                platform = "lx2160ardb"
            ))
        ))]
        pub use $mod::$plat_impl as PlatformImpl;
    };
    (test, $mod:ident::$plat_impl:ident) => {
        #[cfg(test)]
        pub mod $mod;

        #[cfg(test)]
        pub use $mod::$plat_impl as PlatformImpl;
    };
}

select_platform!(platform = "ls1021atwr", ls1021::Ls1021aTwr);
// Covers an explicit `platform = "ls1043ardb"` as well as no selection.
select_platform!(default, ls1043::Ls1043aRdb);
select_platform!(platform = "ls1046ardb", ls1046::Ls1046aRdb);
select_platform!(test, test::TestPlatform);

#[cfg(all(
    not(test),
    platform = "lx2160ardb",
    feature = "gicv3",
    feature = "pl011-console"
))]
mod lx2160;
#[cfg(all(
    not(test),
    platform = "lx2160ardb",
    feature = "gicv3",
    feature = "pl011-console"
))]
pub use lx2160::Lx2160aRdb as PlatformImpl;
#[cfg(all(
    platform = "lx2160ardb",
    not(all(feature = "gicv3", feature = "pl011-console"))
))]
compile_error!("lx2160ardb requires the gicv3 and pl011-console features");

use crate::boot::ReleaseConfig;
use crate::csu::CsuConfig;
use crate::gic::GicLayout;
use crate::logger::LogSink;
use arm_sysregs::read_mpidr_el1;
use percore::Cores;

/// Type alias for convenience, to avoid having to use the complicated type
/// name everywhere.
pub type LogSinkImpl = <PlatformImpl as Platform>::LogSinkImpl;

/// The hooks and constants implemented by all board flavors.
pub trait Platform {
    /// The number of CPU cores.
    const CORE_COUNT: usize;

    /// Security domain (CSU) configuration, on flavors that carry a CSU.
    const SECURITY_DOMAIN: Option<CsuConfig>;

    /// How the interrupt controller blocks are found.
    const GIC_LAYOUT: GicLayout;

    /// Secondary-core release block, on flavors where the TEE starts the
    /// cores itself rather than leaving it to trusted firmware.
    const SECONDARY_RELEASE: Option<ReleaseConfig>;

    /// Log sink the console-backed logger writes through.
    type LogSinkImpl: LogSink;

    /// Initialises the console and the logger behind it. Called once, early,
    /// on the primary core.
    fn init_console();

    /// Given a valid MPIDR value, returns the corresponding linear core
    /// index.
    ///
    /// The implementation must never return the same index for two different
    /// valid MPIDR values, and must never return a value greater than or
    /// equal to `CORE_COUNT`.
    fn core_position(mpidr: u64) -> usize;
}

/// Identifies the executing core.
pub struct CoresImpl;

// SAFETY: `core_position` never returns the same index for two different
// cores, per its contract.
unsafe impl Cores for CoresImpl {
    fn core_index() -> usize {
        PlatformImpl::core_position(read_mpidr_el1().bits())
    }
}
