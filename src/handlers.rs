// Copyright The LS TEE Core Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! The dispatch table handed to the TEE core at boot.
//!
//! The monitor-call entry machinery lives in the TEE core; this module only
//! supplies the table it dispatches through. Which power hooks are wired
//! depends on whether an external trusted firmware layer owns power
//! management, decided at build time.

use arm_psci::ErrorCode;

/// Register file exchanged with the monitor on a standard or fast call.
#[derive(Clone, Debug, Default)]
#[repr(C)]
pub struct SmcArgs {
    /// Argument and result registers a0-a7.
    pub regs: [u64; 8],
}

/// Handler for a standard or fast secure monitor call.
pub type SmcHandler = fn(&mut SmcArgs);

/// Notification hook for a native interrupt that reached the monitor layer.
pub type InterruptHandler = fn();

/// Power-management hook invoked on PSCI traffic for this core.
pub type PowerHandler = fn(u64, u64) -> Result<(), ErrorCode>;

/// Fixed dispatch surface the TEE core consults after boot.
///
/// Built once at boot, read-only for the life of the process.
pub struct BootHandlers {
    /// Standard (yielding) call entry.
    pub std_smc: SmcHandler,
    /// Fast call entry.
    pub fast_smc: SmcHandler,
    /// Native interrupt notification.
    pub nintr: InterruptHandler,
    /// CPU_ON hook.
    pub cpu_on: PowerHandler,
    /// CPU_OFF hook.
    pub cpu_off: PowerHandler,
    /// CPU_SUSPEND hook.
    pub cpu_suspend: PowerHandler,
    /// CPU_RESUME hook.
    pub cpu_resume: PowerHandler,
    /// SYSTEM_OFF hook.
    pub system_off: PowerHandler,
    /// SYSTEM_RESET hook.
    pub system_reset: PowerHandler,
}

impl BootHandlers {
    /// Builds the table around the TEE core's call entries and `CPU_ON`
    /// handler.
    ///
    /// With trusted firmware below us the other power transitions are its
    /// problem and succeed as no-ops here. Without it nothing can perform
    /// them, so they stop the core; `cpu_on` keeps the supplied handler only
    /// when the secondary-release path is compiled in.
    pub const fn new(std_smc: SmcHandler, fast_smc: SmcHandler, cpu_on: PowerHandler) -> Self {
        #[cfg(feature = "trusted-firmware")]
        return Self {
            std_smc,
            fast_smc,
            nintr: unexpected_interrupt,
            cpu_on,
            cpu_off: pm_do_nothing,
            cpu_suspend: pm_do_nothing,
            cpu_resume: pm_do_nothing,
            system_off: pm_do_nothing,
            system_reset: pm_do_nothing,
        };

        #[cfg(all(not(feature = "trusted-firmware"), feature = "secondary-release"))]
        return Self {
            std_smc,
            fast_smc,
            nintr: unexpected_interrupt,
            cpu_on,
            cpu_off: pm_fatal_stop,
            cpu_suspend: pm_fatal_stop,
            cpu_resume: pm_fatal_stop,
            system_off: pm_fatal_stop,
            system_reset: pm_fatal_stop,
        };

        #[cfg(all(not(feature = "trusted-firmware"), not(feature = "secondary-release")))]
        {
            let _ = cpu_on;
            Self {
                std_smc,
                fast_smc,
                nintr: unexpected_interrupt,
                cpu_on: pm_fatal_stop,
                cpu_off: pm_fatal_stop,
                cpu_suspend: pm_fatal_stop,
                cpu_resume: pm_fatal_stop,
                system_off: pm_fatal_stop,
                system_reset: pm_fatal_stop,
            }
        }
    }
}

#[cfg(feature = "trusted-firmware")]
fn pm_do_nothing(_a0: u64, _a1: u64) -> Result<(), ErrorCode> {
    Ok(())
}

#[cfg(not(feature = "trusted-firmware"))]
fn pm_fatal_stop(_a0: u64, _a1: u64) -> Result<(), ErrorCode> {
    panic!("power management request on a platform without support for it");
}

fn unexpected_interrupt() {
    panic!("unexpected native interrupt");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nop_smc(_args: &mut SmcArgs) {}

    fn cpu_on(_a0: u64, _a1: u64) -> Result<(), ErrorCode> {
        Ok(())
    }

    #[test]
    #[should_panic(expected = "native interrupt")]
    fn native_interrupts_are_fatal() {
        let table = BootHandlers::new(nop_smc, nop_smc, cpu_on);

        (table.nintr)();
    }

    #[cfg(feature = "trusted-firmware")]
    #[test]
    fn power_hooks_succeed_under_trusted_firmware() {
        let table = BootHandlers::new(nop_smc, nop_smc, cpu_on);

        assert!((table.cpu_on)(0, 0).is_ok());
        assert!((table.cpu_off)(0, 0).is_ok());
        assert!((table.cpu_suspend)(0, 0).is_ok());
        assert!((table.cpu_resume)(0, 0).is_ok());
        assert!((table.system_off)(0, 0).is_ok());
        assert!((table.system_reset)(0, 0).is_ok());
    }

    #[cfg(not(feature = "trusted-firmware"))]
    #[test]
    #[should_panic(expected = "power management request")]
    fn power_hooks_halt_without_trusted_firmware() {
        let table = BootHandlers::new(nop_smc, nop_smc, cpu_on);

        let _ = (table.cpu_off)(0, 0);
    }

    #[test]
    fn smc_entries_are_callable() {
        let table = BootHandlers::new(nop_smc, nop_smc, cpu_on);
        let mut args = SmcArgs::default();

        (table.std_smc)(&mut args);
        (table.fast_smc)(&mut args);
    }
}
