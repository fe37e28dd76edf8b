// Copyright The LS TEE Core Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! Hardware unique key retrieval.
//!
//! The per-device secret is fused into silicon and only the SiP firmware can
//! release it. Each fetch is a single fast call with no state carried
//! between calls; nothing is cached on this side.

use crate::mmio::Mmio;
use crate::smccc::{FunctionId, OwningEntityNumber, SecureMonitor, SmcccCallType};
use core::fmt::{self, Display, Formatter};
use core::ptr;
use log::error;

/// Size in bytes of the hardware unique key.
pub const HW_UNIQUE_KEY_SIZE: usize = 16;

/// SiP fast call that copies the hardware unique key to a caller buffer.
pub const SIP_HW_UNIQUE_KEY: FunctionId =
    FunctionId::new(SmcccCallType::Fast32, OwningEntityNumber::SIP, 0xFF14);

/// A fetched per-device secret.
///
/// Deliberately carries no `Debug` implementation; the key must not end up
/// on the console.
#[derive(Clone, Default, Eq, PartialEq)]
pub struct HwUniqueKey {
    /// The key bytes.
    pub data: [u8; HW_UNIQUE_KEY_SIZE],
}

/// Security-class failure: the SiP firmware refused to release the key.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SecurityError {
    /// The firmware's negative return code.
    pub code: i64,
}

impl Display for SecurityError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "secure firmware refused the hardware unique key request ({})",
            self.code
        )
    }
}

/// Exchange buffer; the 64-byte alignment is part of the firmware contract.
#[repr(C, align(64))]
struct ScratchBuffer([u8; HW_UNIQUE_KEY_SIZE]);

/// Fetches the hardware unique key into `key`.
///
/// On failure the destination is left untouched. The exchange buffer is
/// scrubbed before returning, whatever the outcome.
pub fn request_hw_unique_key(
    mmio: &impl Mmio,
    monitor: &impl SecureMonitor,
    key: &mut HwUniqueKey,
) -> Result<(), SecurityError> {
    let mut scratch = ScratchBuffer([0; HW_UNIQUE_KEY_SIZE]);

    let Some(pa) = mmio.virt_to_phys(scratch.0.as_mut_ptr() as usize) else {
        panic!("hardware key exchange buffer has no physical address");
    };

    let ret = monitor.call(SIP_HW_UNIQUE_KEY, [pa as u64, HW_UNIQUE_KEY_SIZE as u64]);

    let result = if ret < 0 {
        error!("hardware unique key was not released by the platform firmware");
        Err(SecurityError { code: ret })
    } else {
        key.data.copy_from_slice(&scratch.0);
        Ok(())
    };

    // Scrub the exchange copy of the secret.
    for byte in scratch.0.iter_mut() {
        // SAFETY: `byte` is a valid, exclusive reference into the buffer.
        unsafe { ptr::write_volatile(byte, 0) };
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::test::FakeMmio;
    use crate::smccc::{NOT_SUPPORTED, SUCCESS};

    /// Fake SiP firmware that writes `key` through the physical address the
    /// broker passes, then returns `ret`.
    struct FakeSipFirmware {
        ret: i64,
        key: [u8; HW_UNIQUE_KEY_SIZE],
    }

    impl SecureMonitor for FakeSipFirmware {
        fn call(&self, function: FunctionId, args: [u64; 2]) -> i64 {
            assert_eq!(function, SIP_HW_UNIQUE_KEY);
            assert_eq!(args[1], HW_UNIQUE_KEY_SIZE as u64);
            assert_eq!(args[0] % 64, 0, "exchange buffer is misaligned");

            if self.ret >= 0 {
                // SAFETY: The broker passed the identity-mapped address of
                // its exchange buffer, which stays alive across this call.
                let dest =
                    unsafe { core::slice::from_raw_parts_mut(args[0] as *mut u8, args[1] as usize) };
                dest.copy_from_slice(&self.key);
            }
            self.ret
        }
    }

    #[test]
    fn key_is_copied_out_on_success() {
        let mmio = FakeMmio::new();
        let firmware = FakeSipFirmware {
            ret: SUCCESS,
            key: *b"\x01\x02\x03\x04\x05\x06\x07\x08\x09\x0a\x0b\x0c\x0d\x0e\x0f\x10",
        };
        let mut key = HwUniqueKey::default();

        assert_eq!(request_hw_unique_key(&mmio, &firmware, &mut key), Ok(()));
        assert_eq!(key.data, firmware.key);
    }

    #[test]
    fn destination_is_untouched_on_failure() {
        let mmio = FakeMmio::new();
        let firmware = FakeSipFirmware {
            ret: NOT_SUPPORTED,
            key: [0; HW_UNIQUE_KEY_SIZE],
        };
        let mut key = HwUniqueKey {
            data: [0xA5; HW_UNIQUE_KEY_SIZE],
        };

        let result = request_hw_unique_key(&mmio, &firmware, &mut key);

        assert_eq!(result, Err(SecurityError { code: NOT_SUPPORTED }));
        assert_eq!(key.data, [0xA5; HW_UNIQUE_KEY_SIZE]);
    }

    #[test]
    fn every_call_is_independent() {
        let mmio = FakeMmio::new();
        let mut key = HwUniqueKey::default();

        let first = FakeSipFirmware {
            ret: SUCCESS,
            key: [0x11; HW_UNIQUE_KEY_SIZE],
        };
        request_hw_unique_key(&mmio, &first, &mut key).unwrap();
        assert_eq!(key.data, [0x11; HW_UNIQUE_KEY_SIZE]);

        let second = FakeSipFirmware {
            ret: SUCCESS,
            key: [0x22; HW_UNIQUE_KEY_SIZE],
        };
        request_hw_unique_key(&mmio, &second, &mut key).unwrap();
        assert_eq!(key.data, [0x22; HW_UNIQUE_KEY_SIZE]);
    }
}
