// Copyright The LS TEE Core Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! Build script for ls-tee-core.

const PLATFORMS: &[&str] = &["ls1021atwr", "ls1043ardb", "ls1046ardb", "lx2160ardb"];

fn main() {
    println!(
        "cargo::rustc-check-cfg=cfg(platform, values(\"{}\"))",
        PLATFORMS.join("\", \""),
    );
}
