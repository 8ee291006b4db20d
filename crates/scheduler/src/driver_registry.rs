// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

//! Maps a driver name (as named in an approved action payload's `driver`
//! field) to the binary and timeout `ActionGuard` needs to invoke it.

use std::collections::HashMap;
use warden_guard::DriverBinding;

#[derive(Default)]
pub struct DriverRegistry {
    bindings: HashMap<String, DriverBinding>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, binding: DriverBinding) {
        self.bindings.insert(name.into(), binding);
    }

    pub fn get(&self, name: &str) -> Option<&DriverBinding> {
        self.bindings.get(name)
    }
}

#[cfg(test)]
#[path = "driver_registry_tests.rs"]
mod tests;
