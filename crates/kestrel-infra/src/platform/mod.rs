// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Provides the toolkit's platform-facing types.
//!
//! [`raw`] mirrors the C layout of the toolkit's event record and [`input`]
//! translates those records into Kestrel domain events.

pub mod input;
pub mod raw;

/// The result a host callback hands back to the toolkit's driver.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppResult {
    /// Keep running.
    Continue = 0,
    /// Stop and report success.
    Success = 1,
    /// Stop and report failure.
    Failure = 2,
}

impl AppResult {
    /// Returns `true` if the driver should keep calling back.
    #[inline]
    pub fn is_continue(self) -> bool {
        self == AppResult::Continue
    }

    /// The process exit code conventionally associated with this result.
    pub fn exit_code(self) -> i32 {
        match self {
            AppResult::Continue | AppResult::Success => 0,
            AppResult::Failure => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_continue_keeps_running() {
        assert!(AppResult::Continue.is_continue());
        assert!(!AppResult::Success.is_continue());
        assert!(!AppResult::Failure.is_continue());
    }

    #[test]
    fn failure_maps_to_a_nonzero_exit_code() {
        assert_eq!(AppResult::Success.exit_code(), 0);
        assert_eq!(AppResult::Failure.exit_code(), 1);
        assert_eq!(AppResult::Failure as i32, 2);
    }
}
