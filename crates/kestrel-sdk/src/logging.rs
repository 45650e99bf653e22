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

//! Logging setup.

use env_logger::{Builder, Env};

use crate::config::RunnerConfig;

/// Installs `env_logger` as the global logger, writing to stderr.
///
/// `RUST_LOG` overrides `config.log_filter`. Only the first call in a process
/// installs anything; later calls return `false`.
pub fn init(config: &RunnerConfig) -> bool {
    Builder::from_env(Env::default().default_filter_or(config.log_filter.as_str()))
        .try_init()
        .is_ok()
}
