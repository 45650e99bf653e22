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

use super::base::BoxedEvent;
use crate::Result;

/// Converts platform event records into domain events.
///
/// Implemented by the toolkit layer; the bus only sees this contract.
pub trait EventAdaptor {
    /// The platform's event record.
    type Raw: ?Sized;

    /// Builds the domain event matching `raw`.
    ///
    /// # Errors
    /// Returns [`Error::UnknownEvent`](crate::Error::UnknownEvent) when the
    /// record's discriminator is not one the adaptor recognises.
    fn adapt(&self, raw: &Self::Raw) -> Result<BoxedEvent>;

    /// Returns `true` if `raw` is the platform's quit record.
    fn is_quit(&self, raw: &Self::Raw) -> bool;
}
