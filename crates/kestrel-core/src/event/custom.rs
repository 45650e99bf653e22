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

//! Process-wide assignment of runtime type codes to custom event types.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock, PoisonError};

use super::base::EventType;

#[derive(Debug)]
struct CustomEventTypeRegistry {
    next: u32,
    codes: HashMap<TypeId, EventType>,
}

fn registry() -> &'static Mutex<CustomEventTypeRegistry> {
    static REGISTRY: OnceLock<Mutex<CustomEventTypeRegistry>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        Mutex::new(CustomEventTypeRegistry {
            next: EventType::FIRST_CUSTOM.code(),
            codes: HashMap::new(),
        })
    })
}

/// Returns the runtime type code of the custom event type `T`.
///
/// The first call for a given `T` assigns the next free code; every later call
/// returns that same code for the rest of the process. Codes are handed out in
/// first-touch order starting at [`EventType::FIRST_CUSTOM`].
pub fn custom_event_type<T: 'static>() -> EventType {
    let mut guard = registry().lock().unwrap_or_else(PoisonError::into_inner);
    let CustomEventTypeRegistry { next, codes } = &mut *guard;
    *codes.entry(TypeId::of::<T>()).or_insert_with(|| {
        let code = EventType(*next);
        *next += 1;
        log::debug!("Custom event type {} registered as {code}.", type_name::<T>());
        code
    })
}

/// Returns how many custom event types have been assigned a code so far.
pub fn registered_custom_event_count() -> usize {
    registry()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .codes
        .len()
}
