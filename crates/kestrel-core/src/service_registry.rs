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

//! A lazily populated, type-keyed service registry.
//!
//! The [`ServiceRegistry`] maps a service type to a factory. The first
//! [`request`](ServiceRegistry::request) for a type builds the service and
//! caches it; every later request returns that same instance. User code asks
//! for the services it needs without caring about construction order.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::{Error, Result};

type Factory = Box<dyn Fn() -> Rc<dyn Any>>;

/// A service registry keyed by [`TypeId`].
///
/// Services are shared as [`Rc`]s and dropped in reverse creation order when
/// the registry is cleared or dropped.
///
/// # Example
///
/// ```rust
/// use kestrel_core::service_registry::ServiceRegistry;
///
/// struct FontCache { size: u32 }
///
/// let mut registry = ServiceRegistry::new();
/// registry.register_factory(|| FontCache { size: 16 });
///
/// let fonts = registry.request::<FontCache>().unwrap();
/// assert_eq!(fonts.size, 16);
/// ```
#[derive(Default)]
pub struct ServiceRegistry {
    factories: HashMap<TypeId, Factory>,
    services: HashMap<TypeId, Rc<dyn Any>>,
    creation_order: Vec<TypeId>,
}

impl ServiceRegistry {
    /// Creates an empty service registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            services: HashMap::new(),
            creation_order: Vec::new(),
        }
    }

    /// Installs the factory for `S`, replacing any previous one.
    ///
    /// An instance that was already created is kept.
    pub fn register_factory<S, F>(&mut self, factory: F)
    where
        S: 'static,
        F: Fn() -> S + 'static,
    {
        let replaced = self
            .factories
            .insert(
                TypeId::of::<S>(),
                Box::new(move || Rc::new(factory()) as Rc<dyn Any>),
            )
            .is_some();
        if replaced {
            log::debug!("Factory for {} replaced.", type_name::<S>());
        } else {
            log::debug!("Factory for {} registered.", type_name::<S>());
        }
    }

    /// Returns the instance of `S`, creating it on first request.
    ///
    /// # Errors
    /// Returns [`Error::NoFactory`] if `S` has neither an instance nor a factory.
    pub fn request<S: 'static>(&mut self) -> Result<Rc<S>> {
        let id = TypeId::of::<S>();
        if let Some(service) = self.services.get(&id) {
            return downcast(service);
        }

        let factory = self
            .factories
            .get(&id)
            .ok_or(Error::NoFactory(type_name::<S>()))?;
        log::info!("Creating service {}.", type_name::<S>());
        let service = factory();
        self.services.insert(id, Rc::clone(&service));
        self.creation_order.push(id);
        downcast(&service)
    }

    /// Installs an already built instance of `S`, replacing any previous one.
    pub fn insert<S: 'static>(&mut self, service: S) {
        let id = TypeId::of::<S>();
        if self.services.insert(id, Rc::new(service)).is_some() {
            self.creation_order.retain(|existing| *existing != id);
        }
        self.creation_order.push(id);
    }

    /// Returns the instance of `S` if it already exists, without creating it.
    #[must_use]
    pub fn get<S: 'static>(&self) -> Option<Rc<S>> {
        self.services
            .get(&TypeId::of::<S>())
            .and_then(|service| downcast(service).ok())
    }

    /// Returns `true` if a factory for `S` is installed.
    #[must_use]
    pub fn is_registered<S: 'static>(&self) -> bool {
        self.factories.contains_key(&TypeId::of::<S>())
    }

    /// Returns `true` if an instance of `S` exists.
    #[must_use]
    pub fn contains<S: 'static>(&self) -> bool {
        self.services.contains_key(&TypeId::of::<S>())
    }

    /// Returns the number of live service instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Returns `true` if no service has been created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Drops every service, most recently created first, then every factory.
    pub fn clear(&mut self) {
        while let Some(id) = self.creation_order.pop() {
            drop(self.services.remove(&id));
        }
        self.services.clear();
        self.factories.clear();
    }
}

fn downcast<S: 'static>(service: &Rc<dyn Any>) -> Result<Rc<S>> {
    // Entries are keyed by their own TypeId, so this only fails on a logic error.
    Rc::clone(service)
        .downcast::<S>()
        .map_err(|_| Error::NoFactory(type_name::<S>()))
}

impl Drop for ServiceRegistry {
    fn drop(&mut self) {
        self.clear();
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("factories", &self.factories.len())
            .field("services", &self.services.len())
            .finish()
    }
}
