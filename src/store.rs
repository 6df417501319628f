// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Type-keyed artifact store shared by all configurers of one build.
//!
//! Holds at most one artifact per Rust type. Configurers read what earlier
//! stages published and publish their own artifact; only the pipeline
//! assembler drains the store. A build owns its store exclusively, so there
//! is no locking here.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;

use crate::error::BuildError;
use crate::trace_fmt;

struct Entry {
    type_name: &'static str,
    value: Box<dyn Any + Send + Sync>,
}

#[derive(Default)]
pub struct SharedObjectStore {
    objects: HashMap<TypeId, Entry>,
}

impl fmt::Debug for SharedObjectStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedObjectStore")
            .field("artifacts", &self.type_names())
            .finish()
    }
}

impl SharedObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.objects.get(&TypeId::of::<T>())?.value.downcast_ref()
    }

    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.contains_type(TypeId::of::<T>())
    }

    pub fn contains_type(&self, type_id: TypeId) -> bool {
        self.objects.contains_key(&type_id)
    }

    /// Publish an artifact. `None` never clobbers an existing entry.
    ///
    /// Returns whether the store changed.
    pub fn set<T: Any + Send + Sync>(&mut self, artifact: Option<T>) -> bool {
        let Some(artifact) = artifact else {
            trace_fmt!("SharedObjectStore", "Ignoring empty write for {}", type_name::<T>());
            return false;
        };

        trace_fmt!("SharedObjectStore", "Publishing {}", type_name::<T>());
        self.objects.insert(
            TypeId::of::<T>(),
            Entry {
                type_name: type_name::<T>(),
                value: Box::new(artifact),
            },
        );
        true
    }

    /// Register a ready-made component ahead of the build.
    ///
    /// A second registration of the same type is a configuration error.
    pub fn register<T: Any + Send + Sync>(&mut self, component: T) -> Result<(), BuildError> {
        if self.contains::<T>() {
            return Err(BuildError::DuplicateComponent(type_name::<T>()));
        }
        self.set(Some(component));
        Ok(())
    }

    /// Move an artifact out. Reserved for the assembler, which consumes the store.
    pub(crate) fn take<T: Any + Send + Sync>(&mut self) -> Option<T> {
        let entry = self.objects.remove(&TypeId::of::<T>())?;
        entry.value.downcast::<T>().ok().map(|boxed| *boxed)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Sorted type names of every stored artifact.
    pub fn type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.objects.values().map(|e| e.type_name).collect();
        names.sort_unstable();
        names
    }
}
