// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::any::{Any, TypeId};

use crate::configurer::Configurer;

/// Ordered set of configurer units, at most one per unit type.
#[derive(Debug, Default)]
pub struct ConfigurerRegistry {
    units: Vec<Box<dyn Configurer>>,
}

fn unit_type(unit: &dyn Configurer) -> TypeId {
    unit.as_any().type_id()
}

impl ConfigurerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn position<C: Configurer>(&self) -> Option<usize> {
        let wanted = TypeId::of::<C>();
        self.units.iter().position(|u| unit_type(u.as_ref()) == wanted)
    }

    fn downcast_mut<C: Configurer>(&mut self, index: usize) -> &mut C {
        self.units[index]
            .as_any_mut()
            .downcast_mut::<C>()
            .expect("unit type was checked by position")
    }

    /// Add `unit` unless one of its type is registered; either way return the registered one.
    pub fn apply<C: Configurer>(&mut self, unit: C) -> &mut C {
        let index = match self.position::<C>() {
            Some(index) => index,
            None => {
                self.units.push(Box::new(unit));
                self.units.len() - 1
            }
        };
        self.downcast_mut(index)
    }

    /// The registered unit of type `C`, created with its default when absent.
    pub fn apply_default<C: Configurer + Default>(&mut self) -> &mut C {
        match self.position::<C>() {
            Some(index) => self.downcast_mut(index),
            None => self.apply(C::default()),
        }
    }

    /// Move the unit of type `C` (or a fresh default) to the end of the order.
    pub fn reapply<C: Configurer + Default>(&mut self) {
        let unit = match self.position::<C>() {
            Some(index) => self.units.remove(index),
            None => Box::new(C::default()),
        };
        self.units.push(unit);
    }

    pub fn get<C: Configurer>(&self) -> Option<&C> {
        self.position::<C>()
            .and_then(|index| self.units[index].as_any().downcast_ref())
    }

    pub fn contains<C: Configurer>(&self) -> bool {
        self.position::<C>().is_some()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Unit names in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.units.iter().map(|u| u.name()).collect()
    }

    pub(crate) fn take_units(&mut self) -> Vec<Box<dyn Configurer>> {
        std::mem::take(&mut self.units)
    }

    pub(crate) fn restore_units(&mut self, units: Vec<Box<dyn Configurer>>) {
        self.units = units;
    }
}
