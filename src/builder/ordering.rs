// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dependency ordering of configurer units (Kahn's algorithm).
//!
//! Edges run from the unit providing an artifact type to every unit that
//! requires it. Among units that are ready at the same time the lowest rank
//! goes first, then registration order. Requirements no unit provides are
//! expected to be satisfied by explicit components and add no edge.

use std::any::TypeId;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::configurer::Configurer;
use crate::error::BuildError;
use crate::trace_fmt;

/// Order `units` so that providers come before the units requiring them.
pub fn sort_units(units: Vec<Box<dyn Configurer>>) -> Result<Vec<Box<dyn Configurer>>, BuildError> {
    let order = topological_order(&units)?;

    let mut slots: Vec<Option<Box<dyn Configurer>>> = units.into_iter().map(Some).collect();
    Ok(order
        .into_iter()
        .filter_map(|index| slots[index].take())
        .collect())
}

fn topological_order(units: &[Box<dyn Configurer>]) -> Result<Vec<usize>, BuildError> {
    let mut providers: HashMap<TypeId, usize> = HashMap::new();
    for (index, unit) in units.iter().enumerate() {
        for artifact in unit.provides() {
            if let Some(&first) = providers.get(&artifact.id) {
                return Err(BuildError::DuplicateProvider {
                    artifact: artifact.name.to_string(),
                    first: units[first].name().to_string(),
                    second: unit.name().to_string(),
                });
            }
            providers.insert(artifact.id, index);
        }
    }

    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); units.len()];
    let mut in_degree = vec![0usize; units.len()];
    for (index, unit) in units.iter().enumerate() {
        for artifact in unit.requires() {
            match providers.get(&artifact.id) {
                Some(&provider) if provider != index => {
                    dependents[provider].push(index);
                    in_degree[index] += 1;
                }
                Some(_) => {}
                None => trace_fmt!("Ordering", "{} requires {} with no provider", unit.name(), artifact.name),
            }
        }
    }

    let mut ready: BinaryHeap<Reverse<(u32, usize)>> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, degree)| **degree == 0)
        .map(|(index, _)| Reverse((units[index].rank(), index)))
        .collect();

    let mut order = Vec::with_capacity(units.len());
    while let Some(Reverse((_, index))) = ready.pop() {
        order.push(index);
        for &dependent in &dependents[index] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                ready.push(Reverse((units[dependent].rank(), dependent)));
            }
        }
    }

    if order.len() < units.len() {
        let stuck: Vec<&str> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree > 0)
            .map(|(index, _)| units[index].name())
            .collect();
        return Err(BuildError::OrderingCycle(stuck.join(", ")));
    }

    Ok(order)
}
