//! # Dependency Graph
//!
//! Explicit graph over realized resources, used to order teardown.
//! Edges point from a resource to the resources whose outputs it consumed.

use crate::error::DeployError;
use crate::stack::{RealizedResource, Urn};
use std::collections::{HashMap, VecDeque};

#[derive(Debug)]
pub struct DependencyGraph<'a> {
    resources: &'a [RealizedResource],
    index: HashMap<&'a Urn, usize>,
}

impl<'a> DependencyGraph<'a> {
    #[must_use]
    pub fn new(resources: &'a [RealizedResource]) -> Self {
        let index = resources
            .iter()
            .enumerate()
            .map(|(position, resource)| (&resource.urn, position))
            .collect();
        Self { resources, index }
    }

    /// Resources that consumed outputs of `urn`
    #[must_use]
    pub fn dependents_of(&self, urn: &Urn) -> Vec<&'a Urn> {
        self.resources
            .iter()
            .filter(|resource| resource.dependencies.contains(urn))
            .map(|resource| &resource.urn)
            .collect()
    }

    /// Dependencies before dependents; ties keep the recorded order.
    /// Dependencies on resources outside the graph are ignored.
    ///
    /// # Errors
    /// Returns `DependencyCycle` if the recorded dependencies form a cycle
    pub fn creation_order(&self) -> Result<Vec<&'a RealizedResource>, DeployError> {
        let mut pending: Vec<usize> = self
            .resources
            .iter()
            .map(|resource| {
                resource
                    .dependencies
                    .iter()
                    .filter(|dependency| self.index.contains_key(dependency))
                    .count()
            })
            .collect();

        let mut ready: VecDeque<usize> = pending
            .iter()
            .enumerate()
            .filter(|(_, count)| **count == 0)
            .map(|(position, _)| position)
            .collect();

        let mut order = Vec::with_capacity(self.resources.len());
        while let Some(position) = ready.pop_front() {
            let resource = &self.resources[position];
            order.push(resource);

            for (dependent, candidate) in self.resources.iter().enumerate() {
                if candidate.dependencies.contains(&resource.urn) {
                    pending[dependent] -= 1;
                    if pending[dependent] == 0 {
                        ready.push_back(dependent);
                    }
                }
            }
        }

        if order.len() < self.resources.len() {
            let stuck = pending
                .iter()
                .position(|count| *count > 0)
                .map_or_else(
                    || self.resources[0].urn.clone(),
                    |position| self.resources[position].urn.clone(),
                );
            return Err(DeployError::DependencyCycle(stuck));
        }

        Ok(order)
    }

    /// Dependents before dependencies
    ///
    /// # Errors
    /// Returns `DependencyCycle` if the recorded dependencies form a cycle
    pub fn destroy_order(&self) -> Result<Vec<&'a RealizedResource>, DeployError> {
        let mut order = self.creation_order()?;
        order.reverse();
        Ok(order)
    }
}
