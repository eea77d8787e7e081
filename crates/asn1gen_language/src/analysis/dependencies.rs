//! Dependency ordering of a module's assignments.
//!
//! Builds the directed graph whose nodes are the module's assignments and
//! whose edges are "A references B", where a reference is any defined type
//! or referenced value naming another local assignment. References to
//! imported symbols contribute no edges; the import declaration itself
//! orders cross-module emission. Tag, constraint and default-value subtrees
//! contribute references recursively, and `COMPONENTS OF X` contributes an
//! edge to X.
//!
//! Tarjan's strongly-connected-components algorithm yields the components
//! with every dependency ahead of its dependents, so back ends can emit
//! leaves first. A component of more than one assignment, or a single
//! assignment that references itself, is a recursion cluster and must be
//! emitted declaration-then-definition.

use crate::sema::{Assignment, Descendants, Module, NodeRef, TypeNode, ValueNode};
use std::collections::HashMap;

/// Sorts a module's assignments into reference-ordered components.
///
/// Each inner list is one strongly connected component; components are
/// ordered so that for any reference from component `i` to component `j`,
/// `j < i`. Order within a component is deterministic but unspecified.
pub fn dependency_sort(module: &Module) -> Vec<Vec<&Assignment>> {
    let index: HashMap<&str, usize> = module
        .assignments
        .iter()
        .enumerate()
        .map(|(position, assignment)| (assignment.name(), position))
        .collect();

    let successors: Vec<Vec<usize>> = module
        .assignments
        .iter()
        .map(|assignment| local_references(assignment, &index))
        .collect();

    let components = Tarjan::run(&successors);
    components
        .into_iter()
        .map(|component| {
            component
                .into_iter()
                .map(|position| &module.assignments[position])
                .collect()
        })
        .collect()
}

/// Whether a component must be emitted declaration-then-definition.
///
/// True for any multi-assignment component, and for a singleton whose
/// assignment references itself.
pub fn is_recursion_cluster(component: &[&Assignment]) -> bool {
    match component {
        [single] => {
            let own_name = single.name();
            let index: HashMap<&str, usize> = [(own_name, 0)].into_iter().collect();
            !local_references(single, &index).is_empty()
        }
        _ => true,
    }
}

/// Indices of the local assignments one assignment references.
fn local_references(assignment: &Assignment, index: &HashMap<&str, usize>) -> Vec<usize> {
    let mut references = Vec::new();
    for node in Descendants::from_assignment(assignment) {
        let name = match node {
            NodeRef::Type(TypeNode::Defined(defined)) if defined.module_ref.is_none() => {
                Some(defined.type_name.as_str())
            }
            NodeRef::Value(ValueNode::Referenced {
                module_ref: None,
                name,
            }) => Some(name.as_str()),
            _ => None,
        };
        if let Some(position) = name.and_then(|name| index.get(name)) {
            if !references.contains(position) {
                references.push(*position);
            }
        }
    }
    references
}

/// Tarjan's algorithm over assignment indices.
///
/// Components complete in dependency order: every successor's component is
/// emitted before the component of the node that references it.
struct Tarjan<'a> {
    successors: &'a [Vec<usize>],
    counter: usize,
    indices: Vec<Option<usize>>,
    lowlinks: Vec<usize>,
    on_stack: Vec<bool>,
    stack: Vec<usize>,
    components: Vec<Vec<usize>>,
}

impl<'a> Tarjan<'a> {
    fn run(successors: &'a [Vec<usize>]) -> Vec<Vec<usize>> {
        let count = successors.len();
        let mut tarjan = Tarjan {
            successors,
            counter: 0,
            indices: vec![None; count],
            lowlinks: vec![0; count],
            on_stack: vec![false; count],
            stack: Vec::new(),
            components: Vec::new(),
        };
        for node in 0..count {
            if tarjan.indices[node].is_none() {
                tarjan.connect(node);
            }
        }
        tarjan.components
    }

    fn connect(&mut self, node: usize) {
        self.indices[node] = Some(self.counter);
        self.lowlinks[node] = self.counter;
        self.counter += 1;
        self.stack.push(node);
        self.on_stack[node] = true;

        for &successor in &self.successors[node] {
            match self.indices[successor] {
                None => {
                    self.connect(successor);
                    self.lowlinks[node] = self.lowlinks[node].min(self.lowlinks[successor]);
                }
                Some(successor_index) if self.on_stack[successor] => {
                    self.lowlinks[node] = self.lowlinks[node].min(successor_index);
                }
                Some(_) => {}
            }
        }

        if self.lowlinks[node] == self.indices[node].unwrap() {
            let mut component = Vec::new();
            loop {
                let member = self.stack.pop().unwrap();
                self.on_stack[member] = false;
                component.push(member);
                if member == node {
                    break;
                }
            }
            self.components.push(component);
        }
    }
}
