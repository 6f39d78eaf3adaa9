//! `PropertySet` and related types for pass communication.
//!
//! Passes share data through a [`PropertySet`]: the layout pass writes
//! the logical-to-physical binding, the routing pass reads the coupling
//! map and updates the layout as it inserts exchange operations, and
//! the caller reads the final layout and routing summary back out.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::collections::VecDeque;

use quill_ir::QubitId;

/// A bijection between logical qubits and physical qubit indices.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Layout {
    /// Map from logical qubit to physical qubit index.
    logical_to_physical: FxHashMap<QubitId, u32>,
    /// Map from physical qubit index to logical qubit.
    physical_to_logical: FxHashMap<u32, QubitId>,
}

impl Layout {
    /// Create a new empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the identity layout (logical qubit i → physical qubit i).
    pub fn trivial(num_qubits: u32) -> Self {
        let mut layout = Self::new();
        for i in 0..num_qubits {
            layout.add(QubitId(i), i);
        }
        layout
    }

    /// Add a mapping from logical to physical qubit.
    ///
    /// Existing mappings involving either side are removed first so the
    /// two maps stay mutually consistent.
    pub fn add(&mut self, logical: QubitId, physical: u32) {
        if let Some(&old_logical) = self.physical_to_logical.get(&physical) {
            if old_logical != logical {
                self.logical_to_physical.remove(&old_logical);
            }
        }
        if let Some(&old_physical) = self.logical_to_physical.get(&logical) {
            if old_physical != physical {
                self.physical_to_logical.remove(&old_physical);
            }
        }
        self.logical_to_physical.insert(logical, physical);
        self.physical_to_logical.insert(physical, logical);
    }

    /// Get the physical qubit bound to a logical qubit.
    pub fn get_physical(&self, logical: QubitId) -> Option<u32> {
        self.logical_to_physical.get(&logical).copied()
    }

    /// Get the logical qubit bound to a physical qubit.
    pub fn get_logical(&self, physical: u32) -> Option<QubitId> {
        self.physical_to_logical.get(&physical).copied()
    }

    /// Exchange the logical qubits bound to two physical qubits.
    pub fn swap(&mut self, p1: u32, p2: u32) {
        let l1 = self.physical_to_logical.get(&p1).copied();
        let l2 = self.physical_to_logical.get(&p2).copied();

        if let Some(l1) = l1 {
            self.logical_to_physical.insert(l1, p2);
            self.physical_to_logical.insert(p2, l1);
        } else {
            self.physical_to_logical.remove(&p2);
        }

        if let Some(l2) = l2 {
            self.logical_to_physical.insert(l2, p1);
            self.physical_to_logical.insert(p1, l2);
        } else {
            self.physical_to_logical.remove(&p1);
        }
    }

    /// Check whether every logical qubit is bound to itself.
    pub fn is_identity(&self) -> bool {
        self.logical_to_physical.iter().all(|(l, &p)| l.0 == p)
    }

    /// Get the number of mapped qubits.
    pub fn len(&self) -> usize {
        self.logical_to_physical.len()
    }

    /// Check if the layout is empty.
    pub fn is_empty(&self) -> bool {
        self.logical_to_physical.is_empty()
    }

    /// Iterate over (logical, physical) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (QubitId, u32)> + '_ {
        self.logical_to_physical.iter().map(|(&l, &p)| (l, p))
    }
}

/// Hardware connectivity between physical qubits.
///
/// Edges are stored as supplied, directed control → target. Adjacency
/// and path queries treat the graph as undirected: an edge in either
/// orientation makes an interaction realizable. Neighbor lists are kept
/// in ascending index order, so breadth-first searches are
/// deterministic and path ties break toward lower physical indices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouplingMap {
    /// Directed control → target pairs as supplied.
    edges: Vec<(u32, u32)>,
    /// Number of physical qubits.
    num_qubits: u32,
    /// Undirected adjacency, each list sorted ascending.
    adjacency: FxHashMap<u32, Vec<u32>>,
}

impl CouplingMap {
    /// Create a new coupling map with the given number of qubits.
    pub fn new(num_qubits: u32) -> Self {
        Self {
            edges: vec![],
            num_qubits,
            adjacency: FxHashMap::default(),
        }
    }

    /// Build a coupling map from an adjacency list: control qubit →
    /// reachable target qubits.
    pub fn from_adjacency(adjacency: impl IntoIterator<Item = (u32, Vec<u32>)>) -> Self {
        let mut entries: Vec<(u32, Vec<u32>)> = adjacency.into_iter().collect();
        entries.sort_by_key(|(control, _)| *control);

        let highest = entries
            .iter()
            .flat_map(|(control, targets)| {
                std::iter::once(*control).chain(targets.iter().copied())
            })
            .max();
        let mut map = Self::new(highest.map_or(0, |q| q + 1));
        for (control, targets) in entries {
            for target in targets {
                map.add_edge(control, target);
            }
        }
        map
    }

    /// Add a directed edge from control to target.
    ///
    /// Duplicate directed edges are ignored.
    pub fn add_edge(&mut self, control: u32, target: u32) {
        if self.edges.iter().any(|&(c, t)| c == control && t == target) {
            return;
        }
        self.edges.push((control, target));
        insert_sorted(self.adjacency.entry(control).or_default(), target);
        insert_sorted(self.adjacency.entry(target).or_default(), control);
    }

    /// Check if two qubits are adjacent (in either direction).
    #[inline]
    pub fn is_connected(&self, q1: u32, q2: u32) -> bool {
        self.adjacency
            .get(&q1)
            .is_some_and(|neighbors| neighbors.binary_search(&q2).is_ok())
    }

    /// Get the number of physical qubits.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Get the directed coupling edges as supplied.
    pub fn edges(&self) -> &[(u32, u32)] {
        &self.edges
    }

    /// Neighbors of a qubit in ascending index order.
    pub fn neighbors(&self, qubit: u32) -> impl Iterator<Item = u32> + '_ {
        self.adjacency
            .get(&qubit)
            .map(|v| v.iter().copied())
            .into_iter()
            .flatten()
    }

    /// Shortest-path distance in edges between two qubits, or `None`
    /// if they are disconnected.
    pub fn distance(&self, from: u32, to: u32) -> Option<u32> {
        self.shortest_path(from, to)
            .map(|path| u32::try_from(path.len() - 1).expect("path length exceeds u32"))
    }

    /// Shortest path between two qubits by edge count, or `None` if
    /// they are disconnected.
    ///
    /// Neighbors are explored in ascending order, so among equally
    /// short paths the one through lower physical indices wins.
    pub fn shortest_path(&self, from: u32, to: u32) -> Option<Vec<u32>> {
        if from == to {
            return Some(vec![from]);
        }

        let mut predecessor: FxHashMap<u32, u32> = FxHashMap::default();
        let mut queue = VecDeque::new();
        predecessor.insert(from, from);
        queue.push_back(from);

        while let Some(current) = queue.pop_front() {
            for neighbor in self.neighbors(current) {
                if predecessor.contains_key(&neighbor) {
                    continue;
                }
                predecessor.insert(neighbor, current);

                if neighbor == to {
                    let mut path = vec![to];
                    let mut node = to;
                    while node != from {
                        node = predecessor[&node];
                        path.push(node);
                    }
                    path.reverse();
                    return Some(path);
                }

                queue.push_back(neighbor);
            }
        }

        None
    }

    /// Create a linear chain 0-1-2-...-(n-1).
    pub fn linear(n: u32) -> Self {
        let mut map = Self::new(n);
        for i in 0..n.saturating_sub(1) {
            map.add_edge(i, i + 1);
        }
        map
    }

    /// Create a fully connected (all-to-all) coupling map.
    pub fn full(n: u32) -> Self {
        let mut map = Self::new(n);
        for i in 0..n {
            for j in (i + 1)..n {
                map.add_edge(i, j);
            }
        }
        map
    }

    /// Create a star topology (qubit 0 connected to all others).
    pub fn star(n: u32) -> Self {
        let mut map = Self::new(n);
        for i in 1..n {
            map.add_edge(0, i);
        }
        map
    }
}

/// Insert into a sorted vector, skipping duplicates.
fn insert_sorted(list: &mut Vec<u32>, value: u32) {
    if let Err(position) = list.binary_search(&value) {
        list.insert(position, value);
    }
}

/// Target basis gates, an ordered stopping set for the unroller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasisGates {
    /// Gate names in the basis, in caller order.
    gates: Vec<String>,
}

impl BasisGates {
    /// Create a new basis gates set.
    pub fn new(gates: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            gates: gates.into_iter().map(Into::into).collect(),
        }
    }

    /// Check if a gate is in the basis.
    pub fn contains(&self, gate: &str) -> bool {
        self.gates.iter().any(|g| g == gate)
    }

    /// Get the basis gate names.
    pub fn gates(&self) -> &[String] {
        &self.gates
    }
}

impl Default for BasisGates {
    /// The default `u1,u2,u3,cx,id` basis.
    fn default() -> Self {
        Self::new(["u1", "u2", "u3", "cx", "id"])
    }
}

/// Cost summary written by the routing pass.
///
/// The exchange count is the metric callers use to compare layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingSummary {
    /// Number of exchange (swap) operations inserted.
    pub swaps_inserted: usize,
}

/// Properties shared between compilation passes.
///
/// Standard properties (layout, coupling map, basis gates) have
/// dedicated fields; passes can stash anything else through the typed
/// custom storage.
#[derive(Debug, Default)]
pub struct PropertySet {
    /// Qubit layout mapping (logical → physical).
    pub layout: Option<Layout>,

    /// Target coupling map defining allowed two-qubit interactions.
    pub coupling_map: Option<CouplingMap>,

    /// Target basis gates, carried as compilation metadata.
    pub basis_gates: Option<BasisGates>,

    /// Custom properties storage (type-erased).
    custom: FxHashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl PropertySet {
    /// Create a new empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a property set with target configuration.
    #[must_use]
    pub fn with_target(mut self, coupling_map: CouplingMap, basis_gates: BasisGates) -> Self {
        self.coupling_map = Some(coupling_map);
        self.basis_gates = Some(basis_gates);
        self
    }

    /// Set the layout.
    #[must_use]
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Insert a custom property.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) {
        self.custom.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Get a custom property.
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.custom
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Get a mutable custom property.
    pub fn get_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.custom
            .get_mut(&TypeId::of::<T>())
            .and_then(|v| v.downcast_mut())
    }

    /// Remove a custom property.
    pub fn remove<T: Any>(&mut self) -> Option<T> {
        self.custom
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|v| *v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_trivial() {
        let layout = Layout::trivial(5);
        assert_eq!(layout.get_physical(QubitId(0)), Some(0));
        assert_eq!(layout.get_physical(QubitId(4)), Some(4));
        assert_eq!(layout.get_logical(2), Some(QubitId(2)));
        assert!(layout.is_identity());
    }

    #[test]
    fn test_layout_swap() {
        let mut layout = Layout::trivial(3);
        layout.swap(0, 2);

        assert_eq!(layout.get_physical(QubitId(0)), Some(2));
        assert_eq!(layout.get_physical(QubitId(2)), Some(0));
        assert_eq!(layout.get_logical(0), Some(QubitId(2)));
        assert_eq!(layout.get_logical(2), Some(QubitId(0)));
        assert!(!layout.is_identity());
    }

    #[test]
    fn test_coupling_map_linear() {
        let map = CouplingMap::linear(5);
        assert!(map.is_connected(0, 1));
        assert!(map.is_connected(1, 0));
        assert!(!map.is_connected(0, 2));
        assert_eq!(map.distance(0, 4), Some(4));
        assert_eq!(map.shortest_path(0, 3), Some(vec![0, 1, 2, 3]));
    }

    #[test]
    fn test_coupling_map_star() {
        let map = CouplingMap::star(5);
        assert!(map.is_connected(0, 4));
        assert!(!map.is_connected(1, 2));
        assert_eq!(map.distance(1, 2), Some(2));
        assert_eq!(map.shortest_path(1, 2), Some(vec![1, 0, 2]));
    }

    #[test]
    fn test_coupling_map_disconnected() {
        let mut map = CouplingMap::new(3);
        map.add_edge(0, 1);
        assert_eq!(map.distance(0, 2), None);
        assert_eq!(map.shortest_path(0, 2), None);
    }

    #[test]
    fn test_from_adjacency() {
        // 0 → {1}, 1 → {2}: a directed linear chain.
        let map = CouplingMap::from_adjacency([(0, vec![1]), (1, vec![2])]);
        assert_eq!(map.num_qubits(), 3);
        assert!(map.is_connected(0, 1));
        assert!(map.is_connected(1, 0));
        assert!(map.is_connected(1, 2));
        assert!(!map.is_connected(0, 2));
        assert_eq!(map.edges(), &[(0, 1), (1, 2)]);
    }

    #[test]
    fn test_tie_break_prefers_low_indices() {
        // Two length-2 paths from 1 to 2: through 0 and through 3.
        let mut map = CouplingMap::new(4);
        map.add_edge(1, 3);
        map.add_edge(3, 2);
        map.add_edge(1, 0);
        map.add_edge(0, 2);
        assert_eq!(map.shortest_path(1, 2), Some(vec![1, 0, 2]));
    }

    #[test]
    fn test_basis_gates_default() {
        let basis = BasisGates::default();
        assert!(basis.contains("u3"));
        assert!(basis.contains("cx"));
        assert!(!basis.contains("h"));
        assert_eq!(basis.gates().len(), 5);
    }

    #[test]
    fn test_property_set_custom() {
        let mut props = PropertySet::new();
        props.insert(RoutingSummary { swaps_inserted: 3 });
        assert_eq!(
            props.get::<RoutingSummary>(),
            Some(&RoutingSummary { swaps_inserted: 3 })
        );

        let removed = props.remove::<RoutingSummary>();
        assert_eq!(removed, Some(RoutingSummary { swaps_inserted: 3 }));
        assert!(props.get::<RoutingSummary>().is_none());
    }
}
