//! Spring-network layout of tile positions.
//!
//! Each node is an anchor with springs attached: the offsets record where the
//! connected tiles should sit relative to this one, and the weights how much
//! that measurement is trusted. Relaxation walks every node along its
//! weighted net tension vector until the network settles.

use std::collections::BTreeMap;

use tracing::debug;

use crate::consts::{DEFAULT_MAX_RELAX_ITERATIONS, DEFAULT_MAX_TENSION_CUTOFF, EPSILON, RELAX_STEP};
use crate::error::{Result, StitchError};

/// One directed spring: the connected node should sit at our position plus
/// `offset`, trusted with `weight`.
#[derive(Clone, Debug, PartialEq)]
pub struct OffsetEntry {
    pub neighbor: usize,
    pub offset: (f64, f64),
    pub weight: f64,
}

/// A node in the layout: a position and the springs attached to it.
/// Offsets stay sorted by neighbor id; each neighbor appears at most once.
#[derive(Clone, Debug)]
pub struct LayoutPosition {
    id: usize,
    position: (f64, f64),
    offsets: Vec<OffsetEntry>,
}

impl LayoutPosition {
    fn new(id: usize, position: (f64, f64)) -> Self {
        Self {
            id,
            position,
            offsets: Vec::new(),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn position(&self) -> (f64, f64) {
        self.position
    }

    pub fn offsets(&self) -> &[OffsetEntry] {
        &self.offsets
    }

    /// Isolated nodes have no offsets, usually because every pair alignment
    /// against them failed or was pruned.
    pub fn is_isolated(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn connected_ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.offsets.iter().map(|e| e.neighbor)
    }

    pub fn get_offset(&self, neighbor: usize) -> Option<&OffsetEntry> {
        self.offsets
            .binary_search_by_key(&neighbor, |e| e.neighbor)
            .ok()
            .map(|i| &self.offsets[i])
    }

    fn set_offset(&mut self, neighbor: usize, offset: (f64, f64), weight: f64) {
        match self.offsets.binary_search_by_key(&neighbor, |e| e.neighbor) {
            Ok(i) => {
                self.offsets[i].offset = offset;
                self.offsets[i].weight = weight;
            }
            Err(i) => self.offsets.insert(
                i,
                OffsetEntry {
                    neighbor,
                    offset,
                    weight,
                },
            ),
        }
    }
}

/// Arranges tiles in 2D space to form a mosaic. The edge relation is
/// symmetric and anti-symmetric in offset sign: setting A->B to v also sets
/// B->A to -v with the same weight.
#[derive(Clone, Debug, Default)]
pub struct Layout {
    nodes: BTreeMap<usize, LayoutPosition>,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: usize) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node(&self, id: usize) -> Option<&LayoutPosition> {
        self.nodes.get(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &LayoutPosition> {
        self.nodes.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes.keys().copied()
    }

    pub fn position(&self, id: usize) -> Option<(f64, f64)> {
        self.nodes.get(&id).map(|n| n.position)
    }

    pub fn create_node(&mut self, id: usize, position: (f64, f64)) -> Result<()> {
        if self.nodes.contains_key(&id) {
            return Err(StitchError::InvalidInput(format!(
                "node {id} already exists"
            )));
        }
        self.nodes.insert(id, LayoutPosition::new(id, position));
        Ok(())
    }

    /// Add a new node placed relative to an existing one, with the edge
    /// between them recorded.
    pub fn create_offset_node(
        &mut self,
        existing: usize,
        new_id: usize,
        offset: (f64, f64),
        weight: f64,
    ) -> Result<()> {
        let base = self.position(existing).ok_or_else(|| {
            StitchError::InvalidInput(format!("node {existing} does not exist"))
        })?;
        self.create_node(new_id, (base.0 + offset.0, base.1 + offset.1))?;
        self.set_offset(existing, new_id, offset, weight)
    }

    /// Record the expected offset between two nodes: subtracting A's position
    /// from B's should yield `offset`. Writes both directions.
    pub fn set_offset(
        &mut self,
        a: usize,
        b: usize,
        offset: (f64, f64),
        weight: f64,
    ) -> Result<()> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(StitchError::InvalidInput(format!(
                "offset weight must be finite and non-negative, got {weight}"
            )));
        }
        if !self.nodes.contains_key(&a) || !self.nodes.contains_key(&b) {
            return Err(StitchError::InvalidInput(format!(
                "set_offset on unknown node pair ({a}, {b})"
            )));
        }
        if let Some(node) = self.nodes.get_mut(&a) {
            node.set_offset(b, offset, weight);
        }
        if let Some(node) = self.nodes.get_mut(&b) {
            node.set_offset(a, (-offset.0, -offset.1), weight);
        }
        Ok(())
    }

    /// Unweighted net tension: the sum of `(p_j - p_i) - v_ij` over the
    /// node's springs.
    pub fn net_tension(&self, id: usize) -> (f64, f64) {
        self.tension_sum(id, false)
    }

    /// Weighted net tension: the direction this node wants to move.
    pub fn weighted_net_tension(&self, id: usize) -> (f64, f64) {
        self.tension_sum(id, true)
    }

    fn tension_sum(&self, id: usize, weighted: bool) -> (f64, f64) {
        let Some(node) = self.nodes.get(&id) else {
            return (0.0, 0.0);
        };
        let mut ty = 0.0;
        let mut tx = 0.0;
        for entry in &node.offsets {
            let Some(other) = self.nodes.get(&entry.neighbor) else {
                continue;
            };
            let w = if weighted { entry.weight } else { 1.0 };
            ty += w * ((other.position.0 - node.position.0) - entry.offset.0);
            tx += w * ((other.position.1 - node.position.1) - entry.offset.1);
        }
        (ty, tx)
    }

    pub fn max_tension(&self) -> f64 {
        self.nodes
            .keys()
            .map(|&id| vector_norm(self.net_tension(id)))
            .fold(0.0, f64::max)
    }

    pub fn max_weighted_tension(&self) -> f64 {
        self.nodes
            .keys()
            .map(|&id| vector_norm(self.weighted_net_tension(id)))
            .fold(0.0, f64::max)
    }

    /// Move all nodes by the same vector.
    pub fn translate(&mut self, vector: (f64, f64)) {
        for node in self.nodes.values_mut() {
            node.position.0 += vector.0;
            node.position.1 += vector.1;
        }
    }

    /// Absorb another layout's nodes. Colliding ids are replaced.
    pub fn merge(&mut self, other: Layout) {
        self.nodes.extend(other.nodes);
    }

    /// One Jacobi relaxation step: every tension vector is evaluated against
    /// the positions from the start of the step, then all nodes move at once.
    /// Edges and weights are untouched; only positions change.
    pub(crate) fn relax_step(&mut self, step: f64) {
        let moves: Vec<(usize, (f64, f64))> = self
            .nodes
            .keys()
            .map(|&id| (id, self.weighted_net_tension(id)))
            .collect();
        for (id, (ty, tx)) in moves {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.position.0 += step * ty;
                node.position.1 += step * tx;
            }
        }
    }
}

fn vector_norm(v: (f64, f64)) -> f64 {
    (v.0 * v.0 + v.1 * v.1).sqrt()
}

/// Relax node positions until the largest weighted tension drops below
/// `max_tension_cutoff` or `max_iter` steps have run. Returns the number of
/// steps taken. A disconnected graph simply leaves its nodes in place.
pub fn relax_layout(
    layout: &mut Layout,
    max_tension_cutoff: f64,
    max_iter: usize,
    step: f64,
) -> usize {
    let mut max_tension = layout.max_weighted_tension();
    let mut i = 0;

    while max_tension > max_tension_cutoff && i < max_iter {
        debug!(iteration = i, max_tension, "relax layout");
        layout.relax_step(step);
        max_tension = layout.max_weighted_tension();
        i += 1;
    }

    i
}

/// Relax with the default cutoff, iteration limit and step scalar.
pub fn relax_layout_default(layout: &mut Layout) -> usize {
    relax_layout(
        layout,
        DEFAULT_MAX_TENSION_CUTOFF,
        DEFAULT_MAX_RELAX_ITERATIONS,
        RELAX_STEP,
    )
}

/// Linearly remap all edge weights so the global range becomes
/// [min_allowed, max_allowed]. Isolated nodes are ignored. If every weight is
/// equal they all become `max_allowed`.
pub fn scale_offset_weights_by_population_rank(
    layout: &mut Layout,
    min_allowed: f64,
    max_allowed: f64,
) -> Result<()> {
    if min_allowed >= max_allowed {
        return Err(StitchError::InvalidInput(format!(
            "min allowed weight {min_allowed} must be below max {max_allowed}"
        )));
    }

    let mut min_weight = f64::INFINITY;
    let mut max_weight = f64::NEG_INFINITY;
    for node in layout.nodes.values() {
        for entry in &node.offsets {
            min_weight = min_weight.min(entry.weight);
            max_weight = max_weight.max(entry.weight);
        }
    }

    if !min_weight.is_finite() {
        // No edges at all.
        return Ok(());
    }

    let range = max_weight - min_weight;
    let allowed_range = max_allowed - min_allowed;
    for node in layout.nodes.values_mut() {
        for entry in &mut node.offsets {
            entry.weight = if range == 0.0 {
                max_allowed
            } else {
                (entry.weight - min_weight) / range * allowed_range + min_allowed
            };
        }
    }
    Ok(())
}

/// Reweight each node's springs by how far their residual sits from the
/// node's median residual: larger deviations get lower trust. Only useful
/// when the initial positions are believed accurate.
pub fn scale_offset_weights_by_position(layout: &mut Layout) {
    let mut updates: Vec<(usize, Vec<f64>)> = Vec::with_capacity(layout.len());

    for node in layout.nodes.values() {
        if node.is_isolated() {
            continue;
        }
        let residuals: Vec<f64> = node
            .offsets
            .iter()
            .map(|entry| {
                let other = layout
                    .position(entry.neighbor)
                    .unwrap_or(node.position);
                vector_norm((
                    (other.0 - node.position.0) - entry.offset.0,
                    (other.1 - node.position.1) - entry.offset.1,
                ))
            })
            .collect();

        let mut sorted = residuals.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let median = sorted[sorted.len() / 2];
        let m = median.max(EPSILON);

        let weights = residuals.iter().map(|r| m / (r + m)).collect();
        updates.push((node.id, weights));
    }

    for (id, weights) in updates {
        if let Some(node) = layout.nodes.get_mut(&id) {
            for (entry, weight) in node.offsets.iter_mut().zip(weights) {
                entry.weight = weight;
            }
        }
    }
}

/// One undirected edge of a layout.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeRecord {
    pub a: usize,
    pub b: usize,
    /// Offset from a to b, with a < b.
    pub offset: (f64, f64),
    pub weight: f64,
}

/// All edges, deduplicated (a < b) and sorted by descending weight.
pub fn offsets_sorted_by_weight(layout: &Layout) -> Vec<EdgeRecord> {
    let mut edges = Vec::new();
    for node in layout.nodes.values() {
        for entry in &node.offsets {
            if entry.neighbor > node.id {
                edges.push(EdgeRecord {
                    a: node.id,
                    b: entry.neighbor,
                    offset: entry.offset,
                    weight: entry.weight,
                });
            }
        }
    }
    edges.sort_by(|a, b| b.weight.total_cmp(&a.weight));
    edges
}

/// Greedily seed positions by placing the strongest edges first.
///
/// Edges are consumed in descending weight order, growing a forest of
/// connected components; when an edge joins two components the smaller one is
/// translated into the larger one's frame. Returns the largest component.
pub fn build_layout_with_highest_weights_first(layout: &Layout) -> Layout {
    let mut components: Vec<Layout> = Vec::new();

    for edge in offsets_sorted_by_weight(layout) {
        if edge.weight.is_nan() {
            debug!(a = edge.a, b = edge.b, "skipping edge with NaN weight");
            continue;
        }

        let ia = components.iter().position(|c| c.contains(edge.a));
        let ib = components.iter().position(|c| c.contains(edge.b));

        // The node set is keyed by id, so set_offset/create cannot fail here.
        match (ia, ib) {
            (None, None) => {
                let mut component = Layout::new();
                let _ = component.create_node(edge.a, (0.0, 0.0));
                let _ = component.create_node(edge.b, edge.offset);
                let _ = component.set_offset(edge.a, edge.b, edge.offset, edge.weight);
                components.push(component);
            }
            (Some(i), Some(j)) if i == j => {
                let _ = components[i].set_offset(edge.a, edge.b, edge.offset, edge.weight);
            }
            (Some(i), Some(j)) => {
                merge_components(&mut components, i, j, &edge);
            }
            (Some(i), None) => {
                let _ = components[i].create_offset_node(edge.a, edge.b, edge.offset, edge.weight);
            }
            (None, Some(j)) => {
                let _ = components[j].create_offset_node(
                    edge.b,
                    edge.a,
                    (-edge.offset.0, -edge.offset.1),
                    edge.weight,
                );
            }
        }
    }

    components
        .into_iter()
        .max_by_key(Layout::len)
        .unwrap_or_default()
}

/// Merge the smaller of two components into the larger, translating it so the
/// new edge's constraint is exactly satisfied at the seam.
fn merge_components(components: &mut Vec<Layout>, ia: usize, ib: usize, edge: &EdgeRecord) {
    let (keep, absorb) = if components[ia].len() >= components[ib].len() {
        (ia, ib)
    } else {
        (ib, ia)
    };
    let mut absorbed = components.swap_remove(absorb);
    // swap_remove may have moved the kept component.
    let keep = if keep == components.len() { absorb } else { keep };
    let kept = &mut components[keep];

    let translation = if absorbed.contains(edge.b) {
        let expected = kept.position(edge.a).map(|p| (p.0 + edge.offset.0, p.1 + edge.offset.1));
        let actual = absorbed.position(edge.b);
        match (expected, actual) {
            (Some(e), Some(p)) => (e.0 - p.0, e.1 - p.1),
            _ => (0.0, 0.0),
        }
    } else {
        let expected = kept.position(edge.b).map(|p| (p.0 - edge.offset.0, p.1 - edge.offset.1));
        let actual = absorbed.position(edge.a);
        match (expected, actual) {
            (Some(e), Some(p)) => (e.0 - p.0, e.1 - p.1),
            _ => (0.0, 0.0),
        }
    };

    absorbed.translate(translation);
    kept.merge(absorbed);
    let _ = kept.set_offset(edge.a, edge.b, edge.offset, edge.weight);
}
