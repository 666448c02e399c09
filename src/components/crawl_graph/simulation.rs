//! Continuous force-directed layout over the current graph snapshot.
//!
//! Four forces per tick: link springs between connected nodes, a hard
//! collision separation at node radius, pairwise inverse-square repulsion,
//! and a centering correction toward the canvas center. The simulation cools
//! via an alpha value that decays each tick; once it reaches the floor the
//! simulation reports itself settled and stops consuming ticks until the
//! next reseed.
//!
//! Reseeding preserves layout: every tick writes positions back into the
//! [`PositionCache`], and seeding reads them out again, so nodes that were
//! already placed resume where they were. Only genuinely new nodes start at
//! the canvas center.

use std::collections::HashMap;
use std::f64::consts::TAU;

use super::types::{GraphLink, GraphNode};

/// Node radius in world units, shared with rendering and collision.
pub const NODE_RADIUS: f64 = 30.0;

/// Base rest length for link springs.
const LINK_DISTANCE: f64 = 60.0;

/// Many-body repulsion strength (negative = repulsive).
const CHARGE_STRENGTH: f64 = -100.0;

/// Repulsion distance floor; closer pairs are treated as this far apart.
const CHARGE_MIN_DISTANCE_SQ: f64 = 1.0;

/// Alpha floor below which the simulation counts as settled.
const ALPHA_MIN: f64 = 0.001;

/// Per-tick alpha decay; cools to the floor in roughly 300 ticks.
const ALPHA_DECAY: f64 = 0.0228;

/// Velocity retained per tick after force integration.
const VELOCITY_DECAY: f64 = 0.6;

/// Squared distance under which two nodes count as coincident.
const COINCIDENT_SQ: f64 = 1e-6;

/// Last known position for every node ever placed, keyed by node id.
///
/// Survives simulation reseeds (new nodes, canvas resizes) so settled nodes
/// do not jump back to center. Written only by the simulation tick; everyone
/// else reads through [`PositionCache::get`].
#[derive(Debug, Default)]
pub struct PositionCache {
	positions: HashMap<u64, (f64, f64)>,
}

impl PositionCache {
	pub fn new() -> Self {
		Self::default()
	}

	/// Last known position of a node, if it has ever been placed.
	pub fn get(&self, id: u64) -> Option<(f64, f64)> {
		self.positions.get(&id).copied()
	}

	pub fn set(&mut self, id: u64, x: f64, y: f64) {
		self.positions.insert(id, (x, y));
	}

	pub fn len(&self) -> usize {
		self.positions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.positions.is_empty()
	}

	/// Forget all placements (new crawl session).
	pub fn clear(&mut self) {
		self.positions.clear();
	}
}

#[derive(Clone, Debug)]
struct SimNode {
	id: u64,
	x: f64,
	y: f64,
	vx: f64,
	vy: f64,
}

/// One force simulation run over a fixed node/edge set.
///
/// Built fresh on every reseed; the surrounding animation loop owns exactly
/// one at a time, replacing it whenever the graph or canvas changes.
pub struct Simulation {
	nodes: Vec<SimNode>,
	links: Vec<(usize, usize)>,
	degree: Vec<usize>,
	alpha: f64,
	width: f64,
	height: f64,
	running: bool,
}

impl Simulation {
	/// Build the working node list from a snapshot, attaching each node's
	/// position from the cache when present and the canvas center otherwise.
	///
	/// Links referencing ids outside the snapshot and self-loops carry no
	/// spring and are left out of the working edge list.
	pub fn seed(
		nodes: &[GraphNode],
		links: &[GraphLink],
		cache: &PositionCache,
		width: f64,
		height: f64,
	) -> Self {
		let index: HashMap<u64, usize> =
			nodes.iter().enumerate().map(|(i, n)| (n.id, i)).collect();

		let sim_nodes = nodes
			.iter()
			.map(|node| {
				let (x, y) = cache.get(node.id).unwrap_or((width / 2.0, height / 2.0));
				SimNode {
					id: node.id,
					x,
					y,
					vx: 0.0,
					vy: 0.0,
				}
			})
			.collect::<Vec<_>>();

		let mut sim_links = Vec::with_capacity(links.len());
		let mut degree = vec![0usize; sim_nodes.len()];
		for link in links {
			if let (Some(&a), Some(&b)) = (index.get(&link.source), index.get(&link.target)) {
				if a != b {
					sim_links.push((a, b));
					degree[a] += 1;
					degree[b] += 1;
				}
			}
		}

		Self {
			nodes: sim_nodes,
			links: sim_links,
			degree,
			alpha: 1.0,
			width,
			height,
			running: true,
		}
	}

	/// Advance the simulation one step.
	///
	/// Returns `false` once cooled below the activity floor or stopped;
	/// callers skip settled simulations until the next reseed.
	pub fn tick(&mut self) -> bool {
		if !self.running || self.nodes.is_empty() {
			return false;
		}
		if self.alpha < ALPHA_MIN {
			self.running = false;
			return false;
		}
		self.alpha += (0.0 - self.alpha) * ALPHA_DECAY;

		self.apply_link_force();
		self.apply_many_body();
		self.apply_collision();

		for node in &mut self.nodes {
			node.vx *= VELOCITY_DECAY;
			node.vy *= VELOCITY_DECAY;
			node.x += node.vx;
			node.y += node.vy;
		}

		self.apply_centering();
		true
	}

	/// Stop consuming ticks. Safe to call repeatedly.
	pub fn stop(&mut self) {
		self.running = false;
	}

	pub fn is_running(&self) -> bool {
		self.running
	}

	/// Write every node's current position into the cache so a later reseed
	/// resumes rather than restarts.
	pub fn write_positions(&self, cache: &mut PositionCache) {
		for node in &self.nodes {
			cache.set(node.id, node.x, node.y);
		}
	}

	/// Spring each link toward a rest length derived from its endpoints'
	/// link counts, so hubs get room. Strength is split between the two
	/// endpoints biased toward the less-connected one.
	fn apply_link_force(&mut self) {
		for li in 0..self.links.len() {
			let (a, b) = self.links[li];
			let (mut dx, mut dy) = {
				let (na, nb) = (&self.nodes[a], &self.nodes[b]);
				(nb.x + nb.vx - na.x - na.vx, nb.y + nb.vy - na.y - na.vy)
			};
			if dx * dx + dy * dy < COINCIDENT_SQ {
				let (jx, jy) = jiggle(a, b);
				dx += jx;
				dy += jy;
			}
			let dist = (dx * dx + dy * dy).sqrt();
			let (da, db) = (self.degree[a].max(1) as f64, self.degree[b].max(1) as f64);
			let rest = LINK_DISTANCE + NODE_RADIUS * da.max(db).sqrt();
			let strength = 1.0 / da.min(db);
			let pull = (dist - rest) / dist * self.alpha * strength;
			let bias = da / (da + db);
			self.nodes[b].vx -= dx * pull * bias;
			self.nodes[b].vy -= dy * pull * bias;
			self.nodes[a].vx += dx * pull * (1.0 - bias);
			self.nodes[a].vy += dy * pull * (1.0 - bias);
		}
	}

	/// Pairwise inverse-square repulsion, O(n²) per tick. Keeps unconnected
	/// clusters from collapsing onto each other.
	fn apply_many_body(&mut self) {
		for i in 0..self.nodes.len() {
			for j in (i + 1)..self.nodes.len() {
				let (mut dx, mut dy) = (
					self.nodes[j].x - self.nodes[i].x,
					self.nodes[j].y - self.nodes[i].y,
				);
				if dx * dx + dy * dy < COINCIDENT_SQ {
					let (jx, jy) = jiggle(i, j);
					dx += jx;
					dy += jy;
				}
				let d2 = (dx * dx + dy * dy).max(CHARGE_MIN_DISTANCE_SQ);
				let w = CHARGE_STRENGTH * self.alpha / d2;
				self.nodes[i].vx += dx * w;
				self.nodes[i].vy += dy * w;
				self.nodes[j].vx -= dx * w;
				self.nodes[j].vy -= dy * w;
			}
		}
	}

	/// Hard minimum separation at node radius: overlapping pairs are pushed
	/// apart positionally, half each, so circles never stack.
	fn apply_collision(&mut self) {
		let min_dist = NODE_RADIUS * 2.0;
		for i in 0..self.nodes.len() {
			for j in (i + 1)..self.nodes.len() {
				let (mut dx, mut dy) = (
					self.nodes[j].x - self.nodes[i].x,
					self.nodes[j].y - self.nodes[i].y,
				);
				if dx * dx + dy * dy < COINCIDENT_SQ {
					let (jx, jy) = jiggle(i, j);
					dx += jx;
					dy += jy;
				}
				let dist = (dx * dx + dy * dy).sqrt();
				if dist >= min_dist {
					continue;
				}
				let push = (min_dist - dist) / dist * 0.5;
				let (px, py) = (dx * push, dy * push);
				self.nodes[i].x -= px;
				self.nodes[i].y -= py;
				self.nodes[j].x += px;
				self.nodes[j].y += py;
			}
		}
	}

	/// Shift all nodes so the centroid sits at the canvas center, preventing
	/// the layout from drifting off-canvas.
	fn apply_centering(&mut self) {
		let n = self.nodes.len() as f64;
		let (mut cx, mut cy) = (0.0, 0.0);
		for node in &self.nodes {
			cx += node.x;
			cy += node.y;
		}
		let (sx, sy) = (cx / n - self.width / 2.0, cy / n - self.height / 2.0);
		for node in &mut self.nodes {
			node.x -= sx;
			node.y -= sy;
		}
	}
}

/// Deterministic golden-angle offset to separate coincident nodes without
/// randomness; every fresh node seeds at the canvas center, so force
/// directions would otherwise be undefined.
fn jiggle(i: usize, j: usize) -> (f64, f64) {
	let angle = ((i as f64) * 0.618_034 + (j as f64) * 0.414_214) * TAU;
	(angle.cos() * 1e-3, angle.sin() * 1e-3)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::crawl_graph::store::GraphStore;

	fn graph(nodes: &[u64], links: &[(u64, u64)]) -> GraphStore {
		let mut store = GraphStore::new();
		for &id in nodes {
			store.upsert_node(id, "page", "https://example.com", "1");
		}
		for &(a, b) in links {
			store.link_neighbors(a, &[b]);
		}
		store
	}

	fn distance(sim: &Simulation, i: usize, j: usize) -> f64 {
		let (dx, dy) = (
			sim.nodes[j].x - sim.nodes[i].x,
			sim.nodes[j].y - sim.nodes[i].y,
		);
		(dx * dx + dy * dy).sqrt()
	}

	#[test]
	fn cached_positions_survive_reseed() {
		let store = graph(&[1, 2], &[(1, 2)]);
		let mut cache = PositionCache::new();
		cache.set(1, 123.0, 45.0);

		let (nodes, links) = store.snapshot();
		let sim = Simulation::seed(nodes, links, &cache, 800.0, 600.0);
		assert_eq!((sim.nodes[0].x, sim.nodes[0].y), (123.0, 45.0));
		// Node 2 was never placed: it starts at the canvas center.
		assert_eq!((sim.nodes[1].x, sim.nodes[1].y), (400.0, 300.0));
	}

	#[test]
	fn ticks_write_back_into_the_cache() {
		let store = graph(&[1, 2], &[(1, 2)]);
		let mut cache = PositionCache::new();
		let (nodes, links) = store.snapshot();
		let mut sim = Simulation::seed(nodes, links, &cache, 800.0, 600.0);
		for _ in 0..10 {
			sim.tick();
			sim.write_positions(&mut cache);
		}
		assert_eq!(cache.len(), 2);
		let (x, y) = cache.get(1).unwrap();
		assert_eq!((x, y), (sim.nodes[0].x, sim.nodes[0].y));
	}

	#[test]
	fn coincident_nodes_separate() {
		let store = graph(&[1, 2, 3], &[]);
		let cache = PositionCache::new();
		let (nodes, links) = store.snapshot();
		let mut sim = Simulation::seed(nodes, links, &cache, 800.0, 600.0);
		for _ in 0..50 {
			sim.tick();
		}
		for i in 0..3 {
			for j in (i + 1)..3 {
				assert!(
					distance(&sim, i, j) > NODE_RADIUS,
					"nodes {i} and {j} still overlap"
				);
			}
		}
	}

	#[test]
	fn linked_nodes_pull_together() {
		let store = graph(&[1, 2], &[(1, 2)]);
		let mut cache = PositionCache::new();
		cache.set(1, 0.0, 300.0);
		cache.set(2, 900.0, 300.0);
		let (nodes, links) = store.snapshot();
		let mut sim = Simulation::seed(nodes, links, &cache, 800.0, 600.0);
		let before = distance(&sim, 0, 1);
		for _ in 0..300 {
			sim.tick();
		}
		let after = distance(&sim, 0, 1);
		assert!(after < before);
		// Collision keeps them at least a diameter apart.
		assert!(after >= NODE_RADIUS * 2.0 - 1.0);
	}

	#[test]
	fn centering_keeps_the_layout_on_canvas() {
		let store = graph(&[1, 2], &[(1, 2)]);
		let mut cache = PositionCache::new();
		cache.set(1, -4000.0, -4000.0);
		cache.set(2, -4100.0, -4000.0);
		let (nodes, links) = store.snapshot();
		let mut sim = Simulation::seed(nodes, links, &cache, 800.0, 600.0);
		sim.tick();
		let (mut cx, mut cy) = (0.0, 0.0);
		for node in &sim.nodes {
			cx += node.x;
			cy += node.y;
		}
		let n = sim.nodes.len() as f64;
		assert!((cx / n - 400.0).abs() < 1.0);
		assert!((cy / n - 300.0).abs() < 1.0);
	}

	#[test]
	fn simulation_settles_and_stays_settled() {
		let store = graph(&[1], &[]);
		let cache = PositionCache::new();
		let (nodes, links) = store.snapshot();
		let mut sim = Simulation::seed(nodes, links, &cache, 800.0, 600.0);
		let mut ticks = 0;
		while sim.tick() {
			ticks += 1;
			assert!(ticks < 1000, "simulation never cooled");
		}
		assert!(!sim.tick());
		assert!(!sim.is_running());
	}

	#[test]
	fn stop_is_idempotent() {
		let store = graph(&[1, 2], &[]);
		let cache = PositionCache::new();
		let (nodes, links) = store.snapshot();
		let mut sim = Simulation::seed(nodes, links, &cache, 800.0, 600.0);
		sim.stop();
		sim.stop();
		assert!(!sim.tick());
	}

	#[test]
	fn empty_snapshot_is_inert() {
		let cache = PositionCache::new();
		let mut sim = Simulation::seed(&[], &[], &cache, 800.0, 600.0);
		assert!(!sim.tick());
	}
}
