//! Authoritative, deduplicated, append-only graph model.
//!
//! The store is the single writer of graph state. Nodes are created on first
//! mention and never removed within a session; edges are canonicalized to an
//! unordered pair so `(5, 3)` and `(3, 5)` collapse to one stored link.

use std::collections::HashSet;

use super::types::{CrawlRecord, GraphData, GraphLink, GraphNode};

/// Group tag attached to every crawled page; the crawler does not classify
/// pages yet, so display coloring sees a single group.
const DEFAULT_GROUP: &str = "1";

/// Deduplicated, insertion-ordered graph of crawled pages.
#[derive(Debug, Default)]
pub struct GraphStore {
	nodes: Vec<GraphNode>,
	links: Vec<GraphLink>,
	node_ids: HashSet<u64>,
	link_keys: HashSet<(u64, u64)>,
}

impl GraphStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Insert a node if its id is unseen. Duplicate discoveries are a no-op,
	/// so the first-reported title and url win.
	///
	/// Returns whether a new node was created.
	pub fn upsert_node(&mut self, id: u64, title: &str, url: &str, group: &str) -> bool {
		if !self.node_ids.insert(id) {
			return false;
		}
		self.nodes.push(GraphNode {
			id,
			title: title.to_string(),
			url: url.to_string(),
			group: group.to_string(),
		});
		true
	}

	/// Record adjacencies from `id` to each neighbor, canonicalized to
	/// `(min, max)`. Neighbors the store has not seen yet are dropped, never
	/// stored as dangling references, and never retried: crawl ordering does
	/// not guarantee a node arrives before its neighbors mention it, and the
	/// reverse direction eventually reports the same pair.
	///
	/// Returns the number of links appended.
	pub fn link_neighbors(&mut self, id: u64, neighbors: &[u64]) -> usize {
		let mut added = 0;
		for &neighbor in neighbors {
			if !self.node_ids.contains(&neighbor) || !self.node_ids.contains(&id) {
				continue;
			}
			let key = (id.min(neighbor), id.max(neighbor));
			if !self.link_keys.insert(key) {
				continue;
			}
			self.links.push(GraphLink {
				source: key.0,
				target: key.1,
				value: 1.0,
			});
			added += 1;
		}
		added
	}

	/// Merge one crawl record: failed fetches are suppressed entirely,
	/// otherwise the node is upserted and its neighbor edges linked.
	///
	/// Returns whether the graph changed (drives simulation reseeds).
	pub fn apply(&mut self, record: &CrawlRecord) -> bool {
		if record.is_failed() {
			return false;
		}
		let created = self.upsert_node(record.id, &record.title, &record.url, DEFAULT_GROUP);
		let linked = self.link_neighbors(record.id, &record.neighbors);
		created || linked > 0
	}

	/// Borrow the live node and link sequences. O(1): the backing storage is
	/// append-only, so no copy is needed.
	pub fn snapshot(&self) -> (&[GraphNode], &[GraphLink]) {
		(&self.nodes, &self.links)
	}

	pub fn nodes(&self) -> &[GraphNode] {
		&self.nodes
	}

	pub fn links(&self) -> &[GraphLink] {
		&self.links
	}

	/// Owned copy of the snapshot in the external interface shape.
	pub fn to_data(&self) -> GraphData {
		GraphData {
			nodes: self.nodes.clone(),
			links: self.links.clone(),
		}
	}

	/// Reset for a new crawl session (new seed set).
	pub fn clear(&mut self) {
		self.nodes.clear();
		self.links.clear();
		self.node_ids.clear();
		self.link_keys.clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn record(id: u64, title: &str, neighbors: &[u64], errors: Option<Vec<String>>) -> CrawlRecord {
		CrawlRecord {
			id,
			title: title.to_string(),
			url: format!("https://example.com/{id}"),
			neighbors: neighbors.to_vec(),
			errors,
			response_time: 0.0,
		}
	}

	#[test]
	fn upsert_is_idempotent_and_first_write_wins() {
		let mut store = GraphStore::new();
		assert!(store.upsert_node(1, "first", "https://a", "1"));
		assert!(!store.upsert_node(1, "second", "https://b", "1"));
		assert_eq!(store.nodes().len(), 1);
		assert_eq!(store.nodes()[0].title, "first");
		assert_eq!(store.nodes()[0].url, "https://a");
	}

	#[test]
	fn links_canonicalize_in_either_order() {
		let mut store = GraphStore::new();
		store.upsert_node(3, "c", "https://c", "1");
		store.upsert_node(5, "e", "https://e", "1");
		assert_eq!(store.link_neighbors(5, &[3]), 1);
		assert_eq!(store.link_neighbors(3, &[5]), 0);
		assert_eq!(store.links().len(), 1);
		assert_eq!(store.links()[0].source, 3);
		assert_eq!(store.links()[0].target, 5);
	}

	#[test]
	fn unknown_neighbors_are_dropped() {
		let mut store = GraphStore::new();
		store.upsert_node(1, "a", "https://a", "1");
		assert_eq!(store.link_neighbors(1, &[99]), 0);
		assert!(store.links().is_empty());
		// The drop is not revisited when 99 shows up later with no back-link.
		store.upsert_node(99, "z", "https://z", "1");
		assert!(store.links().is_empty());
	}

	#[test]
	fn failed_fetch_creates_nothing() {
		let mut store = GraphStore::new();
		store.apply(&record(1, "a", &[], None));
		let (nodes_before, links_before) = (store.nodes().len(), store.links().len());
		let failed = record(2, "b", &[1], Some(vec!["connection refused".to_string()]));
		assert!(!store.apply(&failed));
		assert_eq!(store.nodes().len(), nodes_before);
		assert_eq!(store.links().len(), links_before);
	}

	#[test]
	fn empty_error_list_is_not_a_failure() {
		let mut store = GraphStore::new();
		assert!(store.apply(&record(1, "a", &[], Some(vec![]))));
		assert_eq!(store.nodes().len(), 1);
	}

	#[test]
	fn two_record_crawl_yields_two_nodes_one_link() {
		let mut store = GraphStore::new();
		assert!(store.apply(&record(1, "A", &[], None)));
		assert!(store.apply(&record(2, "B", &[1], None)));
		let (nodes, links) = store.snapshot();
		assert_eq!(nodes.len(), 2);
		assert_eq!(links.len(), 1);
		assert_eq!((links[0].source, links[0].target), (1, 2));
	}

	#[test]
	fn duplicate_record_does_not_report_change() {
		let mut store = GraphStore::new();
		let r = record(1, "A", &[], None);
		assert!(store.apply(&r));
		assert!(!store.apply(&r));
	}

	#[test]
	fn clear_resets_for_a_new_session() {
		let mut store = GraphStore::new();
		store.apply(&record(1, "A", &[], None));
		store.clear();
		assert!(store.nodes().is_empty());
		assert!(store.links().is_empty());
		// Ids are reusable after a reset.
		assert!(store.upsert_node(1, "A", "https://a", "1"));
	}

	#[test]
	fn snapshot_serializes_to_interface_shape() {
		let mut store = GraphStore::new();
		store.apply(&record(1, "A", &[], None));
		store.apply(&record(2, "B", &[1], None));
		let json = serde_json::to_string(&store.to_data()).unwrap();
		assert!(json.contains("\"nodes\""));
		assert!(json.contains("\"links\""));
		assert!(json.contains("\"source\":1"));
		assert!(json.contains("\"target\":2"));
	}
}
