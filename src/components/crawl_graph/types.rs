//! Wire and snapshot data structures for the crawl graph.

use serde::{Deserialize, Serialize};

/// A crawled page, keyed by its crawler-assigned id.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GraphNode {
	/// Unique identifier assigned by the crawler. Used to reference nodes in links.
	pub id: u64,
	/// Page title as reported by the crawler.
	pub title: String,
	/// Page URL.
	pub url: String,
	/// Classification tag, used only for display coloring.
	pub group: String,
}

/// A hyperlink adjacency between two pages.
///
/// Stored canonically with `source < target`, so an edge reported in either
/// direction maps to the same link.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GraphLink {
	/// Smaller endpoint id.
	pub source: u64,
	/// Larger endpoint id.
	pub target: u64,
	/// Display weight, currently uniform.
	pub value: f64,
}

/// Complete graph snapshot: nodes and links in insertion order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GraphData {
	pub nodes: Vec<GraphNode>,
	pub links: Vec<GraphLink>,
}

/// One `data` event payload from the crawl stream.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlRecord {
	pub id: u64,
	pub title: String,
	pub url: String,
	/// Ids of pages this page links to. May reference pages the crawler has
	/// not reported yet.
	pub neighbors: Vec<u64>,
	/// Fetch errors for this page. Non-empty means the fetch failed.
	pub errors: Option<Vec<String>>,
	/// Fetch latency in milliseconds, diagnostic only.
	#[serde(default)]
	pub response_time: f64,
}

impl CrawlRecord {
	/// A failed fetch must not create a node and must not contribute edges.
	pub fn is_failed(&self) -> bool {
		self.errors.as_ref().is_some_and(|e| !e.is_empty())
	}
}
