//! Live crawl graph visualization component.
//!
//! Pipeline: the crawl stream decoder feeds the merge store, the force
//! simulation lays out the store's snapshot, and the renderer composites
//! positions through the viewport transform each animation frame:
//! - Incremental, deduplicated ingestion of crawl events over SSE
//! - Force-directed layout that preserves positions across reseeds
//! - Pan and zoom on a 2D canvas
//!
//! # Example
//!
//! ```ignore
//! use crawl_graph::CrawlGraphCanvas;
//! use leptos::prelude::*;
//!
//! let (seeds, _) = signal(vec!["https://example.com".to_string()]);
//! view! { <CrawlGraphCanvas seeds=seeds fullscreen=true /> }
//! ```

mod component;
mod render;
mod simulation;
mod store;
mod stream;
mod types;
mod viewport;

pub use component::CrawlGraphCanvas;
pub use simulation::{PositionCache, Simulation};
pub use store::GraphStore;
pub use stream::{CrawlStream, StreamEvent, decode_record};
pub use types::{CrawlRecord, GraphData, GraphLink, GraphNode};
pub use viewport::ViewTransform;
