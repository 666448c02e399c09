//! UI components.

pub mod crawl_graph;
