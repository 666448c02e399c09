//! crawl-graph: live force-directed visualization of a streaming web crawl.
//!
//! This crate provides a WASM-based graph view that grows as a crawler
//! reports pages over a server-sent event stream, with physics-based layout
//! and pan/zoom.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info};

pub mod components;

pub use components::crawl_graph::{
	CrawlGraphCanvas, CrawlRecord, GraphData, GraphLink, GraphNode, GraphStore,
};

/// Seed preloaded into a fresh session.
const DEFAULT_SEED: &str = "https://www.nvidia.com/en-us/";

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("crawl-graph: logging initialized");
}

/// Main application component.
/// Holds the seed list and renders the crawl visualization; submitting a
/// seed URL starts a new crawl session over the updated seed set.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let (seeds, set_seeds) = signal(vec![DEFAULT_SEED.to_string()]);
	let (draft, set_draft) = signal(String::new());

	let add_seed = move |ev: leptos::ev::SubmitEvent| {
		ev.prevent_default();
		let url = draft.get_untracked().trim().to_string();
		if url.is_empty() {
			return;
		}
		set_seeds.update(|seeds| {
			seeds.retain(|seed| seed != &url);
			seeds.push(url);
		});
		set_draft.set(String::new());
	};

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />
		<Title text="Crawl Graph" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="fullscreen-graph">
			<CrawlGraphCanvas seeds=seeds fullscreen=true />
			<div class="graph-overlay">
				<h1>"Crawl Graph"</h1>
				<p class="subtitle">"Scroll to zoom. Drag the background to pan."</p>
				<form on:submit=add_seed>
					<input
						type="url"
						placeholder="Seed URL"
						prop:value=draft
						on:input=move |ev| set_draft.set(event_target_value(&ev))
					/>
					<button type="submit">"Crawl"</button>
				</form>
			</div>
		</div>
	}
}
