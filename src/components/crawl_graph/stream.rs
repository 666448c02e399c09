//! Crawl event stream: server-sent event connection and payload decoding.
//!
//! The crawler exposes one long-lived unidirectional stream per seed set.
//! Decoding and validation are pure functions; the connection wrapper only
//! forwards typed events to its handler and owns the teardown. There is no
//! retry logic here: a crawl session is one-shot per seed set.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{Event, EventSource, MessageEvent};

use super::types::CrawlRecord;

/// Typed view of one inbound stream frame.
#[derive(Clone, Debug)]
pub enum StreamEvent {
	/// One crawled page report.
	Data(CrawlRecord),
	/// End of crawl; the connection has been released.
	Close,
}

/// Comma-joined seed list as it appears in the query parameter.
pub fn seed_query(seeds: &[String]) -> String {
	seeds.join(",")
}

/// Stream path for a seed set: `/crawl?seeds=a,b`.
pub fn crawl_path(seeds: &[String]) -> String {
	let encoded = js_sys::encode_uri_component(&seed_query(seeds));
	format!("/crawl?seeds={}", String::from(encoded))
}

/// Decode one `data` payload. Malformed frames are dropped with a warning,
/// never surfaced as a failure.
pub fn decode_record(payload: &str) -> Option<CrawlRecord> {
	match serde_json::from_str(payload) {
		Ok(record) => Some(record),
		Err(e) => {
			warn!("crawl-graph: dropping malformed data frame: {e}");
			None
		}
	}
}

/// Owns the `EventSource` connection for one crawl session.
///
/// The server emits named `data` and `close` events. On `close` (or a
/// transport error) the underlying connection is released immediately;
/// the browser would otherwise auto-reconnect, and a crawl is one-shot.
/// Dropping the stream also closes it; `close` is idempotent.
pub struct CrawlStream {
	source: EventSource,
	_on_data: Closure<dyn FnMut(MessageEvent)>,
	_on_close: Closure<dyn FnMut(MessageEvent)>,
	_on_error: Closure<dyn FnMut(Event)>,
}

impl CrawlStream {
	/// Open the stream for a seed set, forwarding each decoded frame to
	/// `on_event`.
	pub fn connect(
		seeds: &[String],
		on_event: impl FnMut(StreamEvent) + 'static,
	) -> Result<Self, JsValue> {
		let source = EventSource::new(&crawl_path(seeds))?;
		let handler = Rc::new(RefCell::new(on_event));

		let data_handler = handler.clone();
		let on_data: Closure<dyn FnMut(MessageEvent)> = Closure::new(move |ev: MessageEvent| {
			let Some(payload) = ev.data().as_string() else {
				warn!("crawl-graph: dropping non-text data frame");
				return;
			};
			if let Some(record) = decode_record(&payload) {
				(&mut *data_handler.borrow_mut())(StreamEvent::Data(record));
			}
		});
		source.add_event_listener_with_callback("data", on_data.as_ref().unchecked_ref())?;

		let close_source = source.clone();
		let close_handler = handler.clone();
		let on_close: Closure<dyn FnMut(MessageEvent)> = Closure::new(move |_: MessageEvent| {
			debug!("crawl-graph: crawl finished, releasing stream");
			close_source.close();
			(&mut *close_handler.borrow_mut())(StreamEvent::Close);
		});
		source.add_event_listener_with_callback("close", on_close.as_ref().unchecked_ref())?;

		let error_source = source.clone();
		let on_error: Closure<dyn FnMut(Event)> = Closure::new(move |_: Event| {
			warn!("crawl-graph: stream transport error, ending ingestion");
			error_source.close();
		});
		source.add_event_listener_with_callback("error", on_error.as_ref().unchecked_ref())?;

		info!("crawl-graph: crawl stream opened for {} seed(s)", seeds.len());
		Ok(Self {
			source,
			_on_data: on_data,
			_on_close: on_close,
			_on_error: on_error,
		})
	}

	/// Release the connection. Safe to call more than once.
	pub fn close(&self) {
		self.source.close();
	}
}

impl Drop for CrawlStream {
	fn drop(&mut self) {
		self.close();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn decodes_a_wire_record() {
		let payload = r#"{
			"id": 7,
			"title": "Example",
			"url": "https://example.com",
			"neighbors": [1, 2],
			"errors": null,
			"responseTime": 120.5
		}"#;
		let record = decode_record(payload).unwrap();
		assert_eq!(record.id, 7);
		assert_eq!(record.title, "Example");
		assert_eq!(record.neighbors, vec![1, 2]);
		assert!(!record.is_failed());
		assert_eq!(record.response_time, 120.5);
	}

	#[test]
	fn error_payloads_mark_the_record_failed() {
		let payload = r#"{
			"id": 7,
			"title": "",
			"url": "https://example.com",
			"neighbors": [],
			"errors": ["timeout"],
			"responseTime": 0
		}"#;
		assert!(decode_record(payload).unwrap().is_failed());
	}

	#[test]
	fn malformed_frames_are_dropped() {
		assert!(decode_record("not json").is_none());
		assert!(decode_record("{\"id\": \"nope\"}").is_none());
		assert!(decode_record("").is_none());
	}

	#[test]
	fn seed_query_joins_with_commas() {
		let seeds = vec!["https://a.com".to_string(), "https://b.com".to_string()];
		assert_eq!(seed_query(&seeds), "https://a.com,https://b.com");
	}
}
