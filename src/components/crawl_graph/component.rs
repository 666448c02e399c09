//! Leptos component wiring the crawl stream, simulation, and canvas together.
//!
//! A single `requestAnimationFrame` loop drives simulation ticks and redraws,
//! guarded by a cancellation flag so unmount stops rescheduling. Graph and
//! layout state live in one shared context cell; reseeds replace the
//! simulation inside that cell, which guarantees exactly one simulation is
//! ever writing positions.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::{info, warn};
use send_wrapper::SendWrapper;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::render;
use super::simulation::{PositionCache, Simulation};
use super::store::GraphStore;
use super::stream::{CrawlStream, StreamEvent};
use super::viewport::{PanState, ViewTransform};

/// Zoom factor per wheel notch.
const WHEEL_ZOOM_IN: f64 = 1.1;
const WHEEL_ZOOM_OUT: f64 = 0.9;

/// Graph, layout, and view state shared between the stream handler, the
/// animation loop, and the pointer handlers.
struct GraphContext {
	store: GraphStore,
	sim: Option<Simulation>,
	cache: PositionCache,
	transform: ViewTransform,
	pan: PanState,
	width: f64,
	height: f64,
}

impl GraphContext {
	fn new(width: f64, height: f64) -> Self {
		Self {
			store: GraphStore::new(),
			sim: None,
			cache: PositionCache::new(),
			transform: ViewTransform::identity(),
			pan: PanState::default(),
			width,
			height,
		}
	}

	/// Restart the simulation over the current snapshot. Cached positions
	/// carry over, so already-settled nodes stay put.
	fn reseed(&mut self) {
		if let Some(sim) = self.sim.as_mut() {
			sim.stop();
		}
		let (nodes, links) = self.store.snapshot();
		self.sim = Some(Simulation::seed(
			nodes,
			links,
			&self.cache,
			self.width,
			self.height,
		));
	}

	/// Throw away all graph state for a new seed set. The viewport transform
	/// is the user's and survives.
	fn restart_session(&mut self) {
		if let Some(sim) = self.sim.as_mut() {
			sim.stop();
		}
		self.sim = None;
		self.store.clear();
		self.cache.clear();
	}
}

/// Renders a live crawl as an interactive force-directed graph on a canvas.
///
/// Changing the `seeds` signal starts a new crawl session: the previous
/// stream is torn down and the graph reset. The component sizes itself to
/// its parent container by default; set `fullscreen = true` to fill the
/// viewport and resize (reseeding the layout) with the window.
#[component]
pub fn CrawlGraphCanvas(
	#[prop(into)] seeds: Signal<Vec<String>>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let context: Rc<RefCell<Option<GraphContext>>> = Rc::new(RefCell::new(None));
	let stream: Rc<RefCell<Option<CrawlStream>>> = Rc::new(RefCell::new(None));
	let running: Rc<Cell<bool>> = Rc::new(Cell::new(true));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (context_init, animate_init, resize_cb_init, running_init) = (
		context.clone(),
		animate.clone(),
		resize_cb.clone(),
		running.clone(),
	);

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let window: Window = web_sys::window().unwrap();

		let (w, h) = if fullscreen {
			(
				window.inner_width().unwrap().as_f64().unwrap(),
				window.inner_height().unwrap().as_f64().unwrap(),
			)
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};

		// Back the canvas with device pixels so circles stay crisp on
		// high-density displays; drawing happens in logical units.
		let dpr = window.device_pixel_ratio();
		size_canvas(&canvas, w, h, dpr);

		let ctx: CanvasRenderingContext2d = canvas
			.get_context("2d")
			.unwrap()
			.unwrap()
			.dyn_into()
			.unwrap();
		let _ = ctx.scale(dpr, dpr);

		*context_init.borrow_mut() = Some(GraphContext::new(w, h));

		if fullscreen {
			let (context_resize, canvas_resize, ctx_resize) =
				(context_init.clone(), canvas.clone(), ctx.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let win: Window = web_sys::window().unwrap();
				let (nw, nh) = (
					win.inner_width().unwrap().as_f64().unwrap(),
					win.inner_height().unwrap().as_f64().unwrap(),
				);
				let dpr = win.device_pixel_ratio();
				size_canvas(&canvas_resize, nw, nh, dpr);
				// Resizing the backing store resets the context transform.
				let _ = ctx_resize.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0);
				if let Some(ref mut c) = *context_resize.borrow_mut() {
					c.width = nw;
					c.height = nh;
					c.reseed();
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (context_anim, animate_inner, running_anim) = (
			context_init.clone(),
			animate_init.clone(),
			running_init.clone(),
		);
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if !running_anim.get() {
				return;
			}
			if let Some(ref mut c) = *context_anim.borrow_mut() {
				let GraphContext {
					store,
					sim,
					cache,
					transform,
					width,
					height,
					..
				} = c;
				if let Some(sim) = sim.as_mut() {
					if sim.tick() {
						sim.write_positions(cache);
					}
				}
				let (nodes, links) = store.snapshot();
				render::render(&ctx, nodes, links, cache, transform, *width, *height);
			}
			if let Some(ref cb) = *animate_inner.borrow() {
				let _ = web_sys::window()
					.unwrap()
					.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let (context_stream, stream_cell) = (context.clone(), stream.clone());
	Effect::new(move |_| {
		let seeds = seeds.get();

		// Tear down the previous session before opening the next stream.
		stream_cell.borrow_mut().take();
		if let Some(ref mut c) = *context_stream.borrow_mut() {
			c.restart_session();
		}
		if seeds.is_empty() {
			return;
		}

		let context_events = context_stream.clone();
		let connected = CrawlStream::connect(&seeds, move |event| match event {
			StreamEvent::Data(record) => {
				if let Some(ref mut c) = *context_events.borrow_mut() {
					if c.store.apply(&record) {
						c.reseed();
					}
				}
			}
			StreamEvent::Close => info!("crawl-graph: crawl session complete"),
		});
		match connected {
			Ok(s) => *stream_cell.borrow_mut() = Some(s),
			Err(e) => warn!("crawl-graph: failed to open crawl stream: {e:?}"),
		}
	});

	on_cleanup({
		let (running, stream, context) = (running.clone(), stream.clone(), context.clone());
		let cleanup = SendWrapper::new(move || {
			running.set(false);
			stream.borrow_mut().take();
			if let Some(ref mut c) = *context.borrow_mut() {
				if let Some(sim) = c.sim.as_mut() {
					sim.stop();
				}
			}
		});
		move || cleanup.take()()
	});

	let context_md = context.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let (x, y) = cursor_position(&canvas_ref, &ev);
		if let Some(ref mut c) = *context_md.borrow_mut() {
			c.pan.active = true;
			c.pan.start_x = x;
			c.pan.start_y = y;
			c.pan.transform_start_x = c.transform.x;
			c.pan.transform_start_y = c.transform.y;
		}
	};

	let context_mm = context.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let (x, y) = cursor_position(&canvas_ref, &ev);
		if let Some(ref mut c) = *context_mm.borrow_mut() {
			if c.pan.active {
				c.transform.x = c.pan.transform_start_x + (x - c.pan.start_x);
				c.transform.y = c.pan.transform_start_y + (y - c.pan.start_y);
			}
		}
	};

	let context_mu = context.clone();
	let on_mouseup = move |_: MouseEvent| {
		if let Some(ref mut c) = *context_mu.borrow_mut() {
			c.pan.active = false;
		}
	};

	let context_ml = context.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut c) = *context_ml.borrow_mut() {
			c.pan.active = false;
		}
	};

	let context_wh = context.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let (x, y) = cursor_position(&canvas_ref, &ev);
		if let Some(ref mut c) = *context_wh.borrow_mut() {
			let factor = if ev.delta_y() > 0.0 {
				WHEEL_ZOOM_OUT
			} else {
				WHEEL_ZOOM_IN
			};
			c.transform.zoom_at(x, y, factor);
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="crawl-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}

/// Size the backing store in device pixels and the CSS box in logical ones.
fn size_canvas(canvas: &HtmlCanvasElement, w: f64, h: f64, dpr: f64) {
	canvas.set_width((w * dpr) as u32);
	canvas.set_height((h * dpr) as u32);
	let style = web_sys::HtmlElement::style(&canvas);
	let _ = style.set_property("width", &format!("{w}px"));
	let _ = style.set_property("height", &format!("{h}px"));
}

/// Pointer position in canvas-local logical coordinates.
fn cursor_position(canvas_ref: &NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> (f64, f64) {
	let canvas: HtmlCanvasElement = canvas_ref.get().unwrap().into();
	let rect = canvas.get_bounding_client_rect();
	(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}
