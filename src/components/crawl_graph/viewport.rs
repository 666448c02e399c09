//! Pan/zoom affine transform applied to the graph view.
//!
//! The transform is the only state here: drag deltas translate it, wheel
//! gestures scale it about the cursor, and the scale is always clamped to
//! the legal range rather than rejected.

/// Smallest permitted zoom scale.
pub const MIN_SCALE: f64 = 0.1;

/// Largest permitted zoom scale.
pub const MAX_SCALE: f64 = 8.0;

/// Affine map from graph coordinates to screen coordinates:
/// translate by `(x, y)`, then scale by `k`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	/// Zoom factor, invariant-bounded to `MIN_SCALE..=MAX_SCALE`.
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self::identity()
	}
}

impl ViewTransform {
	pub fn identity() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}

	/// Replace the scale, clamping out-of-range requests into the legal range.
	pub fn zoom_to(&mut self, k: f64) {
		self.k = k.clamp(MIN_SCALE, MAX_SCALE);
	}

	/// Scale by `factor` about a screen-space anchor point, keeping the graph
	/// point under the anchor stationary.
	pub fn zoom_at(&mut self, anchor_x: f64, anchor_y: f64, factor: f64) {
		let new_k = (self.k * factor).clamp(MIN_SCALE, MAX_SCALE);
		let ratio = new_k / self.k;
		self.x = anchor_x - (anchor_x - self.x) * ratio;
		self.y = anchor_y - (anchor_y - self.y) * ratio;
		self.k = new_k;
	}

	/// Translate by a screen-space drag delta.
	pub fn pan(&mut self, dx: f64, dy: f64) {
		self.x += dx;
		self.y += dy;
	}

	/// Map a screen point back into graph coordinates.
	pub fn to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		((sx - self.x) / self.k, (sy - self.y) / self.k)
	}
}

/// Tracks an in-progress background pan drag.
#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn out_of_range_scales_are_clamped_not_rejected() {
		let mut t = ViewTransform::identity();
		t.zoom_to(50.0);
		assert_eq!(t.k, 8.0);
		t.zoom_to(0.001);
		assert_eq!(t.k, 0.1);
		t.zoom_to(2.5);
		assert_eq!(t.k, 2.5);
	}

	#[test]
	fn zoom_at_keeps_the_anchor_point_fixed() {
		let mut t = ViewTransform::identity();
		let anchor = (100.0, 80.0);
		let before = t.to_graph(anchor.0, anchor.1);
		t.zoom_at(anchor.0, anchor.1, 2.0);
		let after = t.to_graph(anchor.0, anchor.1);
		assert!((before.0 - after.0).abs() < 1e-9);
		assert!((before.1 - after.1).abs() < 1e-9);
		assert_eq!(t.k, 2.0);
	}

	#[test]
	fn zoom_at_respects_the_clamp() {
		let mut t = ViewTransform::identity();
		for _ in 0..100 {
			t.zoom_at(0.0, 0.0, 1.5);
		}
		assert_eq!(t.k, 8.0);
		for _ in 0..100 {
			t.zoom_at(0.0, 0.0, 0.5);
		}
		assert_eq!(t.k, 0.1);
	}

	#[test]
	fn pan_translates_without_touching_scale() {
		let mut t = ViewTransform::identity();
		t.zoom_to(2.0);
		t.pan(30.0, -10.0);
		assert_eq!((t.x, t.y, t.k), (30.0, -10.0, 2.0));
	}
}
