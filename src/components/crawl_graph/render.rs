//! Canvas compositing for the crawl graph.
//!
//! One pass per frame: clear, apply the viewport transform, stroke edges,
//! then fill node circles with their id label centered inside. Strictly
//! read-only over nodes, links, positions, and transform, so it is safe to
//! call from both the simulation tick and the viewport-change path.

use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::simulation::{NODE_RADIUS, PositionCache};
use super::types::{GraphLink, GraphNode};
use super::viewport::ViewTransform;

const EDGE_COLOR: &str = "#94a3b8";
const EDGE_WIDTH: f64 = 2.0;
const EDGE_ALPHA: f64 = 0.6;
const NODE_BORDER_COLOR: &str = "#eee";
const NODE_BORDER_WIDTH: f64 = 3.0;
const LABEL_FONT: &str = "bold 10px sans-serif";
const GROUP_PALETTE: [&str; 3] = ["#3b82f6", "#10b981", "#f59e0b"];

/// Draw one frame: the current snapshot through the viewport transform.
///
/// Nodes and edge endpoints without a cached position have not been placed
/// by the simulation yet; they are skipped for this frame, never an error.
pub fn render(
	ctx: &CanvasRenderingContext2d,
	nodes: &[GraphNode],
	links: &[GraphLink],
	positions: &PositionCache,
	transform: &ViewTransform,
	width: f64,
	height: f64,
) {
	ctx.save();
	ctx.clear_rect(0.0, 0.0, width, height);
	let _ = ctx.translate(transform.x, transform.y);
	let _ = ctx.scale(transform.k, transform.k);

	draw_links(ctx, links, positions);
	draw_nodes(ctx, nodes, positions);

	ctx.restore();
}

fn draw_links(ctx: &CanvasRenderingContext2d, links: &[GraphLink], positions: &PositionCache) {
	ctx.set_stroke_style_str(EDGE_COLOR);
	ctx.set_line_width(EDGE_WIDTH);
	ctx.set_global_alpha(EDGE_ALPHA);

	for link in links {
		let (Some((x1, y1)), Some((x2, y2))) =
			(positions.get(link.source), positions.get(link.target))
		else {
			continue;
		};
		ctx.begin_path();
		ctx.move_to(x1, y1);
		ctx.line_to(x2, y2);
		ctx.stroke();
	}

	ctx.set_global_alpha(1.0);
}

fn draw_nodes(ctx: &CanvasRenderingContext2d, nodes: &[GraphNode], positions: &PositionCache) {
	ctx.set_shadow_color("rgba(0, 0, 0, 0.1)");
	ctx.set_shadow_blur(6.0);
	ctx.set_shadow_offset_y(4.0);
	ctx.set_font(LABEL_FONT);
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");

	for node in nodes {
		let Some((x, y)) = positions.get(node.id) else {
			continue;
		};

		ctx.begin_path();
		ctx.set_fill_style_str(group_color(&node.group));
		let _ = ctx.arc(x, y, NODE_RADIUS, 0.0, 2.0 * PI);
		ctx.fill();

		ctx.set_stroke_style_str(NODE_BORDER_COLOR);
		ctx.set_line_width(NODE_BORDER_WIDTH);
		ctx.stroke();

		ctx.set_fill_style_str("#fff");
		let _ = ctx.fill_text(&node.id.to_string(), x, y);
	}
}

/// Stable palette assignment for a group tag.
fn group_color(group: &str) -> &'static str {
	let hash: usize = group.bytes().map(usize::from).sum();
	GROUP_PALETTE[hash % GROUP_PALETTE.len()]
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn group_colors_are_stable_and_in_palette() {
		assert_eq!(group_color("1"), group_color("1"));
		for group in ["1", "2", "news", ""] {
			assert!(GROUP_PALETTE.contains(&group_color(group)));
		}
	}
}
