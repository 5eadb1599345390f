//! Renderer boundary
//!
//! The orchestrator pushes borrowed, read-only views through `Renderer`;
//! implementations copy whatever they need and never write back into the
//! scene.
//!
//! - `svg`: standalone SVG document with SMIL reveal transitions

pub mod svg;

pub use svg::SvgRenderer;

use glam::Vec2;

use crate::layout::{CaptionPlacement, Resolution, Side};
use crate::scene::{ClusterDag, ClusterReveal, TokenRun};
use crate::sim::{Cluster, Node};

/// Loose-node snapshot for one simulation step
#[derive(Debug, Clone, Copy)]
pub struct NodeFrame<'a> {
    pub time_ms: f64,
    pub nodes: &'a [Node],
    /// Draw a spoke from every node to the first one
    pub show_lines: bool,
    /// Positions are final
    pub frozen: bool,
}

impl NodeFrame<'_> {
    /// Spokes as (hub, node) segments
    pub fn spokes(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        let hub = self.nodes.first().map(|n| n.pos);
        self.nodes
            .iter()
            .skip(1)
            .filter(move |_| self.show_lines)
            .filter_map(move |n| hub.map(|h| (h, n.pos)))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Caption<'a> {
    pub side: Side,
    pub text: &'a str,
    pub placement: CaptionPlacement,
    pub start_ms: f64,
    /// Zero for an immediate re-placement after a resize
    pub fade_ms: f64,
}

pub trait Renderer {
    /// Canvas size and layout changed
    fn resize_canvas(&mut self, resolution: &Resolution);

    /// Loose nodes moved (or froze)
    fn draw_nodes(&mut self, frame: &NodeFrame<'_>);

    /// Static cluster geometry. The first `revealed` clusters are drawn in
    /// their final state, the rest hidden until revealed.
    fn layout_clusters(&mut self, clusters: &[Cluster], revealed: usize);

    fn reveal_cluster(&mut self, reveal: &ClusterReveal);

    fn show_caption(&mut self, caption: &Caption<'_>);

    /// Inter-cluster graph for the steady loop
    fn draw_dag(&mut self, dag: &ClusterDag);

    fn run_token(&mut self, dag: &ClusterDag, run: &TokenRun);

    /// The owning view is going away
    fn dispose(&mut self) {}
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SizeClass;

    #[test]
    fn test_spokes_from_first_node() {
        let nodes: Vec<Node> = (0..4)
            .map(|i| Node::new(i, 3.0, SizeClass::Small, Vec2::new(i as f32, 0.0)))
            .collect();
        let frame = NodeFrame {
            time_ms: 0.0,
            nodes: &nodes,
            show_lines: true,
            frozen: false,
        };
        let spokes: Vec<_> = frame.spokes().collect();
        assert_eq!(spokes.len(), 3);
        assert!(spokes.iter().all(|(hub, _)| *hub == Vec2::ZERO));

        let hidden = NodeFrame {
            show_lines: false,
            ..frame
        };
        assert_eq!(hidden.spokes().count(), 0);
    }
}
