//! SVG document renderer
//!
//! Keeps a copy of the latest scene state and serialises it on demand.
//! Reveal transitions, caption fades and token runs become SMIL animations
//! timed on the orchestrator's clock, so the exported file replays the
//! right-hand side on its own.

use std::fmt::Write as _;

use glam::Vec2;

use super::{Caption, NodeFrame, Renderer};
use crate::layout::{Breakpoint, CanvasSize, CaptionPlacement, Resolution, Side};
use crate::scene::{ClusterDag, ClusterReveal, EDGE_OPACITY, TokenRun, TokenStage, Tween};
use crate::sim::{Cluster, Node};

pub const STROKE_COLOR: &str = "#0A61B5";
pub const HIGHLIGHT_COLOR: &str = "#1a8cff";
pub(crate) const STROKE_WIDTH: f32 = 2.0;
pub(crate) const LINE_WIDTH: f32 = 0.5;
pub(crate) const LINE_OPACITY: f32 = 0.3;
pub(crate) const DAG_EDGE_WIDTH: f32 = 1.5;
pub(crate) const DAG_EDGE_OPACITY: f32 = 0.7;
pub(crate) const FONT_FAMILY: &str = "Outfit, sans-serif";

#[derive(Debug, Clone)]
struct CaptionState {
    text: String,
    placement: CaptionPlacement,
    start_ms: f64,
    fade_ms: f64,
}

#[derive(Debug, Clone, Default)]
pub struct SvgRenderer {
    canvas: CanvasSize,
    breakpoint: Option<Breakpoint>,
    nodes: Vec<Node>,
    show_lines: bool,
    frozen: bool,
    clusters: Vec<Cluster>,
    revealed: usize,
    reveals: Vec<ClusterReveal>,
    captions: [Option<CaptionState>; 2],
    dag: Option<ClusterDag>,
    token: Option<TokenRun>,
    frames: u64,
}

/// Number formatting for attributes: at most two decimals, no `-0`
pub(crate) fn fmt(v: f32) -> String {
    if !v.is_finite() {
        return "0".to_string();
    }
    let mut v = (v as f64 * 100.0).round() / 100.0;
    if v == 0.0 {
        v = 0.0;
    }
    format!("{v}")
}

fn fmt_ms(ms: f64) -> String {
    format!("{}ms", ms.max(0.0).round())
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// `<animate>` from `from` to `to` over `tween`, holding the final value
fn animate(out: &mut String, attribute: &str, from: f32, to: f32, tween: &Tween) {
    let _ = write!(
        out,
        r#"<animate attributeName="{attribute}" from="{}" to="{}" begin="{}" dur="{}" fill="freeze"/>"#,
        fmt(from),
        fmt(to),
        fmt_ms(tween.start_ms),
        fmt_ms(tween.duration_ms.max(1.0)),
    );
}

pub(crate) fn quad_path(start: Vec2, control: Vec2, end: Vec2) -> String {
    format!(
        "M{},{} Q{},{} {},{}",
        fmt(start.x),
        fmt(start.y),
        fmt(control.x),
        fmt(control.y),
        fmt(end.x),
        fmt(end.y)
    )
}

impl SvgRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of node frames received
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn breakpoint(&self) -> Option<Breakpoint> {
        self.breakpoint
    }

    /// Serialise the current scene
    pub fn document(&self) -> String {
        let (w, h) = (fmt(self.canvas.width), fmt(self.canvas.height));
        let mut out = String::new();
        let _ = write!(
            &mut out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" data-breakpoint="{}">"#,
            self.breakpoint.map(|b| b.as_str()).unwrap_or("none"),
        );

        out.push_str(r#"<g id="mainAnimationGroup">"#);
        self.write_loose_nodes(&mut out);
        self.write_caption(&mut out, Side::Left);
        out.push_str("</g>");

        out.push_str(r#"<g id="sixClusterGroup">"#);
        self.write_dag(&mut out);
        for (index, cluster) in self.clusters.iter().enumerate() {
            self.write_cluster(&mut out, index, cluster);
        }
        self.write_token(&mut out);
        self.write_caption(&mut out, Side::Right);
        out.push_str("</g>");

        out.push_str("</svg>");
        out
    }

    fn write_loose_nodes(&self, out: &mut String) {
        if self.show_lines
            && let Some(hub) = self.nodes.first()
        {
            for node in &self.nodes[1..] {
                let _ = write!(
                    out,
                    r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{STROKE_COLOR}" stroke-width="{}" opacity="{}"/>"#,
                    fmt(hub.pos.x),
                    fmt(hub.pos.y),
                    fmt(node.pos.x),
                    fmt(node.pos.y),
                    fmt(LINE_WIDTH),
                    fmt(LINE_OPACITY),
                );
            }
        }
        for node in &self.nodes {
            let _ = write!(
                out,
                r#"<circle class="node{}" cx="{}" cy="{}" r="{}" fill="white" stroke="{STROKE_COLOR}" stroke-width="{}"/>"#,
                if node.is_large() { " large" } else { "" },
                fmt(node.pos.x),
                fmt(node.pos.y),
                fmt(node.radius),
                fmt(STROKE_WIDTH),
            );
        }
    }

    fn write_caption(&self, out: &mut String, side: Side) {
        let slot = match side {
            Side::Left => 0,
            Side::Right => 1,
        };
        let Some(caption) = &self.captions[slot] else {
            return;
        };
        let pos = caption.placement.position;
        let _ = write!(
            out,
            r#"<text x="{}" y="{}" text-anchor="middle" dominant-baseline="middle" fill="{STROKE_COLOR}" font-family="{FONT_FAMILY}" font-size="{}" font-weight="500" opacity="{}">"#,
            fmt(pos.x),
            fmt(pos.y),
            fmt(caption.placement.font_size),
            if caption.fade_ms > 0.0 { "0" } else { "1" },
        );
        if caption.fade_ms > 0.0 {
            animate(out, "opacity", 0.0, 1.0, &Tween::new(caption.start_ms, caption.fade_ms));
        }
        out.push_str(&escape_xml(&caption.text));
        out.push_str("</text>");
    }

    fn write_cluster(&self, out: &mut String, index: usize, cluster: &Cluster) {
        let reveal = self.reveals.iter().find(|r| r.cluster_id == cluster.id);
        let shown = reveal.is_none() && index < self.revealed;
        let _ = write!(out, r#"<g id="cluster-{}">"#, cluster.id);

        for edge in cluster.edges() {
            let planned = reveal.and_then(|r| r.edges.iter().find(|e| e.ball_index == edge.ball_index));
            let end = if shown { edge.to } else { cluster.center };
            let _ = write!(
                out,
                r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{STROKE_COLOR}" stroke-width="{}" opacity="{}">"#,
                fmt(edge.from.x),
                fmt(edge.from.y),
                fmt(end.x),
                fmt(end.y),
                fmt(LINE_WIDTH),
                if shown { fmt(EDGE_OPACITY) } else { "0".to_string() },
            );
            if let Some(e) = planned {
                animate(out, "x2", e.origin.x, e.to.x, &e.tween);
                animate(out, "y2", e.origin.y, e.to.y, &e.tween);
                animate(out, "opacity", 0.0, e.target_opacity, &e.tween);
            }
            out.push_str("</line>");
        }

        for ball in &cluster.balls {
            let planned = reveal.and_then(|r| r.balls.iter().find(|b| b.ball_id == ball.id));
            let _ = write!(
                out,
                r#"<circle class="cluster-ball" cx="{}" cy="{}" r="{}" fill="white" stroke="{STROKE_COLOR}" stroke-width="{}" opacity="{}">"#,
                fmt(ball.pos.x),
                fmt(ball.pos.y),
                if shown { fmt(ball.radius) } else { "0".to_string() },
                fmt(STROKE_WIDTH),
                if shown { "1" } else { "0" },
            );
            if let Some(b) = planned {
                animate(out, "r", 0.0, b.target_radius, &b.tween);
                animate(out, "opacity", 0.0, b.target_opacity, &b.tween);
            }
            out.push_str("</circle>");
        }

        if let Some(rep) = cluster.representative() {
            let _ = write!(
                out,
                r#"<text x="{}" y="{}" text-anchor="middle" dominant-baseline="central" fill="{STROKE_COLOR}" font-family="{FONT_FAMILY}" font-size="{}" opacity="{}">"#,
                fmt(rep.pos.x),
                fmt(rep.pos.y),
                fmt((rep.radius * 0.9).max(1.0)),
                if shown { "1" } else { "0" },
            );
            if let Some(label) = reveal.and_then(|r| r.label.as_ref()) {
                animate(out, "opacity", 0.0, 1.0, &label.tween);
            }
            out.push_str(&escape_xml(&cluster.label()));
            out.push_str("</text>");
        }

        out.push_str("</g>");
    }

    fn write_dag(&self, out: &mut String) {
        let Some(dag) = &self.dag else {
            return;
        };
        out.push_str(r#"<g class="dag">"#);
        for edge in dag.edges() {
            let _ = write!(
                out,
                r#"<path d="{}" fill="none" stroke="{STROKE_COLOR}" stroke-width="{}" opacity="{}"/>"#,
                quad_path(edge.start, edge.control, edge.end),
                fmt(DAG_EDGE_WIDTH),
                fmt(DAG_EDGE_OPACITY),
            );
        }
        out.push_str("</g>");
    }

    fn write_token(&self, out: &mut String) {
        let (Some(dag), Some(run)) = (&self.dag, &self.token) else {
            return;
        };
        let _ = write!(out, r#"<g class="token-run" data-run="{}">"#, run.id);

        for mark in &run.stages {
            let Some(cluster) = self.clusters.iter().find(|c| c.id == mark.cluster) else {
                continue;
            };
            let ring = cluster.pack_extent / 2.0;
            let _ = write!(
                out,
                r#"<circle class="stage-{}" cx="{}" cy="{}" r="{}" fill="none" stroke="{HIGHLIGHT_COLOR}" stroke-width="3" opacity="0">"#,
                mark.stage.as_str(),
                fmt(cluster.center.x),
                fmt(cluster.center.y),
                fmt(ring),
            );
            let peak = if mark.stage == TokenStage::Execute { 1.0 } else { 0.8 };
            animate(out, "opacity", peak, 0.0, &mark.tween);
            out.push_str("</circle>");
        }

        for hop in &run.hops {
            let Some(edge) = dag.edges().get(hop.edge) else {
                continue;
            };
            let _ = write!(
                out,
                r#"<circle r="{}" fill="{HIGHLIGHT_COLOR}" opacity="0">"#,
                fmt(run.token_radius)
            );
            let _ = write!(
                out,
                r#"<set attributeName="opacity" to="1" begin="{}" dur="{}"/>"#,
                fmt_ms(hop.tween.start_ms),
                fmt_ms(hop.tween.duration_ms.max(1.0)),
            );
            let _ = write!(
                out,
                r#"<animateMotion path="{}" begin="{}" dur="{}" fill="freeze"/>"#,
                quad_path(edge.start, edge.control, edge.end),
                fmt_ms(hop.tween.start_ms),
                fmt_ms(hop.tween.duration_ms.max(1.0)),
            );
            out.push_str("</circle>");
        }

        out.push_str("</g>");
    }
}

impl Renderer for SvgRenderer {
    fn resize_canvas(&mut self, resolution: &Resolution) {
        self.canvas = resolution.canvas;
        self.breakpoint = Some(resolution.breakpoint);
    }

    fn draw_nodes(&mut self, frame: &NodeFrame<'_>) {
        self.nodes.clear();
        self.nodes.extend_from_slice(frame.nodes);
        self.show_lines = frame.show_lines;
        self.frozen = frame.frozen;
        self.frames += 1;
    }

    fn layout_clusters(&mut self, clusters: &[Cluster], revealed: usize) {
        self.clusters = clusters.to_vec();
        self.revealed = revealed;
        self.reveals.clear();
    }

    fn reveal_cluster(&mut self, reveal: &ClusterReveal) {
        self.reveals.retain(|r| r.cluster_id != reveal.cluster_id);
        self.reveals.push(reveal.clone());
    }

    fn show_caption(&mut self, caption: &Caption<'_>) {
        let slot = match caption.side {
            Side::Left => 0,
            Side::Right => 1,
        };
        self.captions[slot] = Some(CaptionState {
            text: caption.text.to_string(),
            placement: caption.placement,
            start_ms: caption.start_ms,
            fade_ms: caption.fade_ms,
        });
    }

    fn draw_dag(&mut self, dag: &ClusterDag) {
        self.dag = Some(dag.clone());
    }

    fn run_token(&mut self, dag: &ClusterDag, run: &TokenRun) {
        if self.dag.as_ref() != Some(dag) {
            self.dag = Some(dag.clone());
        }
        self.token = Some(run.clone());
    }

    fn dispose(&mut self) {
        log::debug!("SVG renderer disposed after {} frames", self.frames);
    }
}
