//! Browser host
//!
//! `VizHandle::mount` builds an `<svg>` inside a container element, feeds
//! container resizes into the orchestrator through a `ResizeObserver` and
//! drives the virtual clock from `requestAnimationFrame`. `dispose()` cancels
//! the pending frame, disconnects the observer and removes the SVG; dropping
//! the handle without disposing releases the host the same way.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use glam::Vec2;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, ResizeObserver, ResizeObserverEntry};

use crate::config::AnimationConfig;
use crate::consts::FRAME_MS;
use crate::error::Error;
use crate::layout::{Resolution, Side};
use crate::renderer::svg::{
    DAG_EDGE_OPACITY, DAG_EDGE_WIDTH, FONT_FAMILY, HIGHLIGHT_COLOR, LINE_OPACITY, LINE_WIDTH, STROKE_COLOR,
    STROKE_WIDTH, fmt, quad_path,
};
use crate::renderer::{Caption, NodeFrame, Renderer};
use crate::scene::{ClusterDag, ClusterReveal, EDGE_OPACITY, Orchestrator, TokenRun, Tween};
use crate::sim::Cluster;

const SVG_NS: &str = "http://www.w3.org/2000/svg";

fn to_js(err: Error) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Elements of one laid-out cluster
struct ClusterElements {
    balls: Vec<Element>,
    /// Indexed like `Cluster::edges()`
    edges: Vec<Element>,
    label: Option<Element>,
}

struct CaptionElement {
    text: Element,
    fade: Tween,
}

struct TokenElements {
    run: TokenRun,
    dag: ClusterDag,
    token: Element,
    ring: Element,
}

/// Renderer that edits a live SVG tree. Transitions are interpolated on the
/// orchestrator clock by `animate`.
pub struct DomRenderer {
    document: Document,
    root: Element,
    spokes: Element,
    nodes: Element,
    dag_group: Element,
    cluster_group: Element,
    token_group: Element,
    node_elements: Vec<Element>,
    spoke_elements: Vec<Element>,
    clusters: Vec<ClusterElements>,
    centers: Vec<Vec2>,
    ring_radius: Vec<f32>,
    reveals: Vec<ClusterReveal>,
    captions: [Option<CaptionElement>; 2],
    token: Option<TokenElements>,
}

impl DomRenderer {
    pub fn new(document: &Document, container: &Element) -> Result<Self, JsValue> {
        let root = document.create_element_ns(Some(SVG_NS), "svg")?;
        container.append_child(&root)?;

        let main = document.create_element_ns(Some(SVG_NS), "g")?;
        main.set_attribute("id", "mainAnimationGroup")?;
        let side = document.create_element_ns(Some(SVG_NS), "g")?;
        side.set_attribute("id", "sixClusterGroup")?;
        root.append_child(&main)?;
        root.append_child(&side)?;

        let group = |parent: &Element| -> Result<Element, JsValue> {
            let g = document.create_element_ns(Some(SVG_NS), "g")?;
            parent.append_child(&g)?;
            Ok(g)
        };
        let spokes = group(&main)?;
        let nodes = group(&main)?;
        let dag_group = group(&side)?;
        let cluster_group = group(&side)?;
        let token_group = group(&side)?;

        Ok(Self {
            document: document.clone(),
            root,
            spokes,
            nodes,
            dag_group,
            cluster_group,
            token_group,
            node_elements: Vec::new(),
            spoke_elements: Vec::new(),
            clusters: Vec::new(),
            centers: Vec::new(),
            ring_radius: Vec::new(),
            reveals: Vec::new(),
            captions: [None, None],
            token: None,
        })
    }

    fn create(&self, parent: &Element, tag: &str, attrs: &[(&str, String)]) -> Result<Element, JsValue> {
        let el = self.document.create_element_ns(Some(SVG_NS), tag)?;
        set_attrs(&el, attrs)?;
        parent.append_child(&el)?;
        Ok(el)
    }

    fn report(&self, what: &str, result: Result<(), JsValue>) {
        if let Err(err) = result {
            log::warn!("DOM update ({}) failed: {:?}", what, err);
        }
    }

    /// Apply every in-flight transition at `now_ms`
    pub fn animate(&mut self, now_ms: f64) {
        let result = self.animate_reveals(now_ms);
        self.report("reveal", result);
        let result = self.animate_captions(now_ms);
        self.report("caption", result);
        let result = self.animate_token(now_ms);
        self.report("token", result);
    }

    fn animate_reveals(&mut self, now_ms: f64) -> Result<(), JsValue> {
        for reveal in &self.reveals {
            let Some(elements) = self.clusters.get(reveal.cluster_id) else {
                continue;
            };
            for (ball, el) in reveal.balls.iter().zip(&elements.balls) {
                let t = ball.tween.progress(now_ms);
                set_attrs(
                    el,
                    &[
                        ("r", fmt(ball.target_radius * t)),
                        ("opacity", fmt(ball.target_opacity * t)),
                    ],
                )?;
            }
            for edge in &reveal.edges {
                let Some(el) = elements.edges.get(edge.ball_index - 1) else {
                    continue;
                };
                let t = edge.tween.progress(now_ms);
                let end = edge.origin.lerp(edge.to, t);
                set_attrs(
                    el,
                    &[
                        ("x2", fmt(end.x)),
                        ("y2", fmt(end.y)),
                        ("opacity", fmt(edge.target_opacity * t)),
                    ],
                )?;
            }
            if let (Some(label), Some(el)) = (&reveal.label, &elements.label) {
                el.set_attribute("opacity", &fmt(label.tween.progress(now_ms)))?;
            }
        }
        self.reveals.retain(|r| r.end_ms() > now_ms);
        Ok(())
    }

    fn animate_captions(&mut self, now_ms: f64) -> Result<(), JsValue> {
        for caption in self.captions.iter().flatten() {
            caption
                .text
                .set_attribute("opacity", &fmt(caption.fade.progress(now_ms)))?;
        }
        Ok(())
    }

    fn animate_token(&mut self, now_ms: f64) -> Result<(), JsValue> {
        let Some(token) = &self.token else {
            return Ok(());
        };
        if now_ms >= token.run.end_ms {
            token.token.remove();
            token.ring.remove();
            self.token = None;
            return Ok(());
        }

        let hop = token
            .run
            .hops
            .iter()
            .find(|h| now_ms >= h.tween.start_ms && now_ms < h.tween.end_ms());
        match hop.and_then(|h| token.dag.edges().get(h.edge).map(|e| (h, e))) {
            Some((hop, edge)) => {
                let p = edge.point_at(hop.tween.progress(now_ms));
                set_attrs(
                    &token.token,
                    &[("cx", fmt(p.x)), ("cy", fmt(p.y)), ("opacity", "1".into())],
                )?;
                token.ring.set_attribute("opacity", "0")?;
            }
            None => token.token.set_attribute("opacity", "0")?,
        }

        let mark = token
            .run
            .stages
            .iter()
            .find(|m| now_ms >= m.tween.start_ms && now_ms < m.tween.end_ms());
        if let Some(mark) = mark
            && let Some(center) = self.centers.get(mark.cluster)
        {
            let radius = self.ring_radius.get(mark.cluster).copied().unwrap_or(0.0);
            set_attrs(
                &token.ring,
                &[
                    ("cx", fmt(center.x)),
                    ("cy", fmt(center.y)),
                    ("r", fmt(radius)),
                    ("opacity", fmt(1.0 - mark.tween.progress(now_ms))),
                    ("class", format!("stage-{}", mark.stage.as_str())),
                ],
            )?;
        }
        Ok(())
    }

    fn try_draw_nodes(&mut self, frame: &NodeFrame<'_>) -> Result<(), JsValue> {
        while self.node_elements.len() < frame.nodes.len() {
            let el = self.create(
                &self.nodes,
                "circle",
                &[
                    ("fill", "white".into()),
                    ("stroke", STROKE_COLOR.into()),
                    ("stroke-width", fmt(STROKE_WIDTH)),
                ],
            )?;
            self.node_elements.push(el);
        }
        for (node, el) in frame.nodes.iter().zip(&self.node_elements) {
            set_attrs(
                el,
                &[("cx", fmt(node.pos.x)), ("cy", fmt(node.pos.y)), ("r", fmt(node.radius))],
            )?;
        }

        let spokes: Vec<(Vec2, Vec2)> = frame.spokes().collect();
        while self.spoke_elements.len() < spokes.len() {
            let el = self.create(
                &self.spokes,
                "line",
                &[
                    ("stroke", STROKE_COLOR.into()),
                    ("stroke-width", fmt(LINE_WIDTH)),
                    ("opacity", fmt(LINE_OPACITY)),
                ],
            )?;
            self.spoke_elements.push(el);
        }
        for el in self.spoke_elements.drain(spokes.len()..) {
            el.remove();
        }
        for ((hub, end), el) in spokes.iter().zip(&self.spoke_elements) {
            set_attrs(
                el,
                &[
                    ("x1", fmt(hub.x)),
                    ("y1", fmt(hub.y)),
                    ("x2", fmt(end.x)),
                    ("y2", fmt(end.y)),
                ],
            )?;
        }
        Ok(())
    }

    fn try_layout_clusters(&mut self, clusters: &[Cluster], revealed: usize) -> Result<(), JsValue> {
        self.cluster_group.set_inner_html("");
        self.clusters.clear();
        self.reveals.clear();
        self.centers = clusters.iter().map(|c| c.center).collect();
        self.ring_radius = clusters.iter().map(|c| c.pack_extent / 2.0).collect();

        for (index, cluster) in clusters.iter().enumerate() {
            let shown = index < revealed;
            let group = self.create(&self.cluster_group, "g", &[("id", format!("cluster-{}", cluster.id))])?;

            let mut edges = Vec::new();
            for edge in cluster.edges() {
                let end = if shown { edge.to } else { cluster.center };
                edges.push(self.create(
                    &group,
                    "line",
                    &[
                        ("x1", fmt(edge.from.x)),
                        ("y1", fmt(edge.from.y)),
                        ("x2", fmt(end.x)),
                        ("y2", fmt(end.y)),
                        ("stroke", STROKE_COLOR.into()),
                        ("stroke-width", fmt(LINE_WIDTH)),
                        ("opacity", if shown { fmt(EDGE_OPACITY) } else { "0".into() }),
                    ],
                )?);
            }

            let mut balls = Vec::new();
            for ball in &cluster.balls {
                balls.push(self.create(
                    &group,
                    "circle",
                    &[
                        ("cx", fmt(ball.pos.x)),
                        ("cy", fmt(ball.pos.y)),
                        ("r", if shown { fmt(ball.radius) } else { "0".into() }),
                        ("fill", "white".into()),
                        ("stroke", STROKE_COLOR.into()),
                        ("stroke-width", fmt(STROKE_WIDTH)),
                        ("opacity", if shown { "1".into() } else { "0".into() }),
                    ],
                )?);
            }

            let label = match cluster.representative() {
                Some(rep) => {
                    let text = self.create(
                        &group,
                        "text",
                        &[
                            ("x", fmt(rep.pos.x)),
                            ("y", fmt(rep.pos.y)),
                            ("text-anchor", "middle".into()),
                            ("dominant-baseline", "central".into()),
                            ("fill", STROKE_COLOR.into()),
                            ("font-family", FONT_FAMILY.into()),
                            ("font-size", fmt((rep.radius * 0.9).max(1.0))),
                            ("opacity", if shown { "1".into() } else { "0".into() }),
                        ],
                    )?;
                    text.set_text_content(Some(&cluster.label()));
                    Some(text)
                }
                None => None,
            };

            self.clusters.push(ClusterElements { balls, edges, label });
        }
        Ok(())
    }

    fn try_show_caption(&mut self, caption: &Caption<'_>) -> Result<(), JsValue> {
        let slot = match caption.side {
            Side::Left => 0,
            Side::Right => 1,
        };
        let pos = caption.placement.position;
        let attrs = [
            ("x", fmt(pos.x)),
            ("y", fmt(pos.y)),
            ("font-size", fmt(caption.placement.font_size)),
        ];
        let fade = Tween::new(caption.start_ms, caption.fade_ms);

        if let Some(existing) = &mut self.captions[slot] {
            set_attrs(&existing.text, &attrs)?;
            existing.text.set_text_content(Some(caption.text));
            // A re-placement keeps an unfinished fade running
            if caption.fade_ms > 0.0 {
                existing.fade = fade;
            }
            return Ok(());
        }

        let parent = match caption.side {
            Side::Left => self.nodes.parent_element(),
            Side::Right => self.cluster_group.parent_element(),
        }
        .unwrap_or_else(|| self.root.clone());
        let text = self.create(
            &parent,
            "text",
            &[
                ("text-anchor", "middle".into()),
                ("dominant-baseline", "middle".into()),
                ("fill", STROKE_COLOR.into()),
                ("font-family", FONT_FAMILY.into()),
                ("font-weight", "500".into()),
                ("opacity", if caption.fade_ms > 0.0 { "0".into() } else { "1".into() }),
            ],
        )?;
        set_attrs(&text, &attrs)?;
        text.set_text_content(Some(caption.text));
        self.captions[slot] = Some(CaptionElement { text, fade });
        Ok(())
    }

    fn try_draw_dag(&mut self, dag: &ClusterDag) -> Result<(), JsValue> {
        self.dag_group.set_inner_html("");
        for edge in dag.edges() {
            self.create(
                &self.dag_group,
                "path",
                &[
                    ("d", quad_path(edge.start, edge.control, edge.end)),
                    ("fill", "none".into()),
                    ("stroke", STROKE_COLOR.into()),
                    ("stroke-width", fmt(DAG_EDGE_WIDTH)),
                    ("opacity", fmt(DAG_EDGE_OPACITY)),
                ],
            )?;
        }
        Ok(())
    }

    fn try_run_token(&mut self, dag: &ClusterDag, run: &TokenRun) -> Result<(), JsValue> {
        if let Some(previous) = self.token.take() {
            previous.token.remove();
            previous.ring.remove();
        }
        let ring = self.create(
            &self.token_group,
            "circle",
            &[
                ("fill", "none".into()),
                ("stroke", HIGHLIGHT_COLOR.into()),
                ("stroke-width", "3".into()),
                ("opacity", "0".into()),
            ],
        )?;
        let token = self.create(
            &self.token_group,
            "circle",
            &[
                ("r", fmt(run.token_radius)),
                ("fill", HIGHLIGHT_COLOR.into()),
                ("opacity", "0".into()),
            ],
        )?;
        self.token = Some(TokenElements {
            run: run.clone(),
            dag: dag.clone(),
            token,
            ring,
        });
        Ok(())
    }
}

fn set_attrs(el: &Element, attrs: &[(&str, String)]) -> Result<(), JsValue> {
    for (name, value) in attrs {
        el.set_attribute(name, value)?;
    }
    Ok(())
}

impl Renderer for DomRenderer {
    fn resize_canvas(&mut self, resolution: &Resolution) {
        let (w, h) = (fmt(resolution.canvas.width), fmt(resolution.canvas.height));
        let result = set_attrs(
            &self.root,
            &[
                ("width", w.clone()),
                ("height", h.clone()),
                ("viewBox", format!("0 0 {w} {h}")),
                ("data-breakpoint", resolution.breakpoint.as_str().into()),
            ],
        );
        self.report("resize", result);
    }

    fn draw_nodes(&mut self, frame: &NodeFrame<'_>) {
        let result = self.try_draw_nodes(frame);
        self.report("nodes", result);
    }

    fn layout_clusters(&mut self, clusters: &[Cluster], revealed: usize) {
        let result = self.try_layout_clusters(clusters, revealed);
        self.report("clusters", result);
    }

    fn reveal_cluster(&mut self, reveal: &ClusterReveal) {
        self.reveals.retain(|r| r.cluster_id != reveal.cluster_id);
        self.reveals.push(reveal.clone());
    }

    fn show_caption(&mut self, caption: &Caption<'_>) {
        let result = self.try_show_caption(caption);
        self.report("caption", result);
    }

    fn draw_dag(&mut self, dag: &ClusterDag) {
        let result = self.try_draw_dag(dag);
        self.report("dag", result);
    }

    fn run_token(&mut self, dag: &ClusterDag, run: &TokenRun) {
        let result = self.try_run_token(dag, run);
        self.report("token", result);
    }

    fn dispose(&mut self) {
        self.reveals.clear();
        self.token = None;
        self.root.remove();
    }
}

struct Host {
    orchestrator: Orchestrator<DomRenderer>,
    last_time: f64,
    frame: Option<i32>,
    observer: Option<ResizeObserver>,
    on_resize: Option<Closure<dyn FnMut(js_sys::Array)>>,
}

impl Host {
    /// Cancel the pending frame and stop observing the container
    fn detach(&mut self) {
        if let Some(id) = self.frame.take()
            && let Some(window) = web_sys::window()
        {
            let _ = window.cancel_animation_frame(id);
        }
        if let Some(observer) = self.observer.take() {
            observer.disconnect();
        }
        self.on_resize = None;
    }
}

impl Drop for Host {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Schedule the next frame. The callback only holds a weak reference, so
/// dropping the last `VizHandle` frees the host and ends the loop.
fn request_frame(host: &Rc<RefCell<Host>>) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let weak = Rc::downgrade(host);
    let callback = Closure::once_into_js(move |time: f64| frame(weak, time));
    match window.request_animation_frame(callback.unchecked_ref()) {
        Ok(id) => host.borrow_mut().frame = Some(id),
        Err(err) => log::error!("requestAnimationFrame failed: {:?}", err),
    }
}

fn frame(weak: Weak<RefCell<Host>>, time: f64) {
    let Some(host) = weak.upgrade() else {
        return;
    };
    {
        let mut h = host.borrow_mut();
        h.frame = None;
        if h.orchestrator.is_disposed() {
            return;
        }

        let dt = if h.last_time > 0.0 { time - h.last_time } else { FRAME_MS };
        h.last_time = time;

        h.orchestrator.advance(dt);
        let now = h.orchestrator.now_ms();
        h.orchestrator.renderer_mut().animate(now);
    }

    request_frame(&host);
}

fn observe_container(host: &Rc<RefCell<Host>>, container: &Element) -> Result<(), JsValue> {
    let weak: Weak<RefCell<Host>> = Rc::downgrade(host);
    let on_resize = Closure::<dyn FnMut(js_sys::Array)>::new(move |entries: js_sys::Array| {
        let Some(host) = weak.upgrade() else {
            return;
        };
        let Some(entry) = entries
            .iter()
            .last()
            .and_then(|e| e.dyn_into::<ResizeObserverEntry>().ok())
        else {
            return;
        };
        let rect = entry.content_rect();
        host.borrow_mut()
            .orchestrator
            .resize(rect.width() as f32, rect.height() as f32);
    });

    let observer = ResizeObserver::new(on_resize.as_ref().unchecked_ref())?;
    observer.observe(container);

    let mut h = host.borrow_mut();
    h.observer = Some(observer);
    h.on_resize = Some(on_resize);
    Ok(())
}

/// Handle returned to JavaScript for one mounted view
#[wasm_bindgen]
pub struct VizHandle {
    host: Rc<RefCell<Host>>,
}

#[wasm_bindgen]
impl VizHandle {
    /// Mount into the element with id `container_id`. `config_json` is an
    /// optional serialized `AnimationConfig`; missing fields take defaults.
    pub fn mount(container_id: &str, config_json: Option<String>) -> Result<VizHandle, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window.document().ok_or_else(|| JsValue::from_str("no document"))?;
        let container = document
            .get_element_by_id(container_id)
            .ok_or_else(|| JsValue::from_str(&format!("no element #{container_id}")))?;

        let config = match config_json {
            Some(json) => AnimationConfig::from_json(&json).map_err(to_js)?,
            None => AnimationConfig::default(),
        };

        let rect = container.get_bounding_client_rect();
        let renderer = DomRenderer::new(&document, &container)?;
        let orchestrator =
            Orchestrator::new(config, rect.width() as f32, rect.height() as f32, renderer).map_err(to_js)?;

        let host = Rc::new(RefCell::new(Host {
            orchestrator,
            last_time: 0.0,
            frame: None,
            observer: None,
            on_resize: None,
        }));
        observe_container(&host, &container)?;
        request_frame(&host);

        log::info!("Mounted into #{}", container_id);
        Ok(VizHandle { host })
    }

    /// Stop the animation and remove it from the page
    pub fn dispose(&self) {
        let mut h = self.host.borrow_mut();
        h.detach();
        h.orchestrator.dispose();
    }

    /// Current phase name
    pub fn phase(&self) -> String {
        self.host.borrow().orchestrator.phase().as_str().to_string()
    }
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"logger already initialised".into());
    }
}
