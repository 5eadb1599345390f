//! Phase orchestrator
//!
//! One instance per mounted view. Owns the virtual clock, the current
//! layout and the phase; everything that only exists while mounted (timers,
//! simulation driver, clusters, token state) lives in a `Mount` that
//! `dispose()` drops, so nothing scheduled before disposal can run after it.
//!
//! Time advances in fixed 60 Hz frames. Each frame first fires every timer
//! that came due, then runs one simulation step against the live anchor.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::phase::{Phase, PhaseMachine};
use super::reveal::{plan_cluster_reveal, stagger_offset, steady_offset};
use super::timers::{Fired, TimerId, TimerQueue};
use super::tokens::{ClusterDag, plan_run};
use crate::config::AnimationConfig;
use crate::consts::{FRAME_MS, MAX_FRAME_MS, MAX_SUBSTEPS};
use crate::error::Result;
use crate::layout::{Breakpoint, ResizeMonitor, ResizeOutcome, Resolution, Side, resolve};
use crate::renderer::{Caption, NodeFrame, Renderer};
use crate::sim::{Cluster, ClusterLayout, DriverState, Node, NodeFactory, SimulationDriver, generate_clusters};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SceneEvent {
    Start,
    Admit,
    Freeze,
    BeginReveal,
    RevealCluster(usize),
    EnterSteady,
    TokenStep,
}

/// State that lives exactly as long as the view is mounted
struct Mount {
    timers: TimerQueue<SceneEvent>,
    driver: SimulationDriver,
    clusters: Vec<Cluster>,
    /// Clusters whose reveal has started
    revealed: usize,
    reveal_starts: Vec<f64>,
    dag: Option<ClusterDag>,
    token_rng: Pcg32,
    token_runs: u64,
    token_busy_until: f64,
    admission: Option<TimerId>,
    start_armed: bool,
    /// Breakpoint whose multipliers the loose-node radii carry
    sized_for: Option<Breakpoint>,
}

pub struct Orchestrator<R: Renderer> {
    config: AnimationConfig,
    renderer: R,
    monitor: ResizeMonitor,
    resolution: Resolution,
    layout_revision: u64,
    phases: PhaseMachine,
    now_ms: f64,
    accumulator_ms: f64,
    mount: Option<Mount>,
}

impl<R: Renderer> Orchestrator<R> {
    /// Validate the configuration, measure the container and mount.
    ///
    /// Fails on configuration errors; nothing is scheduled in that case. A
    /// container without usable area is not an error: the start is armed by
    /// the first valid `resize`.
    pub fn new(config: AnimationConfig, width: f32, height: f32, renderer: R) -> Result<Self> {
        config.validate()?;

        let mut monitor = ResizeMonitor::new();
        let resolution = match monitor.observe(&config.breakpoints, width, height).resolution() {
            Some(resolution) => resolution.clone(),
            None => resolve(&config.breakpoints, width, height),
        };

        let nodes = NodeFactory::new(config.seed).generate_loose_nodes(
            config.node_count,
            config.large_fraction,
            &config.sizing,
            &resolution.profile,
            resolution.anchor(Side::Left),
        )?;
        let driver = SimulationDriver::new(nodes, &config.forces);

        let mount = Mount {
            timers: TimerQueue::new(),
            driver,
            clusters: Vec::new(),
            revealed: 0,
            reveal_starts: Vec::new(),
            dag: None,
            token_rng: Pcg32::seed_from_u64(config.seed.wrapping_add(1)),
            token_runs: 0,
            token_busy_until: f64::NEG_INFINITY,
            admission: None,
            start_armed: false,
            sized_for: (!resolution.is_degenerate()).then_some(resolution.breakpoint),
        };

        log::info!(
            "Mounted {} preset: {} nodes, {} clusters, breakpoint {} ({}x{} canvas)",
            config.preset.as_str(),
            config.node_count,
            config.clusters.num_clusters,
            resolution.breakpoint.as_str(),
            resolution.canvas.width,
            resolution.canvas.height
        );

        let mut orchestrator = Self {
            config,
            renderer,
            monitor,
            resolution,
            layout_revision: 0,
            phases: PhaseMachine::new(),
            now_ms: 0.0,
            accumulator_ms: 0.0,
            mount: Some(mount),
        };
        orchestrator.apply_resolution(true);
        Ok(orchestrator)
    }

    pub fn phase(&self) -> Phase {
        self.phases.phase()
    }

    /// Virtual clock (ms since mount)
    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    /// Incremented every time a new layout is applied
    pub fn layout_revision(&self) -> u64 {
        self.layout_revision
    }

    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    /// Loose nodes currently in the simulation (empty after disposal)
    pub fn nodes(&self) -> &[Node] {
        self.mount.as_ref().map(|m| m.driver.snapshot()).unwrap_or_default()
    }

    pub fn clusters(&self) -> &[Cluster] {
        self.mount.as_ref().map(|m| m.clusters.as_slice()).unwrap_or_default()
    }

    /// Scheduled start time of every cluster reveal so far
    pub fn reveal_starts(&self) -> &[f64] {
        self.mount.as_ref().map(|m| m.reveal_starts.as_slice()).unwrap_or_default()
    }

    pub fn dag(&self) -> Option<&ClusterDag> {
        self.mount.as_ref().and_then(|m| m.dag.as_ref())
    }

    pub fn token_runs(&self) -> u64 {
        self.mount.as_ref().map(|m| m.token_runs).unwrap_or(0)
    }

    pub fn pending_timers(&self) -> usize {
        self.mount.as_ref().map(|m| m.timers.len()).unwrap_or(0)
    }

    pub fn is_disposed(&self) -> bool {
        self.mount.is_none()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn into_renderer(self) -> R {
        self.renderer
    }

    /// Feed wall-clock time. Runs up to `MAX_SUBSTEPS` fixed frames; long
    /// stalls are clamped rather than replayed.
    pub fn advance(&mut self, dt_ms: f64) {
        if self.mount.is_none() {
            return;
        }
        let dt = if dt_ms.is_finite() { dt_ms.clamp(0.0, MAX_FRAME_MS) } else { 0.0 };
        self.accumulator_ms += dt;

        let mut substeps = 0;
        while self.accumulator_ms >= FRAME_MS && substeps < MAX_SUBSTEPS {
            self.step();
            self.accumulator_ms -= FRAME_MS;
            substeps += 1;
        }
    }

    /// Advance by `duration_ms` of virtual time in frame-sized slices
    pub fn run_for(&mut self, duration_ms: f64) {
        let mut remaining = duration_ms;
        while remaining > 0.0 && self.mount.is_some() {
            let dt = remaining.min(FRAME_MS);
            self.advance(dt);
            remaining -= dt;
        }
    }

    /// Container box changed
    pub fn resize(&mut self, width: f32, height: f32) {
        if self.mount.is_none() {
            return;
        }
        let (resolution, breakpoint_changed) = match self.monitor.observe(&self.config.breakpoints, width, height) {
            ResizeOutcome::Unchanged => return,
            ResizeOutcome::Resized(resolution) => (resolution, false),
            ResizeOutcome::BreakpointChanged { resolution, .. } => (resolution, true),
        };
        self.resolution = resolution;
        self.apply_resolution(breakpoint_changed);
    }

    /// Cancel every timer, stop the simulation and release the scene
    pub fn dispose(&mut self) {
        let Some(mount) = self.mount.take() else {
            return;
        };
        log::info!(
            "Disposed at {:.0} ms in phase {} ({} timers cancelled)",
            self.now_ms,
            self.phases.phase().as_str(),
            mount.timers.len()
        );
        drop(mount);
        self.renderer.dispose();
    }

    fn step(&mut self) {
        self.now_ms += FRAME_MS;
        self.fire_due_timers();

        let Some(mount) = self.mount.as_mut() else {
            return;
        };
        if self.phases.phase().is_simulating() && mount.driver.tick(self.resolution.anchor(Side::Left)) {
            self.renderer.draw_nodes(&NodeFrame {
                time_ms: self.now_ms,
                nodes: mount.driver.snapshot(),
                show_lines: self.config.show_lines,
                frozen: false,
            });
        }
    }

    fn fire_due_timers(&mut self) {
        let now = self.now_ms;
        while let Some(fired) = self.mount.as_mut().and_then(|m| m.timers.pop_due(now)) {
            let event = fired.event;
            if let Err(err) = self.handle(fired) {
                log::error!("Timer {:?} failed: {}", event, err);
            }
        }
    }

    fn handle(&mut self, fired: Fired<SceneEvent>) -> Result<()> {
        let Self {
            config,
            renderer,
            resolution,
            phases,
            mount,
            now_ms,
            ..
        } = self;
        let Some(mount) = mount.as_mut() else {
            return Ok(());
        };
        let at = fired.deadline;
        let timing = &config.timing;

        match fired.event {
            SceneEvent::Start => {
                phases.advance(Phase::Growing)?;
                mount.driver.repark(resolution.anchor(Side::Left));
                let interval = timing.admission_interval_ms;
                mount.admission = Some(mount.timers.schedule_interval(at + interval, interval, SceneEvent::Admit));
            }
            SceneEvent::Admit => {
                mount.driver.admit();
                renderer.draw_nodes(&NodeFrame {
                    time_ms: *now_ms,
                    nodes: mount.driver.snapshot(),
                    show_lines: config.show_lines,
                    frozen: false,
                });
                if mount.driver.state() == DriverState::Settling {
                    if let Some(id) = mount.admission.take() {
                        mount.timers.cancel(id);
                    }
                    phases.advance(Phase::Settling)?;
                    mount.timers.schedule(at + timing.settle_ms, SceneEvent::Freeze);
                }
            }
            SceneEvent::Freeze => {
                mount.driver.freeze();
                phases.advance(Phase::Frozen)?;
                renderer.draw_nodes(&NodeFrame {
                    time_ms: *now_ms,
                    nodes: mount.driver.snapshot(),
                    show_lines: config.show_lines,
                    frozen: true,
                });
                show_caption(renderer, config, resolution, Side::Left, at, timing.caption_fade_ms);
                mount.timers.schedule(at + timing.reveal_delay_ms, SceneEvent::BeginReveal);
            }
            SceneEvent::BeginReveal => {
                phases.advance(Phase::Revealing)?;
                let clusters = config.clusters.num_clusters;
                for i in 0..clusters {
                    mount
                        .timers
                        .schedule(at + stagger_offset(i, timing), SceneEvent::RevealCluster(i));
                }
                mount
                    .timers
                    .schedule(at + steady_offset(clusters, timing), SceneEvent::EnterSteady);
            }
            SceneEvent::RevealCluster(i) => {
                mount.reveal_starts.push(at);
                mount.revealed = mount.revealed.max(i + 1);
                match mount.clusters.get(i) {
                    Some(cluster) => renderer.reveal_cluster(&plan_cluster_reveal(cluster, at, timing)),
                    None => log::warn!("Cluster {} has no geometry yet; it will appear on the next layout", i),
                }
            }
            SceneEvent::EnterSteady => {
                phases.advance(Phase::Steady)?;
                show_caption(renderer, config, resolution, Side::Right, at, timing.caption_fade_ms);
                if config.tokens.enabled {
                    let dag = ClusterDag::build(&mount.clusters, config.tokens.out_degree, config.tokens.curve);
                    renderer.draw_dag(&dag);
                    mount.dag = Some(dag);
                    mount
                        .timers
                        .schedule_interval(at, config.tokens.step_ms, SceneEvent::TokenStep);
                }
            }
            SceneEvent::TokenStep => {
                if at < mount.token_busy_until {
                    log::debug!(
                        "Token step at {:.0} ms skipped, previous run ends at {:.0} ms",
                        at,
                        mount.token_busy_until
                    );
                    return Ok(());
                }
                let Some(dag) = mount.dag.as_ref() else {
                    return Ok(());
                };
                if let Some(run) = plan_run(dag, &mut mount.token_rng, mount.token_runs, at, &config.tokens) {
                    log::debug!("Token run {} along {:?}", run.id, run.path);
                    mount.token_busy_until = run.end_ms;
                    mount.token_runs += 1;
                    renderer.run_token(dag, &run);
                }
            }
        }
        Ok(())
    }

    /// Push `self.resolution` to dependents. Cluster geometry is rebuilt only
    /// when the breakpoint changed (or none exists yet).
    fn apply_resolution(&mut self, breakpoint_changed: bool) {
        self.layout_revision += 1;
        self.renderer.resize_canvas(&self.resolution);

        if self.resolution.is_degenerate() {
            log::warn!(
                "Container has no usable area ({}x{} canvas); waiting for the next resize",
                self.resolution.canvas.width,
                self.resolution.canvas.height
            );
            return;
        }

        let Self {
            config,
            renderer,
            resolution,
            phases,
            mount,
            now_ms,
            ..
        } = self;
        let Some(mount) = mount.as_mut() else {
            return;
        };

        if mount.sized_for != Some(resolution.breakpoint) && mount.driver.state() != DriverState::Frozen {
            let resized = NodeFactory::new(config.seed).generate_loose_nodes(
                config.node_count,
                config.large_fraction,
                &config.sizing,
                &resolution.profile,
                resolution.anchor(Side::Left),
            );
            match resized {
                Ok(nodes) => {
                    let radii: Vec<f32> = nodes.iter().map(|n| n.radius).collect();
                    mount.driver.resize_pending(&radii);
                    mount.sized_for = Some(resolution.breakpoint);
                    log::debug!(
                        "Resized {} pending nodes for {}",
                        mount.driver.total() - mount.driver.admitted(),
                        resolution.breakpoint.as_str()
                    );
                }
                Err(err) => log::warn!("Keeping previous node sizes: {}", err),
            }
        }
        mount.driver.repark(resolution.anchor(Side::Left));

        if breakpoint_changed || mount.clusters.is_empty() {
            let layout = ClusterLayout::from_resolution(resolution, &config.clusters);
            match generate_clusters(config.clusters.num_clusters, config.clusters.balls_per_cluster, &layout) {
                Ok(clusters) => {
                    mount.clusters = clusters;
                    renderer.layout_clusters(&mount.clusters, mount.revealed);
                    if mount.dag.is_some() {
                        let dag = ClusterDag::build(&mount.clusters, config.tokens.out_degree, config.tokens.curve);
                        renderer.draw_dag(&dag);
                        mount.dag = Some(dag);
                    }
                }
                Err(err) => log::warn!("Keeping previous clusters: {}", err),
            }
        }

        let phase = phases.phase();
        if phase.left_complete() {
            show_caption(renderer, config, resolution, Side::Left, *now_ms, 0.0);
        }
        if phase.right_complete() {
            show_caption(renderer, config, resolution, Side::Right, *now_ms, 0.0);
        }

        if phase == Phase::Idle && !mount.start_armed {
            mount.start_armed = true;
            mount
                .timers
                .schedule(*now_ms + config.timing.start_delay_ms, SceneEvent::Start);
            log::debug!("Start armed for {:.0} ms", *now_ms + config.timing.start_delay_ms);
        }
    }
}

fn show_caption<R: Renderer>(
    renderer: &mut R,
    config: &AnimationConfig,
    resolution: &Resolution,
    side: Side,
    start_ms: f64,
    fade_ms: f64,
) {
    let text = match side {
        Side::Left => &config.captions.left,
        Side::Right => &config.captions.right,
    };
    renderer.show_caption(&Caption {
        side,
        text,
        placement: resolution.caption(side),
        start_ms,
        fade_ms,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Preset;
    use crate::error::Error;
    use crate::layout::{Breakpoint, LayoutMode};
    use crate::renderer::recording::{RecordingRenderer, RenderEvent};
    use glam::Vec2;
    use proptest::prelude::*;

    fn mount(config: AnimationConfig, w: f32, h: f32) -> Orchestrator<RecordingRenderer> {
        Orchestrator::new(config, w, h, RecordingRenderer::default()).expect("valid config")
    }

    fn positions(o: &Orchestrator<RecordingRenderer>) -> Vec<Vec2> {
        o.nodes().iter().map(|n| n.pos).collect()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = AnimationConfig {
            node_count: 0,
            ..AnimationConfig::default()
        };
        let result = Orchestrator::new(config, 1280.0, 600.0, RecordingRenderer::default());
        assert!(matches!(result, Err(Error::InvalidCount { .. })));
    }

    #[test]
    fn test_xl_run_freezes_sixty_nodes() {
        let mut o = mount(AnimationConfig::default(), 1280.0, 600.0);
        assert_eq!(o.resolution().breakpoint, Breakpoint::Xl);
        assert_eq!(o.resolution().layout.mode, LayoutMode::Dual);
        assert_eq!(o.phase(), Phase::Idle);

        // start 100 + 60 admissions x 10 + settle 6000
        o.run_for(7000.0);
        assert_eq!(o.phase(), Phase::Frozen);
        assert_eq!(o.nodes().len(), 60);
        assert!(o.nodes().iter().all(|n| n.admitted));

        let frozen = positions(&o);
        o.run_for(20_000.0);
        assert_eq!(o.phase(), Phase::Steady);
        assert_eq!(positions(&o), frozen);
        assert_eq!(o.renderer().last_positions, frozen);
    }

    #[test]
    fn test_admissions_are_sequential() {
        let config = AnimationConfig::from_preset(Preset::Component);
        let mut o = mount(config, 1280.0, 600.0);
        o.run_for(100.0 + 500.0 * 3.0 + 20.0);
        assert_eq!(o.phase(), Phase::Growing);
        let ids: Vec<u32> = o.nodes().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_resize_mid_growing_retargets() {
        let config = AnimationConfig {
            node_count: 20,
            ..AnimationConfig::from_preset(Preset::Component)
        };
        let mut o = mount(config, 1280.0, 600.0);
        o.run_for(100.0 + 500.0 * 8.0 + 20.0);
        assert_eq!(o.phase(), Phase::Growing);
        let admitted = o.nodes().len();
        let revision = o.layout_revision();
        let old_anchor = o.resolution().anchor(Side::Left);

        o.resize(900.0, 600.0);
        assert_eq!(o.resolution().breakpoint, Breakpoint::Md);
        assert_eq!(o.layout_revision(), revision + 1);
        assert_eq!(o.nodes().len(), admitted);
        assert_eq!(o.phase(), Phase::Growing);

        let new_anchor = o.resolution().anchor(Side::Left);
        assert!(new_anchor.x < old_anchor.x);

        o.run_for(30_000.0);
        assert_eq!(o.nodes().len(), 20);
        let mean_x = o.nodes().iter().map(|n| n.pos.x).sum::<f32>() / 20.0;
        assert!(
            (mean_x - new_anchor.x).abs() < (mean_x - old_anchor.x).abs(),
            "mass centered at {} (new anchor {}, old {})",
            mean_x,
            new_anchor.x,
            old_anchor.x
        );
    }

    #[test]
    fn test_deferred_mount_sizes_nodes_for_real_breakpoint() {
        let mut direct = mount(AnimationConfig::default(), 1280.0, 600.0);
        let mut deferred = mount(AnimationConfig::default(), 0.0, 0.0);
        deferred.resize(1280.0, 600.0);

        direct.run_for(2000.0);
        deferred.run_for(2000.0);
        let radii = |o: &Orchestrator<RecordingRenderer>| o.nodes().iter().map(|n| n.radius).collect::<Vec<f32>>();
        assert_eq!(radii(&direct).len(), 60);
        assert_eq!(radii(&deferred), radii(&direct));
    }

    #[test]
    fn test_breakpoint_change_resizes_only_waiting_nodes() {
        let config = AnimationConfig::from_preset(Preset::Component);
        let mut o = mount(config.clone(), 1280.0, 600.0);
        o.run_for(100.0 + 500.0 * 2.0 + 20.0);
        let live: Vec<f32> = o.nodes().iter().map(|n| n.radius).collect();
        assert_eq!(live.len(), 2);

        o.resize(400.0, 800.0);
        o.run_for(1000.0);
        let after: Vec<f32> = o.nodes().iter().map(|n| n.radius).collect();
        assert_eq!(&after[..2], live.as_slice());

        // Later admissions carry the xs multipliers
        let mut xs = mount(config, 400.0, 800.0);
        xs.run_for(100.0 + 500.0 * 4.0 + 20.0);
        let expected: Vec<f32> = xs.nodes()[2..after.len()].iter().map(|n| n.radius).collect();
        assert_eq!(&after[2..], expected.as_slice());
    }

    #[test]
    fn test_dispose_while_revealing_cancels_reveals() {
        let mut o = mount(AnimationConfig::default(), 1280.0, 600.0);
        o.run_for(8200.0);
        assert_eq!(o.phase(), Phase::Revealing);
        assert!(o.reveal_starts().len() < 6);

        o.dispose();
        assert_eq!(o.pending_timers(), 0);
        let events = o.renderer().events.len();
        o.run_for(30_000.0);
        assert_eq!(o.renderer().events.len(), events);
        assert_eq!(o.phase(), Phase::Revealing);
    }

    #[test]
    fn test_dispose_in_steady_cancels_token_loop() {
        let mut o = mount(AnimationConfig::default(), 1280.0, 600.0);
        o.run_for(12_000.0);
        assert_eq!(o.phase(), Phase::Steady);
        assert!(o.pending_timers() > 0);
        let tokens = o.renderer().count(|e| matches!(e, RenderEvent::Token { .. }));

        o.dispose();
        assert_eq!(o.pending_timers(), 0);
        o.run_for(60_000.0);
        let r = o.renderer();
        assert_eq!(r.count(|e| matches!(e, RenderEvent::Token { .. })), tokens);
        assert_eq!(r.events.last(), Some(&RenderEvent::Dispose));
    }

    #[test]
    fn test_dispose_mid_growing_stops_everything() {
        let config = AnimationConfig::from_preset(Preset::Component);
        let mut o = mount(config, 1280.0, 600.0);
        o.run_for(2000.0);
        assert_eq!(o.phase(), Phase::Growing);
        assert!(o.pending_timers() > 0);

        o.dispose();
        assert!(o.is_disposed());
        assert_eq!(o.pending_timers(), 0);
        assert!(o.nodes().is_empty());
        let events = o.renderer().events.len();
        assert_eq!(o.renderer().events.last(), Some(&RenderEvent::Dispose));

        let now = o.now_ms();
        o.run_for(60_000.0);
        o.advance(16.0);
        o.resize(400.0, 800.0);
        o.dispose();
        assert_eq!(o.renderer().events.len(), events);
        assert_eq!(o.now_ms(), now);
        assert_eq!(o.phase(), Phase::Growing);
    }

    #[test]
    fn test_reveal_is_staggered_then_steady() {
        let mut o = mount(AnimationConfig::default(), 1280.0, 600.0);
        o.run_for(15_000.0);
        assert_eq!(o.phase(), Phase::Steady);

        let starts = o.reveal_starts();
        assert_eq!(starts.len(), 6);
        let stagger = o.config().timing.reveal_stagger_ms;
        for pair in starts.windows(2) {
            assert!(pair[1] >= pair[0] + stagger - 1e-9);
        }

        let r = o.renderer();
        let reveals: Vec<usize> = r
            .events
            .iter()
            .filter_map(|e| match e {
                RenderEvent::Reveal { cluster, .. } => Some(*cluster),
                _ => None,
            })
            .collect();
        assert_eq!(reveals, vec![0, 1, 2, 3, 4, 5]);

        // Left caption at freeze, right caption at steady, both fading in
        let captions: Vec<(Side, f64)> = r
            .events
            .iter()
            .filter_map(|e| match e {
                RenderEvent::Caption { side, fade_ms, .. } => Some((*side, *fade_ms)),
                _ => None,
            })
            .collect();
        assert_eq!(captions, vec![(Side::Left, 1000.0), (Side::Right, 1000.0)]);
        assert_eq!(r.count(|e| matches!(e, RenderEvent::Dag { edges: 9 })), 1);
        assert!(o.token_runs() >= 1);
    }

    #[test]
    fn test_token_runs_never_overlap() {
        let mut o = mount(AnimationConfig::default(), 1280.0, 600.0);
        o.run_for(60_000.0);
        let runs: Vec<(f64, f64)> = o
            .renderer()
            .events
            .iter()
            .filter_map(|e| match e {
                RenderEvent::Token { start_ms, end_ms, .. } => Some((*start_ms, *end_ms)),
                _ => None,
            })
            .collect();
        assert!(runs.len() >= 5);
        for pair in runs.windows(2) {
            assert!(pair[1].0 >= pair[0].1, "run at {} overlaps run ending {}", pair[1].0, pair[0].1);
        }
    }

    #[test]
    fn test_degenerate_container_defers_start() {
        let mut o = mount(AnimationConfig::default(), 0.0, 0.0);
        assert!(o.resolution().is_degenerate());
        o.run_for(5000.0);
        assert_eq!(o.phase(), Phase::Idle);
        assert_eq!(o.pending_timers(), 0);
        assert!(o.clusters().is_empty());

        o.resize(1280.0, 600.0);
        assert_eq!(o.clusters().len(), 6);
        o.run_for(200.0);
        assert_eq!(o.phase(), Phase::Growing);
        // Parked nodes moved to the real anchor before admission
        let anchor = o.resolution().anchor(Side::Left);
        assert!(o.nodes().iter().all(|n| n.pos.distance(anchor) < 200.0));
    }

    #[test]
    fn test_breakpoint_change_after_reveal_snaps_clusters() {
        let mut o = mount(AnimationConfig::default(), 1280.0, 600.0);
        o.run_for(12_000.0);
        assert_eq!(o.phase(), Phase::Steady);
        let frozen = positions(&o);
        let before = o.clusters()[0].center;
        let events = o.renderer().events.len();

        o.resize(900.0, 600.0);
        let new: Vec<RenderEvent> = o.renderer().events[events..].to_vec();
        assert!(new.contains(&RenderEvent::Clusters { count: 6, revealed: 6 }));
        assert!(new.iter().any(|e| matches!(e, RenderEvent::Dag { .. })));
        let refreshed: Vec<f64> = new
            .iter()
            .filter_map(|e| match e {
                RenderEvent::Caption { fade_ms, .. } => Some(*fade_ms),
                _ => None,
            })
            .collect();
        assert_eq!(refreshed, vec![0.0, 0.0]);
        assert_ne!(o.clusters()[0].center, before);
        assert_eq!(positions(&o), frozen);
        assert!(o.clusters().iter().all(|c| c.contains_balls()));
    }

    #[test]
    fn test_resize_within_breakpoint_keeps_clusters() {
        let mut o = mount(AnimationConfig::default(), 1280.0, 600.0);
        let clusters = o.clusters().to_vec();
        let revision = o.layout_revision();

        o.resize(1280.0, 600.0);
        assert_eq!(o.layout_revision(), revision);

        o.resize(1400.0, 640.0);
        assert_eq!(o.resolution().breakpoint, Breakpoint::Xl);
        assert_eq!(o.layout_revision(), revision + 1);
        assert_eq!(o.clusters(), clusters.as_slice());
        let layouts = o.renderer().count(|e| matches!(e, RenderEvent::Clusters { .. }));
        assert_eq!(layouts, 1);
    }

    #[test]
    fn test_spokes_follow_show_lines() {
        let config = AnimationConfig {
            show_lines: false,
            ..AnimationConfig::default()
        };
        let mut o = mount(config, 1280.0, 600.0);
        o.run_for(1000.0);
        let spokes = o.renderer().count(|e| matches!(e, RenderEvent::Nodes { spokes, .. } if *spokes > 0));
        assert_eq!(spokes, 0);

        let mut o = mount(AnimationConfig::default(), 1280.0, 600.0);
        o.run_for(1000.0);
        assert!(o.renderer().count(|e| matches!(e, RenderEvent::Nodes { spokes, .. } if *spokes > 0)) > 0);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_admissions_bounded(count in 1usize..30, frames in 1usize..120) {
            let config = AnimationConfig { node_count: count, ..AnimationConfig::default() };
            let mut o = mount(config, 1280.0, 600.0);
            let mut last = 0;
            for _ in 0..frames {
                o.advance(FRAME_MS);
                let admitted = o.nodes().len();
                prop_assert!(admitted <= count);
                prop_assert!(admitted >= last);
                last = admitted;
            }
            o.run_for(100.0 + 10.0 * count as f64 + 50.0);
            prop_assert_eq!(o.nodes().len(), count);
        }
    }
}
