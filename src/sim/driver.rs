//! Simulation driver
//!
//! Owns the loose node list and the force engine. Nodes are admitted one at
//! a time; every admission re-energises the engine so settled nodes make
//! room for the newcomer. Freezing stops the engine and detaches every
//! force, after which positions never change.

use glam::Vec2;

use super::engine::ForceSimulation;
use super::forces::Force;
use super::state::Node;
use crate::config::ForceConfig;

/// Force slot names
pub const FORCE_CHARGE: &str = "charge";
pub const FORCE_COLLISION: &str = "collision";
pub const FORCE_PACK: &str = "pack";
pub const FORCE_CENTER: &str = "center";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Nothing admitted yet
    Empty,
    /// Some but not all nodes admitted
    Growing,
    /// Every node admitted, forces still active
    Settling,
    /// Engine stopped, forces detached, positions final
    Frozen,
}

#[derive(Debug, Clone)]
pub struct SimulationDriver {
    /// Full population; the first `admitted` entries are live
    nodes: Vec<Node>,
    admitted: usize,
    engine: ForceSimulation,
    initial_alpha: f32,
    state: DriverState,
}

impl SimulationDriver {
    /// Take ownership of a generated population and attach the growth forces
    pub fn new(nodes: Vec<Node>, config: &ForceConfig) -> Self {
        let mut engine = ForceSimulation::new(config);
        engine.set_force(
            FORCE_CHARGE,
            Some(Force::ManyBody {
                strength: config.charge_strength,
            }),
        );
        engine.set_force(
            FORCE_COLLISION,
            Some(Force::Collide {
                padding: config.collision_padding,
                strength: 1.0,
            }),
        );
        engine.set_force(
            FORCE_PACK,
            Some(Force::PackX {
                strength: config.pack_strength,
            }),
        );
        engine.set_force(
            FORCE_CENTER,
            Some(Force::WeakCenter {
                strength: config.weak_center_strength,
            }),
        );

        Self {
            nodes,
            admitted: 0,
            engine,
            initial_alpha: config.initial_alpha,
            state: DriverState::Empty,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Number of nodes in the live simulation
    pub fn admitted(&self) -> usize {
        self.admitted
    }

    /// Size of the whole population
    pub fn total(&self) -> usize {
        self.nodes.len()
    }

    pub fn engine(&self) -> &ForceSimulation {
        &self.engine
    }

    /// The live nodes, in admission order
    pub fn snapshot(&self) -> &[Node] {
        &self.nodes[..self.admitted]
    }

    /// Append the next node to the live set and restart the engine.
    ///
    /// Returns the admitted node's id, or `None` once everything is admitted
    /// or the driver is frozen.
    pub fn admit(&mut self) -> Option<u32> {
        if self.state == DriverState::Frozen || self.admitted >= self.nodes.len() {
            return None;
        }

        let node = &mut self.nodes[self.admitted];
        node.admitted = true;
        let id = node.id;
        self.admitted += 1;
        self.engine.restart(self.initial_alpha);

        self.state = if self.admitted == self.nodes.len() {
            DriverState::Settling
        } else {
            DriverState::Growing
        };
        log::debug!("Admitted node {} ({}/{})", id, self.admitted, self.nodes.len());
        Some(id)
    }

    /// One integration step toward the live `anchor`.
    ///
    /// Returns true if any node moved. Does nothing before the first
    /// admission or after freezing.
    pub fn tick(&mut self, anchor: Vec2) -> bool {
        match self.state {
            DriverState::Growing | DriverState::Settling => {
                let live = &mut self.nodes[..self.admitted];
                self.engine.tick(live, anchor)
            }
            DriverState::Empty | DriverState::Frozen => false,
        }
    }

    /// Move nodes that have not been admitted yet to a new anchor
    pub fn repark(&mut self, anchor: Vec2) {
        if self.state == DriverState::Frozen {
            return;
        }
        for node in &mut self.nodes[self.admitted..] {
            node.pos = anchor;
            node.vel = Vec2::ZERO;
        }
    }

    /// Replace the radii of nodes that have not been admitted yet. Live and
    /// frozen nodes keep theirs.
    pub fn resize_pending(&mut self, radii: &[f32]) {
        if self.state == DriverState::Frozen {
            return;
        }
        for (node, &radius) in self.nodes.iter_mut().zip(radii).skip(self.admitted) {
            node.radius = radius;
        }
    }

    /// Stop the engine and detach all forces. Positions are final afterward.
    pub fn freeze(&mut self) {
        if self.state == DriverState::Frozen {
            return;
        }
        self.engine.stop();
        for name in [FORCE_CHARGE, FORCE_COLLISION, FORCE_PACK, FORCE_CENTER] {
            self.engine.set_force(name, None);
        }
        for node in &mut self.nodes[..self.admitted] {
            node.vel = Vec2::ZERO;
        }
        self.state = DriverState::Frozen;
        log::info!(
            "Simulation frozen with {} nodes after {} ticks",
            self.admitted,
            self.engine.ticks()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::SizeClass;
    use proptest::prelude::*;

    fn driver(count: u32) -> SimulationDriver {
        let nodes = (0..count)
            .map(|i| {
                let class = if i % 5 == 0 { SizeClass::Large } else { SizeClass::Small };
                Node::new(i, 6.0 + (i % 4) as f32, class, Vec2::new(200.0, 200.0))
            })
            .collect();
        SimulationDriver::new(nodes, &ForceConfig::default())
    }

    #[test]
    fn test_admission_states() {
        let mut d = driver(3);
        assert_eq!(d.state(), DriverState::Empty);
        assert!(!d.tick(Vec2::ZERO));

        assert_eq!(d.admit(), Some(0));
        assert_eq!(d.state(), DriverState::Growing);
        assert_eq!(d.admit(), Some(1));
        assert_eq!(d.admit(), Some(2));
        assert_eq!(d.state(), DriverState::Settling);
        assert_eq!(d.admit(), None);
        assert_eq!(d.snapshot().len(), 3);
        assert!(d.snapshot().iter().all(|n| n.admitted));
    }

    #[test]
    fn test_admission_restarts_engine() {
        let mut d = driver(2);
        d.admit();
        while d.tick(Vec2::new(200.0, 200.0)) {}
        assert!(!d.engine().is_running());

        d.admit();
        assert!(d.engine().is_running());
        assert!((d.engine().alpha() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_freeze_fixes_positions() {
        let mut d = driver(10);
        for _ in 0..10 {
            d.admit();
            for _ in 0..5 {
                d.tick(Vec2::new(200.0, 200.0));
            }
        }
        d.freeze();
        assert_eq!(d.state(), DriverState::Frozen);
        assert_eq!(d.engine().force_count(), 0);
        assert!(!d.engine().is_running());

        let frozen: Vec<Vec2> = d.snapshot().iter().map(|n| n.pos).collect();
        for _ in 0..100 {
            assert!(!d.tick(Vec2::new(900.0, 50.0)));
        }
        assert_eq!(d.admit(), None);
        d.repark(Vec2::ZERO);
        let after: Vec<Vec2> = d.snapshot().iter().map(|n| n.pos).collect();
        assert_eq!(frozen, after);
    }

    #[test]
    fn test_ticks_follow_live_anchor() {
        let mut d = driver(6);
        for _ in 0..6 {
            d.admit();
        }
        let target = Vec2::new(600.0, 200.0);
        for _ in 0..300 {
            d.admit();
            if !d.tick(target) {
                break;
            }
        }
        let mean_x = d.snapshot().iter().map(|n| n.pos.x).sum::<f32>() / 6.0;
        assert!(mean_x > 200.0, "mass did not move toward new anchor: {}", mean_x);
    }

    #[test]
    fn test_repark_moves_only_waiting_nodes() {
        let mut d = driver(4);
        d.admit();
        d.repark(Vec2::new(10.0, 20.0));
        assert_eq!(d.snapshot()[0].pos, Vec2::new(200.0, 200.0));
        d.admit();
        assert_eq!(d.snapshot()[1].pos, Vec2::new(10.0, 20.0));
    }

    #[test]
    fn test_resize_pending_skips_live_nodes() {
        let mut d = driver(3);
        d.admit();
        let live = d.snapshot()[0].radius;
        d.resize_pending(&[40.0, 41.0, 42.0]);
        d.admit();
        d.admit();
        let radii: Vec<f32> = d.snapshot().iter().map(|n| n.radius).collect();
        assert_eq!(radii, vec![live, 41.0, 42.0]);

        d.freeze();
        d.resize_pending(&[1.0, 1.0, 1.0]);
        assert_eq!(d.snapshot()[1].radius, 41.0);
    }

    proptest! {
        #[test]
        fn prop_admitted_never_exceeds_population(count in 1u32..40, admissions in 0usize..80) {
            let mut d = driver(count);
            for k in 1..=admissions {
                d.admit();
                d.tick(Vec2::new(200.0, 200.0));
                prop_assert_eq!(d.admitted(), k.min(count as usize));
            }
            prop_assert!(d.admitted() <= d.total());
        }
    }
}
