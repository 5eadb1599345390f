//! Force simulation engine
//!
//! Energy ("alpha") decays toward zero each tick; the engine stops itself
//! once alpha drops below `alpha_min` or when explicitly stopped. Forces are
//! held in named slots and applied in insertion order.

use glam::Vec2;

use super::forces::{Force, ForceContext};
use super::state::Node;
use crate::config::ForceConfig;

#[derive(Debug, Clone)]
pub struct ForceSimulation {
    alpha: f32,
    alpha_min: f32,
    alpha_decay: f32,
    alpha_target: f32,
    velocity_decay: f32,
    forces: Vec<(&'static str, Force)>,
    running: bool,
    ticks: u64,
}

impl ForceSimulation {
    /// A stopped engine with no forces
    pub fn new(config: &ForceConfig) -> Self {
        Self {
            alpha: config.initial_alpha,
            alpha_min: config.alpha_min,
            alpha_decay: config.alpha_decay,
            alpha_target: 0.0,
            velocity_decay: config.velocity_decay,
            forces: Vec::new(),
            running: false,
            ticks: 0,
        }
    }

    /// Attach, replace (keeping its slot) or detach (`None`) a named force
    pub fn set_force(&mut self, name: &'static str, force: Option<Force>) {
        let slot = self.forces.iter().position(|(n, _)| *n == name);
        match (slot, force) {
            (Some(i), Some(force)) => self.forces[i].1 = force,
            (None, Some(force)) => self.forces.push((name, force)),
            (Some(i), None) => {
                self.forces.remove(i);
            }
            (None, None) => {}
        }
    }

    pub fn force(&self, name: &str) -> Option<&Force> {
        self.forces.iter().find(|(n, _)| *n == name).map(|(_, f)| f)
    }

    pub fn force_count(&self) -> usize {
        self.forces.len()
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Reset energy and resume integration
    pub fn restart(&mut self, alpha: f32) {
        self.alpha = alpha;
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Advance one integration step. Returns false if the engine was stopped.
    pub fn tick(&mut self, nodes: &mut [Node], anchor: Vec2) -> bool {
        if !self.running {
            return false;
        }

        self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;
        let ctx = ForceContext {
            alpha: self.alpha,
            anchor,
        };

        let radii: Vec<f32> = nodes.iter().map(|n| n.radius).collect();
        for (_, force) in &self.forces {
            let positions: Vec<Vec2> = nodes.iter().map(|n| n.pos).collect();
            let velocities: Vec<Vec2> = nodes.iter().map(|n| n.vel).collect();
            let deltas = force.contribution(&positions, &velocities, &radii, &ctx);
            for (node, delta) in nodes.iter_mut().zip(deltas) {
                node.vel += delta;
            }
        }

        let keep = 1.0 - self.velocity_decay;
        for node in nodes.iter_mut() {
            node.vel *= keep;
            node.pos += node.vel;
        }

        self.ticks += 1;
        if self.alpha < self.alpha_min {
            log::debug!("Simulation cooled after {} ticks", self.ticks);
            self.running = false;
        }
        true
    }
}
