//! Steady-state token flow
//!
//! Clusters form a small DAG: cluster `i` links forward to the next
//! `out_degree` clusters. Each run walks a random path from cluster 0 to a
//! sink: the token commits at the source, verifies at every intermediate
//! cluster and executes at the sink.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::reveal::Tween;
use crate::config::TokenFlowConfig;
use crate::sim::Cluster;

/// A curved link between two cluster centers (quadratic Bézier)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DagEdge {
    pub from: usize,
    pub to: usize,
    pub start: Vec2,
    pub control: Vec2,
    pub end: Vec2,
}

impl DagEdge {
    /// Point at parameter `t` in `0.0..=1.0`
    pub fn point_at(&self, t: f32) -> Vec2 {
        let t = t.clamp(0.0, 1.0);
        let u = 1.0 - t;
        self.start * (u * u) + self.control * (2.0 * u * t) + self.end * (t * t)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClusterDag {
    edges: Vec<DagEdge>,
    nodes: usize,
}

impl ClusterDag {
    /// Link every cluster to its next `out_degree` neighbours. `curve` bends
    /// each edge sideways by that fraction of its length.
    pub fn build(clusters: &[Cluster], out_degree: usize, curve: f32) -> Self {
        let mut edges = Vec::new();
        for (i, from) in clusters.iter().enumerate() {
            for to in clusters.iter().skip(i + 1).take(out_degree) {
                let (start, end) = (from.center, to.center);
                let d = end - start;
                let normal = Vec2::new(-d.y, d.x);
                edges.push(DagEdge {
                    from: from.id,
                    to: to.id,
                    start,
                    control: (start + end) / 2.0 + normal * curve,
                    end,
                });
            }
        }
        Self {
            edges,
            nodes: clusters.len(),
        }
    }

    pub fn edges(&self) -> &[DagEdge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes
    }

    /// Indices into `edges()` of the links leaving `cluster`
    pub fn outgoing(&self, cluster: usize) -> impl Iterator<Item = usize> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter(move |(_, e)| e.from == cluster)
            .map(|(i, _)| i)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenStage {
    Commit,
    Verify,
    Execute,
}

impl TokenStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenStage::Commit => "commit",
            TokenStage::Verify => "verify",
            TokenStage::Execute => "execute",
        }
    }
}

/// Highlight of one cluster during a run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageMark {
    pub cluster: usize,
    pub stage: TokenStage,
    pub tween: Tween,
}

/// The token crossing one DAG edge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TokenHop {
    /// Index into the DAG's edge list
    pub edge: usize,
    pub tween: Tween,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRun {
    pub id: u64,
    /// Cluster ids visited, source first
    pub path: Vec<usize>,
    pub stages: Vec<StageMark>,
    pub hops: Vec<TokenHop>,
    pub token_radius: f32,
    pub start_ms: f64,
    pub end_ms: f64,
}

/// Plan one run starting at `start_ms`. Returns `None` for an empty graph.
pub fn plan_run(dag: &ClusterDag, rng: &mut Pcg32, id: u64, start_ms: f64, config: &TokenFlowConfig) -> Option<TokenRun> {
    if dag.node_count() == 0 {
        return None;
    }

    let mut path = vec![0usize];
    let mut edges_taken = Vec::new();
    let mut current = 0usize;
    loop {
        let choices: Vec<usize> = dag.outgoing(current).collect();
        if choices.is_empty() {
            break;
        }
        let edge = choices[rng.random_range(0..choices.len())];
        current = dag.edges()[edge].to;
        edges_taken.push(edge);
        path.push(current);
    }

    let mut t = start_ms;
    let mut stages = Vec::with_capacity(path.len());
    let mut hops = Vec::with_capacity(edges_taken.len());
    let last = path.len() - 1;
    for (step, &cluster) in path.iter().enumerate() {
        let stage = if step == 0 && last > 0 {
            TokenStage::Commit
        } else if step == last {
            TokenStage::Execute
        } else {
            TokenStage::Verify
        };
        stages.push(StageMark {
            cluster,
            stage,
            tween: Tween::new(t, config.stage_ms),
        });
        t += config.stage_ms;

        if let Some(&edge) = edges_taken.get(step) {
            hops.push(TokenHop {
                edge,
                tween: Tween::new(t, config.hop_ms),
            });
            t += config.hop_ms;
        }
    }

    Some(TokenRun {
        id,
        path,
        stages,
        hops,
        token_radius: config.token_radius,
        start_ms,
        end_ms: t,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{ClusterLayout, generate_clusters};
    use rand::SeedableRng;

    fn clusters(n: usize) -> Vec<Cluster> {
        let layout = ClusterLayout {
            anchor: Vec2::new(700.0, 300.0),
            orbit_radius: 180.0,
            pack_extent: 90.0,
            ball_radius: 10.0,
            padding: 2.0,
        };
        generate_clusters(n, 4, &layout).expect("valid")
    }

    #[test]
    fn test_dag_out_degree() {
        let dag = ClusterDag::build(&clusters(6), 2, 0.25);
        // 0..=3 have two successors, 4 has one, 5 none
        assert_eq!(dag.edges().len(), 9);
        assert_eq!(dag.outgoing(0).count(), 2);
        assert_eq!(dag.outgoing(4).count(), 1);
        assert_eq!(dag.outgoing(5).count(), 0);
        assert!(dag.edges().iter().all(|e| e.to > e.from && e.to - e.from <= 2));
    }

    #[test]
    fn test_edge_curve_endpoints() {
        let dag = ClusterDag::build(&clusters(3), 2, 0.25);
        let e = dag.edges()[0];
        assert_eq!(e.point_at(0.0), e.start);
        assert!((e.point_at(1.0) - e.end).length() < 1e-3);
        let straight = (e.start + e.end) / 2.0;
        assert!((e.point_at(0.5) - straight).length() > 1.0);
    }

    #[test]
    fn test_run_walks_to_sink() {
        let dag = ClusterDag::build(&clusters(6), 2, 0.25);
        let config = TokenFlowConfig::default();
        let mut rng = Pcg32::seed_from_u64(7);
        for id in 0..20 {
            let run = plan_run(&dag, &mut rng, id, 1000.0, &config).expect("non-empty");
            assert_eq!(run.path[0], 0);
            assert_eq!(*run.path.last().expect("path"), 5);
            assert_eq!(run.hops.len(), run.path.len() - 1);
            assert_eq!(run.stages[0].stage, TokenStage::Commit);
            assert_eq!(run.stages.last().map(|s| s.stage), Some(TokenStage::Execute));
            assert!(run.stages[1..run.stages.len() - 1].iter().all(|s| s.stage == TokenStage::Verify));

            let expected = run.path.len() as f64 * config.stage_ms + run.hops.len() as f64 * config.hop_ms;
            assert!((run.end_ms - run.start_ms - expected).abs() < 1e-9);
            // Hops are back to back with stages
            for pair in run.hops.windows(2) {
                assert!(pair[1].tween.start_ms >= pair[0].tween.end_ms());
            }
        }
    }

    #[test]
    fn test_single_cluster_executes_in_place() {
        let dag = ClusterDag::build(&clusters(1), 2, 0.25);
        let mut rng = Pcg32::seed_from_u64(1);
        let run = plan_run(&dag, &mut rng, 0, 0.0, &TokenFlowConfig::default()).expect("one node");
        assert_eq!(run.path, vec![0]);
        assert!(run.hops.is_empty());
        assert_eq!(run.stages[0].stage, TokenStage::Execute);
        assert!(plan_run(&ClusterDag::default(), &mut rng, 1, 0.0, &TokenFlowConfig::default()).is_none());
    }
}
