//! Exact route optimisation, expressed as a selection of arcs.
//!
//! Each candidate arc gets a binary selection variable. The objective is to
//! minimise the total length of the selected arcs, subject to flow
//! conservation: one unit of flow leaves the origin, one unit arrives at the
//! destination, and every other node passes on whatever it receives.
//!
//! The constraint matrix of this model is the node-arc incidence matrix of
//! the candidate graph, which is totally unimodular, so the linear relaxation
//! always has an integral optimum. The solver works on that relaxation
//! directly: a label-correcting pass computes the dual node potentials, the
//! primal selection is read off the tight arcs, and the pair is returned as
//! a certificate that can be checked independently of how it was found.

use petgraph::Direction;
use petgraph::visit::{Bfs, EdgeRef, Reversed};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::common::error::{RoutingError, RoutingResult};
use crate::common::graph_data::EdgeData;
use crate::loading::petgraph::GraphStore;

/// Absolute tolerance used when checking optimality conditions, in metres
const TOLERANCE_M: f64 = 1e-6;

/// How often (in arc relaxations) the deadline is checked
const DEADLINE_CHECK_INTERVAL: usize = 1024;

/// Sets which arcs are offered to the solver for each leg
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateScope {
    /// Every arc which lies on some walk from the origin to the destination
    /// in the full road network
    Reachable,
    /// Only the arcs used by the greedy shortest path for the leg
    Stitched,
}

impl FromStr for CandidateScope {
    type Err = String;

    fn from_str(input: &str) -> Result<CandidateScope, Self::Err> {
        match input {
            "reachable" => Ok(CandidateScope::Reachable),
            "stitched" => Ok(CandidateScope::Stitched),
            other => Err(format!(
                "expected 'reachable' or 'stitched', got {other:?}"
            )),
        }
    }
}

/// Settings shared by every solve within a single request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverSettings {
    pub timeout: Duration,
    pub scope: CandidateScope,
}

/// Wall-clock budget for a request. Started once, and shared by every solve
/// made on behalf of the request
#[derive(Debug, Clone, Copy)]
pub struct SolveBudget {
    started: Instant,
    timeout: Duration,
}

impl SolveBudget {
    pub fn start(timeout: Duration) -> SolveBudget {
        SolveBudget {
            started: Instant::now(),
            timeout,
        }
    }

    /// Fails once the timeout has been used up. A zero timeout is always
    /// exhausted
    pub fn check(&self) -> RoutingResult<()> {
        if self.started.elapsed() >= self.timeout {
            Err(RoutingError::SolverTimeout(self.timeout))
        } else {
            Ok(())
        }
    }
}

/// The solution to a single origin/destination problem. Holds every
/// candidate arc alongside its selection decision, plus the dual potential
/// of each node which could be reached from the origin
#[derive(Debug, Clone)]
pub struct ArcSelection {
    pub origin: i64,
    pub destination: i64,
    pub arcs: Vec<EdgeData>,
    pub selected: Vec<bool>,
    pub objective_m: f64,
    pub potentials: FxHashMap<i64, f64>,
}

impl ArcSelection {
    /// Iterate over the arcs which form part of the solution
    pub fn selected_arcs(&self) -> impl Iterator<Item = &EdgeData> + '_ {
        self.arcs
            .iter()
            .zip(self.selected.iter())
            .filter(|(_, selected)| **selected)
            .map(|(arc, _)| arc)
    }

    /// Check that the selected arcs satisfy flow conservation: the origin
    /// sends one unit, the destination receives one unit, and every other
    /// node has equal inflow and outflow
    pub fn check_conservation(&self) -> bool {
        let mut balance = FxHashMap::<i64, i64>::default();
        for arc in self.selected_arcs() {
            *balance.entry(arc.src).or_insert(0) += 1;
            *balance.entry(arc.dst).or_insert(0) -= 1;
        }

        if self.origin == self.destination {
            return balance.values().all(|b| *b == 0);
        }

        let inflow = |id: i64| {
            self.selected_arcs().filter(|arc| arc.dst == id).count()
        };
        let outflow = |id: i64| {
            self.selected_arcs().filter(|arc| arc.src == id).count()
        };

        let origin_ok = outflow(self.origin) == 1 && inflow(self.origin) == 0;
        let destination_ok =
            inflow(self.destination) == 1 && outflow(self.destination) == 0;
        let others_ok = balance.iter().all(|(id, b)| {
            *id == self.origin || *id == self.destination || *b == 0
        });

        origin_ok && destination_ok && others_ok
    }

    /// Check the optimality certificate: every candidate arc leaving a
    /// labelled node satisfies dual feasibility, every selected arc is
    /// tight, and the primal objective matches the dual bound
    pub fn certificate_holds(&self) -> bool {
        let dual_feasible = self.arcs.iter().all(|arc| {
            match (self.potentials.get(&arc.src), self.potentials.get(&arc.dst)) {
                (Some(pu), Some(pv)) => *pv <= pu + arc.length_m + TOLERANCE_M,
                (Some(_), None) => false,
                (None, _) => true,
            }
        });

        let tight = self.selected_arcs().all(|arc| {
            match (self.potentials.get(&arc.src), self.potentials.get(&arc.dst)) {
                (Some(pu), Some(pv)) => {
                    (pv - pu - arc.length_m).abs() <= TOLERANCE_M
                }
                _ => false,
            }
        });

        let bound = match (
            self.potentials.get(&self.origin),
            self.potentials.get(&self.destination),
        ) {
            (Some(po), Some(pd)) => pd - po,
            _ => return false,
        };
        let primal: f64 = self.selected_arcs().map(|arc| arc.length_m).sum();

        dual_feasible
            && tight
            && (primal - self.objective_m).abs() <= TOLERANCE_M
            && (primal - bound).abs() <= TOLERANCE_M
    }

    /// Read the node sequence from origin to destination off the selected
    /// arcs
    pub fn to_path(&self) -> RoutingResult<Vec<i64>> {
        let next: FxHashMap<i64, i64> = self
            .selected_arcs()
            .map(|arc| (arc.src, arc.dst))
            .collect();

        let mut nodes = vec![self.origin];
        let mut cur = self.origin;
        while cur != self.destination {
            match next.get(&cur) {
                Some(dst) if nodes.len() <= next.len() => {
                    nodes.push(*dst);
                    cur = *dst;
                }
                _ => {
                    return Err(RoutingError::Infeasible {
                        leg: 0,
                        origin: self.origin,
                        destination: self.destination,
                    });
                }
            }
        }
        Ok(nodes)
    }
}

/// Collapse parallel arcs to the shortest one and sort by (src, dst) so the
/// solver always sees the same problem for the same input
fn canonical_arcs(candidates: &[EdgeData]) -> Vec<EdgeData> {
    let mut best = FxHashMap::<(i64, i64), EdgeData>::default();
    for arc in candidates {
        best.entry((arc.src, arc.dst))
            .and_modify(|cur| {
                if arc.length_m < cur.length_m {
                    *cur = *arc;
                }
            })
            .or_insert(*arc);
    }
    let mut arcs: Vec<EdgeData> = best.into_values().collect();
    arcs.sort_by_key(|arc| (arc.src, arc.dst));
    arcs
}

/// Solve the arc selection problem for a single origin and destination over
/// the provided candidate arcs. Returns Infeasible if no selection can
/// satisfy the flow conservation constraints, and SolverTimeout if the
/// request budget runs out first. Infeasible always names leg 0 here, callers
/// solving one leg of a longer route renumber it with `leg_error`
pub fn solve_optimal(
    candidates: &[EdgeData],
    origin: i64,
    destination: i64,
    budget: &SolveBudget,
) -> RoutingResult<ArcSelection> {
    let arcs = canonical_arcs(candidates);

    let infeasible = RoutingError::Infeasible {
        leg: 0,
        origin,
        destination,
    };

    // Outgoing arcs for each node, in (src, dst) order
    let mut outgoing = FxHashMap::<i64, Vec<usize>>::default();
    for (inx, arc) in arcs.iter().enumerate() {
        outgoing.entry(arc.src).or_default().push(inx);
    }

    // Label-correcting pass to find the dual potentials
    let mut potentials = FxHashMap::<i64, f64>::default();
    let mut pred_arc = FxHashMap::<i64, usize>::default();
    let mut queue = VecDeque::<i64>::new();
    let mut queued = FxHashSet::<i64>::default();

    potentials.insert(origin, 0.0);
    queue.push_back(origin);
    queued.insert(origin);

    let mut relaxations: usize = 0;
    while let Some(node) = queue.pop_front() {
        queued.remove(&node);
        let base = potentials[&node];

        let Some(out) = outgoing.get(&node) else {
            continue;
        };

        for &inx in out {
            relaxations += 1;
            if relaxations % DEADLINE_CHECK_INTERVAL == 0 {
                budget.check()?;
            }

            let arc = &arcs[inx];
            let candidate = base + arc.length_m;
            let improves = match potentials.get(&arc.dst) {
                Some(cur) => candidate < *cur,
                None => true,
            };
            if improves {
                potentials.insert(arc.dst, candidate);
                pred_arc.insert(arc.dst, inx);
                if queued.insert(arc.dst) {
                    queue.push_back(arc.dst);
                }
            }
        }
    }

    let objective_m = match potentials.get(&destination) {
        Some(pot) => *pot,
        None => return Err(infeasible),
    };

    // Primal selection: the tight arcs along the predecessor chain
    let mut selected = vec![false; arcs.len()];
    let mut cur = destination;
    let mut steps: usize = 0;
    while cur != origin {
        let Some(&inx) = pred_arc.get(&cur) else {
            return Err(infeasible);
        };
        if selected[inx] || steps > arcs.len() {
            return Err(infeasible);
        }
        selected[inx] = true;
        cur = arcs[inx].src;
        steps += 1;
    }

    let selection = ArcSelection {
        origin,
        destination,
        arcs,
        selected,
        objective_m,
        potentials,
    };

    debug!(
        origin,
        destination,
        candidates = selection.arcs.len(),
        relaxations,
        objective_m,
        "solved arc selection"
    );
    debug_assert!(selection.check_conservation());
    debug_assert!(selection.certificate_holds());

    Ok(selection)
}

/// Every arc of the road network which lies on some walk from the origin to
/// the destination: its source can be reached from the origin, and the
/// destination can be reached from its target
pub fn reachable_arcs(
    store: &GraphStore,
    origin: i64,
    destination: i64,
) -> RoutingResult<Vec<EdgeData>> {
    let graph = store.graph();
    let src = store.index_of(origin)?;
    let dst = store.index_of(destination)?;

    let mut forward = FxHashSet::default();
    let mut bfs = Bfs::new(graph, src);
    while let Some(inx) = bfs.next(graph) {
        forward.insert(inx);
    }

    let reversed = Reversed(graph);
    let mut backward = FxHashSet::default();
    let mut bfs = Bfs::new(reversed, dst);
    while let Some(inx) = bfs.next(reversed) {
        backward.insert(inx);
    }

    let arcs = forward
        .iter()
        .flat_map(|inx| graph.edges_directed(*inx, Direction::Outgoing))
        .filter(|eref| backward.contains(&eref.target()))
        .map(|eref| *eref.weight())
        .collect();

    Ok(arcs)
}

/// The arcs joining each consecutive pair of nodes in a path
pub fn path_arcs(store: &GraphStore, nodes: &[i64]) -> RoutingResult<Vec<EdgeData>> {
    nodes
        .windows(2)
        .map(|pair| {
            store.edge_between(pair[0], pair[1]).copied().ok_or(
                RoutingError::NoEdgeData {
                    from: pair[0],
                    to: pair[1],
                },
            )
        })
        .collect()
}
