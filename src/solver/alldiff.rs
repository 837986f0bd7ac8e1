//! Generalised arc consistency for tagged all-different groups
//! (Regin's filtering algorithm).
//!
//! For each group: build the bipartite variable/value graph over the
//! unassigned scope members, find a maximum matching with
//! Hopcroft-Karp, then compute strongly connected components of the
//! residual digraph. A candidate edge survives iff it is matched or its
//! endpoints share a component; everything else is pruned. If the
//! matching cannot cover every unassigned variable the group is
//! infeasible and the propagator signals a wipeout.
//!
//! Nodes are dense integers (variables `0..n`, values `n..n+m`, plus a
//! free-value source) over flat CSR adjacency arrays; the SCC pass is
//! iterative Tarjan with an explicit stack so deep groups cannot
//! exhaust the call stack.

use tracing::trace;

use crate::solver::{
    engine::{SearchStats, VariableId},
    problem::Problem,
    propagate::{Propagation, Workspace},
};

const NIL: u32 = u32::MAX;
const INF: u32 = u32::MAX;
const UNVISITED: u32 = u32::MAX;

/// Reusable buffers for the matching and SCC passes. Cleared and
/// refilled per group.
#[derive(Debug, Default)]
pub(crate) struct ReginScratch {
    /// Unassigned variables of the group under consideration.
    vars: Vec<VariableId>,
    /// Values taken by assigned group members; forbidden to the rest.
    forbidden: Vec<u32>,
    /// Sorted dense value table; value id is the position.
    values: Vec<u32>,
    /// Candidate bipartite edges, CSR by variable position.
    adj_off: Vec<u32>,
    adj: Vec<u32>,
    /// Matching state.
    match_var: Vec<u32>,
    match_val: Vec<u32>,
    dist: Vec<u32>,
    bfs: Vec<u32>,
    /// Residual digraph, CSR over variable + value + source nodes.
    graph_off: Vec<u32>,
    graph_edges: Vec<u32>,
    /// Tarjan state.
    index: Vec<u32>,
    low: Vec<u32>,
    on_stack: Vec<bool>,
    stack: Vec<u32>,
    call: Vec<(u32, u32)>,
    scc: Vec<u32>,
}

/// Runs the GAC pass. With `Some(variable)` only the tagged groups whose
/// scope contains it are filtered (the per-assignment propagator); with
/// `None` every tagged group is swept once (the initial-propagation
/// pass).
pub(crate) fn propagate(
    problem: &mut Problem,
    variable: Option<VariableId>,
    workspace: &mut Workspace,
    stats: &mut SearchStats,
) -> Propagation {
    for id in 0..problem.constraints.len() {
        if !problem.constraints[id].is_all_different() {
            continue;
        }
        if let Some(v) = variable {
            if !problem.constraints[id].scope.contains(&v) {
                continue;
            }
        }
        if propagate_group(problem, id, workspace, stats) == Propagation::Wipeout {
            return Propagation::Wipeout;
        }
    }
    Propagation::Ok
}

fn propagate_group(
    problem: &mut Problem,
    constraint_id: usize,
    workspace: &mut Workspace,
    stats: &mut SearchStats,
) -> Propagation {
    let scratch = &mut workspace.gac;
    scratch.vars.clear();
    scratch.forbidden.clear();
    for i in 0..problem.constraints[constraint_id].scope.len() {
        let v = problem.constraints[constraint_id].scope[i];
        match problem.assignment[v as usize] {
            Some(value) => scratch.forbidden.push(value),
            None => scratch.vars.push(v),
        }
    }
    // Binary and smaller groups are already covered by forward checking.
    if scratch.vars.len() < 3 {
        return Propagation::Ok;
    }
    stats.gac_runs += 1;

    let n = scratch.vars.len();

    // Candidate edges: each variable's current domain minus the values
    // taken by assigned group members. Raw values first, remapped to
    // dense ids once the value table is complete.
    scratch.adj_off.clear();
    scratch.adj.clear();
    scratch.values.clear();
    scratch.adj_off.push(0);
    for i in 0..n {
        let v = scratch.vars[i];
        workspace.values.clear();
        workspace
            .values
            .extend(problem.current_domains[v as usize].iter());
        workspace.values.sort_unstable();
        for &value in &workspace.values {
            if !scratch.forbidden.contains(&value) {
                scratch.adj.push(value);
            }
        }
        scratch.adj_off.push(scratch.adj.len() as u32);
    }
    scratch.values.extend_from_slice(&scratch.adj);
    scratch.values.sort_unstable();
    scratch.values.dedup();
    let m = scratch.values.len();
    for entry in &mut scratch.adj {
        *entry = scratch.values.binary_search(entry).expect("value in table") as u32;
    }

    let matched = hopcroft_karp(scratch, n, m);
    if matched < n {
        trace!(
            constraint = %problem.constraints[constraint_id].descriptor().description,
            "all-different group has no covering matching"
        );
        return Propagation::Wipeout;
    }

    build_residual_graph(scratch, n, m);
    tarjan_scc(scratch, n + m + 1);

    // An unmatched candidate edge survives only inside its component.
    for i in 0..n {
        for e in scratch.adj_off[i]..scratch.adj_off[i + 1] {
            let value_id = scratch.adj[e as usize];
            if scratch.match_var[i] == value_id {
                continue;
            }
            if scratch.scc[i] != scratch.scc[n + value_id as usize] {
                problem.prune(scratch.vars[i], scratch.values[value_id as usize]);
                stats.prunings += 1;
            }
        }
    }
    Propagation::Ok
}

/// Maximum bipartite matching over the candidate edges.
fn hopcroft_karp(scratch: &mut ReginScratch, n: usize, m: usize) -> usize {
    scratch.match_var.clear();
    scratch.match_var.resize(n, NIL);
    scratch.match_val.clear();
    scratch.match_val.resize(m, NIL);
    scratch.dist.clear();
    scratch.dist.resize(n, 0);

    let mut matched = 0;
    loop {
        // BFS phase: layer the unmatched variables.
        scratch.bfs.clear();
        for u in 0..n {
            if scratch.match_var[u] == NIL {
                scratch.dist[u] = 0;
                scratch.bfs.push(u as u32);
            } else {
                scratch.dist[u] = INF;
            }
        }
        let mut reachable_free_value = false;
        let mut head = 0;
        while head < scratch.bfs.len() {
            let u = scratch.bfs[head] as usize;
            head += 1;
            for e in scratch.adj_off[u]..scratch.adj_off[u + 1] {
                let v = scratch.adj[e as usize] as usize;
                let w = scratch.match_val[v];
                if w == NIL {
                    reachable_free_value = true;
                } else if scratch.dist[w as usize] == INF {
                    scratch.dist[w as usize] = scratch.dist[u] + 1;
                    scratch.bfs.push(w);
                }
            }
        }
        if !reachable_free_value {
            return matched;
        }
        // DFS phase: augment along layered paths.
        for u in 0..n {
            if scratch.match_var[u] == NIL && augment(scratch, u) {
                matched += 1;
            }
        }
    }
}

fn augment(scratch: &mut ReginScratch, u: usize) -> bool {
    for e in scratch.adj_off[u]..scratch.adj_off[u + 1] {
        let v = scratch.adj[e as usize] as usize;
        let w = scratch.match_val[v];
        if w == NIL
            || (scratch.dist[w as usize] == scratch.dist[u] + 1 && augment(scratch, w as usize))
        {
            scratch.match_var[u] = v as u32;
            scratch.match_val[v] = u as u32;
            return true;
        }
    }
    scratch.dist[u] = INF;
    false
}

/// Residual digraph: matched edges point value -> variable, unmatched
/// candidate edges point variable -> value. A virtual free-value source
/// feeds every unmatched value and absorbs every matched one.
fn build_residual_graph(scratch: &mut ReginScratch, n: usize, m: usize) {
    let nodes = n + m + 1;
    let source = (n + m) as u32;
    let edge_count = scratch.adj.len() + m;

    // Two-pass CSR build: degree count, prefix sum, fill.
    scratch.graph_off.clear();
    scratch.graph_off.resize(nodes + 1, 0);
    for u in 0..n {
        for e in scratch.adj_off[u]..scratch.adj_off[u + 1] {
            let v = scratch.adj[e as usize];
            let from = if scratch.match_var[u] == v {
                n + v as usize
            } else {
                u
            };
            scratch.graph_off[from + 1] += 1;
        }
    }
    for v in 0..m {
        let from = if scratch.match_val[v] == NIL {
            source as usize
        } else {
            n + v
        };
        scratch.graph_off[from + 1] += 1;
    }
    for i in 0..nodes {
        scratch.graph_off[i + 1] += scratch.graph_off[i];
    }
    scratch.graph_edges.clear();
    scratch.graph_edges.resize(edge_count, 0);
    // Reuse dist as a per-node fill cursor.
    scratch.dist.clear();
    scratch.dist.resize(nodes, 0);
    fn push(scratch: &mut ReginScratch, from: usize, to: u32) {
        let slot = scratch.graph_off[from] + scratch.dist[from];
        scratch.graph_edges[slot as usize] = to;
        scratch.dist[from] += 1;
    }
    for u in 0..n {
        for e in scratch.adj_off[u]..scratch.adj_off[u + 1] {
            let v = scratch.adj[e as usize];
            if scratch.match_var[u] == v {
                push(scratch, n + v as usize, u as u32);
            } else {
                push(scratch, u, n as u32 + v);
            }
        }
    }
    for v in 0..m {
        if scratch.match_val[v] == NIL {
            push(scratch, source as usize, n as u32 + v as u32);
        } else {
            push(scratch, n + v, source);
        }
    }
}

/// Iterative Tarjan over the residual digraph; fills `scratch.scc` with
/// a component id per node.
fn tarjan_scc(scratch: &mut ReginScratch, nodes: usize) {
    scratch.index.clear();
    scratch.index.resize(nodes, UNVISITED);
    scratch.low.clear();
    scratch.low.resize(nodes, 0);
    scratch.on_stack.clear();
    scratch.on_stack.resize(nodes, false);
    scratch.scc.clear();
    scratch.scc.resize(nodes, 0);
    scratch.stack.clear();
    scratch.call.clear();

    let mut counter: u32 = 0;
    let mut components: u32 = 0;

    for root in 0..nodes as u32 {
        if scratch.index[root as usize] != UNVISITED {
            continue;
        }
        scratch.index[root as usize] = counter;
        scratch.low[root as usize] = counter;
        counter += 1;
        scratch.stack.push(root);
        scratch.on_stack[root as usize] = true;
        scratch.call.push((root, scratch.graph_off[root as usize]));

        while let Some(&(node, edge)) = scratch.call.last() {
            if edge < scratch.graph_off[node as usize + 1] {
                scratch.call.last_mut().expect("frame").1 += 1;
                let next = scratch.graph_edges[edge as usize];
                if scratch.index[next as usize] == UNVISITED {
                    scratch.index[next as usize] = counter;
                    scratch.low[next as usize] = counter;
                    counter += 1;
                    scratch.stack.push(next);
                    scratch.on_stack[next as usize] = true;
                    scratch.call.push((next, scratch.graph_off[next as usize]));
                } else if scratch.on_stack[next as usize] {
                    let bound = scratch.index[next as usize];
                    if bound < scratch.low[node as usize] {
                        scratch.low[node as usize] = bound;
                    }
                }
            } else {
                scratch.call.pop();
                if scratch.low[node as usize] == scratch.index[node as usize] {
                    loop {
                        let member = scratch.stack.pop().expect("scc stack");
                        scratch.on_stack[member as usize] = false;
                        scratch.scc[member as usize] = components;
                        if member == node {
                            break;
                        }
                    }
                    components += 1;
                }
                if let Some(&(parent, _)) = scratch.call.last() {
                    if scratch.low[node as usize] < scratch.low[parent as usize] {
                        scratch.low[parent as usize] = scratch.low[node as usize];
                    }
                }
            }
        }
    }
}
