//! Upstream traversal of the host graph.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::host::{NodeGraph, NodeId};
use crate::util::{Error, Result};

/// Operator type of geometry file readers.
pub const FILE_NODE: &str = "file";

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    OnPath,
    Done,
}

/// Fail with [`Error::CycleDetected`] if any input chain above `start` loops.
///
/// Nodes reached through several paths (diamonds) are fine; only a node met
/// again while it is still on the current path is a cycle.
pub fn ensure_acyclic<G: NodeGraph + ?Sized>(graph: &G, start: NodeId) -> Result<()> {
    let mut marks: HashMap<NodeId, Mark> = HashMap::new();
    let mut stack: Vec<(NodeId, Vec<NodeId>, usize)> = vec![(start, graph.inputs(start)?, 0)];
    marks.insert(start, Mark::OnPath);

    while let Some(top) = stack.last_mut() {
        if top.2 < top.1.len() {
            let input = top.1[top.2];
            top.2 += 1;
            match marks.get(&input) {
                Some(Mark::OnPath) => return Err(Error::CycleDetected(graph.node_path(input)?)),
                Some(Mark::Done) => {}
                None => {
                    marks.insert(input, Mark::OnPath);
                    stack.push((input, graph.inputs(input)?, 0));
                }
            }
        } else {
            let node = top.0;
            stack.pop();
            marks.insert(node, Mark::Done);
        }
    }
    Ok(())
}

/// File nodes reachable upstream from `start`, breadth-first.
///
/// `start` itself is included when it is a file node. Each node is visited
/// once even if several paths lead to it.
pub fn collect_file_nodes<G: NodeGraph + ?Sized>(graph: &G, start: NodeId) -> Result<Vec<NodeId>> {
    ensure_acyclic(graph, start)?;

    let mut files = Vec::new();
    let mut seen = HashSet::from([start]);
    let mut queue = VecDeque::from([start]);

    while let Some(current) = queue.pop_front() {
        if graph.node_type(current)? == FILE_NODE {
            files.push(current);
        }
        for input in graph.inputs(current)? {
            if seen.insert(input) {
                queue.push_back(input);
            }
        }
    }
    Ok(files)
}

/// Whether `target` is `from` or lies anywhere upstream of it.
pub fn reaches<G: NodeGraph + ?Sized>(graph: &G, from: NodeId, target: NodeId) -> Result<bool> {
    let mut seen = HashSet::from([from]);
    let mut queue = VecDeque::from([from]);

    while let Some(current) = queue.pop_front() {
        if current == target {
            return Ok(true);
        }
        for input in graph.inputs(current)? {
            if seen.insert(input) {
                queue.push_back(input);
            }
        }
    }
    Ok(false)
}

/// Node whose cooked geometry holds the branch of `file` below `start`.
///
/// With a single file the start node itself is used, since it carries the
/// final material assignment. Otherwise the first input of `start` that has
/// `file` upstream is used, falling back to `file` when none does.
pub fn branch_source<G: NodeGraph + ?Sized>(
    graph: &G,
    start: NodeId,
    file: NodeId,
    file_count: usize,
) -> Result<NodeId> {
    if file_count == 1 {
        return Ok(start);
    }
    for input in graph.inputs(start)? {
        if reaches(graph, input, file)? {
            return Ok(input);
        }
    }
    Ok(file)
}
