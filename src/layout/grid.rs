use std::collections::{BTreeMap, HashMap, HashSet};

use crate::config::LayoutConfig;

use super::error::LayoutError;
use super::forest::Forest;
use super::types::{GridPos, NodeId, Tree};

/// Walks lanes downward from `start` until `taken` says a lane is free.
/// Gives up after `cap` probes instead of trusting the loop to terminate.
fn bump_until_free(start: usize, cap: usize, mut taken: impl FnMut(usize) -> bool) -> Option<usize> {
    let mut lane = start;
    for _ in 0..cap {
        if !taken(lane) {
            return Some(lane);
        }
        lane += 1;
    }
    None
}

fn bump_limit(forest: &Forest, id: NodeId, start: usize, cap: usize) -> LayoutError {
    let key = forest.node(id).key.clone();
    tracing::error!(entity = %key, start, cap, "lane search exhausted");
    LayoutError::BumpLimit { id: key, start, cap }
}

fn probe_cap(forest: &Forest) -> usize {
    forest.len() + 2
}

fn lane_taken(forest: &Forest, others: &[NodeId], skip: NodeId, lane: usize) -> bool {
    others
        .iter()
        .any(|other| *other != skip && forest.node(*other).lane == Some(lane))
}

/// Places every named tree in display order, each in its own band of lanes
/// starting where the previous band ended. Returns the first free lane below
/// the last band.
pub(super) fn place_trees(forest: &mut Forest, trees: &mut [Tree]) -> Result<usize, LayoutError> {
    let mut cur_y = 0;
    for tree in trees.iter_mut() {
        tree.start_y = cur_y;
        tree.width = 0;
        place_trunk(forest, tree)?;
        place_branches(forest, tree)?;
        sort_leaves(forest, tree);
        pull_parents(forest, tree)?;
        tracing::debug!(tree = %tree.name, start_y = tree.start_y, width = tree.width, "tree placed");
        cur_y += tree.width;
    }
    Ok(cur_y)
}

fn place_trunk(forest: &mut Forest, tree: &mut Tree) -> Result<(), LayoutError> {
    let cap = probe_cap(forest);
    let start = tree.start_y;
    for &id in &tree.trunk {
        let depth = forest.node(id).depth;
        let same_depth: Vec<NodeId> = tree
            .trunk
            .iter()
            .copied()
            .filter(|other| forest.node(*other).depth == depth)
            .collect();
        let lane = bump_until_free(start, cap, |lane| lane_taken(forest, &same_depth, id, lane))
            .ok_or_else(|| bump_limit(forest, id, start, cap))?;
        forest.node_mut(id).place(depth, lane);
        tree.width = tree.width.max(lane - start + 1);
    }
    Ok(())
}

fn leaves_at_depth(forest: &Forest, tree: &Tree, depth: usize) -> Vec<NodeId> {
    tree.leaves
        .iter()
        .copied()
        .filter(|id| forest.node(*id).depth == depth)
        .collect()
}

/// Non-trunk members, one depth at a time. Each starts on the lane of its
/// highest same-tree parent (or the row below the trunk) and moves down past
/// anything already there. The trunk's first row stays reserved.
fn place_branches(forest: &mut Forest, tree: &mut Tree) -> Result<(), LayoutError> {
    let cap = probe_cap(forest);
    let start = tree.start_y;
    let trunk: HashSet<NodeId> = tree.trunk.iter().copied().collect();
    for depth in tree.min_depth..=tree.max_depth {
        let all_at_depth = leaves_at_depth(forest, tree, depth);
        let mut branches: Vec<NodeId> = all_at_depth
            .iter()
            .copied()
            .filter(|id| !trunk.contains(id))
            .collect();
        branches.sort_by_key(|id| {
            if forest.parents(*id).iter().any(|p| trunk.contains(p)) {
                0
            } else {
                1
            }
        });

        for id in branches {
            let own_tree = forest.node(id).tree;
            let preferred = forest
                .parents(id)
                .iter()
                .map(|p| forest.node(*p))
                .filter(|parent| parent.tree == own_tree)
                .filter_map(|parent| parent.lane)
                .min()
                .unwrap_or(start + 1);
            let lane = bump_until_free(preferred, cap, |lane| {
                lane == start || lane_taken(forest, &all_at_depth, id, lane)
            })
            .ok_or_else(|| bump_limit(forest, id, preferred, cap))?;
            tree.width = tree.width.max(lane - start + 1);
            forest.node_mut(id).place(depth, lane);
        }
    }
    Ok(())
}

fn sort_leaves(forest: &Forest, tree: &mut Tree) {
    tree.leaves.sort_by_key(|id| {
        let node = forest.node(*id);
        (node.depth, node.lane)
    });
}

/// Reverse pass from the deepest column back: a non-trunk node with placed
/// children moves to its topmost child's lane, never above the first branch
/// row of its band, bumping down on conflict. Nodes are only ever moved down
/// past occupied lanes; nothing is swapped.
fn pull_parents(forest: &mut Forest, tree: &mut Tree) -> Result<(), LayoutError> {
    let cap = probe_cap(forest);
    let start = tree.start_y;
    let trunk: HashSet<NodeId> = tree.trunk.iter().copied().collect();
    for depth in (tree.min_depth..=tree.max_depth).rev() {
        let all_at_depth = leaves_at_depth(forest, tree, depth);
        let branches: Vec<NodeId> = all_at_depth
            .iter()
            .copied()
            .filter(|id| !trunk.contains(id))
            .collect();
        for id in branches {
            let top_child = forest
                .children(id)
                .iter()
                .filter_map(|child| forest.node(*child).lane)
                .min();
            let Some(top_child) = top_child else {
                continue;
            };
            let target = top_child.max(start + 1);
            if forest.node(id).lane == Some(target) {
                continue;
            }
            let lane = bump_until_free(target, cap, |lane| lane_taken(forest, &all_at_depth, id, lane))
                .ok_or_else(|| bump_limit(forest, id, target, cap))?;
            tree.width = tree.width.max(lane - start + 1);
            forest.node_mut(id).place(depth, lane);
        }
    }
    Ok(())
}

/// Lays out the orphan tree below every named band: first small trees hanging
/// off parentless orphans, then any linked orphan those walks did not reach,
/// and finally fully isolated nodes in a label-sorted, row-wrapped grid.
pub(super) fn place_orphans(
    forest: &mut Forest,
    orphans: &mut Tree,
    cur_y: usize,
    config: &LayoutConfig,
) -> Result<(), LayoutError> {
    orphans.start_y = cur_y;

    let mut roots: Vec<NodeId> = orphans
        .leaves
        .iter()
        .copied()
        .filter(|id| !forest.children(*id).is_empty() && forest.parents(*id).is_empty())
        .collect();
    roots.sort_by_key(|id| forest.node(*id).depth);

    let mut offset = 0;
    for root in roots {
        offset += walk_subtree(forest, root, cur_y + offset);
    }

    let stragglers: Vec<NodeId> = orphans
        .leaves
        .iter()
        .copied()
        .filter(|id| forest.has_links(*id))
        .collect();
    for id in stragglers {
        if forest.node(id).lane.is_none() {
            offset += walk_subtree(forest, id, cur_y + offset);
        }
    }
    orphans.width = offset;

    let grid_y = cur_y + offset;
    let per_row = config.nodes_per_row();
    let mut isolated: Vec<NodeId> = orphans
        .leaves
        .iter()
        .copied()
        .filter(|id| !forest.has_links(*id))
        .collect();
    isolated.sort_by(|a, b| forest.node(*a).label.cmp(&forest.node(*b).label));
    for (idx, id) in isolated.iter().enumerate() {
        forest.node_mut(*id).place(idx % per_row, grid_y + idx / per_row);
    }
    if !isolated.is_empty() {
        orphans.width += isolated.len().div_ceil(per_row);
        orphans.max_depth = orphans.max_depth.max(per_row - 1);
    }
    tracing::debug!(
        start_y = orphans.start_y,
        width = orphans.width,
        isolated = isolated.len(),
        "orphans placed"
    );
    Ok(())
}

/// Depth-first walk from `root`: every depth gets its own row counter, so
/// the subtree occupies rows `row..row + returned`. Already placed nodes are
/// skipped together with everything below them.
fn walk_subtree(forest: &mut Forest, root: NodeId, row: usize) -> usize {
    let depth = forest.node(root).depth;
    forest.node_mut(root).place(depth, row);

    let mut rows_at_depth: BTreeMap<usize, usize> = BTreeMap::new();
    let mut stack: Vec<NodeId> = forest.children(root).to_vec();
    while let Some(child) = stack.pop() {
        if forest.node(child).lane.is_some() {
            continue;
        }
        let depth = forest.node(child).depth;
        let slot = rows_at_depth.entry(depth).or_insert(0);
        let offset = *slot;
        *slot += 1;
        forest.node_mut(child).place(depth, row + offset);
        stack.extend(forest.children(child).iter().copied());
    }
    rows_at_depth.values().copied().max().unwrap_or(0).max(1)
}

/// Every node placed, and no two nodes on the same grid cell.
pub(super) fn validate_positions(forest: &Forest) -> Result<(), LayoutError> {
    let mut seen: HashMap<GridPos, NodeId> = HashMap::new();
    for node in forest.nodes() {
        let Some(lane) = node.lane else {
            tracing::error!(entity = %node.key, "node left without a lane");
            return Err(LayoutError::Unplaced {
                id: node.key.clone(),
            });
        };
        let pos = GridPos {
            column: node.column,
            lane,
        };
        if let Some(previous) = seen.insert(pos, node.id) {
            let first = forest.node(previous).key.clone();
            tracing::error!(first = %first, second = %node.key, ?pos, "grid cell assigned twice");
            return Err(LayoutError::Conflict {
                column: pos.column,
                lane: pos.lane,
                first,
                second: node.key.clone(),
            });
        }
    }
    Ok(())
}
