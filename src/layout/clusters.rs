use std::collections::{HashMap, HashSet};

use super::forest::Forest;
use super::types::{NodeId, Tree, TreeRef};

pub(super) struct Extraction {
    pub trees: Vec<Tree>,
    pub orphans: Vec<NodeId>,
}

/// Groups nodes into one provisional tree per category. A node only counts
/// towards its category when a parent or child shares it, which keeps
/// same-named but unrelated entities apart. Groups below `min_trunk_size`
/// are dissolved into the orphan pool.
pub(super) fn extract_trees(forest: &Forest, min_trunk_size: usize) -> Extraction {
    let mut groups: Vec<(String, Vec<NodeId>)> = Vec::new();
    let mut group_index: HashMap<String, usize> = HashMap::new();
    let mut orphans = Vec::new();

    for id in forest.ids() {
        let category = forest.node(id).category.as_str();
        let linked = forest
            .parents(id)
            .iter()
            .chain(forest.children(id))
            .any(|other| forest.node(*other).category == category);
        if !linked {
            orphans.push(id);
            continue;
        }
        let slot = *group_index.entry(category.to_string()).or_insert_with(|| {
            groups.push((category.to_string(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(id);
    }

    let mut trees = Vec::new();
    let mut stumps = Vec::new();
    for (name, members) in groups {
        if members.len() >= min_trunk_size {
            let mut tree = Tree::new(&name);
            tree.leaves = members.clone();
            tree.trunk = members;
            refresh_bounds(forest, &mut tree);
            trees.push(tree);
        } else {
            tracing::debug!(category = %name, size = members.len(), "tree below minimum size dissolved");
            stumps.extend(members);
        }
    }
    orphans.extend(stumps);

    Extraction { trees, orphans }
}

/// Number of prerequisite edges running between the two trees' members.
pub(super) fn affinity(forest: &Forest, a: &Tree, b: &Tree) -> usize {
    let others: HashSet<NodeId> = b.leaves.iter().copied().collect();
    a.leaves
        .iter()
        .map(|id| {
            forest
                .parents(*id)
                .iter()
                .chain(forest.children(*id))
                .filter(|linked| others.contains(linked))
                .count()
        })
        .sum()
}

pub(super) fn bind_trees(forest: &mut Forest, trees: &[Tree]) {
    for (idx, tree) in trees.iter().enumerate() {
        for id in &tree.leaves {
            forest.node_mut(*id).tree = Some(TreeRef::Named(idx));
        }
    }
}

/// The named tree holding most of the node's direct neighbours; the first
/// tree in display order wins a tie. `None` when no neighbour is in a named
/// tree.
pub(super) fn closest_tree(forest: &Forest, id: NodeId, tree_count: usize) -> Option<usize> {
    let mut votes = vec![0usize; tree_count];
    for linked in forest.parents(id).iter().chain(forest.children(id)) {
        if let Some(TreeRef::Named(idx)) = forest.node(*linked).tree {
            votes[idx] += 1;
        }
    }
    let mut best: Option<usize> = None;
    for (idx, count) in votes.iter().enumerate() {
        if *count == 0 {
            continue;
        }
        if best.is_none_or(|b| *count > votes[b]) {
            best = Some(idx);
        }
    }
    best
}

/// Attaches each orphan, in order, to its closest named tree or else to the
/// orphan tree. Earlier attachments count as neighbours for later ones.
pub(super) fn attach_orphans(
    forest: &mut Forest,
    trees: &mut [Tree],
    orphan_tree: &mut Tree,
    orphans: &[NodeId],
) {
    for id in orphans {
        match closest_tree(forest, *id, trees.len()) {
            Some(idx) => {
                trees[idx].leaves.push(*id);
                forest.node_mut(*id).tree = Some(TreeRef::Named(idx));
            }
            None => {
                orphan_tree.leaves.push(*id);
                forest.node_mut(*id).tree = Some(TreeRef::Orphans);
            }
        }
    }
    for tree in trees.iter_mut() {
        refresh_bounds(forest, tree);
    }
    refresh_bounds(forest, orphan_tree);
}

pub(super) fn refresh_bounds(forest: &Forest, tree: &mut Tree) {
    let depths = tree.leaves.iter().map(|id| forest.node(*id).depth);
    tree.min_depth = depths.clone().min().unwrap_or(0);
    tree.max_depth = depths.max().unwrap_or(0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Entity;
    use crate::layout::ranking::assign_depths;

    fn forest_of(entities: &[Entity]) -> Forest {
        let mut diagnostics = Vec::new();
        let mut forest = Forest::build(entities, &mut diagnostics);
        assign_depths(&mut forest).unwrap();
        forest
    }

    fn names(forest: &Forest, ids: &[NodeId]) -> Vec<String> {
        ids.iter().map(|id| forest.node(*id).key.clone()).collect()
    }

    #[test]
    fn linked_category_becomes_tree_and_lone_node_orphans() {
        let forest = forest_of(&[
            Entity::new("w1", "Weapons", &[]),
            Entity::new("w2", "Weapons", &["w1"]),
            Entity::new("w3", "Weapons", &["w2"]),
            Entity::new("armor", "Armor", &[]),
        ]);
        let extraction = extract_trees(&forest, 2);
        assert_eq!(extraction.trees.len(), 1);
        assert_eq!(extraction.trees[0].name, "Weapons");
        assert_eq!(names(&forest, &extraction.trees[0].trunk), vec!["w1", "w2", "w3"]);
        assert_eq!(extraction.trees[0].max_depth, 2);
        assert_eq!(names(&forest, &extraction.orphans), vec!["armor"]);
    }

    #[test]
    fn same_category_without_direct_link_is_not_merged() {
        let forest = forest_of(&[
            Entity::new("root", "Basics", &[]),
            Entity::new("p1", "Power", &["root"]),
            Entity::new("p2", "Power", &["root"]),
        ]);
        let extraction = extract_trees(&forest, 2);
        assert!(extraction.trees.is_empty());
        assert_eq!(names(&forest, &extraction.orphans), vec!["root", "p1", "p2"]);
    }

    #[test]
    fn small_groups_dissolve_after_plain_orphans() {
        let forest = forest_of(&[
            Entity::new("m1", "Medicine", &[]),
            Entity::new("m2", "Medicine", &["m1"]),
            Entity::new("lone", "Misc", &[]),
        ]);
        let extraction = extract_trees(&forest, 3);
        assert!(extraction.trees.is_empty());
        assert_eq!(names(&forest, &extraction.orphans), vec!["lone", "m1", "m2"]);
    }

    #[test]
    fn affinity_counts_cross_edges_symmetrically() {
        let forest = forest_of(&[
            Entity::new("a1", "A", &[]),
            Entity::new("a2", "A", &["a1"]),
            Entity::new("b1", "B", &["a1"]),
            Entity::new("b2", "B", &["b1", "a2"]),
        ]);
        let extraction = extract_trees(&forest, 2);
        let (a, b) = (&extraction.trees[0], &extraction.trees[1]);
        assert_eq!(affinity(&forest, a, b), 2);
        assert_eq!(affinity(&forest, b, a), 2);
    }

    #[test]
    fn orphans_join_closest_tree() {
        let mut forest = forest_of(&[
            Entity::new("a1", "A", &[]),
            Entity::new("a2", "A", &["a1"]),
            Entity::new("b1", "B", &[]),
            Entity::new("b2", "B", &["b1"]),
            Entity::new("gadget", "Gadgets", &["a2", "b2", "b1"]),
            Entity::new("widget", "Widgets", &["gadget"]),
            Entity::new("lone", "Misc", &[]),
        ]);
        let extraction = extract_trees(&forest, 2);
        let mut trees = extraction.trees;
        bind_trees(&mut forest, &trees);
        let mut orphan_tree = Tree::new("orphans");
        attach_orphans(&mut forest, &mut trees, &mut orphan_tree, &extraction.orphans);

        // gadget keeps a2 and b2 after pruning; the tie goes to the first tree.
        let gadget = forest.lookup("gadget").unwrap();
        assert_eq!(forest.node(gadget).tree, Some(TreeRef::Named(0)));
        // widget only touches gadget, which was attached just before it.
        let widget = forest.lookup("widget").unwrap();
        assert_eq!(forest.node(widget).tree, Some(TreeRef::Named(0)));
        assert_eq!(names(&forest, &orphan_tree.leaves), vec!["lone"]);
        assert_eq!(trees[0].trunk.len(), 2);
        assert_eq!(trees[0].leaves.len(), 4);
        assert_eq!(trees[0].max_depth, 3);
    }
}
