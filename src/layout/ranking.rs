use std::cmp::Reverse;
use std::collections::BinaryHeap;

use super::error::LayoutError;
use super::forest::Forest;
use super::types::NodeId;

/// Longest-path depth from any root: roots sit at 0, every other node one
/// past its deepest prerequisite. Nodes are released in Kahn order with the
/// lowest forest index first, so the result never depends on hash order.
pub(super) fn assign_depths(forest: &mut Forest) -> Result<(), LayoutError> {
    let order = topological_order(forest)?;
    for id in order {
        let depth = forest
            .parents(id)
            .iter()
            .map(|p| forest.node(*p).depth + 1)
            .max()
            .unwrap_or(0);
        let node = forest.node_mut(id);
        node.depth = depth;
        node.column = depth;
    }
    Ok(())
}

pub(super) fn topological_order(forest: &Forest) -> Result<Vec<NodeId>, LayoutError> {
    let mut indeg: Vec<usize> = forest.ids().map(|id| forest.parents(id).len()).collect();
    let mut ready: BinaryHeap<Reverse<NodeId>> = BinaryHeap::new();
    for id in forest.ids() {
        if indeg[id.0] == 0 {
            ready.push(Reverse(id));
        }
    }

    let mut order = Vec::with_capacity(forest.len());
    while let Some(Reverse(id)) = ready.pop() {
        order.push(id);
        for child in forest.children(id) {
            let deg = &mut indeg[child.0];
            *deg = deg.saturating_sub(1);
            if *deg == 0 {
                ready.push(Reverse(*child));
            }
        }
    }

    if order.len() < forest.len() {
        let ids: Vec<String> = forest
            .ids()
            .filter(|id| indeg[id.0] > 0)
            .map(|id| forest.node(id).key.clone())
            .collect();
        tracing::error!(entities = ?ids, "prerequisite cycle survived pruning");
        return Err(LayoutError::CycleDetected { ids });
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Entity;

    fn forest_of(entities: &[Entity]) -> Forest {
        let mut diagnostics = Vec::new();
        Forest::build(entities, &mut diagnostics)
    }

    fn depth(forest: &Forest, key: &str) -> usize {
        forest.node(forest.lookup(key).unwrap()).depth
    }

    #[test]
    fn chain_depths() {
        let mut forest = forest_of(&[
            Entity::new("A", "X", &[]),
            Entity::new("B", "X", &["A"]),
            Entity::new("C", "X", &["A", "B"]),
        ]);
        assign_depths(&mut forest).unwrap();
        assert_eq!(depth(&forest, "A"), 0);
        assert_eq!(depth(&forest, "B"), 1);
        assert_eq!(depth(&forest, "C"), 2);
    }

    #[test]
    fn depth_follows_longest_path() {
        // Declared out of order on purpose.
        let mut forest = forest_of(&[
            Entity::new("D", "X", &["C", "E"]),
            Entity::new("C", "X", &["B"]),
            Entity::new("B", "X", &["A"]),
            Entity::new("A", "X", &[]),
            Entity::new("E", "X", &[]),
        ]);
        assign_depths(&mut forest).unwrap();
        assert_eq!(depth(&forest, "D"), 3);
        assert_eq!(depth(&forest, "E"), 0);
        let d = forest.node(forest.lookup("D").unwrap());
        assert_eq!(d.column, d.depth);
    }

    #[test]
    fn surviving_cycle_is_reported() {
        let mut forest = forest_of(&[
            Entity::new("A", "X", &[]),
            Entity::new("B", "X", &[]),
            Entity::new("C", "X", &[]),
        ]);
        let a = forest.lookup("A").unwrap();
        let b = forest.lookup("B").unwrap();
        forest.set_prerequisites(a, vec![b]);
        forest.set_prerequisites(b, vec![a]);
        let err = assign_depths(&mut forest).unwrap_err();
        assert_eq!(
            err,
            LayoutError::CycleDetected {
                ids: vec!["A".to_string(), "B".to_string()]
            }
        );
    }
}
