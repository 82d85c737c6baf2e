use super::clusters::affinity;
use super::forest::Forest;
use super::types::Tree;

/// Arranges trees so that trees sharing many edges end up next to each other.
///
/// This is a nearest-neighbour take on a travelling-salesman ordering: start
/// from the largest tree, then repeatedly append the pending tree with the
/// highest affinity accumulated against everything placed so far. It is not
/// optimal, only cheap and deterministic; ties go to the tree that came first
/// after the size sort, and the size sort itself is stable.
pub(super) fn order_trees(forest: &Forest, mut trees: Vec<Tree>) -> Vec<Tree> {
    if trees.len() < 3 {
        return trees;
    }
    trees.sort_by(|a, b| b.leaves.len().cmp(&a.leaves.len()));

    let count = trees.len();
    let mut matrix = vec![vec![0usize; count]; count];
    for i in 0..count {
        for j in (i + 1)..count {
            let score = affinity(forest, &trees[i], &trees[j]);
            matrix[i][j] = score;
            matrix[j][i] = score;
        }
    }

    let mut order = vec![0usize];
    let mut pending: Vec<usize> = (1..count).collect();
    let mut weights: Vec<usize> = matrix[0].clone();
    while !pending.is_empty() {
        let mut best = 0;
        for slot in 1..pending.len() {
            if weights[pending[slot]] > weights[pending[best]] {
                best = slot;
            }
        }
        let next = pending.remove(best);
        order.push(next);
        for other in &pending {
            weights[*other] += matrix[next][*other];
        }
    }

    let mut slots: Vec<Option<Tree>> = trees.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|idx| slots[idx].take())
        .collect()
}
