use crate::theme::{Rgb, hsv_to_rgb};

use super::types::Tree;

/// Spreads the named trees evenly around the hue circle in display order,
/// fully saturated: tree `i` of `n` gets hue `(i + 1) / n`, so the last tree
/// lands on 1.0 and wraps back to red. The orphan tree stays grey.
pub(super) fn assign_colors(trees: &mut [Tree], orphans: &mut Tree) {
    let count = trees.len();
    for (idx, tree) in trees.iter_mut().enumerate() {
        let hue = (idx + 1) as f32 / count as f32;
        tree.hue = Some(hue);
        tree.color = hsv_to_rgb(hue, 1.0, 1.0);
    }
    orphans.hue = None;
    orphans.color = Rgb::grey();
}
