mod clusters;
mod error;
mod forest;
mod grid;
mod ordering;
mod palette;
mod ranking;
pub(crate) mod types;
pub use error::LayoutError;
pub use forest::Forest;
pub use types::*;

use crate::config::LayoutConfig;
use crate::ir::Entity;

const ORPHANS_NAME: &str = "orphans";

/// Lays out a research tree: builds and prunes the prerequisite forest,
/// groups it into named trees, orders and colours them, and assigns every
/// visible entity a grid cell and pixel position.
///
/// The run is deterministic; identical input gives identical output.
pub fn compute_layout(entities: &[Entity], config: &LayoutConfig) -> Result<Layout, LayoutError> {
    let mut session = LayoutSession::new(entities);
    session.run(config)?;
    Ok(session.into_layout(config))
}

/// Working state of one layout run. Created per call and consumed by
/// [`LayoutSession::into_layout`].
#[derive(Debug)]
struct LayoutSession {
    forest: Forest,
    trees: Vec<Tree>,
    orphans: Tree,
    diagnostics: Vec<Diagnostic>,
}

impl LayoutSession {
    fn new(entities: &[Entity]) -> Self {
        let mut diagnostics = Vec::new();
        let forest = Forest::build(entities, &mut diagnostics);
        tracing::debug!(
            entities = entities.len(),
            nodes = forest.len(),
            diagnostics = diagnostics.len(),
            "forest built"
        );
        Self {
            forest,
            trees: Vec::new(),
            orphans: Tree::new(ORPHANS_NAME),
            diagnostics,
        }
    }

    fn run(&mut self, config: &LayoutConfig) -> Result<(), LayoutError> {
        ranking::assign_depths(&mut self.forest)?;

        let extraction = clusters::extract_trees(&self.forest, config.min_trunk_size.max(1));
        let trees = ordering::order_trees(&self.forest, extraction.trees);
        self.trees = trees;
        clusters::bind_trees(&mut self.forest, &self.trees);
        self.orphans = Tree::new(ORPHANS_NAME);
        clusters::attach_orphans(
            &mut self.forest,
            &mut self.trees,
            &mut self.orphans,
            &extraction.orphans,
        );
        tracing::debug!(
            trees = self.trees.len(),
            orphans = self.orphans.leaves.len(),
            "trees extracted"
        );

        palette::assign_colors(&mut self.trees, &mut self.orphans);

        let cur_y = grid::place_trees(&mut self.forest, &mut self.trees)?;
        grid::place_orphans(&mut self.forest, &mut self.orphans, cur_y, config)?;
        grid::validate_positions(&self.forest)?;
        Ok(())
    }

    fn into_layout(self, config: &LayoutConfig) -> Layout {
        let LayoutSession {
            forest,
            trees,
            orphans,
            diagnostics,
        } = self;

        let nodes: Vec<NodeLayout> = forest
            .nodes()
            .iter()
            .map(|node| {
                let tree = tree_of(&trees, &orphans, node);
                let lane = node.lane.unwrap_or_default();
                NodeLayout {
                    id: node.key.clone(),
                    label: node.label.clone(),
                    tree: tree.name.clone(),
                    depth: node.depth,
                    pos: GridPos {
                        column: node.column,
                        lane,
                    },
                    x: node.column as f32 * config.column_step(),
                    y: lane as f32 * config.lane_step(),
                    width: config.node_width,
                    height: config.node_height,
                    color: tree.color,
                    finished: node.finished,
                }
            })
            .collect();

        let mut edges = Vec::new();
        for node in forest.nodes() {
            let dependent = &nodes[node.id.0];
            for prereq in &node.prerequisites {
                let source = forest.node(*prereq);
                let tree = tree_of(&trees, &orphans, source);
                let color = if source.finished {
                    tree.color.medium()
                } else {
                    tree.color.greyed()
                };
                edges.push(EdgeLayout {
                    from: source.key.clone(),
                    to: node.key.clone(),
                    start: nodes[prereq.0].right_anchor(),
                    end: dependent.left_anchor(),
                    color,
                });
            }
        }

        let project = |tree: &Tree, is_orphans: bool| TreeLayout {
            name: tree.name.clone(),
            color: tree.color,
            hue: tree.hue,
            start_y: tree.start_y,
            width: tree.width,
            min_depth: tree.min_depth,
            max_depth: tree.max_depth,
            members: tree
                .leaves
                .iter()
                .map(|id| forest.node(*id).key.clone())
                .collect(),
            trunk: tree
                .trunk
                .iter()
                .map(|id| forest.node(*id).key.clone())
                .collect(),
            is_orphans,
        };
        let mut tree_layouts: Vec<TreeLayout> = trees.iter().map(|tree| project(tree, false)).collect();
        tree_layouts.push(project(&orphans, true));

        let width = nodes
            .iter()
            .map(|node| node.x + node.width)
            .fold(0.0f32, f32::max);
        let height = nodes
            .iter()
            .map(|node| node.y + node.height)
            .fold(0.0f32, f32::max);

        Layout {
            nodes,
            trees: tree_layouts,
            edges,
            diagnostics,
            width,
            height,
        }
    }
}

fn tree_of<'a>(trees: &'a [Tree], orphans: &'a Tree, node: &Node) -> &'a Tree {
    match node.tree {
        Some(TreeRef::Named(idx)) => &trees[idx],
        _ => orphans,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn weapons_and_armor() -> Vec<Entity> {
        vec![
            Entity::new("w1", "Weapons", &[]).finished(true),
            Entity::new("w2", "Weapons", &["w1"]),
            Entity::new("w3", "Weapons", &["w2"]),
            Entity::new("armor", "Armor", &[]),
        ]
    }

    #[test]
    fn weapons_tree_and_armor_orphan() {
        let layout = compute_layout(&weapons_and_armor(), &LayoutConfig::default()).unwrap();
        let names: Vec<&str> = layout.named_trees().map(|tree| tree.name.as_str()).collect();
        assert_eq!(names, vec!["Weapons"]);
        assert_eq!(layout.tree("Weapons").unwrap().members.len(), 3);
        let orphans = layout.orphans().unwrap();
        assert_eq!(orphans.members, vec!["armor"]);
        assert_eq!(layout.node("armor").unwrap().tree, "orphans");
        assert_eq!(layout.node("armor").unwrap().color, crate::theme::Rgb::grey());
    }

    #[test]
    fn pixels_follow_grid() {
        let config = LayoutConfig::default();
        let layout = compute_layout(&weapons_and_armor(), &config).unwrap();
        let w3 = layout.node("w3").unwrap();
        assert_eq!(w3.pos, GridPos { column: 2, lane: 0 });
        assert_eq!(w3.x, 2.0 * 250.0);
        assert_eq!(w3.y, 0.0);
        let armor = layout.node("armor").unwrap();
        assert_eq!(armor.y, armor.pos.lane as f32 * 60.0);
        assert!(layout.width >= w3.x + w3.width);
    }

    #[test]
    fn edges_take_prerequisite_colour() {
        let layout = compute_layout(&weapons_and_armor(), &LayoutConfig::default()).unwrap();
        let weapons = layout.tree("Weapons").unwrap().color;
        let first = layout.edges.iter().find(|edge| edge.from == "w1").unwrap();
        assert_eq!(first.to, "w2");
        assert_eq!(first.color, weapons.medium());
        let second = layout.edges.iter().find(|edge| edge.from == "w2").unwrap();
        assert_eq!(second.color, weapons.greyed());
        let w1 = layout.node("w1").unwrap();
        assert_eq!(first.start, w1.right_anchor());
    }

    #[test]
    fn cycles_are_broken_not_fatal() {
        let entities = vec![
            Entity::new("a", "Loop", &["c"]),
            Entity::new("b", "Loop", &["a"]),
            Entity::new("c", "Loop", &["b"]),
        ];
        let layout = compute_layout(&entities, &LayoutConfig::default()).unwrap();
        assert_eq!(layout.nodes.len(), 3);
        assert!(
            layout
                .diagnostics
                .iter()
                .any(|d| d.kind == DiagnosticKind::CycleBroken)
        );
    }

    #[test]
    fn every_cell_is_unique() {
        let mut entities = weapons_and_armor();
        entities.push(Entity::new("s1", "Shields", &["w1"]));
        entities.push(Entity::new("s2", "Shields", &["s1", "w2"]));
        entities.push(Entity::new("misc", "Misc", &[]));
        let layout = compute_layout(&entities, &LayoutConfig::default()).unwrap();
        let cells: HashSet<GridPos> = layout.nodes.iter().map(|node| node.pos).collect();
        assert_eq!(cells.len(), layout.nodes.len());
    }

    #[test]
    fn empty_input_gives_empty_layout() {
        let layout = compute_layout(&[], &LayoutConfig::default()).unwrap();
        assert!(layout.nodes.is_empty());
        assert_eq!(layout.trees.len(), 1);
        assert_eq!(layout.width, 0.0);
    }
}
