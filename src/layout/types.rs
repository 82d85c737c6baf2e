use serde::Serialize;

use crate::theme::Rgb;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreeRef {
    /// Index into the ordered list of named trees.
    Named(usize),
    Orphans,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub key: String,
    pub label: String,
    pub category: String,
    pub finished: bool,
    pub prerequisites: Vec<NodeId>,
    pub depth: usize,
    /// Grid column; equals `depth` except for nodes in the isolated grid.
    pub column: usize,
    /// `None` until the node has been placed.
    pub lane: Option<usize>,
    pub tree: Option<TreeRef>,
}

impl Node {
    pub fn new(id: NodeId, key: &str, label: &str, category: &str, finished: bool) -> Self {
        Self {
            id,
            key: key.to_string(),
            label: label.to_string(),
            category: category.to_string(),
            finished,
            prerequisites: Vec::new(),
            depth: 0,
            column: 0,
            lane: None,
            tree: None,
        }
    }

    pub fn place(&mut self, column: usize, lane: usize) {
        self.column = column;
        self.lane = Some(lane);
    }
}

#[derive(Debug, Clone)]
pub struct Tree {
    pub name: String,
    /// Every member, trunk included.
    pub leaves: Vec<NodeId>,
    pub trunk: Vec<NodeId>,
    pub color: Rgb,
    /// Hue in `0.0..=1.0`; `None` for the orphan tree.
    pub hue: Option<f32>,
    pub start_y: usize,
    pub width: usize,
    pub min_depth: usize,
    pub max_depth: usize,
}

impl Tree {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            leaves: Vec::new(),
            trunk: Vec::new(),
            color: Rgb::grey(),
            hue: None,
            start_y: 0,
            width: 0,
            min_depth: 0,
            max_depth: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticKind {
    /// A prerequisite id that matches no entity.
    MalformedInput,
    /// A prerequisite that points at a hidden entity.
    HiddenReference,
    HiddenEntity,
    RedundantPrerequisite,
    /// A prerequisite edge dropped because it closed a loop.
    CycleBroken,
    /// A repeated entity id; the first record wins.
    DuplicateId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub entity: String,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GridPos {
    pub column: usize,
    pub lane: usize,
}

#[derive(Debug, Clone)]
pub struct NodeLayout {
    pub id: String,
    pub label: String,
    pub tree: String,
    pub depth: usize,
    pub pos: GridPos,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub color: Rgb,
    pub finished: bool,
}

impl NodeLayout {
    pub fn left_anchor(&self) -> (f32, f32) {
        (self.x, self.y + self.height / 2.0)
    }

    pub fn right_anchor(&self) -> (f32, f32) {
        (self.x + self.width, self.y + self.height / 2.0)
    }
}

#[derive(Debug, Clone)]
pub struct TreeLayout {
    pub name: String,
    pub color: Rgb,
    pub hue: Option<f32>,
    pub start_y: usize,
    pub width: usize,
    pub min_depth: usize,
    pub max_depth: usize,
    pub members: Vec<String>,
    pub trunk: Vec<String>,
    pub is_orphans: bool,
}

#[derive(Debug, Clone)]
pub struct EdgeLayout {
    /// The prerequisite.
    pub from: String,
    /// The dependent.
    pub to: String,
    pub start: (f32, f32),
    pub end: (f32, f32),
    pub color: Rgb,
}

#[derive(Debug, Clone, Default)]
pub struct Layout {
    /// In forest order (input order minus hidden entities).
    pub nodes: Vec<NodeLayout>,
    /// Named trees in display order, followed by the orphan tree.
    pub trees: Vec<TreeLayout>,
    pub edges: Vec<EdgeLayout>,
    pub diagnostics: Vec<Diagnostic>,
    pub width: f32,
    pub height: f32,
}

impl Layout {
    pub fn node(&self, id: &str) -> Option<&NodeLayout> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn tree(&self, name: &str) -> Option<&TreeLayout> {
        self.trees.iter().find(|tree| tree.name == name)
    }

    pub fn named_trees(&self) -> impl Iterator<Item = &TreeLayout> {
        self.trees.iter().filter(|tree| !tree.is_orphans)
    }

    pub fn orphans(&self) -> Option<&TreeLayout> {
        self.trees.iter().find(|tree| tree.is_orphans)
    }
}
