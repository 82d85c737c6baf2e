use crate::layout::{Diagnostic, Layout};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<NodeDump>,
    pub trees: Vec<TreeDump>,
    pub edges: Vec<EdgeDump>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub label: String,
    pub tree: String,
    pub depth: usize,
    pub column: usize,
    pub lane: usize,
    pub x: f32,
    pub y: f32,
    pub color: String,
    pub finished: bool,
}

#[derive(Debug, Serialize)]
pub struct TreeDump {
    pub name: String,
    pub color: String,
    pub hue: Option<f32>,
    pub start_y: usize,
    pub width: usize,
    pub min_depth: usize,
    pub max_depth: usize,
    pub members: Vec<String>,
    pub orphans: bool,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub from: String,
    pub to: String,
    pub color: String,
    pub points: [[f32; 2]; 2],
}

impl LayoutDump {
    pub fn from_layout(layout: &Layout) -> Self {
        let nodes = layout
            .nodes
            .iter()
            .map(|node| NodeDump {
                id: node.id.clone(),
                label: node.label.clone(),
                tree: node.tree.clone(),
                depth: node.depth,
                column: node.pos.column,
                lane: node.pos.lane,
                x: node.x,
                y: node.y,
                color: node.color.to_hex(),
                finished: node.finished,
            })
            .collect();

        let trees = layout
            .trees
            .iter()
            .map(|tree| TreeDump {
                name: tree.name.clone(),
                color: tree.color.to_hex(),
                hue: tree.hue,
                start_y: tree.start_y,
                width: tree.width,
                min_depth: tree.min_depth,
                max_depth: tree.max_depth,
                members: tree.members.clone(),
                orphans: tree.is_orphans,
            })
            .collect();

        let edges = layout
            .edges
            .iter()
            .map(|edge| EdgeDump {
                from: edge.from.clone(),
                to: edge.to.clone(),
                color: edge.color.to_hex(),
                points: [[edge.start.0, edge.start.1], [edge.end.0, edge.end.1]],
            })
            .collect();

        LayoutDump {
            width: layout.width,
            height: layout.height,
            nodes,
            trees,
            edges,
            diagnostics: layout.diagnostics.clone(),
        }
    }
}

pub fn layout_dump_json(layout: &Layout) -> anyhow::Result<String> {
    let dump = LayoutDump::from_layout(layout);
    Ok(serde_json::to_string_pretty(&dump)?)
}

pub fn write_layout_dump(path: &Path, layout: &Layout) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
