use std::collections::{HashMap, HashSet};

use crate::ir::Entity;

use super::types::{Diagnostic, DiagnosticKind, Node, NodeId};

/// Node arena for one layout run. Prerequisite edges are owned by the nodes;
/// dependents are a derived index that is rebuilt whenever those edges change.
#[derive(Debug, Clone, Default)]
pub struct Forest {
    nodes: Vec<Node>,
    index: HashMap<String, NodeId>,
    dependents: Vec<Vec<NodeId>>,
}

impl Forest {
    /// Builds the forest from raw entities: hidden entities are dropped,
    /// transitive prerequisites pruned and dependents derived. Depths are
    /// left at zero, see `ranking::assign_depths`.
    pub fn build(entities: &[Entity], diagnostics: &mut Vec<Diagnostic>) -> Forest {
        let mut entity_index: HashMap<&str, usize> = HashMap::new();
        let mut unique: Vec<&Entity> = Vec::with_capacity(entities.len());
        for entity in entities {
            if entity_index.contains_key(entity.id.as_str()) {
                tracing::warn!(entity = %entity.id, "duplicate entity id, keeping the first record");
                diagnostics.push(Diagnostic {
                    kind: DiagnosticKind::DuplicateId,
                    entity: entity.id.clone(),
                    detail: "repeated id ignored".to_string(),
                });
                continue;
            }
            entity_index.insert(entity.id.as_str(), unique.len());
            unique.push(entity);
        }

        // Raw prerequisite lists over every entity, hidden ones included, so
        // that reachability matches what the host database reports.
        let mut raw: Vec<Vec<usize>> = Vec::with_capacity(unique.len());
        for entity in &unique {
            let mut list: Vec<usize> = Vec::new();
            for prereq in &entity.prerequisites {
                if prereq == &entity.id {
                    continue;
                }
                match entity_index.get(prereq.as_str()) {
                    Some(idx) => {
                        if !list.contains(idx) {
                            list.push(*idx);
                        }
                    }
                    None => {
                        tracing::warn!(
                            entity = %entity.id,
                            prerequisite = %prereq,
                            "unknown prerequisite dropped"
                        );
                        diagnostics.push(Diagnostic {
                            kind: DiagnosticKind::MalformedInput,
                            entity: entity.id.clone(),
                            detail: format!("unknown prerequisite `{prereq}`"),
                        });
                    }
                }
            }
            raw.push(list);
        }

        let mut forest = Forest::default();
        let mut node_of: Vec<Option<NodeId>> = vec![None; unique.len()];
        for (idx, entity) in unique.iter().enumerate() {
            if entity.is_hidden() {
                tracing::debug!(entity = %entity.id, "hidden entity excluded from the tree");
                diagnostics.push(Diagnostic {
                    kind: DiagnosticKind::HiddenEntity,
                    entity: entity.id.clone(),
                    detail: "lists itself as a prerequisite".to_string(),
                });
                continue;
            }
            let id = forest.push(Node::new(
                NodeId(0),
                &entity.id,
                &entity.label,
                &entity.category,
                entity.finished,
            ));
            node_of[idx] = Some(id);
        }

        for (idx, entity) in unique.iter().enumerate() {
            let Some(node_id) = node_of[idx] else {
                continue;
            };
            let direct = &raw[idx];
            let start: Vec<usize> = direct.iter().flat_map(|p| raw[*p].iter().copied()).collect();
            let ancestors = reachable(&start, &raw);

            let mut kept = Vec::new();
            for prereq in direct {
                if ancestors.contains(prereq) {
                    let looped = reachable(&raw[*prereq], &raw).contains(prereq);
                    if looped {
                        tracing::warn!(
                            entity = %entity.id,
                            prerequisite = %unique[*prereq].id,
                            "prerequisite closes a cycle, edge dropped"
                        );
                    } else {
                        tracing::debug!(
                            entity = %entity.id,
                            prerequisite = %unique[*prereq].id,
                            "redundant prerequisite removed"
                        );
                    }
                    diagnostics.push(Diagnostic {
                        kind: if looped {
                            DiagnosticKind::CycleBroken
                        } else {
                            DiagnosticKind::RedundantPrerequisite
                        },
                        entity: entity.id.clone(),
                        detail: format!("prerequisite `{}` dropped", unique[*prereq].id),
                    });
                    continue;
                }
                match node_of[*prereq] {
                    Some(prereq_node) => kept.push(prereq_node),
                    None => {
                        tracing::debug!(
                            entity = %entity.id,
                            prerequisite = %unique[*prereq].id,
                            "link to hidden entity dropped"
                        );
                        diagnostics.push(Diagnostic {
                            kind: DiagnosticKind::HiddenReference,
                            entity: entity.id.clone(),
                            detail: format!("prerequisite `{}` is hidden", unique[*prereq].id),
                        });
                    }
                }
            }
            forest.nodes[node_id.0].prerequisites = kept;
        }

        forest.rebuild_dependents();
        forest
    }

    pub(crate) fn push(&mut self, mut node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.id = id;
        self.index.insert(node.key.clone(), id);
        self.nodes.push(node);
        self.dependents.push(Vec::new());
        id
    }

    pub fn set_prerequisites(&mut self, id: NodeId, prerequisites: Vec<NodeId>) {
        self.nodes[id.0].prerequisites = prerequisites;
        self.rebuild_dependents();
    }

    pub(crate) fn rebuild_dependents(&mut self) {
        self.dependents = vec![Vec::new(); self.nodes.len()];
        for node in &self.nodes {
            for prereq in &node.prerequisites {
                self.dependents[prereq.0].push(node.id);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + use<> {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn lookup(&self, key: &str) -> Option<NodeId> {
        self.index.get(key).copied()
    }

    pub fn parents(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].prerequisites
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.dependents[id.0]
    }

    pub fn has_links(&self, id: NodeId) -> bool {
        !self.parents(id).is_empty() || !self.children(id).is_empty()
    }
}

fn reachable(start: &[usize], raw: &[Vec<usize>]) -> HashSet<usize> {
    let mut seen: HashSet<usize> = HashSet::new();
    let mut stack: Vec<usize> = start.to_vec();
    while let Some(next) = stack.pop() {
        if !seen.insert(next) {
            continue;
        }
        stack.extend(raw[next].iter().copied());
    }
    seen
}
