use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub id: String,
    pub label: String,
    pub category: String,
    pub prerequisites: Vec<String>,
    pub finished: bool,
}

impl Entity {
    pub fn new(id: &str, category: &str, prerequisites: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            label: id.to_string(),
            category: category.to_string(),
            prerequisites: prerequisites.iter().map(|p| p.to_string()).collect(),
            finished: false,
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    pub fn finished(mut self, finished: bool) -> Self {
        self.finished = finished;
        self
    }

    /// Listing yourself as a prerequisite is the host convention for hiding
    /// an entity from the tree.
    pub fn is_hidden(&self) -> bool {
        self.prerequisites.iter().any(|p| p == &self.id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct EntitySet {
    pub entities: Vec<Entity>,
    index: HashMap<String, usize>,
}

impl EntitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false (and keeps the existing entry) when the id is taken.
    pub fn push(&mut self, entity: Entity) -> bool {
        if self.index.contains_key(&entity.id) {
            return false;
        }
        self.index.insert(entity.id.clone(), self.entities.len());
        self.entities.push(entity);
        true
    }

    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.index.get(id).map(|idx| &self.entities[*idx])
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn as_slice(&self) -> &[Entity] {
        &self.entities
    }
}
