// In-memory catalog held for one configurator session
use crate::model::{ConfigData, Machine, Spec, SpecCategory};
use std::collections::HashMap;
use tracing::{debug, info};

/// Specs indexed by `(category, name)`.
#[derive(Debug, Clone, Default)]
pub struct SpecIndex {
    by_key: HashMap<(SpecCategory, String), Spec>,
}

impl SpecIndex {
    pub fn new(specs: &[Spec]) -> Self {
        let mut by_key = HashMap::new();
        for spec in specs {
            match SpecCategory::parse(&spec.category) {
                Some(category) => {
                    by_key.insert((category, spec.name.clone()), spec.clone());
                }
                None => debug!("Ignoring spec {} with category {:?}", spec.name, spec.category),
            }
        }
        Self { by_key }
    }

    pub fn get(&self, category: SpecCategory, name: &str) -> Option<&Spec> {
        self.by_key.get(&(category, name.to_string()))
    }

    pub fn contains(&self, category: SpecCategory, name: &str) -> bool {
        self.by_key.contains_key(&(category, name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub machines: Vec<Machine>,
    pub specs: SpecIndex,
    pub version: Option<String>,
}

impl Catalog {
    pub fn from_data(data: &ConfigData) -> Self {
        info!("📦 Loaded machines: {}", data.machines.len());
        for m in &data.machines {
            if let Some(designs) = m.designs() {
                debug!(
                    "Machine {} ({}) has design_images: {:?}",
                    m.id,
                    m.name,
                    designs.frame_colors().collect::<Vec<_>>()
                );
            }
        }
        Self {
            machines: data.machines.clone(),
            specs: SpecIndex::new(&data.specs),
            version: data.version.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }

    pub fn machine(&self, id: i64) -> Option<&Machine> {
        self.machines.iter().find(|m| m.id == id)
    }
}
