//! Template groups and the variation library built from them

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::template::RoomTemplate;
use crate::error::{LayoutError, Result};

/// One template in a group with its quantity bounds for a single layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateGroupEntry {
    pub template: Arc<RoomTemplate>,
    /// Entries below this count are tried before the others
    pub min_quantity: u32,
    /// Entries at this count are no longer drawn
    pub max_quantity: u32,
}

/// Named pools of interchangeable templates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateGroups {
    groups: BTreeMap<String, Vec<TemplateGroupEntry>>,
}

impl TemplateGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a template with no quantity bounds
    pub fn add(&mut self, group: impl Into<String>, template: RoomTemplate) -> Result<()> {
        self.add_entry(group, template, 0, u32::MAX)
    }

    /// Add a template with quantity bounds
    ///
    /// The template is validated first; malformed templates never reach
    /// the placement engine.
    pub fn add_entry(
        &mut self,
        group: impl Into<String>,
        template: RoomTemplate,
        min_quantity: u32,
        max_quantity: u32,
    ) -> Result<()> {
        template.validate()?;
        if min_quantity > max_quantity {
            return Err(LayoutError::InvalidQuantity {
                template: template.name.clone(),
                min: min_quantity,
                max: max_quantity,
            });
        }
        self.groups
            .entry(group.into())
            .or_default()
            .push(TemplateGroupEntry {
                template: Arc::new(template),
                min_quantity,
                max_quantity,
            });
        Ok(())
    }

    pub fn group(&self, name: &str) -> Option<&[TemplateGroupEntry]> {
        self.groups.get(name).map(|v| v.as_slice())
    }

    /// Group names in ascending order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(|k| k.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.groups.values().all(|v| v.is_empty())
    }
}

/// Dense index of one template variation in a [`TemplateLibrary`]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TemplateKey(pub usize);

/// Identifies the group entry a variation came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryRef {
    pub group: usize,
    pub entry: usize,
}

#[derive(Debug, Clone)]
struct LibraryGroup {
    name: String,
    /// Per entry: quantity bounds and variation keys
    entries: Vec<(u32, u32, Vec<TemplateKey>)>,
}

/// Every unique variation of every template in a set of groups
///
/// Variations are numbered once, in group-name then entry order, so keys
/// are stable for a given [`TemplateGroups`] value.
#[derive(Debug, Clone)]
pub struct TemplateLibrary {
    variations: Vec<(Arc<RoomTemplate>, EntryRef)>,
    groups: Vec<LibraryGroup>,
}

impl TemplateLibrary {
    pub fn build(groups: &TemplateGroups) -> Self {
        let mut variations = Vec::new();
        let mut library_groups = Vec::new();

        for (group_index, (name, entries)) in groups.groups.iter().enumerate() {
            let mut library_entries = Vec::with_capacity(entries.len());
            for (entry_index, entry) in entries.iter().enumerate() {
                let origin = EntryRef {
                    group: group_index,
                    entry: entry_index,
                };
                let keys = entry
                    .template
                    .unique_variations()
                    .into_iter()
                    .map(|variation| {
                        variations.push((Arc::new(variation), origin));
                        TemplateKey(variations.len() - 1)
                    })
                    .collect();
                library_entries.push((entry.min_quantity, entry.max_quantity, keys));
            }
            library_groups.push(LibraryGroup {
                name: name.clone(),
                entries: library_entries,
            });
        }

        Self {
            variations,
            groups: library_groups,
        }
    }

    pub fn len(&self) -> usize {
        self.variations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variations.is_empty()
    }

    pub fn template(&self, key: TemplateKey) -> Option<&Arc<RoomTemplate>> {
        self.variations.get(key.0).map(|(t, _)| t)
    }

    pub fn origin(&self, key: TemplateKey) -> Option<EntryRef> {
        self.variations.get(key.0).map(|(_, e)| *e)
    }

    pub fn group_index(&self, name: &str) -> Option<usize> {
        self.groups.iter().position(|g| g.name == name)
    }

    /// Whether `name` is a group with at least one template
    pub fn has_group(&self, name: &str) -> bool {
        self.group_index(name)
            .is_some_and(|g| !self.groups[g].entries.is_empty())
    }

    /// Variations of a group split by priority, given current usage counts
    ///
    /// The first list holds variations of entries still below their minimum,
    /// the second those of the other entries below their maximum. Entries at
    /// their maximum are left out.
    pub fn eligible(
        &self,
        group: usize,
        usage: &BTreeMap<EntryRef, u32>,
    ) -> (Vec<TemplateKey>, Vec<TemplateKey>) {
        let mut preferred = Vec::new();
        let mut others = Vec::new();
        let Some(library_group) = self.groups.get(group) else {
            return (preferred, others);
        };
        for (entry, (min, max, keys)) in library_group.entries.iter().enumerate() {
            let used = usage.get(&EntryRef { group, entry }).copied().unwrap_or(0);
            if used >= *max {
                continue;
            }
            if used < *min {
                preferred.extend_from_slice(keys);
            } else {
                others.extend_from_slice(keys);
            }
        }
        (preferred, others)
    }
}
