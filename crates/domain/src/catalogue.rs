use std::collections::{HashMap, HashSet};

use qryvanta_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Static permission catalogue definition, usually read from JSON.
///
/// Entries may nest through `children` or reference a parent through
/// `parent_id`; both forms flatten into the same arena.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogueDefinition {
    /// Top-level entries in display order.
    pub permissions: Vec<CatalogueEntry>,
}

/// One entry of a catalogue definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogueEntry {
    /// Stable permission identifier.
    pub id: String,
    /// Human-readable label.
    pub label: String,
    /// Explicit parent reference for flat definitions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Nested child entries in display order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CatalogueEntry>,
}

impl CatalogueEntry {
    /// Creates a leaf entry without an explicit parent.
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            parent_id: None,
            children: Vec::new(),
        }
    }

    /// Sets the explicit parent reference.
    #[must_use]
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Appends nested child entries.
    #[must_use]
    pub fn with_children(mut self, children: Vec<CatalogueEntry>) -> Self {
        self.children.extend(children);
        self
    }
}

/// Validates the syntax of a permission identifier.
///
/// Identifiers are dot- or slash-segmented, contain no whitespace and no empty
/// segment.
pub fn validate_permission_id(value: &str) -> AppResult<()> {
    if value.is_empty() {
        return Err(AppError::Validation(
            "permission id must not be empty".to_owned(),
        ));
    }

    if value.chars().any(char::is_whitespace) {
        return Err(AppError::Validation(format!(
            "permission id '{value}' must not contain whitespace"
        )));
    }

    if value.split(['.', '/']).any(str::is_empty) {
        return Err(AppError::Validation(format!(
            "permission id '{value}' contains an empty segment"
        )));
    }

    Ok(())
}

/// Catalogue node stored in the arena.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionNode {
    id: String,
    label: String,
    parent_id: Option<String>,
    children: Vec<String>,
}

impl PermissionNode {
    /// Returns the stable permission identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Returns the display label.
    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_str()
    }

    /// Returns the enclosing node id, if any.
    #[must_use]
    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    /// Returns child ids in display order.
    #[must_use]
    pub fn children(&self) -> &[String] {
        &self.children
    }
}

/// Nested read-only view of one catalogue subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionTreeNode {
    /// Stable permission identifier.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Child subtrees in display order.
    pub children: Vec<PermissionTreeNode>,
}

/// Partition of permission ids into known and unknown ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Ids present in the catalogue, in input order.
    pub valid_ids: Vec<String>,
    /// Ids absent from the catalogue, in input order.
    pub invalid_ids: Vec<String>,
}

impl ValidationResult {
    /// Returns whether every input id is known.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.invalid_ids.is_empty()
    }
}

/// Immutable permission forest built from a definition.
///
/// Nodes live in an arena indexed by id. The value is never mutated after
/// [`PermissionCatalogue::load`]; reloads build a new catalogue.
#[derive(Debug, Clone)]
pub struct PermissionCatalogue {
    version: u64,
    fingerprint: String,
    nodes: Vec<PermissionNode>,
    index: HashMap<String, usize>,
    preorder: Vec<String>,
    tree: Vec<PermissionTreeNode>,
}

struct FlatEntry {
    id: String,
    label: String,
    parent_id: Option<String>,
}

impl PermissionCatalogue {
    /// Builds a catalogue from a definition.
    ///
    /// Fails with [`AppError::CatalogueLoad`] on malformed ids or labels,
    /// duplicate ids, dangling parents, or cycles.
    pub fn load(definition: &CatalogueDefinition, version: u64) -> AppResult<Self> {
        let mut flat = Vec::new();
        for entry in &definition.permissions {
            flatten_entry(entry, None, &mut flat)?;
        }

        let mut index = HashMap::with_capacity(flat.len());
        for (position, entry) in flat.iter().enumerate() {
            validate_permission_id(entry.id.as_str())
                .map_err(|error| AppError::CatalogueLoad(error.to_string()))?;
            if entry.label.trim().is_empty() {
                return Err(AppError::CatalogueLoad(format!(
                    "permission '{}' has an empty label",
                    entry.id
                )));
            }
            if index.insert(entry.id.clone(), position).is_some() {
                return Err(AppError::CatalogueLoad(format!(
                    "duplicate permission id '{}'",
                    entry.id
                )));
            }
        }

        let mut nodes: Vec<PermissionNode> = flat
            .iter()
            .map(|entry| PermissionNode {
                id: entry.id.clone(),
                label: entry.label.clone(),
                parent_id: entry.parent_id.clone(),
                children: Vec::new(),
            })
            .collect();

        let mut roots = Vec::new();
        for (position, entry) in flat.iter().enumerate() {
            let Some(parent_id) = entry.parent_id.as_deref() else {
                roots.push(position);
                continue;
            };

            let parent_position = index.get(parent_id).copied().ok_or_else(|| {
                AppError::CatalogueLoad(format!(
                    "permission '{}' references unknown parent '{parent_id}'",
                    entry.id
                ))
            })?;
            if parent_position == position {
                return Err(AppError::CatalogueLoad(format!(
                    "permission '{}' cannot be its own parent",
                    entry.id
                )));
            }
            nodes[parent_position].children.push(entry.id.clone());
        }

        let preorder = preorder_ids(&nodes, &index, &roots);
        if preorder.len() != nodes.len() {
            let reachable: HashSet<&str> = preorder.iter().map(String::as_str).collect();
            let cyclic: Vec<&str> = nodes
                .iter()
                .map(PermissionNode::id)
                .filter(|id| !reachable.contains(id))
                .collect();
            return Err(AppError::CatalogueLoad(format!(
                "permission hierarchy contains a cycle through: {}",
                cyclic.join(", ")
            )));
        }

        let tree = roots
            .iter()
            .map(|position| build_tree(&nodes, &index, *position))
            .collect();

        let fingerprint = fingerprint_ids(&preorder);

        Ok(Self {
            version,
            fingerprint,
            nodes,
            index,
            preorder,
            tree,
        })
    }

    /// Returns the load version of this snapshot.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the sha256 hex digest of the sorted permission ids.
    ///
    /// Equal id sets yield equal fingerprints in every process, whatever the
    /// load version.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        self.fingerprint.as_str()
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether the catalogue has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the forest in definition order.
    #[must_use]
    pub fn tree(&self) -> &[PermissionTreeNode] {
        &self.tree
    }

    /// Returns every id depth-first, parents before children.
    #[must_use]
    pub fn all(&self) -> &[String] {
        &self.preorder
    }

    /// Returns whether the id is part of the catalogue.
    #[must_use]
    pub fn exists(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Returns one node by id.
    pub fn node(&self, id: &str) -> AppResult<&PermissionNode> {
        self.index
            .get(id)
            .map(|position| &self.nodes[*position])
            .ok_or_else(|| AppError::NotFound(format!("permission '{id}' does not exist")))
    }

    /// Partitions ids into known and unknown ids.
    ///
    /// Input order is kept inside each partition; repeated ids are reported
    /// once.
    #[must_use]
    pub fn validate<I, S>(&self, ids: I) -> ValidationResult
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut result = ValidationResult::default();

        for id in ids {
            let id = id.as_ref();
            if !seen.insert(id.to_owned()) {
                continue;
            }
            if self.exists(id) {
                result.valid_ids.push(id.to_owned());
            } else {
                result.invalid_ids.push(id.to_owned());
            }
        }

        result
    }
}

fn fingerprint_ids(ids: &[String]) -> String {
    let mut sorted: Vec<&str> = ids.iter().map(String::as_str).collect();
    sorted.sort_unstable();

    let mut hasher = Sha256::new();
    for id in sorted {
        hasher.update(id.as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

fn flatten_entry(
    entry: &CatalogueEntry,
    enclosing_id: Option<&str>,
    flat: &mut Vec<FlatEntry>,
) -> AppResult<()> {
    let parent_id = match (entry.parent_id.as_deref(), enclosing_id) {
        (Some(explicit), Some(enclosing)) if explicit != enclosing => {
            return Err(AppError::CatalogueLoad(format!(
                "permission '{}' declares parent '{explicit}' but is nested under '{enclosing}'",
                entry.id
            )));
        }
        (Some(explicit), _) => Some(explicit.to_owned()),
        (None, enclosing) => enclosing.map(ToOwned::to_owned),
    };

    flat.push(FlatEntry {
        id: entry.id.clone(),
        label: entry.label.clone(),
        parent_id,
    });

    for child in &entry.children {
        flatten_entry(child, Some(entry.id.as_str()), flat)?;
    }

    Ok(())
}

fn preorder_ids(
    nodes: &[PermissionNode],
    index: &HashMap<String, usize>,
    roots: &[usize],
) -> Vec<String> {
    let mut ordered = Vec::with_capacity(nodes.len());
    let mut stack: Vec<usize> = roots.iter().rev().copied().collect();

    while let Some(position) = stack.pop() {
        let node = &nodes[position];
        ordered.push(node.id.clone());
        for child_id in node.children.iter().rev() {
            if let Some(child_position) = index.get(child_id) {
                stack.push(*child_position);
            }
        }
    }

    ordered
}

fn build_tree(
    nodes: &[PermissionNode],
    index: &HashMap<String, usize>,
    position: usize,
) -> PermissionTreeNode {
    let node = &nodes[position];
    PermissionTreeNode {
        id: node.id.clone(),
        label: node.label.clone(),
        children: node
            .children
            .iter()
            .filter_map(|child_id| index.get(child_id))
            .map(|child_position| build_tree(nodes, index, *child_position))
            .collect(),
    }
}
