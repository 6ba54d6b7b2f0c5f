//! Device tree export.
//!
//! The generator reads the hardware description as a JSON export of the
//! device tree: an array of node objects in tree order, each carrying its
//! `path`, an optional `status` and an optional `outpost,owner` property
//! naming the label of the owning task. Other properties are ignored.
//!
//! ```json
//! [
//!   {"path": "/soc/usart@40011000", "status": "okay", "outpost,owner": "0x1"},
//!   {"path": "/soc/i2c@40005400", "status": "disabled"}
//! ]
//! ```

use camino::Utf8Path;
use log::debug;
use outpost_metadata::{DeviceTreeView, TaskLabel};
use serde::Deserialize;

use crate::error::{GeneratorError, Result};

/// Status values of an enabled node; a node without status is enabled too.
const ACTIVE_STATUSES: [&str; 2] = ["okay", "ok"];

#[derive(Debug, Deserialize)]
struct RawNode {
    path: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(rename = "outpost,owner", default)]
    owner: Option<RawOwner>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawOwner {
    Number(u32),
    Text(String),
}

/// A device tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceNode {
    path: String,
    active: bool,
    owner: Option<TaskLabel>,
}

impl DeviceNode {
    /// Full node path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether the node is enabled in the target build.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Label of the owning task, if any.
    #[must_use]
    pub fn owner(&self) -> Option<TaskLabel> {
        self.owner
    }
}

impl TryFrom<RawNode> for DeviceNode {
    type Error = String;

    fn try_from(raw: RawNode) -> std::result::Result<Self, Self::Error> {
        let active = raw
            .status
            .as_deref()
            .is_none_or(|status| ACTIVE_STATUSES.contains(&status));

        let owner = match raw.owner {
            None => None,
            Some(RawOwner::Number(value)) => Some(TaskLabel::new(value)),
            Some(RawOwner::Text(text)) => Some(
                TaskLabel::parse_hex(&text)
                    .map_err(|err| format!("node {}: outpost,owner: {err}", raw.path))?,
            ),
        };

        Ok(Self {
            path: raw.path,
            active,
            owner,
        })
    }
}

/// A device tree loaded from its JSON export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceTree {
    nodes: Vec<DeviceNode>,
}

impl DeviceTree {
    /// Reads and parses a device tree export.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::DeviceTree`] if the file cannot be read or
    /// is not a valid export.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|err| GeneratorError::DeviceTree {
            path: path.to_owned(),
            reason: err.to_string(),
        })?;

        let tree = Self::parse(&source).map_err(|reason| GeneratorError::DeviceTree {
            path: path.to_owned(),
            reason,
        })?;
        debug!(
            "{path}: {} node(s), {} active",
            tree.nodes.len(),
            tree.active_nodes().len()
        );
        Ok(tree)
    }

    /// Parses a device tree export.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem if the text is not a JSON array
    /// of nodes or an owner label is not hexadecimal.
    pub fn parse(source: &str) -> std::result::Result<Self, String> {
        let raw: Vec<RawNode> = serde_json::from_str(source).map_err(|err| err.to_string())?;
        let nodes = raw
            .into_iter()
            .map(DeviceNode::try_from)
            .collect::<std::result::Result<_, _>>()?;
        Ok(Self { nodes })
    }

    /// All nodes, in tree order.
    #[must_use]
    pub fn nodes(&self) -> &[DeviceNode] {
        &self.nodes
    }
}

impl DeviceTreeView for DeviceTree {
    type Node = DeviceNode;

    fn active_nodes(&self) -> Vec<&DeviceNode> {
        self.nodes.iter().filter(|node| node.active).collect()
    }

    fn is_owned_by(&self, node: &DeviceNode, label: TaskLabel) -> bool {
        node.owner == Some(label)
    }
}
