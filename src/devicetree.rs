//! Device ownership resolution.
//!
//! The hardware description is consumed through [`DeviceTreeView`]: an
//! ordered sequence of active nodes plus an ownership predicate. A device's
//! identifier is its zero-based position in that sequence. Identifiers are
//! never stored on the node, so they are recomputed identically on every run
//! over the same tree regardless of which task asks.

use std::fmt;

use log::debug;
use serde::Serialize;

use crate::task::TaskLabel;

/// Read-only view over a parsed hardware description.
pub trait DeviceTreeView {
    /// Opaque device node type.
    type Node;

    /// Returns the active nodes in a deterministic order.
    fn active_nodes(&self) -> Vec<&Self::Node>;

    /// Returns `true` when `node` is tagged as owned by the task `label`.
    fn is_owned_by(&self, node: &Self::Node, label: TaskLabel) -> bool;
}

/// Positional identifier of an active device node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct DeviceId(usize);

impl DeviceId {
    /// Creates an identifier from an active-node index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the active-node index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pairs every active node with its positional identifier.
pub fn enumerate_devices<V>(view: &V) -> Vec<(DeviceId, &V::Node)>
where
    V: DeviceTreeView + ?Sized,
{
    view.active_nodes()
        .into_iter()
        .enumerate()
        .map(|(index, node)| (DeviceId::new(index), node))
        .collect()
}

/// Returns the identifiers of the devices owned by `label`.
///
/// The result is sorted ascending with no duplicates, since nodes are
/// visited once in active-node order.
pub fn owned_devices<V>(view: &V, label: TaskLabel) -> Vec<DeviceId>
where
    V: DeviceTreeView + ?Sized,
{
    enumerate_devices(view)
        .into_iter()
        .filter(|(_, node)| view.is_owned_by(node, label))
        .map(|(id, _)| {
            debug!("device {id} owned by task {label}");
            id
        })
        .collect()
}

/// A device tree with no active nodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDevices;

impl DeviceTreeView for NoDevices {
    type Node = ();

    fn active_nodes(&self) -> Vec<&()> {
        Vec::new()
    }

    fn is_owned_by(&self, _node: &(), _label: TaskLabel) -> bool {
        false
    }
}
