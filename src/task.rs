//! Task descriptor synthesis.
//!
//! Configuration keys are routed by reserved prefixes: `CONFIG_TASK_*`
//! entries become scalar task fields and `CONFIG_CAP_*` entries become
//! granted capabilities. The `label` field identifies the task and selects
//! the devices it owns in the hardware description.

use std::fmt;

use indexmap::IndexMap;
use log::{debug, warn};
use serde::Serialize;

use crate::config::Config;
use crate::devicetree::{DeviceId, DeviceTreeView, owned_devices};
use crate::error::{MetadataError, Result};

/// Prefix shared by every KConfig symbol.
pub const CONFIG_PREFIX: &str = "CONFIG_";

/// Prefix (after [`CONFIG_PREFIX`]) of scalar task fields.
pub const TASK_PREFIX: &str = "TASK_";

/// Prefix (after [`CONFIG_PREFIX`]) of capability grants.
pub const CAPABILITY_PREFIX: &str = "CAP_";

/// Name of the mandatory task field holding the hexadecimal task label.
pub const LABEL_FIELD: &str = "label";

/// Field names the descriptor itself owns; task fields may not shadow them.
const RESERVED_FIELDS: [&str; 2] = ["capabilities", "devs"];

/// Routing decision for a configuration key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyClass<'a> {
    /// A scalar task field; holds the key suffix after `CONFIG_TASK_`.
    TaskField(&'a str),
    /// A capability grant; holds the key suffix after `CONFIG_CAP_`.
    Capability(&'a str),
    /// Any other key.
    Ignored,
}

impl<'a> KeyClass<'a> {
    /// Classifies a configuration key.
    ///
    /// # Examples
    ///
    /// ```
    /// use outpost_metadata::task::KeyClass;
    ///
    /// assert_eq!(KeyClass::of("CONFIG_TASK_LABEL"), KeyClass::TaskField("LABEL"));
    /// assert_eq!(KeyClass::of("CONFIG_CAP_GPIO"), KeyClass::Capability("GPIO"));
    /// assert_eq!(KeyClass::of("CONFIG_DEBUG"), KeyClass::Ignored);
    /// ```
    #[must_use]
    pub fn of(key: &'a str) -> Self {
        let Some(symbol) = key.strip_prefix(CONFIG_PREFIX) else {
            return Self::Ignored;
        };

        if let Some(field) = symbol.strip_prefix(TASK_PREFIX) {
            Self::TaskField(field)
        } else if let Some(capability) = symbol.strip_prefix(CAPABILITY_PREFIX) {
            Self::Capability(capability)
        } else {
            Self::Ignored
        }
    }
}

/// Numeric task identity, parsed from the hexadecimal `label` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskLabel(u32);

impl TaskLabel {
    /// Wraps a numeric label.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the numeric label.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Parses a base-16 label, with or without a `0x` prefix.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::MissingOrInvalidLabel`] if the text is not a
    /// hexadecimal integer fitting in 32 bits.
    ///
    /// # Examples
    ///
    /// ```
    /// use outpost_metadata::task::TaskLabel;
    ///
    /// assert_eq!(TaskLabel::parse_hex("2A")?.value(), 42);
    /// assert_eq!(TaskLabel::parse_hex("0x1")?.value(), 1);
    /// assert!(TaskLabel::parse_hex("zz").is_err());
    /// # Ok::<(), outpost_metadata::error::MetadataError>(())
    /// ```
    pub fn parse_hex(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        u32::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|err| MetadataError::MissingOrInvalidLabel {
                reason: format!("`{text}` is not a hexadecimal integer ({err})"),
            })
    }
}

impl fmt::Display for TaskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// The `task` sub-document of the package metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskDescriptor {
    #[serde(flatten)]
    fields: IndexMap<String, String>,
    capabilities: Vec<String>,
    devs: Vec<DeviceId>,
    #[serde(skip)]
    label: TaskLabel,
}

impl TaskDescriptor {
    /// Scalar task fields in configuration order.
    #[must_use]
    pub fn fields(&self) -> &IndexMap<String, String> {
        &self.fields
    }

    /// Returns a scalar task field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Granted capabilities in configuration order, duplicates retained.
    #[must_use]
    pub fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    /// Identifiers of the devices owned by this task, ascending.
    #[must_use]
    pub fn devs(&self) -> &[DeviceId] {
        &self.devs
    }

    /// The parsed task label.
    #[must_use]
    pub fn label(&self) -> TaskLabel {
        self.label
    }
}

/// Derives the task descriptor from configuration and the device tree.
///
/// Shared memory regions and DMA channels are not part of the device list.
///
/// # Errors
///
/// Returns [`MetadataError::MissingOrInvalidLabel`] when no `label` task
/// field exists or it is not hexadecimal.
pub fn build_task<V>(config: &Config, view: &V) -> Result<TaskDescriptor>
where
    V: DeviceTreeView + ?Sized,
{
    let mut fields = IndexMap::new();
    let mut capabilities = Vec::new();

    for (key, value) in config {
        match KeyClass::of(key) {
            KeyClass::TaskField(suffix) => {
                let name = suffix.to_lowercase();
                if RESERVED_FIELDS.contains(&name.as_str()) {
                    warn!("ignoring {key}: `{name}` is reserved in the task descriptor");
                    continue;
                }
                fields.insert(name, value.to_string().to_lowercase());
            }
            KeyClass::Capability(suffix) => capabilities.push(suffix.to_lowercase()),
            KeyClass::Ignored => {}
        }
    }

    let label = fields
        .get(LABEL_FIELD)
        .ok_or_else(|| MetadataError::MissingOrInvalidLabel {
            reason: format!("no {CONFIG_PREFIX}{TASK_PREFIX}LABEL entry in configuration"),
        })
        .and_then(|text| TaskLabel::parse_hex(text))?;

    debug!(
        "task {label}: {} field(s), {} capability grant(s)",
        fields.len(),
        capabilities.len()
    );

    let devs = owned_devices(view, label);

    Ok(TaskDescriptor {
        fields,
        capabilities,
        devs,
        label,
    })
}
