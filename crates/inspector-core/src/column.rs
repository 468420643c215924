//! Column templates and resolved column values

use serde::{Deserialize, Serialize};

/// Column name used when a single command replaces the configured columns
pub const OUTPUT_COLUMN: &str = "Output";

/// A named unit of work whose result becomes one cell of a host's row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Display label
    pub name: String,
    /// Shell command; empty means the column carries a static value
    #[serde(default)]
    pub command: String,
    /// Computed but not displayed in the table
    #[serde(default)]
    pub hide: bool,
    /// Static value for commandless columns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ColumnSpec {
    /// Column running `command`
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            hide: false,
            value: None,
        }
    }

    /// Commandless column that always resolves to `value`
    pub fn fixed(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: String::new(),
            hide: false,
            value: Some(value.into()),
        }
    }

    /// The single `Output` column used for `run` and aliases
    pub fn output(command: impl Into<String>) -> Self {
        Self::new(OUTPUT_COLUMN, command)
    }

    /// Mark as hidden
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.hide = true;
        self
    }

    /// Whether no command needs to run for this column
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.command.trim().is_empty()
    }

    /// Attach a resolved value
    #[must_use]
    pub fn resolve(self, value: String) -> ColumnResult {
        ColumnResult {
            name: self.name,
            command: self.command,
            hide: self.hide,
            value,
        }
    }
}

/// A column after execution on one host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnResult {
    pub name: String,
    pub command: String,
    pub hide: bool,
    pub value: String,
}

/// One host's resolved columns, in configured order
pub type Row = Vec<ColumnResult>;

/// Names of the columns shown in the table
#[must_use]
pub fn visible_names(columns: &[ColumnSpec]) -> Vec<&str> {
    columns
        .iter()
        .filter(|c| !c.hide)
        .map(|c| c.name.as_str())
        .collect()
}

/// Values of the columns shown in the table
#[must_use]
pub fn visible_values(row: &[ColumnResult]) -> Vec<&str> {
    row.iter()
        .filter(|c| !c.hide)
        .map(|c| c.value.as_str())
        .collect()
}
