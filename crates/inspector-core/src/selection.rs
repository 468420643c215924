//! Command selection: configured columns, `run <words>` or an alias

use tracing::debug;

use crate::column::ColumnSpec;
use crate::config::InspectorConfig;
use crate::error::CoreError;

/// Keyword introducing a literal command
pub const RUN_KEYWORD: &str = "run";

/// Resolve the column set for this run from the positional words
///
/// No words keeps the configured columns. `run w1 w2` and `<alias>` both
/// replace them with a single `Output` column.
///
/// # Errors
/// `CoreError::NoCommandGiven` for a bare `run`, `CoreError::UnknownCommand`
/// if the first word is neither `run` nor an alias
pub fn select_columns(
    config: &InspectorConfig,
    words: &[String],
) -> Result<Vec<ColumnSpec>, CoreError> {
    let Some((first, rest)) = words.split_first() else {
        return Ok(config.columns.clone());
    };

    if first == RUN_KEYWORD {
        if rest.is_empty() {
            return Err(CoreError::NoCommandGiven);
        }
        let command = rest.join(" ");
        debug!(command = %command, "running literal command");
        return Ok(vec![ColumnSpec::output(command)]);
    }

    match config.aliases.get(first) {
        Some(command) => {
            debug!(alias = %first, command = %command, "resolved alias");
            Ok(vec![ColumnSpec::output(command.clone())])
        }
        None => Err(CoreError::UnknownCommand(first.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::OUTPUT_COLUMN;

    fn config() -> InspectorConfig {
        InspectorConfig {
            servers: vec!["a".into()],
            aliases: [("disk".to_string(), "df -h".to_string())].into(),
            columns: vec![
                ColumnSpec::new("Uptime", "uptime"),
                ColumnSpec::new("Kernel", "uname -r"),
            ],
            ..InspectorConfig::default()
        }
    }

    fn words(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_no_words_keeps_configured_columns() {
        let columns = select_columns(&config(), &[]).unwrap();
        assert_eq!(columns, config().columns);
    }

    #[test]
    fn test_alias_replaces_columns() {
        let columns = select_columns(&config(), &words(&["disk"])).unwrap();
        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].name, OUTPUT_COLUMN);
        assert_eq!(columns[0].command, "df -h");
    }

    #[test]
    fn test_run_joins_words() {
        let columns = select_columns(&config(), &words(&["run", "ls", "-la", "/tmp"])).unwrap();
        assert_eq!(columns, vec![ColumnSpec::output("ls -la /tmp")]);
    }

    #[test]
    fn test_bare_run_is_an_error() {
        let err = select_columns(&config(), &words(&["run"])).unwrap_err();
        assert!(matches!(err, CoreError::NoCommandGiven));
    }

    #[test]
    fn test_unknown_alias() {
        let err = select_columns(&config(), &words(&["memory"])).unwrap_err();
        assert!(matches!(err, CoreError::UnknownCommand(ref w) if w == "memory"));
    }
}
