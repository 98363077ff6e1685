//! KDL configuration parser

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::model::*;

/// Parse a configuration file from the given path
pub fn parse_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config_str(&content)
}

/// Parse the configuration file if it exists, otherwise fall back to defaults
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        tracing::debug!(
            "No configuration at {}, using defaults",
            path.display()
        );
        return Ok(Config::default());
    }
    parse_config(path)
}

/// Parse configuration from a string
pub fn parse_config_str(content: &str) -> Result<Config, ConfigError> {
    let doc: kdl::KdlDocument = content.parse().map_err(|e: kdl::KdlError| {
        // kdl uses an older miette version, so rebuild the span by hand
        let offset = e.span.offset();
        let len = e.span.len();
        let span = miette::SourceSpan::from((offset, len));
        ConfigError::ParseError {
            src: content.to_string(),
            span,
            source: e,
        }
    })?;

    let mut config = Config::default();

    for node in doc.nodes() {
        match node.name().value() {
            "global" => config.global = parse_global(node)?,
            "hyprland" => config.hyprland = parse_hyprland(node)?,
            "controller" => config.controller = parse_controller(node)?,
            "reconnect" => config.reconnect = parse_reconnect(node)?,
            name => {
                tracing::warn!("Unknown config section: {}", name);
            }
        }
    }

    Ok(config)
}

fn parse_global(node: &kdl::KdlNode) -> Result<GlobalConfig, ConfigError> {
    let mut global = GlobalConfig::default();

    for child in child_nodes(node) {
        match child.name().value() {
            "log-level" => {
                let val = string_arg(child)?;
                global.log_level = val
                    .parse()
                    .map_err(|message| ConfigError::Invalid { message })?;
            }
            "log-file" => {
                global.log_file = Some(expand_path(&string_arg(child)?));
            }
            name => {
                tracing::warn!("Unknown global config option: {}", name);
            }
        }
    }

    Ok(global)
}

fn parse_hyprland(node: &kdl::KdlNode) -> Result<HyprlandConfig, ConfigError> {
    let mut hyprland = HyprlandConfig::default();

    for child in child_nodes(node) {
        match child.name().value() {
            "socket-path" => {
                hyprland.socket_path = Some(expand_path(&string_arg(child)?));
            }
            name => {
                tracing::warn!("Unknown hyprland config option: {}", name);
            }
        }
    }

    Ok(hyprland)
}

fn parse_controller(node: &kdl::KdlNode) -> Result<ControllerConfig, ConfigError> {
    let mut controller = ControllerConfig::default();

    for child in child_nodes(node) {
        match child.name().value() {
            "hyprctl" => {
                controller.hyprctl = expand_path(&string_arg(child)?);
                controller.hyprctl_args = child
                    .entries()
                    .iter()
                    .skip(1)
                    .map(|entry| {
                        entry
                            .value()
                            .as_string()
                            .map(str::to_string)
                            .ok_or_else(|| ConfigError::Invalid {
                                message: format!(
                                    "hyprctl arguments must be strings, got {}",
                                    entry.value()
                                ),
                            })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
            }
            "timeout-ms" => {
                controller.timeout = match u64_arg(child)? {
                    0 => None,
                    ms => Some(Duration::from_millis(ms)),
                };
            }
            name => {
                tracing::warn!("Unknown controller config option: {}", name);
            }
        }
    }

    Ok(controller)
}

fn parse_reconnect(node: &kdl::KdlNode) -> Result<ReconnectConfig, ConfigError> {
    let mut reconnect = ReconnectConfig::default();

    for child in child_nodes(node) {
        match child.name().value() {
            "backoff-ms" => {
                let delays = child
                    .entries()
                    .iter()
                    .map(|entry| entry_to_u64("backoff-ms", entry))
                    .collect::<Result<Vec<_>, _>>()?;
                if delays.is_empty() {
                    return Err(ConfigError::MissingValue {
                        option: "backoff-ms".to_string(),
                    });
                }
                reconnect.backoff = delays.into_iter().map(Duration::from_millis).collect();
            }
            "max-retries" => {
                let retries = u64_arg(child)?;
                reconnect.max_retries =
                    u32::try_from(retries).map_err(|_| ConfigError::Invalid {
                        message: format!("max-retries is too large: {}", retries),
                    })?;
            }
            name => {
                tracing::warn!("Unknown reconnect config option: {}", name);
            }
        }
    }

    Ok(reconnect)
}

fn child_nodes(node: &kdl::KdlNode) -> &[kdl::KdlNode] {
    node.children().map(|doc| doc.nodes()).unwrap_or(&[])
}

fn string_arg(node: &kdl::KdlNode) -> Result<String, ConfigError> {
    let option = node.name().value();
    let entry = node.entries().first().ok_or_else(|| ConfigError::MissingValue {
        option: option.to_string(),
    })?;

    entry
        .value()
        .as_string()
        .map(str::to_string)
        .ok_or_else(|| ConfigError::Invalid {
            message: format!("{} expects a string, got {}", option, entry.value()),
        })
}

fn u64_arg(node: &kdl::KdlNode) -> Result<u64, ConfigError> {
    let option = node.name().value();
    let entry = node.entries().first().ok_or_else(|| ConfigError::MissingValue {
        option: option.to_string(),
    })?;
    entry_to_u64(option, entry)
}

fn entry_to_u64(option: &str, entry: &kdl::KdlEntry) -> Result<u64, ConfigError> {
    entry
        .value()
        .as_i64()
        .and_then(|value| u64::try_from(value).ok())
        .ok_or_else(|| ConfigError::Invalid {
            message: format!(
                "{} expects a non-negative integer, got {}",
                option,
                entry.value()
            ),
        })
}

fn expand_path(raw: &str) -> PathBuf {
    shellexpand::tilde(raw).into_owned().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let result = parse_config_str("").unwrap();
        assert_eq!(result, Config::default());
        assert_eq!(result.global.log_level, LogLevel::Info);
        assert_eq!(result.controller.hyprctl, PathBuf::from("hyprctl"));
        assert!(result.controller.hyprctl_args.is_empty());
        assert_eq!(result.controller.timeout, Some(Duration::from_millis(5000)));
        assert_eq!(result.reconnect.max_retries, 4);
        assert_eq!(
            result.reconnect.backoff,
            vec![
                Duration::from_millis(500),
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
            ]
        );
    }

    #[test]
    fn test_parse_full_config() {
        let config = r#"
            global {
                log-level "debug"
                log-file "/var/log/layout.log"
            }

            hyprland {
                socket-path "/tmp/hypr/test/.socket2.sock"
            }

            controller {
                hyprctl "/usr/bin/hyprctl" "--instance" "1"
                timeout-ms 250
            }

            reconnect {
                backoff-ms 100 200
                max-retries 7
            }
        "#;

        let result = parse_config_str(config).unwrap();
        assert_eq!(result.global.log_level, LogLevel::Debug);
        assert_eq!(
            result.global.log_file,
            Some(PathBuf::from("/var/log/layout.log"))
        );
        assert_eq!(
            result.hyprland.socket_path,
            Some(PathBuf::from("/tmp/hypr/test/.socket2.sock"))
        );
        assert_eq!(result.controller.hyprctl, PathBuf::from("/usr/bin/hyprctl"));
        assert_eq!(result.controller.hyprctl_args, vec!["--instance", "1"]);
        assert_eq!(result.controller.timeout, Some(Duration::from_millis(250)));
        assert_eq!(
            result.reconnect.backoff,
            vec![Duration::from_millis(100), Duration::from_millis(200)]
        );
        assert_eq!(result.reconnect.max_retries, 7);
    }

    #[test]
    fn test_zero_timeout_disables_it() {
        let config = r#"
            controller {
                timeout-ms 0
            }
        "#;

        let result = parse_config_str(config).unwrap();
        assert_eq!(result.controller.timeout, None);
    }

    #[test]
    fn test_tilde_expansion_in_log_file() {
        let config = r#"
            global {
                log-file "~/.per-window-layout.log"
            }
        "#;

        let result = parse_config_str(config).unwrap();
        let path = result.global.log_file.unwrap();
        assert!(
            !path.to_string_lossy().starts_with('~'),
            "tilde should be expanded: {}",
            path.display()
        );
        assert!(path.ends_with(".per-window-layout.log"));
    }

    #[test]
    fn test_invalid_log_level_fails() {
        let config = r#"
            global {
                log-level "loud"
            }
        "#;

        match parse_config_str(config) {
            Err(ConfigError::Invalid { message }) => {
                assert!(message.contains("loud"), "unexpected message: {}", message);
            }
            other => panic!("Expected Invalid error, got: {:?}", other),
        }
    }

    #[test]
    fn test_empty_backoff_rejected() {
        let config = r#"
            reconnect {
                backoff-ms
            }
        "#;

        match parse_config_str(config) {
            Err(ConfigError::MissingValue { option }) => assert_eq!(option, "backoff-ms"),
            other => panic!("Expected MissingValue error, got: {:?}", other),
        }
    }

    #[test]
    fn test_negative_backoff_rejected() {
        let config = r#"
            reconnect {
                backoff-ms 500 -1
            }
        "#;

        assert!(matches!(
            parse_config_str(config),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_string_where_integer_expected() {
        let config = r#"
            reconnect {
                max-retries "three"
            }
        "#;

        assert!(matches!(
            parse_config_str(config),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_unknown_sections_are_ignored() {
        let config = r#"
            plugins {
                something "else"
            }
            global {
                colour "blue"
            }
        "#;

        let result = parse_config_str(config).unwrap();
        assert_eq!(result, Config::default());
    }

    #[test]
    fn test_malformed_kdl_reports_parse_error() {
        let result = parse_config_str("global {");
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let path = Path::new("/nonexistent/perwindow-layout/config.kdl");
        let result = load_config(path).unwrap();
        assert_eq!(result, Config::default());
    }
}
