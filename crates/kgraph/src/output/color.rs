//! Color and styling helpers for CLI output.
//!
//! Semantic Color Theme:
//!   - Success:       green   (organization visibility, low severity)
//!   - Warning:       yellow  (team/shared visibility, medium severity)
//!   - Error:         red     (high and critical severity)
//!   - Info/Reference: cyan   (vertex and edge ids, tree root)
//!   - Accent:        magenta (tags, edge types)
//!   - Muted:         dimmed  (field labels, connectors)
//!   - Emphasis:      bold    (section headers, critical)

use crate::analysis::Severity;
use crate::domain::Visibility;
use colored::Colorize;

use super::OutputConfig;

/// Apply semantic "success" color (green) to text.
pub fn success(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.green().to_string()
}

/// Apply semantic "error" color (red) to text.
pub fn error(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.red().to_string()
}

/// Apply semantic "warning" color (yellow) to text.
pub fn warning(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.yellow().to_string()
}

/// Apply semantic "info" color (cyan) to text.
pub fn info(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.cyan().to_string()
}

/// Colorize a severity grade.
pub(crate) fn colorize_severity(severity: Severity, config: &OutputConfig) -> String {
    let text = severity.as_str();
    if !config.use_colors {
        return text.to_string();
    }
    match severity {
        Severity::Critical => text.red().bold().to_string(),
        Severity::High => text.red().to_string(),
        Severity::Medium => text.yellow().to_string(),
        Severity::Low => text.green().to_string(),
    }
}

/// Colorize a visibility tier.
pub(crate) fn colorize_visibility(visibility: Visibility, config: &OutputConfig) -> String {
    let text = visibility.as_str();
    if !config.use_colors {
        return text.to_string();
    }
    match visibility {
        Visibility::Private => text.dimmed().to_string(),
        Visibility::Team | Visibility::Shared => text.yellow().to_string(),
        Visibility::Organization => text.green().to_string(),
    }
}

/// Colorize a vertex or edge id (cyan).
pub(crate) fn colorize_id(id: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return id.to_string();
    }
    id.cyan().to_string()
}

/// Colorize a tag list (magenta).
pub(crate) fn colorize_tags<'a>(
    tags: impl IntoIterator<Item = &'a String>,
    config: &OutputConfig,
) -> String {
    let text = tags
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if !config.use_colors || text.is_empty() {
        return text;
    }
    text.magenta().to_string()
}

/// Colorize an edge type label (magenta).
pub(crate) fn colorize_edge_type(label: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return label.to_string();
    }
    label.magenta().to_string()
}

/// Render a confidence score as a percentage, colored by strength.
pub(crate) fn colorize_confidence(confidence: f64, config: &OutputConfig) -> String {
    let text = format!("{:.0}%", confidence * 100.0);
    if !config.use_colors {
        return text;
    }
    if confidence >= 0.8 {
        text.red().bold().to_string()
    } else if confidence >= 0.6 {
        text.yellow().to_string()
    } else {
        text.to_string()
    }
}

/// Apply dimmed style to text (for labels/field names).
pub(crate) fn dimmed(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.dimmed().to_string()
}

/// Apply bold style to text (for section headers).
pub(crate) fn bold(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.bold().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use colored::control::set_override;
    use std::sync::{Mutex, MutexGuard};

    static GLOBAL_STATE_MUTEX: Mutex<()> = Mutex::new(());

    struct ColorGuard<'a> {
        _guard: MutexGuard<'a, ()>,
    }

    impl ColorGuard<'_> {
        fn new() -> Self {
            let guard = GLOBAL_STATE_MUTEX
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            set_override(true);
            Self { _guard: guard }
        }
    }

    impl Drop for ColorGuard<'_> {
        fn drop(&mut self) {
            set_override(false);
        }
    }

    fn with_colors_enabled<F, R>(f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _guard = ColorGuard::new();
        f()
    }

    #[test]
    fn test_colorize_severity_contains_ansi_codes() {
        with_colors_enabled(|| {
            let config = OutputConfig::new(false, true);
            for severity in [
                Severity::Low,
                Severity::Medium,
                Severity::High,
                Severity::Critical,
            ] {
                let text = colorize_severity(severity, &config);
                assert!(text.contains(severity.as_str()));
                assert!(text.contains("\x1b["), "{severity} should have ANSI codes");
            }
        });
    }

    #[test]
    fn test_no_colors_returns_plain_text() {
        let config = OutputConfig::new(false, false);
        assert_eq!(colorize_severity(Severity::High, &config), "high");
        assert_eq!(
            colorize_visibility(Visibility::Organization, &config),
            "organization"
        );
        assert_eq!(colorize_id("kg-1", &config), "kg-1");
        assert_eq!(success("ok", &config), "ok");
        assert_eq!(error("bad", &config), "bad");
        assert_eq!(bold("Title", &config), "Title");
    }

    #[test]
    fn test_colorize_tags_joins() {
        let config = OutputConfig::new(false, false);
        let tags = ["api".to_string(), "core".to_string()];
        assert_eq!(colorize_tags(&tags, &config), "api, core");
        assert_eq!(colorize_tags(&Vec::<String>::new(), &config), "");
    }

    #[test]
    fn test_confidence_as_percentage() {
        let config = OutputConfig::new(false, false);
        assert_eq!(colorize_confidence(0.87, &config), "87%");
        assert_eq!(colorize_confidence(0.5, &config), "50%");
    }
}
