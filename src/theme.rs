use std::str::FromStr;

use ratatui::style::{Color, Modifier, Style};

use crate::config::{ConfigError, ThemeConfig};
use crate::tags::TagColor;

/// Theme configuration for the editor
#[derive(Clone, Debug, PartialEq)]
pub struct Theme {
    /// Background color for the editor
    pub background: Color,

    /// Foreground (text) color for the status bars
    pub status_bar_fg: Color,

    /// Background color for the status bars
    pub status_bar_bg: Color,

    /// Color for the progress figures in the bottom bar
    pub progress_color: Color,

    /// Foreground color for active selection
    pub selection_fg: Color,

    /// Background color for active selection
    pub selection_bg: Color,

    /// Foreground color for the suggestion remainder after the cursor
    pub suggestion_fg: Color,

    /// Foreground color for tag chips
    pub tag_fg: Color,

    /// Chip background for `k` tags
    pub tag_purple: Color,

    /// Chip background for `b` tags
    pub tag_orange: Color,

    /// Chip background for `term` tags
    pub tag_gray: Color,

    /// Foreground color for the highlighted marker
    pub selected_marker_fg: Color,

    /// Background color for the highlighted marker
    pub selected_marker_bg: Color,

    /// Color for character counts
    pub count_fg: Color,

    /// Color for a target count larger than the source count
    pub count_exceeded_fg: Color,

    /// Border color for the active segment
    pub active_border: Color,

    /// Border color for other segments
    pub inactive_border: Color,

    /// Foreground color for source text
    pub source_fg: Color,

    /// Color for warning flags and issues
    pub warning_fg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color::Reset,
            status_bar_fg: Color::White,
            status_bar_bg: Color::Blue,
            progress_color: Color::LightYellow,
            selection_fg: Color::White,
            selection_bg: Color::LightBlue,
            suggestion_fg: Color::DarkGray,
            tag_fg: Color::Black,
            tag_purple: Color::Magenta,
            tag_orange: Color::Rgb(255, 165, 0),
            tag_gray: Color::Gray,
            selected_marker_fg: Color::White,
            selected_marker_bg: Color::Blue,
            count_fg: Color::DarkGray,
            count_exceeded_fg: Color::Red,
            active_border: Color::LightBlue,
            inactive_border: Color::DarkGray,
            source_fg: Color::Reset,
            warning_fg: Color::Yellow,
        }
    }
}

impl Theme {
    /// Create a new theme with default colors
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply named color overrides on top of this theme
    pub fn with_overrides(mut self, overrides: &ThemeConfig) -> Result<Self, ConfigError> {
        for (key, value) in &overrides.colors {
            let color = Color::from_str(value).map_err(|_| ConfigError::InvalidColor {
                key: key.clone(),
                value: value.clone(),
            })?;
            *self.color_mut(key)? = color;
        }
        Ok(self)
    }

    fn color_mut(&mut self, key: &str) -> Result<&mut Color, ConfigError> {
        let slot = match key {
            "background" => &mut self.background,
            "status_bar_fg" => &mut self.status_bar_fg,
            "status_bar_bg" => &mut self.status_bar_bg,
            "progress_color" => &mut self.progress_color,
            "selection_fg" => &mut self.selection_fg,
            "selection_bg" => &mut self.selection_bg,
            "suggestion_fg" => &mut self.suggestion_fg,
            "tag_fg" => &mut self.tag_fg,
            "tag_purple" => &mut self.tag_purple,
            "tag_orange" => &mut self.tag_orange,
            "tag_gray" => &mut self.tag_gray,
            "selected_marker_fg" => &mut self.selected_marker_fg,
            "selected_marker_bg" => &mut self.selected_marker_bg,
            "count_fg" => &mut self.count_fg,
            "count_exceeded_fg" => &mut self.count_exceeded_fg,
            "active_border" => &mut self.active_border,
            "inactive_border" => &mut self.inactive_border,
            "source_fg" => &mut self.source_fg,
            "warning_fg" => &mut self.warning_fg,
            _ => return Err(ConfigError::UnknownColorKey(key.to_string())),
        };
        Ok(slot)
    }

    /// Get the style for the status bars
    pub fn status_bar_style(&self) -> Style {
        Style::default()
            .fg(self.status_bar_fg)
            .bg(self.status_bar_bg)
    }

    /// Get the style for the progress figures
    pub fn progress_style(&self) -> Style {
        Style::default().fg(self.progress_color)
    }

    /// Get the style for selected text
    pub fn selection_style(&self) -> Style {
        Style::default().fg(self.selection_fg).bg(self.selection_bg)
    }

    /// Get the style for the suggestion remainder
    pub fn suggestion_style(&self) -> Style {
        Style::default()
            .fg(self.suggestion_fg)
            .add_modifier(Modifier::ITALIC)
    }

    /// Get the chip style for a tag color
    pub fn tag_style(&self, color: TagColor) -> Style {
        let bg = match color {
            TagColor::Purple => self.tag_purple,
            TagColor::Orange => self.tag_orange,
            TagColor::Gray => self.tag_gray,
        };
        Style::default().fg(self.tag_fg).bg(bg)
    }

    /// Get the style for the highlighted marker
    pub fn selected_marker_style(&self) -> Style {
        Style::default()
            .fg(self.selected_marker_fg)
            .bg(self.selected_marker_bg)
            .add_modifier(Modifier::BOLD)
    }

    /// Get the style for a character count
    pub fn count_style(&self, exceeded: bool) -> Style {
        if exceeded {
            Style::default().fg(self.count_exceeded_fg)
        } else {
            Style::default().fg(self.count_fg)
        }
    }

    /// Get the border style for a segment
    pub fn border_style(&self, active: bool) -> Style {
        if active {
            Style::default().fg(self.active_border)
        } else {
            Style::default().fg(self.inactive_border)
        }
    }

    /// Get the style for source text
    pub fn source_style(&self) -> Style {
        Style::default().fg(self.source_fg)
    }

    /// Get the style for warnings
    pub fn warning_style(&self) -> Style {
        Style::default().fg(self.warning_fg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overrides(pairs: &[(&str, &str)]) -> ThemeConfig {
        ThemeConfig {
            colors: pairs
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        }
    }

    #[test]
    fn overrides_replace_named_colors() {
        let theme = Theme::new()
            .with_overrides(&overrides(&[("tag_purple", "blue"), ("count_fg", "#102030")]))
            .expect("valid overrides");
        assert_eq!(theme.tag_purple, Color::Blue);
        assert_eq!(theme.count_fg, Color::Rgb(0x10, 0x20, 0x30));
        assert_eq!(theme.tag_style(TagColor::Purple).bg, Some(Color::Blue));
    }

    #[test]
    fn unknown_key_is_an_error() {
        let result = Theme::new().with_overrides(&overrides(&[("sparkle", "red")]));
        assert!(matches!(result, Err(ConfigError::UnknownColorKey(key)) if key == "sparkle"));
    }

    #[test]
    fn bad_color_is_an_error() {
        let result = Theme::new().with_overrides(&overrides(&[("tag_gray", "not-a-color")]));
        assert!(matches!(result, Err(ConfigError::InvalidColor { .. })));
    }

    #[test]
    fn count_style_flags_overflow() {
        let theme = Theme::new();
        assert_eq!(theme.count_style(true).fg, Some(theme.count_exceeded_fg));
        assert_eq!(theme.count_style(false).fg, Some(theme.count_fg));
    }
}
