//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::data::ColorTier;

/// Colors for the risk map legend and the rest of the dashboard chrome.
///
/// The three tier colors are shared by the district table, the header
/// counts and the pre-assigned risk level column, so a "High risk" area and
/// a district scoring 75 or more read the same.
///
/// Use [`Theme::auto_detect()`] to pick by terminal background.
#[derive(Debug, Clone)]
pub struct Theme {
    pub highlight: Color,
    /// Legend color for scores below 50 (and risk level 1).
    pub low: Color,
    /// Legend color for scores from 50 up to 75 (and risk level 2).
    pub medium: Color,
    /// Legend color for scores of 75 or more, disaster-floored districts
    /// included. Also used for errors.
    pub high: Color,
    pub border: Color,
    pub header: Style,
    /// Highlighted table row.
    pub selected: Style,
    pub tab_active: Style,
    pub tab_inactive: Style,
    /// Login or upload field that receives typing.
    pub input_focused: Style,
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            low: Color::Green,
            medium: Color::Yellow,
            high: Color::Red,
            border: Color::Gray,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::Gray),
            input_focused: Style::default().fg(Color::Cyan).add_modifier(Modifier::UNDERLINED),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            low: Color::Green,
            medium: Color::Yellow,
            high: Color::Red,
            border: Color::DarkGray,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::LightBlue).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::DarkGray),
            input_focused: Style::default().fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        // Use terminal-light crate to detect background luminance
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Get style for a risk tier
    pub fn tier_style(&self, tier: ColorTier) -> Style {
        match tier {
            ColorTier::Low => Style::default().fg(self.low),
            ColorTier::Medium => Style::default().fg(self.medium),
            ColorTier::High => Style::default().fg(self.high).add_modifier(Modifier::BOLD),
        }
    }

    /// Style of a pre-assigned risk level (1 low .. 3 high).
    pub fn risk_level_style(&self, level: u8) -> Style {
        match level {
            0 | 1 => self.tier_style(ColorTier::Low),
            2 => self.tier_style(ColorTier::Medium),
            _ => self.tier_style(ColorTier::High),
        }
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.high)
    }
}
