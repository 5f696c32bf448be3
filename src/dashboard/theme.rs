//! Dashboard theme and styling
//!
//! Dark theme with saffron and green accents.

use egui::{Color32, FontFamily, FontId, Rounding, Stroke, TextStyle, Visuals};

/// Dark color palette
pub struct ThemeColors;

impl ThemeColors {
    // Background colors
    pub const BG_DARK: Color32 = Color32::from_rgb(16, 19, 26);
    pub const BG_MEDIUM: Color32 = Color32::from_rgb(26, 30, 40);
    pub const BG_LIGHT: Color32 = Color32::from_rgb(36, 41, 54);
    pub const BG_HOVER: Color32 = Color32::from_rgb(46, 52, 68);

    // Accent colors
    pub const ACCENT_PRIMARY: Color32 = Color32::from_rgb(255, 153, 51);
    pub const ACCENT_SECONDARY: Color32 = Color32::from_rgb(74, 144, 226);
    pub const ACCENT_SUCCESS: Color32 = Color32::from_rgb(39, 174, 96);
    pub const ACCENT_WARNING: Color32 = Color32::from_rgb(255, 193, 7);
    pub const ACCENT_ERROR: Color32 = Color32::from_rgb(231, 76, 60);

    // Text colors
    pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(240, 240, 245);
    pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(165, 170, 185);
    pub const TEXT_MUTED: Color32 = Color32::from_rgb(105, 112, 128);

    pub const BORDER: Color32 = Color32::from_rgb(52, 58, 74);

    // Verdict colors
    pub const VERDICT_GENUINE: Color32 = Color32::from_rgb(39, 174, 96);
    pub const VERDICT_FRAUD: Color32 = Color32::from_rgb(231, 76, 60);
    pub const STATUS_IDLE: Color32 = Color32::from_rgb(160, 160, 175);
}

/// Apply the dashboard theme to egui
pub fn apply_theme(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();

    // Configure visuals
    let mut visuals = Visuals::dark();

    // Window and panel backgrounds
    visuals.window_fill = ThemeColors::BG_MEDIUM;
    visuals.panel_fill = ThemeColors::BG_DARK;
    visuals.faint_bg_color = ThemeColors::BG_LIGHT;
    visuals.extreme_bg_color = ThemeColors::BG_DARK;

    // Widget colors
    let widgets = &mut visuals.widgets;
    for (state, fill, text) in [
        (&mut widgets.noninteractive, ThemeColors::BG_MEDIUM, ThemeColors::TEXT_SECONDARY),
        (&mut widgets.inactive, ThemeColors::BG_LIGHT, ThemeColors::TEXT_PRIMARY),
        (&mut widgets.hovered, ThemeColors::BG_HOVER, ThemeColors::TEXT_PRIMARY),
        (&mut widgets.active, ThemeColors::ACCENT_PRIMARY, ThemeColors::BG_DARK),
        (&mut widgets.open, ThemeColors::BG_HOVER, ThemeColors::TEXT_PRIMARY),
    ] {
        state.bg_fill = fill;
        state.fg_stroke = Stroke::new(1.0, text);
        state.rounding = Rounding::same(6.0);
    }

    // Selection
    visuals.selection.bg_fill = color_with_alpha(ThemeColors::ACCENT_PRIMARY, 77); // ~0.3 alpha
    visuals.selection.stroke = Stroke::new(1.0, ThemeColors::ACCENT_PRIMARY);

    visuals.hyperlink_color = ThemeColors::ACCENT_PRIMARY;

    visuals.window_rounding = Rounding::same(8.0);
    visuals.window_stroke = Stroke::new(1.0, ThemeColors::BORDER);

    visuals.menu_rounding = Rounding::same(6.0);

    style.visuals = visuals;

    // Spacing
    style.spacing.item_spacing = egui::vec2(8.0, 6.0);
    style.spacing.button_padding = egui::vec2(12.0, 6.0);
    style.spacing.window_margin = egui::Margin::same(16.0);

    // Font sizes
    style.text_styles = [
        (TextStyle::Small, FontId::new(13.0, FontFamily::Proportional)),
        (TextStyle::Body, FontId::new(16.0, FontFamily::Proportional)),
        (TextStyle::Monospace, FontId::new(15.0, FontFamily::Monospace)),
        (TextStyle::Button, FontId::new(16.0, FontFamily::Proportional)),
        (TextStyle::Heading, FontId::new(22.0, FontFamily::Proportional)),
    ]
    .into();

    // Apply style
    ctx.set_style(style);
}

/// Helper to create a color with modified alpha
pub fn color_with_alpha(color: Color32, alpha: u8) -> Color32 {
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}

/// Green for genuine documents, red for suspected fraud
pub fn verdict_color(genuine: bool) -> Color32 {
    if genuine {
        ThemeColors::VERDICT_GENUINE
    } else {
        ThemeColors::VERDICT_FRAUD
    }
}
