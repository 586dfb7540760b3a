//! Collaborator interface for theme loading. The
//! core never parses theme files or loads images/fonts itself; it asks a
//! `Theme` implementation for [`PDecorData`] and reacts to
//! [`Theme::reload`] by re-reading decor data across every frame.
use std::collections::HashMap;

/// Theme data for one named decoration variant (a frame's `decor_name`).
#[derive(Debug, Clone, Default)]
pub struct PDecorData {
    pub border_width: u32,
    pub title_height: u32,
    pub title_font: String,
    pub buttons: Vec<ButtonDef>,
    pub padding: (u32, u32, u32, u32),
}

#[derive(Debug, Clone)]
pub struct ButtonDef {
    pub name: String,
    pub left_of_title: bool,
}

pub trait Theme {
    /// Look up decor data for a named variant, falling back to
    /// `"DEFAULT"` if the variant is unknown.
    fn decor(&self, name: &str) -> PDecorData;

    /// Reload theme files from disk. Returns the set of variant names
    /// that actually changed so the caller can limit which frames need a
    /// decor rebuild.
    fn reload(&mut self) -> crate::Result<Vec<String>>;
}

/// A theme with no backing files: every variant resolves to the same
/// built-in defaults. Useful for headless tests and as a safe fallback
/// when [`Theme::reload`] fails.
#[derive(Debug, Clone, Default)]
pub struct BuiltinTheme {
    variants: HashMap<String, PDecorData>,
}

impl Theme for BuiltinTheme {
    fn decor(&self, name: &str) -> PDecorData {
        self.variants
            .get(name)
            .cloned()
            .unwrap_or_else(|| PDecorData {
                border_width: 1,
                title_height: 18,
                title_font: "fixed".into(),
                buttons: Vec::new(),
                padding: (0, 0, 0, 0),
            })
    }

    fn reload(&mut self) -> crate::Result<Vec<String>> {
        Ok(Vec::new())
    }
}
