use serde::{Deserialize, Serialize};

/// Knobs shared by every emitter in this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmitterConfig {
    pub use_colors: bool,
    pub indent_style: IndentStyle,
    /// Append ` : i32` / ` : f32` to statements that produce a value.
    pub include_types: bool,
    pub verbosity: VerbosityLevel,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            use_colors: true,
            indent_style: IndentStyle::Spaces(2),
            include_types: true,
            verbosity: VerbosityLevel::Normal,
        }
    }
}

impl EmitterConfig {
    /// Plain-text profile for snapshots and piped output.
    pub fn plain() -> Self {
        Self {
            use_colors: false,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IndentStyle {
    Spaces(usize),
    Tabs,
}

impl IndentStyle {
    pub fn chars(&self) -> String {
        match self {
            IndentStyle::Spaces(n) => " ".repeat(*n),
            IndentStyle::Tabs => "\t".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerbosityLevel {
    Quiet,
    Normal,
    Verbose,
    Debug,
}

impl VerbosityLevel {
    /// Argument, return and temporary-slot summary above the modules.
    pub fn should_print_interface(&self) -> bool {
        !matches!(self, VerbosityLevel::Quiet)
    }

    /// Render pipeline and render pass section after the modules.
    pub fn should_print_render_state(&self) -> bool {
        !matches!(self, VerbosityLevel::Quiet)
    }

    /// Per-module statement counts.
    pub fn should_print_stats(&self) -> bool {
        matches!(self, VerbosityLevel::Verbose | VerbosityLevel::Debug)
    }
}
