use std::io::IsTerminal;

pub const DEFAULT_MAX_CALL_DEPTH: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ColorMode {
    /// Color diagnostics only when stderr is a terminal.
    #[default]
    Auto,
    Always,
    Never,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Nested user-function calls allowed before `Stack overflow.` is raised.
    pub max_call_depth: usize,
    pub color: ColorMode,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            color: ColorMode::Auto,
        }
    }
}

impl Config {
    /// Installs the color choice process-wide for `colored`.
    pub fn apply_color(&self) {
        let enabled = match self.color {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => std::io::stderr().is_terminal(),
        };
        colored::control::set_override(enabled);
    }
}
