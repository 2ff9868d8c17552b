//! Translation options.

/// What to do with a line that matches no VM command form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinePolicy {
    /// Abort the run.
    #[default]
    Strict,
    /// Skip the line and log a warning.
    Lenient,
}

/// When to emit the SP initialization and entry-point call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Bootstrap {
    /// Always set SP; call `Sys.init` only if a `Sys` source is among the inputs.
    #[default]
    Auto,
    /// Always set SP and call `Sys.init`.
    Always,
    /// Emit neither. The caller is responsible for machine state.
    Never,
}

/// Options controlling a translation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslateOptions {
    pub line_policy: LinePolicy,
    /// Echo each source command as a `//` comment before its block.
    pub annotate: bool,
    /// Clear the vacated stack cell after every pop.
    pub zero_popped: bool,
    pub bootstrap: Bootstrap,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            line_policy: LinePolicy::Strict,
            annotate: true,
            zero_popped: false,
            bootstrap: Bootstrap::Auto,
        }
    }
}

impl TranslateOptions {
    pub fn lenient(mut self) -> Self {
        self.line_policy = LinePolicy::Lenient;
        self
    }

    pub fn without_comments(mut self) -> Self {
        self.annotate = false;
        self
    }

    pub fn with_bootstrap(mut self, bootstrap: Bootstrap) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    pub fn with_zero_popped(mut self, zero_popped: bool) -> Self {
        self.zero_popped = zero_popped;
        self
    }
}
