// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Run-scoped state.
//!
//! Everything a single bootstrap run needs to remember lives here, threaded
//! through each step by reference. No component reads ambient globals, which
//! keeps every step runnable in isolation with a fabricated context.

/// Immutable configuration for a single run.
///
/// Built once from parsed command-line arguments. Governs the behavior of
/// every other component for the rest of the run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    /// Emit verbose diagnostic output.
    pub verbose: bool,

    /// Exercise control flow without mutating package or application state.
    pub test_mode: bool,

    /// Allow ANSI color in diagnostic output.
    pub color: bool,
}

/// Ordered, append-only list of follow-up steps the tool cannot perform
/// unattended.
///
/// Entries accumulate across apply sub-steps in discovery order, and are
/// flushed exactly once by the summary report at the end of the run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ManualActions(Vec<String>);

impl ManualActions {
    /// Construct new empty action list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an action to the end of the list.
    pub fn push(&mut self, action: impl Into<String>) {
        self.0.push(action.into());
    }

    /// Iterate actions in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Mutable state threaded through one bootstrap run.
#[derive(Debug, Default, Clone)]
pub struct Context {
    pub config: RunConfig,
    pub actions: ManualActions,
}

impl Context {
    /// Construct new run context from parsed configuration.
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            actions: ManualActions::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn manual_actions_preserve_discovery_order() {
        let mut actions = ManualActions::new();
        actions.push("first");
        actions.push("second");
        actions.push("third");

        let result: Vec<&str> = actions.iter().collect();
        assert_eq!(result, vec!["first", "second", "third"]);
        assert_eq!(actions.len(), 3);
    }

    #[test]
    fn manual_actions_start_empty() {
        let actions = ManualActions::new();
        assert!(actions.is_empty());
        assert_eq!(actions.iter().count(), 0);
    }
}
