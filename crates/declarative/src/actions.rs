//! Post-apply actions
//!
//! Declarations name an action (e.g. "restart-dock") to run once something
//! changed. The collector keeps the first enqueue of each name and runs every
//! collected action exactly once at the end of the run.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

type RunFn = dyn Fn() -> Result<()>;

/// A named, deduplicated post-apply side effect
#[derive(Clone)]
pub struct ActionRef {
    name: String,
    disruptive: bool,
    run: Rc<RunFn>,
}

impl ActionRef {
    pub fn new(name: impl Into<String>, run: impl Fn() -> Result<()> + 'static) -> Self {
        Self {
            name: name.into(),
            disruptive: false,
            run: Rc::new(run),
        }
    }

    /// Mark the action as disruptive to a running session (suppressed by tame runs)
    pub fn disruptive(mut self, disruptive: bool) -> Self {
        self.disruptive = disruptive;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_disruptive(&self) -> bool {
        self.disruptive
    }

    /// Invoke the action
    pub fn run(&self) -> Result<()> {
        (self.run)()
    }
}

impl fmt::Debug for ActionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRef")
            .field("name", &self.name)
            .field("disruptive", &self.disruptive)
            .finish_non_exhaustive()
    }
}

/// Actions known to a run, looked up by name
#[derive(Debug, Clone, Default)]
pub struct ActionRegistry {
    actions: HashMap<String, ActionRef>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action, replacing any earlier one with the same name
    pub fn register(&mut self, action: ActionRef) {
        self.actions.insert(action.name.clone(), action);
    }

    pub fn get(&self, name: &str) -> Option<&ActionRef> {
        self.actions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// What happened to one collected action during flush
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionStatus {
    /// The action ran successfully
    Ran,
    /// Dry run: the action would have run
    WouldRun,
    /// Disruptive action skipped by a tame run
    Suppressed,
    /// The action ran and failed
    Failed { error: String },
}

/// Result of flushing a single action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub name: String,
    #[serde(flatten)]
    pub status: ActionStatus,
}

/// How a flush treats the collected actions
#[derive(Debug, Clone, Copy, Default)]
pub struct FlushMode {
    /// Actually invoke the actions (false for dry runs)
    pub execute: bool,
    /// Skip actions flagged as disruptive
    pub suppress_disruptive: bool,
}

/// Set of actions to run at the end of a reconcile run, in enqueue order
#[derive(Debug, Default)]
pub struct ActionCollector {
    queue: Vec<ActionRef>,
    seen: HashSet<String>,
}

impl ActionCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue an action. Returns false if an action with that name is already queued.
    pub fn enqueue(&mut self, action: ActionRef) -> bool {
        if !self.seen.insert(action.name.clone()) {
            return false;
        }
        self.queue.push(action);
        true
    }

    /// Names of queued actions, in enqueue order
    pub fn pending(&self) -> Vec<&str> {
        self.queue.iter().map(|a| a.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Run every queued action once, in enqueue order.
    ///
    /// A failing action does not stop the remaining ones. The queue is empty
    /// afterwards, so a second flush does nothing.
    pub fn flush(&mut self, mode: FlushMode) -> Vec<ActionOutcome> {
        let queue = std::mem::take(&mut self.queue);
        let mut outcomes = Vec::with_capacity(queue.len());

        for action in queue {
            let status = if mode.suppress_disruptive && action.disruptive {
                log::info!("tame run: suppressing action {}", action.name);
                ActionStatus::Suppressed
            } else if !mode.execute {
                ActionStatus::WouldRun
            } else {
                match action.run() {
                    Ok(()) => ActionStatus::Ran,
                    Err(e) => {
                        log::warn!("action {} failed: {:#}", action.name, e);
                        ActionStatus::Failed {
                            error: format!("{e:#}"),
                        }
                    }
                }
            };

            outcomes.push(ActionOutcome {
                name: action.name,
                status,
            });
        }

        outcomes
    }
}
