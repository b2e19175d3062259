//! Topological execution order for provisioning tasks.

use crate::error::{ProvisionError, Result};
use crate::tasks::Task;
use std::collections::HashMap;

/// Dependency graph over a set of tasks.
pub struct TaskGraph {
    tasks: HashMap<&'static str, &'static Task>,
}

impl TaskGraph {
    /// Builds a graph over the given tasks.
    #[must_use]
    pub fn new(tasks: &'static [Task]) -> Self {
        Self {
            tasks: tasks.iter().map(|t| (t.name, t)).collect(),
        }
    }

    /// Graph over the full registry.
    #[must_use]
    pub fn registry() -> Self {
        Self::new(crate::tasks::TASKS)
    }

    /// Returns the tasks needed to run `target`, prerequisites first, each
    /// task exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::UnknownTask`] for a name outside the graph
    /// and [`ProvisionError::DependencyCycle`] when prerequisites loop.
    pub fn execution_order(&self, target: &str) -> Result<Vec<&'static Task>> {
        let mut order = Vec::new();
        let mut state: HashMap<&str, VisitState> = HashMap::new();
        self.visit(target, &mut state, &mut order)?;
        Ok(order)
    }

    fn visit(
        &self,
        name: &str,
        state: &mut HashMap<&str, VisitState>,
        order: &mut Vec<&'static Task>,
    ) -> Result<()> {
        match state.get(name) {
            Some(VisitState::Done) => return Ok(()),
            Some(VisitState::InProgress) => {
                return Err(ProvisionError::DependencyCycle {
                    task: name.to_string(),
                })
            }
            None => {}
        }

        let task = self
            .tasks
            .get(name)
            .copied()
            .ok_or_else(|| ProvisionError::UnknownTask {
                name: name.to_string(),
            })?;

        state.insert(task.name, VisitState::InProgress);
        for dep in task.deps {
            self.visit(dep, state, order)?;
        }
        state.insert(task.name, VisitState::Done);
        order.push(task);
        Ok(())
    }
}

#[derive(Clone, Copy)]
enum VisitState {
    InProgress,
    Done,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(order: &[&Task], name: &str) -> usize {
        order.iter().position(|t| t.name == name).unwrap()
    }

    #[test]
    fn deploy_runs_prerequisites_first_without_duplicates() {
        let graph = TaskGraph::registry();
        let order = graph.execution_order("deploy").unwrap();

        // update-apt is a shared prerequisite but appears once.
        assert_eq!(
            order.iter().filter(|t| t.name == "update-apt").count(),
            1
        );
        assert!(position(&order, "update-apt") < position(&order, "install-python"));
        assert!(position(&order, "install-python") < position(&order, "personalize"));
        assert!(position(&order, "personalize") < position(&order, "initialize"));
        assert!(position(&order, "install-conda") < position(&order, "initialize"));
        assert!(position(&order, "initialize") < position(&order, "install-docker"));
        assert_eq!(order.last().unwrap().name, "deploy");
    }

    #[test]
    fn leaf_task_orders_alone() {
        let graph = TaskGraph::registry();
        let order = graph.execution_order("update-apt").unwrap();
        assert_eq!(order.len(), 1);
        assert_eq!(order[0].name, "update-apt");
    }

    #[test]
    fn unknown_task_is_an_error() {
        let graph = TaskGraph::registry();
        let err = graph.execution_order("install-everything").unwrap_err();
        assert!(matches!(err, ProvisionError::UnknownTask { .. }));
    }

    #[test]
    fn dependency_cycle_is_detected() {
        static CYCLIC: &[Task] = &[
            Task {
                name: "a",
                summary: "",
                deps: &["b"],
                commands: &[],
            },
            Task {
                name: "b",
                summary: "",
                deps: &["a"],
                commands: &[],
            },
        ];

        let graph = TaskGraph::new(CYCLIC);
        let err = graph.execution_order("a").unwrap_err();
        assert!(matches!(err, ProvisionError::DependencyCycle { .. }));
    }
}
