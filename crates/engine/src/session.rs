//! Per-user session: one controller per page plus the active page.
//!
//! The session is an explicit value handed to every handler; there is no
//! ambient page state.

use std::sync::Arc;

use crate::completion::ModelParams;
use crate::error::WorkflowError;
use crate::pages::{CritiqueUseCase, MaterialUseCase, ProjectUseCase};
use crate::table::WoodTable;
use crate::workflow::PageController;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Critique,
    Project,
    Wood,
}

impl Page {
    pub const ALL: [Page; 3] = [Page::Critique, Page::Project, Page::Wood];

    pub fn title(&self) -> &'static str {
        match self {
            Page::Critique => "Carving Critique",
            Page::Project => "Project Creation",
            Page::Wood => "Wood Wonderland",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Page::Critique => 0,
            Page::Project => 1,
            Page::Wood => 2,
        }
    }

    pub fn next(&self) -> Page {
        Page::ALL[(self.index() + 1) % Page::ALL.len()]
    }

    pub fn prev(&self) -> Page {
        Page::ALL[(self.index() + Page::ALL.len() - 1) % Page::ALL.len()]
    }
}

/// Model parameters for each page.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionParams {
    pub critique: ModelParams,
    pub project: ModelParams,
    pub material: ModelParams,
}

impl Default for SessionParams {
    fn default() -> Self {
        Self {
            critique: ModelParams::critique(),
            project: ModelParams::project(),
            material: ModelParams::material(),
        }
    }
}

#[derive(Debug)]
pub struct Session {
    active: Page,
    pub critique: PageController<CritiqueUseCase>,
    pub project: PageController<ProjectUseCase>,
    wood: Result<PageController<MaterialUseCase>, WorkflowError>,
    /// Credential problem found at startup; shown on every page.
    config_error: Option<WorkflowError>,
}

impl Session {
    /// Build a session. A failed table load disables only the wood page.
    pub fn new(
        params: SessionParams,
        table: Result<Arc<WoodTable>, WorkflowError>,
        config_error: Option<WorkflowError>,
    ) -> Self {
        let wood = table.map(|table| {
            PageController::new(MaterialUseCase {
                table,
                params: params.material.clone(),
            })
        });
        if let Err(e) = &wood {
            log::warn!("wood page disabled: {}", e);
        }
        Self {
            active: Page::Critique,
            critique: PageController::new(CritiqueUseCase {
                params: params.critique,
            }),
            project: PageController::new(ProjectUseCase {
                params: params.project,
            }),
            wood,
            config_error,
        }
    }

    pub fn active(&self) -> Page {
        self.active
    }

    pub fn set_active(&mut self, page: Page) {
        if page != self.active {
            log::debug!("page: {} -> {}", self.active.title(), page.title());
            self.active = page;
        }
    }

    pub fn config_error(&self) -> Option<&WorkflowError> {
        self.config_error.as_ref()
    }

    pub fn wood(&self) -> Result<&PageController<MaterialUseCase>, &WorkflowError> {
        self.wood.as_ref()
    }

    pub fn wood_mut(&mut self) -> Result<&mut PageController<MaterialUseCase>, &WorkflowError> {
        self.wood.as_mut().map_err(|e| &*e)
    }

    /// Clear whichever page is active. Returns false if nothing changed.
    pub fn clear_active(&mut self) -> bool {
        match self.active {
            Page::Critique => self.critique.clear(),
            Page::Project => self.project.clear(),
            Page::Wood => self.wood.as_mut().map(|page| page.clear()).unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::ScriptedCompleter;
    use crate::prompt::{MaterialRequest, ProjectRequest};
    use crate::table::ReferenceRow;
    use crate::workflow::TriggerOutcome;

    fn table() -> Arc<WoodTable> {
        Arc::new(WoodTable::from_rows(vec![ReferenceRow::new(
            "Ash",
            [Some(52.0), Some(1320.0), Some(12.3), Some(103.5), Some(51.1)],
        )]))
    }

    #[test]
    fn page_cycle() {
        assert_eq!(Page::Critique.next(), Page::Project);
        assert_eq!(Page::Wood.next(), Page::Critique);
        assert_eq!(Page::Critique.prev(), Page::Wood);
    }

    #[test]
    fn pages_keep_independent_state() {
        let completer = ScriptedCompleter::replying("answer");
        let mut session = Session::new(SessionParams::default(), Ok(table()), None);

        session.project.trigger(ProjectRequest::default(), &completer);
        session
            .wood_mut()
            .unwrap()
            .trigger(MaterialRequest::new("Ash"), &completer);

        assert!(session.critique.is_idle());
        assert!(session.project.exchange().is_some());

        session.set_active(Page::Project);
        assert!(session.clear_active());
        assert!(session.project.is_idle());
        assert!(session.wood().unwrap().exchange().is_some());
    }

    #[test]
    fn missing_data_only_disables_wood_page() {
        let completer = ScriptedCompleter::replying("answer");
        let mut session = Session::new(
            SessionParams::default(),
            Err(WorkflowError::DataUnavailable("woodHardness.csv: not found".to_string())),
            None,
        );
        assert_eq!(session.wood().unwrap_err().kind(), "data_unavailable");
        assert_eq!(
            session.project.trigger(ProjectRequest::default(), &completer),
            TriggerOutcome::Completed
        );
        session.set_active(Page::Wood);
        assert!(!session.clear_active());
    }
}
