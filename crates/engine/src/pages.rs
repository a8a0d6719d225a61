//! The three tutor pages as workflow use cases.

use std::sync::Arc;

use serde::Serialize;

use crate::chart::{self, Figure};
use crate::completion::{Completer, CompletionRequest, ModelParams};
use crate::error::WorkflowError;
use crate::prompt::{
    critique_prompt, material_prompt, project_prompt, CritiqueRequest, MaterialRequest,
    ProjectRequest,
};
use crate::table::{IndexColumn, ReferenceRow, WoodTable};
use crate::workflow::{Refreshable, UseCase};

/// Carving critique: prompt plus the image reference.
#[derive(Debug, Clone)]
pub struct CritiqueUseCase {
    pub params: ModelParams,
}

impl UseCase for CritiqueUseCase {
    type Request = CritiqueRequest;
    type Output = String;
    const NAME: &'static str = "critique";

    fn execute(
        &self,
        request: &CritiqueRequest,
        completer: &dyn Completer,
    ) -> Result<String, WorkflowError> {
        let prompt = critique_prompt(request);
        let image_url = Some(request.image_url.trim())
            .filter(|url| !url.is_empty())
            .map(str::to_string);
        completer.complete(&CompletionRequest {
            system: prompt.system,
            user: prompt.user,
            image_url,
            params: self.params.clone(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ProjectUseCase {
    pub params: ModelParams,
}

impl UseCase for ProjectUseCase {
    type Request = ProjectRequest;
    type Output = String;
    const NAME: &'static str = "project";

    fn execute(
        &self,
        request: &ProjectRequest,
        completer: &dyn Completer,
    ) -> Result<String, WorkflowError> {
        let prompt = project_prompt(request);
        completer.complete(&CompletionRequest {
            system: prompt.system,
            user: prompt.user,
            image_url: None,
            params: self.params.clone(),
        })
    }
}

/// Wood lookup result: the table rows for the species plus the summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialReport {
    pub subset: Vec<ReferenceRow>,
    pub text: String,
}

/// Wood lookup against the shared reference table.
#[derive(Debug, Clone)]
pub struct MaterialUseCase {
    pub table: Arc<WoodTable>,
    pub params: ModelParams,
}

impl MaterialUseCase {
    /// Distribution chart of every index with `highlight` marked.
    pub fn figure(&self, highlight: &str) -> Figure {
        chart::render(&self.table, highlight, &IndexColumn::ALL)
    }
}

impl UseCase for MaterialUseCase {
    type Request = MaterialRequest;
    type Output = MaterialReport;
    const NAME: &'static str = "wood";

    fn execute(
        &self,
        request: &MaterialRequest,
        completer: &dyn Completer,
    ) -> Result<MaterialReport, WorkflowError> {
        let subset = self.table.subset(&request.material_name);
        if subset.is_empty() {
            log::warn!("'{}' is not in the reference table", request.material_name);
        }
        let prompt = material_prompt(request);
        let text = completer.complete(&CompletionRequest {
            system: prompt.system,
            user: prompt.user,
            image_url: None,
            params: self.params.clone(),
        })?;
        Ok(MaterialReport { subset, text })
    }
}

impl Refreshable for MaterialUseCase {}
