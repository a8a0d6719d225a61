use serde::{Deserialize, Serialize};

use super::{ProjectGoal, ProjectType, PromptPair, SkillLevel, PERSONA_NAME};

/// Inputs for a project suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRequest {
    pub project_type: ProjectType,
    pub goal: ProjectGoal,
    /// Free text, e.g. "A Watch Box" or "Dragon".
    pub medium: String,
    pub skill_level: SkillLevel,
    pub years_experience: u32,
    pub available_hours: u32,
}

impl ProjectRequest {
    pub const YEARS_RANGE: std::ops::RangeInclusive<u32> = 0..=50;
    pub const HOURS_RANGE: std::ops::RangeInclusive<u32> = 1..=100;
}

impl Default for ProjectRequest {
    fn default() -> Self {
        Self {
            project_type: ProjectType::Woodcarving,
            goal: ProjectGoal::CraftEnjoyment,
            medium: "A Watch Box".to_string(),
            skill_level: SkillLevel::Beginner,
            years_experience: 1,
            available_hours: 10,
        }
    }
}

pub fn project_prompt(request: &ProjectRequest) -> PromptPair {
    let system = format!(
        "Act as the expert woodworking mentor {PERSONA_NAME}. You are a master of small figurine, \
chip, and relief carving, woodburning, and general woodworking. Your goal is to teach and promote \
wood craft through patient and friendly explanations. You enjoy tree-related puns but insight \
always comes first."
    );

    let user = format!(
        "Please help me find my next project by generating a woodworking project idea from these criteria:\n\
- Project Type: {project_type}\n\
- Project Goal: {goal}\n\
- Medium of Interest: {medium}\n\
- My Skill Level: {skill}\n\
- Years of Experience: {years}\n\
- Available Time (in hours): {hours}\n\
Describe the project in detail, including the techniques and tools it needs. Then outline the key \
stages of the project so progress can be tracked and adjusted along the way.",
        project_type = request.project_type.label(),
        goal = request.goal.label(),
        medium = request.medium.trim(),
        skill = request.skill_level.label(),
        years = request.years_experience,
        hours = request.available_hours,
    );

    PromptPair { system, user }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_block_lists_all_six_fields() {
        let request = ProjectRequest {
            project_type: ProjectType::Woodburning,
            goal: ProjectGoal::ShowPiece,
            medium: "  Dragon ".to_string(),
            skill_level: SkillLevel::Advanced,
            years_experience: 12,
            available_hours: 40,
        };
        let prompt = project_prompt(&request);
        for line in [
            "- Project Type: Woodburning",
            "- Project Goal: Show Piece",
            "- Medium of Interest: Dragon",
            "- My Skill Level: Advanced",
            "- Years of Experience: 12",
            "- Available Time (in hours): 40",
        ] {
            assert!(prompt.user.contains(line), "missing line {line:?} in {}", prompt.user);
        }
        assert!(prompt.user.contains("key stages"));
    }

    #[test]
    fn system_block_is_independent_of_request() {
        let a = project_prompt(&ProjectRequest::default());
        let b = project_prompt(&ProjectRequest {
            medium: "Spoon".to_string(),
            ..ProjectRequest::default()
        });
        assert_eq!(a.system, b.system);
        assert!(a.system.contains("Woodshu"));
    }
}
