use serde::{Deserialize, Serialize};

use super::{Ownership, PromptPair, SkillLevel, PERSONA_NAME};

/// Inputs for a carving critique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CritiqueRequest {
    pub image_url: String,
    pub ownership: Ownership,
    pub years_experience: u32,
    pub skill_level: SkillLevel,
}

impl CritiqueRequest {
    /// Accepted range for `years_experience`.
    pub const YEARS_RANGE: std::ops::RangeInclusive<u32> = 0..=20;
}

impl Default for CritiqueRequest {
    fn default() -> Self {
        Self {
            image_url: "https://tinyurl.com/3kwxcfwp".to_string(),
            ownership: Ownership::Another,
            years_experience: 10,
            skill_level: SkillLevel::Advanced,
        }
    }
}

pub fn critique_prompt(request: &CritiqueRequest) -> PromptPair {
    let system = format!(
        "Act as the expert woodcarving mentor {PERSONA_NAME}. You are a master of small figurine, \
chip, and relief carving and want to promote the craft through patient, friendly, constructive \
criticism. You enjoy tree-related puns but insight always comes first. The user knows you are an AI.

Evaluate the submitted woodcarving on space usage, texture execution, form development, value \
application, shape definition, and line quality. Consider how each element contributes to the \
overall composition, depth, visual appeal, tactile quality, and narrative.

Give an overall score out of 10, adjusted for the carver's reported skill level and experience. \
Then give concise, actionable advice on the top three areas for improvement, favouring suggestions \
that improve both this carving and the carver's skills.

Pronoun rule: when the carver is \"Me\", address the carver directly with second-person pronouns \
(you, your, yours). When the carver is \"Another\", refer to the carver in the third person \
(they, them, theirs) and never as you."
    );

    let opening = match request.ownership {
        Ownership::Me => {
            "I carved this piece and want to understand its nuances and how I can improve my own craft."
        }
        Ownership::Another => {
            "This piece was carved by another carver. I want to understand its nuances and how I can \
apply the lessons to my own craft."
        }
    };

    let user = format!(
        "{opening}\n\
The following details should calibrate the score:\n\
- The Carver: {owner}\n\
- The Carver's Estimated Years of Experience: {years}\n\
- The Carver's Estimated Skill Level: {skill}",
        owner = request.ownership.label(),
        years = request.years_experience,
        skill = request.skill_level.label(),
    );

    PromptPair { system, user }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND_PERSON: &[&str] = &["you", "your", "yours", "yourself"];
    const THIRD_PERSON: &[&str] = &[
        "he", "him", "his", "she", "her", "hers", "they", "them", "their", "theirs",
    ];

    fn words(text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric() && c != '\'')
            .filter(|w| !w.is_empty())
            .map(|w| w.to_lowercase())
            .collect()
    }

    fn request(ownership: Ownership) -> CritiqueRequest {
        CritiqueRequest {
            image_url: "https://example.com/owl.jpg".to_string(),
            ownership,
            years_experience: 3,
            skill_level: SkillLevel::Intermediate,
        }
    }

    #[test]
    fn own_carving_has_no_third_person_pronouns() {
        let prompt = critique_prompt(&request(Ownership::Me));
        let found: Vec<String> = words(&prompt.user)
            .into_iter()
            .filter(|w| THIRD_PERSON.contains(&w.as_str()))
            .collect();
        assert!(found.is_empty(), "third-person pronouns in: {}", prompt.user);
    }

    #[test]
    fn other_carving_has_no_second_person_pronouns() {
        let prompt = critique_prompt(&request(Ownership::Another));
        let found: Vec<String> = words(&prompt.user)
            .into_iter()
            .filter(|w| SECOND_PERSON.contains(&w.as_str()))
            .collect();
        assert!(found.is_empty(), "second-person pronouns in: {}", prompt.user);
    }

    #[test]
    fn user_block_carries_calibration_fields() {
        let prompt = critique_prompt(&request(Ownership::Me));
        assert!(prompt.user.contains("The Carver: Me"));
        assert!(prompt.user.contains("Years of Experience: 3"));
        assert!(prompt.user.contains("Skill Level: Intermediate"));
    }

    #[test]
    fn system_block_lists_criteria_and_pronoun_rule() {
        let prompt = critique_prompt(&request(Ownership::Another));
        for criterion in ["space usage", "texture", "form", "value", "shape", "line quality"] {
            assert!(prompt.system.contains(criterion), "missing {criterion}");
        }
        assert!(prompt.system.contains("score out of 10"));
        assert!(prompt.system.contains("Pronoun rule"));
    }
}
