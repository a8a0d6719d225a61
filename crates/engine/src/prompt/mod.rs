//! Prompt composition for the three tutor use cases.
//!
//! Every builder is pure: it takes the request fields and returns the
//! system/user message pair sent to the completion service.

mod critique;
mod material;
mod project;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use critique::{critique_prompt, CritiqueRequest};
pub use material::{
    material_prompt, strip_annotations, MaterialRequest, MaterialSummary, MATERIAL_LABELS,
    NEXT_STEPS_TEXT,
};
pub use project::{project_prompt, ProjectRequest};

/// Persona shared by every system message.
const PERSONA_NAME: &str = "Woodshu";

/// A system-role and a user-role message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

/// Declares a closed set of labelled choices with `FromStr` accepting the
/// label (any case) or its kebab-case form.
macro_rules! choice_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_lowercase().replace(['-', '_'], " ");
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.label().to_lowercase() == wanted)
                    .ok_or_else(|| {
                        let options: Vec<&str> = $name::ALL.iter().map(|v| v.label()).collect();
                        format!("unknown value '{}' (expected one of: {})", s, options.join(", "))
                    })
            }
        }
    };
}

choice_enum!(
    /// Self-reported carving skill.
    SkillLevel {
        Beginner => "Beginner",
        Intermediate => "Intermediate",
        Advanced => "Advanced",
    }
);

choice_enum!(
    /// Who made the carving under critique.
    Ownership {
        Me => "Me",
        Another => "Another",
    }
);

choice_enum!(
    ProjectType {
        Woodcarving => "Woodcarving",
        Woodburning => "Woodburning",
        Woodworking => "Woodworking",
    }
);

choice_enum!(
    ProjectGoal {
        CraftEnjoyment => "Craft Enjoyment",
        Skillbuilding => "Skillbuilding",
        ShowPiece => "Show Piece",
    }
);

impl Ownership {
    /// Accepts the `self`/`other` spellings as well as the labels.
    pub fn parse_loose(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "self" | "mine" => Ok(Ownership::Me),
            "other" | "someone else" => Ok(Ownership::Another),
            _ => s.parse(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choices_parse_labels_and_kebab_case() {
        assert_eq!("advanced".parse::<SkillLevel>(), Ok(SkillLevel::Advanced));
        assert_eq!("Show Piece".parse::<ProjectGoal>(), Ok(ProjectGoal::ShowPiece));
        assert_eq!("craft-enjoyment".parse::<ProjectGoal>(), Ok(ProjectGoal::CraftEnjoyment));
        assert_eq!("WOODBURNING".parse::<ProjectType>(), Ok(ProjectType::Woodburning));
    }

    #[test]
    fn unknown_choice_lists_options() {
        let err = "expert".parse::<SkillLevel>().unwrap_err();
        assert!(err.contains("Beginner, Intermediate, Advanced"));
    }

    #[test]
    fn ownership_accepts_self_and_other() {
        assert_eq!(Ownership::parse_loose("self"), Ok(Ownership::Me));
        assert_eq!(Ownership::parse_loose("other"), Ok(Ownership::Another));
        assert_eq!(Ownership::parse_loose("me"), Ok(Ownership::Me));
        assert!(Ownership::parse_loose("nobody").is_err());
    }
}
