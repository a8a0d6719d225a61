use serde::{Deserialize, Serialize};

use super::{PromptPair, PERSONA_NAME};

/// Inputs for a wood species lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialRequest {
    pub material_name: String,
}

impl MaterialRequest {
    pub fn new(material_name: impl Into<String>) -> Self {
        Self {
            material_name: material_name.into(),
        }
    }
}

/// Labels of the answer format, in the order the model must emit them.
pub const MATERIAL_LABELS: [&str; 8] = [
    "Wood being Summarized",
    "Wood Type",
    "Carvability",
    "Recommended Carving Level",
    "Key Woodworking Uses",
    "Possible Safety Concerns",
    "History and Summary",
    "Next Steps",
];

/// Fixed closing instruction of every summary.
pub const NEXT_STEPS_TEXT: &str =
    "To learn about a different wood, select a new wood from the list and ask again.";

// Square brackets mark guidance for the model; they never reach the output.
const ANSWER_TEMPLATE: &str = "\
Wood being Summarized: [{name}]
Wood Type: [Softwood or Hardwood]
Carvability: [Low, Medium, High, or Not Suited for Carving]
Recommended Carving Level: [Beginner, Intermediate, Advanced, or Not Suited for Carving]
Key Woodworking Uses: [Flooring, Decoration, Construction, or similar keywords]
Possible Safety Concerns: [Harmful sawdust, caustic sap and similar hazards; otherwise \"None\"]
History and Summary:
[A short paragraph on the history of the wood's discovery, botanical facts such as height and life expectancy, and the regions where it is most common.]
Next Steps:
{next_steps}";

/// Remove square-bracket annotation markers, keeping their contents.
pub fn strip_annotations(text: &str) -> String {
    text.chars().filter(|c| !matches!(c, '[' | ']')).collect()
}

pub fn material_prompt(request: &MaterialRequest) -> PromptPair {
    let system = format!(
        "Act as the expert woodcarving mentor {PERSONA_NAME}. You are a master of small figurine, \
chip, and relief carving and want to promote the craft through patient and friendly delivery of \
wood-related information. You enjoy tree-related puns but insight always comes first."
    );

    let name = strip_annotations(request.material_name.trim());
    let format = ANSWER_TEMPLATE
        .replace("{name}", &name)
        .replace("{next_steps}", NEXT_STEPS_TEXT);
    let format = strip_annotations(&format);

    let user = format!(
        "I want to better understand the following type of wood: {name}.\n\
Format the answer exactly as shown between the ``` fences, keeping every label in the same order. \
The text after each label describes what belongs there; replace it with the answer. Copy the \
Next Steps text unchanged and do not include the fences.\n\
```\n{format}\n```"
    );

    PromptPair { system, user }
}

/// A wood summary read back from the labelled answer format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MaterialSummary {
    pub name: String,
    pub wood_type: String,
    pub carvability: String,
    pub carving_level: String,
    pub uses: String,
    pub safety_concerns: String,
    pub history: String,
    pub next_steps: String,
    /// Problems found while reading the answer (missing labels, etc.)
    pub warnings: Vec<String>,
}

impl MaterialSummary {
    /// Parse a labelled answer. Unknown lines are folded into the field
    /// above them; missing labels produce warnings, not errors.
    pub fn parse(text: &str) -> Self {
        let mut fields: [String; 8] = Default::default();
        let mut seen = [false; 8];
        let mut current: Option<usize> = None;

        for raw in text.lines() {
            let line = raw.trim();
            if line.starts_with("```") {
                continue;
            }
            if let Some((idx, rest)) = match_label(line) {
                seen[idx] = true;
                current = Some(idx);
                if !rest.is_empty() {
                    fields[idx] = rest.to_string();
                }
                continue;
            }
            if let Some(idx) = current {
                if line.is_empty() {
                    continue;
                }
                if !fields[idx].is_empty() {
                    fields[idx].push(' ');
                }
                fields[idx].push_str(line);
            }
        }

        let warnings = MATERIAL_LABELS
            .iter()
            .zip(seen)
            .filter(|(_, present)| !present)
            .map(|(label, _)| format!("missing field '{label}'"))
            .collect();

        let [name, wood_type, carvability, carving_level, uses, safety_concerns, history, next_steps] =
            fields;
        Self {
            name,
            wood_type,
            carvability,
            carving_level,
            uses,
            safety_concerns,
            history,
            next_steps,
            warnings,
        }
    }

    /// `None` when the model reported no safety concerns.
    pub fn safety(&self) -> Option<&str> {
        let s = self.safety_concerns.trim().trim_matches('"');
        if s.is_empty() || s.eq_ignore_ascii_case("none") {
            None
        } else {
            Some(self.safety_concerns.trim())
        }
    }
}

fn match_label(line: &str) -> Option<(usize, &str)> {
    MATERIAL_LABELS.iter().enumerate().find_map(|(idx, label)| {
        let rest = line.strip_prefix(label)?.trim_start();
        let rest = rest.strip_prefix(':')?;
        Some((idx, rest.trim()))
    })
}
