//! Editable input forms for the three pages.
//!
//! Each page's request type doubles as its form state, so triggering a page
//! is just cloning the form. Fields are addressed by index in display order.

use std::ops::RangeInclusive;

use woodshu_engine::prompt::{
    CritiqueRequest, Ownership, ProjectGoal, ProjectRequest, ProjectType, SkillLevel,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text, edited in place.
    Text,
    /// Closed set of options, cycled with left/right.
    Choice,
    /// Bounded integer, stepped with left/right.
    Number,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldView {
    pub label: &'static str,
    pub value: String,
    pub kind: FieldKind,
}

impl FieldView {
    fn new(label: &'static str, value: impl ToString, kind: FieldKind) -> Self {
        Self { label, value: value.to_string(), kind }
    }
}

pub trait Form {
    fn fields(&self) -> Vec<FieldView>;

    /// Move a choice or number field by `delta` steps. Text fields ignore it.
    fn step(&mut self, field: usize, delta: i32);

    /// Text field handle for `field`, if it is one.
    fn text_mut(&mut self, field: usize) -> Option<&mut String>;
}

fn cycle<T: Copy + PartialEq>(all: &[T], current: T, delta: i32) -> T {
    let len = all.len() as i32;
    let pos = all.iter().position(|v| *v == current).unwrap_or(0) as i32;
    all[(pos + delta).rem_euclid(len) as usize]
}

fn bump(value: u32, delta: i32, range: &RangeInclusive<u32>) -> u32 {
    let next = i64::from(value) + i64::from(delta);
    next.clamp(i64::from(*range.start()), i64::from(*range.end())) as u32
}

impl Form for CritiqueRequest {
    fn fields(&self) -> Vec<FieldView> {
        vec![
            FieldView::new("Carving image URL", &self.image_url, FieldKind::Text),
            FieldView::new("Carving belongs to", self.ownership, FieldKind::Choice),
            FieldView::new("Carver years of experience", self.years_experience, FieldKind::Number),
            FieldView::new("Carver skill level", self.skill_level, FieldKind::Choice),
        ]
    }

    fn step(&mut self, field: usize, delta: i32) {
        match field {
            1 => self.ownership = cycle(Ownership::ALL, self.ownership, delta),
            2 => self.years_experience = bump(self.years_experience, delta, &Self::YEARS_RANGE),
            3 => self.skill_level = cycle(SkillLevel::ALL, self.skill_level, delta),
            _ => {}
        }
    }

    fn text_mut(&mut self, field: usize) -> Option<&mut String> {
        (field == 0).then_some(&mut self.image_url)
    }
}

impl Form for ProjectRequest {
    fn fields(&self) -> Vec<FieldView> {
        vec![
            FieldView::new("Project type", self.project_type, FieldKind::Choice),
            FieldView::new("Project goal", self.goal, FieldKind::Choice),
            FieldView::new("What to work on", &self.medium, FieldKind::Text),
            FieldView::new("Your skill", self.skill_level, FieldKind::Choice),
            FieldView::new("Years experience", self.years_experience, FieldKind::Number),
            FieldView::new("Time available (hours)", self.available_hours, FieldKind::Number),
        ]
    }

    fn step(&mut self, field: usize, delta: i32) {
        match field {
            0 => self.project_type = cycle(ProjectType::ALL, self.project_type, delta),
            1 => self.goal = cycle(ProjectGoal::ALL, self.goal, delta),
            3 => self.skill_level = cycle(SkillLevel::ALL, self.skill_level, delta),
            4 => self.years_experience = bump(self.years_experience, delta, &Self::YEARS_RANGE),
            5 => self.available_hours = bump(self.available_hours, delta, &Self::HOURS_RANGE),
            _ => {}
        }
    }

    fn text_mut(&mut self, field: usize) -> Option<&mut String> {
        (field == 2).then_some(&mut self.medium)
    }
}

/// Wood page form: a pick from the species list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WoodForm {
    names: Vec<String>,
    selected: usize,
}

impl WoodForm {
    pub fn new(names: Vec<String>) -> Self {
        Self { names, selected: 0 }
    }

    pub fn selected(&self) -> Option<&str> {
        self.names.get(self.selected).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Form for WoodForm {
    fn fields(&self) -> Vec<FieldView> {
        let value = match self.selected() {
            Some(name) => format!("{} ({}/{})", name, self.selected + 1, self.names.len()),
            None => "(no species loaded)".to_string(),
        };
        vec![FieldView::new("Wood species", value, FieldKind::Choice)]
    }

    fn step(&mut self, field: usize, delta: i32) {
        if field == 0 && !self.names.is_empty() {
            let len = self.names.len() as i32;
            self.selected = (self.selected as i32 + delta).rem_euclid(len) as usize;
        }
    }

    fn text_mut(&mut self, _field: usize) -> Option<&mut String> {
        None
    }
}
