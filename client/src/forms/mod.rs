pub mod goal_form;

pub use goal_form::{GoalDraft, GoalImage, GoalPatch};
