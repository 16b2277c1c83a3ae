//! Organize Module
//!
//! Seeded split assignment and copying of raw recordings into the
//! `<split>/<class>` directory tree.

mod organizer;
mod split;

pub use organizer::{DatasetOrganizer, OrganizeReport, Placement};
pub use split::{Split, SplitThresholds};
