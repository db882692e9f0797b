//! Askama view models and template rendering helpers.

pub mod views;
