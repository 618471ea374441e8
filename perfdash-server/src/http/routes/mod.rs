//! Route modules, one per concern.

pub mod dashboard;
pub mod health;
pub mod measurements;
pub mod rules;
