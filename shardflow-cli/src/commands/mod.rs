//! CLI Commands

pub mod check;
pub mod root;
pub mod select;
