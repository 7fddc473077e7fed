//! Persistent model of the tracker: SeaORM entities plus the validation and
//! access rules that guard them.

pub mod access;
pub mod entities;
pub mod validation;
