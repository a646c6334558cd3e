//! Alert data models.

pub mod alert;
pub mod annotation;
pub mod notification;
pub mod variant;
