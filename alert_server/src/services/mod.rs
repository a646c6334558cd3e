//! Dashboard business logic over the warehouse and the chat webhook.

pub mod alert_service;
pub mod disposition_service;
pub mod session_service;
pub mod teams_service;
pub mod warehouse;
