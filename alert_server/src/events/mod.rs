//! Disposition events.
//!
//! A viewed alert moves through events to its recorded state; the aggregate
//! rejects transitions that would write twice or skip the issue message.

pub mod disposition;
