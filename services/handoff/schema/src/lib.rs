//! sea-orm entities for the handoff service tables.

pub mod handoff_records;
pub mod orders;
