//! Stage progression for a division.
//!
//! Completion transitions (RR_COMPLETE, PLAY_IN_COMPLETE, COMPLETE) follow
//! from recorded results. Entering PLAY_IN or ELIMINATION is an explicit
//! director action so seeding can be reviewed before the bracket is locked.

pub mod progressor;

pub use progressor::{SlotWrite, StagePlan, StageProgressor};
