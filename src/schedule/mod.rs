pub mod conflict;
pub mod expander;
pub mod types;

pub use conflict::{
    circular_gap, detect_time_conflicts, detect_timing_interactions, ConflictSeverity,
    ConflictType, ScheduleConflict,
};
pub use expander::{expand, expand_occurrences, expand_times, is_cyclic_active, tapered_dose_on};
pub use types::{ComplexEntry, DoseOccurrence, ScaleTier, ScheduleConfigError, ScheduleSpec};
