//! Utility functions for display formatting.

pub mod format;

pub use format::{
    format_duration, format_number, format_people_affected, format_people_count, format_timestamp,
};
