//! Partition segment arithmetic
//!
//! Partition values are not stored in the data files. They are read back from
//! the object path, which is assumed to hold one `key=value` segment per
//! partition, in declared order, directly below the stage path.

/// Number of `/`-separated segments in a resolved stage path
pub fn stage_depth(stage_path: &str) -> usize {
    stage_path.trim_end_matches('/').split('/').count()
}

/// Path segment index holding the partition at `position` (zero-based)
pub fn partition_segment_index(stage_path: &str, position: usize) -> usize {
    stage_depth(stage_path) + position
}
