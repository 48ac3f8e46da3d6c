pub mod classify;
pub mod fs_scan;
pub mod normalize;
