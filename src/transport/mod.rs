/// Filesystem walking and file reads.
pub mod fs;
