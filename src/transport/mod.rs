/// Filesystem loading of configuration files and report dumps.
pub mod fs;
