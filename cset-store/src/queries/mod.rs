pub mod annotations;
pub mod cset_log;
pub mod latest_file_mod;
