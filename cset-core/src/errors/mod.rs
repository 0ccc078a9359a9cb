mod cset_error;

pub use cset_error::{CsetError, CsetResult};
