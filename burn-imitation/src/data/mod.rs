pub mod array_file;
pub mod dataset;
pub mod history;
pub mod rollout;
pub mod util;
