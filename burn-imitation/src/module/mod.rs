pub mod component;
pub mod expert;
pub mod nn;
