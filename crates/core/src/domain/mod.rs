pub mod draft;
pub mod offering;
pub mod submission;
