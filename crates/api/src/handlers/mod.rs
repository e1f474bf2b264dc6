pub mod registration;
pub mod task;
