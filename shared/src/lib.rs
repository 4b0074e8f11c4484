pub mod data;
pub mod forms;
pub mod validation;
