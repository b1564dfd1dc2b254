pub mod infrastructure;
pub mod recognize_use_case;
