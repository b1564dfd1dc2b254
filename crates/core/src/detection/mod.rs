pub mod detection_engine;
pub mod domain;
pub mod infrastructure;
