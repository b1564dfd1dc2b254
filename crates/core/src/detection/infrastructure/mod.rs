pub mod detector_model;
pub mod fhog;
pub mod fhog_scanner;
pub mod image_pyramid;
