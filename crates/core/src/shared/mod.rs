pub mod constants;
pub mod error_kind;
pub mod pixel_matrix;
pub mod rectangle;
