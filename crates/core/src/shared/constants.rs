/// Model files with any other `format_version` are rejected on load.
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// Features per FHOG cell: 18 contrast-sensitive, 9 contrast-insensitive, 4 texture.
pub const FHOG_FEATURES: usize = 31;

pub const DEFAULT_CELL_SIZE: usize = 8;

/// `N` of the `(N-1)/N` pyramid step.
pub const DEFAULT_PYRAMID_DOWNSAMPLE: u32 = 6;

pub const DEFAULT_MAX_PYRAMID_LEVELS: usize = 1000;

pub const DEFAULT_IOU_THRESHOLD: f64 = 0.5;
pub const DEFAULT_PERCENT_COVERED_THRESHOLD: f64 = 1.0;

pub const JPEG_EXTENSIONS: &[&str] = &["jpg", "jpeg"];
