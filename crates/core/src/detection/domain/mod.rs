pub mod object_scanner;
pub mod overlap_tester;
