//! Integration tests - route tables loaded from text or files and compiled
//! end to end through the public API.

mod route_compiler_tests;
mod route_table_loading_tests;
