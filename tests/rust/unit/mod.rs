mod path_algebra_tests;
mod statement_tests;
