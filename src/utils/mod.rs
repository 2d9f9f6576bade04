pub mod parameter_substitution;
