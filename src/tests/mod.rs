mod controller_tests;
mod display_tests;
