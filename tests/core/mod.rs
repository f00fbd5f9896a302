pub mod axis_tests;
pub mod settings_tests;
