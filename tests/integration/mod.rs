pub mod workflow_tests;
