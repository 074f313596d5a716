// Test modules for natlearn
// Each module covers the corresponding source module

mod recorder_tests;
mod registry_tests;
