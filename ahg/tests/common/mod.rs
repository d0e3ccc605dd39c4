pub mod fixtures;
pub mod logging;

pub use fixtures::TestProject;
pub use logging::init_test_logging;
