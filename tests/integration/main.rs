//! Integration test driver for the `tests/integration/` submodules.
//!
//! Each `mod` below maps to a file that exercises one service or adapter
//! stack against mocks or the host simulations.  All tests run on the
//! host with no real hardware required.

mod adapter_tests;
mod camera_tests;
mod controller_tests;
mod mock_hw;
