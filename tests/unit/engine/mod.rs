//! Container engine tests

pub mod container_test;
pub mod registry_operations_test;
