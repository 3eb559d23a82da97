//! Integration tests for loadhook.

mod helpers;

mod config_test;
mod core_module_test;
mod end_to_end_test;
mod reentrant_test;
mod replay_test;
