//! Integration test entry point for treesync-client.

mod common;
mod test_push;
