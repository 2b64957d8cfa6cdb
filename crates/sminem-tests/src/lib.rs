//! Scenario and adversarial test suite for Sminem.
//!
//! Integration tests replay realistic holder/admin sequences against the
//! composed ecosystem and try to break the accounting invariants under
//! randomized inputs.

pub mod helpers;
