//! Consolidated test modules.
//!
//! This module contains end-to-end tests that drive the configuration screen
//! against real stores and a mocked release feed.
