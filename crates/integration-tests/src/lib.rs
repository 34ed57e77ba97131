//! Integration tests for Chalkboard.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the server against a Firebase project (or the emulator suite)
//! cargo run -p chalkboard-web
//!
//! # Run integration tests
//! cargo test -p chalkboard-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `educator_courses` - Educator surface: course and lesson lifecycle
//! - `student_enrollment` - Student surface: signup, browse, enroll
//!
//! Tests are `#[ignore]`d by default because they need a running server
//! with live Firebase credentials; the in-process workflow tests live in
//! `chalkboard-web/tests` and run everywhere.
