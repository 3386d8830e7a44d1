//! s3client library
//!
//! The shell is exposed as a library so the dispatcher can be driven from
//! integration tests with an in-memory store and scripted input.

pub mod app;
pub mod commands;
pub mod exit_code;
pub mod output;
pub mod shell;
