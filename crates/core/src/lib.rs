//! s3c-core: Core library for the s3client shell
//!
//! This crate provides the core functionality of the shell, including:
//! - Command line tokenizing with quote continuation
//! - Connection targets and shell settings
//! - Virtual directories and session navigation over flat object keys
//! - Batch operations over listings
//! - Completion candidates
//! - ObjectStore trait for S3 operations
//!
//! This crate is designed to be independent of any specific S3 SDK,
//! allowing for easy testing and potential future support for other backends.

pub mod batch;
pub mod completion;
pub mod config;
pub mod environment;
pub mod error;
pub mod input;
#[cfg(any(test, feature = "testing"))]
pub mod memory;
pub mod path;
pub mod session;
pub mod tokenizer;
pub mod traits;

pub use batch::{BatchObserver, BatchResult, Transform};
pub use completion::{ArgKind, Candidate};
pub use config::{ColorMode, Config, ConfigManager, ShellSettings};
pub use environment::{ConnectionTarget, EnvironmentManager, TargetOrigin};
pub use error::{Error, Result};
pub use input::LineSource;
pub use path::{Location, Stat};
pub use session::{Navigation, Session};
pub use traits::{ObjectInfo, ObjectStore, ObjectStream};
