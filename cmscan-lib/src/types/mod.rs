#![allow(unreachable_pub)]

mod error;
mod host;
mod outcome;
mod service;

pub use error::ErrorKind;
pub use host::Host;
pub use outcome::{Detection, Outcome, ScanResult};
pub use service::{
    ServiceResponse, ServiceResult, ServiceStatus, Technology, RATE_LIMIT_CODE, SUCCESS_CODE,
};

/// The cmscan `Result` type
pub type Result<T> = std::result::Result<T, crate::ErrorKind>;
