pub mod domain;
pub mod error;
pub mod protocol;
pub mod range;

pub use range::{is_abnormal, ReferenceRange};
