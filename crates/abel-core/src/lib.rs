pub mod auth;
pub mod error;
pub mod ledger;
pub mod registry;
#[cfg(test)]
mod test_util;
pub mod types;

pub use error::{CoreError, LabelingError, Subject};
pub use registry::Registry;
pub use types::{AssetId, LabelDescriptor, LabelId, Principal};
