//! Publishing: final upload of a staged clip to the video platform.

mod error;
mod http;
mod traits;
mod types;

pub use error::PublishError;
pub use http::{HttpPublishClient, PublisherConfig};
pub use traits::PublishingService;
pub use types::{PublishMetadata, Visibility};
