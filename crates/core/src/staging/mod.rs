//! Remote staging: temporary storage for edited clips between the
//! edit and publish phases.

mod error;
mod http;
mod traits;

pub use error::StagingError;
pub use http::{HttpStagingClient, StagingConfig};
pub use traits::{ByteStream, StagingService};
