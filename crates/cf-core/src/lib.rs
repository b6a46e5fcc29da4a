pub mod body;
pub mod element;
pub mod error;
pub mod events;
pub mod timing;
pub mod types;

pub use body::*;
pub use element::*;
pub use error::FunnelError;
pub use events::*;
pub use timing::*;
pub use types::*;
