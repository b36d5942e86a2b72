pub mod clipboard;
pub mod publisher;
pub mod sdk;

pub use clipboard::{Clipboard, SystemClipboard};
pub use publisher::{Fallback, PublishReport, PublishState, Publisher};
pub use sdk::{ComposeSdk, FarcasterClient};
