pub mod envelope;
pub mod message;
pub mod video;
pub mod view;

pub use envelope::Envelope;
pub use message::{SyncMessage, SyncState};
pub use video::parse_video_id;
pub use view::ViewOrientation;
