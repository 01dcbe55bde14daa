pub mod engine;
pub mod session;

pub use engine::{PlaybackState, Reaction, SyncEngine};
pub use session::{NativeSignal, SessionHandle, SessionStats, SyncSession};
