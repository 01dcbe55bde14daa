pub mod adapter;
pub mod mock;
pub mod widget;

pub use adapter::{LocalEvent, PlayerAdapter, PlayerCommand};
pub use mock::{MockWidget, WidgetCall};
pub use widget::{NativeState, PlayerWidget, WidgetOptions, WidgetResult, WidgetStatus};
