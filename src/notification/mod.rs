pub mod events;

pub use events::{EventBus, TokenEvent, TokenEventKind};
