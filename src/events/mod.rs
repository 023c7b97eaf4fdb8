//! # Events Module
//!
//! Progress reporting for game workflows.
//!
//! The game service emits events through a channel so any front end (CLI,
//! HTTP logs, tests) can follow a round without the core knowing about it.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Workflow(WorkflowEvent::StageChanged { stage }) = event {
//!             println!("{}...", stage);
//!         }
//!     }
//! });
//!
//! let service = GameService::builder().events(sender).build()?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
