//! Turning raw model output into messages: detecting code blocks, guessing
//! their language and planning what to send.
//!
//! Everything here is pure and synchronous, so it can be called from any
//! handler task without coordination.

pub mod language;
pub mod render;
pub mod segment;

pub use self::render::{plan, CodeAction, RenderInstruction};
pub use self::segment::segment;
