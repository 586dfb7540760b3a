//! Key and mouse binding tables: the chain-aware key grabber and the
//! context-aware mouse binding table.
pub mod keys;
pub mod mouse;

pub use keys::{ChainOutcome, KeyContext, KeyGrabber, KeyPress, ModMask};
pub use mouse::{ActionContext, MouseBinding, MouseButton, MouseState, MouseTable};
