//! Model-based testing of several clients against the scripted server.
//!
//! Generated [`Operation`]s drive real [`parley_client::Client`]s through a
//! [`World`] on virtual time. The scripted server is the oracle: once the world
//! settles, every connected client's identity and roster must match what the
//! server knows.

mod operation;
mod world;

pub use operation::{ClientId, Operation, SmallText};
pub use world::World;
