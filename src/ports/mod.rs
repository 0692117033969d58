//! Port traits: the collaborator boundary between the domain and the
//! outside world.

pub mod config_port;
pub mod history_port;
pub mod stream_port;
