pub mod clock;
pub mod remote_session;

pub use clock::Clock;
pub use remote_session::{Api, RemoteResponse, RemoteSession};
