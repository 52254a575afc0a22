mod admin;
pub use admin::{AdminReply, CallbackResult, HandleCallback, RegistryParam};

mod reply;
pub use reply::{ApiReply, BeatData, IdleData};

mod requests;
pub use requests::{IdleRequest, KillRequest, LogRequest, LogResult};
