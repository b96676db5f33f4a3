//! API groups handed out by [`Node`](crate::Node). Each group is a cheap
//! handle holding a node clone, so it can be moved into spawned tasks.

mod block;
mod files;
mod object;
mod pin;
mod repo;
mod swarm;

pub use block::{BlockGroup, BlockStat};
pub use files::FilesGroup;
pub use object::{ObjectGroup, PatchGroup};
pub use pin::PinGroup;
pub use repo::{RepoGroup, RepoStat};
pub use swarm::SwarmGroup;
