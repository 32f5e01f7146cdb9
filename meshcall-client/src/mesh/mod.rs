mod mesh;
mod mesh_command;
mod mesh_handle;
mod mesh_snapshot;
mod peer_link;

pub use mesh::*;
pub use mesh_command::*;
pub use mesh_handle::*;
pub use mesh_snapshot::*;
pub use peer_link::*;
