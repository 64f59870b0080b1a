mod photon;
mod photon_map_builder;
mod photon_tree;

pub use self::photon::*;
pub use self::photon_map_builder::*;
pub use self::photon_tree::*;
