pub mod network;
pub mod package;
pub mod validator;

pub use network::{Activation, Layer, PolicyNetwork};
pub use package::{PolicyMetadata, PolicyPackage};
pub use validator::{validate, Compatibility, TopologyMetadata};
