pub mod geometric;
pub mod traits;

pub use geometric::{BoundedGeometricMechanism, Bounds, GeometricMechanism};
pub use traits::{Mechanism, MechanismError};
