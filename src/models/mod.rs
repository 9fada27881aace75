// Models module - typed views of the SpaceTraders wire format
pub mod agent;
pub mod contract;
pub mod faction;
pub mod market;
pub mod responses;
pub mod ship;
pub mod system;
pub mod waypoint;

pub use agent::*;
pub use contract::*;
pub use faction::*;
pub use market::*;
pub use responses::*;
pub use ship::*;
pub use system::*;
pub use waypoint::*;
