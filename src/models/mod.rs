pub mod account;
pub mod attendance;
pub mod device;
pub mod pending;
pub mod rfid;
pub mod schedule;
pub mod student;

pub use account::*;
pub use attendance::*;
pub use device::*;
pub use pending::*;
pub use rfid::*;
pub use schedule::*;
pub use student::*;
