/// 缓存操作
pub mod session;
pub mod throttle;

pub use session::*;
pub use throttle::*;
