//! 视图模型层

pub mod bridge;
pub mod session;
