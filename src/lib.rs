//! # bmp_planes 库
//!
//! 本库包含 8 位 BMP 位平面工具的核心逻辑：
//! BMP 容器的解析与序列化、位平面可视化、数据嵌入与提取。

// 声明库包含的所有模块。

pub mod bitmap;
pub mod cli;
pub mod constants;
pub mod error;
pub mod handler;
pub mod plane;
pub mod steganography;

pub use bitmap::Bitmap;
pub use error::{ErrorKind, StegoError};
pub use plane::BitPlane;
