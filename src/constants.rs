/// BMP 文件头 (BITMAPFILEHEADER) 的固定大小 (字节)。
pub const FILE_HEADER_SIZE: usize = 14;

/// 信息头 (BITMAPINFOHEADER) 的固定大小 (字节)。
pub const INFO_HEADER_SIZE: usize = 40;

/// 8 位调色板的大小：256 个 4 字节的颜色项。
/// 无论 `colors_used` 字段写的是多少，始终读取这么多字节。
pub const PALETTE_SIZE: usize = 256 * 4;

/// 像素数据在紧凑布局下的起始偏移量。
pub const PIXEL_DATA_OFFSET: usize = FILE_HEADER_SIZE + INFO_HEADER_SIZE + PALETTE_SIZE;

/// 本工具唯一支持的位深度。
pub const SUPPORTED_BITS_PER_PIXEL: u16 = 8;

/// 每一行像素数据都按这个字节数对齐。
pub const ROW_ALIGNMENT: usize = 4;

/// 隐藏数据前面的长度前缀位数 (大端 `u32`)。
pub const LENGTH_PREFIX_BITS: usize = 32;

/// 位平面可视化时，置位像素的输出值。
pub const PLANE_ON: u8 = 255;

/// 位平面可视化时，未置位像素的输出值。
pub const PLANE_OFF: u8 = 0;
