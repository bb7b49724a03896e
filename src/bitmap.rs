//! # BMP 容器模块
//!
//! 负责 8 位调色板 BMP 文件的解析与序列化。
//! 文件头、信息头、调色板和像素数据按原样保留，
//! 每行像素数据按 4 字节对齐 (行跨度 `row_stride`)。
//!
//! 所有多字节字段都是小端序，通过 `byteorder` 逐字段读写，
//! 不依赖结构体的内存布局。

use crate::constants::{
    FILE_HEADER_SIZE, INFO_HEADER_SIZE, PALETTE_SIZE, PIXEL_DATA_OFFSET, ROW_ALIGNMENT,
    SUPPORTED_BITS_PER_PIXEL,
};
use crate::error::{Result, StegoError};
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use std::io::{Read, Write};

/// BITMAPFILEHEADER，固定 14 字节。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub signature: [u8; 2],
    pub file_size: u32,
    pub reserved1: u16,
    pub reserved2: u16,
    pub pixel_offset: u32,
}

impl FileHeader {
    fn read_from<R: Read>(reader: &mut R) -> std::io::Result<Self> {
        let mut signature = [0u8; 2];
        reader.read_exact(&mut signature)?;
        Ok(Self {
            signature,
            file_size: reader.read_u32::<LittleEndian>()?,
            reserved1: reader.read_u16::<LittleEndian>()?,
            reserved2: reader.read_u16::<LittleEndian>()?,
            pixel_offset: reader.read_u32::<LittleEndian>()?,
        })
    }

    pub fn to_bytes(&self) -> [u8; FILE_HEADER_SIZE] {
        let mut buf = [0u8; FILE_HEADER_SIZE];
        buf[0..2].copy_from_slice(&self.signature);
        LittleEndian::write_u32(&mut buf[2..6], self.file_size);
        LittleEndian::write_u16(&mut buf[6..8], self.reserved1);
        LittleEndian::write_u16(&mut buf[8..10], self.reserved2);
        LittleEndian::write_u32(&mut buf[10..14], self.pixel_offset);
        buf
    }
}

/// BITMAPINFOHEADER，固定 40 字节。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InfoHeader {
    pub header_size: u32,
    pub width: i32,
    pub height: i32,
    pub planes: u16,
    pub bits_per_pixel: u16,
    pub compression: u32,
    pub image_size: u32,
    pub x_pixels_per_meter: i32,
    pub y_pixels_per_meter: i32,
    pub colors_used: u32,
    pub colors_important: u32,
}

impl InfoHeader {
    fn read_from<R: Read>(reader: &mut R) -> std::io::Result<Self> {
        Ok(Self {
            header_size: reader.read_u32::<LittleEndian>()?,
            width: reader.read_i32::<LittleEndian>()?,
            height: reader.read_i32::<LittleEndian>()?,
            planes: reader.read_u16::<LittleEndian>()?,
            bits_per_pixel: reader.read_u16::<LittleEndian>()?,
            compression: reader.read_u32::<LittleEndian>()?,
            image_size: reader.read_u32::<LittleEndian>()?,
            x_pixels_per_meter: reader.read_i32::<LittleEndian>()?,
            y_pixels_per_meter: reader.read_i32::<LittleEndian>()?,
            colors_used: reader.read_u32::<LittleEndian>()?,
            colors_important: reader.read_u32::<LittleEndian>()?,
        })
    }

    pub fn to_bytes(&self) -> [u8; INFO_HEADER_SIZE] {
        let mut buf = [0u8; INFO_HEADER_SIZE];
        LittleEndian::write_u32(&mut buf[0..4], self.header_size);
        LittleEndian::write_i32(&mut buf[4..8], self.width);
        LittleEndian::write_i32(&mut buf[8..12], self.height);
        LittleEndian::write_u16(&mut buf[12..14], self.planes);
        LittleEndian::write_u16(&mut buf[14..16], self.bits_per_pixel);
        LittleEndian::write_u32(&mut buf[16..20], self.compression);
        LittleEndian::write_u32(&mut buf[20..24], self.image_size);
        LittleEndian::write_i32(&mut buf[24..28], self.x_pixels_per_meter);
        LittleEndian::write_i32(&mut buf[28..32], self.y_pixels_per_meter);
        LittleEndian::write_u32(&mut buf[32..36], self.colors_used);
        LittleEndian::write_u32(&mut buf[36..40], self.colors_important);
        buf
    }
}

/// 由信息头推导出的像素网格几何信息。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Geometry {
    width: usize,
    rows: usize,
    row_stride: usize,
}

impl Geometry {
    /// 负的高度表示自上而下存储，行数取绝对值；行仍按存储顺序处理。
    fn of(info: &InfoHeader) -> Result<Self> {
        let invalid = || StegoError::InvalidDimensions {
            width: info.width,
            height: info.height,
        };

        let width = usize::try_from(info.width).map_err(|_| invalid())?;
        let rows = usize::try_from(info.height.unsigned_abs()).map_err(|_| invalid())?;
        let row_stride = width.div_ceil(ROW_ALIGNMENT) * ROW_ALIGNMENT;
        row_stride.checked_mul(rows).ok_or_else(invalid)?;

        Ok(Self {
            width,
            rows,
            row_stride,
        })
    }

    fn data_len(&self) -> usize {
        self.row_stride * self.rows
    }
}

/// 内存中的 8 位调色板位图。
///
/// 构造后 `pixels.len() == row_stride * rows` 恒成立，
/// 头部字段只读，保证几何信息与像素缓冲区一致。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    file_header: FileHeader,
    info_header: InfoHeader,
    palette: [u8; PALETTE_SIZE],
    pixels: Vec<u8>,
    geometry: Geometry,
}

impl Bitmap {
    /// 从字节流解析位图。
    ///
    /// 依次读取 14 字节文件头、40 字节信息头、1024 字节调色板和
    /// `row_stride * rows` 字节的像素数据。调色板或像素数据不足时用 0 补齐。
    ///
    /// # Errors
    ///
    /// * 字节数不足以容纳两个头部时返回 [`StegoError::TruncatedHeader`]。
    /// * 位深度不是 8 时返回 [`StegoError::UnsupportedBitDepth`]。
    /// * 宽度为负或尺寸溢出时返回 [`StegoError::InvalidDimensions`]。
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let headers_len = FILE_HEADER_SIZE + INFO_HEADER_SIZE;
        if bytes.len() < headers_len {
            return Err(StegoError::TruncatedHeader {
                needed: headers_len,
                available: bytes.len(),
            });
        }

        let mut reader = bytes;
        let file_header = FileHeader::read_from(&mut reader)?;
        let info_header = InfoHeader::read_from(&mut reader)?;

        if info_header.bits_per_pixel != SUPPORTED_BITS_PER_PIXEL {
            return Err(StegoError::UnsupportedBitDepth(info_header.bits_per_pixel));
        }

        let geometry = Geometry::of(&info_header)?;
        tracing::debug!(
            width = geometry.width,
            rows = geometry.rows,
            row_stride = geometry.row_stride,
            "decoded bitmap headers"
        );

        if file_header.pixel_offset as usize != PIXEL_DATA_OFFSET {
            tracing::warn!(
                offset = file_header.pixel_offset,
                expected = PIXEL_DATA_OFFSET,
                "pixel data offset is not contiguous with the palette; reading pixels right after it"
            );
        }

        let mut palette = [0u8; PALETTE_SIZE];
        let palette_read = take_zero_filled(&mut reader, &mut palette);
        // 头部声明的尺寸不可信，分配失败时返回错误而不是中止进程
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(geometry.data_len())
            .map_err(|_| StegoError::InvalidDimensions {
                width: info_header.width,
                height: info_header.height,
            })?;
        pixels.resize(geometry.data_len(), 0);
        let pixels_read = take_zero_filled(&mut reader, &mut pixels);

        if palette_read < PALETTE_SIZE || pixels_read < pixels.len() {
            tracing::warn!(
                palette_read,
                pixels_read,
                pixels_expected = pixels.len(),
                "bitmap is truncated; missing bytes are zero-filled"
            );
        }

        Ok(Self {
            file_header,
            info_header,
            palette,
            pixels,
            geometry,
        })
    }

    /// 构造一个头部自洽的灰度位图 (调色板第 `i` 项为 `(i, i, i)`)。
    ///
    /// `pixels` 是不含行填充的 `width * height` 个调色板索引，按行排列。
    pub fn grayscale(width: u32, height: u32, pixels: &[u8]) -> Result<Self> {
        let invalid = || StegoError::InvalidDimensions {
            width: i32::try_from(width).unwrap_or(i32::MAX),
            height: i32::try_from(height).unwrap_or(i32::MAX),
        };

        let info_width = i32::try_from(width).map_err(|_| invalid())?;
        let info_height = i32::try_from(height).map_err(|_| invalid())?;
        let mut info_header = InfoHeader {
            header_size: INFO_HEADER_SIZE as u32,
            width: info_width,
            height: info_height,
            planes: 1,
            bits_per_pixel: SUPPORTED_BITS_PER_PIXEL,
            compression: 0,
            image_size: 0,
            x_pixels_per_meter: 2835,
            y_pixels_per_meter: 2835,
            colors_used: 256,
            colors_important: 0,
        };

        let geometry = Geometry::of(&info_header)?;
        if geometry.width.checked_mul(geometry.rows) != Some(pixels.len()) {
            return Err(invalid());
        }

        let data_len = geometry.data_len();
        let image_size = u32::try_from(data_len).map_err(|_| invalid())?;
        let file_size = u32::try_from(PIXEL_DATA_OFFSET + data_len).map_err(|_| invalid())?;
        info_header.image_size = image_size;

        let file_header = FileHeader {
            signature: *b"BM",
            file_size,
            reserved1: 0,
            reserved2: 0,
            pixel_offset: PIXEL_DATA_OFFSET as u32,
        };

        let mut palette = [0u8; PALETTE_SIZE];
        for (i, entry) in palette.chunks_exact_mut(4).enumerate() {
            let level = i as u8;
            entry.copy_from_slice(&[level, level, level, 0]);
        }

        let mut padded = vec![0u8; data_len];
        if geometry.width > 0 {
            for (dst, src) in padded
                .chunks_exact_mut(geometry.row_stride)
                .zip(pixels.chunks_exact(geometry.width))
            {
                dst[..geometry.width].copy_from_slice(src);
            }
        }

        Ok(Self {
            file_header,
            info_header,
            palette,
            pixels: padded,
            geometry,
        })
    }

    /// 按文件头、信息头、调色板、像素数据的顺序拼接为字节流。
    /// 不会重新计算任何尺寸字段。
    pub fn encode(&self) -> Vec<u8> {
        let mut out =
            Vec::with_capacity(FILE_HEADER_SIZE + INFO_HEADER_SIZE + PALETTE_SIZE + self.pixels.len());
        out.extend_from_slice(&self.file_header.to_bytes());
        out.extend_from_slice(&self.info_header.to_bytes());
        out.extend_from_slice(&self.palette);
        out.extend_from_slice(&self.pixels);
        out
    }

    /// 与 [`Bitmap::encode`] 输出相同，但直接写入任意输出流。
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.file_header.to_bytes())?;
        writer.write_all(&self.info_header.to_bytes())?;
        writer.write_all(&self.palette)?;
        writer.write_all(&self.pixels)?;
        Ok(())
    }

    pub fn file_header(&self) -> &FileHeader {
        &self.file_header
    }

    pub fn info_header(&self) -> &InfoHeader {
        &self.info_header
    }

    pub fn palette(&self) -> &[u8; PALETTE_SIZE] {
        &self.palette
    }

    /// 含行填充的完整像素缓冲区。
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// 可写的像素缓冲区；切片长度固定，行跨度不变式不会被破坏。
    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn width(&self) -> usize {
        self.geometry.width
    }

    pub fn rows(&self) -> usize {
        self.geometry.rows
    }

    pub fn row_stride(&self) -> usize {
        self.geometry.row_stride
    }

    /// 可寻址的像素个数 `width * rows`，不含行填充。
    pub fn capacity(&self) -> usize {
        self.geometry.width * self.geometry.rows
    }

    /// 按存储顺序 (行外层、列内层) 遍历网格内的像素，跳过行填充。
    pub fn grid(&self) -> impl Iterator<Item = &u8> {
        let width = self.geometry.width;
        self.pixels
            .chunks_exact(self.geometry.row_stride.max(1))
            .flat_map(move |row| &row[..width])
    }

    /// [`Bitmap::grid`] 的可变版本。
    pub fn grid_mut(&mut self) -> impl Iterator<Item = &mut u8> {
        let width = self.geometry.width;
        self.pixels
            .chunks_exact_mut(self.geometry.row_stride.max(1))
            .flat_map(move |row| &mut row[..width])
    }
}

/// 从 `reader` 取出最多 `buf.len()` 个字节，不足部分保持为 0。返回实际读取的字节数。
fn take_zero_filled(reader: &mut &[u8], buf: &mut [u8]) -> usize {
    let available = buf.len().min(reader.len());
    let (head, rest) = reader.split_at(available);
    buf[..available].copy_from_slice(head);
    *reader = rest;
    available
}
