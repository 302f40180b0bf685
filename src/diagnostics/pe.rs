//! 模块位宽检测
//!
//! 先按文件魔数区分映像格式：
//! - `MZ`: 偏移 0x3C 处的 4 字节小端值指向头部，跳过 4 字节签名后是 2 字节小端机器类型
//! - `\x7fELF`: 第 5 个字节 (`EI_CLASS`) 为 1 表示 32 位，为 2 表示 64 位
//!
//! 其他格式与无法识别的机器类型一样回退为当前进程位宽。

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// 指向头部的偏移量所在位置
pub const HEADER_POINTER_OFFSET: u64 = 0x3C;
/// 头部签名长度
pub const SIGNATURE_LEN: u64 = 4;
/// x86-64 机器类型
pub const MACHINE_AMD64: u16 = 0x8664;
/// x86 机器类型
pub const MACHINE_I386: u16 = 0x014C;
/// ELF 魔数
pub const ELF_MAGIC: [u8; 4] = [0x7F, b'E', b'L', b'F'];
/// ELF 32 位类别
pub const ELF_CLASS_32: u8 = 1;
/// ELF 64 位类别
pub const ELF_CLASS_64: u8 = 2;

/// 进程或模块的指针位宽
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bitness {
    Bits32,
    Bits64,
}

impl Bitness {
    /// 当前进程的位宽
    pub const fn current() -> Self {
        if cfg!(target_pointer_width = "64") {
            Bitness::Bits64
        } else {
            Bitness::Bits32
        }
    }

    /// 由机器类型映射位宽
    ///
    /// 无法识别的机器类型回退为当前进程位宽。
    pub fn from_machine(machine: u16) -> Self {
        match machine {
            MACHINE_AMD64 => Bitness::Bits64,
            MACHINE_I386 => Bitness::Bits32,
            other => {
                tracing::debug!(
                    target: "diagnostics",
                    "Unrecognized machine type 0x{:04X}, assuming process width",
                    other
                );
                Self::current()
            }
        }
    }

    pub fn bits(&self) -> u32 {
        match self {
            Bitness::Bits32 => 32,
            Bitness::Bits64 => 64,
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Bitness::Bits32 => Bitness::Bits64,
            Bitness::Bits64 => Bitness::Bits32,
        }
    }
}

impl fmt::Display for Bitness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

/// 读取机器类型字段
pub fn read_machine<R: Read + Seek>(reader: &mut R) -> io::Result<u16> {
    reader.seek(SeekFrom::Start(HEADER_POINTER_OFFSET))?;
    let mut pointer = [0u8; 4];
    reader.read_exact(&mut pointer)?;
    let header = u64::from(u32::from_le_bytes(pointer));

    reader.seek(SeekFrom::Start(header + SIGNATURE_LEN))?;
    let mut machine = [0u8; 2];
    reader.read_exact(&mut machine)?;
    Ok(u16::from_le_bytes(machine))
}

/// 由文件魔数判断位宽
pub fn read_bitness<R: Read + Seek>(reader: &mut R) -> io::Result<Bitness> {
    reader.seek(SeekFrom::Start(0))?;
    let mut ident = Vec::with_capacity(5);
    reader.by_ref().take(5).read_to_end(&mut ident)?;

    if ident.starts_with(&ELF_MAGIC) {
        return match ident.get(4) {
            Some(&ELF_CLASS_32) => Ok(Bitness::Bits32),
            Some(&ELF_CLASS_64) => Ok(Bitness::Bits64),
            Some(other) => {
                tracing::debug!(
                    target: "diagnostics",
                    "Unrecognized ELF class {}, assuming process width",
                    other
                );
                Ok(Bitness::current())
            }
            None => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "ELF identification is truncated",
            )),
        };
    }

    if ident.starts_with(b"MZ") {
        return read_machine(reader).map(Bitness::from_machine);
    }

    tracing::debug!(target: "diagnostics", "Unrecognized image format, assuming process width");
    Ok(Bitness::current())
}

/// 检测模块文件的位宽
pub fn detect_bitness(path: impl AsRef<Path>) -> io::Result<Bitness> {
    let mut reader = BufReader::new(File::open(path.as_ref())?);
    read_bitness(&mut reader)
}

/// 构造只包含位宽检测所需字段的模块头
pub fn stub_image(machine: u16) -> Vec<u8> {
    let header = 0x80usize;
    let mut image = vec![0u8; header + 0x18];
    image[0] = b'M';
    image[1] = b'Z';
    image[HEADER_POINTER_OFFSET as usize..HEADER_POINTER_OFFSET as usize + 4]
        .copy_from_slice(&(header as u32).to_le_bytes());
    image[header..header + 4].copy_from_slice(b"PE\0\0");
    image[header + 4..header + 6].copy_from_slice(&machine.to_le_bytes());
    image
}

/// 构造只包含标识字段的 ELF 头
pub fn elf_stub_image(class: u8) -> Vec<u8> {
    let mut image = vec![0u8; 0x40];
    image[..4].copy_from_slice(&ELF_MAGIC);
    image[4] = class;
    // e_shnum/e_shstrndx 落在 0x3C，不能被当作头部指针
    image[0x3C..0x40].copy_from_slice(&[0x1D, 0x00, 0x1C, 0x00]);
    image
}
