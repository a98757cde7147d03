//! Uncompressed 32-bit BGRA bitmap I/O: a 14-byte `BITMAPFILEHEADER`
//! followed by a 40-byte `BITMAPINFOHEADER`, written byte-for-byte
//! compatible with the original renderer's output.

use crate::color::Color24;
use crate::error::RenderError;
use crate::texture::Texture;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

const FILE_HEADER_SIZE: u32 = 14;
const DIB_HEADER_SIZE: u32 = 40;

pub fn write_bmp(path: impl AsRef<Path>, tex: &Texture) -> Result<(), RenderError> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| RenderError::Open {
        path: path.display().to_string(),
        source,
    })?;
    let mut out = BufWriter::new(file);

    let width = tex.width() as u32;
    let height = tex.height() as u32;
    let image_size = width * 4 * height;
    let header_size = FILE_HEADER_SIZE + DIB_HEADER_SIZE;

    let write_result = (|| -> std::io::Result<()> {
        // BITMAPFILEHEADER
        out.write_u16::<LittleEndian>(0x4d42)?;
        out.write_u32::<LittleEndian>(header_size + image_size)?;
        out.write_u16::<LittleEndian>(0)?;
        out.write_u16::<LittleEndian>(0)?;
        out.write_u32::<LittleEndian>(header_size)?;

        // BITMAPINFOHEADER
        out.write_u32::<LittleEndian>(DIB_HEADER_SIZE)?;
        out.write_i32::<LittleEndian>(width as i32)?;
        out.write_i32::<LittleEndian>(height as i32)?;
        out.write_u16::<LittleEndian>(1)?;
        out.write_u16::<LittleEndian>(32)?;
        out.write_u32::<LittleEndian>(0)?;
        out.write_u32::<LittleEndian>(0)?;
        out.write_u32::<LittleEndian>(0)?;
        out.write_u32::<LittleEndian>(0)?;
        out.write_u32::<LittleEndian>(0)?;
        out.write_u32::<LittleEndian>(0)?;

        for y in 0..tex.height() {
            for x in 0..tex.width() {
                let rgb = tex.read_pixel(x, y).to_color24();
                out.write_all(&[rgb.b, rgb.g, rgb.r, 255])?;
            }
        }
        Ok(())
    })();

    write_result.map_err(|source| RenderError::Io {
        path: path.display().to_string(),
        source,
    })
}

pub fn read_bmp(path: impl AsRef<Path>) -> Result<Texture, RenderError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| RenderError::Open {
        path: path.display().to_string(),
        source,
    })?;
    let mut input = BufReader::new(file);
    let path_str = path.display().to_string();

    let read_io = |input: &mut BufReader<File>| -> std::io::Result<(u16, u32, i32, i32, Texture)> {
        let signature = input.read_u16::<LittleEndian>()?;
        let mut rest = [0u8; (FILE_HEADER_SIZE - 2) as usize];
        input.read_exact(&mut rest)?;

        let dib_header_size = input.read_u32::<LittleEndian>()?;
        let width = input.read_i32::<LittleEndian>()?;
        let height = input.read_i32::<LittleEndian>()?;
        let _planes = input.read_u16::<LittleEndian>()?;
        let _bits_per_pixel = input.read_u16::<LittleEndian>()?;
        let mut rest = vec![0u8; dib_header_size.saturating_sub(4 + 4 + 4 + 2 + 2) as usize];
        input.read_exact(&mut rest)?;

        let tex = Texture::new(width.max(0) as usize, height.max(0) as usize);
        Ok((signature, dib_header_size, width, height, tex))
    };

    let (signature, dib_header_size, width, height, mut tex) =
        read_io(&mut input).map_err(|source| RenderError::Io {
            path: path_str.clone(),
            source,
        })?;

    if signature != 0x4d42 {
        return Err(RenderError::InvalidBitmap {
            path: path_str,
            reason: format!("bad BITMAPFILEHEADER signature 0x{signature:04x}, expected 0x4d42"),
        });
    }
    if dib_header_size != DIB_HEADER_SIZE || width < 0 || height < 0 {
        return Err(RenderError::InvalidBitmap {
            path: path_str,
            reason: format!(
                "unsupported BITMAPINFOHEADER: size={dib_header_size}, width={width}, height={height}"
            ),
        });
    }

    let mut pixel = [0u8; 4];
    for y in 0..tex.height() {
        for x in 0..tex.width() {
            input.read_exact(&mut pixel).map_err(|source| RenderError::Io {
                path: path_str.clone(),
                source,
            })?;
            let rgb = Color24::new(pixel[2], pixel[1], pixel[0]);
            tex.write_pixel(x, y, rgb.to_colorf());
        }
    }
    Ok(tex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    #[test]
    fn round_trips_a_small_texture() {
        let dir = std::env::temp_dir().join("neonray_bitmap_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("round_trip.bmp");

        let mut tex = Texture::new(3, 2);
        tex.write_pixel(0, 0, Color::new(1.0, 0.0, 0.0));
        tex.write_pixel(2, 1, Color::new(0.0, 1.0, 0.0));

        write_bmp(&path, &tex).unwrap();
        let back = read_bmp(&path).unwrap();

        assert_eq!(back.width(), 3);
        assert_eq!(back.height(), 2);
        assert_eq!(back.read_pixel(0, 0).to_color24(), tex.read_pixel(0, 0).to_color24());
        assert_eq!(back.read_pixel(2, 1).to_color24(), tex.read_pixel(2, 1).to_color24());

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn file_header_is_54_bytes_before_pixel_data() {
        let dir = std::env::temp_dir().join("neonray_bitmap_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("header_size.bmp");

        let tex = Texture::new(1, 1);
        write_bmp(&path, &tex).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        let pixel_offset = u32::from_le_bytes([bytes[10], bytes[11], bytes[12], bytes[13]]);
        assert_eq!(pixel_offset, 54);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn rejects_a_file_with_the_wrong_signature() {
        let dir = std::env::temp_dir().join("neonray_bitmap_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("not_a_bitmap.bmp");
        std::fs::write(&path, [0u8; 64]).unwrap();

        let err = read_bmp(&path).unwrap_err();
        assert!(matches!(err, RenderError::InvalidBitmap { .. }));

        std::fs::remove_file(&path).ok();
    }
}
