//! `.npy` array containers
//!
//! Grids are stored as NPY format version 1.0: a magic string, a version
//! pair, a little-endian `u16` header length, an ASCII dict header padded
//! with spaces to a 64-byte boundary, then the raw data. Only `<f8` in
//! C order is written or accepted. Rank-2 files hold a [`ScalarGrid`] with
//! shape `(height, width)`; rank-3 files hold a [`VolumeGrid`] with shape
//! `(nz, ny, nx)`.
//!
//! Version 2.0 and 3.0 headers (`u32` length) are accepted on read.

use crate::error::{FieldError, FieldResult};
use crate::grid::{ScalarGrid, VolumeGrid};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;
use tracing::debug;

const MAGIC: &[u8; 6] = b"\x93NUMPY";
const HEADER_ALIGN: usize = 64;
/// Magic, version pair, and `u16` header length
const PREAMBLE_V1: usize = MAGIC.len() + 2 + 2;

/// Parsed container header
#[derive(Debug, Clone, PartialEq, Eq)]
struct Header {
    descr: String,
    fortran_order: bool,
    shape: Vec<usize>,
}

fn format_header(shape: &[usize]) -> Vec<u8> {
    let dims = match shape {
        [n] => format!("({n},)"),
        _ => format!(
            "({})",
            shape
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        ),
    };
    let mut header = format!("{{'descr': '<f8', 'fortran_order': False, 'shape': {dims}, }}");
    // Trailing newline counts toward the padded length
    let unpadded = PREAMBLE_V1 + header.len() + 1;
    let padding = (HEADER_ALIGN - unpadded % HEADER_ALIGN) % HEADER_ALIGN;
    header.push_str(&" ".repeat(padding));
    header.push('\n');
    header.into_bytes()
}

/// Text following `'key':` in a header dict, up to the next top-level comma
fn dict_value<'a>(header: &'a str, key: &str) -> Option<&'a str> {
    let pattern = format!("'{key}':");
    let start = header.find(&pattern)? + pattern.len();
    let rest = header[start..].trim_start();
    if rest.starts_with('(') {
        let end = rest.find(')')?;
        Some(&rest[..=end])
    } else {
        let end = rest.find([',', '}']).unwrap_or(rest.len());
        Some(rest[..end].trim())
    }
}

fn parse_header(path: &Path, text: &str) -> FieldResult<Header> {
    let missing = |key: &str| FieldError::container(path, format!("header has no '{key}' entry"));

    let descr = dict_value(text, "descr")
        .ok_or_else(|| missing("descr"))?
        .trim_matches(|c| c == '\'' || c == '"')
        .to_string();

    let order = dict_value(text, "fortran_order").ok_or_else(|| missing("fortran_order"))?;
    let fortran_order = match order {
        "False" => false,
        "True" => true,
        other => {
            return Err(FieldError::container(
                path,
                format!("fortran_order is not a boolean: {other}"),
            ))
        }
    };

    let dims = dict_value(text, "shape").ok_or_else(|| missing("shape"))?;
    let shape = dims
        .trim_start_matches('(')
        .trim_end_matches(')')
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| {
            d.parse::<usize>()
                .map_err(|_| FieldError::container(path, format!("bad dimension '{d}' in shape")))
        })
        .collect::<FieldResult<Vec<_>>>()?;

    Ok(Header {
        descr,
        fortran_order,
        shape,
    })
}

fn read_header<R: Read>(path: &Path, reader: &mut R, file_len: u64) -> FieldResult<Header> {
    let mut magic = [0u8; 6];
    reader
        .read_exact(&mut magic)
        .map_err(|_| FieldError::container(path, "file too short for magic string"))?;
    if &magic != MAGIC {
        return Err(FieldError::container(path, "missing NPY magic string"));
    }

    let major = reader.read_u8()?;
    let _minor = reader.read_u8()?;
    let header_len = match major {
        1 => usize::from(reader.read_u16::<LittleEndian>()?),
        2 | 3 => reader.read_u32::<LittleEndian>()? as usize,
        v => {
            return Err(FieldError::container(
                path,
                format!("unsupported format version {v}"),
            ))
        }
    };

    if header_len as u64 > file_len {
        return Err(FieldError::container(path, "truncated header"));
    }
    let mut raw = vec![0u8; header_len];
    reader
        .read_exact(&mut raw)
        .map_err(|_| FieldError::container(path, "truncated header"))?;
    let text = String::from_utf8(raw)
        .map_err(|_| FieldError::container(path, "header is not valid text"))?;
    parse_header(path, &text)
}

/// Read a little-endian `f64` payload of exactly `shape`
fn read_payload(path: &Path, expected_rank: usize) -> FieldResult<(Vec<usize>, Vec<f64>)> {
    let file = File::open(path)?;
    let file_len = file.metadata()?.len();
    let mut reader = BufReader::new(file);
    let header = read_header(path, &mut reader, file_len)?;

    if header.descr != "<f8" {
        return Err(FieldError::container(
            path,
            format!("unsupported dtype '{}', expected '<f8'", header.descr),
        ));
    }
    if header.fortran_order {
        return Err(FieldError::container(path, "Fortran-ordered arrays are not supported"));
    }
    if header.shape.len() != expected_rank {
        return Err(FieldError::container(
            path,
            format!(
                "expected rank {expected_rank}, got shape {:?}",
                header.shape
            ),
        ));
    }

    let count = header
        .shape
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| {
            FieldError::container(path, format!("shape {:?} overflows", header.shape))
        })?;
    let payload = (count as u64).checked_mul(8);
    let remaining = file_len.saturating_sub(reader.stream_position()?);
    if !payload.is_some_and(|bytes| bytes <= remaining) {
        return Err(FieldError::container(
            path,
            format!("truncated data, expected {count} values in {remaining} bytes"),
        ));
    }
    let mut data = vec![0.0; count];
    reader
        .read_f64_into::<LittleEndian>(&mut data)
        .map_err(|_| {
            FieldError::container(path, format!("truncated data, expected {count} values"))
        })?;

    debug!("Read {:?} array from {}", header.shape, path.display());
    Ok((header.shape, data))
}

fn write_payload(path: &Path, shape: &[usize], data: &[f64]) -> FieldResult<()> {
    let header = format_header(shape);
    let header_len = u16::try_from(header.len())
        .map_err(|_| FieldError::container(path, "header too long for format version 1.0"))?;

    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(MAGIC)?;
    writer.write_all(&[1, 0])?;
    writer.write_u16::<LittleEndian>(header_len)?;
    writer.write_all(&header)?;
    for &value in data {
        writer.write_f64::<LittleEndian>(value)?;
    }
    writer.flush()?;

    debug!("Wrote {:?} array to {}", shape, path.display());
    Ok(())
}

/// Write a 2D grid as a `(height, width)` `<f8` array
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_grid<P: AsRef<Path>>(path: P, grid: &ScalarGrid) -> FieldResult<()> {
    let (height, width) = grid.shape();
    write_payload(path.as_ref(), &[height, width], grid.as_slice())
}

/// Read a rank-2 `<f8` array into a grid
///
/// # Errors
///
/// Returns [`FieldError::Container`] if the file is not a C-ordered rank-2
/// `<f8` array or its data is truncated, and [`FieldError::Io`] if it cannot
/// be opened.
pub fn read_grid<P: AsRef<Path>>(path: P) -> FieldResult<ScalarGrid> {
    let (shape, data) = read_payload(path.as_ref(), 2)?;
    ScalarGrid::from_vec(shape[1], shape[0], data)
}

/// Write a volume as an `(nz, ny, nx)` `<f8` array
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_volume<P: AsRef<Path>>(path: P, volume: &VolumeGrid) -> FieldResult<()> {
    let (nz, ny, nx) = volume.shape();
    write_payload(path.as_ref(), &[nz, ny, nx], volume.as_slice())
}

/// Read a rank-3 `<f8` array into a volume
///
/// # Errors
///
/// Same conditions as [`read_grid`], for rank 3.
pub fn read_volume<P: AsRef<Path>>(path: P) -> FieldResult<VolumeGrid> {
    let (shape, data) = read_payload(path.as_ref(), 3)?;
    VolumeGrid::from_vec(shape[2], shape[1], shape[0], data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_header_is_aligned() {
        for shape in [vec![3, 4], vec![1000, 20000], vec![2, 3, 4], vec![7]] {
            let header = format_header(&shape);
            assert_eq!((PREAMBLE_V1 + header.len()) % HEADER_ALIGN, 0);
            assert_eq!(header.last(), Some(&b'\n'));
        }
    }

    #[test]
    fn test_header_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.npy");
        write_grid(&path, &ScalarGrid::with_value(4, 3, 2.5)).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[..6], MAGIC);
        assert_eq!(&bytes[6..8], &[1, 0]);
        let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
        let header = std::str::from_utf8(&bytes[10..10 + header_len]).unwrap();
        assert!(header.starts_with("{'descr': '<f8', 'fortran_order': False, 'shape': (3, 4), }"));
        assert_eq!(bytes.len(), 10 + header_len + 12 * 8);
    }

    #[test]
    fn test_parse_foreign_header() {
        let text = "{'descr': '<f8', 'fortran_order': False, 'shape': (5, 6,), }    \n";
        let header = parse_header(Path::new("x.npy"), text).unwrap();
        assert_eq!(header.shape, vec![5, 6]);
        assert!(!header.fortran_order);
        assert_eq!(header.descr, "<f8");
    }

    #[test]
    fn test_grid_bit_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sigma.npy");
        let grid = ScalarGrid::from_fn(5, 3, |x, y| (x as f64).sin() * 1e-300 + y as f64 / 3.0);
        write_grid(&path, &grid).unwrap();

        let back = read_grid(&path).unwrap();
        assert_eq!(back.shape(), (3, 5));
        for (a, b) in grid.as_slice().iter().zip(back.as_slice()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn test_volume_preserves_axis_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("phi.npy");
        let volume = VolumeGrid::from_fn(4, 3, 2, |x, y, z| (100 * z + 10 * y + x) as f64);
        write_volume(&path, &volume).unwrap();

        let back = read_volume(&path).unwrap();
        assert_eq!(back.dims(), (4, 3, 2));
        assert_eq!(back.get(3, 2, 1), 123.0);
        assert!(matches!(read_grid(&path), Err(FieldError::Container { .. })));
    }

    fn raw_file(header: &str, payload: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MAGIC).unwrap();
        file.write_all(&[1, 0]).unwrap();
        file.write_all(&(header.len() as u16).to_le_bytes()).unwrap();
        file.write_all(header.as_bytes()).unwrap();
        file.write_all(payload).unwrap();
        file
    }

    #[test]
    fn test_rejects_unsupported_layouts() {
        let f4 = raw_file("{'descr': '<f4', 'fortran_order': False, 'shape': (1, 1), }\n", &[0; 4]);
        assert!(matches!(read_grid(f4.path()), Err(FieldError::Container { .. })));

        let fortran = raw_file("{'descr': '<f8', 'fortran_order': True, 'shape': (1, 1), }\n", &[0; 8]);
        assert!(matches!(read_grid(fortran.path()), Err(FieldError::Container { .. })));

        let short = raw_file("{'descr': '<f8', 'fortran_order': False, 'shape': (2, 2), }\n", &[0; 16]);
        assert!(matches!(read_grid(short.path()), Err(FieldError::Container { .. })));
    }

    #[test]
    fn test_rejects_oversized_shapes_without_allocating() {
        let huge = raw_file(
            "{'descr': '<f8', 'fortran_order': False, 'shape': (4294967296, 4294967296), }\n",
            &[],
        );
        assert!(matches!(read_grid(huge.path()), Err(FieldError::Container { .. })));

        let large = raw_file(
            "{'descr': '<f8', 'fortran_order': False, 'shape': (100000, 100000), }\n",
            &[0; 64],
        );
        assert!(matches!(read_grid(large.path()), Err(FieldError::Container { .. })));

        let cube = raw_file(
            "{'descr': '<f8', 'fortran_order': False, 'shape': (65536, 65536, 65536), }\n",
            &[],
        );
        assert!(matches!(read_volume(cube.path()), Err(FieldError::Container { .. })));
    }

    #[test]
    fn test_rejects_header_longer_than_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MAGIC).unwrap();
        file.write_all(&[2, 0]).unwrap();
        file.write_all(&u32::MAX.to_le_bytes()).unwrap();
        assert!(matches!(read_grid(file.path()), Err(FieldError::Container { .. })));
    }

    #[test]
    fn test_rejects_missing_magic() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not an array at all").unwrap();
        assert!(matches!(read_grid(file.path()), Err(FieldError::Container { .. })));
    }
}
