// Tests for the IDX container: decoding, encoding, gzip handling, files

use std::fs;
use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use mnists_core::{DType, Tensor};
use mnists_data::idx::{self, decode, encode, read_idx_file, write_idx_file};
use mnists_data::{Error, FormatError};

fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut gz = GzEncoder::new(Vec::new(), Compression::default());
    gz.write_all(bytes).unwrap();
    gz.finish().unwrap()
}

fn random_tensor(rng: &mut StdRng, dtype: DType, dims: Vec<usize>) -> Tensor {
    let n = dims.iter().product::<usize>();
    match dtype {
        DType::U8 => Tensor::from_vec((0..n).map(|_| rng.gen::<u8>()).collect::<Vec<_>>(), dims),
        DType::I8 => Tensor::from_vec((0..n).map(|_| rng.gen::<i8>()).collect::<Vec<_>>(), dims),
        DType::I16 => Tensor::from_vec((0..n).map(|_| rng.gen::<i16>()).collect::<Vec<_>>(), dims),
        DType::I32 => Tensor::from_vec((0..n).map(|_| rng.gen::<i32>()).collect::<Vec<_>>(), dims),
        DType::F32 => Tensor::from_vec(
            (0..n).map(|_| rng.gen_range(-1e6f32..1e6)).collect::<Vec<_>>(),
            dims,
        ),
        DType::F64 => Tensor::from_vec(
            (0..n).map(|_| rng.gen_range(-1e12f64..1e12)).collect::<Vec<_>>(),
            dims,
        ),
    }
    .unwrap()
}

// Decoding

#[test]
fn test_gzip_cube_scenario() {
    let mut raw = vec![0x00, 0x00, 0x08, 0x03];
    raw.extend_from_slice(&[0, 0, 0, 2, 0, 0, 0, 2, 0, 0, 0, 2]);
    raw.extend_from_slice(&[0, 1, 2, 3, 4, 5, 6, 7]);

    let t = decode(&gzip(&raw)).unwrap();
    assert_eq!(t.dtype(), DType::U8);
    assert_eq!(t.dims(), &[2, 2, 2]);
    assert_eq!(t.get::<u8>(&[0, 0, 0]).unwrap(), 0);
    assert_eq!(t.get::<u8>(&[1, 1, 1]).unwrap(), 7);
    assert_eq!(t.get::<u8>(&[0, 1, 0]).unwrap(), 2);
}

#[test]
fn test_mnist_style_images_and_labels() {
    // 2 images of 2x3, then their labels
    let images = Tensor::from_vec((0u8..12).collect::<Vec<_>>(), (2, 2, 3)).unwrap();
    let labels = Tensor::from_vec(vec![7u8, 3], 2).unwrap();

    let img_bytes = encode(&images).unwrap();
    assert_eq!(&img_bytes[..4], &[0x00, 0x00, 0x08, 0x03]);
    assert_eq!(img_bytes.len(), 4 + 3 * 4 + 12);

    let lbl_bytes = encode(&labels).unwrap();
    assert_eq!(lbl_bytes, vec![0x00, 0x00, 0x08, 0x01, 0, 0, 0, 2, 7, 3]);

    let header = idx::parse_header(&img_bytes).unwrap();
    assert_eq!(header.dtype, DType::U8);
    assert_eq!(header.shape.dims(), &[2, 2, 3]);
    assert_eq!(header.data_offset, 16);
}

#[test]
fn test_nonzero_magic_always_fails() {
    for magic in [[0x00, 0x01], [0x01, 0x00], [0xFF, 0xFF], [0x08, 0x03]] {
        let mut bytes = magic.to_vec();
        bytes.extend_from_slice(&[0x08, 0x01, 0, 0, 0, 1, 5]);
        assert!(
            matches!(decode(&bytes), Err(FormatError::BadMagic { .. })),
            "magic {magic:?}"
        );
    }
}

#[test]
fn test_every_undefined_type_code_fails() {
    for code in 0u8..=255 {
        let bytes = [0x00, 0x00, code, 0x00, 0x01];
        let defined = DType::from_idx_code(code).is_some();
        let result = decode(&bytes);
        if defined {
            // rank 0 holds exactly one element; only u8/i8 fit in one byte
            if DType::from_idx_code(code).unwrap().size_in_bytes() == 1 {
                assert!(result.is_ok(), "code {code:#04x}");
            } else {
                assert!(matches!(result, Err(FormatError::SizeMismatch { .. })));
            }
        } else {
            assert!(
                matches!(result, Err(FormatError::UnknownType { .. })),
                "code {code:#04x}"
            );
        }
    }
}

#[test]
fn test_element_count_mismatch() {
    let t = Tensor::from_vec(vec![1i32, 2, 3, 4], (2, 2)).unwrap();
    let mut bytes = encode(&t).unwrap();
    bytes.truncate(bytes.len() - 4);
    assert!(matches!(decode(&bytes), Err(FormatError::SizeMismatch { .. })));

    let mut bytes = encode(&t).unwrap();
    bytes.push(0);
    assert!(matches!(decode(&bytes), Err(FormatError::SizeMismatch { .. })));
}

#[test]
fn test_dimension_overflow() {
    // four dims of u32::MAX overflow usize on every platform
    let mut bytes = vec![0x00, 0x00, 0x0E, 0x04];
    for _ in 0..4 {
        bytes.extend_from_slice(&u32::MAX.to_be_bytes());
    }
    assert!(matches!(decode(&bytes), Err(FormatError::SizeMismatch { .. })));
}

#[test]
fn test_zero_sized_dimension() {
    let bytes = [0x00, 0x00, 0x08, 0x02, 0, 0, 0, 0, 0, 0, 0, 28];
    let t = decode(&bytes).unwrap();
    assert_eq!(t.dims(), &[0, 28]);
    assert_eq!(t.elem_count(), 0);
}

// Round trips

#[test]
fn test_random_round_trips() {
    let mut rng = StdRng::seed_from_u64(42);
    for dtype in DType::ALL {
        for rank in 0..=4 {
            for _ in 0..8 {
                let dims = (0..rank).map(|_| rng.gen_range(0..5)).collect::<Vec<_>>();
                let t = random_tensor(&mut rng, dtype, dims);
                let bytes = encode(&t).unwrap();
                assert_eq!(decode(&bytes).unwrap(), t, "{dtype} {:?}", t.dims());
                assert_eq!(decode(&gzip(&bytes)).unwrap(), t);
            }
        }
    }
}

#[test]
fn test_decode_does_not_mutate_input() {
    let t = Tensor::from_vec(vec![1.5f32, -2.25, 3.0], 3).unwrap();
    let bytes = encode(&t).unwrap();
    let copy = bytes.clone();
    decode(&bytes).unwrap();
    assert_eq!(bytes, copy);
}

// Files

#[test]
fn test_file_round_trip_plain_and_gzip() {
    let dir = tempfile::tempdir().unwrap();
    let mut rng = StdRng::seed_from_u64(7);
    let t = random_tensor(&mut rng, DType::I16, vec![3, 4, 5]);

    let plain = dir.path().join("t.idx");
    write_idx_file(&plain, &t, false).unwrap();
    assert_eq!(read_idx_file(&plain).unwrap(), t);

    let gz = dir.path().join("t.idx.gz");
    write_idx_file(&gz, &t, true).unwrap();
    assert!(idx::is_gzip(&fs::read(&gz).unwrap()));
    assert_eq!(read_idx_file(&gz).unwrap(), t);

    // compressed content is detected even without the extension
    let renamed = dir.path().join("t-compressed");
    fs::copy(&gz, &renamed).unwrap();
    assert_eq!(read_idx_file(&renamed).unwrap(), t);
}

#[test]
fn test_gz_extension_with_plain_content_fails() {
    let dir = tempfile::tempdir().unwrap();
    let t = Tensor::from_vec(vec![1u8, 2, 3], 3).unwrap();
    let path = dir.path().join("labels.gz");
    write_idx_file(&path, &t, false).unwrap();
    match read_idx_file(&path) {
        Err(Error::Format { path: p, source: FormatError::Gzip(_) }) => assert_eq!(p, path),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        read_idx_file(dir.path().join("nope.gz")),
        Err(Error::Io(_))
    ));
}
