//! Integration tests for the container reader and writer.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

use ecl_format::{ArrayData, ArrayType, EclFile, EclOutput};
use tempfile::TempDir;

fn write_all_types(path: &std::path::Path) {
    let mut out = EclOutput::create(path).unwrap();
    out.write_int("INTEHEAD", &(0..95).collect::<Vec<_>>()).unwrap();
    out.write_real("PARAMS", &(0..1500).map(|v| v as f32 / 4.0).collect::<Vec<_>>())
        .unwrap();
    out.write_double("DOUBHEAD", &[1.5, -2.25e-3, 0.0]).unwrap();
    out.write_logical("LOGIHEAD", &[true, false, true]).unwrap();
    out.write_string(
        "KEYWORDS",
        &(0..120).map(|n| format!("KW{}", n)).collect::<Vec<_>>(),
    )
    .unwrap();
    out.write_c0nn("LGRNAMES", 24, &["A LONG LGR NAME".to_string()])
        .unwrap();
    out.write_message("ENDLGR").unwrap();
    out.finish().unwrap();
}

#[test]
fn test_binary_and_formatted_agree() {
    let dir = TempDir::new().unwrap();
    let unformatted = dir.path().join("CASE.INIT");
    let formatted = dir.path().join("CASE.FINIT");
    write_all_types(&unformatted);
    write_all_types(&formatted);

    let a = EclFile::open(&unformatted).unwrap();
    let b = EclFile::open(&formatted).unwrap();
    assert!(!a.is_formatted());
    assert!(b.is_formatted());
    assert_eq!(a.entries().len(), 7);

    for index in 0..a.entries().len() {
        assert_eq!(a.entries()[index].name, b.entries()[index].name);
        assert_eq!(a.entries()[index].array_type, b.entries()[index].array_type);
        assert_eq!(a.read(index).unwrap(), b.read(index).unwrap());
    }

    assert_eq!(a.entries()[5].array_type, ArrayType::C0nn(24));
    assert_eq!(
        a.get_string_named("LGRNAMES").unwrap(),
        vec!["A LONG LGR NAME".to_string()]
    );
    assert_eq!(a.read(6).unwrap(), ArrayData::Mess);
    assert_eq!(b.get_logical_named("LOGIHEAD").unwrap(), vec![true, false, true]);
}

#[test]
fn test_single_value_seek_matches_block_arithmetic() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("CASE.UNSMRY");
    write_all_types(&path);

    let file = EclFile::open(&path).unwrap();
    let entry = &file.entries()[file.index_of("PARAMS").unwrap()];
    let layout = entry.array_type.block_layout();

    let mut handle = File::open(&path).unwrap();
    for slot in [0u64, 999, 1000, 1499] {
        handle
            .seek(SeekFrom::Start(entry.offset + layout.physical_offset(slot)))
            .unwrap();
        let mut raw = [0u8; 4];
        handle.read_exact(&mut raw).unwrap();
        assert_eq!(f32::from_be_bytes(raw), slot as f32 / 4.0);
    }
}

#[test]
fn test_formatted_single_value_seek() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("CASE.FUNSMRY");
    write_all_types(&path);

    let file = EclFile::open(&path).unwrap();
    let entry = &file.entries()[file.index_of("PARAMS").unwrap()];
    let layout = entry.array_type.formatted_layout();

    let mut handle = File::open(&path).unwrap();
    for slot in [0u64, 5, 1001] {
        handle
            .seek(SeekFrom::Start(entry.offset + layout.char_offset(slot)))
            .unwrap();
        let mut raw = vec![0u8; layout.width];
        handle.read_exact(&mut raw).unwrap();
        let token = String::from_utf8(raw).unwrap();
        assert_eq!(
            ecl_format::formatted::parse_real(&token),
            Some(slot as f32 / 4.0)
        );
    }
}

#[test]
fn test_unknown_type_tag_fails_open() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("BAD.FEGRID");
    std::fs::write(&path, " 'GRIDHEAD'           1 'XXXX'\n           1\n").unwrap();

    assert!(matches!(
        EclFile::open(&path),
        Err(ecl_format::EclFormatError::UnknownArrayType(_))
    ));
}
