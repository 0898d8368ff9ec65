use std::io::Write as _;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::{ErrorCode, ErrorKind, MemBuf, Whence, describe, growth::GROWTH_HEADROOM_PAGES};

fn page() -> u64 {
    MemBuf::page_size()
}

fn random_bytes(len: usize) -> Vec<u8> {
    std::iter::repeat_with(|| fastrand::u8(..)).take(len).collect()
}

fn assert_invariants(buf: &MemBuf) {
    assert!(buf.len() <= buf.capacity());
    assert!(buf.capacity() > 0);
    assert_eq!(buf.capacity() % page(), 0);
    assert!(buf.tell() <= buf.len());
    assert_eq!(buf.as_bytes().len() as u64, buf.len());
}

#[test]
fn test_open_empty() {
    let buf = MemBuf::open(None, 0, None).unwrap();
    assert_eq!(buf.len(), 0);
    assert!(buf.is_empty());
    assert_eq!(buf.capacity(), page());
    assert_eq!(buf.tell(), 0);
    assert_eq!(buf.error(), 0);
    assert_eq!(buf.last_error(), None);
    assert_eq!(buf.name(), None);
    assert_invariants(&buf);
    buf.close().unwrap();
}

#[test]
fn test_open_empty_ignores_initial() {
    let buf = MemBuf::open(Some("scratch"), 0, Some(&b"ignored"[..])).unwrap();
    assert!(buf.is_empty());
    assert_eq!(buf.name(), Some("scratch"));
}

#[test]
fn test_open_with_content() {
    let data = random_bytes(page() as usize * 2 + 17);
    let buf = MemBuf::open(Some("init"), data.len() as u64, Some(&data[..])).unwrap();
    assert_eq!(buf.len(), data.len() as u64);
    assert_eq!(buf.capacity(), page() * 3);
    assert_eq!(buf.tell(), 0);
    assert_eq!(buf.as_bytes(), &data[..]);
    assert_invariants(&buf);
}

#[test]
fn test_open_copies_only_initial_len() {
    let buf = MemBuf::open(None, 3, Some(&b"abcdef"[..])).unwrap();
    assert_eq!(buf.as_bytes(), b"abc");
}

#[test]
fn test_open_requires_initial_content() {
    let err = MemBuf::open(None, 10, None).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));

    let err = MemBuf::open(None, 10, Some(&b"short"[..])).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
}

#[test]
fn test_read_zero_is_noop() {
    let mut buf = MemBuf::from_bytes(None, b"abc").unwrap();
    assert_eq!(buf.read(0, &mut []).unwrap(), 0);
    assert_eq!(buf.tell(), 0);
    assert_eq!(buf.error(), 0);
}

#[test]
fn test_read_destination_missing() {
    let mut buf = MemBuf::from_bytes(None, b"abcdef").unwrap();
    let mut dest = [0u8; 2];
    let err = buf.read(3, &mut dest).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::DestinationMissing { required: 3, actual: 2 }));
    assert_eq!(err.code(), Some(ErrorCode::DestinationMissing));
    assert_eq!(buf.error(), ErrorCode::DestinationMissing.as_u8());
    assert_eq!(buf.tell(), 0);
}

#[test]
fn test_read_strict_interior() {
    let mut buf = MemBuf::from_bytes(None, b"abcdef").unwrap();
    let mut dest = [0u8; 8];

    // Reading up to the very end is rejected.
    let err = buf.read(6, &mut dest).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::InvalidRead {
            offset: 0,
            size: 6,
            length: 6
        }
    ));
    assert_eq!(buf.last_error(), Some(ErrorCode::InvalidRead));
    assert_eq!(buf.tell(), 0);

    assert_eq!(buf.read(5, &mut dest).unwrap(), 5);
    assert_eq!(&dest[..5], b"abcde");
    assert_eq!(buf.tell(), 5);

    // cursor == len - 1: cursor + 1 == len.
    assert!(buf.read(1, &mut dest).is_err());
    assert_eq!(buf.tell(), 5);

    buf.seek(Whence::End, -2).unwrap();
    assert_eq!(buf.read(1, &mut dest).unwrap(), 1);
    assert_eq!(dest[0], b'e');
}

#[test]
fn test_read_overflowing_size() {
    let mut buf = MemBuf::from_bytes(None, b"abcdef").unwrap();
    buf.seek(Whence::Start, 2).unwrap();
    let mut dest = [0u8; 0];
    // dest check comes first
    assert!(buf.read(u64::MAX, &mut dest).is_err());
    assert_eq!(buf.last_error(), Some(ErrorCode::DestinationMissing));
}

#[test]
fn test_write_zero_is_noop() {
    let mut buf = MemBuf::new().unwrap();
    assert_eq!(buf.write(0, &[]).unwrap(), 0);
    assert_eq!(buf.len(), 0);
    assert_eq!(buf.error(), 0);
}

#[test]
fn test_write_source_missing() {
    let mut buf = MemBuf::new().unwrap();
    let err = buf.write(5, b"abc").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::SourceMissing { required: 5, actual: 3 }));
    assert_eq!(buf.error(), ErrorCode::SourceMissing.as_u8());
    assert_eq!(buf.len(), 0);
    assert_eq!(buf.tell(), 0);
}

#[test]
fn test_write_fits_in_place() {
    let mut buf = MemBuf::new().unwrap();
    assert_eq!(buf.write(4, b"\0asm").unwrap(), 4);
    assert_eq!(buf.write(2, b"xyz").unwrap(), 2);
    assert_eq!(buf.tell(), 6);
    assert_eq!(buf.len(), 6);
    assert_eq!(buf.capacity(), page());
    assert_eq!(buf.as_bytes(), b"\0asmxy");
    assert_invariants(&buf);
}

#[test]
fn test_round_trip_without_growth() {
    let mut buf = MemBuf::new().unwrap();
    let data = random_bytes(1000);
    buf.write_all_bytes(&data).unwrap();
    // trailing byte so the whole payload is strictly inside the stream
    buf.putc(0xff).unwrap();
    assert_eq!(buf.capacity(), page());

    buf.seek(Whence::Start, 0).unwrap();
    let mut out = vec![0u8; data.len()];
    assert_eq!(buf.read(data.len() as u64, &mut out).unwrap(), data.len() as u64);
    assert_eq!(out, data);
    assert_invariants(&buf);
}

#[test]
fn test_round_trip_across_growth() {
    let mut buf = MemBuf::new().unwrap();
    let head = random_bytes(page() as usize - 100);
    let straddle = random_bytes(300);
    buf.write_all_bytes(&head).unwrap();
    assert_eq!(buf.capacity(), page());
    buf.write_all_bytes(&straddle).unwrap();
    assert!(buf.capacity() > page());
    buf.putc(0).unwrap();
    assert_invariants(&buf);

    buf.rewind();
    let mut out = vec![0u8; head.len()];
    buf.read(head.len() as u64, &mut out).unwrap();
    assert_eq!(out, head);
    let mut out = vec![0u8; straddle.len()];
    buf.read(straddle.len() as u64, &mut out).unwrap();
    assert_eq!(out, straddle);
}

#[test]
fn test_growth_capacity() {
    let mut buf = MemBuf::new().unwrap();
    let size = buf.capacity() + 1;
    let data = random_bytes(size as usize);
    buf.write(size, &data).unwrap();

    // one page rounded up from capacity + 1, plus headroom
    assert_eq!(buf.capacity(), 2 * page() + GROWTH_HEADROOM_PAGES * page());
    assert_eq!(buf.len(), size);
    assert_eq!(buf.tell(), size);
    assert_eq!(buf.as_bytes(), &data[..]);
    assert_invariants(&buf);

    buf.seek(Whence::Start, 0).unwrap();
    let mut out = vec![0u8; size as usize - 1];
    buf.read(size - 1, &mut out).unwrap();
    assert_eq!(out, data[..size as usize - 1]);
}

#[test]
fn test_write_exactly_to_capacity_grows() {
    let mut buf = MemBuf::new().unwrap();
    let data = random_bytes(page() as usize);
    buf.write_all_bytes(&data).unwrap();
    assert_eq!(buf.len(), page());
    assert_eq!(buf.capacity(), page() + GROWTH_HEADROOM_PAGES * page());
    assert_eq!(buf.as_bytes(), &data[..]);
}

#[test]
fn test_write_into_full_initial_buffer() {
    let data = random_bytes(page() as usize);
    let mut buf = MemBuf::from_bytes(None, &data).unwrap();
    assert_eq!(buf.capacity(), buf.len());
    buf.seek(Whence::End, 0).unwrap();
    buf.write_all_bytes(b"tail").unwrap();
    assert_eq!(buf.len(), page() + 4);
    assert_eq!(&buf.as_bytes()[..page() as usize], &data[..]);
    assert_eq!(&buf.as_bytes()[page() as usize..], b"tail");
    assert_invariants(&buf);
}

#[test]
fn test_repeated_growth_keeps_offsets() {
    let mut buf = MemBuf::new().unwrap();
    let mut expected = Vec::new();
    for _ in 0..200 {
        let chunk = random_bytes(fastrand::usize(1..2000));
        buf.write_all_bytes(&chunk).unwrap();
        expected.extend_from_slice(&chunk);
        assert_invariants(&buf);
    }
    assert_eq!(buf.as_bytes(), &expected[..]);
    assert_eq!(buf.tell(), expected.len() as u64);
}

#[test]
fn test_overwrite_extends_length() {
    let mut buf = MemBuf::new().unwrap();
    buf.write_all_bytes(b"abcdef").unwrap();
    buf.seek(Whence::Start, 2).unwrap();
    buf.write_all_bytes(b"XY").unwrap();
    assert_eq!(buf.tell(), 4);
    assert_eq!(buf.len(), 8);
    assert_eq!(&buf.as_bytes()[..6], b"abXYef");
    assert_invariants(&buf);
}

#[test]
fn test_overwrite_near_capacity_keeps_invariants() {
    let data = random_bytes(page() as usize - 10);
    let mut buf = MemBuf::from_bytes(None, &data).unwrap();
    // cursor at 0, but the accounted length would pass the capacity
    let patch = random_bytes(20);
    buf.write_all_bytes(&patch).unwrap();
    assert_eq!(buf.len(), page() + 10);
    assert!(buf.capacity() > buf.len());
    assert_eq!(&buf.as_bytes()[..20], &patch[..]);
    assert_eq!(&buf.as_bytes()[20..data.len()], &data[20..]);
    assert_invariants(&buf);
}

#[test]
fn test_fill() {
    let mut buf = MemBuf::new().unwrap();
    let element = 1u64.to_le_bytes();
    assert_eq!(buf.fill(1024, 8, &element).unwrap(), 8192);
    assert_eq!(buf.len(), 8192);
    assert!(buf.capacity() >= 8192);
    for chunk in buf.as_bytes().chunks(8) {
        assert_eq!(chunk, element);
    }
    assert_invariants(&buf);
}

#[test]
fn test_fill_zero() {
    let mut buf = MemBuf::new().unwrap();
    assert_eq!(buf.fill(0, 8, &[]).unwrap(), 0);
    assert_eq!(buf.fill(10, 0, &[]).unwrap(), 0);
    assert!(buf.is_empty());
}

#[test]
fn test_fill_propagates_write_failure() {
    let mut buf = MemBuf::new().unwrap();
    let err = buf.fill(4, 8, b"short").unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::SourceMissing));
    assert!(buf.is_empty());

    let err = buf.fill(u64::MAX, 2, b"ab").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
}

#[test]
fn test_seek_current() {
    let mut buf = MemBuf::from_bytes(None, b"0123456789").unwrap();
    buf.seek(Whence::Current, 4).unwrap();
    assert_eq!(buf.tell(), 4);
    buf.seek(Whence::Current, -3).unwrap();
    assert_eq!(buf.tell(), 1);
    buf.seek(Whence::Current, 9).unwrap();
    assert_eq!(buf.tell(), 10);

    assert!(buf.seek(Whence::Current, 1).is_err());
    assert_eq!(buf.tell(), 10);
    assert!(buf.seek(Whence::Current, -11).is_err());
    assert!(buf.seek(Whence::Current, i64::MIN).is_err());
    assert!(buf.seek(Whence::Current, i64::MAX).is_err());
    assert_eq!(buf.tell(), 10);
    assert_eq!(buf.last_error(), Some(ErrorCode::InvalidOffset));
}

#[test]
fn test_seek_current_zero_is_idempotent() {
    let mut buf = MemBuf::from_bytes(None, b"0123456789").unwrap();
    for pos in [0, 3, 10] {
        buf.seek(Whence::Start, pos).unwrap();
        let before = buf.tell();
        buf.seek(Whence::Current, 0).unwrap();
        assert_eq!(buf.tell(), before);
    }
    assert_eq!(buf.error(), 0);
}

#[test]
fn test_seek_start() {
    let mut buf = MemBuf::from_bytes(None, b"0123456789").unwrap();
    buf.seek(Whence::Start, 7).unwrap();
    assert_eq!(buf.tell(), 7);
    buf.seek(Whence::Start, 10).unwrap();
    assert_eq!(buf.tell(), 10);
    buf.seek(Whence::Start, 0).unwrap();
    assert_eq!(buf.tell(), 0);

    let err = buf.seek(Whence::Start, -1).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::InvalidOffset));
    assert!(buf.seek(Whence::Start, 11).is_err());
    assert_eq!(buf.tell(), 0);
}

#[test]
fn test_seek_end() {
    let mut buf = MemBuf::from_bytes(None, b"0123456789").unwrap();
    buf.seek(Whence::End, 0).unwrap();
    assert_eq!(buf.tell(), 10);
    buf.seek(Whence::End, -3).unwrap();
    assert_eq!(buf.tell(), 7);
    buf.seek(Whence::End, -10).unwrap();
    assert_eq!(buf.tell(), 0);

    let err = buf.seek(Whence::End, 1).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::InvalidOffset));
    assert!(buf.seek(Whence::End, -11).is_err());
    assert!(buf.seek(Whence::End, i64::MIN).is_err());
    assert_eq!(buf.tell(), 0);
}

#[test]
fn test_seek_raw() {
    let mut buf = MemBuf::from_bytes(None, b"0123456789").unwrap();
    buf.seek_raw(Whence::SEEK_SET, 4).unwrap();
    buf.seek_raw(Whence::SEEK_CUR, 2).unwrap();
    assert_eq!(buf.tell(), 6);
    buf.seek_raw(Whence::SEEK_END, -1).unwrap();
    assert_eq!(buf.tell(), 9);

    let err = buf.seek_raw(7, 0).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidWhence { whence: 7 }));
    assert_eq!(buf.error(), ErrorCode::InvalidWhence.as_u8());
    assert_eq!(buf.tell(), 9);
}

#[test]
fn test_whence_conversions() {
    for whence in [Whence::Start, Whence::Current, Whence::End] {
        assert_eq!(Whence::try_from(i32::from(whence)).unwrap(), whence);
    }
    assert!(Whence::try_from(-1).is_err());
}

#[test]
fn test_sticky_flags_accumulate() {
    let mut buf = MemBuf::from_bytes(None, b"0123456789").unwrap();
    let mut dest = [0u8; 16];
    assert!(buf.read(10, &mut dest).is_err());
    assert_eq!(buf.error(), 5);

    // successes do not clear anything
    buf.read(2, &mut dest).unwrap();
    buf.write_all_bytes(b"x").unwrap();
    assert_eq!(buf.error(), 5);
    assert_eq!(buf.last_error(), Some(ErrorCode::InvalidRead));

    assert!(buf.seek(Whence::End, 1).is_err());
    assert_eq!(buf.error(), 5 | 9);
    assert_eq!(buf.last_error(), Some(ErrorCode::InvalidOffset));
}

#[test]
fn test_describe_error_flags() {
    let mut buf = MemBuf::new().unwrap();
    assert_eq!(describe(buf.error()), "Success");
    assert!(buf.write(1, &[]).is_err());
    assert_eq!(describe(buf.error()), "Source of write is missing");
    assert_eq!(describe(200), "Unknown error");
}

#[test]
fn test_getc_putc_eof() {
    let mut buf = MemBuf::new().unwrap();
    assert!(buf.eof());
    for b in b"abc" {
        buf.putc(*b).unwrap();
    }
    buf.rewind();
    assert!(!buf.eof());
    assert_eq!(buf.getc().unwrap(), b'a');
    assert_eq!(buf.getc().unwrap(), b'b');
    assert!(buf.eof());
    assert!(buf.getc().is_err());
    assert_eq!(buf.last_error(), Some(ErrorCode::InvalidRead));
}

#[test]
fn test_io_write() {
    let mut buf = MemBuf::new().unwrap();
    buf.write_all(b"\0asm").unwrap();
    buf.write_u32::<LittleEndian>(1).unwrap();
    write!(buf, "v{}.{}", 1, 2).unwrap();
    std::io::Write::flush(&mut buf).unwrap();
    buf.flush().unwrap();
    assert_eq!(buf.as_bytes(), b"\0asm\x01\x00\x00\x00v1.2");
    assert_eq!(buf.tell(), 12);
}

#[test]
fn test_close_after_growth() {
    let mut buf = MemBuf::new().unwrap();
    buf.write_all_bytes(&random_bytes(3 * page() as usize)).unwrap();
    buf.close().unwrap();
}

#[test]
fn test_random_operations_keep_invariants() {
    let mut buf = MemBuf::new().unwrap();
    let mut model: Vec<u8> = Vec::new();
    let mut dest = vec![0u8; 4096];
    for _ in 0..2000 {
        match fastrand::u8(0..4) {
            0 => {
                let data = random_bytes(fastrand::usize(0..3000));
                buf.seek(Whence::End, 0).unwrap();
                buf.write_all_bytes(&data).unwrap();
                model.extend_from_slice(&data);
            }
            1 => {
                let size = fastrand::u64(0..4096);
                let cursor = buf.tell();
                let res = buf.read(size, &mut dest);
                if size == 0 {
                    assert_eq!(res.unwrap(), 0);
                } else if cursor + size < model.len() as u64 {
                    res.unwrap();
                    let start = cursor as usize;
                    assert_eq!(&dest[..size as usize], &model[start..start + size as usize]);
                } else {
                    assert!(res.is_err());
                    assert_eq!(buf.tell(), cursor);
                }
            }
            2 => {
                let delta = fastrand::i64(-5000..5000);
                let cursor = buf.tell();
                let expected = cursor as i64 + delta;
                let res = buf.seek(Whence::Current, delta);
                if (0..=model.len() as i64).contains(&expected) {
                    res.unwrap();
                    assert_eq!(buf.tell(), expected as u64);
                } else {
                    assert!(res.is_err());
                    assert_eq!(buf.tell(), cursor);
                }
            }
            _ => {
                let pos = fastrand::u64(0..=model.len() as u64);
                buf.seek(Whence::Start, pos as i64).unwrap();
            }
        }
        assert_eq!(buf.as_bytes(), &model[..]);
        assert_invariants(&buf);
    }
}
