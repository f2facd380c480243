//! Path payloads for folder/file playback
//!
//! The module addresses files by a fixed-layout, path-like string. The
//! wildcards are required by the firmware: a folder component must end in `*`,
//! the base name must end in `*`, and the extension must be `???`. Without
//! them the file is not found, even if the name would match exactly.
//!
//! ```plain
//! offset:  0   1   2   3   4   5   6   7   8   9   10  11  12
//!        +---+---+---+---+---+---+---+---+---+---+---+---+---+
//!        | S | / | F | F | * | / | N | N | N | * | ? | ? | ? |
//!        +---+---+---+---+---+---+---+---+---+---+---+---+---+
//! ```
//!
//! `S` is the raw source byte (not an ASCII digit), `FF` the zero-padded
//! folder number and `NNN` the zero-padded file number. The folder-only
//! variant drops the file digits: `S/FF*/*???`.

use std::ops::Range;

use crate::protocol::{ProtocolError, MAX_PAYLOAD_LEN};

/// Folder/file template
const FILE_TEMPLATE: [u8; 13] = *b" /00*/000*???";
/// Folder-only template
const FOLDER_TEMPLATE: [u8; 10] = *b" /00*/*???";

const SOURCE_OFFSET: usize = 0;
const FOLDER_DIGITS: Range<usize> = 2..4;
const FILE_DIGITS: Range<usize> = 6..9;

/// Highest addressable folder (two digits)
pub const MAX_FOLDER: u16 = 99;
/// Highest addressable file (three digits)
pub const MAX_FILE: u16 = 999;
/// Highest file number in a numbered playlist (two digits)
pub const MAX_PLAYLIST_FILE: u8 = 99;
/// Playlist entries are two bytes each and must fit in one payload
pub const MAX_PLAYLIST_LEN: usize = MAX_PAYLOAD_LEN / 2;

/// Write `value` as zero-padded ASCII decimal filling `dest`
fn write_digits(dest: &mut [u8], mut value: u16) {
    for slot in dest.iter_mut().rev() {
        *slot = b'0' + (value % 10) as u8;
        value /= 10;
    }
}

fn check_folder(folder: u16) -> Result<(), ProtocolError> {
    if folder > MAX_FOLDER {
        return Err(ProtocolError::InvalidArgument(format!(
            "folder {} out of range 0..={}",
            folder, MAX_FOLDER
        )));
    }
    Ok(())
}

/// Payload addressing `/FF/NNN.*` on `source`
pub fn file_in_folder(source: u8, folder: u16, file: u16) -> Result<Vec<u8>, ProtocolError> {
    check_folder(folder)?;
    if file > MAX_FILE {
        return Err(ProtocolError::InvalidArgument(format!(
            "file {} out of range 0..={}",
            file, MAX_FILE
        )));
    }

    let mut buf = FILE_TEMPLATE;
    buf[SOURCE_OFFSET] = source;
    write_digits(&mut buf[FOLDER_DIGITS], folder);
    write_digits(&mut buf[FILE_DIGITS], file);
    Ok(buf.to_vec())
}

/// Payload addressing the first file of `/FF/` on `source`
pub fn folder(source: u8, folder: u16) -> Result<Vec<u8>, ProtocolError> {
    check_folder(folder)?;

    let mut buf = FOLDER_TEMPLATE;
    buf[SOURCE_OFFSET] = source;
    write_digits(&mut buf[FOLDER_DIGITS], folder);
    Ok(buf.to_vec())
}

fn check_playlist_len(len: usize) -> Result<(), ProtocolError> {
    if len > MAX_PLAYLIST_LEN {
        return Err(ProtocolError::InvalidArgument(format!(
            "playlist of {} entries exceeds {}",
            len, MAX_PLAYLIST_LEN
        )));
    }
    Ok(())
}

/// Playlist payload for files `/ZH/NN.*`, two ASCII digits per entry
pub fn playlist_numbers(files: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    check_playlist_len(files.len())?;

    let mut buf = vec![0u8; files.len() * 2];
    for (chunk, file) in buf.chunks_exact_mut(2).zip(files) {
        if *file > MAX_PLAYLIST_FILE {
            return Err(ProtocolError::InvalidArgument(format!(
                "playlist file {} out of range 0..={}",
                file, MAX_PLAYLIST_FILE
            )));
        }
        write_digits(chunk, u16::from(*file));
    }
    Ok(buf)
}

/// Playlist payload for files `/ZH/XX.*` given their two-character names
pub fn playlist_names(names: &[[u8; 2]]) -> Result<Vec<u8>, ProtocolError> {
    check_playlist_len(names.len())?;
    Ok(names.iter().flatten().copied().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_folder_3_file_6() {
        let payload = file_in_folder(0x01, 3, 6).unwrap();
        assert_eq!(
            payload,
            vec![0x01, b'/', b'0', b'3', b'*', b'/', b'0', b'0', b'6', b'*', b'?', b'?', b'?']
        );
    }

    #[test]
    fn test_wide_numbers_fill_every_digit() {
        let payload = file_in_folder(0x02, 42, 321).unwrap();
        assert_eq!(&payload[1..], b"/42*/321*???");
    }

    #[test]
    fn test_folder_only() {
        let payload = folder(0x00, 7).unwrap();
        assert_eq!(payload, vec![0x00, b'/', b'0', b'7', b'*', b'/', b'*', b'?', b'?', b'?']);
    }

    #[test]
    fn test_out_of_range_addresses() {
        assert!(file_in_folder(1, 100, 1).is_err());
        assert!(file_in_folder(1, 1, 1000).is_err());
        assert!(folder(1, 100).is_err());
        assert!(file_in_folder(1, 99, 999).is_ok());
    }

    #[test]
    fn test_playlist_numbers() {
        assert_eq!(playlist_numbers(&[3, 1, 12]).unwrap(), b"030112".to_vec());
        assert!(playlist_numbers(&[100]).is_err());
        assert!(playlist_numbers(&[1u8; 128]).is_err());
        assert_eq!(playlist_numbers(&[1u8; 127]).unwrap().len(), 254);
    }

    #[test]
    fn test_playlist_names() {
        let names = [*b"1B", *b"A1", *b"AZ"];
        assert_eq!(playlist_names(&names).unwrap(), b"1BA1AZ".to_vec());
    }
}
