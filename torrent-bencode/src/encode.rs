use crate::{
    error::EncodeError,
    keys,
    model::{File, FileLayout, Info, Piece, PIECE_HASH_LEN},
    value::Value,
};

/// Types with a canonical bencode representation.
///
/// Dictionaries are always written with their keys in ascending raw-byte
/// order, so logically equal inputs produce identical bytes.
pub trait Encode {
    fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), EncodeError>;
}

pub fn encode<T: Encode + ?Sized>(value: &T) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();
    value.encode_into(&mut out)?;
    Ok(out)
}

fn write_digits<I: itoa::Integer>(out: &mut Vec<u8>, number: I) {
    let mut buffer = itoa::Buffer::new();
    out.extend_from_slice(buffer.format(number).as_bytes());
}

fn write_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    write_digits(out, bytes.len());
    out.push(b':');
    out.extend_from_slice(bytes);
}

fn write_integer<I: itoa::Integer>(out: &mut Vec<u8>, number: I) {
    out.push(b'i');
    write_digits(out, number);
    out.push(b'e');
}

impl Encode for Value {
    fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        match self {
            Value::ByteString(bytes) => write_bytes(out, bytes),
            Value::Integer(integer) => write_integer(out, *integer),
            Value::List(list) => {
                out.push(b'l');
                for item in list {
                    item.encode_into(out)?;
                }
                out.push(b'e');
            }
            Value::Dictionary(dict) => {
                // BTreeMap iterates keys in ascending byte order
                out.push(b'd');
                for (key, value) in dict {
                    write_bytes(out, key);
                    value.encode_into(out)?;
                }
                out.push(b'e');
            }
        }
        Ok(())
    }
}

impl Encode for str {
    fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        write_bytes(out, self.as_bytes());
        Ok(())
    }
}

impl Encode for [u8] {
    fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        write_bytes(out, self);
        Ok(())
    }
}

impl Encode for i64 {
    fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        write_integer(out, *self);
        Ok(())
    }
}

impl Encode for Piece {
    fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        write_bytes(out, self.as_bytes());
        Ok(())
    }
}

/// The `pieces` field: every digest concatenated into one byte string.
impl Encode for [Piece] {
    fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        write_digits(out, self.len() * PIECE_HASH_LEN);
        out.push(b':');
        for piece in self {
            out.extend_from_slice(piece.as_bytes());
        }
        Ok(())
    }
}

/// One entry of the `files` list.
impl Encode for File {
    fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        encode_file(self, 0, out)
    }
}

fn encode_file(file: &File, index: usize, out: &mut Vec<u8>) -> Result<(), EncodeError> {
    if file.decomposed_path.is_empty() {
        return Err(EncodeError::FilePathMissing { index });
    }

    out.push(b'd');
    write_bytes(out, keys::LENGTH.as_bytes());
    write_integer(out, file.length);
    write_bytes(out, keys::PATH.as_bytes());
    out.push(b'l');
    for segment in &file.decomposed_path {
        if segment.is_empty() {
            return Err(EncodeError::EmptyPathSegment { index });
        }
        write_bytes(out, segment.as_bytes());
    }
    out.extend_from_slice(b"ee");
    Ok(())
}

/// Writes the info dictionary in the shape dictated by its layout, keys
/// already in canonical order.
impl Encode for Info {
    fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        out.push(b'd');
        match self.layout {
            FileLayout::Single => {
                let [file] = self.files.as_slice() else {
                    return Err(EncodeError::FileCount {
                        layout: self.layout,
                        count: self.files.len(),
                    });
                };
                if self.directory_name.is_empty() {
                    return Err(EncodeError::FileNameMissing);
                }
                write_bytes(out, keys::LENGTH.as_bytes());
                write_integer(out, file.length);
                write_bytes(out, keys::NAME.as_bytes());
                write_bytes(out, self.directory_name.as_bytes());
            }
            FileLayout::Multiple => {
                if self.directory_name.is_empty() {
                    return Err(EncodeError::DirectoryNameMissing);
                }
                write_bytes(out, keys::FILES.as_bytes());
                out.push(b'l');
                for (index, file) in self.files.iter().enumerate() {
                    encode_file(file, index, out)?;
                }
                out.push(b'e');
                write_bytes(out, keys::NAME.as_bytes());
                write_bytes(out, self.directory_name.as_bytes());
            }
        }
        write_bytes(out, keys::PIECE_LENGTH.as_bytes());
        write_integer(out, self.piece_length);
        write_bytes(out, keys::PIECES.as_bytes());
        self.pieces.encode_into(out)?;
        out.push(b'e');
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{decode, value::Dictionary};

    fn file(length: u64, segments: &[&str], directory: &str) -> File {
        let segments = segments.iter().map(|segment| segment.to_string()).collect();
        File::new(length, segments, directory).unwrap()
    }

    fn pieces() -> Vec<Piece> {
        vec![Piece(*b"0123456789abcdefghij")]
    }

    #[test]
    fn encodes_strings() {
        assert_eq!(encode("").unwrap(), b"0:");
        assert_eq!(encode("oui").unwrap(), b"3:oui");
        assert_eq!(encode("chat").unwrap(), b"4:chat");
        assert_eq!(encode(&b"\x00\xff"[..]).unwrap(), b"2:\x00\xff");
    }

    #[test]
    fn encodes_integers() {
        assert_eq!(encode(&-1i64).unwrap(), b"i-1e");
        assert_eq!(encode(&0i64).unwrap(), b"i0e");
        assert_eq!(encode(&333i64).unwrap(), b"i333e");
        assert_eq!(
            encode(&Value::Integer(i64::MIN)).unwrap(),
            b"i-9223372036854775808e"
        );
    }

    #[test]
    fn encodes_lists() {
        assert_eq!(encode(&Value::List(vec![])).unwrap(), b"le");
        let list = Value::List(vec![
            Value::Integer(1),
            Value::List(vec![Value::List(vec![Value::from("chat")]), Value::from("2")]),
            Value::Integer(-3),
        ]);
        assert_eq!(encode(&list).unwrap(), b"li1ell4:chate1:2ei-3ee");
    }

    #[test]
    fn dictionary_keys_are_sorted() {
        let mut dict = Dictionary::new();
        dict.insert("b".into(), Value::Integer(1));
        dict.insert("a".into(), Value::Integer(2));
        assert_eq!(
            encode(&Value::Dictionary(dict)).unwrap(),
            b"d1:ai2e1:bi1ee"
        );

        let dict: Value = [
            ("second", Value::Integer(2)),
            ("first", Value::Integer(1)),
            ("", Value::from("empty")),
        ]
        .into_iter()
        .collect();
        assert_eq!(encode(&dict).unwrap(), b"d0:5:empty5:firsti1e6:secondi2ee");
    }

    #[test]
    fn keys_sort_by_raw_bytes() {
        let dict: Value = [("a", 1i64), ("B", 2i64), ("\u{e9}", 3i64), ("aa", 4i64)]
            .into_iter()
            .collect();
        assert_eq!(
            encode(&dict).unwrap(),
            "d1:Bi2e1:ai1e2:aai4e2:\u{e9}i3ee".as_bytes()
        );
    }

    #[test]
    fn encodes_pieces() {
        assert_eq!(
            encode(&[Piece(*b"00000000000000000000")][..]).unwrap(),
            b"20:00000000000000000000"
        );
        assert_eq!(encode(&[] as &[Piece]).unwrap(), b"0:");
    }

    #[test]
    fn encodes_a_file_entry() {
        assert_eq!(
            encode(&file(3400, &["chat", "nooon.txt"], "dir")).unwrap(),
            b"d6:lengthi3400e4:pathl4:chat9:nooon.txtee"
        );
    }

    #[test]
    fn encodes_single_file_info() {
        let info = Info::single_file("ouiii.txt", 12, 233, pieces());
        assert_eq!(
            encode(&info).unwrap(),
            b"d6:lengthi12e4:name9:ouiii.txt12:piece lengthi233e6:pieces20:0123456789abcdefghije"
        );
    }

    #[test]
    fn encodes_multi_file_info() {
        let info = Info::multi_file(
            "Bundle",
            vec![
                file(19710976, &["resource1.bin"], "Bundle"),
                file(9050674, &["data", "resource.bin"], "Bundle"),
                file(1056768, &["setup.exe"], "Bundle"),
            ],
            16384,
            pieces(),
        );
        assert_eq!(
            encode(&info).unwrap(),
            b"d5:filesld6:lengthi19710976e4:pathl13:resource1.bineed6:lengthi9050674e4:pathl4:data12:resource.bineed6:lengthi1056768e4:pathl9:setup.exeeee4:name6:Bundle12:piece lengthi16384e6:pieces20:0123456789abcdefghije"
        );
    }

    #[test]
    fn multi_file_layout_holds_for_any_count() {
        let two = Info::multi_file(
            "pair",
            vec![file(1, &["a"], "pair"), file(2, &["b"], "pair")],
            1,
            vec![],
        );
        assert_eq!(
            encode(&two).unwrap(),
            b"d5:filesld6:lengthi1e4:pathl1:aeed6:lengthi2e4:pathl1:beee4:name4:pair12:piece lengthi1e6:pieces0:e"
        );

        let one = Info::multi_file("solo", vec![file(5, &["x"], "solo")], 1, vec![]);
        assert!(encode(&one).unwrap().starts_with(b"d5:filesl"));
    }

    #[test]
    fn rejects_shapes_that_cannot_be_encoded() {
        let mut info = Info::single_file("a", 1, 1, vec![]);
        info.files.push(info.files[0].clone());
        assert_eq!(
            encode(&info).unwrap_err(),
            EncodeError::FileCount {
                layout: FileLayout::Single,
                count: 2
            }
        );

        let unnamed = Info::single_file("", 1, 1, vec![]);
        assert_eq!(encode(&unnamed).unwrap_err(), EncodeError::FileNameMissing);

        let undirected = Info::multi_file("", vec![file(1, &["a"], "")], 1, vec![]);
        assert_eq!(
            encode(&undirected).unwrap_err(),
            EncodeError::DirectoryNameMissing
        );

        let mut broken = file(1, &["a"], "dir");
        broken.decomposed_path.push(String::new());
        let info = Info::multi_file("dir", vec![file(1, &["ok"], "dir"), broken], 1, vec![]);
        assert_eq!(
            encode(&info).unwrap_err(),
            EncodeError::EmptyPathSegment { index: 1 }
        );

        let mut pathless = file(1, &["a"], "dir");
        pathless.decomposed_path.clear();
        assert_eq!(
            encode(&pathless).unwrap_err(),
            EncodeError::FilePathMissing { index: 0 }
        );
    }

    #[test]
    fn canonical_input_round_trips() {
        let inputs: [&[u8]; 5] = [
            b"4:chat",
            b"i-123e",
            b"li1ed4:chati8eee",
            b"d8:announce15:http://test.com4:infod4:name4:test12:piece lengthi16384eee",
            b"d0:5:empty5:firsti1e6:secondi2ee",
        ];
        for input in inputs {
            let decoded = decode(input).unwrap();
            assert_eq!(encode(&decoded).unwrap(), input);
        }
    }

    #[test]
    fn unsorted_input_is_reordered() {
        let decoded = decode(b"d1:bi1e1:ai2ee".as_slice()).unwrap();
        assert_eq!(encode(&decoded).unwrap(), b"d1:ai2e1:bi1ee");
    }
}
