use bstr::BStr;
use rand::Rng;
use tracing::{debug, warn};

use crate::{
    announce::randomize_announce_list,
    error::{MetadataError, MetadataResult},
    keys,
    model::{File, FileLayout, Info, Piece, TorrentMetadata, PIECE_HASH_LEN},
    value::{Dictionary, Value},
};

/// Projects a decoded metainfo document into [`TorrentMetadata`], shuffling
/// announce tiers with the thread-local generator.
pub fn unmarshal(value: &Value) -> MetadataResult<TorrentMetadata> {
    unmarshal_with_rng(value, &mut rand::rng())
}

pub fn unmarshal_with_rng<R: Rng + ?Sized>(
    value: &Value,
    rng: &mut R,
) -> MetadataResult<TorrentMetadata> {
    let dict = root(value)?;

    // endpoints: any one of the three is enough
    let (announce, announce_list, url_list) = match (
        unmarshal_announce(dict),
        unmarshal_announce_list(dict),
        unmarshal_url_list(dict),
    ) {
        (Err(announce), Err(announce_list), Err(url_list)) => {
            warn!("no usable announce, announce-list or url-list");
            return Err(MetadataError::NoEndpointFound {
                announce: Box::new(announce),
                announce_list: Box::new(announce_list),
                url_list: Box::new(url_list),
            });
        }
        (announce, announce_list, url_list) => (
            recover(keys::ANNOUNCE, announce),
            recover(keys::ANNOUNCE_LIST, announce_list),
            recover(keys::URL_LIST, url_list),
        ),
    };

    let randomized_announce_list = announce_list
        .as_deref()
        .map(|tiers| randomize_announce_list(tiers, rng))
        .unwrap_or_default();

    // meta: left unset when unusable
    let comment = recover(keys::COMMENT, unmarshal_comment(dict));
    let created_by = recover(keys::CREATED_BY, unmarshal_created_by(dict));
    let creation_date = recover(keys::CREATION_DATE, unmarshal_creation_date(dict));

    let info = unmarshal_info(dict).map_err(|err| MetadataError::Info(Box::new(err)))?;
    let info_hash = info.hash()?;

    Ok(TorrentMetadata {
        announce,
        announce_list,
        randomized_announce_list,
        comment,
        created_by,
        creation_date,
        url_list,
        info,
        info_hash,
    })
}

fn root(value: &Value) -> MetadataResult<&Dictionary> {
    match value {
        Value::Dictionary(dict) => Ok(dict),
        other => Err(MetadataError::NotADictionary {
            found: other.kind(),
        }),
    }
}

fn recover<T>(field: &'static str, result: MetadataResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(MetadataError::MissingField { .. }) => None,
        Err(err) => {
            debug!(field, %err, "ignoring unusable field");
            None
        }
    }
}

pub fn unmarshal_announce(dict: &Dictionary) -> MetadataResult<String> {
    expect_text(require(dict, keys::ANNOUNCE)?, keys::ANNOUNCE)
}

pub fn unmarshal_announce_list(dict: &Dictionary) -> MetadataResult<Vec<Vec<String>>> {
    expect_list(require(dict, keys::ANNOUNCE_LIST)?, keys::ANNOUNCE_LIST)?
        .iter()
        .map(|tier| text_list(tier, keys::ANNOUNCE_LIST))
        .collect()
}

pub fn unmarshal_url_list(dict: &Dictionary) -> MetadataResult<Vec<String>> {
    text_list(require(dict, keys::URL_LIST)?, keys::URL_LIST)
}

pub fn unmarshal_comment(dict: &Dictionary) -> MetadataResult<String> {
    expect_text(require(dict, keys::COMMENT)?, keys::COMMENT)
}

pub fn unmarshal_created_by(dict: &Dictionary) -> MetadataResult<String> {
    expect_text(require(dict, keys::CREATED_BY)?, keys::CREATED_BY)
}

pub fn unmarshal_creation_date(dict: &Dictionary) -> MetadataResult<i64> {
    expect_integer(require(dict, keys::CREATION_DATE)?, keys::CREATION_DATE)
}

/// Reads the `info` section of a metainfo dictionary.
///
/// A `files` key selects the multi-file layout; without it the section
/// describes a single file named `name` whose size is `length`.
pub fn unmarshal_info(dict: &Dictionary) -> MetadataResult<Info> {
    let info = expect_dictionary(require(dict, keys::INFO)?, keys::INFO)?;

    // read piece length
    let piece_length = expect_integer(require(info, keys::PIECE_LENGTH)?, keys::PIECE_LENGTH)?;
    let piece_length = u64::try_from(piece_length)
        .ok()
        .filter(|length| *length > 0)
        .ok_or_else(|| MetadataError::Validation {
            field: keys::PIECE_LENGTH,
            reason: format!("must be positive, got {piece_length}"),
        })?;

    // read pieces
    let pieces = unmarshal_pieces(info)?;

    // read name
    let directory_name = expect_text(require(info, keys::NAME)?, keys::NAME)?;
    if directory_name.is_empty() {
        return Err(MetadataError::Validation {
            field: keys::NAME,
            reason: "must not be empty".to_string(),
        });
    }

    let (layout, files) = match info.get(BStr::new(keys::FILES)) {
        Some(files) => (
            FileLayout::Multiple,
            unmarshal_files(files, &directory_name)?,
        ),
        None => {
            let length = non_negative(
                expect_integer(require(info, keys::LENGTH)?, keys::LENGTH)?,
                keys::LENGTH,
            )?;
            (
                FileLayout::Single,
                vec![File::single(length, &directory_name)],
            )
        }
    };

    Ok(Info {
        piece_length,
        pieces,
        files,
        directory_name,
        layout,
    })
}

fn unmarshal_pieces(info: &Dictionary) -> MetadataResult<Vec<Piece>> {
    let raw = expect_bytes(require(info, keys::PIECES)?, keys::PIECES)?;
    if raw.len() % PIECE_HASH_LEN != 0 {
        return Err(MetadataError::Validation {
            field: keys::PIECES,
            reason: format!(
                "length {} is not a multiple of {PIECE_HASH_LEN}",
                raw.len()
            ),
        });
    }

    // divide pieces into 20-byte SHA1 hashes
    Ok(raw
        .chunks_exact(PIECE_HASH_LEN)
        .map(|chunk| {
            let mut piece = [0u8; PIECE_HASH_LEN];
            piece.copy_from_slice(chunk);
            Piece(piece)
        })
        .collect())
}

fn unmarshal_files(files: &Value, directory_name: &str) -> MetadataResult<Vec<File>> {
    expect_list(files, keys::FILES)?
        .iter()
        .enumerate()
        .map(|(index, file)| {
            unmarshal_file(file, directory_name).map_err(|err| MetadataError::FileCorrupted {
                index,
                source: Box::new(err),
            })
        })
        .collect()
}

fn unmarshal_file(file: &Value, directory_name: &str) -> MetadataResult<File> {
    let file = expect_dictionary(file, keys::FILES)?;
    let length = non_negative(
        expect_integer(require(file, keys::LENGTH)?, keys::LENGTH)?,
        keys::LENGTH,
    )?;
    let path = text_list(require(file, keys::PATH)?, keys::PATH)?;
    File::new(length, path, directory_name)
}

fn require<'a>(dict: &'a Dictionary, field: &'static str) -> MetadataResult<&'a Value> {
    dict.get(BStr::new(field))
        .ok_or(MetadataError::MissingField { field })
}

fn mismatch(field: &'static str, expected: &'static str, found: &Value) -> MetadataError {
    MetadataError::TypeMismatch {
        field,
        expected,
        found: found.kind(),
    }
}

fn expect_bytes<'a>(value: &'a Value, field: &'static str) -> MetadataResult<&'a [u8]> {
    match value {
        Value::ByteString(bytes) => Ok(bytes.as_slice()),
        other => Err(mismatch(field, "ByteString", other)),
    }
}

fn expect_text(value: &Value, field: &'static str) -> MetadataResult<String> {
    std::str::from_utf8(expect_bytes(value, field)?)
        .map(str::to_owned)
        .map_err(|source| MetadataError::InvalidUtf8 { field, source })
}

fn expect_integer(value: &Value, field: &'static str) -> MetadataResult<i64> {
    match value {
        Value::Integer(integer) => Ok(*integer),
        other => Err(mismatch(field, "Integer", other)),
    }
}

fn expect_list<'a>(value: &'a Value, field: &'static str) -> MetadataResult<&'a [Value]> {
    match value {
        Value::List(list) => Ok(list),
        other => Err(mismatch(field, "List", other)),
    }
}

fn expect_dictionary<'a>(value: &'a Value, field: &'static str) -> MetadataResult<&'a Dictionary> {
    match value {
        Value::Dictionary(dict) => Ok(dict),
        other => Err(mismatch(field, "Dictionary", other)),
    }
}

fn text_list(value: &Value, field: &'static str) -> MetadataResult<Vec<String>> {
    expect_list(value, field)?
        .iter()
        .map(|item| expect_text(item, field))
        .collect()
}

fn non_negative(value: i64, field: &'static str) -> MetadataResult<u64> {
    u64::try_from(value).map_err(|_| MetadataError::Validation {
        field,
        reason: format!("must not be negative, got {value}"),
    })
}
