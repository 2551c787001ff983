//! Bencode decoding and canonical encoding, plus typed torrent metainfo.
//!
//! ```
//! use torrent_bencode::{decode, encode, Value};
//!
//! let value = decode(b"d1:bi1e1:ai2ee".as_slice()).unwrap();
//! assert_eq!(value.get(b"a"), Some(&Value::Integer(2)));
//! assert_eq!(encode(&value).unwrap(), b"d1:ai2e1:bi1ee");
//! ```

use std::io::{BufReader, Read};

use error::TorrentError;
use model::TorrentMetadata;

mod announce;
mod decode;
mod encode;
pub mod error;
pub mod keys;
pub mod model;
mod unmarshal;
pub mod value;

pub use announce::randomize_announce_list;
pub use decode::{
    decode, decode_with_config, Decoder, DecoderConfig, IntegerMode, DEFAULT_MAX_DEPTH,
};
pub use encode::{encode, Encode};
pub use model::hash;
pub use unmarshal::{
    unmarshal, unmarshal_announce, unmarshal_announce_list, unmarshal_comment,
    unmarshal_created_by, unmarshal_creation_date, unmarshal_info, unmarshal_url_list,
    unmarshal_with_rng,
};
pub use value::{Dictionary, Value};

pub fn parse_torrent_metadata(bencoded: &[u8]) -> Result<TorrentMetadata, TorrentError> {
    let value = decode(bencoded)?;
    Ok(unmarshal(&value)?)
}

/// Decodes and unmarshals the first value read from `reader`.
pub fn parse_torrent_reader<R: Read>(reader: R) -> Result<TorrentMetadata, TorrentError> {
    let value = decode(BufReader::new(reader))?;
    Ok(unmarshal(&value)?)
}
