use std::fmt;

use rand::Rng;
use sha1::{Digest, Sha1};
use tracing::trace;

use crate::{
    announce::randomize_announce_list,
    encode::encode,
    error::{EncodeError, MetadataError, MetadataResult},
    keys,
};

pub const PIECE_HASH_LEN: usize = 20;
pub const PATH_SEPARATOR: &str = "/";

/// SHA-1 digest of one piece of content.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece(pub [u8; PIECE_HASH_LEN]);

impl Piece {
    pub fn as_bytes(&self) -> &[u8; PIECE_HASH_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Piece({})", self.to_hex())
    }
}

impl From<[u8; PIECE_HASH_LEN]> for Piece {
    fn from(bytes: [u8; PIECE_HASH_LEN]) -> Self {
        Piece(bytes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    pub length: u64,
    pub decomposed_path: Vec<String>,
    /// Segments joined with [`PATH_SEPARATOR`].
    pub path: String,
    /// `path` prefixed with the torrent's directory name.
    pub complete_path: String,
}

impl File {
    /// Builds an entry of a multi-file torrent. Every path segment must be
    /// non-empty and there must be at least one.
    pub fn new(
        length: u64,
        decomposed_path: Vec<String>,
        directory_name: &str,
    ) -> MetadataResult<Self> {
        if decomposed_path.is_empty() {
            return Err(MetadataError::Validation {
                field: keys::PATH,
                reason: "path has no segments".to_string(),
            });
        }
        if let Some(position) = decomposed_path.iter().position(String::is_empty) {
            return Err(MetadataError::Validation {
                field: keys::PATH,
                reason: format!("segment {position} is empty"),
            });
        }

        let path = decomposed_path.join(PATH_SEPARATOR);
        let complete_path = if directory_name.is_empty() {
            path.clone()
        } else {
            format!("{directory_name}{PATH_SEPARATOR}{path}")
        };
        Ok(File {
            length,
            decomposed_path,
            path,
            complete_path,
        })
    }

    /// The only entry of a single-file torrent, named after the torrent itself.
    pub(crate) fn single(length: u64, name: &str) -> Self {
        File {
            length,
            decomposed_path: vec![name.to_string()],
            path: name.to_string(),
            complete_path: name.to_string(),
        }
    }
}

/// Wire shape of the info dictionary: `length` and `name` at the top level,
/// or a `files` list under a directory `name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileLayout {
    Single,
    Multiple,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Info {
    pub piece_length: u64,
    pub pieces: Vec<Piece>,
    pub files: Vec<File>,
    pub directory_name: String,
    pub layout: FileLayout,
}

impl Info {
    pub fn single_file(
        name: impl Into<String>,
        length: u64,
        piece_length: u64,
        pieces: Vec<Piece>,
    ) -> Self {
        let name = name.into();
        Info {
            piece_length,
            pieces,
            files: vec![File::single(length, &name)],
            directory_name: name,
            layout: FileLayout::Single,
        }
    }

    pub fn multi_file(
        directory_name: impl Into<String>,
        files: Vec<File>,
        piece_length: u64,
        pieces: Vec<Piece>,
    ) -> Self {
        Info {
            piece_length,
            pieces,
            files,
            directory_name: directory_name.into(),
            layout: FileLayout::Multiple,
        }
    }

    pub fn total_length(&self) -> u64 {
        self.files.iter().map(|file| file.length).sum()
    }

    /// SHA-1 of the canonical encoding of this info section.
    pub fn hash(&self) -> Result<InfoHash, EncodeError> {
        let encoded = encode(self)?;
        let mut digest = [0u8; 20];
        digest.copy_from_slice(&Sha1::digest(&encoded));
        let info_hash = InfoHash(digest);
        trace!(%info_hash, encoded_len = encoded.len(), "computed info hash");
        Ok(info_hash)
    }
}

pub fn hash(info: &Info) -> Result<InfoHash, EncodeError> {
    info.hash()
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct InfoHash([u8; 20]);

impl InfoHash {
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InfoHash({})", self.to_hex())
    }
}

impl fmt::Display for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[derive(Debug, Clone)]
pub struct TorrentMetadata {
    pub announce: Option<String>,
    pub announce_list: Option<Vec<Vec<String>>>,
    pub randomized_announce_list: Vec<String>,
    pub comment: Option<String>,
    pub created_by: Option<String>,
    pub creation_date: Option<i64>,
    pub url_list: Option<Vec<String>>,
    pub(crate) info: Info,
    pub(crate) info_hash: InfoHash,
}

impl TorrentMetadata {
    pub fn info(&self) -> &Info {
        &self.info
    }

    /// Always the hash of [`TorrentMetadata::info`].
    pub fn info_hash(&self) -> InfoHash {
        self.info_hash
    }

    pub fn is_single_file(&self) -> bool {
        self.info.layout == FileLayout::Single
    }

    pub fn total_length(&self) -> u64 {
        self.info.total_length()
    }

    /// Trackers in the order they should be tried.
    pub fn trackers(&self) -> Vec<&str> {
        if self.randomized_announce_list.is_empty() {
            return self.announce.as_deref().into_iter().collect();
        }
        self.randomized_announce_list
            .iter()
            .map(String::as_str)
            .collect()
    }

    /// Draws a fresh intra-tier order for the announce list.
    pub fn shuffle_trackers<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.randomized_announce_list = self
            .announce_list
            .as_deref()
            .map(|tiers| randomize_announce_list(tiers, rng))
            .unwrap_or_default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_paths_are_joined() {
        let file = File::new(
            3400,
            vec!["chat".to_string(), "nooon.txt".to_string()],
            "bundle",
        )
        .unwrap();
        assert_eq!(file.path, "chat/nooon.txt");
        assert_eq!(file.complete_path, "bundle/chat/nooon.txt");

        let file = File::new(12, vec!["ouiii.txt".to_string()], "").unwrap();
        assert_eq!(file.complete_path, "ouiii.txt");
    }

    #[test]
    fn file_rejects_empty_paths() {
        assert!(matches!(
            File::new(1, vec![], "dir"),
            Err(MetadataError::Validation { field: "path", .. })
        ));
        assert!(matches!(
            File::new(1, vec!["a".to_string(), String::new()], "dir"),
            Err(MetadataError::Validation { field: "path", .. })
        ));
    }

    #[test]
    fn single_file_info_describes_one_file() {
        let info = Info::single_file("movie.mkv", 42, 16384, vec![Piece([1; 20])]);
        assert_eq!(info.layout, FileLayout::Single);
        assert_eq!(info.files[0].decomposed_path, vec!["movie.mkv"]);
        assert_eq!(info.files[0].complete_path, "movie.mkv");
        assert_eq!(info.total_length(), 42);
    }

    #[test]
    fn digests_render_as_hex() {
        let piece = Piece([0xab; 20]);
        assert_eq!(piece.to_hex(), "ab".repeat(20));
        assert_eq!(format!("{piece:?}"), format!("Piece({})", "ab".repeat(20)));

        let info_hash = InfoHash([0x0f; 20]);
        assert_eq!(info_hash.to_string(), "0f".repeat(20));
    }
}
