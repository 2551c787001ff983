//! Dictionary keys of the metainfo format.

pub const ANNOUNCE: &str = "announce";
pub const ANNOUNCE_LIST: &str = "announce-list";
pub const COMMENT: &str = "comment";
pub const CREATED_BY: &str = "created by";
pub const CREATION_DATE: &str = "creation date";
pub const INFO: &str = "info";
pub const URL_LIST: &str = "url-list";

pub const NAME: &str = "name";
pub const LENGTH: &str = "length";
pub const PATH: &str = "path";
pub const PIECE_LENGTH: &str = "piece length";
pub const PIECES: &str = "pieces";
pub const FILES: &str = "files";
