use std::{io, str::Utf8Error};

use bstr::BString;
use thiserror::Error;

use crate::model::FileLayout;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Unexpected End Of Stream: {context}")]
    UnexpectedEof { context: &'static str },

    #[error("Invalid Start Character: {character:?} at byte {position}")]
    InvalidStartCharacter { character: char, position: u64 },

    #[error("Invalid String Length Character: {character:?} at byte {position}")]
    InvalidLengthCharacter { character: char, position: u64 },

    #[error("String Length Overflow")]
    LengthOverflow,

    #[error("Corrupted Integer: {raw:?}")]
    IntegerCorrupted { raw: BString },

    #[error("Non Canonical Integer: {raw:?}")]
    NonCanonicalInteger { raw: BString },

    #[error("Unexpected End Marker at byte {position}")]
    UnexpectedEndMarker { position: u64 },

    #[error("List Element Corrupted: {0}")]
    ListElement(#[source] Box<DecodeError>),

    #[error("Dictionary Key Corrupted: {0}")]
    DictionaryKey(#[source] Box<DecodeError>),

    #[error("Invalid Dictionary Key Type: expected ByteString, found {found}")]
    DictionaryKeyType { found: &'static str },

    #[error("Missing Dictionary Value For Key {key:?}")]
    MissingDictionaryValue { key: BString },

    #[error("Dictionary Value Corrupted For Key {key:?}: {source}")]
    DictionaryValue {
        key: BString,
        #[source]
        source: Box<DecodeError>,
    },

    #[error("Nesting Deeper Than {limit} Levels")]
    NestingTooDeep { limit: usize },

    #[error("IO Error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EncodeError {
    #[error("File Path Is Missing: file {index}")]
    FilePathMissing { index: usize },

    #[error("Empty Path Segment: file {index}")]
    EmptyPathSegment { index: usize },

    #[error("File Name Is Missing")]
    FileNameMissing,

    #[error("Directory Name Is Missing")]
    DirectoryNameMissing,

    #[error("Cannot Encode {layout:?} Layout With {count} Files")]
    FileCount { layout: FileLayout, count: usize },
}

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Data Is Not A Dictionary: found {found}")]
    NotADictionary { found: &'static str },

    #[error("Invalid Field Type For {field}: expected {expected}, found {found}")]
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Missing Required Field: {field}")]
    MissingField { field: &'static str },

    #[error("Invalid Field {field}: {reason}")]
    Validation {
        field: &'static str,
        reason: String,
    },

    #[error("Invalid UTF-8 In {field}: {source}")]
    InvalidUtf8 {
        field: &'static str,
        #[source]
        source: Utf8Error,
    },

    #[error("No Endpoint Found: announce: {announce}; announce-list: {announce_list}; url-list: {url_list}")]
    NoEndpointFound {
        announce: Box<MetadataError>,
        announce_list: Box<MetadataError>,
        url_list: Box<MetadataError>,
    },

    #[error("File {index} Corrupted: {source}")]
    FileCorrupted {
        index: usize,
        #[source]
        source: Box<MetadataError>,
    },

    #[error("Failed To Unmarshal Info: {0}")]
    Info(#[source] Box<MetadataError>),

    #[error("Failed To Compute Info Hash: {0}")]
    InfoHash(#[from] EncodeError),
}

#[derive(Error, Debug)]
pub enum TorrentError {
    #[error("Decode Error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Metadata Error: {0}")]
    Metadata(#[from] MetadataError),
}

pub type DecodeResult<T> = Result<T, DecodeError>;
pub type MetadataResult<T> = Result<T, MetadataError>;
