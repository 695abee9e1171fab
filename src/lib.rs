//! # Adahuff Library
//!
//! Compress or expand with adaptive Huffman coding
//! * `fgk` implements the Faller-Gallager-Knuth adaptive code: the code tree is
//!   rebuilt incrementally on both ends, so the output carries no code table
//! * an optional first difference (DPCM) filter decorrelates slowly varying
//!   inputs before coding
//!
//! The compression/expansion functions are generics that operate on trait objects
//! with bounds `Read + Seek` or `Write + Seek`.  There are convenience functions for working
//! directly with buffers.
//!
//! ## File Example
//!
//! ```rs
//! use adahuff::*;
//! let mut in_file = std::fs::File::open("some_input_path").expect("open failed");
//! let mut out_file = std::fs::File::create("some_output_path").expect("create failed");
//! let (in_size,out_size) = fgk::compress(&mut in_file,&mut out_file,&STD_OPTIONS)
//!     .expect("compression failed");
//! eprintln!("compressed {} into {}",in_size,out_size);
//! ```
//!
//! ## Buffer Example
//!
//! ```rs
//! use adahuff::*;
//! let test_data = "This is the chaunt of the priests.  The chaunt of the priests of Mung.".as_bytes();
//! let compressed = fgk::compress_slice(test_data,&STD_OPTIONS).expect("compression failed");
//! ```

mod tools;
pub mod fgk;

type DYNERR = Box<dyn std::error::Error>;

/// Codec Errors
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("unexpected end of bit stream")]
    EndOfStream,
    #[error("corrupt bit stream")]
    CorruptStream,
    #[error("symbol outside the alphabet range")]
    AlphabetMismatch,
    #[error("code tree invariant violated")]
    InvariantViolation,
    #[error("file too large")]
    FileTooLarge
}

/// bit packing strategy
#[derive(Clone,PartialEq)]
pub enum BitOrder {
    /// first bit in the stream is the MSB of the first byte
    Msb0,
    /// first bit in the stream is the LSB of the first byte
    Lsb0
}

/// Options controlling the codec
#[derive(Clone)]
pub struct Options {
    /// lowest symbol value in the alphabet
    pub min_symbol: u8,
    /// highest symbol value in the alphabet
    pub max_symbol: u8,
    /// apply the first difference filter before coding
    pub dpcm: bool,
    /// bit packing strategy, must be the same on both ends
    pub ord: BitOrder,
    /// return error if file is larger
    pub max_file_size: u64
}

pub const STD_OPTIONS: Options = Options {
    min_symbol: 0,
    max_symbol: 255,
    dpcm: false,
    ord: BitOrder::Lsb0,
    max_file_size: u32::MAX as u64/4
};
