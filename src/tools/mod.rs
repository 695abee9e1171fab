//! Internal building blocks for the codec

pub mod bit_buffer;
pub mod code_tree;
pub mod dpcm;
