//! Bit buffer for the adaptive Huffman coder.
//!
//! Carries a bit sequence in stream order and frames it onto whole bytes.
//! The packing convention only matters when crossing the byte boundary, so
//! it is passed to `to_bytes`/`from_bytes` rather than stored here.

use bit_vec::BitVec;
use crate::{BitOrder,Error};

/// bit_vec crate only handles MSB, this assumes starting alignment
fn bits_to_bytes_lsb0(bits: &BitVec) -> Vec<u8> {
    let mut ans = Vec::new();
    let byte_count = bits.len() / 8;
    let rem = bits.len() % 8;
    for i in 0..byte_count {
        let mut val = 0;
        for b in 0..8 {
            val |= (bits.get(i*8 + b).unwrap() as u8) << b;
        }
        ans.push(val);
    }
    if rem > 0 {
        let mut val = 0;
        for b in 0..rem {
            val |= (bits.get(byte_count*8 + b).unwrap() as u8) << b;
        }
        ans.push(val);
    }
    ans
}

/// bit_vec crate only handles MSB, this assumes starting alignment
fn bytes_to_bits_lsb0(bytes: &[u8]) -> BitVec {
    let mut ans = BitVec::new();
    for i in 0..bytes.len() {
        let val = bytes[i];
        for b in 0..8 {
            ans.push((val & (1 << b)) != 0);
        }
    }
    ans
}

/// Ordered bit sequence with a read cursor.
/// The writer appends at the tail while the reader consumes from the head.
pub struct BitBuffer {
    bits: BitVec,
    ptr: usize
}

impl BitBuffer {
    pub fn new() -> Self {
        Self {
            bits: BitVec::new(),
            ptr: 0
        }
    }
    /// unpack a byte stream with the given packing convention
    pub fn from_bytes(dat: &[u8],ord: &BitOrder) -> Self {
        let bits = match ord {
            BitOrder::Msb0 => BitVec::from_bytes(dat),
            BitOrder::Lsb0 => bytes_to_bits_lsb0(dat)
        };
        Self {
            bits,
            ptr: 0
        }
    }
    /// pack into bytes, the tail of the last byte is zero padded
    pub fn to_bytes(&self,ord: &BitOrder) -> Vec<u8> {
        match ord {
            BitOrder::Msb0 => self.bits.to_bytes(),
            BitOrder::Lsb0 => bits_to_bytes_lsb0(&self.bits)
        }
    }
    pub fn len(&self) -> usize {
        self.bits.len()
    }
    /// bits left between the read cursor and the tail
    pub fn remaining(&self) -> usize {
        self.bits.len() - self.ptr
    }
    pub fn push(&mut self,bit: bool) {
        self.bits.push(bit);
    }
    /// append a whole path in stream order
    pub fn extend(&mut self,path: &BitVec) {
        for bit in path.iter() {
            self.push(bit);
        }
    }
    /// append `num_bits` of `code` starting from the MSB
    pub fn put_code(&mut self,num_bits: usize,code: usize) {
        for i in (0..num_bits).rev() {
            self.bits.push(code & (1 << i) != 0);
        }
    }
    /// overwrite `num_bits` at `pos` with `code` starting from the MSB,
    /// used to fill a reserved header once the payload length is known
    pub fn set_code(&mut self,pos: usize,num_bits: usize,code: usize) {
        for i in 0..num_bits {
            self.bits.set(pos + i,code & (1 << (num_bits - 1 - i)) != 0);
        }
    }
    /// consume the next bit
    pub fn get_bit(&mut self) -> Result<bool,Error> {
        match self.bits.get(self.ptr) {
            Some(bit) => {
                self.ptr += 1;
                Ok(bit)
            },
            None => Err(Error::EndOfStream)
        }
    }
    /// consume `num_bits` into an unsigned value, MSB first
    pub fn get_code(&mut self,num_bits: usize) -> Result<usize,Error> {
        let mut ans: usize = 0;
        for _i in 0..num_bits {
            ans <<= 1;
            ans |= self.get_bit()? as usize;
        }
        Ok(ans)
    }
    /// drop the last `n` bits, caller must check against `remaining`
    pub fn truncate_tail(&mut self,n: usize) {
        let len = self.bits.len();
        self.bits.truncate(len - n);
    }
}

#[test]
fn lsb0_packing() {
    let mut buf = BitBuffer::new();
    buf.put_code(3,0b101);
    buf.put_code(8,0x41);
    assert_eq!(buf.to_bytes(&BitOrder::Lsb0),vec![0x15,0x04]);
}

#[test]
fn msb0_packing() {
    let mut buf = BitBuffer::new();
    buf.put_code(3,0b101);
    buf.put_code(8,0x41);
    assert_eq!(buf.to_bytes(&BitOrder::Msb0),vec![0xa8,0x20]);
}

#[test]
fn reserved_header() {
    let mut buf = BitBuffer::new();
    buf.put_code(3,0);
    buf.put_code(8,0x41);
    buf.set_code(0,3,0b101);
    assert_eq!(buf.to_bytes(&BitOrder::Lsb0),vec![0x15,0x04]);
}

#[test]
fn read_back() {
    let mut buf = BitBuffer::from_bytes(&[0x15,0x04],&BitOrder::Lsb0);
    assert_eq!(buf.len(),16);
    assert_eq!(buf.get_code(3).unwrap(),0b101);
    assert_eq!(buf.get_code(8).unwrap(),0x41);
    assert_eq!(buf.remaining(),5);
    buf.truncate_tail(5);
    assert_eq!(buf.remaining(),0);
}

#[test]
fn round_trip_both_orders() {
    for ord in [BitOrder::Lsb0,BitOrder::Msb0] {
        let mut buf = BitBuffer::new();
        buf.put_code(11,0x5a5);
        buf.put_code(5,0x0b);
        let bytes = buf.to_bytes(&ord);
        let mut readback = BitBuffer::from_bytes(&bytes,&ord);
        assert_eq!(readback.get_code(11).unwrap(),0x5a5);
        assert_eq!(readback.get_code(5).unwrap(),0x0b);
    }
}

#[test]
fn end_of_stream() {
    let mut buf = BitBuffer::from_bytes(&[0xff],&BitOrder::Lsb0);
    assert_eq!(buf.get_code(8).unwrap(),0xff);
    assert!(matches!(buf.get_bit(),Err(Error::EndOfStream)));
    assert!(matches!(buf.get_code(4),Err(Error::EndOfStream)));
}
