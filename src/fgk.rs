//! Adaptive Huffman Coding (FGK)
//!
//! This implements the Faller-Gallager-Knuth adaptive code over byte
//! oriented input.  Each symbol is coded with the prefix code implied by the
//! current tree, and the tree is updated after every symbol on both the
//! compressing and expanding side, so no code table is ever stored in the
//! output.  A symbol's first appearance is escaped through the NYT (not yet
//! transmitted) leaf and spelled out in an almost-flat fixed code over the
//! alphabet.
//!
//! The compressed stream begins with a 3 bit count of the zero bits used to
//! pad the tail to a byte boundary.  The count is written MSB first no
//! matter which packing convention is selected.

use std::io::{Cursor,Read,Write,Seek,SeekFrom};
use crate::{BitOrder,Error,Options,DYNERR};
use crate::tools::bit_buffer::BitBuffer;
use crate::tools::code_tree::{CodeTree,NodeData};
use crate::tools::dpcm;

/// Components for adaptive Huffman coding.
/// The tree is constantly updated as data is coded; one codec instance
/// processes one stream.
pub struct AdaptiveHuffman {
    tree: CodeTree,
    /// floor(log2(alphabet size))
    exp: usize,
    /// alphabet size minus 2^exp
    rem: usize,
    min_symbol: u8,
    max_symbol: u8
}

impl AdaptiveHuffman {
    /// Set up a codec for the alphabet selected in `opt`.
    /// Panics if the alphabet has fewer than two symbols.
    pub fn create(opt: &Options) -> Self {
        if opt.max_symbol <= opt.min_symbol {
            panic!("alphabet must have at least two symbols");
        }
        let alphabet_size = opt.max_symbol as usize - opt.min_symbol as usize + 1;
        let exp = alphabet_size.ilog2() as usize;
        Self {
            tree: CodeTree::create(alphabet_size),
            exp,
            rem: alphabet_size - (1usize << exp),
            min_symbol: opt.min_symbol,
            max_symbol: opt.max_symbol
        }
    }
    /// append the fixed code of a 0-based alphabet index; the first 2*rem
    /// symbols take exp+1 bits, the rest take exp bits
    fn put_fixed_code(&self,idx: usize,obuf: &mut BitBuffer) {
        let i = idx + 1;
        if i <= 2*self.rem {
            obuf.put_code(self.exp + 1,i - 1);
        } else {
            obuf.put_code(self.exp,i - self.rem - 1);
        }
    }
    /// read a fixed code back into a 0-based alphabet index
    fn get_fixed_code(&self,ibuf: &mut BitBuffer) -> Result<usize,Error> {
        let short = ibuf.get_code(self.exp)?;
        if short < self.rem {
            Ok((short << 1) | ibuf.get_bit()? as usize)
        } else {
            Ok(short + self.rem)
        }
    }
    /// Encode the byte sequence into a framed and packed byte stream.
    /// Total over any input: bytes outside the alphabet wrap into it.
    pub fn encode(&mut self,dat: &[u8],ord: &BitOrder) -> Result<Vec<u8>,Error> {
        let alphabet_size = self.max_symbol as usize - self.min_symbol as usize + 1;
        let mut code = BitBuffer::new();
        // reserve the pad count, it is known only after the last symbol
        code.put_code(3,0);
        for &byte in dat {
            let sym = (byte.wrapping_sub(self.min_symbol) as usize % alphabet_size) as u16;
            let (path,first) = self.tree.search_symbol(sym);
            log::trace!("symbol {} path {} bits first {}",byte,path.len(),first);
            code.extend(&path);
            if first {
                self.put_fixed_code(sym as usize,&mut code);
            }
            self.tree.update(sym,first)?;
        }
        let pad = (8 - code.len() % 8) % 8;
        code.set_code(0,3,pad);
        Ok(code.to_bytes(ord))
    }
    /// Decode a framed bit stream back into the byte sequence.
    pub fn decode(&mut self,dat: &[u8],ord: &BitOrder) -> Result<Vec<u8>,Error> {
        let mut bits = BitBuffer::from_bytes(dat,ord);
        let pad = match bits.get_code(3) {
            Ok(p) => p,
            Err(_) => return Err(Error::CorruptStream)
        };
        if pad > bits.remaining() {
            return Err(Error::CorruptStream);
        }
        bits.truncate_tail(pad);
        let mut ans = Vec::new();
        while bits.remaining() > 0 {
            let (sym,first) = match self.tree.descend(&mut bits) {
                Ok(NodeData::Symbol(s)) => (s,false),
                Ok(NodeData::Nyt) => match self.get_fixed_code(&mut bits) {
                    Ok(idx) => (idx as u16,true),
                    Err(_) => return Err(Error::CorruptStream)
                },
                Ok(NodeData::Internal) => return Err(Error::InvariantViolation),
                Err(_) => return Err(Error::CorruptStream)
            };
            let val = self.min_symbol as usize + sym as usize;
            if val > self.max_symbol as usize {
                return Err(Error::AlphabetMismatch);
            }
            log::trace!("decoded symbol {} first {}",val,first);
            ans.push(val as u8);
            self.tree.update(sym,first)?;
        }
        Ok(ans)
    }
}

/// Shannon entropy of the byte distribution in bits per symbol,
/// an informational metric only
fn entropy(dat: &[u8]) -> f64 {
    let mut counts = [0u64;256];
    for &byte in dat {
        counts[byte as usize] += 1;
    }
    let total = dat.len() as f64;
    let mut ans = 0.0;
    for count in counts {
        if count > 0 {
            let prob = count as f64 / total;
            ans -= prob * prob.log2();
        }
    }
    ans
}

/// Main compression function.
/// `expanded_in` is an object with `Read` and `Seek` traits, usually `std::fs::File`, or `std::io::Cursor<&[u8]>`.
/// `compressed_out` is an object with `Write` and `Seek` traits, usually `std::fs::File`, or `std::io::Cursor<Vec<u8>>`.
/// Returns (in_size,out_size) or error.  Can panic if options are inconsistent.
pub fn compress<R,W>(expanded_in: &mut R, compressed_out: &mut W, opt: &Options) -> Result<(u64,u64),DYNERR>
where R: Read + Seek, W: Write + Seek {
    let expanded_length = expanded_in.seek(SeekFrom::End(0))?;
    if expanded_length > opt.max_file_size {
        return Err(Box::new(Error::FileTooLarge));
    }
    expanded_in.seek(SeekFrom::Start(0))?;
    let mut dat = Vec::new();
    expanded_in.read_to_end(&mut dat)?;
    if opt.dpcm {
        log::debug!("apply first difference filter");
        dat = dpcm::forward(&dat);
    }
    log::info!("entropy: {:.6}",entropy(&dat));
    let mut huff = AdaptiveHuffman::create(opt);
    log::debug!("entering coding loop over {} symbols",dat.len());
    let bytes = huff.encode(&dat,&opt.ord)?;
    compressed_out.write_all(&bytes)?;
    compressed_out.flush()?;
    Ok((expanded_length,bytes.len() as u64))
}

/// Main expansion function.
/// `compressed_in` is an object with `Read` and `Seek` traits, usually `std::fs::File`, or `std::io::Cursor<&[u8]>`.
/// `expanded_out` is an object with `Write` and `Seek` traits, usually `std::fs::File`, or `std::io::Cursor<Vec<u8>>`.
/// Returns (in_size,out_size) or error.  Can panic if options are inconsistent.
pub fn expand<R,W>(compressed_in: &mut R, expanded_out: &mut W, opt: &Options) -> Result<(u64,u64),DYNERR>
where R: Read + Seek, W: Write + Seek {
    let compressed_length = compressed_in.seek(SeekFrom::End(0))?;
    if compressed_length > opt.max_file_size {
        return Err(Box::new(Error::FileTooLarge));
    }
    compressed_in.seek(SeekFrom::Start(0))?;
    let mut dat = Vec::new();
    compressed_in.read_to_end(&mut dat)?;
    let mut huff = AdaptiveHuffman::create(opt);
    log::debug!("entering decoding loop over {} bits",dat.len()*8);
    let mut ans = huff.decode(&dat,&opt.ord)?;
    if opt.dpcm {
        log::debug!("apply running sum filter");
        ans = dpcm::inverse(&ans);
    }
    expanded_out.write_all(&ans)?;
    expanded_out.flush()?;
    Ok((compressed_length,ans.len() as u64))
}

/// Convenience function, calls `compress` with a slice returning a Vec
pub fn compress_slice(slice: &[u8],opt: &Options) -> Result<Vec<u8>,DYNERR> {
    let mut src = Cursor::new(slice);
    let mut ans: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    compress(&mut src,&mut ans,opt)?;
    Ok(ans.into_inner())
}

/// Convenience function, calls `expand` with a slice returning a Vec
pub fn expand_slice(slice: &[u8],opt: &Options) -> Result<Vec<u8>,DYNERR> {
    let mut src = Cursor::new(slice);
    let mut ans: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    expand(&mut src,&mut ans,opt)?;
    Ok(ans.into_inner())
}

// *************** TESTS *****************

#[test]
fn empty_input() {
    let compressed = compress_slice(&[],&crate::STD_OPTIONS).expect("compression failed");
    assert_eq!(compressed,hex::decode("05").unwrap());
    let expanded = expand_slice(&compressed,&crate::STD_OPTIONS).expect("expansion failed");
    assert_eq!(expanded,Vec::<u8>::new());
}

#[test]
fn single_symbol() {
    // header pads 3+8 bits up to 2 bytes, fixed code is the whole payload
    let compressed = compress_slice(b"A",&crate::STD_OPTIONS).expect("compression failed");
    assert_eq!(compressed,hex::decode("1504").unwrap());
    let expanded = expand_slice(&compressed,&crate::STD_OPTIONS).expect("expansion failed");
    assert_eq!(expanded,b"A".to_vec());
}

#[test]
fn single_symbol_tree_state() {
    let mut huff = AdaptiveHuffman::create(&crate::STD_OPTIONS);
    huff.encode(b"A",&crate::STD_OPTIONS.ord).expect("encoding failed");
    assert_eq!(huff.tree.root_weight(),1);
    assert_eq!(huff.tree.symbol_weight(0x41),Some(1));
}

#[test]
fn repeated_symbol() {
    // after the first appearance every `A` costs a single bit
    let compressed = compress_slice(b"AAAA",&crate::STD_OPTIONS).expect("compression failed");
    assert_eq!(compressed,hex::decode("123c").unwrap());
    let expanded = expand_slice(&compressed,&crate::STD_OPTIONS).expect("expansion failed");
    assert_eq!(expanded,b"AAAA".to_vec());

    let mut huff = AdaptiveHuffman::create(&crate::STD_OPTIONS);
    huff.encode(b"AAAA",&crate::STD_OPTIONS.ord).expect("encoding failed");
    assert_eq!(huff.tree.root_weight(),4);
    assert_eq!(huff.tree.symbol_weight(0x41),Some(4));
}

#[test]
fn all_symbols_distinct() {
    let test_data: Vec<u8> = (0u8..=255).collect();
    let compressed = compress_slice(&test_data,&crate::STD_OPTIONS).expect("compression failed");
    // every symbol goes out as NYT path plus an 8 bit fixed code
    assert!(compressed.len() >= 257);
    let expanded = expand_slice(&compressed,&crate::STD_OPTIONS).expect("expansion failed");
    assert_eq!(expanded,test_data);
}

#[test]
fn invertibility() {
    let test_data = "I am Sam. Sam I am. I do not like this Sam I am.\n".as_bytes();
    let compressed = compress_slice(test_data,&crate::STD_OPTIONS).expect("compression failed");
    let expanded = expand_slice(&compressed,&crate::STD_OPTIONS).expect("expansion failed");
    assert_eq!(test_data.to_vec(),expanded);
}

#[test]
fn invertibility_msb0() {
    let mut opt = crate::STD_OPTIONS;
    opt.ord = BitOrder::Msb0;
    let test_data = "I am Sam. Sam I am. I do not like this Sam I am.\n".as_bytes();
    let compressed = compress_slice(test_data,&opt).expect("compression failed");
    let expanded = expand_slice(&compressed,&opt).expect("expansion failed");
    assert_eq!(test_data.to_vec(),expanded);
}

#[test]
fn narrow_alphabet() {
    // 26 symbols: the first 20 codes take 5 bits, the remaining 6 take 4 bits
    let mut opt = crate::STD_OPTIONS;
    opt.min_symbol = b'a';
    opt.max_symbol = b'z';
    let test_data = b"adaptivehuffmancoding";
    let compressed = compress_slice(test_data,&opt).expect("compression failed");
    let expanded = expand_slice(&compressed,&opt).expect("expansion failed");
    assert_eq!(test_data.to_vec(),expanded);
}

#[test]
fn power_of_two_alphabet() {
    // 128 symbols: the fixed code is uniformly 7 bits
    let mut opt = crate::STD_OPTIONS;
    opt.max_symbol = 127;
    let compressed = compress_slice(b"H",&opt).expect("compression failed");
    assert_eq!(compressed.len(),2);
    let expanded = expand_slice(&compressed,&opt).expect("expansion failed");
    assert_eq!(expanded,b"H".to_vec());

    let test_data = "Hello, world\n".as_bytes();
    let compressed = compress_slice(test_data,&opt).expect("compression failed");
    let expanded = expand_slice(&compressed,&opt).expect("expansion failed");
    assert_eq!(test_data.to_vec(),expanded);
}

#[test]
fn out_of_alphabet_input_still_encodes() {
    // bytes outside the alphabet wrap into it rather than failing
    let mut opt = crate::STD_OPTIONS;
    opt.min_symbol = b'a';
    opt.max_symbol = b'z';
    let compressed = compress_slice(b"Hello",&opt).expect("compression failed");
    let expanded = expand_slice(&compressed,&opt).expect("expansion failed");
    assert_eq!(expanded.len(),5);
    assert!(expanded.iter().all(|&b| b >= b'a' && b <= b'z'));
    assert_eq!(&expanded[1..],&b"ello"[..]);
}

#[test]
fn truncated_stream() {
    let test_data = "adaptive huffman coding".as_bytes();
    let mut compressed = compress_slice(test_data,&crate::STD_OPTIONS).expect("compression failed");
    compressed.pop();
    let err = expand_slice(&compressed,&crate::STD_OPTIONS).unwrap_err();
    assert!(matches!(err.downcast_ref::<Error>(),Some(Error::CorruptStream)));
}

#[test]
fn missing_header() {
    let err = expand_slice(&[],&crate::STD_OPTIONS).unwrap_err();
    assert!(matches!(err.downcast_ref::<Error>(),Some(Error::CorruptStream)));
}

#[test]
fn smooth_input_dpcm() {
    use rand::{rngs,Rng,SeedableRng};
    let mut rng = rngs::SmallRng::seed_from_u64(13);
    let mut dat = Vec::with_capacity(4096);
    let mut val: u8 = 128;
    for _i in 0..4096 {
        let step = rng.gen_range(-2i16..=2i16);
        val = (val as i16 + step).rem_euclid(256) as u8;
        dat.push(val);
    }
    let mut opt = crate::STD_OPTIONS;
    opt.dpcm = true;
    let filtered = compress_slice(&dat,&opt).expect("compression failed");
    let raw = compress_slice(&dat,&crate::STD_OPTIONS).expect("compression failed");
    assert!(filtered.len() < raw.len());
    assert_eq!(expand_slice(&filtered,&opt).expect("expansion failed"),dat);
    assert_eq!(expand_slice(&raw,&crate::STD_OPTIONS).expect("expansion failed"),dat);
}
