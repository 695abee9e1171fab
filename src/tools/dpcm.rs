//! First order predictive filter (DPCM).
//!
//! Replaces each byte with its difference from the previous byte, modulo 256.
//! Slowly varying inputs come out with a sharply peaked distribution that the
//! coder can exploit.  The codec only ever sees post-filter bytes.

/// y[0] = x[0], then y[i] = x[i] - x[i-1] mod 256
pub fn forward(dat: &[u8]) -> Vec<u8> {
    let mut prev: u8 = 0;
    let mut ans = Vec::with_capacity(dat.len());
    for &x in dat {
        ans.push(x.wrapping_sub(prev));
        prev = x;
    }
    ans
}

/// running sum modulo 256, inverse of `forward`
pub fn inverse(dat: &[u8]) -> Vec<u8> {
    let mut acc: u8 = 0;
    let mut ans = Vec::with_capacity(dat.len());
    for &y in dat {
        acc = acc.wrapping_add(y);
        ans.push(acc);
    }
    ans
}

#[test]
fn difference_then_sum() {
    let dat = [10u8,12,12,11,255,0];
    assert_eq!(forward(&dat),vec![10,2,0,255,244,1]);
    assert_eq!(inverse(&forward(&dat)),dat.to_vec());
}

#[test]
fn degenerate_inputs() {
    assert_eq!(forward(&[]),Vec::<u8>::new());
    assert_eq!(forward(&[7]),vec![7]);
    assert_eq!(inverse(&[7]),vec![7]);
}

#[test]
fn wrap_around() {
    let dat: Vec<u8> = (0u8..=255).cycle().take(1000).collect();
    assert_eq!(inverse(&forward(&dat)),dat);
}
