use super::{
    galois::{G, MAX_EC_SIZE},
    Block, MAX_BLOCK_SIZE,
};
use crate::common::error::{QRError, QRResult};

// Rectifier
//------------------------------------------------------------------------------

impl Block {
    pub fn rectify(&mut self) -> QRResult<&[u8]> {
        // Compute syndromes
        let synd = match self.syndromes() {
            Ok(()) => return Ok(self.data()),
            Err(s) => s,
        };

        let ec_len = self.ec_len();

        // Error locator polynomial
        let (sig, deg) = berlekamp_massey(&synd[..ec_len]);
        if 2 * deg > ec_len {
            return Err(QRError::UncorrectableBlock);
        }

        let err_loc = self.chien_search(&sig[..=deg]);
        if err_loc.len() != deg {
            return Err(QRError::UncorrectableBlock);
        }

        // Sigma derivative. Even powers vanish in characteristic 2
        let mut dsig = [G(0); MAX_EC_SIZE + 1];
        for i in (1..=deg).step_by(2) {
            dsig[i - 1] = sig[i];
        }

        // Error evaluator
        let omg = omega(&synd[..ec_len], &sig[..=deg]);

        // Error magnitude by Forney's algorithm, XORed into the codewords
        for &i in err_loc.iter() {
            let pow = self.len - 1 - i;
            let xinv = G::gen_pow(255 - pow);
            let dsig_x = eval_poly(&dsig[..deg], xinv);
            if dsig_x == G(0) {
                return Err(QRError::UncorrectableBlock);
            }
            let mag = G::gen_pow(pow) * eval_poly(&omg[..ec_len], xinv) / dsig_x;
            self.data[i] = (G(self.data[i]) + mag).into();
        }

        match self.syndromes() {
            Ok(()) => Ok(self.data()),
            Err(_) => Err(QRError::UncorrectableBlock),
        }
    }

    fn syndromes(&self) -> Result<(), [G; MAX_EC_SIZE]> {
        let mut synd = [G(0); MAX_EC_SIZE];

        let mut gdata = [G(0); MAX_BLOCK_SIZE];
        for (g, &b) in gdata.iter_mut().zip(self.data[..self.len].iter().rev()) {
            *g = G(b);
        }
        for (i, s) in synd.iter_mut().take(self.ec_len()).enumerate() {
            *s = eval_poly(&gdata[..self.len], G::gen_pow(i));
        }

        if synd.iter().all(|&s| s.0 == 0) {
            Ok(())
        } else {
            Err(synd)
        }
    }

    // Positions of codewords whose locator X^-1 is a root of sigma
    fn chien_search(&self, sig: &[G]) -> Vec<usize> {
        (0..self.len)
            .filter(|&pow| eval_poly(sig, G::gen_pow(255 - pow)) == G(0))
            .map(|pow| self.len - 1 - pow)
            .collect()
    }
}

// Sigma polynomial and its degree
fn berlekamp_massey(synd: &[G]) -> ([G; MAX_EC_SIZE + 1], usize) {
    let n = synd.len();
    let mut l = 0usize;
    let mut m = 1usize;
    let mut b = G(1);
    let mut cx = [G(0); MAX_EC_SIZE + 1];
    let mut bx = [G(0); MAX_EC_SIZE + 1];
    cx[0] = G(1);
    bx[0] = G(1);

    for k in 0..n {
        // Calculate discrepancy
        let mut d = synd[k];
        for i in 1..=l {
            d += cx[i] * synd[k - i];
        }

        if d.0 == 0 {
            m += 1;
            continue;
        }

        // Temporary copy
        let tx = cx;
        let scale = d / b;
        for i in 0..=n - m {
            cx[i + m] += scale * bx[i];
        }

        if 2 * l <= k {
            bx = tx;
            l = k + 1 - l;
            b = d;
            m = 1;
        } else {
            m += 1;
        }
    }
    (cx, l)
}

// Error evaluator polynomial: S(x) * sigma(x) mod x^n
fn omega(synd: &[G], sig: &[G]) -> [G; MAX_EC_SIZE] {
    let mut omg = [G(0); MAX_EC_SIZE];
    for (i, o) in omg.iter_mut().take(synd.len()).enumerate() {
        for (j, &s) in sig.iter().enumerate().take(i + 1) {
            *o += synd[i - j] * s;
        }
    }
    omg
}

// Polynomial with coefficients in ascending powers
fn eval_poly(poly: &[G], x: G) -> G {
    let mut res = G(0);
    let mut xpow = G(1);
    for &coeff in poly {
        res += coeff * xpow;
        xpow *= x;
    }
    res
}


// Rectifier for format and version infos. Returns the nearest valid codeword
//------------------------------------------------------------------------------

pub fn rectify_info(info: u32, valid_numbers: &[u32], err_capacity: u32) -> Option<u32> {
    let res = *valid_numbers.iter().min_by_key(|&n| (info ^ n).count_ones())?;

    if (info ^ res).count_ones() <= err_capacity {
        Some(res)
    } else {
        None
    }
}
