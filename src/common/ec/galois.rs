use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Sub};

// Galois field element of GF(256) with primitive polynomial x^8 + x^4 + x^3 + x^2 + 1
//------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct G(pub u8);

impl G {
    // Alpha raised to the given power
    #[inline]
    pub fn gen_pow(pow: usize) -> Self {
        Self(EXP_TABLE[pow % 255])
    }

    #[inline]
    pub fn log(self) -> usize {
        debug_assert!(self.0 != 0, "Log of zero is undefined");
        LOG_TABLE[self.0 as usize] as usize
    }

    #[inline]
    pub fn inv(self) -> Self {
        debug_assert!(self.0 != 0, "Zero has no inverse");
        Self(EXP_TABLE[(255 - self.log()) % 255])
    }
}

impl From<G> for u8 {
    fn from(g: G) -> Self {
        g.0
    }
}

impl Add for G {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 ^ rhs.0)
    }
}

impl AddAssign for G {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.0 ^= rhs.0;
    }
}

impl Sub for G {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 ^ rhs.0)
    }
}

impl Mul for G {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self::Output {
        Self(gf_mul(self.0, rhs.0))
    }
}

impl MulAssign for G {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        self.0 = gf_mul(self.0, rhs.0);
    }
}

impl Div for G {
    type Output = Self;
    #[inline]
    fn div(self, rhs: Self) -> Self::Output {
        debug_assert!(rhs.0 != 0, "Division by zero in GF(256)");
        if self.0 == 0 {
            return Self(0);
        }
        Self(EXP_TABLE[(self.log() + 255 - rhs.log()) % 255])
    }
}

#[inline]
fn gf_mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    EXP_TABLE[(LOG_TABLE[a as usize] as usize + LOG_TABLE[b as usize] as usize) % 255]
}


// Global constants
//------------------------------------------------------------------------------

pub const PRIMITIVE_POLYNOMIAL: u16 = 0x11d;

pub static EXP_TABLE: [u8; 256] = build_exp_table();

pub static LOG_TABLE: [u8; 256] = build_log_table();

const fn build_exp_table() -> [u8; 256] {
    let mut res = [0u8; 256];
    let mut x: u16 = 1;
    let mut i = 0;
    while i < 256 {
        res[i] = x as u8;
        x <<= 1;
        if x & 0x100 != 0 {
            x ^= PRIMITIVE_POLYNOMIAL;
        }
        i += 1;
    }
    res
}

const fn build_log_table() -> [u8; 256] {
    let exp = build_exp_table();
    let mut res = [0u8; 256];
    let mut i = 0;
    while i < 255 {
        res[exp[i] as usize] = i as u8;
        i += 1;
    }
    res
}

// Generator polynomial coefficients for each parity length, highest degree first and
// excluding the leading 1
pub static GENERATOR_POLYNOMIALS: [[u8; MAX_EC_SIZE]; MAX_EC_SIZE + 1] =
    build_generator_polynomials();

pub const MAX_EC_SIZE: usize = 30;

const fn const_mul(exp: &[u8; 256], log: &[u8; 256], a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    exp[(log[a as usize] as usize + log[b as usize] as usize) % 255]
}

const fn build_generator_polynomials() -> [[u8; MAX_EC_SIZE]; MAX_EC_SIZE + 1] {
    let mut res = [[0u8; MAX_EC_SIZE]; MAX_EC_SIZE + 1];
    let exp = build_exp_table();
    let log = build_log_table();
    let mut deg = 1;
    while deg <= MAX_EC_SIZE {
        // poly[0] is the leading coefficient
        let mut poly = [0u8; MAX_EC_SIZE + 1];
        poly[0] = 1;
        let mut i = 0;
        while i < deg {
            let root = exp[i];
            let mut j = i + 1;
            while j > 0 {
                poly[j] ^= const_mul(&exp, &log, poly[j - 1], root);
                j -= 1;
            }
            i += 1;
        }
        let mut k = 0;
        while k < deg {
            res[deg][k] = poly[k + 1];
            k += 1;
        }
        deg += 1;
    }
    res
}
