//! Typed access to matrix elements.
//!
//! [`Element`] is a scalar channel type (one [`Depth`]); [`Pixel`] is a full
//! matrix element made of `CHANNELS` scalars. `Mat` stores native-endian
//! bytes, so both traits read and write through byte slices rather than
//! reinterpreting the buffer.

use crate::mat::{Depth, MatType};

/// Scalar channel type stored in a [`crate::Mat`].
pub trait Element: Copy + PartialEq + core::fmt::Debug + 'static {
    const DEPTH: Depth;

    /// Read one value from the first `DEPTH.size()` bytes of `bytes`.
    fn read_ne(bytes: &[u8]) -> Self;

    /// Write one value into the first `DEPTH.size()` bytes of `out`.
    fn write_ne(self, out: &mut [u8]);

    fn to_f64(self) -> f64;

    /// Convert from `f64`. Integer types round half away from zero and
    /// saturate to their range; NaN becomes zero.
    fn from_f64(v: f64) -> Self;
}

#[inline]
fn round_half_away(v: f64) -> f64 {
    if v >= 0.0 { v + 0.5 } else { v - 0.5 }
}

macro_rules! int_element {
    ($t:ty, $depth:ident) => {
        impl Element for $t {
            const DEPTH: Depth = Depth::$depth;

            #[inline]
            fn read_ne(bytes: &[u8]) -> Self {
                let mut buf = [0u8; core::mem::size_of::<$t>()];
                buf.copy_from_slice(&bytes[..core::mem::size_of::<$t>()]);
                <$t>::from_ne_bytes(buf)
            }

            #[inline]
            fn write_ne(self, out: &mut [u8]) {
                out[..core::mem::size_of::<$t>()].copy_from_slice(&self.to_ne_bytes());
            }

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64(v: f64) -> Self {
                // `as` saturates and maps NaN to 0
                round_half_away(v) as $t
            }
        }
    };
}

macro_rules! float_element {
    ($t:ty, $depth:ident) => {
        impl Element for $t {
            const DEPTH: Depth = Depth::$depth;

            #[inline]
            fn read_ne(bytes: &[u8]) -> Self {
                let mut buf = [0u8; core::mem::size_of::<$t>()];
                buf.copy_from_slice(&bytes[..core::mem::size_of::<$t>()]);
                <$t>::from_ne_bytes(buf)
            }

            #[inline]
            fn write_ne(self, out: &mut [u8]) {
                out[..core::mem::size_of::<$t>()].copy_from_slice(&self.to_ne_bytes());
            }

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64(v: f64) -> Self {
                v as $t
            }
        }
    };
}

int_element!(u8, U8);
int_element!(u16, U16);
int_element!(i16, I16);
int_element!(u32, U32);
int_element!(i32, I32);
float_element!(f32, F32);
float_element!(f64, F64);

/// A complete matrix element: `CHANNELS` values of one [`Element`] type.
pub trait Pixel: Copy {
    type Elem: Element;
    const CHANNELS: usize;
    const MAT_TYPE: MatType =
        MatType::new(<Self::Elem as Element>::DEPTH, Self::CHANNELS as u8);

    fn channel(&self, i: usize) -> Self::Elem;

    fn from_fn<F: FnMut(usize) -> Self::Elem>(f: F) -> Self;

    /// Read from `CHANNELS * elem_size` bytes.
    fn read(bytes: &[u8]) -> Self {
        let size = <Self::Elem as Element>::DEPTH.size();
        Self::from_fn(|c| Self::Elem::read_ne(&bytes[c * size..]))
    }

    /// Write into `CHANNELS * elem_size` bytes.
    fn write(&self, out: &mut [u8]) {
        let size = <Self::Elem as Element>::DEPTH.size();
        for c in 0..Self::CHANNELS {
            self.channel(c).write_ne(&mut out[c * size..]);
        }
    }
}

macro_rules! scalar_pixel {
    ($($t:ty),*) => {$(
        impl Pixel for $t {
            type Elem = $t;
            const CHANNELS: usize = 1;

            #[inline]
            fn channel(&self, _i: usize) -> $t {
                *self
            }

            #[inline]
            fn from_fn<F: FnMut(usize) -> $t>(mut f: F) -> Self {
                f(0)
            }
        }
    )*};
}

scalar_pixel!(u8, u16, i16, u32, i32, f32, f64);

impl<E: Element, const N: usize> Pixel for [E; N] {
    type Elem = E;
    const CHANNELS: usize = N;

    #[inline]
    fn channel(&self, i: usize) -> E {
        self[i]
    }

    #[inline]
    fn from_fn<F: FnMut(usize) -> E>(f: F) -> Self {
        core::array::from_fn(f)
    }
}

#[cfg(feature = "rgb")]
mod rgb_pixels {
    use super::{Element, Pixel};
    use rgb::alt::{BGR, BGRA};
    use rgb::{RGB, RGBA};

    impl<E: Element> Pixel for RGB<E> {
        type Elem = E;
        const CHANNELS: usize = 3;

        fn channel(&self, i: usize) -> E {
            match i {
                0 => self.r,
                1 => self.g,
                _ => self.b,
            }
        }

        fn from_fn<F: FnMut(usize) -> E>(mut f: F) -> Self {
            RGB { r: f(0), g: f(1), b: f(2) }
        }
    }

    impl<E: Element> Pixel for RGBA<E> {
        type Elem = E;
        const CHANNELS: usize = 4;

        fn channel(&self, i: usize) -> E {
            match i {
                0 => self.r,
                1 => self.g,
                2 => self.b,
                _ => self.a,
            }
        }

        fn from_fn<F: FnMut(usize) -> E>(mut f: F) -> Self {
            RGBA { r: f(0), g: f(1), b: f(2), a: f(3) }
        }
    }

    impl<E: Element> Pixel for BGR<E> {
        type Elem = E;
        const CHANNELS: usize = 3;

        fn channel(&self, i: usize) -> E {
            match i {
                0 => self.b,
                1 => self.g,
                _ => self.r,
            }
        }

        fn from_fn<F: FnMut(usize) -> E>(mut f: F) -> Self {
            BGR { b: f(0), g: f(1), r: f(2) }
        }
    }

    impl<E: Element> Pixel for BGRA<E> {
        type Elem = E;
        const CHANNELS: usize = 4;

        fn channel(&self, i: usize) -> E {
            match i {
                0 => self.b,
                1 => self.g,
                2 => self.r,
                _ => self.a,
            }
        }

        fn from_fn<F: FnMut(usize) -> E>(mut f: F) -> Self {
            BGRA { b: f(0), g: f(1), r: f(2), a: f(3) }
        }
    }
}
