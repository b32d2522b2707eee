//! Conversions between fixed-width primitives and byte arrays.
//!
//! Every conversion takes an explicit [`ByteOrder`]. Where an API offers a
//! variant without one, big-endian (network order) is used.

/// Byte order used when converting primitives to and from bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ByteOrder {
    #[default]
    Big,
    Little,
}

/// A fixed-width value that has a byte representation.
pub trait Primitive: Sized {
    /// Number of bytes in the encoded form.
    const WIDTH: usize;

    /// Encodes the value in the given byte order.
    fn to_bytes(&self, order: ByteOrder) -> Vec<u8>;

    /// Decodes a value from exactly [`Primitive::WIDTH`] bytes.
    ///
    /// Returns `None` when `bytes` has the wrong length.
    fn from_bytes(bytes: &[u8], order: ByteOrder) -> Option<Self>;
}

macro_rules! impl_primitive {
    ($($ty:ty),*) => {
        $(impl Primitive for $ty {
            const WIDTH: usize = std::mem::size_of::<$ty>();

            fn to_bytes(&self, order: ByteOrder) -> Vec<u8> {
                match order {
                    ByteOrder::Big => self.to_be_bytes().to_vec(),
                    ByteOrder::Little => self.to_le_bytes().to_vec(),
                }
            }

            fn from_bytes(bytes: &[u8], order: ByteOrder) -> Option<Self> {
                let array = bytes.try_into().ok()?;
                Some(match order {
                    ByteOrder::Big => <$ty>::from_be_bytes(array),
                    ByteOrder::Little => <$ty>::from_le_bytes(array),
                })
            }
        })*
    };
}

impl_primitive!(u8, i8, u16, i16, u32, i32, u64, i64, u128, i128, f32, f64);

// Stored as the 32-bit scalar value.
impl Primitive for char {
    const WIDTH: usize = 4;

    fn to_bytes(&self, order: ByteOrder) -> Vec<u8> {
        u32::from(*self).to_bytes(order)
    }

    fn from_bytes(bytes: &[u8], order: ByteOrder) -> Option<Self> {
        char::from_u32(u32::from_bytes(bytes, order)?)
    }
}

/// Encodes `value` in big-endian order.
pub fn to_bytes<P: Primitive>(value: P) -> Vec<u8> {
    value.to_bytes(ByteOrder::Big)
}

/// Decodes a big-endian value, requiring `bytes` to be exactly as wide as `P`.
pub fn from_bytes<P: Primitive>(bytes: &[u8]) -> Option<P> {
    P::from_bytes(bytes, ByteOrder::Big)
}

#[cfg(test)]
mod test {
    use super::{from_bytes, to_bytes, ByteOrder, Primitive};
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case(ByteOrder::Big, vec![0x00, 0x00, 0x7a, 0x69])]
    #[case(ByteOrder::Little, vec![0x69, 0x7a, 0x00, 0x00])]
    fn test_int_byte_order(#[case] order: ByteOrder, #[case] expected: Vec<u8>) {
        assert_eq!(expected, 31337i32.to_bytes(order));
        assert_eq!(Some(31337), i32::from_bytes(&expected, order));
    }

    #[test]
    fn test_default_is_big_endian() {
        assert_eq!(vec![0x01, 0x02], to_bytes(0x0102u16));
        assert_eq!(Some(-2i16), from_bytes(&[0xff, 0xfe]));
    }

    #[rstest]
    #[case(&[])]
    #[case(&[1, 2, 3])]
    #[case(&[1, 2, 3, 4, 5])]
    fn test_wrong_width(#[case] bytes: &[u8]) {
        assert_eq!(None, u32::from_bytes(bytes, ByteOrder::Big));
        assert_eq!(None, f32::from_bytes(bytes, ByteOrder::Little));
    }

    #[test]
    fn test_char_rejects_surrogate() {
        assert_eq!(None, char::from_bytes(&[0x00, 0x00, 0xd8, 0x00], ByteOrder::Big));
        assert_eq!(Some('λ'), char::from_bytes(&'λ'.to_bytes(ByteOrder::Big), ByteOrder::Big));
    }

    proptest! {
        #[test]
        fn double_bits_survive(value: f64, little: bool) {
            let order = if little { ByteOrder::Little } else { ByteOrder::Big };
            let decoded = f64::from_bytes(&value.to_bytes(order), order).unwrap();
            prop_assert_eq!(value.to_bits(), decoded.to_bits());
        }

        #[test]
        fn long_survives(value: i64) {
            prop_assert_eq!(Some(value), from_bytes(&to_bytes(value)));
        }

        #[test]
        fn wide_integer_survives(value: i128, little: bool) {
            let order = if little { ByteOrder::Little } else { ByteOrder::Big };
            prop_assert_eq!(Some(value), i128::from_bytes(&value.to_bytes(order), order));
        }
    }
}
