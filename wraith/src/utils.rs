use serde::{de::Error, ser::SerializeSeq, Deserialize, Deserializer, Serializer};

/// Serializes a fixed set of byte arrays as a single sequence. Serde only implements its traits
/// for arrays of up to 32 elements, so nested arrays (like the work RAM banks or the framebuffer)
/// are routed through this.
pub(crate) fn serialize_slices_as_one<Sl: AsRef<[u8]>, const M: usize, Se: Serializer>(
    slices: &[Sl; M],
    ser: Se,
) -> Result<Se::Ok, Se::Error> {
    let mut seq = ser.serialize_seq(Some(M))?;
    slices
        .iter()
        .map(AsRef::as_ref)
        .try_for_each(|b| seq.serialize_element(b))
        .and_then(|()| seq.end())
}

/// The counterpart to [`serialize_slices_as_one`]. The data is collected on the heap and handed
/// back boxed, so large buffers never sit on the stack while a snapshot is restored.
pub(crate) fn deserialize_slices_as_one<
    'de,
    const N: usize,
    const M: usize,
    De: Deserializer<'de>,
>(
    de: De,
) -> Result<Box<[[u8; N]; M]>, De::Error> {
    let outer = Vec::<Vec<u8>>::deserialize(de)?;
    let len = outer.len();
    let slices = outer
        .into_iter()
        .map(|slice| {
            let len = slice.len();
            <[u8; N]>::try_from(slice).map_err(|_| De::Error::invalid_length(len, &"a full slice"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    slices
        .into_boxed_slice()
        .try_into()
        .map_err(|_| De::Error::invalid_length(len, &"a full set of slices"))
}

/// Checks if the given bit is set in the byte.
pub(crate) const fn check_bit_const<const B: u8>(byte: u8) -> bool {
    byte & (1 << B) != 0
}

pub(crate) const fn check_bit(byte: u8, bit: u8) -> bool {
    byte & (1 << bit) != 0
}

/// Returns a byte with just the bit selected if the given `bool` is true.
pub(crate) const fn bool_to_mask<const B: u8>(b: bool) -> u8 {
    (b as u8) << B
}
