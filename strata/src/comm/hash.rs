/// Non-zero FNV-1a hash over a sequence of byte slices, folded to `u32`.
///
/// Used to derive comm_ids every member of a split agrees on without
/// another round of communication. Zero is reserved for the world group.
pub(super) fn fnv1a_comm_id<I, S>(parts: I) -> u32
where
    I: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    let mut h: u64 = 0xcbf29ce484222325;
    for part in parts {
        for &b in part.as_ref() {
            h ^= b as u64;
            h = h.wrapping_mul(0x100000001b3);
        }
    }
    let id = ((h >> 32) ^ h) as u32;
    if id == 0 { 1 } else { id }
}
