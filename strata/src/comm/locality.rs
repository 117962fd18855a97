//! Where a process runs: its node and its data representation.

use crate::error::{Result, StrataError};

/// Max node-name bytes carried in a locality record (NUL-padded).
const NODE_NAME_BYTES: usize = 256;

/// Encoded size of a [`Locality`] record: node name + architecture signature.
pub(crate) const RECORD_BYTES: usize = NODE_NAME_BYTES + 8;

/// Opaque fingerprint of a process's binary data representation.
///
/// Two processes may exchange packed bytes without conversion only when
/// their signatures are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArchSignature(u64);

impl ArchSignature {
    /// Signature of the running process: byte order, pointer width and the
    /// in-memory encoding of integer and floating-point reference values.
    pub fn native() -> Self {
        let mut h = Fnv1::new();
        h.update(&0x0102_0304u32.to_ne_bytes());
        h.update(&(-2i64).to_ne_bytes());
        h.update(&1.5f64.to_ne_bytes());
        h.update(&0.25f32.to_ne_bytes());
        h.update(&[std::mem::size_of::<usize>() as u8]);
        Self(h.finish())
    }

    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

/// FNV-1 (multiply, then xor).
struct Fnv1(u64);

impl Fnv1 {
    fn new() -> Self {
        Self(0xcbf29ce484222325)
    }

    fn update(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = self.0.wrapping_mul(0x100000001b3);
            self.0 ^= b as u64;
        }
    }

    fn finish(&self) -> u64 {
        self.0
    }
}

/// The node a process runs on and its data representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locality {
    pub node: String,
    pub arch: ArchSignature,
}

impl Locality {
    /// Locality of the current process, from its hostname.
    pub fn detect() -> Self {
        Self::on_node(gethostname::gethostname().to_string_lossy().into_owned())
    }

    /// A process on `node` with the native representation.
    pub fn on_node(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            arch: ArchSignature::native(),
        }
    }

    pub fn with_arch(mut self, arch: ArchSignature) -> Self {
        self.arch = arch;
        self
    }

    /// One locality per process for a simulated cluster: node `i` hosts
    /// `ppn[i]` consecutive ranks named `node{i}`.
    pub fn cluster(ppn: &[usize]) -> Vec<Self> {
        ppn.iter()
            .enumerate()
            .flat_map(|(i, &n)| std::iter::repeat_n(Self::on_node(format!("node{i}")), n))
            .collect()
    }

    pub(crate) fn encode(&self) -> Vec<u8> {
        let mut buf = vec![0u8; RECORD_BYTES];
        let name = self.node.as_bytes();
        let copy_len = name.len().min(NODE_NAME_BYTES);
        buf[..copy_len].copy_from_slice(&name[..copy_len]);
        buf[NODE_NAME_BYTES..].copy_from_slice(&self.arch.0.to_le_bytes());
        buf
    }

    pub(crate) fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() != RECORD_BYTES {
            return Err(StrataError::DecodeFailed(format!(
                "locality record is {} bytes, expected {RECORD_BYTES}",
                buf.len()
            )));
        }
        let name = &buf[..NODE_NAME_BYTES];
        let end = name.iter().position(|&b| b == 0).unwrap_or(NODE_NAME_BYTES);
        let arch = u64::from_le_bytes(
            buf[NODE_NAME_BYTES..]
                .try_into()
                .map_err(|_| StrataError::DecodeFailed("locality arch bytes".into()))?,
        );
        Ok(Self {
            node: String::from_utf8_lossy(&name[..end]).into_owned(),
            arch: ArchSignature(arch),
        })
    }
}
