use crate::comm::Comm;
use crate::error::{Result, StrataError};
use crate::types::Rank;

/// Lane tags reserved per collective, so concurrent traffic of different
/// collectives on one communicator never crosses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub(crate) enum CollectiveTag {
    Allgather = 2,
    Split = 3,
    Scatterv = 4,
    Gatherv = 5,
    InterScatterv = 6,
    InterGatherv = 7,
    SizeHandshake = 8,
}

impl CollectiveTag {
    pub(crate) const fn as_u16(self) -> u16 {
        self as u16
    }
}

/// Send bytes to a peer with timeout, wrapping errors as `CollectiveFailed`.
pub(crate) async fn collective_send(
    comm: &Comm,
    dest: Rank,
    data: Vec<u8>,
    operation: &'static str,
    tag: CollectiveTag,
) -> Result<()> {
    let timeout = comm.config().collective_timeout;
    match tokio::time::timeout(timeout, comm.send_bytes(dest, tag.as_u16(), data)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(StrataError::CollectiveFailed {
            operation,
            rank: dest,
            reason: e.to_string(),
        }),
        Err(_) => Err(StrataError::CollectiveFailed {
            operation,
            rank: dest,
            reason: format!("send timed out after {:?}", timeout),
        }),
    }
}

/// Receive bytes from a peer with timeout, wrapping errors as `CollectiveFailed`.
pub(crate) async fn collective_recv(
    comm: &Comm,
    src: Rank,
    operation: &'static str,
    tag: CollectiveTag,
) -> Result<Vec<u8>> {
    let timeout = comm.config().collective_timeout;
    match tokio::time::timeout(timeout, comm.recv_bytes(src, tag.as_u16())).await {
        Ok(Ok(buf)) => Ok(buf),
        Ok(Err(e)) => Err(StrataError::CollectiveFailed {
            operation,
            rank: src,
            reason: e.to_string(),
        }),
        Err(_) => Err(StrataError::CollectiveFailed {
            operation,
            rank: src,
            reason: format!("recv timed out after {:?}", timeout),
        }),
    }
}

/// Receive and check the payload length against what the protocol expects.
pub(crate) async fn collective_recv_exact(
    comm: &Comm,
    src: Rank,
    expected: usize,
    operation: &'static str,
    tag: CollectiveTag,
) -> Result<Vec<u8>> {
    let data = collective_recv(comm, src, operation, tag).await?;
    if data.len() != expected {
        return Err(StrataError::BufferSizeMismatch {
            expected,
            actual: data.len(),
        });
    }
    Ok(data)
}
