use crate::comm::Comm;
use crate::error::Result;
use crate::transport::MailboxKey;
use crate::types::Rank;

impl Comm {
    /// Send raw bytes to group rank `dest` on `tag`.
    ///
    /// Ranks are translated to fabric addresses, and the lane is scoped by
    /// this communicator's id so traffic of sub-groups never interleaves
    /// with the parent's.
    pub(crate) async fn send_bytes(&self, dest: Rank, tag: u16, data: Vec<u8>) -> Result<()> {
        let key = MailboxKey {
            comm_id: self.comm_id,
            src: self.address(self.rank)?,
            dst: self.address(dest)?,
            tag,
        };
        self.fabric.send(key, data).await
    }

    /// Receive the next message sent by group rank `src` on `tag`.
    pub(crate) async fn recv_bytes(&self, src: Rank, tag: u16) -> Result<Vec<u8>> {
        let key = MailboxKey {
            comm_id: self.comm_id,
            src: self.address(src)?,
            dst: self.address(self.rank)?,
            tag,
        };
        self.fabric.recv(key).await
    }
}
