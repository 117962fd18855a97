use crate::error::Result;
use crate::han::topology::Layout;
use crate::types::Rank;

/// Part a process plays in one hierarchical call, relative to its root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Root,
    /// On the root's node, not the root.
    RootLocalPeer,
    /// On another node, not that node's leader.
    OtherFollower,
    /// On another node, brokering between the root and its followers.
    NodeLeader,
}

/// A process leads its node for this call when its intra rank equals the
/// root's; that puts it in the root's inter-node column.
pub fn classify(me: Rank, root: Rank, layout: &Layout) -> Result<Role> {
    let mine = layout.vrank(me)?;
    let theirs = layout.vrank(root)?;
    Ok(if me == root {
        Role::Root
    } else if mine.inter == theirs.inter {
        Role::RootLocalPeer
    } else if mine.intra == theirs.intra {
        Role::NodeLeader
    } else {
        Role::OtherFollower
    })
}
