use crate::collective::{CollectiveTag, allgather_bytes};
use crate::comm::Comm;
use crate::comm::hash::fnv1a_comm_id;
use crate::error::{Result, StrataError};
use crate::types::Rank;
use std::sync::Arc;
use std::sync::atomic::Ordering;

impl Comm {
    /// Split this communicator into sub-groups.
    ///
    /// All ranks must call `split` together. Ranks passing the same `color`
    /// land in the same sub-communicator, ordered by `key` (ties broken by
    /// rank in this group).
    ///
    /// The result has its own comm_id, so its traffic never mixes with the
    /// parent's or a sibling's, and its own (empty) hierarchical state.
    pub async fn split(&self, color: u32, key: u32) -> Result<Comm> {
        // (color, key) as 8 bytes: [color: u32 LE][key: u32 LE].
        let mut mine = Vec::with_capacity(8);
        mine.extend_from_slice(&color.to_le_bytes());
        mine.extend_from_slice(&key.to_le_bytes());

        let all = allgather_bytes(self, mine, CollectiveTag::Split).await?;

        let mut group: Vec<(Rank, u32)> = Vec::new();
        for (r, info) in all.iter().enumerate() {
            if info.len() != 8 {
                return Err(StrataError::DecodeFailed(format!(
                    "split info from rank {r} is {} bytes",
                    info.len()
                )));
            }
            let c = u32::from_le_bytes(
                info[..4]
                    .try_into()
                    .map_err(|_| StrataError::DecodeFailed("split color bytes".into()))?,
            );
            let k = u32::from_le_bytes(
                info[4..]
                    .try_into()
                    .map_err(|_| StrataError::DecodeFailed("split key bytes".into()))?,
            );
            if c == color {
                group.push((r as Rank, k));
            }
        }
        group.sort_by_key(|&(orig, k)| (k, orig));

        let new_rank = group
            .iter()
            .position(|&(r, _)| r == self.rank)
            .ok_or_else(|| StrataError::transport("rank missing from its own split group"))?
            as Rank;

        // Every member advances the generation in lockstep, so
        // (parent comm_id, generation, color) is agreed without talking.
        let generation = self.split_generation.fetch_add(1, Ordering::Relaxed);
        let comm_id = fnv1a_comm_id([
            &self.comm_id.to_le_bytes()[..],
            &generation.to_le_bytes(),
            &color.to_le_bytes(),
        ]);

        let members = group
            .iter()
            .map(|&(r, _)| self.address(r))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            parent = self.comm_id,
            comm_id,
            color,
            rank = new_rank,
            size = members.len(),
            "split communicator"
        );

        Ok(Comm::from_parts(
            new_rank,
            comm_id,
            members,
            Arc::clone(&self.fabric),
            self.locality.clone(),
            Arc::clone(&self.config),
        ))
    }
}
