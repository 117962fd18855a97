use crate::collective::{self, CollectiveTag};
use crate::comm::Comm;
use crate::datatype::{Datatype, Region, RegionMut};
use crate::descriptor::TransferDescriptor;
use crate::error::Result;
use crate::han;
use crate::types::{Operation, Rank};

impl Comm {
    /// Scatter irregular blocks from `root`.
    ///
    /// On root, rank `r` receives `sdesc.count(r)` elements of `sdtype`
    /// found at element displacement `sdesc.displ(r)` of `sbuf`. Every rank
    /// stores `rcount` elements of `rdtype` into `rbuf`. `sbuf`, `sdesc`
    /// and `sdtype` are ignored on non-root ranks.
    ///
    /// Runs the two-level algorithm when the communicator is eligible and
    /// the flat one otherwise; the results are identical.
    #[allow(clippy::too_many_arguments)]
    pub async fn scatterv(
        &self,
        sbuf: &[u8],
        sdesc: &TransferDescriptor<'_>,
        sdtype: &Datatype,
        rbuf: &mut [u8],
        rcount: usize,
        rdtype: &Datatype,
        root: Rank,
    ) -> Result<()> {
        self.check_rank(root)?;
        let src = Region::new(sbuf);
        let mut dst = RegionMut::new(rbuf);

        match han::select(self, Operation::Scatterv).await? {
            Some(topo) => {
                self.counters.record_hierarchical_call();
                han::scatterv(self, topo, src, sdesc, sdtype, &mut dst, rcount, rdtype, root).await
            }
            None => {
                self.counters.record_flat_call();
                collective::scatterv(
                    self,
                    src,
                    sdesc,
                    sdtype,
                    &mut dst,
                    rcount,
                    rdtype,
                    root,
                    CollectiveTag::Scatterv,
                )
                .await
            }
        }
    }

    /// Gather irregular blocks at `root`: rank `r`'s `scount` elements of
    /// `sdtype` land as `rdesc.count(r)` elements of `rdtype` at element
    /// displacement `rdesc.displ(r)` of `rbuf`. `rbuf`, `rdesc` and
    /// `rdtype` are ignored on non-root ranks.
    #[allow(clippy::too_many_arguments)]
    pub async fn gatherv(
        &self,
        sbuf: &[u8],
        scount: usize,
        sdtype: &Datatype,
        rbuf: &mut [u8],
        rdesc: &TransferDescriptor<'_>,
        rdtype: &Datatype,
        root: Rank,
    ) -> Result<()> {
        self.check_rank(root)?;
        let src = Region::new(sbuf);
        let mut dst = RegionMut::new(rbuf);

        match han::select(self, Operation::Gatherv).await? {
            Some(topo) => {
                self.counters.record_hierarchical_call();
                han::gatherv(self, topo, src, scount, sdtype, &mut dst, rdesc, rdtype, root).await
            }
            None => {
                self.counters.record_flat_call();
                collective::gatherv(
                    self,
                    src,
                    scount,
                    sdtype,
                    &mut dst,
                    rdesc,
                    rdtype,
                    root,
                    CollectiveTag::Gatherv,
                )
                .await
            }
        }
    }

    /// Regular scatter: `scount` elements to every rank, rank `r`'s block
    /// starting at element `r * scount` of `sbuf`.
    #[allow(clippy::too_many_arguments)]
    pub async fn scatter(
        &self,
        sbuf: &[u8],
        scount: usize,
        sdtype: &Datatype,
        rbuf: &mut [u8],
        rcount: usize,
        rdtype: &Datatype,
        root: Rank,
    ) -> Result<()> {
        let (counts, displs) = uniform_layout(self.size(), scount);
        let sdesc = TransferDescriptor::wide(&counts, &displs)?;
        self.scatterv(sbuf, &sdesc, sdtype, rbuf, rcount, rdtype, root)
            .await
    }

    /// Regular gather: `rcount` elements from every rank, rank `r`'s block
    /// stored at element `r * rcount` of `rbuf`.
    #[allow(clippy::too_many_arguments)]
    pub async fn gather(
        &self,
        sbuf: &[u8],
        scount: usize,
        sdtype: &Datatype,
        rbuf: &mut [u8],
        rcount: usize,
        rdtype: &Datatype,
        root: Rank,
    ) -> Result<()> {
        let (counts, displs) = uniform_layout(self.size(), rcount);
        let rdesc = TransferDescriptor::wide(&counts, &displs)?;
        self.gatherv(sbuf, scount, sdtype, rbuf, &rdesc, rdtype, root)
            .await
    }
}

fn uniform_layout(size: u32, count: usize) -> (Vec<usize>, Vec<isize>) {
    let counts = vec![count; size as usize];
    let displs = (0..size as isize).map(|r| r * count as isize).collect();
    (counts, displs)
}
