use std::sync::Arc;
use strata::{Comm, Locality, StrataConfig};

/// Helper: run a collective across one task per locality and return each
/// rank's output, indexed by rank. Keeps all communicators alive until
/// every task completes.
pub async fn run_collective<F, Fut, T>(localities: Vec<Locality>, config: StrataConfig, f: F) -> Vec<T>
where
    F: Fn(Arc<Comm>) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let comms: Vec<Arc<Comm>> = Comm::bootstrap_local_with_config(localities, config)
        .into_iter()
        .map(Arc::new)
        .collect();

    let f = Arc::new(f);
    let mut handles = Vec::new();
    for c in &comms {
        let c = Arc::clone(c);
        let f = Arc::clone(&f);
        handles.push(tokio::spawn(async move { f(c).await }));
    }
    let mut out = Vec::with_capacity(handles.len());
    for h in handles {
        out.push(h.await.unwrap());
    }
    out
}

pub fn i32_bytes(values: &[i32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn bytes_i32(bytes: &[u8]) -> Vec<i32> {
    bytes
        .chunks_exact(4)
        .map(|c| i32::from_le_bytes(c.try_into().unwrap()))
        .collect()
}

/// Element `i` of the root's source buffer.
pub fn source_value(i: usize) -> i32 {
    100 + i as i32
}
