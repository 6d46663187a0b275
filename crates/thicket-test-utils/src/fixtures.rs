//! Layer blob layouts and arena fill/snapshot helpers.

use thicket_core::Shape;
use thicket_params::Params;

/// Blobs of a maxout layer: `W` of shape `(n_out, n_pieces, n_in)` and `b`
/// of shape `(n_out, n_pieces)`.
pub fn maxout_blobs(prefix: &str, n_out: usize, n_pieces: usize, n_in: usize) -> Vec<(String, Shape)> {
    vec![
        (format!("{prefix}W"), Shape::from([n_out, n_pieces, n_in])),
        (format!("{prefix}b"), Shape::from([n_out, n_pieces])),
    ]
}

/// Blobs of a softmax layer: `W` of shape `(n_out, n_in)` and `b` of shape
/// `(n_out,)`.
pub fn softmax_blobs(prefix: &str, n_out: usize, n_in: usize) -> Vec<(String, Shape)> {
    vec![
        (format!("{prefix}W"), Shape::from([n_out, n_in])),
        (format!("{prefix}b"), Shape::from(n_out)),
    ]
}

/// Build an arena with the given initial capacity and add every blob.
///
/// # Panics
///
/// Panics if the capacity is negative or an allocation fails.
pub fn build_arena(capacity: i64, blobs: &[(String, Shape)]) -> Params {
    let mut params = Params::with_capacity(capacity).expect("valid fixture capacity");
    for (name, shape) in blobs {
        params
            .add(name.clone(), shape.clone())
            .expect("fixture allocation");
    }
    params
}

/// Fill every registered value blob with values unique to `seed` and the
/// blob's position, so blobs can be told apart after a merge.
///
/// # Panics
///
/// Panics if a registered blob cannot be resolved.
pub fn fill_distinct(params: &mut Params, seed: f32) {
    let names: Vec<String> = params.blobs().map(|(n, _)| n.to_string()).collect();
    for (i, name) in names.iter().enumerate() {
        let handle = params.get_value(name).expect("registered blob");
        let mut view = params.write(&handle).expect("resolvable handle");
        for (j, v) in view.iter_mut().enumerate() {
            *v = seed + i as f32 * 1000.0 + j as f32;
        }
    }
}

/// Name, shape and flat content of one blob.
#[derive(Clone, Debug, PartialEq)]
pub struct BlobSnapshot {
    pub name: String,
    pub shape: Shape,
    pub values: Vec<f32>,
}

/// Copy out every registered value blob in directory order.
///
/// # Panics
///
/// Panics if a registered blob cannot be resolved.
pub fn snapshot_values(params: &Params) -> Vec<BlobSnapshot> {
    params
        .blobs()
        .map(|(name, _)| {
            let handle = params.get_value(name).expect("registered blob");
            let view = params.read(&handle).expect("resolvable handle");
            BlobSnapshot {
                name: name.to_string(),
                shape: view.shape().clone(),
                values: view.to_vec(),
            }
        })
        .collect()
}
