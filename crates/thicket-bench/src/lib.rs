//! Benchmark profiles for Thicket parameter storage.
//!
//! Provides a pre-built model layout for benchmarking and examples:
//!
//! - [`reference_model`]: the blob table of a sentence-pair similarity model
//!   (embedding projection, two maxout blocks, softmax head)
//! - [`build_submodels`]: one arena per layer, ready to be merged

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use thicket_core::Shape;
use thicket_params::{Params, ParamsError};

/// Blob table of one layer: names and shapes in allocation order.
pub type LayerBlobs = Vec<(String, Shape)>;

/// Build the reference model layout for a hidden `width`.
///
/// Layers: a `width × 300` projection of pretrained vectors, two maxout
/// blocks with 3 pieces, and a 2-class softmax over the concatenated pair.
pub fn reference_model(width: usize) -> Vec<LayerBlobs> {
    let pieces = 3;
    vec![
        vec![
            ("embed_W".into(), Shape::from([width, 300])),
            ("embed_b".into(), Shape::from(width)),
        ],
        vec![
            ("mx1_W".into(), Shape::from([width, pieces, width])),
            ("mx1_b".into(), Shape::from([width, pieces])),
        ],
        vec![
            ("mx2_W".into(), Shape::from([width, pieces, width * 2])),
            ("mx2_b".into(), Shape::from([width, pieces])),
        ],
        vec![
            ("out_W".into(), Shape::from([2, width])),
            ("out_b".into(), Shape::from(2usize)),
        ],
    ]
}

/// Allocate one arena per layer at the default initial capacity.
pub fn build_submodels(layers: &[LayerBlobs]) -> Result<Vec<Params>, ParamsError> {
    layers
        .iter()
        .map(|blobs| {
            let mut params = Params::default();
            for (name, shape) in blobs {
                params.add(name.clone(), shape.clone())?;
            }
            Ok(params)
        })
        .collect()
}
