//! Side bearing reconciliation.

use glyphs_model::{Glyph, Layer};
use log::{debug, trace};
use smol_str::SmolStr;

use crate::error::Error;

/// The advance width and the share of side bearing on the left that every
/// synthesized layer should end up with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MetricsTarget {
    pub width: f64,
    pub lsb_proportion: f64,
}

impl MetricsTarget {
    /// Falls back to an even split when the side bearings do not add up to
    /// anything positive.
    pub fn new(width: f64, lsb: f64, rsb: f64) -> MetricsTarget {
        let total = lsb + rsb;
        let lsb_proportion = if total > 0.0 { lsb / total } else { 0.5 };
        MetricsTarget {
            width,
            lsb_proportion,
        }
    }

    pub fn of_layer(layer: &Layer) -> MetricsTarget {
        MetricsTarget::new(layer.width, layer.lsb(), layer.rsb())
    }

    /// Give `layer` the target width, splitting the space the outline leaves
    /// over by the target proportion. Totals may be negative.
    pub fn reconcile(&self, layer: &mut Layer) {
        layer.width = self.width;
        if layer.bounds().is_none() {
            trace!("{}: empty, width only", layer.layer_id);
            return;
        }
        let total = self.width - layer.paths_width();
        layer.set_lsb(total * self.lsb_proportion);
        layer.set_rsb(total * (1.0 - self.lsb_proportion));
        // bounds after translation can be a rounding step off
        layer.width = self.width;
    }
}

/// Reconcile every layer of `glyph` against the primary layer of `reference_master`.
///
/// Returns the number of layers touched.
pub fn sync_widths(glyph: &mut Glyph, reference_master: &str) -> Result<usize, Error> {
    let target = glyph
        .master_layer(reference_master)
        .map(MetricsTarget::of_layer)
        .ok_or_else(|| Error::MissingMasterLayer {
            glyph: glyph.name.clone(),
            master: SmolStr::new(reference_master),
        })?;
    debug!("{}: syncing to {target:?}", glyph.name);

    let mut synced = 0;
    for layer in glyph.layers.iter_mut() {
        if layer.is_master_layer() && layer.layer_id == reference_master {
            continue;
        }
        target.reconcile(layer);
        synced += 1;
    }
    Ok(synced)
}
