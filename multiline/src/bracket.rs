//! Axis conditioned layers that substitute discrete content for a master.
//!
//! Every target master gets one bracket layer. The reference master's
//! bracket applies everywhere and shows the derived paths; the others apply
//! below a threshold on the bracket axes and show the reference paths. All of
//! them are drawn at the minimum stroke width.

use glyphs_model::{AxisRule, Glyph, Layer, Path};
use log::debug;
use smol_str::SmolStr;

use crate::{duplicate::Duplication, error::Error, metrics::MetricsTarget};

/// Suffix appended to the master id to form a bracket layer id.
const BRACKET_SUFFIX: &str = ".bracket";

pub fn bracket_layer_id(master_id: &str) -> SmolStr {
    SmolStr::from(format!("{master_id}{BRACKET_SUFFIX}"))
}

/// Where the non-reference bracket layers apply.
#[derive(Clone, Debug, PartialEq)]
pub struct BracketRule {
    pub axes: Vec<SmolStr>,
    pub threshold: f64,
}

impl BracketRule {
    pub fn axis_rule(&self, reference: bool) -> AxisRule {
        if reference {
            AxisRule::Unconditional
        } else {
            AxisRule::max_threshold(self.axes.iter().cloned(), self.threshold)
        }
    }
}

/// Delete every non-master layer of the glyph, returning how many went.
pub fn remove_stale_layers(glyph: &mut Glyph) -> usize {
    let stale = glyph.non_master_layer_ids();
    for layer_id in stale.iter() {
        debug!("{}: removing layer {layer_id}", glyph.name);
        glyph.remove_layer(layer_id);
    }
    stale.len()
}

/// Everything the bracket layers of one glyph are built from.
pub struct BracketSource<'a> {
    pub duplication: &'a Duplication,
    /// The reference paths before any offset.
    pub originals: &'a [Path],
    pub min_stroke: f64,
    pub metrics: MetricsTarget,
}

impl BracketSource<'_> {
    /// One bracket layer per master; the first master is the reference.
    pub fn layers(&self, master_ids: &[SmolStr], rule: &BracketRule) -> Vec<Layer> {
        master_ids
            .iter()
            .enumerate()
            .map(|(idx, master_id)| {
                let reference = idx == 0;
                let mut layer = Layer::bracket(
                    bracket_layer_id(master_id),
                    master_id.clone(),
                    rule.axis_rule(reference),
                    self.metrics.width,
                );
                let paths: Vec<&Path> = if reference {
                    self.duplication.derived.iter().map(|t| &t.path).collect()
                } else {
                    self.originals.iter().collect()
                };
                layer.shapes = paths
                    .into_iter()
                    .map(|path| {
                        let mut path = path.clone();
                        path.attributes.set_stroke(self.min_stroke, self.min_stroke);
                        path
                    })
                    .collect();
                self.metrics.reconcile(&mut layer);
                layer
            })
            .collect()
    }
}

/// Replace the glyph's non-master layers with fresh bracket layers.
///
/// Returns the number of stale layers removed.
pub fn regenerate(
    glyph: &mut Glyph,
    master_ids: &[SmolStr],
    rule: &BracketRule,
    source: &BracketSource,
) -> Result<usize, Error> {
    let removed = remove_stale_layers(glyph);
    for layer in source.layers(master_ids, rule) {
        glyph.push_layer(layer)?;
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use glyphs_model::NodeType;
    use pretty_assertions::assert_eq;

    use crate::{
        duplicate::{Duplicator, PathRole},
        offset::NormalOffset,
    };

    use super::*;

    fn ids() -> Vec<SmolStr> {
        ["m01", "m02", "m03"].into_iter().map(SmolStr::new).collect()
    }

    fn rule() -> BracketRule {
        BracketRule {
            axes: vec!["a01".into(), "a02".into()],
            threshold: 100.0,
        }
    }

    fn minus_path() -> Path {
        let mut path = Path::new(false);
        path.add((100.0, 300.0), NodeType::Line);
        path.add((500.0, 300.0), NodeType::Line);
        path.attributes.set_stroke(40.0, 40.0);
        path
    }

    fn glyph_with_masters() -> Glyph {
        let mut glyph = Glyph::new("minus");
        for id in ids() {
            glyph.push_layer(Layer::master(id, 600.0)).unwrap();
        }
        glyph
    }

    #[test]
    fn layer_ids_and_rules() {
        let originals = vec![minus_path()];
        let duplication = Duplicator::new(&NormalOffset, -70.0, true).duplicate(&originals);
        let source = BracketSource {
            duplication: &duplication,
            originals: &originals,
            min_stroke: 10.0,
            metrics: MetricsTarget::new(600.0, 100.0, 100.0),
        };
        let layers = source.layers(&ids(), &rule());

        assert_eq!(
            vec!["m01.bracket", "m02.bracket", "m03.bracket"],
            layers.iter().map(|l| l.layer_id.as_str()).collect::<Vec<_>>()
        );
        assert_eq!(
            vec![Some("m01"), Some("m02"), Some("m03")],
            layers
                .iter()
                .map(|l| l.associated_master_id.as_deref())
                .collect::<Vec<_>>()
        );
        assert_eq!(Some(AxisRule::Unconditional), layers[0].axis_rules);
        assert_eq!(
            Some(AxisRule::max_threshold(["a01", "a02"], 100.0)),
            layers[1].axis_rules
        );
        assert_eq!(Some("[a01<=100,a02<=100]"), layers[2].name.as_deref());
    }

    #[test]
    fn reference_bracket_holds_the_split_duplicates() {
        let originals = vec![minus_path()];
        let duplication = Duplicator::new(&NormalOffset, -70.0, true).duplicate(&originals);
        assert!(duplication
            .derived
            .iter()
            .all(|t| matches!(t.role, PathRole::Duplicate(Some(_)))));
        let source = BracketSource {
            duplication: &duplication,
            originals: &originals,
            min_stroke: 10.0,
            metrics: MetricsTarget::new(600.0, 100.0, 100.0),
        };
        let layers = source.layers(&ids(), &rule());

        let ys = |layer: &Layer| -> Vec<f64> {
            layer.shapes.iter().map(|p| p.nodes[0].pt.y()).collect()
        };
        assert_eq!(vec![335.0, 265.0], ys(&layers[0]));
        assert_eq!(vec![300.0], ys(&layers[1]));
        for layer in layers.iter() {
            assert!(layer
                .shapes
                .iter()
                .all(|p| p.attributes.stroke_width == Some(10.0.into())
                    && p.attributes.stroke_height == Some(10.0.into())));
            assert_eq!(600.0, layer.width);
            assert_eq!(100.0, layer.lsb());
        }
    }

    #[test]
    fn regenerating_replaces_old_layers() {
        let originals = vec![minus_path()];
        let duplication = Duplicator::new(&NormalOffset, -70.0, true).duplicate(&originals);
        let source = BracketSource {
            duplication: &duplication,
            originals: &originals,
            min_stroke: 10.0,
            metrics: MetricsTarget::new(600.0, 100.0, 100.0),
        };
        let mut glyph = glyph_with_masters();
        glyph
            .push_layer(Layer::bracket("old", "m02", AxisRule::Unconditional, 600.0))
            .unwrap();

        assert_eq!(1, regenerate(&mut glyph, &ids(), &rule(), &source).unwrap());
        assert_eq!(6, glyph.layers.len());
        assert_eq!(3, regenerate(&mut glyph, &ids(), &rule(), &source).unwrap());
        assert_eq!(6, glyph.layers.len());
        assert!(glyph.get_layer("old").is_none());
    }

    #[test]
    fn no_bracket_axes_means_unconditional() {
        let rule = BracketRule {
            axes: Vec::new(),
            threshold: 100.0,
        };
        assert_eq!(AxisRule::Unconditional, rule.axis_rule(false));
    }
}
