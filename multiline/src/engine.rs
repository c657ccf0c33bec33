//! Per glyph orchestration.
//!
//! Each selected glyph is processed on a copy that is committed only when
//! every step succeeded, so a failing glyph, including one whose offset
//! service panics, leaves the font as it was and does not stop the others.

use std::panic::{catch_unwind, AssertUnwindSafe};

use glyphs_model::{Font, Glyph};
use indexmap::IndexSet;
use log::{debug, error, info, trace, warn};
use regex::Regex;
use smol_str::SmolStr;

use crate::{
    bracket::{self, BracketSource},
    config::Settings,
    duplicate::Duplicator,
    error::Error,
    metrics::{self, MetricsTarget},
    offset::OffsetCurve,
    profile::StrokeProfile,
    synthesize::synthesize_masters,
};

/// Which glyphs a run touches: explicit names, plus any glyph whose name
/// matches the filter.
#[derive(Clone, Debug, Default)]
pub struct GlyphSelection {
    names: IndexSet<SmolStr>,
    glyph_name_filter: Option<Regex>,
}

impl GlyphSelection {
    pub fn new<I, S>(names: I, glyph_name_filter: Option<&str>) -> Result<GlyphSelection, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        Ok(GlyphSelection {
            names: names.into_iter().map(Into::into).collect(),
            glyph_name_filter: glyph_name_filter.map(Regex::new).transpose()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.glyph_name_filter.is_none()
    }

    /// Names of the selected glyphs present in `font`; explicit names first,
    /// in the order given, then filter matches in font order.
    pub fn resolve(&self, font: &Font) -> IndexSet<SmolStr> {
        let mut selected = IndexSet::new();
        for name in self.names.iter() {
            if font.get_glyph(name).is_some() {
                selected.insert(name.clone());
            } else {
                warn!("No glyph named '{name}'");
            }
        }
        if let Some(regex) = &self.glyph_name_filter {
            for glyph in font.glyphs.iter() {
                if regex.is_match(&glyph.name) {
                    selected.insert(glyph.name.clone());
                } else {
                    trace!("'{}' does not match --glyph-name-filter", glyph.name);
                }
            }
        }
        selected
    }
}

/// What happened to one glyph.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GlyphReport {
    pub name: SmolStr,
    /// Reference paths read.
    pub paths: usize,
    /// Offset duplicates created.
    pub duplicates: usize,
    /// Offsets that produced nothing.
    pub skipped: usize,
    /// Layers whose content or metrics were rewritten.
    pub layers_written: usize,
    /// Non-master layers deleted.
    pub layers_removed: usize,
}

impl GlyphReport {
    fn new(name: SmolStr) -> GlyphReport {
        GlyphReport {
            name,
            ..Default::default()
        }
    }
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub glyphs: Vec<GlyphReport>,
    pub failures: Vec<(SmolStr, Error)>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn skipped(&self) -> usize {
        self.glyphs.iter().map(|g| g.skipped).sum()
    }

    /// Fail with [`Error::GlyphsFailed`] if any glyph failed.
    pub fn into_result(self) -> Result<RunReport, Error> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::GlyphsFailed(self.failures.len()))
        }
    }

    pub fn log_summary(&self) {
        info!(
            "{} glyph(s) done, {} failed, {} offset(s) skipped",
            self.glyphs.len(),
            self.failures.len(),
            self.skipped()
        );
        for (name, e) in self.failures.iter() {
            error!("{name}: {e}");
        }
    }
}

/// Run `op` on a copy of every selected glyph, committing successes.
///
/// Errors and panics are recorded per glyph.
pub fn for_each_selected<F>(font: &mut Font, selection: &GlyphSelection, op: F) -> RunReport
where
    F: Fn(&[SmolStr], &mut Glyph) -> Result<GlyphReport, Error>,
{
    let mut report = RunReport::default();
    let names = selection.resolve(font);
    if names.is_empty() {
        warn!("No glyph selected");
        return report;
    }
    let master_ids: Vec<SmolStr> = font.masters.iter().map(|m| m.id.clone()).collect();

    for name in names {
        let Some(glyph) = font.get_glyph_mut(&name) else {
            continue;
        };
        let mut working = glyph.clone();
        let result = match catch_unwind(AssertUnwindSafe(|| op(&master_ids, &mut working))) {
            Ok(result) => result,
            Err(err) => Err(Error::Panic(get_panic_message(err))),
        };
        match result {
            Ok(glyph_report) => {
                debug!("{name}: {glyph_report:?}");
                *glyph = working;
                report.glyphs.push(glyph_report);
            }
            Err(e) => {
                warn!("{name} left unchanged: {e}");
                report.failures.push((name, e));
            }
        }
    }
    report
}

// taken from std:
// <https://github.com/rust-lang/rust/blob/d5a82bbd26e1ad8b7401f6a718a9c57c96905483/library/std/src/panicking.rs#L247-L253>
fn get_panic_message(msg: Box<dyn std::any::Any + Send + 'static>) -> String {
    match msg.downcast_ref::<&'static str>() {
        Some(s) => s.to_string(),
        None => match msg.downcast_ref::<String>() {
            Some(s) => s.to_owned(),
            None => "Box<dyn Any>".to_owned(),
        },
    }
}

fn require_masters(master_ids: &[SmolStr], required: usize) -> Result<&[SmolStr], Error> {
    master_ids
        .get(..required)
        .ok_or(Error::NotEnoughMasters {
            required,
            found: master_ids.len(),
        })
}

/// Synthesizes masters and bracket layers from the first master's paths.
pub struct Engine<O> {
    settings: Settings,
    profile: StrokeProfile,
    offset: O,
}

impl<O: OffsetCurve> Engine<O> {
    pub fn new(settings: Settings, offset: O) -> Engine<O> {
        let profile = settings.stroke_profile();
        Engine {
            settings,
            profile,
            offset,
        }
    }

    /// Replace the preset derived profile, e.g. with hand edited rows.
    pub fn with_profile(mut self, profile: StrokeProfile) -> Engine<O> {
        self.profile = profile;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Rebuild the target master layers and bracket layers of one glyph.
    ///
    /// `master_ids` are the font's masters in order; the first is the
    /// reference. The glyph may be partially modified on error.
    pub fn process_glyph(
        &self,
        master_ids: &[SmolStr],
        glyph: &mut Glyph,
    ) -> Result<GlyphReport, Error> {
        let targets = require_masters(master_ids, self.profile.len().max(1))?;
        let reference_id = &targets[0];
        let reference =
            glyph
                .master_layer(reference_id)
                .ok_or_else(|| Error::MissingMasterLayer {
                    glyph: glyph.name.clone(),
                    master: reference_id.clone(),
                })?;

        // captured before anything is cleared
        let metrics = MetricsTarget::of_layer(reference);
        let originals = reference.shapes.clone();
        debug!(
            "{}: {} reference paths, {metrics:?}",
            glyph.name,
            originals.len()
        );

        let duplication = Duplicator::new(
            &self.offset,
            self.settings.original_offset,
            self.settings.maintain_y_position,
        )
        .duplicate(&originals);

        synthesize_masters(glyph, targets, &self.profile, &duplication, &metrics)?;
        let layers_removed = bracket::regenerate(
            glyph,
            targets,
            &self.settings.bracket_rule(),
            &BracketSource {
                duplication: &duplication,
                originals: &originals,
                min_stroke: self.settings.min_stroke_width,
                metrics,
            },
        )?;

        Ok(GlyphReport {
            paths: originals.len(),
            duplicates: duplication.duplicates().count(),
            skipped: duplication.skipped,
            layers_written: targets.len() * 2,
            layers_removed,
            ..GlyphReport::new(glyph.name.clone())
        })
    }

    pub fn process(&self, font: &mut Font, selection: &GlyphSelection) -> RunReport {
        for_each_selected(font, selection, |master_ids, glyph| {
            self.process_glyph(master_ids, glyph)
        })
    }
}

/// Match every layer's width to the first master, keeping side bearing proportions.
pub fn sync_glyph(master_ids: &[SmolStr], glyph: &mut Glyph) -> Result<GlyphReport, Error> {
    let reference = &require_masters(master_ids, 1)?[0];
    let layers_written = metrics::sync_widths(glyph, reference)?;
    Ok(GlyphReport {
        layers_written,
        ..GlyphReport::new(glyph.name.clone())
    })
}

/// Delete the paths of every master layer.
pub fn clear_master_paths(master_ids: &[SmolStr], glyph: &mut Glyph) -> Result<GlyphReport, Error> {
    let mut report = GlyphReport::new(glyph.name.clone());
    for master_id in master_ids {
        let Some(layer) = glyph.master_layer_mut(master_id) else {
            return Err(Error::MissingMasterLayer {
                glyph: glyph.name.clone(),
                master: master_id.clone(),
            });
        };
        report.paths += layer.shapes.len();
        layer.clear();
        report.layers_written += 1;
        debug!("{}: cleared paths in {master_id}", glyph.name);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::path::{Path as FilePath, PathBuf};

    use glyphs_model::{
        Axis, AxisRule, FontMaster, Layer, NodeType, Path, PathAttributes, StrokePlacement,
    };
    use pretty_assertions::assert_eq;

    use crate::{
        bracket::bracket_layer_id,
        offset::{JoinType, NormalOffset},
    };

    use super::*;

    fn testdata_dir() -> PathBuf {
        let mut dir = FilePath::new("../resources/testdata");
        if !dir.is_dir() {
            dir = FilePath::new("./resources/testdata");
        }
        dir.to_path_buf()
    }

    /// Builds a font whose glyphs have the same paths in every master.
    struct FontBuilder {
        font: Font,
    }

    impl FontBuilder {
        fn new(master_count: usize) -> Self {
            let font = Font {
                family_name: "Test".to_string(),
                axes: vec![
                    Axis {
                        name: "Weight".to_string(),
                        tag: "wght".to_string(),
                        id: "a01".into(),
                    },
                    Axis {
                        name: "Spacing".to_string(),
                        tag: "SPAC".to_string(),
                        id: "a02".into(),
                    },
                ],
                masters: (1..=master_count)
                    .map(|i| FontMaster {
                        id: format!("m{i:02}").into(),
                        name: format!("Master {i}"),
                        axes_values: vec![(i as f64 * 50.0).into(), 0.0.into()],
                    })
                    .collect(),
                glyphs: Vec::new(),
            };
            FontBuilder { font }
        }

        fn add_glyph(&mut self, name: &str, width: f64, paths: Vec<Path>) -> &mut Self {
            let mut glyph = Glyph::new(name);
            for master in self.font.masters.iter() {
                glyph.layers.push(Layer {
                    shapes: paths.clone(),
                    ..Layer::master(master.id.clone(), width)
                });
            }
            self.font.glyphs.push(glyph);
            self
        }

        fn build(&self) -> Font {
            self.font.clone()
        }
    }

    fn line(from: (f64, f64), to: (f64, f64), placement: Option<StrokePlacement>) -> Path {
        let mut path = Path::new(false);
        path.add(from, NodeType::Line);
        path.add(to, NodeType::Line);
        path.attributes = PathAttributes {
            stroke_width: Some(40.0.into()),
            stroke_height: Some(40.0.into()),
            stroke_pos: placement,
            ..Default::default()
        };
        path
    }

    fn minus() -> Path {
        line((100.0, 300.0), (500.0, 300.0), None)
    }

    fn engine() -> Engine<NormalOffset> {
        Engine::new(Settings::default(), NormalOffset)
    }

    fn select(names: &[&str]) -> GlyphSelection {
        GlyphSelection::new(names.iter().copied(), None).unwrap()
    }

    fn ys(layer: &Layer) -> Vec<(f64, f64)> {
        layer
            .shapes
            .iter()
            .map(|p| {
                (
                    p.nodes[0].pt.y(),
                    p.attributes.stroke_width.map(|w| w.0).unwrap_or_default(),
                )
            })
            .collect()
    }

    #[test]
    fn horizontal_minus_end_to_end() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut font = FontBuilder::new(5).add_glyph("minus", 600.0, vec![minus()]).build();
        let report = engine().process(&mut font, &select(&["minus"]));
        assert!(report.is_success(), "{report:?}");

        let glyph = font.get_glyph("minus").unwrap();
        let thin = glyph.master_layer("m01").unwrap();
        assert_eq!(vec![(300.0, 10.0)], ys(thin));

        let reference_bracket = glyph.get_layer(&bracket_layer_id("m01")).unwrap();
        assert_eq!(vec![(335.0, 10.0), (265.0, 10.0)], ys(reference_bracket));
        assert_eq!(Some(&AxisRule::Unconditional), reference_bracket.axis_rules.as_ref());

        let light_bracket = glyph.get_layer("m02.bracket").unwrap();
        assert_eq!(vec![(300.0, 10.0)], ys(light_bracket));

        for layer in glyph.layers.iter() {
            assert_eq!(600.0, layer.width, "{}", layer.layer_id);
            assert_eq!((100.0, 100.0), (layer.lsb(), layer.rsb()), "{}", layer.layer_id);
        }
        assert_eq!(
            vec![GlyphReport {
                name: "minus".into(),
                paths: 1,
                duplicates: 2,
                skipped: 0,
                layers_written: 10,
                layers_removed: 0,
            }],
            report.glyphs
        );
    }

    #[test]
    fn running_twice_does_not_accumulate_layers() {
        let mut font = FontBuilder::new(5).add_glyph("minus", 600.0, vec![minus()]).build();
        let engine = engine();
        engine.process(&mut font, &select(&["minus"]));
        let once = font.get_glyph("minus").unwrap().layers.len();
        let report = engine.process(&mut font, &select(&["minus"]));
        assert_eq!(10, once);
        assert_eq!(once, font.get_glyph("minus").unwrap().layers.len());
        assert_eq!(5, report.glyphs[0].layers_removed);
    }

    #[test]
    fn reference_metrics_come_from_before_clearing() {
        // asymmetric side bearings, 100 left and 300 right
        let mut font = FontBuilder::new(5)
            .add_glyph("minus", 800.0, vec![minus()])
            .build();
        // the other masters start out narrower, 20 left and 80 right
        for layer in font.glyphs[0].layers[1..].iter_mut() {
            layer.width = 500.0;
            layer.shapes.iter_mut().for_each(|path| path.translate(-80.0, 0.0));
        }
        engine().process(&mut font, &select(&["minus"]));
        for layer in font.get_glyph("minus").unwrap().layers.iter() {
            assert_eq!(800.0, layer.width);
            assert!((layer.lsb() - 100.0).abs() < 1e-9, "{}", layer.layer_id);
        }
    }

    #[test]
    fn too_few_masters_fails_that_glyph_only() {
        let mut font = FontBuilder::new(3).add_glyph("minus", 600.0, vec![minus()]).build();
        let before = font.clone();
        let report = engine().process(&mut font, &select(&["minus"]));
        assert!(matches!(
            report.failures.as_slice(),
            [(_, Error::NotEnoughMasters { required: 5, found: 3 })]
        ));
        assert_eq!(before, font);
        assert!(matches!(report.into_result(), Err(Error::GlyphsFailed(1))));
    }

    #[test]
    fn panicking_offset_is_isolated() {
        let boom = |path: &Path, _: f64, _: f64, _: JoinType, _: f64| -> Vec<Path> {
            if path.nodes[0].pt.x() > 1000.0 {
                panic!("offset exploded");
            }
            vec![path.clone()]
        };
        let mut font = FontBuilder::new(5)
            .add_glyph("minus", 600.0, vec![minus()])
            .add_glyph("far", 2000.0, vec![line((1100.0, 0.0), (1500.0, 0.0), None)])
            .build();
        let untouched = font.get_glyph("far").unwrap().clone();

        let report = Engine::new(Settings::default(), boom)
            .process(&mut font, &select(&["minus", "far"]));

        assert_eq!(vec!["minus"], report.glyphs.iter().map(|g| g.name.as_str()).collect::<Vec<_>>());
        let [(name, Error::Panic(msg))] = report.failures.as_slice() else {
            panic!("expected a single panic, got {:?}", report.failures);
        };
        assert_eq!(("far", "offset exploded"), (name.as_str(), msg.as_str()));
        assert_eq!(&untouched, font.get_glyph("far").unwrap());
        assert_eq!(10, font.get_glyph("minus").unwrap().layers.len());
    }

    #[test]
    fn empty_selection_is_a_no_op() {
        let mut font = FontBuilder::new(5).add_glyph("minus", 600.0, vec![minus()]).build();
        let before = font.clone();
        let report = engine().process(&mut font, &GlyphSelection::default());
        assert!(report.is_success());
        assert!(report.glyphs.is_empty());
        assert_eq!(before, font);
    }

    #[test]
    fn selection_by_name_and_filter() {
        let font = FontBuilder::new(1)
            .add_glyph("a", 500.0, Vec::new())
            .add_glyph("b", 500.0, Vec::new())
            .add_glyph("a.alt", 500.0, Vec::new())
            .build();
        let selection = GlyphSelection::new(["b", "nope"], Some("^a")).unwrap();
        assert_eq!(
            vec!["b", "a", "a.alt"],
            selection
                .resolve(&font)
                .iter()
                .map(|n| n.as_str())
                .collect::<Vec<_>>()
        );
        assert!(matches!(
            GlyphSelection::new(Vec::<SmolStr>::new(), Some("(")),
            Err(Error::InvalidGlyphFilter(..))
        ));
    }

    #[test]
    fn skipped_offsets_are_reported() {
        let nothing = |_: &Path, _: f64, _: f64, _: JoinType, _: f64| Vec::<Path>::new();
        let mut font = FontBuilder::new(5)
            .add_glyph(
                "bar",
                500.0,
                vec![line((250.0, -120.0), (250.0, 780.0), Some(StrokePlacement::Left))],
            )
            .build();
        let report = Engine::new(Settings::default(), nothing).process(&mut font, &select(&["bar"]));
        assert_eq!(1, report.skipped());
        // derived masters still hold the original
        assert_eq!(1, font.get_glyph("bar").unwrap().master_layer("m05").unwrap().shapes.len());
    }

    #[test]
    fn edited_profile_rows_are_used() {
        let mut profile = Settings::default().stroke_profile();
        profile.master_mut(4).unwrap().split = [
            crate::profile::StrokeSize::square(66.0),
            crate::profile::StrokeSize::square(99.0),
        ];
        let engine = engine().with_profile(profile);
        let mut font = FontBuilder::new(5).add_glyph("minus", 600.0, vec![minus()]).build();
        engine.process(&mut font, &select(&["minus"]));
        let heavy = font.get_glyph("minus").unwrap().master_layer("m05").unwrap();
        assert_eq!(vec![(335.0, 66.0), (265.0, 99.0)], ys(heavy));
        assert_eq!(-70.0, engine.settings().original_offset);
    }

    #[test]
    fn sync_and_clear() {
        let mut font = FontBuilder::new(3).add_glyph("minus", 600.0, vec![minus()]).build();
        font.get_glyph_mut("minus").unwrap().layers[2].width = 900.0;

        let report = for_each_selected(&mut font, &select(&["minus"]), sync_glyph);
        assert_eq!(2, report.glyphs[0].layers_written);
        assert_eq!(600.0, font.get_glyph("minus").unwrap().layers[2].width);

        let report = for_each_selected(&mut font, &select(&["minus"]), clear_master_paths);
        assert_eq!(3, report.glyphs[0].paths);
        assert!(font
            .get_glyph("minus")
            .unwrap()
            .layers
            .iter()
            .all(|l| l.shapes.is_empty()));
    }

    #[test]
    fn process_testdata() {
        let mut font = Font::load(&testdata_dir().join("Stroke5.json")).unwrap();
        let selection = GlyphSelection::new(Vec::<SmolStr>::new(), Some(".*")).unwrap();
        let report = engine().process(&mut font, &selection);
        assert!(report.is_success(), "{report:?}");
        assert_eq!(3, report.glyphs.len());
        // the stale bracket on minus was replaced
        assert_eq!(1, report.glyphs[0].layers_removed);

        let slash = font.get_glyph("slash").unwrap();
        let light = slash.master_layer("m02").unwrap();
        assert_eq!(2, light.shapes.len());
        // the duplicates of a diagonal sit at equal and opposite horizontal shifts
        let shifts: Vec<f64> = light
            .shapes
            .iter()
            .map(|p| p.nodes[0].pt.x() - light.shapes[0].nodes[0].pt.x())
            .collect();
        assert_eq!(0.0, shifts[0]);
        assert!(shifts[1].abs() > 70.0);

        let temp_dir = tempfile::tempdir().unwrap();
        let saved = temp_dir.path().join("out.json");
        font.save(&saved).unwrap();
        assert_eq!(font, Font::load(&saved).unwrap());
    }
}
