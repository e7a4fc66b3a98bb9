//! End-to-end pipeline tests against a mocked geometry provider.

use std::path::Path;

use plakat::error::Error;
use plakat::export::{encode_png, Dimensions, Exporter, OutputFormat};
use plakat::geo::{Area, Coordinates, GeoLayers, GeoProvider, Polyline, RoadSegment};
use plakat::page::{compose, Orientation, PageSpec, PaperSize};
use plakat::poster::{create_page_poster, create_poster, render_figure};
use plakat::render::{RenderRequest, DEFAULT_ASPECT};
use plakat::theme::{RoadClass, ThemeStore};

const FRANKFURT: Coordinates = Coordinates { lat: 50.1106, lon: 8.6820 };

/// A provider serving a small fixed patch of Frankfurt-ish geometry.
struct MockProvider;

impl GeoProvider for MockProvider {
    fn geocode(&self, _city: &str, _country: Option<&str>) -> plakat::Result<Coordinates> {
        Ok(FRANKFURT)
    }

    fn layers(&self, center: Coordinates, _radius_m: f64) -> plakat::Result<GeoLayers> {
        let (lat, lon) = (center.lat, center.lon);
        Ok(GeoLayers {
            water: vec![Area {
                outer: vec![
                    (lon - 0.02, lat - 0.01),
                    (lon + 0.02, lat - 0.012),
                    (lon + 0.02, lat - 0.008),
                    (lon - 0.02, lat - 0.006),
                    (lon - 0.02, lat - 0.01),
                ],
                holes: vec![],
            }],
            waterways: vec![Polyline {
                points: vec![(lon - 0.03, lat - 0.02), (lon + 0.03, lat - 0.005)],
            }],
            parks: vec![Area {
                outer: vec![
                    (lon + 0.005, lat + 0.005),
                    (lon + 0.015, lat + 0.005),
                    (lon + 0.015, lat + 0.015),
                    (lon + 0.005, lat + 0.015),
                ],
                holes: vec![],
            }],
            roads: vec![
                RoadSegment {
                    class: RoadClass::Motorway,
                    line: Polyline {
                        points: vec![(lon - 0.04, lat - 0.03), (lon + 0.04, lat + 0.03)],
                    },
                },
                RoadSegment {
                    class: RoadClass::Primary,
                    line: Polyline {
                        points: vec![(lon - 0.04, lat), (lon + 0.04, lat)],
                    },
                },
                RoadSegment {
                    class: RoadClass::Residential,
                    line: Polyline {
                        points: vec![(lon, lat - 0.03), (lon, lat + 0.03)],
                    },
                },
            ],
        })
    }
}

/// A provider that must never be reached.
struct UnreachableProvider;

impl GeoProvider for UnreachableProvider {
    fn geocode(&self, _: &str, _: Option<&str>) -> plakat::Result<Coordinates> {
        panic!("geocode called even though the request should fail earlier");
    }

    fn layers(&self, _: Coordinates, _: f64) -> plakat::Result<GeoLayers> {
        panic!("layers called even though the request should fail earlier");
    }
}

fn themes() -> ThemeStore {
    ThemeStore::open(Path::new(env!("CARGO_MANIFEST_DIR")).join("themes"))
}

fn frankfurt_request(theme: &str) -> RenderRequest {
    RenderRequest {
        city: "Frankfurt".into(),
        country: Some("Germany".into()),
        theme: theme.into(),
        radius_m: 12_000.0,
        dpi: 300,
    }
}

#[test]
fn frankfurt_noir_scenario() {
    let out = tempfile::tempdir().unwrap();
    let mut request = frankfurt_request("noir");
    request.dpi = 60; // keep the raster small

    let artifact = create_poster(&MockProvider, &themes(), &request, out.path()).unwrap();

    let name = artifact.path.file_name().unwrap().to_str().unwrap();
    assert!(
        name.starts_with("Frankfurt_noir_") && name.ends_with(".png"),
        "unexpected artifact name {name}"
    );

    let bytes = std::fs::read(&artifact.path).unwrap();
    assert!(!bytes.is_empty());

    // The noir background must dominate the raster.
    let noir = themes().load("noir").unwrap();
    let pixmap = tiny_skia::Pixmap::decode_png(&bytes).unwrap();
    let matching = pixmap
        .pixels()
        .iter()
        .filter(|p| {
            p.red() == noir.bg.red() && p.green() == noir.bg.green() && p.blue() == noir.bg.blue()
        })
        .count();
    assert!(
        matching * 2 > pixmap.pixels().len(),
        "background covers only {matching} of {} pixels",
        pixmap.pixels().len()
    );

    match artifact.dimensions {
        Dimensions::Pixels { width, height } => {
            assert_eq!((pixmap.width(), pixmap.height()), (width, height));
        }
        other => panic!("expected pixel dimensions, got {other:?}"),
    }
}

#[test]
fn unknown_theme_fails_before_any_network_call() {
    let out = tempfile::tempdir().unwrap();
    let err = create_poster(
        &UnreachableProvider,
        &themes(),
        &frankfurt_request("nonexistent"),
        out.path(),
    )
    .unwrap_err();

    assert!(matches!(err, Error::ThemeNotFound(name) if name == "nonexistent"));
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn invalid_radius_fails_before_any_network_call() {
    let out = tempfile::tempdir().unwrap();
    let mut request = frankfurt_request("noir");
    request.radius_m = -5.0;

    let err = create_poster(&UnreachableProvider, &themes(), &request, out.path()).unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));
}

#[test]
fn rendering_is_deterministic() {
    let request = frankfurt_request("midnight_blue");
    let (a, _) = render_figure(&MockProvider, &themes(), &request, DEFAULT_ASPECT).unwrap();
    let (b, _) = render_figure(&MockProvider, &themes(), &request, DEFAULT_ASPECT).unwrap();

    let (png_a, ..) = encode_png(&a, 72).unwrap();
    let (png_b, ..) = encode_png(&b, 72).unwrap();
    assert_eq!(png_a, png_b, "identical inputs must produce identical bytes");
}

#[test]
fn page_export_uses_the_documented_names() {
    let out = tempfile::tempdir().unwrap();
    let request = frankfurt_request("noir");
    let spec = PageSpec {
        paper: PaperSize::A4,
        orientation: Orientation::Landscape,
        print_ready: true,
    };

    let pdf = create_page_poster(
        &MockProvider,
        &themes(),
        &request,
        &spec,
        OutputFormat::Pdf,
        out.path(),
    )
    .unwrap();
    assert_eq!(
        pdf.path.file_name().unwrap().to_str().unwrap(),
        "Frankfurt_noir_A4_landscape_printready.pdf"
    );

    let home = PageSpec { print_ready: false, ..spec };
    let eps = create_page_poster(
        &MockProvider,
        &themes(),
        &request,
        &home,
        OutputFormat::Eps,
        out.path(),
    )
    .unwrap();
    assert_eq!(
        eps.path.file_name().unwrap().to_str().unwrap(),
        "Frankfurt_noir_A4_landscape.eps"
    );

    match eps.dimensions {
        Dimensions::Millimeters { width, height } => assert_eq!((width, height), (297.0, 210.0)),
        other => panic!("expected mm dimensions, got {other:?}"),
    }
}

#[test]
fn png_is_rejected_on_the_page_surface() {
    let out = tempfile::tempdir().unwrap();
    let request = frankfurt_request("noir");
    let spec = PageSpec {
        paper: PaperSize::A5,
        orientation: Orientation::Portrait,
        print_ready: false,
    };

    let (figure, _) =
        render_figure(&MockProvider, &themes(), &request, spec.aspect_ratio()).unwrap();
    let page = compose(figure, &spec);
    let err = Exporter::new(out.path())
        .write_page(&page, OutputFormat::Png, "Frankfurt", "noir")
        .unwrap_err();

    assert!(matches!(err, Error::UnsupportedFormat { format: OutputFormat::Png }));
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn every_shipped_theme_loads_and_round_trips() {
    let store = themes();
    let ids = store.list().unwrap();
    assert!(ids.contains(&"feature_based".to_string()));
    assert!(ids.contains(&"noir".to_string()));

    for id in ids {
        let theme = store.load(&id).unwrap();
        let reloaded: plakat::Theme =
            serde_json::from_str(&serde_json::to_string(&theme).unwrap()).unwrap();
        assert_eq!(theme, reloaded, "theme {id} must round-trip");
    }
}

#[test]
fn sparse_regions_still_produce_posters() {
    struct EmptyProvider;
    impl GeoProvider for EmptyProvider {
        fn geocode(&self, _: &str, _: Option<&str>) -> plakat::Result<Coordinates> {
            Ok(FRANKFURT)
        }
        fn layers(&self, _: Coordinates, _: f64) -> plakat::Result<GeoLayers> {
            Ok(GeoLayers::default())
        }
    }

    let out = tempfile::tempdir().unwrap();
    let mut request = frankfurt_request("japanese_ink");
    request.dpi = 40;
    let artifact = create_poster(&EmptyProvider, &themes(), &request, out.path()).unwrap();
    assert!(artifact.path.exists());
}
