use std::path::Path;

use ned_gateway::{select_downloads, DatasetFormat, LinkCandidate};
use pretty_assertions::assert_eq;

const GEOMETRY: &str = "','downloadWin','left=100,top=100,width=600,height=500'); return false;";

fn candidate(id: u32, name: &str, category: &str) -> LinkCandidate {
    LinkCandidate {
        placeholder: format!("window.open('getData.aspx?id={id}{GEOMETRY}"),
        category: category.to_string(),
        name: name.to_string(),
    }
}

fn all_four_variants() -> Vec<LinkCandidate> {
    vec![
        candidate(1, "n40w105", DatasetFormat::ArcGridOneArcSecond.row_label()),
        candidate(2, "n40w105", DatasetFormat::ArcGridThirdArcSecond.row_label()),
        candidate(3, "n40w105", DatasetFormat::FloatOneArcSecond.row_label()),
        candidate(4, "n40w105", DatasetFormat::FloatThirdArcSecond.row_label()),
    ]
}

#[test]
fn only_the_wanted_variant_survives_with_token_substituted() {
    let pending = select_downloads(
        &all_four_variants(),
        DatasetFormat::ArcGridThirdArcSecond,
        "(S(abc123))",
        "http://gis.example",
        Path::new("out"),
    );

    assert_eq!(pending.len(), 1);
    assert_eq!(
        pending[0].placeholder_url,
        "http://gis.example/XMLWebServices2/(S(abc123))/getData.aspx?id=2"
    );
    assert_eq!(pending[0].file_name.as_deref(), Some("n40w105.zip"));
    assert_eq!(pending[0].output_dir, Path::new("out"));
}

#[test]
fn nothing_matching_is_not_an_error() {
    let candidates = vec![candidate(
        1,
        "n40w105",
        DatasetFormat::FloatOneArcSecond.row_label(),
    )];
    let pending = select_downloads(
        &candidates,
        DatasetFormat::ArcGridThirdArcSecond,
        "(S(abc123))",
        "http://gis.example",
        Path::new("out"),
    );
    assert_eq!(pending, vec![]);
}

#[test]
fn unscript_like_payloads_are_dropped() {
    let mut odd = candidate(9, "n40w105", DatasetFormat::ArcGridThirdArcSecond.row_label());
    odd.placeholder = "javascript:void(0)".to_string();
    let pending = select_downloads(
        &[odd],
        DatasetFormat::ArcGridThirdArcSecond,
        "(S(abc123))",
        "http://gis.example",
        Path::new("out"),
    );
    assert_eq!(pending, vec![]);
}

#[test]
fn changed_window_geometry_still_yields_the_inner_path() {
    let mut moved = candidate(5, "n41w106", DatasetFormat::ArcGridThirdArcSecond.row_label());
    moved.placeholder =
        "window.open('getData.aspx?id=5','downloadWin','left=0,top=0'); return false;".to_string();
    let pending = select_downloads(
        &[moved],
        DatasetFormat::ArcGridThirdArcSecond,
        "(S(t))",
        "http://gis.example",
        Path::new("out"),
    );
    assert_eq!(
        pending[0].placeholder_url,
        "http://gis.example/XMLWebServices2/(S(t))/getData.aspx?id=5"
    );
}

#[test]
fn empty_names_defer_filenames_to_the_signed_url() {
    let unnamed = candidate(6, "", DatasetFormat::ArcGridThirdArcSecond.row_label());
    let pending = select_downloads(
        &[unnamed],
        DatasetFormat::ArcGridThirdArcSecond,
        "(S(t))",
        "http://gis.example",
        Path::new("out"),
    );
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].file_name, None);
}
