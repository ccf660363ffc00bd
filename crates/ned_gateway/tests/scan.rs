use ned_gateway::{normalize_replay, scan_results_page};
use pretty_assertions::assert_eq;

const GEOMETRY: &str = "','downloadWin','left=100,top=100,width=600,height=500'); return false;";

const ARCGRID_THIRD: &str =
    "National Elevation Dataset (1/3 arc second) Pre-packaged ArcGrid format";
const FLOAT_ONE: &str = "National Elevation Dataset (1 arc second) Pre-packaged Float format";

fn desc_row(label: &str) -> String {
    format!("<tr><td>{label}</td></tr>")
}

fn link_row(id: u32, name: &str) -> String {
    format!(
        "<tr><td><a href=\"#\" onclick=\"window.open('getData.aspx?id={id}{GEOMETRY}\">{name}</a></td></tr>"
    )
}

fn results_page(rows: &[String]) -> String {
    format!(
        "<html><head><title>Download options</title></head><body><table>{}</table></body></html>",
        rows.join("\n")
    )
}

#[test]
fn candidates_come_out_in_document_order() {
    let page = results_page(&[
        desc_row(ARCGRID_THIRD),
        link_row(1, "n40w105"),
        link_row(2, "n41w105"),
        desc_row(FLOAT_ONE),
        link_row(3, "n40w106"),
    ]);

    let output = scan_results_page(&page);

    assert_eq!(output.redirect_target, None);
    assert_eq!(output.candidates.len(), 3);
    let names: Vec<&str> = output.candidates.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["n40w105", "n41w105", "n40w106"]);
    assert_eq!(output.candidates[0].category, ARCGRID_THIRD);
    assert_eq!(output.candidates[1].category, ARCGRID_THIRD);
    assert_eq!(output.candidates[2].category, FLOAT_ONE);
    assert_eq!(
        output.candidates[0].placeholder,
        format!("window.open('getData.aspx?id=1{GEOMETRY}")
    );
}

#[test]
fn object_moved_title_yields_the_following_href() {
    let page = concat!(
        "<html><head><title>Object moved</title></head><body>",
        "<h2>Object moved to ",
        "<a href=\"/XMLWebServices2/(S(abc123))/getTDDSDownloadURLs.aspx?XMin=-109.2\">here</a>.",
        "</h2></body></html>"
    );

    let output = scan_results_page(page);

    assert_eq!(output.candidates, vec![]);
    assert_eq!(
        output.redirect_target.as_deref(),
        Some("/XMLWebServices2/(S(abc123))/getTDDSDownloadURLs.aspx?XMin=-109.2")
    );
}

#[test]
fn any_other_title_means_no_redirect() {
    let page = concat!(
        "<html><head><title>Object moved elsewhere</title></head><body>",
        "<a href=\"/would-be-target\">here</a>",
        "</body></html>"
    );

    let output = scan_results_page(page);

    assert_eq!(output.redirect_target, None);
}

#[test]
fn candidates_before_the_first_row_boundary_are_dropped() {
    let page = format!(
        "<html><body><a onclick=\"window.open('early{GEOMETRY}\">stray</a><table>{}{}</table></body></html>",
        desc_row(ARCGRID_THIRD),
        link_row(1, "n40w105"),
    );

    let output = scan_results_page(&page);

    assert_eq!(output.candidates.len(), 1);
    assert_eq!(output.candidates[0].name, "n40w105");
}

#[test]
fn nameless_links_are_still_emitted() {
    let page = results_page(&[
        desc_row(ARCGRID_THIRD),
        format!("<tr><td><a onclick=\"window.open('getData.aspx?id=1{GEOMETRY}\"></a></td></tr>"),
    ]);

    let output = scan_results_page(&page);

    assert_eq!(output.candidates.len(), 1);
    assert_eq!(output.candidates[0].name, "");
    assert_eq!(output.candidates[0].category, ARCGRID_THIRD);
}

#[test]
fn names_are_trimmed() {
    let page = results_page(&[
        desc_row(ARCGRID_THIRD),
        format!(
            "<tr><td><a onclick=\"window.open('getData.aspx?id=1{GEOMETRY}\">  n40w105  </a></td></tr>"
        ),
    ]);

    let output = scan_results_page(&page);

    assert_eq!(output.candidates[0].name, "n40w105");
}

#[test]
fn replay_markup_parses_after_normalization() {
    // The session-replay response ships onclick values without quotes.
    let raw = format!(
        "<html><head><title>Download options</title></head><body><table>{}\
         <tr><td><a href=# onclick=window.open('getData.aspx?id=7{GEOMETRY}>n40w105</a></td></tr>\
         </table></body></html>",
        desc_row(ARCGRID_THIRD),
    );

    let output = scan_results_page(&normalize_replay(&raw));

    assert_eq!(output.candidates.len(), 1);
    assert_eq!(output.candidates[0].name, "n40w105");
    assert_eq!(
        output.candidates[0].placeholder,
        format!("window.open('getData.aspx?id=7{GEOMETRY}")
    );
}
