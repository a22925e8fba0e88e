//! Plotly figure assembly and HTML output.
//!
//! The figure is built as typed structs and serialized with serde into the
//! plotly.js figure schema (`{data: [...], layout: {...}}`). Projection,
//! color interpolation and drawing all happen in plotly.js inside the
//! written page. By default the page carries the plotly.js bundle shipped
//! with the `plotly` crate, so it renders without network access.

use std::io::{self, Write};

use plotly::Plot;
use serde::Serialize;

use crate::extract::EventColumns;

/// plotly.js bundle referenced by `html-cdn` pages.
const PLOTLY_JS_URL: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Element id the figure is drawn into.
const PLOT_DIV_ID: &str = "earthquake-map";

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Self-contained HTML page with plotly.js inlined (default)
    #[default]
    Html,
    /// HTML page that loads plotly.js from the plotly CDN
    HtmlCdn,
    /// Raw plotly figure JSON
    Json,
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "html-cdn" => Ok(Self::HtmlCdn),
            "json" => Ok(Self::Json),
            _ => Err(format!(
                "unknown format: {s} (expected: html, html-cdn, json)"
            )),
        }
    }
}

/// Marker styling for the scatter trace.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerStyle {
    /// Marker size per unit of magnitude
    pub size_factor: f64,
    /// Named plotly color scale
    pub colorscale: String,
    pub reversescale: bool,
    pub colorbar_title: String,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            size_factor: 3.0,
            colorscale: "Hot".to_string(),
            reversescale: true,
            colorbar_title: "Magnitude".to_string(),
        }
    }
}

/// Layout styling: title placement and font size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutStyle {
    pub title_x: f64,
    pub title_y: f64,
    pub font_size: u32,
}

impl Default for LayoutStyle {
    fn default() -> Self {
        Self {
            title_x: 0.45,
            title_y: 0.9,
            font_size: 24,
        }
    }
}

/// Everything needed to draw the map.
#[derive(Debug, Clone)]
pub struct PlotSpec {
    pub columns: EventColumns,
    pub title: String,
    pub marker: MarkerStyle,
    pub layout: LayoutStyle,
}

impl PlotSpec {
    /// Spec with the default styling.
    #[must_use]
    pub fn new(columns: EventColumns, title: String) -> Self {
        Self {
            columns,
            title,
            marker: MarkerStyle::default(),
            layout: LayoutStyle::default(),
        }
    }

    /// Build the serializable plotly figure.
    #[must_use]
    pub fn into_figure(self) -> Figure {
        let Self {
            columns,
            title,
            marker,
            layout,
        } = self;

        let trace = ScatterGeo {
            trace_type: "scattergeo",
            text: columns.hover_texts,
            lon: columns.longitudes,
            lat: columns.latitudes,
            marker: Marker {
                size: marker_sizes(&columns.magnitudes, marker.size_factor),
                color: columns.magnitudes,
                colorscale: marker.colorscale,
                reversescale: marker.reversescale,
                colorbar: ColorBar {
                    title: Text {
                        text: marker.colorbar_title,
                    },
                },
            },
        };

        Figure {
            data: vec![trace],
            layout: Layout {
                title: Title {
                    text: title,
                    x: layout.title_x,
                    y: layout.title_y,
                    xanchor: "center",
                    yanchor: "top",
                },
                font: Font {
                    size: layout.font_size,
                },
            },
        }
    }
}

/// Marker sizes as a linear multiple of magnitude.
#[must_use]
pub fn marker_sizes(magnitudes: &[f64], factor: f64) -> Vec<f64> {
    magnitudes.iter().map(|m| factor * m).collect()
}

/// A plotly figure.
#[derive(Debug, Clone, Serialize)]
pub struct Figure {
    pub data: Vec<ScatterGeo>,
    pub layout: Layout,
}

/// A `scattergeo` trace.
#[derive(Debug, Clone, Serialize)]
pub struct ScatterGeo {
    #[serde(rename = "type")]
    pub trace_type: &'static str,
    pub text: Vec<String>,
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
    pub marker: Marker,
}

#[derive(Debug, Clone, Serialize)]
pub struct Marker {
    pub size: Vec<f64>,
    pub color: Vec<f64>,
    pub colorscale: String,
    pub reversescale: bool,
    pub colorbar: ColorBar,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColorBar {
    pub title: Text,
}

#[derive(Debug, Clone, Serialize)]
pub struct Text {
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    pub title: Title,
    pub font: Font,
}

#[derive(Debug, Clone, Serialize)]
pub struct Title {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub xanchor: &'static str,
    pub yanchor: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Font {
    pub size: u32,
}

/// Escape text for an HTML element body.
fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Serialize a figure for embedding inside a `<script>` element.
///
/// `<` only occurs inside JSON strings, where `\u003c` is equivalent, so
/// no title can close the script early.
fn figure_script_json(figure: &Figure) -> io::Result<String> {
    let json = serde_json::to_string(figure)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(json.replace('<', "\\u003c"))
}

/// Where the page gets plotly.js from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlotlyJs {
    Inline,
    Cdn,
}

/// Write the figure as a self-contained HTML page with plotly.js inlined.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_html<W: Write>(writer: &mut W, figure: &Figure) -> io::Result<()> {
    write_page(writer, figure, PlotlyJs::Inline)
}

/// Write the figure as an HTML page that loads plotly.js from the CDN.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_html_cdn<W: Write>(writer: &mut W, figure: &Figure) -> io::Result<()> {
    write_page(writer, figure, PlotlyJs::Cdn)
}

fn write_page<W: Write>(writer: &mut W, figure: &Figure, plotly_js: PlotlyJs) -> io::Result<()> {
    let json = figure_script_json(figure)?;
    let title = escape_html(&figure.layout.title.text);

    writeln!(writer, "<!DOCTYPE html>")?;
    writeln!(writer, "<html lang=\"en\">")?;
    writeln!(writer, "<head>")?;
    writeln!(writer, "<meta charset=\"utf-8\" />")?;
    writeln!(writer, "<title>{title}</title>")?;
    match plotly_js {
        // Script tags wrapping the bundle compiled in via `plotly_embed_js`
        PlotlyJs::Inline => writeln!(writer, "{}", Plot::offline_js_sources())?,
        PlotlyJs::Cdn => writeln!(
            writer,
            "<script src=\"{PLOTLY_JS_URL}\" charset=\"utf-8\"></script>"
        )?,
    }
    writeln!(
        writer,
        "<style>html, body {{ margin: 0; height: 100%; }} #{PLOT_DIV_ID} {{ width: 100%; height: 100%; }}</style>"
    )?;
    writeln!(writer, "</head>")?;
    writeln!(writer, "<body>")?;
    writeln!(writer, "<div id=\"{PLOT_DIV_ID}\"></div>")?;
    writeln!(writer, "<script>")?;
    writeln!(writer, "const figure = {json};")?;
    writeln!(
        writer,
        "Plotly.newPlot(\"{PLOT_DIV_ID}\", figure.data, figure.layout, {{\"responsive\": true}});"
    )?;
    writeln!(writer, "</script>")?;
    writeln!(writer, "</body>")?;
    writeln!(writer, "</html>")
}

/// Write the figure as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json<W: Write>(writer: &mut W, figure: &Figure) -> io::Result<()> {
    let json = serde_json::to_string_pretty(figure)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{json}")
}

/// Write the figure in the specified format.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_figure<W: Write>(writer: &mut W, figure: &Figure, format: Format) -> io::Result<()> {
    match format {
        Format::Html => write_html(writer, figure),
        Format::HtmlCdn => write_html_cdn(writer, figure),
        Format::Json => write_json(writer, figure),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn sample_spec() -> PlotSpec {
        let columns = EventColumns {
            magnitudes: vec![5.0, 1.5],
            longitudes: vec![-120.5, 140.1],
            latitudes: vec![37.0, 35.6],
            hover_texts: vec!["a<br>M 5.0".to_string(), "b<br>M 1.5".to_string()],
        };
        PlotSpec::new(columns, "USGS Earthquakes, Nov 03 to Nov 14".to_string())
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("html".parse::<Format>().unwrap(), Format::Html);
        assert_eq!("html-cdn".parse::<Format>().unwrap(), Format::HtmlCdn);
        assert_eq!("JSON".parse::<Format>().unwrap(), Format::Json);
        assert!("svg".parse::<Format>().is_err());
    }

    #[test]
    fn test_marker_size_scales_magnitude() {
        assert_eq!(marker_sizes(&[5.0], 3.0), vec![15.0]);
        assert_eq!(marker_sizes(&[], 3.0), Vec::<f64>::new());
    }

    #[test]
    fn test_figure_schema() {
        let figure = sample_spec().into_figure();
        let value = serde_json::to_value(&figure).unwrap();

        let trace = &value["data"][0];
        assert_eq!(trace["type"], "scattergeo");
        assert_eq!(trace["lon"], json!([-120.5, 140.1]));
        assert_eq!(trace["lat"], json!([37.0, 35.6]));
        assert_eq!(trace["text"][0], "a<br>M 5.0");
        assert_eq!(trace["marker"]["size"], json!([15.0, 4.5]));
        assert_eq!(trace["marker"]["color"], json!([5.0, 1.5]));
        assert_eq!(trace["marker"]["colorscale"], "Hot");
        assert_eq!(trace["marker"]["reversescale"], true);
        assert_eq!(trace["marker"]["colorbar"]["title"]["text"], "Magnitude");

        let title = &value["layout"]["title"];
        assert_eq!(title["text"], "USGS Earthquakes, Nov 03 to Nov 14");
        assert_eq!(title["x"], 0.45);
        assert_eq!(title["y"], 0.9);
        assert_eq!(title["xanchor"], "center");
        assert_eq!(title["yanchor"], "top");
        assert_eq!(value["layout"]["font"]["size"], 24);
    }

    #[test]
    fn test_custom_marker_style() {
        let mut spec = sample_spec();
        spec.marker.size_factor = 2.0;
        spec.marker.reversescale = false;
        let value = serde_json::to_value(spec.into_figure()).unwrap();
        assert_eq!(value["data"][0]["marker"]["size"], json!([10.0, 3.0]));
        assert_eq!(value["data"][0]["marker"]["reversescale"], false);
    }

    #[test]
    fn test_write_html_embeds_figure() {
        let figure = sample_spec().into_figure();
        let mut buf = Vec::new();
        write_html(&mut buf, &figure).unwrap();
        let html = String::from_utf8(buf).unwrap();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>USGS Earthquakes, Nov 03 to Nov 14</title>"));
        assert!(html.contains("\"type\":\"scattergeo\""));
        assert!(html.contains("Plotly.newPlot"));
        // Hover line breaks survive as escaped JSON
        assert!(html.contains("a\\u003cbr>M 5.0"));
    }

    fn render(figure: &Figure, format: Format) -> String {
        let mut buf = Vec::new();
        write_figure(&mut buf, figure, format).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_default_html_renders_offline() {
        let html = render(&sample_spec().into_figure(), Format::Html);

        let external: Vec<&str> = html
            .lines()
            .filter(|line| line.contains("<script src=\"http"))
            .collect();
        assert!(external.is_empty(), "external scripts: {external:?}");
        assert!(html.len() > 1_000_000, "plotly.js bundle not inlined");
    }

    #[test]
    fn test_html_cdn_loads_plotly_remotely() {
        let html = render(&sample_spec().into_figure(), Format::HtmlCdn);

        assert!(html.contains(&format!("<script src=\"{PLOTLY_JS_URL}\"")));
        assert!(html.contains("\"type\":\"scattergeo\""));
        assert!(html.len() < 10_000);
    }

    #[test]
    fn test_write_html_cannot_close_script() {
        let mut spec = sample_spec();
        spec.title = "</script><script>alert(1)</script>".to_string();
        let hostile = spec.into_figure();

        let html = render(&hostile, Format::HtmlCdn);
        assert_eq!(html.matches("</script>").count(), 2);
        assert!(html.contains("<title>&lt;/script&gt;"));

        // Inlined bundle adds the same closing tags either way
        let baseline = render(&sample_spec().into_figure(), Format::Html);
        assert_eq!(
            render(&hostile, Format::Html).matches("</script>").count(),
            baseline.matches("</script>").count()
        );
    }

    #[test]
    fn test_write_json_round_trips_to_value() {
        let figure = sample_spec().into_figure();
        let mut buf = Vec::new();
        write_figure(&mut buf, &figure, Format::Json).unwrap();

        let parsed: Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed, serde_json::to_value(&figure).unwrap());
    }
}
