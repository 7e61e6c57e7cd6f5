//! Placing a logo in the centre of rendered markup.
//!
//! The markup is parsed into a small [SvgDocument]: everything up to and including the root
//! start tag, the declared [ViewBox], the original children, and whatever is appended. The
//! original children are never touched. Three fragments are appended before `</svg>`:
//!
//! 1. a `<clipPath>` holding a circle of the logo's radius,
//! 2. a white disk slightly larger than the logo, hiding the modules underneath,
//! 3. the logo `<image>`, clipped to the circle.
//!
//! Logo geometry is given in raster pixels and converted into view box units with
//! `viewBox width / pixel_size` before being written.

use core::fmt;

use crate::config::Logo;
use crate::error::CompositingError;

/// Extra white ring around the logo, in raster pixels.
pub const LOGO_PADDING_PX: f64 = 2.0;

const LOGO_BACKGROUND: &str = "#FFFFFF";

/// The abstract coordinate rectangle declared by an `<svg>` root.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewBox {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewBox {
    /// Parse the four numbers of a `viewBox` attribute, separated by whitespace and/or commas.
    ///
    /// # Errors
    ///
    /// Will return [CompositingError::InvalidViewBox] unless there are exactly four numbers
    /// and both width and height are positive
    pub fn parse(value: &str) -> Result<ViewBox, CompositingError> {
        let invalid = || CompositingError::InvalidViewBox(value.to_string());
        let numbers = value
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|part| !part.is_empty())
            .map(|part| part.parse::<f64>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;
        match numbers[..] {
            [min_x, min_y, width, height]
                if width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite() =>
            {
                Ok(ViewBox {
                    min_x,
                    min_y,
                    width,
                    height,
                })
            }
            _ => Err(invalid()),
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (
            self.min_x + self.width / 2.0,
            self.min_y + self.height / 2.0,
        )
    }
}

impl fmt::Display for ViewBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            number(self.min_x),
            number(self.min_y),
            number(self.width),
            number(self.height)
        )
    }
}

/// An SVG fragment to append to a document.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    name: &'static str,
    attributes: Vec<(&'static str, String)>,
    children: Vec<Element>,
}

impl Element {
    pub fn new(name: &'static str) -> Element {
        Element {
            name,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: &'static str, value: impl fmt::Display) -> Element {
        self.attributes.push((name, value.to_string()));
        self
    }

    pub fn child(mut self, child: Element) -> Element {
        self.children.push(child);
        self
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.name)?;
        for (name, value) in &self.attributes {
            write!(f, " {}=\"{}\"", name, escape_attribute(value))?;
        }
        if self.children.is_empty() {
            return f.write_str("/>");
        }
        f.write_str(">")?;
        for child in &self.children {
            write!(f, "{}", child)?;
        }
        write!(f, "</{}>", self.name)
    }
}

/// Parsed vector markup, ready for fragments to be appended.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgDocument {
    /// Declaration, doctype, comments: everything before the root element
    prolog: String,
    /// The root start tag, verbatim
    root: String,
    pub view_box: ViewBox,
    /// Original children, verbatim
    body: String,
    /// The closing tag and anything after it
    epilog: String,
    appended: Vec<Element>,
}

impl SvgDocument {
    /// Split `markup` around its `<svg>` root.
    ///
    /// # Errors
    ///
    /// Will return an error when there is no `<svg>` root, when it's self-closing or never
    /// closed, or when it doesn't declare a usable `viewBox`
    pub fn parse(markup: &str) -> Result<SvgDocument, CompositingError> {
        let start = find_root(markup).ok_or(CompositingError::MissingRoot)?;
        let tag_end = start_tag_end(markup, start).ok_or(CompositingError::MissingRoot)?;
        let root = &markup[start..tag_end];
        if root.ends_with("/>") {
            return Err(CompositingError::MissingClosingTag);
        }

        let view_box = attribute(root, "viewBox").ok_or(CompositingError::MissingViewBox)?;
        let view_box = ViewBox::parse(&view_box)?;

        let close = markup[tag_end..]
            .rfind("</svg")
            .map(|i| tag_end + i)
            .ok_or(CompositingError::MissingClosingTag)?;

        Ok(SvgDocument {
            prolog: markup[..start].to_string(),
            root: root.to_string(),
            view_box,
            body: markup[tag_end..close].to_string(),
            epilog: markup[close..].to_string(),
            appended: Vec::new(),
        })
    }

    /// Append `element` after every existing child.
    pub fn push(&mut self, element: Element) {
        self.appended.push(element);
    }
}

impl fmt::Display for SvgDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prolog)?;
        f.write_str(&self.root)?;
        f.write_str(&self.body)?;
        for element in &self.appended {
            writeln!(f, "{}", element)?;
        }
        f.write_str(&self.epilog)
    }
}

/// Where the logo goes, in view box units.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LogoPlacement {
    pub cx: f64,
    pub cy: f64,
    /// Side of the logo image, and diameter of its clip circle
    pub size: f64,
    /// Radius of the white disk behind the logo
    pub backdrop_radius: f64,
}

impl LogoPlacement {
    /// Centre a logo of `display_size` raster pixels in `view_box`, for a raster of `pixel_size`.
    ///
    /// # Errors
    ///
    /// Will return [CompositingError::ZeroPixelSize] if `pixel_size` is 0
    pub fn compute(
        view_box: &ViewBox,
        display_size: u32,
        pixel_size: u32,
    ) -> Result<LogoPlacement, CompositingError> {
        if pixel_size == 0 {
            return Err(CompositingError::ZeroPixelSize);
        }
        let scale = view_box.width / f64::from(pixel_size);
        let size = f64::from(display_size) * scale;
        let (cx, cy) = view_box.center();
        Ok(LogoPlacement {
            cx,
            cy,
            size,
            backdrop_radius: size / 2.0 + LOGO_PADDING_PX * scale,
        })
    }

    pub fn radius(&self) -> f64 {
        self.size / 2.0
    }

    /// Top left corner of the logo image.
    pub fn origin(&self) -> (f64, f64) {
        (self.cx - self.radius(), self.cy - self.radius())
    }
}

/// Place `logo` in the centre of `markup`, or hand `markup` back unchanged if that isn't possible.
///
/// This never fails: anything [try_composite_logo] rejects is logged and the logo is skipped.
pub fn composite_logo(markup: &str, logo: &Logo, pixel_size: u32) -> String {
    match try_composite_logo(markup, logo, pixel_size) {
        Ok(svg) => svg,
        Err(e) => {
            log::warn!("skipping logo: {}", e);
            markup.to_string()
        }
    }
}

/// Place `logo` in the centre of `markup`.
///
/// # Errors
///
/// Will return a [CompositingError] when the markup lacks an `<svg>` root, a closing tag or a
/// `viewBox`, or when the logo can't be embedded.
pub fn try_composite_logo(
    markup: &str,
    logo: &Logo,
    pixel_size: u32,
) -> Result<String, CompositingError> {
    let mut document = SvgDocument::parse(markup)?;
    let href = logo.source.to_href()?;
    let placement = LogoPlacement::compute(&document.view_box, logo.display_size, pixel_size)?;
    let clip_id = clip_path_id();
    log::debug!(
        "logo of {}px on {}px -> {} units at ({}, {}) in viewBox {}",
        logo.display_size,
        pixel_size,
        number(placement.size),
        number(placement.cx),
        number(placement.cy),
        document.view_box
    );

    let (x, y) = placement.origin();
    document.push(
        Element::new("defs").child(
            Element::new("clipPath").attr("id", &clip_id).child(
                Element::new("circle")
                    .attr("cx", number(placement.cx))
                    .attr("cy", number(placement.cy))
                    .attr("r", number(placement.radius())),
            ),
        ),
    );
    document.push(
        Element::new("circle")
            .attr("cx", number(placement.cx))
            .attr("cy", number(placement.cy))
            .attr("r", number(placement.backdrop_radius))
            .attr("fill", LOGO_BACKGROUND),
    );
    document.push(
        Element::new("image")
            .attr("x", number(x))
            .attr("y", number(y))
            .attr("width", number(placement.size))
            .attr("height", number(placement.size))
            .attr("preserveAspectRatio", "xMidYMid slice")
            .attr("href", href)
            .attr("clip-path", format!("url(#{})", clip_id)),
    );
    Ok(document.to_string())
}

/// A fresh id, so several symbols can share a page without their clip paths colliding.
fn clip_path_id() -> String {
    format!("qr-logo-clip-{}", crate::random_base36(9))
}

/// Start of the first `<svg` tag outside comments and CDATA sections.
fn find_root(markup: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(i) = markup[from..].find('<') {
        let start = from + i;
        let rest = &markup[start..];
        if rest.starts_with("<!--") {
            from = start + 4 + rest[4..].find("-->")? + 3;
        } else if rest.starts_with("<![CDATA[") {
            from = start + 9 + rest[9..].find("]]>")? + 3;
        } else if let Some(after) = rest.strip_prefix("<svg") {
            match after.chars().next() {
                Some(c) if c.is_whitespace() || c == '>' || c == '/' => return Some(start),
                _ => from = start + 4,
            }
        } else {
            from = start + 1;
        }
    }
    None
}

/// Index just past the `>` closing the tag opened at `start`, skipping quoted values.
fn start_tag_end(markup: &str, start: usize) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in markup[start..].char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '>') => return Some(start + i + 1),
            (None, _) => {}
        }
    }
    None
}

/// Value of attribute `name` in a start tag.
fn attribute(tag: &str, name: &str) -> Option<String> {
    let mut rest = tag;
    while let Some(i) = rest.find(name) {
        let preceded_by_space = rest[..i]
            .chars()
            .next_back()
            .is_some_and(char::is_whitespace);
        let after = rest[i + name.len()..].trim_start();
        if preceded_by_space {
            if let Some(value) = after.strip_prefix('=') {
                let value = value.trim_start();
                let quote = value.chars().next()?;
                if quote == '"' || quote == '\'' {
                    let end = value[1..].find(quote)?;
                    return Some(value[1..1 + end].to_string());
                }
            }
        }
        rest = &rest[i + name.len()..];
    }
    None
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Short decimal form: at most 4 decimals, no trailing zeros.
fn number(value: f64) -> String {
    let formatted = format!("{:.4}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}
