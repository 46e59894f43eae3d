//! Appearance streams for filled widgets

use lopdf::{dictionary, Dictionary, Object, Stream};

/// Font size used when `/DA` asks for auto-sizing (`0 Tf`) and the box is tall
const MAX_AUTO_FONT_SIZE: f64 = 12.0;
const MIN_FONT_SIZE: f64 = 4.0;
/// Inner padding between the widget border and its text
const PADDING: f64 = 2.0;

/// Helvetica advance widths for ASCII 32..=126, in 1/1000 em
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A-M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N-Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a-m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n-z
    334, 260, 334, 584, // {..~
];

/// Horizontal alignment from a field's `/Q`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl Alignment {
    pub fn from_q(q: i64) -> Self {
        match q {
            1 => Alignment::Center,
            2 => Alignment::Right,
            _ => Alignment::Left,
        }
    }
}

/// Escape special characters for PDF string literals
pub fn escape_pdf_string(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '(' => "\\(".to_string(),
            ')' => "\\)".to_string(),
            '\\' => "\\\\".to_string(),
            '\r' | '\n' => " ".to_string(),
            _ if c.is_ascii() => c.to_string(),
            _ => "?".to_string(),
        })
        .collect()
}

/// Width of `text` set in Helvetica at `font_size`
pub fn text_width(text: &str, font_size: f64) -> f64 {
    let units: u32 = text
        .chars()
        .map(|c| {
            let code = c as u32;
            if (32..=126).contains(&code) {
                u32::from(HELVETICA_WIDTHS[(code - 32) as usize])
            } else {
                // rendered as '?'
                556
            }
        })
        .sum();
    f64::from(units) * font_size / 1000.0
}

/// Font size named by a `/DA` string (`/Helv 10 Tf 0 g`); 0 means auto
pub fn da_font_size(da: &str) -> Option<f64> {
    let tokens: Vec<&str> = da.split_whitespace().collect();
    let tf = tokens.iter().position(|t| *t == "Tf")?;
    tokens.get(tf.checked_sub(1)?)?.parse().ok()
}

/// Pick the font size for a single-line value in a `width` x `height` box
pub fn resolve_font_size(requested: Option<f64>, text: &str, width: f64, height: f64) -> f64 {
    match requested {
        Some(size) if size > 0.0 => size,
        _ => {
            let by_height = ((height - 2.0 * PADDING) * 0.8).min(MAX_AUTO_FONT_SIZE);
            let natural = text_width(text, 1.0);
            let by_width = if natural > 0.0 {
                (width - 2.0 * PADDING) / natural
            } else {
                by_height
            };
            by_height.min(by_width).max(MIN_FONT_SIZE)
        }
    }
}

fn form_xobject(width: f64, height: f64, resources: Option<Dictionary>, content: String) -> Stream {
    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Form",
        "BBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(width as f32),
            Object::Real(height as f32),
        ],
    };
    if let Some(resources) = resources {
        dict.set("Resources", resources);
    }
    Stream::new(dict, content.into_bytes())
}

/// Single-line text appearance
pub fn text_appearance(
    width: f64,
    height: f64,
    text: &str,
    font_size: Option<f64>,
    alignment: Alignment,
) -> Stream {
    let fs = resolve_font_size(font_size, text, width, height);
    let escaped = escape_pdf_string(text);
    let tw = text_width(text, fs);
    let x = match alignment {
        Alignment::Left => PADDING,
        Alignment::Center => ((width - tw) / 2.0).max(PADDING),
        Alignment::Right => (width - PADDING - tw).max(PADDING),
    };
    // Baseline roughly centers Helvetica cap height in the box
    let y = ((height - fs * 0.7) / 2.0).max(1.0);

    let content = format!(
        "/Tx BMC\n\
q\n\
{pad} {pad} {cw} {ch} re W n\n\
BT\n\
/Helv {fs:.2} Tf\n\
0 g\n\
{x:.2} {y:.2} Td\n\
({text}) Tj\n\
ET\n\
Q\n\
EMC",
        pad = PADDING / 2.0,
        cw = (width - PADDING).max(0.0),
        ch = (height - PADDING).max(0.0),
        fs = fs,
        x = x,
        y = y,
        text = escaped,
    );

    let resources = dictionary! {
        "Font" => dictionary! {
            "Helv" => dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica",
                "Encoding" => "WinAnsiEncoding",
            },
        },
    };
    form_xobject(width, height, Some(resources), content)
}

/// Checkbox appearance; the on-state draws a check mark
pub fn checkbox_appearance(width: f64, height: f64, checked: bool) -> Stream {
    let size = width.min(height);
    let content = if checked {
        format!(
            "q\n\
0 G\n\
{lw:.2} w\n\
{x1:.2} {y1:.2} m\n\
{x2:.2} {y2:.2} l\n\
{x3:.2} {y3:.2} l\n\
S\n\
Q",
            lw = (size * 0.1).max(0.5),
            x1 = size * 0.2,
            y1 = size * 0.5,
            x2 = size * 0.4,
            y2 = size * 0.25,
            x3 = size * 0.8,
            y3 = size * 0.8,
        )
    } else {
        String::new()
    };
    form_xobject(width, height, None, content)
}
