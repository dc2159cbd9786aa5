//! Slide layout composition.
//!
//! Every slide uses the same fixed geometry, expressed in inches on a 16:9
//! page with the origin at the top-left corner. The serializer converts to
//! points.
//!
//! ```text
//! +--------------------------------------------------------------+
//! | SITE CODE                                  STRUCTURE: ST-001 |
//! +--------------------------------------------------------------+
//! |  +----------------------+   SIZE          40ft x 60ft         |
//! |  |                      |   FACING        North               |
//! |  |        photo         |   ...                               |
//! |  |                      |                                     |
//! |  +----------------------+   price line or duration table      |
//! |  +---------+ +---+          inclusions table                  |
//! |  |   map   | |QR |                                            |
//! +--------------------------------------------------------------+
//! ```

use chrono::NaiveDate;

use crate::models::DeckSite;
use crate::pricing::{format_count, format_money, price_site, PricingError, SitePricing};

use super::assets::{load_or_placeholder, location_qr, ImageAsset, QrMatrix};
use super::options::DeckOptions;

pub const SLIDE_WIDTH_IN: f32 = 10.0;
pub const SLIDE_HEIGHT_IN: f32 = 5.625;
pub const POINTS_PER_INCH: f32 = 72.0;

const MARGIN: f32 = 0.4;
const HEADER: Frame = Frame::new(0.0, 0.0, SLIDE_WIDTH_IN, 0.8);
const TITLE: Frame = Frame::new(MARGIN, 0.18, 6.2, 0.45);
const SUBTITLE: Frame = Frame::new(6.6, 0.28, 3.0, 0.3);
const PHOTO: Frame = Frame::new(MARGIN, 1.0, 4.9, 3.0);
const MAP: Frame = Frame::new(MARGIN, 4.15, 2.4, 1.25);
const QR: Frame = Frame::new(3.05, 4.15, 1.25, 1.25);

const LABEL_X: f32 = 5.6;
const LABEL_W: f32 = 1.35;
const VALUE_X: f32 = LABEL_X + LABEL_W;
const VALUE_W: f32 = SLIDE_WIDTH_IN - MARGIN - VALUE_X;
const COLUMN_W: f32 = LABEL_W + VALUE_W;
const COLUMN_TOP: f32 = 1.0;
const COLUMN_BOTTOM: f32 = 5.35;
const BLOCK_GAP: f32 = 0.15;

const TITLE_PT: f32 = 22.0;
const SUBTITLE_PT: f32 = 11.0;
const LABEL_PT: f32 = 9.0;
const VALUE_PT: f32 = 10.0;
const PRICE_PT: f32 = 14.0;
const TABLE_PT: f32 = 9.0;
const TABLE_ROW_H: f32 = 0.28;
const NOTICE_PT: f32 = 12.0;

/// Helvetica averages about half an em per glyph
const AVG_GLYPH_EM: f32 = 0.5;

pub const MAX_ADDRESS_LINES: usize = 3;
pub const MAX_LANDMARKS: usize = 4;

/// Rectangle in inches, top-left origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Frame {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// Largest frame of the given aspect ratio centered inside this one
    pub fn fit(&self, aspect: f32) -> Frame {
        if aspect <= 0.0 {
            return *self;
        }
        let (w, h) = if self.w / self.h > aspect {
            (self.h * aspect, self.h)
        } else {
            (self.w, self.w / aspect)
        };
        Frame::new(self.x + (self.w - w) / 2.0, self.y + (self.h - h) / 2.0, w, h)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub u8, pub u8, pub u8);

pub const INK: Color = Color(0x1f, 0x29, 0x33);
pub const WHITE: Color = Color(0xff, 0xff, 0xff);
pub const BRAND: Color = Color(0x0b, 0x4f, 0x8a);
pub const MUTED: Color = Color(0x6b, 0x72, 0x80);
pub const RULE: Color = Color(0xc4, 0xc9, 0xd0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weight {
    Regular,
    Bold,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub frame: Frame,
    pub text: String,
    pub size_pt: f32,
    pub weight: Weight,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableBlock {
    pub frame: Frame,
    pub header: Option<Vec<String>>,
    pub rows: Vec<Vec<String>>,
    /// Fraction of the table width per column
    pub columns: Vec<f32>,
    pub size_pt: f32,
}

impl TableBlock {
    pub fn row_count(&self) -> usize {
        self.rows.len() + usize::from(self.header.is_some())
    }

    pub fn row_height(&self) -> f32 {
        self.frame.h / self.row_count().max(1) as f32
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SlideElement {
    Rect { frame: Frame, fill: Color },
    Text(TextBlock),
    Image { frame: Frame, asset: ImageAsset },
    Table(TableBlock),
    Qr { frame: Frame, matrix: QrMatrix },
}

/// How the rate is shown on a slide
#[derive(Debug, Clone, PartialEq)]
pub enum PriceDisplay {
    /// One `MONTHLY RATE` value
    Monthly(String),
    /// One row per rate-generator duration
    Tiers(Vec<(String, String)>),
    /// Site has no base price
    OnRequest,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Slide {
    pub site_code: String,
    pub availability: String,
    pub price: PriceDisplay,
    pub elements: Vec<SlideElement>,
}

impl Slide {
    /// Plain-text outline of what the slide shows
    pub fn outline(&self) -> Vec<String> {
        self.elements
            .iter()
            .filter_map(|element| match element {
                SlideElement::Text(block) => Some(vec![block.text.clone()]),
                SlideElement::Table(table) => Some(
                    table
                        .header
                        .iter()
                        .chain(table.rows.iter())
                        .map(|row| row.join(" | "))
                        .collect(),
                ),
                _ => None,
            })
            .flatten()
            .collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SlideError {
    #[error("missing required field {0}")]
    MissingField(&'static str),

    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// Compose the slide for one site
pub fn compose_slide(
    site: &DeckSite,
    options: &DeckOptions,
    apply_to_all: bool,
    today: NaiveDate,
) -> Result<Slide, SlideError> {
    let code = site.site_code().trim();
    if code.is_empty() {
        return Err(SlideError::MissingField("site_code"));
    }

    let pricing = price_site(site, &options.pricing_context(apply_to_all))?;
    let price = price_display(pricing);
    let availability = site.availability_label(today);

    let mut elements = vec![
        SlideElement::Rect {
            frame: HEADER,
            fill: BRAND,
        },
        text(TITLE, code, TITLE_PT, Weight::Bold, WHITE),
        text(
            SUBTITLE,
            &format!("STRUCTURE: {}", site.site.structure_code),
            SUBTITLE_PT,
            Weight::Regular,
            WHITE,
        ),
    ];

    push_image(&mut elements, PHOTO, site.image.as_deref(), "photo", code);
    push_image(&mut elements, MAP, site.map_image.as_deref(), "map", code);

    if let Some((lat, lng)) = site.site.coordinates() {
        match location_qr(lat, lng) {
            Ok(matrix) => elements.push(SlideElement::Qr { frame: QR, matrix }),
            Err(e) => tracing::warn!("Skipping QR code for {}: {}", code, e),
        }
    }

    // Price and inclusions are anchored to the bottom of the details column;
    // detail rows fill from the top and stop where they would collide.
    let inclusions = inclusions_table(options);
    let mut bottom = COLUMN_BOTTOM;
    if let Some(table) = inclusions {
        let height = table.len() as f32 * TABLE_ROW_H;
        bottom -= height;
        elements.push(SlideElement::Table(TableBlock {
            frame: Frame::new(LABEL_X, bottom, COLUMN_W, height),
            header: None,
            rows: table,
            columns: vec![0.5, 0.5],
            size_pt: TABLE_PT,
        }));
        bottom -= BLOCK_GAP;
    }

    let price_height = price_block_height(&price);
    bottom -= price_height;
    push_price(&mut elements, &price, bottom, price_height);

    push_details(&mut elements, &detail_rows(site, options, &availability), bottom - BLOCK_GAP);

    Ok(Slide {
        site_code: code.to_string(),
        availability,
        price,
        elements,
    })
}

fn text(frame: Frame, value: &str, size_pt: f32, weight: Weight, color: Color) -> SlideElement {
    SlideElement::Text(TextBlock {
        frame,
        text: value.to_string(),
        size_pt,
        weight,
        color,
    })
}

fn push_image(elements: &mut Vec<SlideElement>, area: Frame, url: Option<&str>, what: &str, code: &str) {
    let asset = load_or_placeholder(url, what, code);
    let placeholder = asset.placeholder;
    elements.push(SlideElement::Image {
        frame: area.fit(asset.aspect()),
        asset,
    });

    if placeholder {
        let label_h = NOTICE_PT / POINTS_PER_INCH * 1.4;
        let notice = Frame::new(area.x + 0.15, area.y + (area.h - label_h) / 2.0, area.w - 0.3, label_h);
        elements.push(text(
            notice,
            &format!("NO {} AVAILABLE", what.to_uppercase()),
            NOTICE_PT,
            Weight::Bold,
            MUTED,
        ));
    }
}

fn price_display(pricing: Option<SitePricing>) -> PriceDisplay {
    match pricing {
        None => PriceDisplay::OnRequest,
        Some(SitePricing {
            monthly,
            currency,
            tiers: None,
        }) => PriceDisplay::Monthly(format_money(monthly, &currency)),
        Some(SitePricing {
            currency,
            tiers: Some(tiers),
            ..
        }) => PriceDisplay::Tiers(
            tiers
                .iter()
                .map(|tier| {
                    (
                        format!("{} MONTHS", tier.duration_months),
                        format_money(tier.price, &currency),
                    )
                })
                .collect(),
        ),
    }
}

fn price_block_height(price: &PriceDisplay) -> f32 {
    match price {
        PriceDisplay::Tiers(rows) => (rows.len() + 1) as f32 * TABLE_ROW_H,
        _ => PRICE_PT / POINTS_PER_INCH * 1.6,
    }
}

fn push_price(elements: &mut Vec<SlideElement>, price: &PriceDisplay, top: f32, height: f32) {
    match price {
        PriceDisplay::Tiers(rows) => elements.push(SlideElement::Table(TableBlock {
            frame: Frame::new(LABEL_X, top, COLUMN_W, height),
            header: Some(vec!["DURATION".to_string(), "MONTHLY RATE".to_string()]),
            rows: rows.iter().map(|(d, p)| vec![d.clone(), p.clone()]).collect(),
            columns: vec![0.4, 0.6],
            size_pt: TABLE_PT,
        })),
        PriceDisplay::Monthly(_) | PriceDisplay::OnRequest => {
            let value = match price {
                PriceDisplay::Monthly(value) => value.as_str(),
                _ => "UPON REQUEST",
            };
            let label_offset = (PRICE_PT - LABEL_PT) / POINTS_PER_INCH;
            elements.push(text(
                Frame::new(LABEL_X, top + label_offset, LABEL_W, height - label_offset),
                "MONTHLY RATE",
                LABEL_PT,
                Weight::Bold,
                MUTED,
            ));
            elements.push(text(
                Frame::new(VALUE_X, top, VALUE_W, height),
                value,
                PRICE_PT,
                Weight::Bold,
                BRAND,
            ));
        }
    }
}

fn inclusions_table(options: &DeckOptions) -> Option<Vec<Vec<String>>> {
    let display = &options.display;
    if !display.has_inclusions() {
        return None;
    }
    let mut rows = Vec::new();
    if display.material_inclusion {
        rows.push(vec!["PRINTING MATERIAL".to_string(), "INCLUDED".to_string()]);
    }
    if display.installation_inclusion {
        rows.push(vec!["INSTALLATION".to_string(), "INCLUDED".to_string()]);
    }
    Some(rows)
}

/// Label/value pairs of the details column, values already wrapped
fn detail_rows(site: &DeckSite, options: &DeckOptions, availability: &str) -> Vec<(&'static str, Vec<String>)> {
    let dash = || "-".to_string();
    let s = &site.site;

    let mut rows = vec![
        ("SIZE", s.size.clone().unwrap_or_else(dash)),
        ("FACING", s.facing.clone().unwrap_or_else(dash)),
        ("BOUND", s.bound.clone().unwrap_or_else(dash)),
        ("TRAFFIC COUNT", s.traffic_count.map(format_count).unwrap_or_else(dash)),
        ("POPULATION", s.population.map(format_count).unwrap_or_else(dash)),
        ("ADDRESS", if s.address.trim().is_empty() { dash() } else { s.address.clone() }),
        ("AVAILABILITY", availability.to_string()),
    ]
    .into_iter()
    .map(|(label, value)| {
        let mut lines = wrap_text(&value, VALUE_W, VALUE_PT);
        if label == "ADDRESS" {
            truncate_lines(&mut lines, MAX_ADDRESS_LINES);
        }
        (label, lines)
    })
    .collect::<Vec<_>>();

    if options.display.landmarks && !site.landmarks.is_empty() {
        let lines = site
            .landmarks
            .iter()
            .take(MAX_LANDMARKS)
            .flat_map(|landmark| wrap_text(landmark, VALUE_W, VALUE_PT))
            .collect();
        rows.push(("LANDMARKS", lines));
    }

    rows
}

fn push_details(elements: &mut Vec<SlideElement>, rows: &[(&'static str, Vec<String>)], limit: f32) {
    let line_h = line_height(VALUE_PT);
    let mut y = COLUMN_TOP;

    'rows: for (label, lines) in rows {
        if y + line_h > limit {
            break;
        }
        let offset = (VALUE_PT - LABEL_PT) / POINTS_PER_INCH;
        elements.push(text(
            Frame::new(LABEL_X, y + offset, LABEL_W, line_h - offset),
            label,
            LABEL_PT,
            Weight::Bold,
            MUTED,
        ));
        for line in lines {
            if y + line_h > limit {
                break 'rows;
            }
            elements.push(text(Frame::new(VALUE_X, y, VALUE_W, line_h), line, VALUE_PT, Weight::Regular, INK));
            y += line_h;
        }
        y += line_h * 0.25;
    }
}

/// Line height in inches for a font size
pub fn line_height(size_pt: f32) -> f32 {
    size_pt * 1.25 / POINTS_PER_INCH
}

/// Greedy word wrap by estimated glyph width.
///
/// Words longer than a line are split.
pub fn wrap_text(value: &str, width_in: f32, size_pt: f32) -> Vec<String> {
    let max_chars = ((width_in * POINTS_PER_INCH) / (size_pt * AVG_GLYPH_EM)).floor().max(1.0) as usize;
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in value.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }

        let word: String = word.into_iter().collect();
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn truncate_lines(lines: &mut Vec<String>, max: usize) {
    if lines.len() > max {
        lines.truncate(max);
        if let Some(last) = lines.last_mut() {
            last.push_str("...");
        }
    }
}
