//! PDF catalog rendering
//!
//! A title page followed by either a 3x3 image grid (when any card has an
//! image) or a paginated table.

use crate::cache::ImageCache;
use crate::collection::Collection;
use crate::config::StoreConfig;
use crate::error::Result;
use crate::models::{format_cents, SaleableCard};
use chrono::Local;
use printpdf::image_crate::GenericImageView;
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Point, Rgb,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const PAGE_WIDTH: f32 = 215.9;
const PAGE_HEIGHT: f32 = 279.4;
const MARGIN: f32 = 12.7;

const GRID_COLUMNS: usize = 3;
const GRID_ROWS: usize = 3;
pub const CARDS_PER_PAGE: usize = GRID_COLUMNS * GRID_ROWS;

const CARD_IMAGE_WIDTH: f32 = 38.1;
const CARD_IMAGE_HEIGHT: f32 = 53.3;
const IMAGE_DPI: f32 = 300.0;

const TABLE_ROW_HEIGHT: f32 = 7.0;
const SET_NAME_MAX: usize = 30;

const RED: (f32, f32, f32) = (0.827, 0.184, 0.184);
const GREEN: (f32, f32, f32) = (0.180, 0.490, 0.196);
const GREY: (f32, f32, f32) = (0.459, 0.459, 0.459);
const DARK: (f32, f32, f32) = (0.129, 0.129, 0.129);
const RULE: (f32, f32, f32) = (0.741, 0.741, 0.741);
const PINK: (f32, f32, f32) = (0.882, 0.188, 0.424);

/// What to show in the catalog
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub title: String,
    pub include_stats: bool,
    pub show_prices: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            title: StoreConfig::default().catalog_title,
            include_stats: true,
            show_prices: false,
        }
    }
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
}

/// Renders the sale catalog
pub struct CatalogRenderer<'a> {
    config: &'a StoreConfig,
    logo: Option<PathBuf>,
    images: Option<&'a ImageCache>,
}

impl<'a> CatalogRenderer<'a> {
    pub fn new(config: &'a StoreConfig, images: Option<&'a ImageCache>) -> Self {
        Self {
            config,
            logo: None,
            images,
        }
    }

    /// Draw this image at the top of the title page
    pub fn with_logo(mut self, logo: PathBuf) -> Self {
        self.logo = Some(logo);
        self
    }

    /// Write the catalog to `output`. Returns non-fatal warnings.
    pub async fn render(
        &self,
        collection: &Collection,
        saleable: &[SaleableCard],
        options: &RenderOptions,
        output: &Path,
    ) -> Result<Vec<String>> {
        let mut warnings = Vec::new();
        let image_paths = self.fetch_images(saleable, &mut warnings).await;

        log::info!(
            "Generating catalog for {} of {} cards",
            saleable.len(),
            collection.total_unique_cards()
        );

        let (doc, page, layer) =
            PdfDocument::new(&options.title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let fonts = Fonts {
            regular: doc.add_builtin_font(BuiltinFont::Helvetica)?,
            bold: doc.add_builtin_font(BuiltinFont::HelveticaBold)?,
            italic: doc.add_builtin_font(BuiltinFont::HelveticaOblique)?,
        };

        let title_layer = doc.get_page(page).get_layer(layer);
        self.draw_title_page(&title_layer, &fonts, saleable, options, &mut warnings);

        if saleable.is_empty() {
            warnings.push("No cards to include in the catalog".to_string());
        } else if image_paths.is_empty() {
            self.draw_table(&doc, &fonts, saleable, options);
        } else {
            self.draw_grid(&doc, &fonts, saleable, options, &image_paths, &mut warnings);
        }

        doc.save(&mut std::io::BufWriter::new(std::fs::File::create(output)?))?;
        log::info!("PDF generated: {}", output.display());
        Ok(warnings)
    }

    async fn fetch_images(
        &self,
        saleable: &[SaleableCard],
        warnings: &mut Vec<String>,
    ) -> HashMap<String, PathBuf> {
        let mut paths = HashMap::new();
        let Some(cache) = self.images else {
            return paths;
        };
        for sc in saleable {
            let Some(url) = sc.card.image_url.as_deref() else {
                continue;
            };
            match cache.get_image(url, &sc.card.id).await {
                Some(path) => {
                    paths.insert(sc.card.id.clone(), path);
                }
                None => warnings.push(format!(
                    "Could not download image for {}",
                    sc.card.product_name
                )),
            }
        }
        paths
    }

    fn draw_title_page(
        &self,
        layer: &PdfLayerReference,
        fonts: &Fonts,
        saleable: &[SaleableCard],
        options: &RenderOptions,
        warnings: &mut Vec<String>,
    ) {
        let mut y = PAGE_HEIGHT - 2.0 * MARGIN;

        if let Some(logo) = self.logo.as_deref().filter(|p| p.exists()) {
            let size = 63.5;
            match load_image(logo) {
                Ok((image, width, height)) => {
                    y -= size;
                    let x = (PAGE_WIDTH - size) / 2.0;
                    place_image(layer, image, width, height, x, y, size, size);
                    y -= 8.0;
                }
                Err(e) => warnings.push(format!("Could not load logo: {e}")),
            }
        }

        set_fill(layer, RED);
        centered_text(layer, &options.title, 28.0, y, &fonts.bold);
        y -= 12.0;

        set_fill(layer, GREY);
        centered_text(layer, "Pokemon TCG Cards Available", 14.0, y, &fonts.italic);
        y -= 20.0;

        let units: u64 = saleable.iter().map(|sc| sc.quantity_for_sale as u64).sum();
        let summary = [
            ("Unique cards available", saleable.len().to_string()),
            ("Total units in stock", units.to_string()),
            (
                "Catalog updated",
                Local::now().format("%d/%m/%Y").to_string(),
            ),
        ];
        let box_left = 38.0;
        let box_right = PAGE_WIDTH - 38.0;
        set_outline(layer, RED, 1.5);
        hline(layer, box_left, box_right, y + 7.0);
        for (label, value) in &summary {
            set_fill(layer, RED);
            layer.use_text(*label, 12.0, Mm(box_left + 4.0), Mm(y), &fonts.bold);
            layer.use_text(value.as_str(), 12.0, Mm(box_right - 40.0), Mm(y), &fonts.bold);
            y -= 10.0;
            hline(layer, box_left, box_right, y + 7.0);
        }
        y -= 12.0;

        set_fill(layer, DARK);
        centered_text(layer, &self.config.welcome_message, 11.0, y, &fonts.regular);
        y -= 8.0;
        set_fill(layer, RED);
        centered_text(layer, &self.config.contact_message, 10.0, y, &fonts.bold);
        y -= 14.0;

        set_fill(layer, PINK);
        for network in &self.config.social_networks {
            let line = format!("Follow us on {}: {}", network.platform, network.handle);
            centered_text(layer, &line, 13.0, y, &fonts.bold);
            y -= 8.0;
        }

        set_fill(layer, GREY);
        let author = format!("Created by {}", self.config.store_name);
        centered_text(layer, &author, 9.0, MARGIN + 10.0, &fonts.italic);
    }

    fn draw_grid(
        &self,
        doc: &PdfDocumentReference,
        fonts: &Fonts,
        saleable: &[SaleableCard],
        options: &RenderOptions,
        image_paths: &HashMap<String, PathBuf>,
        warnings: &mut Vec<String>,
    ) {
        let cell_width = (PAGE_WIDTH - 2.0 * MARGIN) / GRID_COLUMNS as f32;
        let cell_height = (PAGE_HEIGHT - 2.0 * MARGIN) / GRID_ROWS as f32;

        for (page_no, page_cards) in saleable.chunks(CARDS_PER_PAGE).enumerate() {
            let (page, layer) = doc.add_page(
                Mm(PAGE_WIDTH),
                Mm(PAGE_HEIGHT),
                format!("Cards {}", page_no + 1),
            );
            let layer = doc.get_page(page).get_layer(layer);

            set_outline(&layer, RULE, 0.5);
            for row in 0..=GRID_ROWS {
                let y = MARGIN + row as f32 * cell_height;
                hline(&layer, MARGIN, PAGE_WIDTH - MARGIN, y);
            }
            for col in 0..=GRID_COLUMNS {
                let x = MARGIN + col as f32 * cell_width;
                vline(&layer, x, MARGIN, PAGE_HEIGHT - MARGIN);
            }

            for (idx, sc) in page_cards.iter().enumerate() {
                let left = MARGIN + (idx % GRID_COLUMNS) as f32 * cell_width;
                let top = PAGE_HEIGHT - MARGIN - (idx / GRID_COLUMNS) as f32 * cell_height;
                self.draw_cell(
                    &layer,
                    fonts,
                    sc,
                    options,
                    image_paths,
                    left,
                    top,
                    cell_width,
                    warnings,
                );
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_cell(
        &self,
        layer: &PdfLayerReference,
        fonts: &Fonts,
        sc: &SaleableCard,
        options: &RenderOptions,
        image_paths: &HashMap<String, PathBuf>,
        left: f32,
        top: f32,
        width: f32,
        warnings: &mut Vec<String>,
    ) {
        let card = &sc.card;
        let center = left + width / 2.0;
        let mut y = top - 3.0 - CARD_IMAGE_HEIGHT;

        if let Some(path) = image_paths.get(&card.id) {
            match load_image(path) {
                Ok((image, w, h)) => place_image(
                    layer,
                    image,
                    w,
                    h,
                    center - CARD_IMAGE_WIDTH / 2.0,
                    y,
                    CARD_IMAGE_WIDTH,
                    CARD_IMAGE_HEIGHT,
                ),
                Err(e) => warnings.push(format!(
                    "Error loading image for {}: {}",
                    card.product_name, e
                )),
            }
        }

        let max_chars = (width / 1.6) as usize;
        y -= 4.5;
        let mut name = card.card_name().to_string();
        if !card.card_number().is_empty() {
            name.push_str(&format!(" #{}", card.card_number()));
        }
        set_fill(layer, DARK);
        text_at(layer, &truncate(&name, max_chars), 8.0, center, y, &fonts.bold);

        y -= 3.8;
        set_fill(layer, GREY);
        text_at(layer, &truncate(&card.set_name, max_chars + 6), 7.0, center, y, &fonts.italic);

        y -= 3.8;
        let available = if sc.quantity_for_sale > 1 {
            format!("Available: {}", sc.quantity_for_sale)
        } else {
            "Available: 1".to_string()
        };
        text_at(layer, &available, 7.0, center, y, &fonts.bold);

        if options.show_prices {
            y -= 4.2;
            let mut price = format_cents(card.price_cents());
            if sc.quantity_for_sale > 1 {
                price.push_str(&format!(
                    " x {} = {}",
                    sc.quantity_for_sale,
                    format_cents(sc.total_value_cents())
                ));
            }
            set_fill(layer, GREEN);
            text_at(layer, &price, 9.0, center, y, &fonts.bold);
        }

        if options.include_stats {
            if let Some(summary) = card.stats.as_ref().and_then(|s| s.summary()) {
                y -= 3.6;
                set_fill(layer, GREY);
                text_at(layer, &truncate(&summary, max_chars + 12), 6.0, center, y, &fonts.regular);
            }
        }
    }

    fn draw_table(
        &self,
        doc: &PdfDocumentReference,
        fonts: &Fonts,
        saleable: &[SaleableCard],
        options: &RenderOptions,
    ) {
        let columns: &[(&str, f32)] = if options.show_prices {
            &[
                ("#", MARGIN),
                ("Card", MARGIN + 10.0),
                ("Set", MARGIN + 73.0),
                ("Qty", MARGIN + 119.0),
                ("Price", MARGIN + 139.0),
                ("Total", MARGIN + 162.0),
            ]
        } else {
            &[
                ("#", MARGIN),
                ("Card", MARGIN + 10.0),
                ("Set", MARGIN + 91.0),
                ("Available", MARGIN + 160.0),
            ]
        };

        let usable = PAGE_HEIGHT - 2.0 * MARGIN - 2.0 * TABLE_ROW_HEIGHT;
        let rows_per_page = (usable / TABLE_ROW_HEIGHT) as usize;
        let chunks: Vec<&[SaleableCard]> = saleable.chunks(rows_per_page).collect();
        let mut index = 0;

        for (page_no, rows) in chunks.iter().enumerate() {
            let (page, layer) = doc.add_page(
                Mm(PAGE_WIDTH),
                Mm(PAGE_HEIGHT),
                format!("Table {}", page_no + 1),
            );
            let layer = doc.get_page(page).get_layer(layer);
            let mut y = PAGE_HEIGHT - MARGIN - TABLE_ROW_HEIGHT;

            set_fill(&layer, RED);
            for (header, x) in columns {
                layer.use_text(*header, 11.0, Mm(*x), Mm(y), &fonts.bold);
            }
            set_outline(&layer, RED, 1.5);
            hline(&layer, MARGIN, PAGE_WIDTH - MARGIN, y - 2.5);
            set_outline(&layer, RULE, 0.5);

            for sc in rows.iter() {
                index += 1;
                y -= TABLE_ROW_HEIGHT;
                let card = &sc.card;
                let mut name = card.card_name().to_string();
                if !card.card_number().is_empty() {
                    name.push_str(&format!(" #{}", card.card_number()));
                }
                let mut cells = vec![
                    index.to_string(),
                    truncate(&name, 40),
                    truncate(&card.set_name, SET_NAME_MAX),
                    sc.quantity_for_sale.to_string(),
                ];
                if options.show_prices {
                    cells.push(format_cents(card.price_cents()));
                    cells.push(format_cents(sc.total_value_cents()));
                }

                set_fill(&layer, DARK);
                for (cell, (_, x)) in cells.iter().zip(columns.iter()) {
                    layer.use_text(cell.as_str(), 9.0, Mm(*x), Mm(y), &fonts.regular);
                }
                hline(&layer, MARGIN, PAGE_WIDTH - MARGIN, y - 2.5);
            }

            let last_page = page_no + 1 == chunks.len();
            if last_page && !options.show_prices {
                self.draw_table_footer(doc, &layer, fonts, y);
            }
        }
    }

    /// Contact note under the table, on a new page when the last one is full
    fn draw_table_footer(
        &self,
        doc: &PdfDocumentReference,
        layer: &PdfLayerReference,
        fonts: &Fonts,
        last_row_y: f32,
    ) {
        let needed = 30.0;
        let (layer, top) = if last_row_y - needed < MARGIN {
            let (page, new_layer) =
                doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Footer");
            (doc.get_page(page).get_layer(new_layer), PAGE_HEIGHT - MARGIN)
        } else {
            (layer.clone(), last_row_y - 10.0)
        };

        set_outline(&layer, RED, 1.5);
        let (left, right, bottom) = (MARGIN + 12.0, PAGE_WIDTH - MARGIN - 12.0, top - 22.0);
        layer.add_line(Line {
            points: vec![
                (Point::new(Mm(left), Mm(top)), false),
                (Point::new(Mm(right), Mm(top)), false),
                (Point::new(Mm(right), Mm(bottom)), false),
                (Point::new(Mm(left), Mm(bottom)), false),
            ],
            is_closed: true,
        });

        set_fill(&layer, RED);
        centered_text(&layer, "Interested in a card?", 10.0, top - 8.0, &fonts.bold);
        centered_text(&layer, &self.config.contact_message, 10.0, top - 15.0, &fonts.regular);
    }
}

fn load_image(path: &Path) -> std::result::Result<(Image, u32, u32), String> {
    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
    let decoded = printpdf::image_crate::load_from_memory(&bytes).map_err(|e| e.to_string())?;
    let (width, height) = decoded.dimensions();
    Ok((Image::from_dynamic_image(&decoded), width, height))
}

/// Scale an image into the box with lower-left corner (x, y)
#[allow(clippy::too_many_arguments)]
fn place_image(
    layer: &PdfLayerReference,
    image: Image,
    px_width: u32,
    px_height: u32,
    x: f32,
    y: f32,
    box_width: f32,
    box_height: f32,
) {
    let natural_width = px_width.max(1) as f32 / IMAGE_DPI * 25.4;
    let natural_height = px_height.max(1) as f32 / IMAGE_DPI * 25.4;
    image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(x)),
            translate_y: Some(Mm(y)),
            scale_x: Some(box_width / natural_width),
            scale_y: Some(box_height / natural_height),
            dpi: Some(IMAGE_DPI),
            ..Default::default()
        },
    );
}

fn set_fill(layer: &PdfLayerReference, (r, g, b): (f32, f32, f32)) {
    layer.set_fill_color(Color::Rgb(Rgb::new(r, g, b, None)));
}

fn set_outline(layer: &PdfLayerReference, (r, g, b): (f32, f32, f32), thickness: f32) {
    layer.set_outline_color(Color::Rgb(Rgb::new(r, g, b, None)));
    layer.set_outline_thickness(thickness);
}

fn hline(layer: &PdfLayerReference, x1: f32, x2: f32, y: f32) {
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(x1), Mm(y)), false),
            (Point::new(Mm(x2), Mm(y)), false),
        ],
        is_closed: false,
    });
}

fn vline(layer: &PdfLayerReference, x: f32, y1: f32, y2: f32) {
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(x), Mm(y1)), false),
            (Point::new(Mm(x), Mm(y2)), false),
        ],
        is_closed: false,
    });
}

/// Approximate Helvetica text width in mm
fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.5 * 0.3528
}

fn text_at(layer: &PdfLayerReference, text: &str, size: f32, center: f32, y: f32, font: &IndirectFontRef) {
    let x = center - text_width(text, size) / 2.0;
    layer.use_text(text, size, Mm(x), Mm(y), font);
}

fn centered_text(layer: &PdfLayerReference, text: &str, size: f32, y: f32, font: &IndirectFontRef) {
    text_at(layer, text, size, PAGE_WIDTH / 2.0, y, font);
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
