//! PDF receipt rendering
//!
//! Builds a printable A4 receipt straight from an [`Order`]: branding
//! header, order meta, an item table, the subtotal/discount/total block
//! and a footer note. The renderer is a pure function of the order and
//! the branding config. It embeds no timestamps, ids or randomness of its
//! own, so the same order always renders to byte-identical output and
//! responses can be cached or diffed.
//!
//! Text is drawn with the viewer-built-in Helvetica faces; see
//! [`metrics`] for how centering and right-alignment are measured.
//! Characters outside printable ASCII are flattened to `?`, and item
//! names too wide for their column are truncated with an ellipsis rather
//! than wrapped.

mod metrics;

use crate::config::BrandingConfig;
use crate::core::order::Order;
use chrono::SecondsFormat;
use metrics::FontFace;
use pdf_writer::{Content, Finish, Pdf, Rect, Ref};

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 40.0;
const RULE_RIGHT: f32 = 555.0;

const COL_ITEM_X: f32 = 40.0;
const COL_QTY_RIGHT: f32 = 370.0;
const COL_PRICE_RIGHT: f32 = 500.0;
const ITEM_NAME_MAX_WIDTH: f32 = 265.0;

const TOTALS_LABEL_RIGHT: f32 = 470.0;
const TOTALS_VALUE_RIGHT: f32 = RULE_RIGHT;

const BODY_SIZE: f32 = 10.0;
const ROW_ADVANCE: f32 = 15.0;
/// Minimum space an item row needs before we spill to the next page.
const ROW_RESERVE: f32 = 30.0;
/// Space the closing rule, totals block and footer need together.
const TOTALS_RESERVE: f32 = 120.0;

pub fn format_rs(amount: i64) -> String {
    format!("Rs {amount}")
}

pub struct ReceiptRenderer {
    branding: BrandingConfig,
}

impl ReceiptRenderer {
    pub fn new(branding: BrandingConfig) -> Self {
        Self { branding }
    }

    /// Render the order as a complete, self-contained PDF document.
    pub fn render(&self, order: &Order) -> Vec<u8> {
        let mut page = Composer::new();

        // Branding header
        page.put_centered(FontFace::HelveticaBold, 20.0, &self.branding.name);
        page.advance(28.0);
        page.put_centered(FontFace::Helvetica, BODY_SIZE, &self.branding.tagline);
        page.advance(24.0);

        // Section title, underlined to the width of the text
        let title_width = FontFace::HelveticaBold.text_width("Receipt", 12.0);
        page.put(FontFace::HelveticaBold, 12.0, MARGIN, "Receipt");
        page.advance(13.5);
        page.rule(MARGIN, MARGIN + title_width);
        page.advance(8.0);

        // Order meta
        let meta = [
            format!("Order ID: {}", order.id),
            format!(
                "Date: {}",
                order
                    .created_at
                    .to_rfc3339_opts(SecondsFormat::Millis, true)
            ),
            format!("Customer: {}", order.customer.display_name()),
            format!(
                "Phone: {}",
                order.customer.phone.as_deref().unwrap_or_default()
            ),
        ];
        for line in &meta {
            page.put(FontFace::Helvetica, BODY_SIZE, MARGIN, line);
            page.advance(12.0);
        }
        page.advance(7.0);

        table_header(&mut page);

        for item in &order.items {
            if page.room_left() < ROW_RESERVE {
                page.break_page();
                table_header(&mut page);
            }
            let name = fit_width(
                FontFace::Helvetica,
                BODY_SIZE,
                ITEM_NAME_MAX_WIDTH,
                &item.display_name(),
            );
            page.put(FontFace::Helvetica, BODY_SIZE, COL_ITEM_X, &name);
            page.put_right(
                FontFace::Helvetica,
                BODY_SIZE,
                COL_QTY_RIGHT,
                &item.quantity.to_string(),
            );
            page.put_right(
                FontFace::Helvetica,
                BODY_SIZE,
                COL_PRICE_RIGHT,
                &format_rs(item.line_total()),
            );
            page.advance(ROW_ADVANCE);
        }

        if page.room_left() < TOTALS_RESERVE {
            page.break_page();
        }
        page.advance(4.0);
        page.rule(MARGIN, RULE_RIGHT);
        page.advance(10.0);

        // Totals block; the stored total wins over recomputation so the
        // receipt always matches what the customer was charged.
        let discount_label = format!("Discount ({}%)", order.customer.discount_percent);
        let totals = [
            (FontFace::Helvetica, "Subtotal", order.subtotal()),
            (FontFace::Helvetica, discount_label.as_str(), order.discount()),
            (FontFace::HelveticaBold, "Total", order.total),
        ];
        for (face, label, amount) in totals {
            page.put_right(face, BODY_SIZE, TOTALS_LABEL_RIGHT, label);
            page.put_right(face, BODY_SIZE, TOTALS_VALUE_RIGHT, &format_rs(amount));
            page.advance(14.0);
        }

        // Footer notes
        page.advance(14.0);
        page.put_centered(
            FontFace::Helvetica,
            9.0,
            &format!("Thank you for ordering from {}!", self.branding.name),
        );
        page.advance(11.0);
        page.put_centered(
            FontFace::Helvetica,
            9.0,
            "This is a system-generated receipt. Please keep it for your records.",
        );

        build_document(page.finish())
    }
}

fn table_header(page: &mut Composer) {
    page.put(FontFace::HelveticaBold, BODY_SIZE, COL_ITEM_X, "Item");
    page.put_right(FontFace::HelveticaBold, BODY_SIZE, COL_QTY_RIGHT, "Qty");
    page.put_right(FontFace::HelveticaBold, BODY_SIZE, COL_PRICE_RIGHT, "Price");
    page.advance(14.0);
    page.rule(MARGIN, RULE_RIGHT);
    page.advance(6.0);
}

// =============================================================================
// Page composition
// =============================================================================

/// Cursor-based writer over one content stream per page. `y` grows
/// downward from the top edge; PDF's coordinate origin is bottom-left, so
/// baselines are flipped when drawn.
struct Composer {
    done: Vec<Content>,
    current: Content,
    y: f32,
}

impl Composer {
    fn new() -> Self {
        Self {
            done: Vec::new(),
            current: Content::new(),
            y: MARGIN,
        }
    }

    /// Draw `text` with its left edge at `x` on the current line. Does not
    /// advance the cursor; rows place several cells on one line.
    fn put(&mut self, face: FontFace, size: f32, x: f32, text: &str) {
        let baseline = PAGE_HEIGHT - (self.y + size);
        self.current.begin_text();
        self.current.set_font(face.resource_name(), size);
        self.current.next_line(x, baseline);
        self.current.show(pdf_writer::Str(&ascii_bytes(text)));
        self.current.end_text();
    }

    fn put_right(&mut self, face: FontFace, size: f32, right_edge: f32, text: &str) {
        let x = right_edge - face.text_width(text, size);
        self.put(face, size, x, text);
    }

    fn put_centered(&mut self, face: FontFace, size: f32, text: &str) {
        let x = (PAGE_WIDTH - face.text_width(text, size)) / 2.0;
        self.put(face, size, x, text);
    }

    /// Horizontal rule at the current cursor position.
    fn rule(&mut self, x1: f32, x2: f32) {
        let line_y = PAGE_HEIGHT - self.y;
        self.current.move_to(x1, line_y);
        self.current.line_to(x2, line_y);
        self.current.stroke();
    }

    fn advance(&mut self, dy: f32) {
        self.y += dy;
    }

    fn room_left(&self) -> f32 {
        PAGE_HEIGHT - MARGIN - self.y
    }

    fn break_page(&mut self) {
        let finished = std::mem::replace(&mut self.current, Content::new());
        self.done.push(finished);
        self.y = MARGIN;
    }

    fn finish(mut self) -> Vec<Content> {
        self.done.push(self.current);
        self.done
    }
}

/// Assemble the document skeleton around the rendered page streams:
/// catalog, page tree, one page object per stream, and the two shared
/// font resources.
fn build_document(pages: Vec<Content>) -> Vec<u8> {
    let catalog_id = Ref::new(1);
    let page_tree_id = Ref::new(2);
    let regular_id = Ref::new(3);
    let bold_id = Ref::new(4);

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(page_tree_id);

    let page_ids: Vec<Ref> = (0..pages.len())
        .map(|i| Ref::new(5 + 2 * i as i32))
        .collect();
    pdf.pages(page_tree_id)
        .kids(page_ids.iter().copied())
        .count(pages.len() as i32);

    for (i, content) in pages.into_iter().enumerate() {
        let content_id = Ref::new(6 + 2 * i as i32);

        let mut page = pdf.page(page_ids[i]);
        page.media_box(Rect::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT));
        page.parent(page_tree_id);
        page.contents(content_id);
        {
            let mut resources = page.resources();
            let mut fonts = resources.fonts();
            fonts.pair(FontFace::Helvetica.resource_name(), regular_id);
            fonts.pair(FontFace::HelveticaBold.resource_name(), bold_id);
        }
        page.finish();

        pdf.stream(content_id, &content.finish());
    }

    pdf.type1_font(regular_id)
        .base_font(FontFace::Helvetica.base_font());
    pdf.type1_font(bold_id)
        .base_font(FontFace::HelveticaBold.base_font());

    pdf.finish()
}

/// Built-in Helvetica only covers the standard Latin set; flatten
/// anything else to `?` so the string stays printable and measurable.
fn ascii_bytes(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if (' '..='~').contains(&c) { c as u8 } else { b'?' })
        .collect()
}

/// Truncate `text` with a trailing ellipsis so it fits in `max_width`
/// points at the given size.
fn fit_width(face: FontFace, size: f32, max_width: f32, text: &str) -> String {
    if face.text_width(text, size) <= max_width {
        return text.to_string();
    }
    let budget = max_width - face.text_width("...", size);
    let mut out = String::new();
    let mut used = 0.0_f32;
    for ch in text.chars() {
        let width = f32::from(face.char_width(ch)) * size / 1000.0;
        if used + width > budget {
            break;
        }
        used += width;
        out.push(ch);
    }
    out.push_str("...");
    out
}
