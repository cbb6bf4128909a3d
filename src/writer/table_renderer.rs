//! Grid tables for PDF generation.
//!
//! Fixed-width, fixed-row-height tables of single-line text cells, with
//! optional cycling row backgrounds and either full grid lines or an
//! outer box. Text wider than its cell is drawn at a smaller size so it
//! stays inside the padding.
//!
//! # Example
//!
//! ```ignore
//! let mut table = GridTable::new(vec![90.7, 90.7]).with_style(GridStyle::striped());
//! table.add_row(vec!["1,200,000".into(), "بیمه".into()]);
//! let height = table.render(&mut page, x, top);
//! ```

use super::content_stream::Color;
use super::pdf_writer::{PageBuilder, TextAlign};

/// Horizontal alignment for cell content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CellAlign {
    /// Align to the left
    Left,
    /// Center horizontally
    Center,
    /// Align to the right
    #[default]
    Right,
}

/// Which rules are drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GridLines {
    /// Every cell outlined
    #[default]
    Grid,
    /// Only the table's outer edge
    Box,
}

/// Border style for tables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableBorderStyle {
    /// Border width in points
    pub width: f32,
    /// Border color
    pub color: Color,
}

impl Default for TableBorderStyle {
    fn default() -> Self {
        Self {
            width: 0.4,
            color: Color::BLACK,
        }
    }
}

/// Smallest size a cell's text is shrunk to.
const MIN_FONT_SIZE: f32 = 4.0;

/// Visual style shared by every cell of a table.
#[derive(Debug, Clone)]
pub struct GridStyle {
    /// Font size in points
    pub font_size: f32,
    /// Row height in points
    pub row_height: f32,
    /// Horizontal padding inside cells
    pub padding: f32,
    /// Text alignment
    pub align: CellAlign,
    /// Text color
    pub text_color: Color,
    /// Rules to draw
    pub lines: GridLines,
    /// Line style
    pub border: TableBorderStyle,
    /// Row backgrounds, cycled; empty means transparent
    pub row_backgrounds: Vec<Color>,
}

impl Default for GridStyle {
    fn default() -> Self {
        Self {
            font_size: 9.0,
            row_height: 17.0,
            padding: 6.0,
            align: CellAlign::Right,
            text_color: Color::BLACK,
            lines: GridLines::Grid,
            border: TableBorderStyle::default(),
            row_backgrounds: Vec::new(),
        }
    }
}

impl GridStyle {
    /// Whitesmoke/beige alternating rows.
    pub fn striped() -> Self {
        Self {
            row_backgrounds: vec![Color::from_rgb8(245, 245, 245), Color::from_rgb8(245, 245, 220)],
            ..Self::default()
        }
    }

    /// Grey band with centered white text and a box border.
    pub fn heading() -> Self {
        Self {
            font_size: 10.0,
            row_height: 18.0,
            align: CellAlign::Center,
            text_color: Color::WHITE,
            lines: GridLines::Box,
            row_backgrounds: vec![Color::from_rgb8(128, 128, 128)],
            ..Self::default()
        }
    }

    /// Set the font size.
    pub fn font_size(mut self, size: f32) -> Self {
        self.font_size = size;
        self
    }

    /// Set the text alignment.
    pub fn align(mut self, align: CellAlign) -> Self {
        self.align = align;
        self
    }
}

/// A table of single-line text cells.
#[derive(Debug, Clone)]
pub struct GridTable {
    column_widths: Vec<f32>,
    rows: Vec<Vec<String>>,
    style: GridStyle,
}

impl GridTable {
    /// Create an empty table with fixed column widths (points).
    pub fn new(column_widths: Vec<f32>) -> Self {
        Self {
            column_widths,
            rows: Vec::new(),
            style: GridStyle::default(),
        }
    }

    /// Set the style.
    pub fn with_style(mut self, style: GridStyle) -> Self {
        self.style = style;
        self
    }

    /// Append a row. Missing cells render blank; extra cells are ignored.
    pub fn add_row(&mut self, cells: Vec<String>) -> &mut Self {
        self.rows.push(cells);
        self
    }

    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Total width in points.
    pub fn width(&self) -> f32 {
        self.column_widths.iter().sum()
    }

    /// Total height in points.
    pub fn height(&self) -> f32 {
        self.rows.len() as f32 * self.style.row_height
    }

    /// Draw the table with its top-left corner at (`x`, `top`).
    ///
    /// Returns the drawn height.
    pub fn render(&self, page: &mut PageBuilder<'_>, x: f32, top: f32) -> f32 {
        let style = &self.style;
        let row_height = style.row_height;

        for (i, row) in self.rows.iter().enumerate() {
            let y = top - (i as f32 + 1.0) * row_height;

            if !style.row_backgrounds.is_empty() {
                let background = style.row_backgrounds[i % style.row_backgrounds.len()];
                page.fill_rect(x, y, self.width(), row_height, background);
            }

            let mut cell_x = x;
            for (col, &cell_width) in self.column_widths.iter().enumerate() {
                let text = row.get(col).map(String::as_str).unwrap_or("");
                let available = cell_width - 2.0 * style.padding;
                let font_size = fitted_size(page, text, style.font_size, available);
                // Baseline roughly centred for Latin and Arabic glyphs
                let baseline = y + (row_height - font_size * 0.7) / 2.0;
                let (anchor, align) = match style.align {
                    CellAlign::Left => (cell_x + style.padding, TextAlign::Left),
                    CellAlign::Center => (cell_x + cell_width / 2.0, TextAlign::Center),
                    CellAlign::Right => (cell_x + cell_width - style.padding, TextAlign::Right),
                };
                page.draw_text(text, anchor, baseline, font_size, align, style.text_color);

                if style.lines == GridLines::Grid {
                    page.stroke_rect(
                        cell_x,
                        y,
                        cell_width,
                        row_height,
                        style.border.color,
                        style.border.width,
                    );
                }
                cell_x += cell_width;
            }
        }

        let height = self.height();
        if style.lines == GridLines::Box && height > 0.0 {
            page.stroke_rect(
                x,
                top - height,
                self.width(),
                height,
                style.border.color,
                style.border.width,
            );
        }
        height
    }
}

/// Largest size up to `font_size` at which `text` fits in `available` points.
fn fitted_size(page: &PageBuilder<'_>, text: &str, font_size: f32, available: f32) -> f32 {
    let width = page.text_width(text, font_size);
    if width <= available || width <= 0.0 {
        return font_size;
    }
    (font_size * available / width).max(MIN_FONT_SIZE)
}
