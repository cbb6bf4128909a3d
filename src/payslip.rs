//! Payslip layout.
//!
//! One landscape A4 page per employee, read right to left:
//!
//! ```text
//!                      company
//!                      period
//!                                        [ phone | شماره تماس ]
//!                                        [ name  | نام کامل   ]
//! [  کسور  ]      [  مزایا  ]      [  کارکرد  ]
//! [ value | label ] ...
//!            [ amount ریال | جمع پرداختی: ]
//!                    disclaimer
//!              تاریخ تولید گزارش : HH:MM  DD-MM-YYYY
//! ```

use crate::config::{BatchOptions, LayoutOptions};
use crate::error::RenderError;
use crate::fields::{Field, FieldKind, FieldSet};
use crate::fonts::FontResource;
use crate::format::{format_amount, format_duration, PLACEHOLDER};
use crate::table::Cell;
use crate::writer::{
    CellAlign, Color, GridStyle, GridTable, PageBuilder, PdfFont, PdfWriter, PdfWriterConfig,
    TextAlign,
};
use chrono::{DateTime, Local};

/// Points per centimetre.
const CM: f32 = 28.3465;

const PAGE_WIDTH: f32 = 842.0;
const PAGE_HEIGHT: f32 = 595.0;
const MARGIN: f32 = 18.0;

const TITLE_SIZE: f32 = 16.0;
const TITLE_LEADING: f32 = 22.0;
const BODY_SIZE: f32 = 9.0;

/// Width of the slot each block is centred in.
const BLOCK_SLOT: f32 = 7.2 * CM;
const BLOCK_COLUMN: f32 = 3.2 * CM;
const HEADER_COLUMN: f32 = 3.5 * CM;

const HOURS_SUFFIX: &str = "ساعت";
const CURRENCY_SUFFIX: &str = "ریال";
const TIMESTAMP_LABEL: &str = "تاریخ تولید گزارش :";

const DEDUCTIONS: &[Field] = &[
    Field::Insurance,
    Field::SalaryAdvance,
    Field::VoucherLoss,
    Field::MonthlyConsumption,
    Field::LatePenalty,
    Field::LoanRepayment,
];

const BENEFITS: &[Field] = &[
    Field::GroceryVoucher,
    Field::PunctualityBonus,
    Field::PerformanceBonus,
    Field::Mission,
];

const ATTENDANCE: &[Field] = &[
    Field::BaseHourlyPay,
    Field::HoursWorked,
    Field::DaysWorked,
    Field::UnauthorizedDelay,
];

/// A titled value/label block.
struct Block {
    title: &'static str,
    rows: Vec<[String; 2]>,
}

impl Block {
    fn new(title: &'static str, fields: &FieldSet, items: &[Field]) -> Self {
        let rows = items
            .iter()
            .map(|&field| [display_value(fields, field), field.label().to_string()])
            .collect();
        Self { title, rows }
    }

    /// Append a total row, summing `items` when `total` is not in the sheet.
    fn with_total(mut self, fields: &FieldSet, total: Field, items: &[Field]) -> Self {
        let value = if fields.is_present(total) {
            format_amount(fields.get(total))
        } else {
            let sum: f64 = items.iter().filter_map(|&f| fields.get(f).as_number()).sum();
            log::debug!("{} not in sheet, computed {}", total.column(), sum);
            format_amount(&Cell::Number(sum))
        };
        self.rows.push([value, total.label().to_string()]);
        self
    }

    fn with_row(mut self, fields: &FieldSet, field: Field) -> Self {
        self.rows.push([display_value(fields, field), field.label().to_string()]);
        self
    }

    fn render(&self, page: &mut PageBuilder<'_>, x: f32, top: f32) -> f32 {
        let mut heading =
            GridTable::new(vec![2.0 * BLOCK_COLUMN]).with_style(GridStyle::heading());
        heading.add_row(vec![self.title.to_string()]);
        let mut height = heading.render(page, x, top);

        let mut body = GridTable::new(vec![BLOCK_COLUMN, BLOCK_COLUMN])
            .with_style(GridStyle::striped());
        for [value, label] in &self.rows {
            body.add_row(vec![value.clone(), label.clone()]);
        }
        height += body.render(page, x, top - height);
        height
    }
}

/// Formatted value of a field as printed in a block.
fn display_value(fields: &FieldSet, field: Field) -> String {
    let cell = fields.get(field);
    match field.kind() {
        FieldKind::Duration => {
            let formatted = format_duration(cell);
            if formatted == PLACEHOLDER {
                formatted
            } else {
                format!("{} {}", formatted, HOURS_SUFFIX)
            }
        },
        FieldKind::Amount => format_amount(cell),
        FieldKind::Text | FieldKind::Phone => cell.to_string(),
    }
}

/// Renders payslips with a fixed font and layout.
#[derive(Debug, Clone)]
pub struct PayslipRenderer {
    font: FontResource,
    shaping: bool,
    layout: LayoutOptions,
    compress: bool,
}

impl PayslipRenderer {
    /// Create a renderer. `shaping` enables bidi reordering and contextual
    /// forms when an embedded font is available.
    pub fn new(font: FontResource, shaping: bool, layout: LayoutOptions) -> Self {
        Self {
            font,
            shaping,
            layout,
            compress: false,
        }
    }

    /// Flate-compress content and font streams.
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// The font payslips are drawn with.
    pub fn font(&self) -> &FontResource {
        &self.font
    }

    /// Render one payslip to PDF bytes.
    pub fn render(
        &self,
        fields: &FieldSet,
        name: &str,
        options: &BatchOptions,
        generated_at: DateTime<Local>,
    ) -> Result<Vec<u8>, RenderError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RenderError::Layout("employee name is empty".to_string()));
        }
        self.check_coverage(name)?;
        let phone = fields.phone()?;

        let config = PdfWriterConfig::default()
            .with_title(format!("{} - {}", options.company_line(), name))
            .with_subject(options.period_line())
            .with_creation_date(generated_at)
            .with_compress(self.compress);
        let mut writer = PdfWriter::new(config, PdfFont::for_resource(&self.font, self.shaping));

        let mut page = writer.add_page(PAGE_WIDTH, PAGE_HEIGHT);
        let mut y = PAGE_HEIGHT - MARGIN;

        // Title
        for line in [options.company_line(), options.period_line()] {
            y -= TITLE_LEADING;
            page.draw_text(line, PAGE_WIDTH / 2.0, y, TITLE_SIZE, TextAlign::Center, Color::BLACK);
        }
        y -= 14.0;

        // Employee header, flush right
        let mut header = GridTable::new(vec![HEADER_COLUMN, HEADER_COLUMN]);
        header.add_row(vec![phone, Field::Phone.label().to_string()]);
        header.add_row(vec![name.to_string(), "نام کامل".to_string()]);
        if self.layout.employee_code {
            header.add_row(vec![
                display_value(fields, Field::EmployeeCode),
                Field::EmployeeCode.label().to_string(),
            ]);
        }
        y -= header.render(&mut page, PAGE_WIDTH - MARGIN - header.width(), y);
        y -= 16.0;

        // Blocks, left to right
        let blocks = [
            Block::new("کسور", fields, DEDUCTIONS).with_total(
                fields,
                Field::TotalDeductions,
                DEDUCTIONS,
            ),
            Block::new("مزایا", fields, BENEFITS)
                .with_total(fields, Field::TotalBenefits, BENEFITS)
                .with_row(fields, Field::TotalSalary),
            Block::new("کارکرد", fields, ATTENDANCE),
        ];
        let blocks_left = (PAGE_WIDTH - BLOCK_SLOT * blocks.len() as f32) / 2.0;
        let inset = (BLOCK_SLOT - 2.0 * BLOCK_COLUMN) / 2.0;
        let mut lowest = y;
        for (i, block) in blocks.iter().enumerate() {
            let x = blocks_left + i as f32 * BLOCK_SLOT + inset;
            let height = block.render(&mut page, x, y);
            lowest = lowest.min(y - height);
        }
        y = lowest - 20.0;

        // Net pay, with the bank account to its left
        let net_value = format!("{} {}", format_amount(fields.get(Field::NetPay)), CURRENCY_SUFFIX);
        let mut net = GridTable::new(vec![4.0 * CM, 3.0 * CM])
            .with_style(GridStyle::striped().font_size(10.0));
        net.add_row(vec![net_value, Field::NetPay.label().to_string()]);

        let bank = self.layout.bank_account.then(|| {
            let mut table = GridTable::new(vec![4.0 * CM, 3.0 * CM])
                .with_style(GridStyle::default().align(CellAlign::Center));
            table.add_row(vec![
                display_value(fields, Field::BankAccount),
                Field::BankAccount.label().to_string(),
            ]);
            table
        });

        let gap = 12.0;
        let row_width = net.width() + bank.as_ref().map_or(0.0, |t| t.width() + gap);
        let left = (PAGE_WIDTH - row_width) / 2.0;
        if let Some(bank) = &bank {
            bank.render(&mut page, left, y);
            net.render(&mut page, left + bank.width() + gap, y);
        } else {
            net.render(&mut page, left, y);
        }
        y -= net.height() + 24.0;

        if let Some(disclaimer) = options.disclaimer_line() {
            page.draw_text(disclaimer, PAGE_WIDTH / 2.0, y, BODY_SIZE, TextAlign::Center, Color::BLACK);
        }

        let stamp = format!(
            "{} {}  {}",
            TIMESTAMP_LABEL,
            generated_at.format("%H:%M"),
            generated_at.format("%d-%m-%Y")
        );
        page.draw_text(&stamp, PAGE_WIDTH / 2.0, MARGIN + 10.0, BODY_SIZE, TextAlign::Center, Color::BLACK);

        if page.is_blank() {
            return Err(RenderError::Layout("nothing was drawn".to_string()));
        }
        page.finish();

        let bytes = writer.finish()?;
        log::debug!("Rendered payslip for {} ({} bytes)", name, bytes.len());
        Ok(bytes)
    }

    /// Fail when the embedded font has no glyph for anything in the name.
    fn check_coverage(&self, name: &str) -> Result<(), RenderError> {
        let FontResource::Embedded(program) = &self.font else {
            return Ok(());
        };
        let mut visible = name.chars().filter(|c| !c.is_whitespace()).peekable();
        if visible.peek().is_some() && !visible.any(|c| program.glyph_id(c).is_some()) {
            return Err(RenderError::Font(format!(
                "{} has no glyphs for '{}'",
                program.metrics().name,
                name
            )));
        }
        Ok(())
    }
}
