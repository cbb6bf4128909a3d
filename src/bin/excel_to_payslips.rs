//! Generate one payslip PDF per employee from an Excel payroll sheet.
//!
//! Usage:
//!   excel_to_payslips payroll.xlsx --company "Acme" --period "1403-02"
//!   excel_to_payslips payroll.xlsx --options options.json --output-dir out

use clap::Parser;
use payslip_oxide::{
    spawn_batch, ConvertConfig, FontResource, OptionsFile, Outcome, PayslipRenderer,
    ProgressEvent,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "excel_to_payslips")]
#[command(about = "Generate right-to-left payslip PDFs from an Excel payroll sheet", long_about = None)]
struct Cli {
    /// Payroll workbook (.xls, .xlsx, .xlsm, .xlsb, .ods)
    input: PathBuf,

    /// Directory payslips are written to
    #[arg(short, long, default_value = "payslips")]
    output_dir: PathBuf,

    /// Company name printed in the title
    #[arg(long)]
    company: Option<String>,

    /// Pay period printed under the company (defaults to the input file name)
    #[arg(long)]
    period: Option<String>,

    /// Footnote printed under the net pay
    #[arg(long)]
    disclaimer: Option<String>,

    /// JSON file with company, period, disclaimer and layout settings
    #[arg(long)]
    options: Option<PathBuf>,

    /// TrueType font to embed instead of searching for one
    #[arg(long)]
    font: Option<PathBuf>,

    /// Column holding the employee name
    #[arg(long, default_value = payslip_oxide::config::DEFAULT_NAME_COLUMN)]
    name_column: String,

    /// Draw text without bidi reordering or contextual shaping
    #[arg(long)]
    no_shaping: bool,

    /// Show the personnel code in the header
    #[arg(long)]
    employee_code: bool,

    /// Show the bank account next to the net pay
    #[arg(long)]
    bank_account: bool,

    /// Compress PDF streams
    #[arg(long)]
    compress: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> payslip_oxide::Result<(ConvertConfig, PathBuf)> {
        let mut file = match &self.options {
            Some(path) => OptionsFile::load(path)?,
            None => OptionsFile::default(),
        };

        if let Some(company) = self.company {
            file.batch.company = company;
        }
        if let Some(disclaimer) = self.disclaimer {
            file.batch.disclaimer = disclaimer;
        }
        match self.period {
            Some(period) => file.batch.period = period,
            None if file.batch.period.trim().is_empty() => {
                if let Some(stem) = self.input.file_stem() {
                    file.batch.period = stem.to_string_lossy().into_owned();
                }
            },
            None => {},
        }
        file.layout.employee_code |= self.employee_code;
        file.layout.bank_account |= self.bank_account;

        let mut config = ConvertConfig::new()
            .with_output_dir(self.output_dir)
            .with_name_column(self.name_column)
            .with_options(file.batch)
            .with_layout(file.layout)
            .with_shaping(!self.no_shaping)
            .with_compress(self.compress);
        if let Some(font) = self.font {
            config = config.with_font_path(font);
        }
        Ok((config, self.input))
    }
}

fn run(cli: Cli) -> payslip_oxide::Result<()> {
    let (config, input) = cli.into_config()?;

    let font = FontResource::resolve(config.font_path.as_deref());
    let renderer = PayslipRenderer::new(font, config.shaping, config.layout)
        .with_compress(config.compress);

    let handle = spawn_batch(config, &input, renderer);
    for event in handle.events() {
        match event {
            ProgressEvent::Started { index, total, name } => {
                println!("{}/{} → {}", index, total, name);
            },
            ProgressEvent::Finished {
                name,
                outcome: Outcome::Failed(reason),
                ..
            } => {
                eprintln!("  failed: {} ({})", name, reason);
            },
            ProgressEvent::Finished { .. } => {},
        }
    }

    let summary = handle.join()?;
    println!();
    println!("{}", summary);
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        },
    }
}
