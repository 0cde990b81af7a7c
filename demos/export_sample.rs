//! Fill a sample addendum and export it as a PDF
//!
//! Usage: cargo run -p capture --example export_sample -- <font.ttf> [bold.ttf] [out-dir]

use anyhow::{bail, Context, Result};
use capture::{ExportConfig, ExportOutcome, Exporter, GlyphFonts, SkiaRasterizer, Surface};
use lease_form::{DocumentDraft, FieldId, LesseeCount};
use std::path::PathBuf;

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let Some(font_path) = args.next() else {
        bail!("usage: export_sample <font.ttf> [bold.ttf] [out-dir]");
    };
    let bold_path = args.next();
    let out_dir = PathBuf::from(args.next().unwrap_or_else(|| ".".to_string()));

    let regular = std::fs::read(&font_path).with_context(|| format!("reading {font_path}"))?;
    let mut fonts = GlyphFonts::from_regular(regular)?;
    if let Some(path) = bold_path {
        let bold = std::fs::read(&path).with_context(|| format!("reading {path}"))?;
        fonts.set_bold(bold)?;
    }

    let mut draft = DocumentDraft::with_lessor("Harbor Point Properties LLC");
    draft.set_addendum_letter("b");
    draft.set_initial_date("03/15/2025");
    draft.set_tenant_name("Corner Coffee LLC");
    draft.set_lease_start("04/01/2025");
    draft.set_lease_end("03/31/2030");
    draft.set_base_rent("4,500");
    draft.set_insurance("120.40");
    draft.set_tax("310");
    draft.set_cam("89.60");

    for text in [
        "Tenant may install exterior signage subject to Lessor approval.",
        "Lessor shall repaint the storefront before the commencement date.",
        "Tenant has the right to four reserved parking spaces.",
    ] {
        let line = draft.add_line();
        draft.set_line_text(line, text);
    }

    draft.set_lessee_count(LesseeCount::Two);
    draft.set_field(FieldId::LesseeCompany(0), "Corner Coffee LLC");
    draft.set_field(FieldId::LesseeSigner(0), "Jordan Smith");
    draft.set_field(FieldId::LesseeTitle(0), "Managing Member");
    draft.set_field(FieldId::LesseeCompany(1), "Smith Holdings Inc");
    draft.set_field(FieldId::LesseeSigner(1), "Casey Smith");
    draft.set_field(FieldId::LesseeTitle(1), "President");

    let mut exporter = Exporter::new(ExportConfig::default(), SkiaRasterizer::new(fonts));
    let mut surface = Surface::new(1100.0);

    match exporter.export(&draft, Some(&mut surface))? {
        ExportOutcome::Saved(file) => {
            let path = out_dir.join(&file.filename);
            std::fs::write(&path, &file.bytes)
                .with_context(|| format!("writing {}", path.display()))?;
            println!(
                "Wrote {} ({} page(s), {} bytes)",
                path.display(),
                file.page_count,
                file.bytes.len()
            );
        }
        ExportOutcome::Skipped(reason) => println!("Export skipped: {reason:?}"),
    }

    Ok(())
}
