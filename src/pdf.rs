// pdf.rs
// Receipt and report documents. Fonts are loaded from FICORE_FONT_DIR
// (default ./fonts), which must contain the LiberationSans family.

use anyhow::{Context, Result};
use genpdf::{Element, elements, style};
use std::env;

use crate::format::{format_currency, format_date};
use crate::models::{Cashflow, InventoryItem, Record};

fn base_document(title: &str) -> Result<genpdf::Document> {
    let font_dir = env::var("FICORE_FONT_DIR").unwrap_or_else(|_| "./fonts".to_string());
    let font_family = genpdf::fonts::from_files(&font_dir, "LiberationSans", None)
        .context("pdf fonts not found; set FICORE_FONT_DIR")?;

    let mut doc = genpdf::Document::new(font_family);
    doc.set_title(title);
    let mut decorator = genpdf::SimplePageDecorator::new();
    decorator.set_margins(10);
    doc.set_page_decorator(decorator);

    let mut heading = elements::Paragraph::new(title);
    heading.set_alignment(genpdf::Alignment::Center);
    doc.push(heading.styled(style::Style::new().bold().with_font_size(16)));
    doc.push(elements::Break::new(1.5));
    Ok(doc)
}

fn render(doc: genpdf::Document) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    doc.render(&mut buffer).context("pdf render failed")?;
    Ok(buffer)
}

fn labelled_line(label: &str, value: &str) -> elements::Paragraph {
    elements::Paragraph::default()
        .styled_string(format!("{label}: "), style::Style::new().bold())
        .string(value)
}

/// IOU-style receipt for a single debtor/creditor record.
pub fn record_receipt(record: &Record, owner: &str) -> Result<Vec<u8>> {
    let mut doc = base_document("FiCore Records")?;
    doc.push(labelled_line("Issued by", owner));
    doc.push(labelled_line("Name", &record.name));
    doc.push(labelled_line("Type", record.record_type.as_str()));
    doc.push(labelled_line(
        "Amount Owed",
        &format_currency(record.amount_owed),
    ));
    if let Some(contact) = &record.contact {
        doc.push(labelled_line("Contact", contact));
    }
    if let Some(description) = &record.description {
        doc.push(labelled_line("Description", description));
    }
    doc.push(labelled_line(
        "Reminders Sent",
        &record.reminder_count.to_string(),
    ));
    doc.push(labelled_line("Date Recorded", &format_date(&record.created_at)));
    render(doc)
}

/// Receipt for a single money-in/money-out entry.
pub fn cashflow_receipt(flow: &Cashflow, owner: &str) -> Result<Vec<u8>> {
    let mut doc = base_document("FiCore Receipt")?;
    doc.push(labelled_line("Issued by", owner));
    doc.push(labelled_line("Party", &flow.party_name));
    doc.push(labelled_line("Type", flow.flow_type.as_str()));
    doc.push(labelled_line("Amount", &format_currency(flow.amount)));
    if let Some(method) = flow.method {
        doc.push(labelled_line("Method", method.as_str()));
    }
    if let Some(category) = &flow.category {
        doc.push(labelled_line("Category", category));
    }
    doc.push(labelled_line("Date", &format_date(&flow.created_at)));
    render(doc)
}

pub fn profit_loss_report(
    flows: &[Cashflow],
    total_income: f64,
    total_expense: f64,
) -> Result<Vec<u8>> {
    let mut doc = base_document("Profit / Loss Report")?;

    let mut table = elements::TableLayout::new(vec![2, 2, 1, 2]);
    table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));
    let header = style::Style::new().bold();
    table
        .row()
        .element(elements::Paragraph::new("Date").styled(header))
        .element(elements::Paragraph::new("Party").styled(header))
        .element(elements::Paragraph::new("Type").styled(header))
        .element(elements::Paragraph::new("Amount").styled(header))
        .push()
        .context("report header row")?;
    for flow in flows {
        table
            .row()
            .element(elements::Paragraph::new(format_date(&flow.created_at)))
            .element(elements::Paragraph::new(flow.party_name.clone()))
            .element(elements::Paragraph::new(flow.flow_type.as_str()))
            .element(elements::Paragraph::new(format_currency(flow.amount)))
            .push()
            .context("report row")?;
    }
    doc.push(table);

    doc.push(elements::Break::new(1.0));
    doc.push(labelled_line("Total Income", &format_currency(total_income)));
    doc.push(labelled_line("Total Expense", &format_currency(total_expense)));
    doc.push(labelled_line(
        "Net Position",
        &format_currency(total_income - total_expense),
    ));
    render(doc)
}

pub fn inventory_report(items: &[InventoryItem]) -> Result<Vec<u8>> {
    let mut doc = base_document("Inventory Report")?;

    let mut table = elements::TableLayout::new(vec![3, 1, 2, 2]);
    table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));
    let header = style::Style::new().bold();
    table
        .row()
        .element(elements::Paragraph::new("Item").styled(header))
        .element(elements::Paragraph::new("Qty").styled(header))
        .element(elements::Paragraph::new("Buying").styled(header))
        .element(elements::Paragraph::new("Selling").styled(header))
        .push()
        .context("report header row")?;
    for item in items {
        table
            .row()
            .element(elements::Paragraph::new(item.item_name.clone()))
            .element(elements::Paragraph::new(item.qty.to_string()))
            .element(elements::Paragraph::new(
                item.buying_price.map(format_currency).unwrap_or_default(),
            ))
            .element(elements::Paragraph::new(
                item.selling_price.map(format_currency).unwrap_or_default(),
            ))
            .push()
            .context("report row")?;
    }
    doc.push(table);
    render(doc)
}
