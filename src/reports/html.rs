use chrono::{NaiveDate, NaiveDateTime};

use super::{ProductSummary, SupplierTotal};
use crate::utils::{escape_html, format_amount, format_quantity};

const BULMA_CSS: &str = "https://cdn.jsdelivr.net/npm/bulma@0.9.4/css/bulma.min.css";
const AUTOMATED_NOTE: &str = "Tai automatinė žinutė. This is an automated email.";

/// Header data for the weekly discount report
#[derive(Debug, Clone)]
pub struct WeeklyReportInfo<'a> {
    pub shop_name: &'a str,
    pub year: i32,
    pub week: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// When the underlying export was downloaded
    pub generated_at: NaiveDateTime,
}

fn table(classes: &str, headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut html = format!("<table class=\"{}\">\n<thead><tr>", classes);
    for header in headers {
        html.push_str(&format!("<th>{}</th>", escape_html(header)));
    }
    html.push_str("</tr></thead>\n<tbody>\n");
    for row in rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str(&format!("<td>{}</td>", escape_html(cell)));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>");
    html
}

/// Supplier totals table, also used as the weekly email body
pub fn supplier_totals_table(totals: &[SupplierTotal]) -> String {
    let rows: Vec<Vec<String>> = totals
        .iter()
        .map(|t| vec![t.supplier.clone(), format_amount(t.discount)])
        .collect();
    table(
        "table avoid-page-break-inside is-striped is-hoverable",
        &["Tiekėjas", "Nuolaida"],
        &rows,
    )
}

/// Full weekly discount report page
pub fn weekly_report(
    info: &WeeklyReportInfo<'_>,
    products: &[ProductSummary],
    totals: &[SupplierTotal],
    missing_codes: &[String],
) -> String {
    let mut html = Vec::new();
    html.push(format!(
        "<html><head><meta charset=\"utf-8\"><title>Nukainavimai {}</title>",
        info.week
    ));
    html.push(format!("<link rel=\"stylesheet\" href=\"{}\">", BULMA_CSS));
    html.push("</head><body>".to_string());
    html.push(
        "<style>.table thead th {padding: 6px 4px;} .table tbody td { padding: 2px 4px;}</style>"
            .to_string(),
    );

    html.push(format!(
        r#"<div class="columns">
  <div class="column"><h1 class="is-3 title">Nukainojimai {} savaitė</h1></div>
  <div class="column"><div class="has-text-right">{} <br> Periodas: {} - {}</div></div>
</div>"#,
        info.week,
        escape_html(info.shop_name),
        info.start_date,
        info.end_date
    ));

    let product_rows: Vec<Vec<String>> = products
        .iter()
        .map(|p| {
            vec![
                p.supplier.clone(),
                p.product.clone(),
                format_amount(p.mean_price),
                format_quantity(p.quantity),
                format_amount(p.discount),
                p.receipts.clone(),
            ]
        })
        .collect();
    html.push(table(
        "main-table table is-striped is-hoverable",
        &["Tiekėjas", "Prekė", "Kaina", "Kiekis", "Nuol.", "Kvitai"],
        &product_rows,
    ));

    html.push("<div class='columns'>".to_string());
    html.push("<div class='column'>".to_string());
    html.push("<h1>Suvestinė pagal tiekėją</h1>".to_string());
    html.push(supplier_totals_table(totals));
    html.push("</div>".to_string());

    html.push("<div class='column has-text-info'>".to_string());
    if !missing_codes.is_empty() {
        html.push(format!(
            "<p>Nepavyko surasti tiekėjų šiems kodams: {}</p>",
            escape_html(&missing_codes.join(", "))
        ));
    }
    html.push(format!(
        "<p>Ataskaita sugeneruota: {}</p>",
        info.generated_at.format("%Y-%m-%d %H:%M:%S")
    ));
    html.push("</div></div>".to_string());
    html.push("</body></html>".to_string());

    html.join("\n")
}

/// Email body announcing the weekly workbook
pub fn weekly_email(workbook_name: &str, totals: &[SupplierTotal]) -> String {
    format!(
        "<div style='color: grey;'>Prisegamas {} failas. {}</div>{}",
        escape_html(workbook_name),
        AUTOMATED_NOTE,
        supplier_totals_table(totals)
    )
}

/// Daily Z report email: the receipt text in a monospace block
pub fn daily_receipt(receipt_text: &str) -> String {
    format!(
        "<div style='font-family: Courier New;'><pre>{}</pre></div><div style='color: grey;'>{}</div>",
        escape_html(receipt_text),
        AUTOMATED_NOTE
    )
}
